//! Wiki configuration module.
//!
//! Handles loading, validating, and merging the `config.toml` at the wiki
//! root. Stock defaults are serialized to a TOML table and the user file is
//! merged on top, so a config file only needs the keys it wants to change.
//!
//! ## Configuration Options
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! title = "Wiki"
//! start = "start"             # Namespace start page name
//! use_heading = "never"       # never | navigation | content | always
//! default_access = "read"     # Access level when no ACL rule matches
//!
//! [ids]
//! sepchar = "_"               # Replacement for invalid id characters
//! useslash = false            # Treat "/" as a namespace separator
//!
//! [urls]
//! base_url = "/"              # Prefix for page URLs
//! media_base = "/_media/"     # Prefix for media URLs
//!
//! [[acl]]
//! pattern = "private:*"       # Exact page id, "ns:*" or "*"
//! level = "none"
//! ```
//!
//! Unknown keys are rejected to catch typos early.

use crate::host::AccessLevel;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Wiki configuration loaded from `config.toml`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct WikiConfig {
    /// Wiki name, used in generated document titles.
    pub title: String,
    /// Name of a namespace's start page.
    pub start: String,
    /// Where a page's first heading replaces its id as the link text.
    pub use_heading: UseHeading,
    /// Access level for pages no ACL rule matches.
    pub default_access: AccessLevel,
    /// Page id character rules.
    pub ids: IdConfig,
    /// URL prefixes for generated links.
    pub urls: UrlConfig,
    /// Access rules, most specific match wins.
    pub acl: Vec<AclRule>,
}

impl Default for WikiConfig {
    fn default() -> Self {
        Self {
            title: "Wiki".to_string(),
            start: "start".to_string(),
            use_heading: UseHeading::default(),
            default_access: AccessLevel::Read,
            ids: IdConfig::default(),
            urls: UrlConfig::default(),
            acl: Vec::new(),
        }
    }
}

impl WikiConfig {
    /// Validate config values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.start.is_empty() || self.start.contains(':') {
            return Err(ConfigError::Validation(
                "start must be a non-empty page name without ':'".into(),
            ));
        }
        if !matches!(self.ids.sepchar, '_' | '-' | '.') {
            return Err(ConfigError::Validation(
                "ids.sepchar must be one of '_', '-', '.'".into(),
            ));
        }
        for rule in &self.acl {
            let pattern = rule.pattern.as_str();
            let wildcard_ok = pattern == "*" || !pattern.contains('*') || {
                pattern.ends_with(":*") && !pattern[..pattern.len() - 2].contains('*')
            };
            if pattern.is_empty() || !wildcard_ok {
                return Err(ConfigError::Validation(format!(
                    "acl pattern '{pattern}' must be a page id, 'ns:*' or '*'"
                )));
            }
        }
        Ok(())
    }
}

/// Where first headings are used as link titles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UseHeading {
    #[default]
    Never,
    /// Navigation links (bars and outlines) only.
    Navigation,
    /// Links inside page content only.
    Content,
    Always,
}

impl UseHeading {
    pub fn for_navigation(self) -> bool {
        matches!(self, UseHeading::Navigation | UseHeading::Always)
    }

    pub fn for_content(self) -> bool {
        matches!(self, UseHeading::Content | UseHeading::Always)
    }
}

/// Page id character rules.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct IdConfig {
    /// Character that replaces anything not allowed in an id.
    pub sepchar: char,
    /// Accept `/` as a namespace separator in references.
    pub useslash: bool,
}

impl Default for IdConfig {
    fn default() -> Self {
        Self {
            sepchar: '_',
            useslash: false,
        }
    }
}

/// URL prefixes for generated links.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct UrlConfig {
    pub base_url: String,
    pub media_base: String,
}

impl Default for UrlConfig {
    fn default() -> Self {
        Self {
            base_url: "/".to_string(),
            media_base: "/_media/".to_string(),
        }
    }
}

/// One access rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AclRule {
    /// Exact page id, `ns:*` for everything below a namespace, or `*`.
    pub pattern: String,
    pub level: AccessLevel,
}

// =============================================================================
// Config loading, merging, and validation
// =============================================================================

/// Returns the stock default config as a `toml::Value::Table`.
pub fn stock_defaults_value() -> toml::Value {
    toml::Value::try_from(WikiConfig::default()).expect("default config must serialize")
}

/// Recursively merge `overlay` on top of `base`.
///
/// - Tables are merged key-by-key (overlay keys override base keys).
/// - Non-table values in overlay replace base values entirely.
/// - Keys in base that are not in overlay are preserved.
pub fn merge_toml(base: toml::Value, overlay: toml::Value) -> toml::Value {
    match (base, overlay) {
        (toml::Value::Table(mut base_table), toml::Value::Table(overlay_table)) => {
            for (key, overlay_val) in overlay_table {
                let merged = match base_table.remove(&key) {
                    Some(base_val) => merge_toml(base_val, overlay_val),
                    None => overlay_val,
                };
                base_table.insert(key, merged);
            }
            toml::Value::Table(base_table)
        }
        (_, overlay) => overlay,
    }
}

/// Load a `config.toml` from a directory as a raw TOML value.
///
/// Returns `Ok(None)` if no `config.toml` exists in the directory.
pub fn load_raw_config(path: &Path) -> Result<Option<toml::Value>, ConfigError> {
    let config_path = path.join("config.toml");
    if !config_path.exists() {
        return Ok(None);
    }
    let content = fs::read_to_string(&config_path)?;
    let value: toml::Value = toml::from_str(&content)?;
    Ok(Some(value))
}

/// Merge an optional overlay onto a base value, then deserialize and validate.
pub fn resolve_config(
    base: toml::Value,
    overlay: Option<toml::Value>,
) -> Result<WikiConfig, ConfigError> {
    let merged = match overlay {
        Some(ov) => merge_toml(base, ov),
        None => base,
    };
    let config: WikiConfig = merged.try_into()?;
    config.validate()?;
    Ok(config)
}

/// Load config from `config.toml` in the given wiki root.
pub fn load_config(root: &Path) -> Result<WikiConfig, ConfigError> {
    let base = stock_defaults_value();
    let overlay = load_raw_config(root)?;
    resolve_config(base, overlay)
}

/// Returns a fully-commented stock `config.toml` with all keys and explanations.
///
/// Used by the `gen-config` CLI command.
pub fn stock_config_toml() -> &'static str {
    r##"# docnav configuration
# ====================
# All settings are optional. Remove or comment out any you don't need.
# Values shown below are the defaults. Unknown keys will cause an error.

# Wiki name, used in the <title> of generated pages.
title = "Wiki"

# Name of a namespace's start page. An empty toc slot in a navigation
# directive falls back to <namespace>:<start> when that page exists.
start = "start"

# Use a page's first heading instead of its id as link text:
#   never      - always show the id
#   navigation - navigation bars and doctoc outlines
#   content    - links inside page content
#   always     - everywhere
use_heading = "never"

# Access level for pages no [[acl]] rule matches.
# One of: none, read, edit, create, upload, delete
default_access = "read"

# ---------------------------------------------------------------------------
# Page ids
# ---------------------------------------------------------------------------
[ids]
# Replacement for characters not allowed in ids ('_', '-' or '.').
sepchar = "_"

# Accept "/" as a namespace separator in references.
useslash = false

# ---------------------------------------------------------------------------
# URLs
# ---------------------------------------------------------------------------
[urls]
# Prefix for page URLs: book:intro -> {base_url}book/intro.html
base_url = "/"

# Prefix for media URLs used by image link titles.
media_base = "/_media/"

# ---------------------------------------------------------------------------
# Access rules
# ---------------------------------------------------------------------------
# The most specific rule wins: an exact page id, then "ns:*" walking up the
# namespaces, then "*". Pages below read level are left out of outlines.
#
# [[acl]]
# pattern = "private:*"
# level = "none"
"##
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn default_config_values() {
        let config = WikiConfig::default();
        assert_eq!(config.start, "start");
        assert_eq!(config.use_heading, UseHeading::Never);
        assert_eq!(config.default_access, AccessLevel::Read);
        assert_eq!(config.ids.sepchar, '_');
        assert!(!config.ids.useslash);
        assert_eq!(config.urls.base_url, "/");
        assert!(config.acl.is_empty());
    }

    #[test]
    fn parse_partial_config() {
        let toml = r#"
start = "index"

[ids]
useslash = true
"#;
        let config: WikiConfig = toml::from_str(toml).unwrap();
        assert_eq!(config.start, "index");
        assert!(config.ids.useslash);
        // Unspecified values keep defaults
        assert_eq!(config.ids.sepchar, '_');
        assert_eq!(config.title, "Wiki");
    }

    #[test]
    fn parse_acl_rules() {
        let toml = r#"
[[acl]]
pattern = "private:*"
level = "none"

[[acl]]
pattern = "private:lobby"
level = "read"
"#;
        let config: WikiConfig = toml::from_str(toml).unwrap();
        assert_eq!(config.acl.len(), 2);
        assert_eq!(config.acl[0].level, AccessLevel::None);
        assert_eq!(config.acl[1].pattern, "private:lobby");
    }

    #[test]
    fn use_heading_scopes() {
        assert!(!UseHeading::Never.for_navigation());
        assert!(UseHeading::Navigation.for_navigation());
        assert!(!UseHeading::Navigation.for_content());
        assert!(UseHeading::Content.for_content());
        assert!(UseHeading::Always.for_navigation());
        assert!(UseHeading::Always.for_content());
    }

    #[test]
    fn load_config_returns_default_when_no_file() {
        let tmp = TempDir::new().unwrap();
        let config = load_config(tmp.path()).unwrap();
        assert_eq!(config, WikiConfig::default());
    }

    #[test]
    fn load_config_reads_file() {
        let tmp = TempDir::new().unwrap();
        fs::write(
            tmp.path().join("config.toml"),
            "title = \"Handbook\"\nuse_heading = \"navigation\"\n",
        )
        .unwrap();
        let config = load_config(tmp.path()).unwrap();
        assert_eq!(config.title, "Handbook");
        assert_eq!(config.use_heading, UseHeading::Navigation);
        assert_eq!(config.start, "start");
    }

    #[test]
    fn load_config_invalid_toml_is_error() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("config.toml"), "this is not valid toml [[[").unwrap();
        let result = load_config(tmp.path());
        assert!(matches!(result, Err(ConfigError::Toml(_))));
    }

    #[test]
    fn merge_toml_scalar_override() {
        let base: toml::Value = toml::from_str("a = 1\nb = 2").unwrap();
        let overlay: toml::Value = toml::from_str("b = 3").unwrap();
        let merged = merge_toml(base, overlay);
        assert_eq!(merged["a"].as_integer(), Some(1));
        assert_eq!(merged["b"].as_integer(), Some(3));
    }

    #[test]
    fn merge_toml_deep_nested() {
        let base: toml::Value = toml::from_str("[ids]\nsepchar = \"_\"\nuseslash = false").unwrap();
        let overlay: toml::Value = toml::from_str("[ids]\nuseslash = true").unwrap();
        let merged = merge_toml(base, overlay);
        assert_eq!(merged["ids"]["sepchar"].as_str(), Some("_"));
        assert_eq!(merged["ids"]["useslash"].as_bool(), Some(true));
    }

    #[test]
    fn unknown_key_rejected() {
        let result: Result<WikiConfig, _> = toml::from_str("unknown = 1");
        assert!(result.is_err());
    }

    #[test]
    fn unknown_nested_key_rejected() {
        let result: Result<WikiConfig, _> = toml::from_str("[urls]\ncdn = \"x\"");
        assert!(result.is_err());
    }

    #[test]
    fn validate_default_config_passes() {
        assert!(WikiConfig::default().validate().is_ok());
    }

    #[test]
    fn validate_start_with_colon() {
        let config = WikiConfig {
            start: "a:b".into(),
            ..WikiConfig::default()
        };
        assert!(matches!(config.validate(), Err(ConfigError::Validation(_))));
    }

    #[test]
    fn validate_sepchar() {
        let mut config = WikiConfig::default();
        config.ids.sepchar = '+';
        assert!(matches!(config.validate(), Err(ConfigError::Validation(_))));
    }

    #[test]
    fn validate_acl_patterns() {
        let rule = |pattern: &str| AclRule {
            pattern: pattern.into(),
            level: AccessLevel::None,
        };
        let ok = WikiConfig {
            acl: vec![rule("*"), rule("a:*"), rule("a:b")],
            ..WikiConfig::default()
        };
        assert!(ok.validate().is_ok());

        let bad = WikiConfig {
            acl: vec![rule("a*b")],
            ..WikiConfig::default()
        };
        assert!(bad.validate().is_err());
    }

    #[test]
    fn load_config_validates_values() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("config.toml"), "start = \"\"\n").unwrap();
        let result = load_config(tmp.path());
        assert!(matches!(result, Err(ConfigError::Validation(_))));
    }

    #[test]
    fn stock_config_toml_is_valid_and_matches_defaults() {
        let content = stock_config_toml();
        let config: WikiConfig = toml::from_str(content).unwrap();
        assert_eq!(config, WikiConfig::default());
    }
}
