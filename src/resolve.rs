//! Page reference resolution.
//!
//! Authors write references relative to the page they are editing. The
//! resolver turns them into canonical ids:
//!
//! | Reference (on `book:part1:intro`) | Resolves to |
//! |---|---|
//! | `setup` | `book:part1:setup` |
//! | `.setup`, `.:setup` | `book:part1:setup` |
//! | `..:appendix`, `..appendix` | `book:appendix` |
//! | `~notes` | `book:part1:intro:notes` |
//! | `:start`, `wiki:syntax` | `start`, `wiki:syntax` |
//! | `.part2:`, `.:part2:` | start page of `book:part1:part2` (see below) |
//! | `part2:` | start page of `part2` |
//! | `setup#First Steps` | `book:part1:setup` + fragment `first_steps` |
//!
//! A reference ending in `:` names a namespace. It resolves to `ns:<start>`
//! if that page exists, else to `ns:<last component>`, else to the page `ns`
//! itself, else to `ns:<start>`.
//!
//! Resolution never fails. Garbage in yields a cleaned, best-effort id.

use crate::config::WikiConfig;
use crate::host::PageIndex;
use crate::naming::{clean_id, get_ns, no_ns};

/// A resolved reference.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ResolvedRef {
    pub id: String,
    pub fragment: String,
}

/// Resolves references relative to one context page.
pub struct PageResolver<'a, H: PageIndex + ?Sized> {
    context_id: &'a str,
    context_ns: &'a str,
    host: &'a H,
    config: &'a WikiConfig,
}

impl<'a, H: PageIndex + ?Sized> PageResolver<'a, H> {
    pub fn new(context_id: &'a str, host: &'a H, config: &'a WikiConfig) -> Self {
        Self {
            context_id,
            context_ns: get_ns(context_id).unwrap_or(""),
            host,
            config,
        }
    }

    /// Resolve a reference into a canonical id and a cleaned fragment.
    ///
    /// An empty reference resolves to an empty id. A fragment-only reference
    /// (`#setup`) points into the context page.
    pub fn resolve(&self, raw: &str) -> ResolvedRef {
        let (id_part, hash) = raw.split_once('#').unwrap_or((raw, ""));
        let fragment = clean_id(hash, &self.config.ids);
        let id_part = id_part.trim();

        let id = if id_part.is_empty() {
            if fragment.is_empty() {
                String::new()
            } else {
                self.context_id.to_string()
            }
        } else {
            self.resolve_id(id_part)
        };

        ResolvedRef { id, fragment }
    }

    /// Resolve the page part of a reference (no `#`).
    pub fn resolve_id(&self, raw: &str) -> String {
        let mut id = raw.trim().replace(';', ":");
        if self.config.ids.useslash {
            id = id.replace('/', ":");
        }
        if id.is_empty() {
            return id;
        }

        let id = self.resolve_prefix(id);
        let id = resolve_relatives(&id);
        let id = if id.ends_with(':') {
            self.resolve_start_page(&id)
        } else {
            id
        };
        clean_id(&id, &self.config.ids)
    }

    fn resolve_prefix(&self, mut id: String) -> String {
        // Relative to the current page (makes it a namespace)
        if let Some(rest) = id.strip_prefix('~') {
            id = format!("{}:{}", self.context_id, rest);
        }

        // Relative to the current namespace
        if id.starts_with('.') {
            id = format!("{}:{}", self.context_ns, normalize_leading_dots(&id));
        }

        // A bare name lives in the current namespace
        if !self.context_id.is_empty() && !id.contains(':') {
            id = format!("{}:{}", self.context_ns, id);
        }

        id
    }

    fn resolve_start_page(&self, id: &str) -> String {
        let start = &self.config.start;
        let ns = clean_id(id, &self.config.ids);
        let exists = |candidate: &str| self.host.page_exists(&clean_id(candidate, &self.config.ids));

        let at_start = format!("{id}{start}");
        if exists(&at_start) {
            return at_start;
        }
        let named_like_ns = format!("{id}{}", no_ns(&ns));
        if !ns.is_empty() && exists(&named_like_ns) {
            return named_like_ns;
        }
        if !ns.is_empty() && exists(&ns) {
            return ns;
        }
        at_start
    }
}

/// Insert the colon after a leading run of dots that is directly followed by
/// a name: `..page` → `..:page`, `.page` → `.:page`, `..:a` unchanged.
fn normalize_leading_dots(id: &str) -> String {
    let bytes = id.as_bytes();
    let mut i = 0;
    loop {
        let run_start = i;
        while i < bytes.len() && bytes[i] == b'.' {
            i += 1;
        }
        if i == run_start {
            break;
        }
        if i < bytes.len() && bytes[i] == b':' {
            i += 1;
            continue;
        }
        if i < bytes.len() {
            return format!("{}:{}", &id[..i], &id[i..]);
        }
        break;
    }
    id.to_string()
}

/// Apply `.` and `..` segments and drop empty ones, keeping a trailing colon.
fn resolve_relatives(id: &str) -> String {
    if id.is_empty() {
        return String::new();
    }
    let trail = if id.ends_with(':') { ":" } else { "" };

    let mut result: Vec<&str> = Vec::new();
    for part in id.split(':') {
        match part {
            "" | "." => {}
            ".." => {
                result.pop();
            }
            _ => result.push(part),
        }
    }

    format!("{}{}", result.join(":"), trail)
}
