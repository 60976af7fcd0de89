//! Page id conventions shared by every component.
//!
//! Page ids are colon-separated paths: `book:part1:intro` is the page `intro`
//! in namespace `book:part1`. Ids are lowercase and restricted to a small
//! character set; everything else is replaced by the configured separator
//! character.
//!
//! ## Display titles
//!
//! When an author gives no explicit link title, the title is derived from the
//! id itself ([`simple_title`]):
//! - `book:part1:intro` → "intro"
//! - `book:part1:start` → "part1" (a start page is named after its namespace)
//! - `book:intro#setup` → "setup" (an anchor names itself)

use crate::config::IdConfig;
use std::collections::HashSet;

/// Normalize a raw id: lowercase, alternative separators mapped to `:`,
/// invalid characters replaced by the separator character, and stray
/// punctuation trimmed from every namespace segment.
///
/// - `"Book:Part 1:Intro"` → `"book:part_1:intro"`
/// - `"a;b"` → `"a:b"`
/// - `":_wiki::_syntax."` → `"wiki:syntax"`
pub fn clean_id(raw: &str, ids: &IdConfig) -> String {
    let mut mapped = String::with_capacity(raw.len());
    for c in raw.trim().chars() {
        match c {
            ';' => mapped.push(':'),
            '/' if ids.useslash => mapped.push(':'),
            '.' | '-' | '_' | ':' => mapped.push(c),
            c if c.is_alphanumeric() => mapped.extend(c.to_lowercase()),
            _ => mapped.push(ids.sepchar),
        }
    }

    // Collapse separator runs
    let mut collapsed = String::with_capacity(mapped.len());
    for c in mapped.chars() {
        if c == ids.sepchar && collapsed.ends_with(ids.sepchar) {
            continue;
        }
        collapsed.push(c);
    }

    collapsed
        .split(':')
        .map(|segment| segment.trim_matches(['.', '_', '-']))
        .filter(|segment| !segment.is_empty())
        .collect::<Vec<_>>()
        .join(":")
}

/// Namespace of an id, `None` for root pages.
///
/// - `"a:b:c"` → `Some("a:b")`
/// - `"c"` → `None`
pub fn get_ns(id: &str) -> Option<&str> {
    id.rfind(':')
        .map(|pos| &id[..pos])
        .filter(|ns| !ns.is_empty())
}

/// Last component of an id.
pub fn no_ns(id: &str) -> &str {
    match id.rfind(':') {
        Some(pos) => &id[pos + 1..],
        None => id,
    }
}

/// Last component of an id's namespace.
pub fn cur_ns(id: &str) -> Option<&str> {
    get_ns(id).map(no_ns)
}

/// Last component of an id, or the namespace name if the page is the
/// namespace start page.
pub fn no_ns_or_ns(id: &str, start: &str) -> String {
    let page = no_ns(id);
    if page.is_empty() || page == start {
        return match cur_ns(id) {
            Some(ns) if !ns.is_empty() => ns.to_string(),
            _ => start.to_string(),
        };
    }
    page.to_string()
}

/// Default display title for a raw, unresolved reference.
pub fn simple_title(raw: &str, ids: &IdConfig, start: &str) -> String {
    let (name, hash) = raw.split_once('#').unwrap_or((raw, ""));
    if !hash.is_empty() {
        return hash.to_string();
    }
    let name = if ids.useslash {
        name.replace([';', '/'], ":")
    } else {
        name.replace(';', ":")
    };
    no_ns_or_ns(&name, start)
}

/// Generator of unique section anchors for one page.
///
/// Anchors are cleaned ids of the heading text with `:` and `.` removed and
/// leading digits stripped; repeats get a numeric suffix.
///
/// - `"Getting Started"` → `"getting_started"`
/// - `"1. Intro"` → `"intro"`
/// - `"2024"` → `"section2024"`
/// - a second `"Intro"` → `"intro1"`
#[derive(Debug, Default)]
pub struct SectionIds {
    seen: HashSet<String>,
}

impl SectionIds {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn next(&mut self, title: &str, ids: &IdConfig) -> String {
        let cleaned: String = clean_id(title, ids)
            .chars()
            .filter(|c| *c != ':' && *c != '.')
            .collect();
        let stripped = cleaned.trim_start_matches(|c: char| c.is_ascii_digit() || c == '_' || c == '-');
        let base = if stripped.is_empty() {
            let digits: String = cleaned.chars().filter(char::is_ascii_digit).collect();
            format!("section{digits}")
        } else {
            stripped.to_string()
        };

        let mut candidate = base.clone();
        let mut suffix = 0;
        while self.seen.contains(&candidate) {
            suffix += 1;
            candidate = format!("{base}{suffix}");
        }
        self.seen.insert(candidate.clone());
        candidate
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids() -> IdConfig {
        IdConfig::default()
    }

    #[test]
    fn clean_id_lowercases_and_replaces_spaces() {
        assert_eq!(clean_id("Book:Part 1:Intro", &ids()), "book:part_1:intro");
    }

    #[test]
    fn clean_id_maps_semicolons() {
        assert_eq!(clean_id("a;b", &ids()), "a:b");
    }

    #[test]
    fn clean_id_trims_segment_punctuation() {
        assert_eq!(clean_id(":_wiki::_syntax.", &ids()), "wiki:syntax");
    }

    #[test]
    fn clean_id_collapses_separator_runs() {
        assert_eq!(clean_id("a  &  b", &ids()), "a_b");
    }

    #[test]
    fn clean_id_slash_depends_on_useslash() {
        assert_eq!(clean_id("a/b", &ids()), "a_b");
        let slashy = IdConfig {
            useslash: true,
            ..IdConfig::default()
        };
        assert_eq!(clean_id("a/b", &slashy), "a:b");
    }

    #[test]
    fn clean_id_keeps_unicode_letters() {
        assert_eq!(clean_id("Ärger", &ids()), "ärger");
    }

    #[test]
    fn namespace_helpers() {
        assert_eq!(get_ns("a:b:c"), Some("a:b"));
        assert_eq!(get_ns("c"), None);
        assert_eq!(get_ns(":c"), None);
        assert_eq!(no_ns("a:b:c"), "c");
        assert_eq!(no_ns("c"), "c");
        assert_eq!(cur_ns("a:b:c"), Some("b"));
        assert_eq!(cur_ns("c"), None);
    }

    #[test]
    fn no_ns_or_ns_names_start_pages_after_namespace() {
        assert_eq!(no_ns_or_ns("book:intro", "start"), "intro");
        assert_eq!(no_ns_or_ns("book:start", "start"), "book");
        assert_eq!(no_ns_or_ns("start", "start"), "start");
    }

    #[test]
    fn simple_title_variants() {
        assert_eq!(simple_title("book:Intro", &ids(), "start"), "Intro");
        assert_eq!(simple_title("book:start", &ids(), "start"), "book");
        assert_eq!(simple_title("book:intro#Setup", &ids(), "start"), "Setup");
        assert_eq!(simple_title("a;b", &ids(), "start"), "b");
        assert_eq!(simple_title("", &ids(), "start"), "start");
    }

    #[test]
    fn section_ids_are_unique_per_page() {
        let mut sections = SectionIds::new();
        assert_eq!(sections.next("Getting Started", &ids()), "getting_started");
        assert_eq!(sections.next("Intro", &ids()), "intro");
        assert_eq!(sections.next("Intro", &ids()), "intro1");
        assert_eq!(sections.next("Intro", &ids()), "intro2");
    }

    #[test]
    fn section_ids_strip_leading_numbers() {
        let mut sections = SectionIds::new();
        assert_eq!(sections.next("1. Intro", &ids()), "intro");
        assert_eq!(sections.next("2024", &ids()), "section2024");
        assert_eq!(sections.next("v1.2 Notes", &ids()), "v12_notes");
    }
}
