//! Chain walker and aggregated table of contents.
//!
//! A `<doctoc>` directive walks the chain of `next` links from a start page
//! and collects every page (and optionally a range of its headings) into an
//! [`Outline`]:
//!
//! ```text
//! intro ──next──▶ setup ──next──▶ usage ──next──▶ (none)
//!
//! • intro
//!     • Install          (headings 2-2 of setup, page shown)
//! • setup
//! • usage
//! ```
//!
//! The walk is read-only and always terminates: every walked page is
//! recorded, and a `next` link back into the walked set stops the walk with
//! a [`WalkWarning::CyclePrevented`]. A page whose `previous` link does not
//! point back at the page the walk came from yields a
//! [`WalkWarning::MissingBacklink`] and the walk continues.
//!
//! Pages the viewer may not read contribute nothing to the outline and are
//! never named in a warning, but the walk still follows their `next` link.

use std::collections::HashSet;
use std::fmt;

use tracing::{debug, warn};

use crate::config::WikiConfig;
use crate::host::WikiHost;
use crate::naming::get_ns;
use crate::store::RenderRequest;

/// Inclusive range of heading levels to list, `lo <= hi`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HeadingRange {
    pub lo: u8,
    pub hi: u8,
}

impl HeadingRange {
    /// Build a range from raw option values: a start below 1 becomes 2, an
    /// end below 1 becomes the start, and reversed bounds are swapped.
    pub fn normalized(start: i64, end: i64) -> Self {
        let start = if start < 1 { 2 } else { start };
        let end = if end < 1 { start } else { end };
        let (lo, hi) = if start > end { (end, start) } else { (start, end) };
        Self {
            lo: clamp_level(lo),
            hi: clamp_level(hi),
        }
    }

    pub fn contains(&self, level: u8) -> bool {
        (self.lo..=self.hi).contains(&level)
    }
}

fn clamp_level(level: i64) -> u8 {
    u8::try_from(level).unwrap_or(u8::MAX)
}

/// Options of one `<doctoc>` occurrence. Built per directive, consumed by a
/// single walk, never persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TocOptions {
    /// First page of the chain.
    pub start: String,
    /// Page the walk is considered to come from, checked against the start
    /// page's `previous` link.
    pub previous: Option<String>,
    pub include_headings: Option<HeadingRange>,
    pub numbered: bool,
    pub use_heading: bool,
    pub hide_page_links: bool,
}

impl TocOptions {
    /// Defaults for a directive on `page_id`: walk from the page itself.
    pub fn for_page(page_id: &str, config: &WikiConfig) -> Self {
        Self {
            start: page_id.to_string(),
            previous: None,
            include_headings: None,
            numbered: false,
            use_heading: config.use_heading.for_navigation(),
            hide_page_links: false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    /// A page, headings disabled.
    PageOnly,
    /// A page followed by its headings.
    PageWithHeadings,
    Heading,
    /// First listed heading of a page whose own entry is hidden.
    FirstHeading,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutlineEntry {
    /// Page id, or `page#anchor` for headings.
    pub id: String,
    pub namespace: Option<String>,
    pub kind: EntryKind,
    /// Nesting level, 1 = outermost.
    pub level: u8,
    /// Display title; `None` shows the last id component.
    pub title: Option<String>,
    pub ordered: bool,
}

impl OutlineEntry {
    /// Page id and anchor of the link target.
    pub fn target(&self) -> (&str, &str) {
        self.id.split_once('#').unwrap_or((&self.id, ""))
    }
}

/// Outline entries in walk order, keyed by id.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Outline {
    entries: Vec<OutlineEntry>,
    keys: HashSet<String>,
}

impl Outline {
    /// Append an entry. An entry with an id already present is dropped.
    pub fn insert(&mut self, entry: OutlineEntry) -> bool {
        if !self.keys.insert(entry.id.clone()) {
            return false;
        }
        self.entries.push(entry);
        true
    }

    pub fn contains(&self, id: &str) -> bool {
        self.keys.contains(id)
    }

    pub fn get(&self, id: &str) -> Option<&OutlineEntry> {
        self.entries.iter().find(|e| e.id == id)
    }

    pub fn entries(&self) -> &[OutlineEntry] {
        &self.entries
    }

    pub fn ids(&self) -> Vec<&str> {
        self.entries.iter().map(|e| e.id.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// A non-fatal problem found while walking a chain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WalkWarning {
    /// `page` was reached from `previous`, but does not link back to it.
    MissingBacklink { page: String, previous: String },
    /// `page` links to `next`, which the walk already visited.
    CyclePrevented { page: String, next: String },
}

impl fmt::Display for WalkWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WalkWarning::MissingBacklink { page, previous } => {
                write!(f, "page {page} does not link back to previous page {previous}")
            }
            WalkWarning::CyclePrevented { page, next } => {
                write!(
                    f,
                    "walk stopped: page {page} links to already listed page {next}"
                )
            }
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WalkResult {
    pub outline: Outline,
    pub warnings: Vec<WalkWarning>,
}

/// Walk the chain from `options.start` and collect the outline.
///
/// The page being rendered is read in the request's mode (so a preview sees
/// its own unsaved triple); every other page is read from stored metadata.
/// Headings come from the host's cached outlines and never trigger a render.
pub fn build_outline<H: WikiHost + ?Sized>(
    host: &H,
    request: &RenderRequest,
    options: &TocOptions,
) -> WalkResult {
    let mut result = WalkResult::default();
    let mut walked: HashSet<String> = HashSet::new();
    let mut previous = options.previous.clone();
    let mut current = Some(options.start.clone()).filter(|id| !id.is_empty());

    while let Some(page_id) = current.take() {
        walked.insert(page_id.clone());
        let readable = host.access_level(&page_id).can_read();
        debug!(page = %page_id, readable, "walking chain");

        if readable {
            add_page(host, options, &page_id, &mut result.outline);
        }

        let triple = request.navigation_of(host, &page_id);

        if let Some(prev) = &previous {
            let links_back = triple
                .as_ref()
                .is_some_and(|t| !t.previous.is_absent() && t.previous.id == *prev);
            if !links_back
                && host.page_exists(&page_id)
                && readable
                && host.access_level(prev).can_read()
            {
                let warning = WalkWarning::MissingBacklink {
                    page: page_id.clone(),
                    previous: prev.clone(),
                };
                warn!("{warning}");
                result.warnings.push(warning);
            }
        }

        let next = triple.map(|t| t.next.id).unwrap_or_default();
        if next.is_empty() {
            break;
        }
        if walked.contains(&next) {
            if readable && host.access_level(&next).can_read() {
                let warning = WalkWarning::CyclePrevented {
                    page: page_id.clone(),
                    next,
                };
                warn!("{warning}");
                result.warnings.push(warning);
            }
            break;
        }

        previous = Some(page_id);
        current = Some(next);
    }

    result
}

/// Insert the entries of one readable page.
fn add_page<H: WikiHost + ?Sized>(
    host: &H,
    options: &TocOptions,
    page_id: &str,
    outline: &mut Outline,
) {
    let base_level: u8 = if options.hide_page_links {
        1
    } else {
        let title = if options.use_heading {
            host.first_heading(page_id)
        } else {
            None
        };
        outline.insert(OutlineEntry {
            id: page_id.to_string(),
            namespace: get_ns(page_id).map(str::to_string),
            kind: if options.include_headings.is_some() {
                EntryKind::PageWithHeadings
            } else {
                EntryKind::PageOnly
            },
            level: 1,
            title,
            ordered: options.numbered,
        });
        2
    };

    let Some(range) = options.include_headings else {
        return;
    };

    let mut first = true;
    for heading in host.heading_outline(page_id) {
        if !range.contains(heading.level) {
            continue;
        }
        let kind = if options.hide_page_links && first {
            first = false;
            EntryKind::FirstHeading
        } else {
            EntryKind::Heading
        };
        let id = format!("{page_id}#{}", heading.anchor);
        outline.insert(OutlineEntry {
            namespace: get_ns(&id).map(str::to_string),
            id,
            kind,
            level: base_level.saturating_add(heading.level).saturating_sub(range.lo),
            title: Some(heading.title),
            ordered: options.numbered,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::*;
    use crate::types::RenderMode;

    fn options(start: &str) -> TocOptions {
        TocOptions::for_page(start, &WikiConfig::default())
    }

    fn walk(wiki: &MemoryWiki, options: &TocOptions) -> WalkResult {
        let request = RenderRequest::new(&options.start, RenderMode::Show);
        build_outline(wiki, &request, options)
    }

    fn levels(outline: &Outline) -> Vec<u8> {
        outline.entries().iter().map(|e| e.level).collect()
    }

    // =========================================================================
    // Heading range normalization
    // =========================================================================

    #[test]
    fn heading_range_defaults() {
        assert_eq!(HeadingRange::normalized(0, 0), HeadingRange { lo: 2, hi: 2 });
        assert_eq!(HeadingRange::normalized(3, 0), HeadingRange { lo: 3, hi: 3 });
        assert_eq!(HeadingRange::normalized(4, 2), HeadingRange { lo: 2, hi: 4 });
        assert_eq!(HeadingRange::normalized(-1, 3), HeadingRange { lo: 2, hi: 3 });
    }

    // =========================================================================
    // Outline collection
    // =========================================================================

    #[test]
    fn outline_ignores_duplicate_ids() {
        let mut outline = Outline::default();
        let entry = OutlineEntry {
            id: "a".into(),
            namespace: None,
            kind: EntryKind::PageOnly,
            level: 1,
            title: None,
            ordered: false,
        };
        assert!(outline.insert(entry.clone()));
        assert!(!outline.insert(OutlineEntry {
            level: 3,
            ..entry
        }));
        assert_eq!(outline.len(), 1);
        assert_eq!(outline.get("a").unwrap().level, 1);
    }

    #[test]
    fn linear_chain_lists_every_page_in_order() {
        let mut wiki = MemoryWiki::new();
        wiki.chain(&["book:a", "book:b", "book:c"]);

        let result = walk(&wiki, &options("book:a"));
        assert_eq!(result.outline.ids(), vec!["book:a", "book:b", "book:c"]);
        assert!(result.warnings.is_empty());

        let first = result.outline.get("book:a").unwrap();
        assert_eq!(first.kind, EntryKind::PageOnly);
        assert_eq!(first.level, 1);
        assert_eq!(first.namespace.as_deref(), Some("book"));
        assert_eq!(first.title, None);
    }

    #[test]
    fn walk_is_idempotent() {
        let mut wiki = MemoryWiki::new();
        wiki.chain(&["a", "b", "c"]);
        wiki.set_headings("b", &[(1, "Bee"), (2, "Usage")]);
        let mut opts = options("a");
        opts.include_headings = Some(HeadingRange { lo: 1, hi: 2 });

        assert_eq!(walk(&wiki, &opts), walk(&wiki, &opts));
    }

    #[test]
    fn cycle_stops_with_one_warning() {
        let mut wiki = MemoryWiki::new();
        wiki.set_navigation("a", "", "", "b");
        wiki.set_navigation("b", "a", "", "a");

        let result = walk(&wiki, &options("a"));
        assert_eq!(result.outline.ids(), vec!["a", "b"]);
        assert_eq!(
            result.warnings,
            vec![WalkWarning::CyclePrevented {
                page: "b".into(),
                next: "a".into(),
            }]
        );
    }

    #[test]
    fn self_loop_stops() {
        let mut wiki = MemoryWiki::new();
        wiki.set_navigation("a", "", "", "a");

        let result = walk(&wiki, &options("a"));
        assert_eq!(result.outline.ids(), vec!["a"]);
        assert_eq!(result.warnings.len(), 1);
    }

    #[test]
    fn missing_backlink_warns_and_continues() {
        let mut wiki = MemoryWiki::new();
        wiki.set_navigation("a", "", "", "b");
        wiki.set_navigation("b", "elsewhere", "", "");

        let result = walk(&wiki, &options("a"));
        assert_eq!(result.outline.ids(), vec!["a", "b"]);
        assert_eq!(
            result.warnings,
            vec![WalkWarning::MissingBacklink {
                page: "b".into(),
                previous: "a".into(),
            }]
        );
    }

    #[test]
    fn nonexistent_page_is_listed_without_backlink_warning() {
        let mut wiki = MemoryWiki::new();
        wiki.set_navigation("a", "", "", "ghost");

        let result = walk(&wiki, &options("a"));
        assert_eq!(result.outline.ids(), vec!["a", "ghost"]);
        assert!(result.warnings.is_empty());
    }

    #[test]
    fn explicit_previous_is_checked_on_start_page() {
        let mut wiki = MemoryWiki::new();
        wiki.chain(&["a", "b"]);
        let mut opts = options("a");
        opts.previous = Some("toc".into());
        wiki.add_page("toc");

        let result = walk(&wiki, &opts);
        assert_eq!(
            result.warnings,
            vec![WalkWarning::MissingBacklink {
                page: "a".into(),
                previous: "toc".into(),
            }]
        );
    }

    #[test]
    fn unreadable_page_is_skipped_silently() {
        let mut wiki = MemoryWiki::new();
        wiki.chain(&["a", "b", "c"]);
        wiki.set_headings("a", &[(1, "A"), (2, "A two")]);
        wiki.set_headings("b", &[(1, "B"), (2, "B two")]);
        wiki.set_headings("c", &[(1, "C"), (2, "C two")]);
        wiki.deny("b");
        let mut opts = options("a");
        opts.include_headings = Some(HeadingRange { lo: 2, hi: 2 });

        let result = walk(&wiki, &opts);
        assert_eq!(result.outline.ids(), vec!["a", "a#a_two", "c", "c#c_two"]);
        assert_eq!(levels(&result.outline), vec![1, 2, 1, 2]);
        assert!(result.warnings.is_empty());
    }

    #[test]
    fn unreadable_page_is_not_named_in_warnings() {
        let mut wiki = MemoryWiki::new();
        wiki.set_navigation("a", "", "", "secret");
        wiki.set_navigation("secret", "nobody", "", "a");
        wiki.deny("secret");

        let result = walk(&wiki, &options("a"));
        assert_eq!(result.outline.ids(), vec!["a"]);
        assert!(result.warnings.is_empty());
    }

    #[test]
    fn heading_levels_follow_page_level() {
        let mut wiki = MemoryWiki::new();
        wiki.add_page("p");
        wiki.set_headings("p", &[(1, "Title"), (2, "One"), (2, "Two"), (3, "Deep")]);
        let mut opts = options("p");
        opts.include_headings = Some(HeadingRange { lo: 2, hi: 3 });

        let result = walk(&wiki, &opts);
        assert_eq!(result.outline.ids(), vec!["p", "p#one", "p#two", "p#deep"]);
        assert_eq!(levels(&result.outline), vec![1, 2, 2, 3]);
        assert_eq!(
            result.outline.get("p").unwrap().kind,
            EntryKind::PageWithHeadings
        );
        assert_eq!(
            result.outline.get("p#deep").unwrap().title.as_deref(),
            Some("Deep")
        );
    }

    #[test]
    fn hidden_page_links_promote_first_heading() {
        let mut wiki = MemoryWiki::new();
        wiki.chain(&["a", "b"]);
        wiki.set_headings("a", &[(1, "Alpha"), (2, "Install")]);
        wiki.set_headings("b", &[(1, "Beta")]);
        let mut opts = options("a");
        opts.hide_page_links = true;
        opts.include_headings = Some(HeadingRange { lo: 1, hi: 2 });

        let result = walk(&wiki, &opts);
        assert_eq!(result.outline.ids(), vec!["a#alpha", "a#install", "b#beta"]);
        assert_eq!(levels(&result.outline), vec![1, 2, 1]);
        let kinds: Vec<EntryKind> = result.outline.entries().iter().map(|e| e.kind).collect();
        assert_eq!(
            kinds,
            vec![EntryKind::FirstHeading, EntryKind::Heading, EntryKind::FirstHeading]
        );
    }

    #[test]
    fn hidden_page_links_still_detect_cycles() {
        let mut wiki = MemoryWiki::new();
        wiki.set_navigation("a", "b", "", "b");
        wiki.set_navigation("b", "a", "", "a");
        let mut opts = options("a");
        opts.hide_page_links = true;
        opts.include_headings = Some(HeadingRange { lo: 1, hi: 2 });

        let result = walk(&wiki, &opts);
        assert!(result.outline.is_empty());
        assert_eq!(result.warnings.len(), 1);
    }

    #[test]
    fn use_heading_sets_page_titles() {
        let mut wiki = MemoryWiki::new();
        wiki.chain(&["a", "b"]);
        wiki.set_headings("a", &[(1, "Alpha")]);
        let mut opts = options("a");
        opts.use_heading = true;

        let result = walk(&wiki, &opts);
        assert_eq!(result.outline.get("a").unwrap().title.as_deref(), Some("Alpha"));
        assert_eq!(result.outline.get("b").unwrap().title, None);
    }

    #[test]
    fn numbered_marks_every_entry_ordered() {
        let mut wiki = MemoryWiki::new();
        wiki.chain(&["a", "b"]);
        let mut opts = options("a");
        opts.numbered = true;

        let result = walk(&wiki, &opts);
        assert!(result.outline.entries().iter().all(|e| e.ordered));
    }

    #[test]
    fn preview_walk_sees_unsaved_triple_of_current_page() {
        let mut wiki = MemoryWiki::new();
        wiki.chain(&["a", "b"]);
        wiki.set_navigation("c", "a", "", "");

        let mut request = RenderRequest::new("a", RenderMode::Preview);
        request.preview.insert("a", triple("", "", "c"));

        let result = build_outline(&wiki, &request, &options("a"));
        assert_eq!(result.outline.ids(), vec!["a", "c"]);
    }

    #[test]
    fn out_of_range_heading_levels_saturate() {
        let mut wiki = MemoryWiki::new();
        wiki.chain(&["a"]);
        wiki.set_headings("a", &[(u8::MAX, "Deep")]);
        let mut opts = options("a");
        opts.include_headings = Some(HeadingRange::normalized(1, 999));

        let result = walk(&wiki, &opts);
        let levels: Vec<u8> = result.outline.entries().iter().map(|e| e.level).collect();
        assert_eq!(levels, vec![1, u8::MAX - 1]);
    }

    #[test]
    fn entry_target_splits_anchor() {
        let entry = OutlineEntry {
            id: "book:a#setup".into(),
            namespace: Some("book".into()),
            kind: EntryKind::Heading,
            level: 2,
            title: None,
            ordered: false,
        };
        assert_eq!(entry.target(), ("book:a", "setup"));
    }
}
