//! Shared test utilities for the docnav test suite.
//!
//! Provides [`MemoryWiki`], an in-memory [`WikiHost`] whose pages, headings,
//! navigation triples and permissions are set up directly by the test, plus
//! small builders for links and triples.
//!
//! # Usage
//!
//! ```rust
//! use crate::test_helpers::*;
//!
//! let mut wiki = MemoryWiki::new();
//! wiki.chain(&["book:a", "book:b", "book:c"]);
//! wiki.set_headings("book:b", &[(1, "Bee"), (2, "Usage")]);
//! wiki.deny("book:c");
//! ```

use std::collections::{BTreeSet, HashMap, HashSet};

use maud::Markup;

use crate::config::WikiConfig;
use crate::host::{
    AccessLevel, HeadingIndex, HostError, LinkRenderer, MetadataStore, PageIndex, WikiHost,
};
use crate::naming::{self, SectionIds};
use crate::types::{Heading, Label, LinkRef, NavigationTriple, PageRecord};
use crate::wiki;

// =========================================================================
// In-memory host
// =========================================================================

#[derive(Debug, Default)]
pub struct MemoryWiki {
    pub config: WikiConfig,
    pages: BTreeSet<String>,
    titles: HashMap<String, String>,
    headings: HashMap<String, Vec<Heading>>,
    navigation: HashMap<String, NavigationTriple>,
    denied: HashSet<String>,
    /// Ids passed to `persist`, in call order.
    pub persisted: Vec<String>,
}

impl MemoryWiki {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_page(&mut self, id: &str) -> &mut Self {
        self.pages.insert(id.to_string());
        self
    }

    /// Store a triple for `id` as if a committed render had parsed it.
    /// Empty strings leave a slot absent.
    pub fn set_navigation(&mut self, id: &str, previous: &str, toc: &str, next: &str) -> &mut Self {
        self.add_page(id);
        self.navigation
            .insert(id.to_string(), triple(previous, toc, next));
        self
    }

    /// Link `ids` into a linear chain: each page points back to its
    /// predecessor and forward to its successor.
    pub fn chain(&mut self, ids: &[&str]) -> &mut Self {
        for (i, id) in ids.iter().enumerate() {
            let previous = if i > 0 { ids[i - 1] } else { "" };
            let next = ids.get(i + 1).copied().unwrap_or("");
            self.set_navigation(id, previous, "", next);
        }
        self
    }

    /// Give a page a heading outline. The first heading becomes its title.
    pub fn set_headings(&mut self, id: &str, headings: &[(u8, &str)]) -> &mut Self {
        self.add_page(id);
        let mut sections = SectionIds::new();
        let outline: Vec<Heading> = headings
            .iter()
            .map(|(level, title)| Heading {
                level: *level,
                anchor: sections.next(title, &self.config.ids),
                title: title.to_string(),
            })
            .collect();
        if let Some(first) = outline.first() {
            self.titles.insert(id.to_string(), first.title.clone());
        }
        self.headings.insert(id.to_string(), outline);
        self
    }

    /// Withdraw read access to a page from the viewer.
    pub fn deny(&mut self, id: &str) -> &mut Self {
        self.denied.insert(id.to_string());
        self
    }
}

impl PageIndex for MemoryWiki {
    fn page_exists(&self, id: &str) -> bool {
        self.pages.contains(id)
    }

    fn access_level(&self, id: &str) -> AccessLevel {
        if self.denied.contains(id) {
            AccessLevel::None
        } else {
            AccessLevel::Read
        }
    }
}

impl MetadataStore for MemoryWiki {
    fn navigation(&self, id: &str) -> Option<NavigationTriple> {
        self.navigation.get(id).cloned()
    }

    fn persist(&mut self, id: &str, record: &PageRecord) -> Result<(), HostError> {
        self.pages.insert(id.to_string());
        match &record.navigation {
            Some(triple) => {
                self.navigation.insert(id.to_string(), triple.clone());
            }
            None => {
                self.navigation.remove(id);
            }
        }
        match &record.title {
            Some(title) => {
                self.titles.insert(id.to_string(), title.clone());
            }
            None => {
                self.titles.remove(id);
            }
        }
        self.headings.insert(id.to_string(), record.headings.clone());
        self.persisted.push(id.to_string());
        Ok(())
    }
}

impl HeadingIndex for MemoryWiki {
    fn first_heading(&self, id: &str) -> Option<String> {
        self.titles.get(id).cloned()
    }

    fn heading_outline(&self, id: &str) -> Vec<Heading> {
        self.headings.get(id).cloned().unwrap_or_default()
    }
}

impl LinkRenderer for MemoryWiki {
    fn internal_link(&self, id: &str, fragment: &str, label: &Label) -> Markup {
        wiki::link_markup(
            &self.config.urls,
            id,
            fragment,
            self.page_exists(id),
            label,
        )
    }

    fn simple_title(&self, raw_id: &str) -> String {
        naming::simple_title(raw_id, &self.config.ids, &self.config.start)
    }

    fn decorate_link_title(&self, title: Option<&str>, default: &str, target: &str) -> String {
        wiki::decorate_title(&self.config, title, default, self.first_heading(target))
    }
}

impl WikiHost for MemoryWiki {
    fn config(&self) -> &WikiConfig {
        &self.config
    }
}

// =========================================================================
// Builders
// =========================================================================

/// A link with a resolved id and no explicit title.
pub fn link(id: &str) -> LinkRef {
    LinkRef {
        id: id.to_string(),
        raw_id: id.to_string(),
        ..LinkRef::default()
    }
}

/// A triple of untitled links; empty strings are absent slots.
pub fn triple(previous: &str, toc: &str, next: &str) -> NavigationTriple {
    NavigationTriple {
        previous: link(previous),
        toc: link(toc),
        next: link(next),
    }
}
