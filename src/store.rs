//! Per-page navigation storage.
//!
//! A page's navigation triple has two homes:
//!
//! - **Committed renders** write it into the page's durable metadata record
//!   through [`MetadataStore::persist`]. The last full render wins.
//! - **Previews** of unsaved text keep it in the request's [`PreviewCache`],
//!   which lives exactly as long as one [`RenderRequest`]. Stored metadata is
//!   never touched by a preview.
//!
//! Readers go through [`load`], which picks the source by [`RenderMode`].

use std::collections::HashMap;

use tracing::debug;

use crate::host::{HostError, MetadataStore};
use crate::types::{NavigationTriple, PageRecord, RenderMode};

/// Triples parsed during one render request, keyed by page id.
///
/// Re-parsing a page overwrites its entry.
#[derive(Debug, Clone, Default)]
pub struct PreviewCache {
    entries: HashMap<String, NavigationTriple>,
}

impl PreviewCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, page_id: &str, triple: NavigationTriple) {
        self.entries.insert(page_id.to_string(), triple);
    }

    pub fn get(&self, page_id: &str) -> Option<&NavigationTriple> {
        self.entries.get(page_id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Context of rendering one page: which page, in which mode, and the
/// triples parsed so far.
#[derive(Debug, Clone)]
pub struct RenderRequest {
    pub page_id: String,
    pub mode: RenderMode,
    pub preview: PreviewCache,
}

impl RenderRequest {
    pub fn new(page_id: &str, mode: RenderMode) -> Self {
        Self {
            page_id: page_id.to_string(),
            mode,
            preview: PreviewCache::new(),
        }
    }

    /// Mode to read another page's triple in. Only the page being rendered
    /// has unsaved text; every other page is read from stored metadata.
    pub fn mode_for(&self, page_id: &str) -> RenderMode {
        if page_id == self.page_id {
            self.mode
        } else {
            RenderMode::Show
        }
    }

    /// Triple of the page being rendered.
    pub fn navigation<H: MetadataStore + ?Sized>(&self, host: &H) -> Option<NavigationTriple> {
        self.navigation_of(host, &self.page_id)
    }

    /// Triple of any page, as seen from this request.
    pub fn navigation_of<H: MetadataStore + ?Sized>(
        &self,
        host: &H,
        page_id: &str,
    ) -> Option<NavigationTriple> {
        load(host, &self.preview, page_id, self.mode_for(page_id))
    }
}

/// Read a page's triple: the preview cache in preview mode, stored metadata
/// otherwise. `None` when the source has nothing for the page.
pub fn load<H: MetadataStore + ?Sized>(
    host: &H,
    cache: &PreviewCache,
    page_id: &str,
    mode: RenderMode,
) -> Option<NavigationTriple> {
    match mode {
        RenderMode::Preview => cache.get(page_id).cloned(),
        RenderMode::Show => host.navigation(page_id),
    }
}

/// Write the record of a committed render, replacing the stored one.
pub fn commit<H: MetadataStore + ?Sized>(
    host: &mut H,
    page_id: &str,
    record: &PageRecord,
) -> Result<(), HostError> {
    debug!(
        page = page_id,
        navigation = record.navigation.is_some(),
        headings = record.headings.len(),
        "persisting page record"
    );
    host.persist(page_id, record)
}
