//! Host collaborator traits.
//!
//! The navigation engine never touches storage, permissions or URL schemes
//! itself. It talks to the wiki through four narrow traits, bundled as
//! [`WikiHost`]:
//!
//! | Trait | Provides |
//! |---|---|
//! | [`PageIndex`] | page existence and the viewer's access level |
//! | [`MetadataStore`] | durable per-page records (navigation triple, headings) |
//! | [`HeadingIndex`] | cached first heading and heading outline of a page |
//! | [`LinkRenderer`] | link markup and default link titles |
//!
//! The production implementation is [`FsWiki`](crate::wiki::FsWiki), a wiki
//! stored as a directory of markdown files. Tests use an in-memory host.

use crate::config::WikiConfig;
use crate::types::{Heading, Label, NavigationTriple, PageRecord};
use maud::Markup;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum HostError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// What the current viewer may do with a page, in increasing order.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum AccessLevel {
    None,
    #[default]
    Read,
    Edit,
    Create,
    Upload,
    Delete,
}

impl AccessLevel {
    pub fn can_read(self) -> bool {
        self >= AccessLevel::Read
    }
}

/// Page existence and permissions.
pub trait PageIndex {
    fn page_exists(&self, id: &str) -> bool;

    /// Access level of the current viewer for a page.
    fn access_level(&self, id: &str) -> AccessLevel;
}

/// Durable per-page metadata.
pub trait MetadataStore {
    /// Stored navigation triple of a page, if its last committed render had one.
    fn navigation(&self, id: &str) -> Option<NavigationTriple>;

    /// Replace the stored record of a page.
    fn persist(&mut self, id: &str, record: &PageRecord) -> Result<(), HostError>;
}

/// Cached heading data. Implementations must answer from stored data or a
/// cheap scan of the source; they never render other pages.
pub trait HeadingIndex {
    fn first_heading(&self, id: &str) -> Option<String>;

    fn heading_outline(&self, id: &str) -> Vec<Heading>;
}

/// Link markup and title rules.
pub trait LinkRenderer {
    /// Markup of a link to a page (and optional heading anchor).
    fn internal_link(&self, id: &str, fragment: &str, label: &Label) -> Markup;

    /// Default display title of a raw reference.
    fn simple_title(&self, raw_id: &str) -> String;

    /// Final link text: the explicit title when given, otherwise the
    /// host's preferred title for `target` (e.g. its first heading),
    /// otherwise `default`.
    fn decorate_link_title(&self, title: Option<&str>, default: &str, target: &str) -> String;
}

/// Everything the engine needs from a wiki.
pub trait WikiHost: PageIndex + MetadataStore + HeadingIndex + LinkRenderer {
    fn config(&self) -> &WikiConfig;
}
