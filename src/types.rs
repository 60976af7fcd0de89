//! Shared records passed between the parser, the store, the renderers and the
//! chain walker.
//!
//! Everything here is serializable: navigation triples and heading outlines
//! are persisted as page metadata and read back by later renders.

use serde::{Deserialize, Serialize};

/// How a page is being rendered.
///
/// `Show` is a committed render: navigation parsed from the page is written to
/// durable metadata. `Preview` renders unsaved text: parsed navigation only
/// lives in the request's [`PreviewCache`](crate::store::PreviewCache).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RenderMode {
    #[default]
    Show,
    Preview,
}

/// Alignment of an embedded image, taken from the spaces around its source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageAlign {
    Left,
    Right,
    Center,
}

/// What clicking an embedded image does.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageLinking {
    #[default]
    Details,
    Direct,
    NoLink,
    LinkOnly,
}

/// An image used as a link title, parsed from `{{ src?WxH | caption }}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageRef {
    pub src: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub caption: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub align: Option<ImageAlign>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<u32>,
    #[serde(default)]
    pub linking: ImageLinking,
}

impl ImageRef {
    /// True for `http://`, `https://` and other scheme-qualified sources.
    pub fn is_external(&self) -> bool {
        self.src.contains("://")
    }
}

/// Title of a navigation link as written by the author.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum LinkTitle {
    /// No `|title` given: derive the title from the raw id at render time.
    #[default]
    UseDefault,
    PlainText(String),
    Image(ImageRef),
}

/// Display label handed to the link renderer once defaults are resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Label {
    Text(String),
    Image(ImageRef),
}

/// One navigation endpoint of a page.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct LinkRef {
    /// Canonical page id. Empty when nothing was given or the link was
    /// suppressed; an empty id renders as no link at all.
    pub id: String,
    /// Heading anchor inside the target page, empty if none.
    #[serde(default)]
    pub fragment: String,
    /// The reference as the author wrote it (after trimming and the toc
    /// fallback), kept for default title derivation.
    #[serde(default)]
    pub raw_id: String,
    #[serde(default)]
    pub title: LinkTitle,
}

impl LinkRef {
    pub fn is_absent(&self) -> bool {
        self.id.is_empty()
    }
}

/// The previous/toc/next record attached to one page.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct NavigationTriple {
    pub previous: LinkRef,
    pub toc: LinkRef,
    pub next: LinkRef,
}

impl NavigationTriple {
    /// The three links in reading order.
    pub fn links(&self) -> [&LinkRef; 3] {
        [&self.previous, &self.toc, &self.next]
    }

    /// Ids of all present links, in reading order, without duplicates.
    pub fn referenced_ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = Vec::new();
        for link in self.links() {
            if !link.is_absent() && !ids.contains(&link.id) {
                ids.push(link.id.clone());
            }
        }
        ids
    }
}

/// One heading of a page's outline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Heading {
    /// 1 for `#`, 2 for `##`, and so on.
    pub level: u8,
    /// Section anchor, unique within the page.
    pub anchor: String,
    pub title: String,
}

/// Everything a committed render records about a page.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PageRecord {
    /// First heading of the page, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub headings: Vec<Heading>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub navigation: Option<NavigationTriple>,
}
