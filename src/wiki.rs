//! Filesystem-backed wiki host.
//!
//! A wiki is a directory:
//!
//! ```text
//! wiki/
//! ├── config.toml                # Optional, see config module
//! ├── pages/
//! │   ├── start.md               # page "start"
//! │   └── book/
//! │       ├── start.md           # page "book:start"
//! │       └── intro.md           # page "book:intro"
//! └── meta/                      # Written by committed renders
//!     └── book/
//!         └── intro.json
//! ```
//!
//! ## Metadata records
//!
//! Each committed render writes a versioned JSON record next to the other
//! pages' records:
//!
//! ```json
//! {
//!   "version": 1,
//!   "source_hash": "9f86d08…",
//!   "title": "Introduction",
//!   "headings": [{ "level": 1, "anchor": "introduction", "title": "Introduction" }],
//!   "docnavigation": { "previous": { … }, "toc": { … }, "next": { … } },
//!   "references": ["book:start", "book:setup"]
//! }
//! ```
//!
//! Records with another version, or that fail to parse, are treated as
//! missing. `source_hash` is the SHA-256 of the page source at render time;
//! heading outlines are only trusted while it still matches the source.

use std::fs;
use std::path::{Path, PathBuf};

use maud::{Markup, html};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use thiserror::Error;
use tracing::warn;
use walkdir::WalkDir;

use crate::config::{self, ConfigError, UrlConfig, WikiConfig};
use crate::directive::{Token, tokenize};
use crate::host::{
    AccessLevel, HeadingIndex, HostError, LinkRenderer, MetadataStore, PageIndex, WikiHost,
};
use crate::markup::extract_headings;
use crate::naming::{self, SectionIds, get_ns};
use crate::outline::WalkWarning;
use crate::render::{self, RenderError, RenderedPage};
use crate::store::RenderRequest;
use crate::types::{Heading, ImageAlign, Label, NavigationTriple, PageRecord, RenderMode};

/// Version of the metadata record format. Bump to invalidate stored records.
pub const META_VERSION: u32 = 1;

const PAGES_DIR: &str = "pages";
const META_DIR: &str = "meta";
const PAGE_EXT: &str = "md";

#[derive(Error, Debug)]
pub enum WikiError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),
    #[error("Metadata error: {0}")]
    Host(#[from] HostError),
    #[error("Directory walk error: {0}")]
    Walk(#[from] walkdir::Error),
    #[error("Render error: {0}")]
    Render(#[from] RenderError),
    #[error("Page not found: {0}")]
    PageNotFound(String),
}

/// On-disk metadata record of one page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct MetaFile {
    version: u32,
    source_hash: String,
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    headings: Vec<Heading>,
    #[serde(default)]
    docnavigation: Option<NavigationTriple>,
    /// Ids the stored triple links to.
    #[serde(default)]
    references: Vec<String>,
}

/// One page written by [`FsWiki::build`].
#[derive(Debug, Clone)]
pub struct BuiltPage {
    pub id: String,
    /// Output file, relative to the output directory.
    pub path: String,
    pub warnings: Vec<WalkWarning>,
}

/// A wiki stored as a directory of markdown pages.
#[derive(Debug, Clone)]
pub struct FsWiki {
    root: PathBuf,
    config: WikiConfig,
}

impl FsWiki {
    /// Open the wiki at `root`, loading its `config.toml`.
    pub fn open(root: &Path) -> Result<Self, WikiError> {
        let config = config::load_config(root)?;
        Ok(Self::with_config(root, config))
    }

    pub fn with_config(root: &Path, config: WikiConfig) -> Self {
        Self {
            root: root.to_path_buf(),
            config,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Source file of a page: `pages/book/intro.md` for `book:intro`.
    pub fn page_path(&self, id: &str) -> PathBuf {
        self.root
            .join(PAGES_DIR)
            .join(format!("{}.{PAGE_EXT}", id_to_path(id)))
    }

    /// Metadata record of a page: `meta/book/intro.json` for `book:intro`.
    pub fn meta_path(&self, id: &str) -> PathBuf {
        self.root
            .join(META_DIR)
            .join(format!("{}.json", id_to_path(id)))
    }

    pub fn read_source(&self, id: &str) -> Result<String, WikiError> {
        let path = self.page_path(id);
        if !path.is_file() {
            return Err(WikiError::PageNotFound(id.to_string()));
        }
        Ok(fs::read_to_string(path)?)
    }

    /// Create or replace a page's source.
    pub fn write_source(&self, id: &str, source: &str) -> Result<(), WikiError> {
        let path = self.page_path(id);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, source)?;
        Ok(())
    }

    /// Every page id under `pages/`, sorted.
    pub fn pages(&self) -> Result<Vec<String>, WikiError> {
        let pages_dir = self.root.join(PAGES_DIR);
        if !pages_dir.is_dir() {
            return Ok(Vec::new());
        }

        let mut ids = Vec::new();
        for entry in WalkDir::new(&pages_dir) {
            let entry = entry?;
            let path = entry.path();
            if !entry.file_type().is_file()
                || path.extension().and_then(|e| e.to_str()) != Some(PAGE_EXT)
            {
                continue;
            }
            let Ok(relative) = path.with_extension("").strip_prefix(&pages_dir).map(Path::to_path_buf)
            else {
                continue;
            };
            let id = relative
                .components()
                .map(|c| c.as_os_str().to_string_lossy())
                .collect::<Vec<_>>()
                .join(":");
            ids.push(id);
        }
        ids.sort();
        Ok(ids)
    }

    /// Committed render of a stored page: metadata pass, then HTML pass.
    pub fn render(&mut self, id: &str) -> Result<RenderedPage, WikiError> {
        let source = self.read_source(id)?;
        render::collect_metadata(self, id, &source)?;
        let mut request = RenderRequest::new(id, RenderMode::Show);
        Ok(render::render_page(&*self, &mut request, &source))
    }

    /// Preview of unsaved text for a page. Stored metadata is left alone.
    pub fn preview(&self, id: &str, source: &str) -> RenderedPage {
        let mut request = RenderRequest::new(id, RenderMode::Preview);
        render::render_page(self, &mut request, source)
    }

    /// Standalone HTML document of a rendered page.
    pub fn document(&self, page: &RenderedPage) -> String {
        let title = self
            .first_heading(&page.page_id)
            .unwrap_or_else(|| self.simple_title(&page.page_id));
        render::render_document(&format!("{title} - {}", self.config.title), &page.html)
            .into_string()
    }

    /// Render every page into `output`: the metadata pass over all pages
    /// first, then the HTML pass, one `<ns>/<page>.html` per page.
    pub fn build(&mut self, output: &Path) -> Result<Vec<BuiltPage>, WikiError> {
        let ids = self.pages()?;

        let mut sources = Vec::with_capacity(ids.len());
        for id in &ids {
            let source = self.read_source(id)?;
            render::collect_metadata(self, id, &source)?;
            sources.push(source);
        }

        let mut built = Vec::with_capacity(ids.len());
        for (id, source) in ids.iter().zip(&sources) {
            let mut request = RenderRequest::new(id, RenderMode::Show);
            let page = render::render_page(&*self, &mut request, source);

            let path = page_html_path(id);
            let target = output.join(&path);
            if let Some(parent) = target.parent() {
                fs::create_dir_all(parent)?;
            }
            fs::write(&target, self.document(&page))?;

            built.push(BuiltPage {
                id: id.clone(),
                path,
                warnings: page.warnings,
            });
        }
        Ok(built)
    }

    /// Stored record of a page, if a committed render wrote one.
    pub fn record(&self, id: &str) -> Option<PageRecord> {
        self.read_meta(id).map(|meta| PageRecord {
            title: meta.title,
            headings: meta.headings,
            navigation: meta.docnavigation,
        })
    }

    fn read_meta(&self, id: &str) -> Option<MetaFile> {
        let path = self.meta_path(id);
        let content = fs::read_to_string(&path).ok()?;
        match serde_json::from_str::<MetaFile>(&content) {
            Ok(meta) if meta.version == META_VERSION => Some(meta),
            Ok(meta) => {
                warn!(
                    page = id,
                    version = meta.version,
                    "ignoring metadata record with unknown version"
                );
                None
            }
            Err(err) => {
                warn!(page = id, error = %err, "ignoring unreadable metadata record");
                None
            }
        }
    }

    fn source_hash(&self, id: &str) -> Option<String> {
        fs::read(self.page_path(id)).ok().map(|bytes| hash_bytes(&bytes))
    }

    /// Best-effort heading scan of a page source, skipping directives.
    fn scan_headings(&self, id: &str) -> Vec<Heading> {
        let Ok(source) = fs::read_to_string(self.page_path(id)) else {
            return Vec::new();
        };
        let mut sections = SectionIds::new();
        tokenize(&source)
            .into_iter()
            .filter_map(|token| match token {
                Token::Text(text) => Some(text),
                _ => None,
            })
            .flat_map(|text| extract_headings(text, &mut sections, &self.config.ids))
            .collect()
    }
}

impl PageIndex for FsWiki {
    fn page_exists(&self, id: &str) -> bool {
        !id.is_empty() && self.page_path(id).is_file()
    }

    fn access_level(&self, id: &str) -> AccessLevel {
        acl_level(&self.config, id)
    }
}

impl MetadataStore for FsWiki {
    fn navigation(&self, id: &str) -> Option<NavigationTriple> {
        self.read_meta(id).and_then(|meta| meta.docnavigation)
    }

    fn persist(&mut self, id: &str, record: &PageRecord) -> Result<(), HostError> {
        let meta = MetaFile {
            version: META_VERSION,
            source_hash: self.source_hash(id).unwrap_or_default(),
            title: record.title.clone(),
            headings: record.headings.clone(),
            references: record
                .navigation
                .as_ref()
                .map(NavigationTriple::referenced_ids)
                .unwrap_or_default(),
            docnavigation: record.navigation.clone(),
        };

        let path = self.meta_path(id);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(&meta)?;
        fs::write(path, json)?;
        Ok(())
    }
}

impl HeadingIndex for FsWiki {
    fn first_heading(&self, id: &str) -> Option<String> {
        self.read_meta(id).and_then(|meta| meta.title)
    }

    fn heading_outline(&self, id: &str) -> Vec<Heading> {
        let current = self.source_hash(id);
        match self.read_meta(id) {
            Some(meta)
                if current.is_none() || current.as_deref() == Some(meta.source_hash.as_str()) =>
            {
                meta.headings
            }
            _ => self.scan_headings(id),
        }
    }
}

impl LinkRenderer for FsWiki {
    fn internal_link(&self, id: &str, fragment: &str, label: &Label) -> Markup {
        link_markup(&self.config.urls, id, fragment, self.page_exists(id), label)
    }

    fn simple_title(&self, raw_id: &str) -> String {
        naming::simple_title(raw_id, &self.config.ids, &self.config.start)
    }

    fn decorate_link_title(&self, title: Option<&str>, default: &str, target: &str) -> String {
        decorate_title(&self.config, title, default, self.first_heading(target))
    }
}

impl WikiHost for FsWiki {
    fn config(&self) -> &WikiConfig {
        &self.config
    }
}

// =============================================================================
// Shared host helpers
// =============================================================================

/// SHA-256 of some bytes, as a hex string.
pub fn hash_bytes(bytes: &[u8]) -> String {
    format!("{:x}", Sha256::digest(bytes))
}

fn id_to_path(id: &str) -> String {
    id.replace(':', "/")
}

/// Path of a page's HTML relative to the site root: `book/intro.html`.
pub fn page_html_path(id: &str) -> String {
    format!("{}.html", id_to_path(id))
}

/// URL of a page, with an optional heading anchor.
pub fn page_url(urls: &UrlConfig, id: &str, fragment: &str) -> String {
    let mut url = format!("{}{}", urls.base_url, page_html_path(id));
    if !fragment.is_empty() {
        url.push('#');
        url.push_str(fragment);
    }
    url
}

/// Access level from the ACL: the exact page rule, else the closest
/// `ns:*` rule walking up, else `*`, else the default. Among rules with the
/// same pattern the last one wins.
pub fn acl_level(config: &WikiConfig, id: &str) -> AccessLevel {
    let rule = |pattern: &str| {
        config
            .acl
            .iter()
            .rev()
            .find(|rule| rule.pattern == pattern)
            .map(|rule| rule.level)
    };

    if let Some(level) = rule(id) {
        return level;
    }
    let mut ns = get_ns(id);
    while let Some(current) = ns {
        if let Some(level) = rule(&format!("{current}:*")) {
            return level;
        }
        ns = get_ns(current);
    }
    rule("*").unwrap_or(config.default_access)
}

/// Link markup: `wikilink1` for existing pages, `wikilink2` otherwise.
pub fn link_markup(urls: &UrlConfig, id: &str, fragment: &str, exists: bool, label: &Label) -> Markup {
    let class = if exists { "wikilink1" } else { "wikilink2" };
    html! {
        a href=(page_url(urls, id, fragment)) class=(class) title=(id) {
            (label_markup(urls, label))
        }
    }
}

/// Markup of a link label: escaped text, or an image.
pub fn label_markup(urls: &UrlConfig, label: &Label) -> Markup {
    match label {
        Label::Text(text) => html! { (text) },
        Label::Image(image) => {
            let src = if image.is_external() {
                image.src.clone()
            } else {
                format!(
                    "{}{}",
                    urls.media_base,
                    image.src.trim_start_matches(':').replace(':', "/")
                )
            };
            let class = image.align.map(|align| match align {
                ImageAlign::Left => "medialeft",
                ImageAlign::Right => "mediaright",
                ImageAlign::Center => "mediacenter",
            });
            html! {
                img src=(src)
                    class=[class]
                    alt=(image.caption.as_deref().unwrap_or(""))
                    title=[image.caption.as_deref()]
                    width=[image.width]
                    height=[image.height];
            }
        }
    }
}

/// Final link text: the explicit title, else the target's first heading
/// when headings are used for content links, else the default.
pub fn decorate_title(
    config: &WikiConfig,
    title: Option<&str>,
    default: &str,
    first_heading: Option<String>,
) -> String {
    if let Some(title) = title {
        return title.to_string();
    }
    if config.use_heading.for_content()
        && let Some(heading) = first_heading.filter(|h| !h.is_empty())
    {
        return heading;
    }
    default.to_string()
}
