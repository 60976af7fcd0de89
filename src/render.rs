//! Page rendering pipeline.
//!
//! Rendering a page is two passes over its source:
//!
//! 1. **Metadata** ([`collect_metadata`], committed renders only): parse the
//!    navigation directive and the heading outline and persist them as the
//!    page's record. A page without a navigation directive loses its stored
//!    triple.
//! 2. **HTML** ([`render_page`]): parse navigation directives into the
//!    request's preview cache, render markdown chunks and `<doctoc>`
//!    outlines in document order, and wrap the body in the top bar (no toc
//!    link) and the bottom bar (with toc link).
//!
//! Building a whole wiki runs the metadata pass over every page before any
//! HTML pass, so every walk sees the committed triples of all pages.
//!
//! Nothing in the HTML pass fails: broken links render as nothing, and walk
//! problems come back as [`RenderedPage::warnings`].

use maud::{DOCTYPE, Markup, PreEscaped, html};
use thiserror::Error;

use crate::directive::{Token, parse_navigation, parse_toc_options, tokenize};
use crate::host::{HostError, WikiHost};
use crate::listing::render_outline;
use crate::markup::{extract_headings, render_markdown};
use crate::naming::SectionIds;
use crate::navbar::render_bar;
use crate::outline::{WalkWarning, build_outline};
use crate::store::{self, PreviewCache, RenderRequest};
use crate::types::{NavigationTriple, PageRecord};

#[derive(Error, Debug)]
pub enum RenderError {
    #[error("Metadata error: {0}")]
    Host(#[from] HostError),
}

/// Output of the HTML pass for one page.
#[derive(Debug, Clone)]
pub struct RenderedPage {
    pub page_id: String,
    /// Page body including both navigation bars.
    pub html: String,
    /// The page's triple as seen by this render.
    pub navigation: Option<NavigationTriple>,
    /// Problems found by `<doctoc>` walks.
    pub warnings: Vec<WalkWarning>,
    /// False when the output depends on other pages (it contains an
    /// outline) and must be regenerated whenever they change.
    pub cacheable: bool,
}

/// Compute a page's record from its source without storing it.
pub fn page_record<H: WikiHost + ?Sized>(host: &H, page_id: &str, source: &str) -> PageRecord {
    let config = host.config();
    let mut scratch = PreviewCache::new();
    let mut sections = SectionIds::new();
    let mut headings = Vec::new();
    let mut navigation = None;

    for token in tokenize(source) {
        match token {
            Token::Text(text) => {
                headings.extend(extract_headings(text, &mut sections, &config.ids));
            }
            Token::PageNav(text) => {
                navigation = Some(parse_navigation(text, page_id, host, config, &mut scratch));
            }
            Token::DocToc(_) => {}
        }
    }

    PageRecord {
        title: headings.first().map(|h| h.title.clone()),
        headings,
        navigation,
    }
}

/// Metadata pass of a committed render: compute and persist the record.
pub fn collect_metadata<H: WikiHost + ?Sized>(
    host: &mut H,
    page_id: &str,
    source: &str,
) -> Result<PageRecord, RenderError> {
    let record = page_record(&*host, page_id, source);
    store::commit(host, page_id, &record)?;
    Ok(record)
}

/// HTML pass. In preview mode the page's own triple comes from `source`
/// (through the request's preview cache); stored metadata is never written.
pub fn render_page<H: WikiHost + ?Sized>(
    host: &H,
    request: &mut RenderRequest,
    source: &str,
) -> RenderedPage {
    let config = host.config();
    let page_id = request.page_id.clone();
    let tokens = tokenize(source);

    // Directives are parsed before anything renders, so outlines anywhere on
    // the page see the page's own triple.
    for token in &tokens {
        if let Token::PageNav(text) = token {
            parse_navigation(text, &page_id, host, config, &mut request.preview);
        }
    }

    let mut sections = SectionIds::new();
    let mut body = String::new();
    let mut warnings = Vec::new();
    let mut cacheable = true;

    for token in tokens {
        match token {
            Token::Text(text) => {
                let (html, _) = render_markdown(text, &mut sections, &config.ids);
                body.push_str(&html);
            }
            Token::PageNav(_) => {}
            Token::DocToc(text) => {
                cacheable = false;
                let options = parse_toc_options(text, &page_id, host, config);
                let result = build_outline(host, request, &options);
                body.push_str(&render_outline(host, &result.outline).into_string());
                warnings.extend(result.warnings);
            }
        }
    }

    let html = html! {
        (render_bar(host, request, false))
        (PreEscaped(body))
        (render_bar(host, request, true))
    };

    RenderedPage {
        page_id,
        html: html.into_string(),
        navigation: request.navigation(host),
        warnings,
        cacheable,
    }
}

/// Stylesheet for navigation bars and outlines.
pub const STYLE: &str = "\
.docnavbar { display: flex; justify-content: space-between; margin: 1em 0; }
.docnavbar > div { flex: 1; }
.docnavbar .centernav { text-align: center; }
.docnavbar .rightnav { text-align: right; }
.clearer { clear: both; }
ul.pagnavtoc, ol.pagnavtoc { margin: 0 0 0 1.5em; }
ul.pagnavtoc li.clear, ol.pagnavtoc li.clear { list-style: none; }
a.wikilink2 { color: #d30; }
";

/// Wrap a rendered body into a standalone HTML document.
pub fn render_document(title: &str, body: &str) -> Markup {
    html! {
        (DOCTYPE)
        html lang="en" {
            head {
                meta charset="UTF-8";
                meta name="viewport" content="width=device-width, initial-scale=1.0";
                title { (title) }
                style { (PreEscaped(STYLE)) }
            }
            body {
                main.page {
                    (PreEscaped(body))
                }
            }
        }
    }
}
