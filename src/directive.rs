//! Inline directive parsing.
//!
//! Two directives are recognized in page source:
//!
//! ```text
//! <- previous ^ toc ^ next ->        navigation triple (also << ... >>)
//! <doctoc start=intro,includeheadings=2-3,numbers=1>
//! ```
//!
//! Each slot of the triple is `link` or `link|title`; a title of the form
//! `{{image.png?32|caption}}` is an image. Directives never fail to parse:
//! missing slots are empty, unknown doctoc options are ignored, and
//! unresolvable references simply produce no link.

use std::sync::LazyLock;

use regex::Regex;

use crate::config::WikiConfig;
use crate::host::PageIndex;
use crate::naming::{clean_id, get_ns, no_ns};
use crate::outline::{HeadingRange, TocOptions};
use crate::resolve::PageResolver;
use crate::store::PreviewCache;
use crate::types::{ImageAlign, ImageLinking, ImageRef, LinkRef, LinkTitle, NavigationTriple};

static DIRECTIVE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?P<nav><-[^\n]*\^[^\n]*\^[^\n]*->|<<[^\n]*\^[^\n]*\^[^\n]*>>)|(?P<toc>(?s:<doctoc\b.*?>))",
    )
    .unwrap()
});

static IMAGE_TITLE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^\{\{[^}]+\}\}$").unwrap());

static IMAGE_SIZE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d+)(?:[xX](\d+))?").unwrap());

/// A piece of page source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token<'a> {
    Text(&'a str),
    PageNav(&'a str),
    DocToc(&'a str),
}

/// Split page source into plain text and directive matches, in order.
pub fn tokenize(source: &str) -> Vec<Token<'_>> {
    let mut tokens = Vec::new();
    let mut last = 0;
    for caps in DIRECTIVE_RE.captures_iter(source) {
        let Some(m) = caps.get(0) else {
            continue;
        };
        if m.start() > last {
            tokens.push(Token::Text(&source[last..m.start()]));
        }
        tokens.push(if caps.name("nav").is_some() {
            Token::PageNav(m.as_str())
        } else {
            Token::DocToc(m.as_str())
        });
        last = m.end();
    }
    if last < source.len() {
        tokens.push(Token::Text(&source[last..]));
    }
    tokens
}

// =============================================================================
// Navigation triple
// =============================================================================

/// Parse a navigation directive found on `context_id`.
///
/// The triple is also written into `cache` under `context_id`, so a preview
/// of this page sees what was just parsed.
pub fn parse_navigation<H: PageIndex + ?Sized>(
    text: &str,
    context_id: &str,
    host: &H,
    config: &WikiConfig,
    cache: &mut PreviewCache,
) -> NavigationTriple {
    let body = text
        .strip_prefix("<-")
        .or_else(|| text.strip_prefix("<<"))
        .unwrap_or(text);
    let body = body
        .strip_suffix("->")
        .or_else(|| body.strip_suffix(">>"))
        .unwrap_or(body);

    let mut slots = body.splitn(3, '^');
    let mut next_slot = || slots.next().unwrap_or("");
    let previous = next_slot();
    let toc = next_slot();
    let next = next_slot();

    let resolver = PageResolver::new(context_id, host, config);
    let triple = NavigationTriple {
        previous: parse_slot(previous, Slot::Previous, context_id, host, config, &resolver),
        toc: parse_slot(toc, Slot::Toc, context_id, host, config, &resolver),
        next: parse_slot(next, Slot::Next, context_id, host, config, &resolver),
    };

    cache.insert(context_id, triple.clone());
    triple
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Slot {
    Previous,
    Toc,
    Next,
}

fn parse_slot<H: PageIndex + ?Sized>(
    segment: &str,
    slot: Slot,
    context_id: &str,
    host: &H,
    config: &WikiConfig,
    resolver: &PageResolver<'_, H>,
) -> LinkRef {
    let (link, title) = match segment.split_once('|') {
        Some((link, title)) => (link, parse_title(title)),
        None => (segment, LinkTitle::UseDefault),
    };

    let mut link = link.trim().to_string();
    if slot == Slot::Toc && link.is_empty() {
        link = namespace_head(context_id, host, config).unwrap_or_default();
    }

    let resolved = resolver.resolve(&link);
    let suppress = slot != Slot::Toc && resolved.id == context_id;
    let (id, fragment) = if suppress {
        (String::new(), String::new())
    } else {
        (resolved.id, resolved.fragment)
    };

    LinkRef {
        id,
        fragment,
        raw_id: link,
        title,
    }
}

fn parse_title(title: &str) -> LinkTitle {
    let title = title.trim();
    if title.is_empty() {
        LinkTitle::UseDefault
    } else if IMAGE_TITLE_RE.is_match(title) {
        LinkTitle::Image(parse_media(title))
    } else {
        LinkTitle::PlainText(title.to_string())
    }
}

/// Reference to the head page of the context page's namespace: its start
/// page, a page named like the namespace inside it, or the page named like
/// the namespace itself; the first that exists.
fn namespace_head<H: PageIndex + ?Sized>(
    context_id: &str,
    host: &H,
    config: &WikiConfig,
) -> Option<String> {
    let exists = |reference: &str| host.page_exists(&clean_id(reference, &config.ids));
    let start = &config.start;

    let Some(ns) = get_ns(context_id) else {
        let root_start = format!(":{start}");
        return exists(&root_start).then_some(root_start);
    };

    let ns_start = format!("{ns}:{start}");
    if exists(&ns_start) {
        return Some(ns_start);
    }
    let ns_named = format!("{ns}:{}", no_ns(ns));
    if exists(&ns_named) {
        return Some(ns_named);
    }
    if exists(ns) {
        return Some(if get_ns(ns).is_none() {
            format!(":{ns}")
        } else {
            ns.to_string()
        });
    }
    None
}

// =============================================================================
// Media titles
// =============================================================================

/// Parse `{{ src?params | caption }}`.
///
/// Spaces around `src` set the alignment: both sides center, leading only
/// right, trailing only left. Parameters after the last `?` give the size
/// (`200` or `200x100`) and the link behavior (`nolink`, `direct`,
/// `linkonly`).
pub fn parse_media(text: &str) -> ImageRef {
    let inner = text.strip_prefix("{{").unwrap_or(text);
    let inner = inner.strip_suffix("}}").unwrap_or(inner);
    let (target, caption) = match inner.split_once('|') {
        Some((target, caption)) => (target, Some(caption.trim().to_string())),
        None => (inner, None),
    };

    let leading = target.starts_with(' ');
    let trailing = target.ends_with(' ');
    let align = match (leading, trailing) {
        (true, true) => Some(ImageAlign::Center),
        (true, false) => Some(ImageAlign::Right),
        (false, true) => Some(ImageAlign::Left),
        (false, false) => None,
    };

    let target = target.trim();
    let (src, params) = target.rsplit_once('?').unwrap_or((target, ""));

    let (width, height) = match IMAGE_SIZE_RE.captures(params) {
        Some(size) => (
            size.get(1).and_then(|m| m.as_str().parse().ok()),
            size.get(2).and_then(|m| m.as_str().parse().ok()),
        ),
        None => (None, None),
    };

    let lower = params.to_lowercase();
    let linking = if lower.contains("nolink") {
        ImageLinking::NoLink
    } else if lower.contains("direct") {
        ImageLinking::Direct
    } else if lower.contains("linkonly") {
        ImageLinking::LinkOnly
    } else {
        ImageLinking::Details
    };

    ImageRef {
        src: src.to_string(),
        caption: caption.filter(|c| !c.is_empty()),
        align,
        width,
        height,
        linking,
    }
}

// =============================================================================
// doctoc options
// =============================================================================

/// Parse the options of a `<doctoc ...>` directive found on `context_id`.
pub fn parse_toc_options<H: PageIndex + ?Sized>(
    text: &str,
    context_id: &str,
    host: &H,
    config: &WikiConfig,
) -> TocOptions {
    let body = text.strip_prefix("<doctoc").unwrap_or(text);
    let body = body.strip_suffix('>').unwrap_or(body);

    let mut options = TocOptions::for_page(context_id, config);
    let resolver = PageResolver::new(context_id, host, config);

    for option in body.split(',') {
        let (key, value) = option.split_once('=').unwrap_or((option, ""));
        let value = value.trim();
        match key.trim() {
            "start" => {
                let start = resolver.resolve(value).id;
                if !start.is_empty() {
                    options.start = start;
                    options.previous = Some(context_id.to_string());
                }
            }
            "includeheadings" => {
                let (lo, hi) = value.split_once('-').unwrap_or((value, ""));
                options.include_headings =
                    Some(HeadingRange::normalized(leading_int(lo), leading_int(hi)));
            }
            "numbers" => options.numbered = truthy(value),
            "useheading" => options.use_heading = truthy(value),
            "hidepagelink" => options.hide_page_links = truthy(value),
            _ => {}
        }
    }

    if options.hide_page_links && options.include_headings.is_none() {
        options.include_headings = Some(HeadingRange { lo: 1, hi: 2 });
    }
    options
}

fn truthy(value: &str) -> bool {
    !value.is_empty() && value != "0"
}

/// Integer value of the leading digits (with optional sign), 0 if none.
fn leading_int(text: &str) -> i64 {
    let text = text.trim();
    let (sign, digits) = match text.strip_prefix('-') {
        Some(rest) => (-1, rest),
        None => (1, text.strip_prefix('+').unwrap_or(text)),
    };
    let end = digits
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(digits.len());
    digits[..end].parse::<i64>().map(|n| sign * n).unwrap_or(0)
}
