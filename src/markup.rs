//! Markdown bodies and their heading outlines.
//!
//! Page text between directives is markdown, rendered with pulldown-cmark.
//! Every heading gets a section anchor from [`SectionIds`], and the same
//! generator is shared across all chunks of a page, so anchors stay unique
//! and match the outline stored in page metadata.

use pulldown_cmark::{CowStr, Event, HeadingLevel, Options, Parser, Tag, TagEnd, html};

use crate::config::IdConfig;
use crate::naming::SectionIds;
use crate::types::Heading;

fn parser_options() -> Options {
    Options::ENABLE_TABLES | Options::ENABLE_STRIKETHROUGH | Options::ENABLE_FOOTNOTES
}

/// Render one markdown chunk, assigning heading anchors from `sections`.
/// Returns the HTML and the headings found, in document order.
pub fn render_markdown(
    source: &str,
    sections: &mut SectionIds,
    ids: &IdConfig,
) -> (String, Vec<Heading>) {
    let mut events: Vec<Event<'_>> = Parser::new_ext(source, parser_options()).collect();
    let headings = assign_anchors(&mut events, sections, ids);

    let mut out = String::new();
    html::push_html(&mut out, events.into_iter());
    (out, headings)
}

/// Headings of a markdown chunk, with the anchors [`render_markdown`] would
/// give them.
pub fn extract_headings(source: &str, sections: &mut SectionIds, ids: &IdConfig) -> Vec<Heading> {
    let mut events: Vec<Event<'_>> = Parser::new_ext(source, parser_options()).collect();
    assign_anchors(&mut events, sections, ids)
}

struct HeadingSpan {
    start: usize,
    level: u8,
    title: String,
}

fn assign_anchors(
    events: &mut [Event<'_>],
    sections: &mut SectionIds,
    ids: &IdConfig,
) -> Vec<Heading> {
    let mut spans: Vec<HeadingSpan> = Vec::new();
    let mut open: Option<HeadingSpan> = None;

    for (idx, event) in events.iter().enumerate() {
        match event {
            Event::Start(Tag::Heading { level, .. }) => {
                open = Some(HeadingSpan {
                    start: idx,
                    level: heading_level(*level),
                    title: String::new(),
                });
            }
            Event::Text(text) | Event::Code(text) => {
                if let Some(span) = open.as_mut() {
                    span.title.push_str(text);
                }
            }
            Event::SoftBreak | Event::HardBreak => {
                if let Some(span) = open.as_mut() {
                    span.title.push(' ');
                }
            }
            Event::End(TagEnd::Heading(_)) => {
                if let Some(span) = open.take() {
                    spans.push(span);
                }
            }
            _ => {}
        }
    }

    let mut headings = Vec::with_capacity(spans.len());
    for span in spans {
        let title = span.title.trim().to_string();
        let anchor = sections.next(&title, ids);
        if let Some(Event::Start(Tag::Heading { id, .. })) = events.get_mut(span.start) {
            *id = Some(CowStr::from(anchor.clone()));
        }
        headings.push(Heading {
            level: span.level,
            anchor,
            title,
        });
    }
    headings
}

fn heading_level(level: HeadingLevel) -> u8 {
    match level {
        HeadingLevel::H1 => 1,
        HeadingLevel::H2 => 2,
        HeadingLevel::H3 => 3,
        HeadingLevel::H4 => 4,
        HeadingLevel::H5 => 5,
        HeadingLevel::H6 => 6,
    }
}
