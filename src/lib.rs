//! # docnav
//!
//! Book-like navigation for wiki pages. Authors chain pages together with a
//! one-line directive; readers get previous / toc / next bars on every page
//! of the chain, and a table of contents page can list the whole chain as a
//! nested outline.
//!
//! ```text
//! <- intro ^ start ^ setup ->            navigation directive
//! << intro|Back ^ ^ setup|Onwards >>     same, alternative delimiters
//! <doctoc start=intro,includeheadings=1-2,numbers=1>
//! ```
//!
//! # Architecture: Two Passes Per Page
//!
//! ```text
//! 1. Metadata   source  →  record   (triple + headings, persisted per page)
//! 2. HTML       source  →  page     (markdown, outlines, navigation bars)
//! ```
//!
//! Outlines are built by walking `next` links through the stored records of
//! other pages, so a full build runs the metadata pass over every page
//! before any HTML pass. Previews run only the HTML pass, with the page's
//! unsaved triple kept in a per-request cache.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`directive`] | Lexes page text into markdown and directives; parses navigation triples and `<doctoc>` options |
//! | [`resolve`] | Turns relative page references into canonical ids |
//! | [`store`] | Per-request preview cache and triple lookup in persisted metadata |
//! | [`outline`] | Chain walker: builds the outline with back-link, cycle and permission checks |
//! | [`listing`] | Renders outlines as nested HTML lists |
//! | [`navbar`] | Renders the previous / toc / next bars |
//! | [`markup`] | Markdown rendering and heading extraction with section anchors |
//! | [`render`] | The two-pass page pipeline and the HTML document shell |
//! | [`host`] | Traits the engine needs from a wiki: pages, ACL, metadata, headings, links |
//! | [`wiki`] | Filesystem wiki implementing the host traits; builds static sites |
//! | [`config`] | Layered `config.toml` loading and validation |
//! | [`naming`] | Id cleaning, namespace helpers, section anchors |
//! | [`types`] | Shared data types persisted in page metadata |
//! | [`output`] | CLI output formatting |
//!
//! # Design Decisions
//!
//! ## Host Traits Over a Concrete Wiki
//!
//! Everything above [`wiki`] talks to the wiki through the traits in
//! [`host`]. The engine never reads files itself, and unit tests run
//! against an in-memory wiki.
//!
//! ## Warnings Are Values
//!
//! A broken chain never fails a render. Missing back-links and prevented
//! cycles come back as [`outline::WalkWarning`] values on the rendered page
//! and are logged with `tracing`; the outline simply stops.
//!
//! ## Maud For Markup
//!
//! Bars, outlines and documents are built with [Maud](https://maud.lambda.xyz/),
//! so every title and id interpolated into HTML is escaped.

pub mod config;
pub mod directive;
pub mod host;
pub mod listing;
pub mod markup;
pub mod naming;
pub mod navbar;
pub mod outline;
pub mod output;
pub mod render;
pub mod resolve;
pub mod store;
pub mod types;
pub mod wiki;

#[cfg(test)]
pub(crate) mod test_helpers;
