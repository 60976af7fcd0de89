//! Previous / toc / next navigation bar.
//!
//! Every rendered page with a navigation triple gets two bars: one above the
//! content without the toc link, and one below it with the toc link centered.
//!
//! ```text
//! ← Installation                           Configuration →        (top)
//! ← Installation        Contents           Configuration →        (bottom)
//! ```
//!
//! A page without a triple gets no bar at all.

use maud::{Markup, PreEscaped, html};

use crate::host::WikiHost;
use crate::store::RenderRequest;
use crate::types::{Label, LinkRef, LinkTitle};

const NBSP: PreEscaped<&str> = PreEscaped("&nbsp;");

/// Render the bar of the request's page, or nothing if it has no triple.
pub fn render_bar<H: WikiHost + ?Sized>(
    host: &H,
    request: &RenderRequest,
    show_toc_link: bool,
) -> Markup {
    let Some(triple) = request.navigation(host) else {
        return html! {};
    };

    let link = |link: &LinkRef| {
        host.internal_link(&link.id, &link.fragment, &link_label(host, link))
    };

    html! {
        @if show_toc_link {
            div.clearer {}
        }
        div.docnavbar.showtoc[show_toc_link] {
            div.leftnav {
                @if !triple.previous.is_absent() {
                    "← " (link(&triple.previous))
                }
                (NBSP)
            }
            @if show_toc_link {
                div.centernav {
                    @if !triple.toc.is_absent() {
                        (link(&triple.toc))
                    }
                    (NBSP)
                }
            }
            div.rightnav {
                (NBSP)
                @if !triple.next.is_absent() {
                    (link(&triple.next)) " →"
                }
            }
        }
    }
}

/// Display label of a navigation link. Links without an explicit title get
/// the host's decorated default title of the reference as written.
pub fn link_label<H: WikiHost + ?Sized>(host: &H, link: &LinkRef) -> Label {
    match &link.title {
        LinkTitle::PlainText(text) => Label::Text(text.clone()),
        LinkTitle::Image(image) => Label::Image(image.clone()),
        LinkTitle::UseDefault => {
            let default = host.simple_title(&link.raw_id);
            Label::Text(host.decorate_link_title(None, &default, &link.id))
        }
    }
}
