//! Nested list formatting for outlines.
//!
//! Outline entries are flat, each carrying a nesting level. The formatter
//! turns them into nested lists:
//!
//! ```html
//! <ul class="pagnavtoc">
//!   <li class="level1"><div class="li">intro</div>
//!     <ul class="pagnavtoc">
//!       <li class="level2"><div class="li">Install</div></li>
//!     </ul>
//!   </li>
//! </ul>
//! ```
//!
//! A jump of more than one level (1 → 3) fills the gap with an empty
//! `<li class="clear">` holding the deeper list. A list whose first entry is
//! ordered is rendered as `<ol>`.

use maud::{Markup, html};

use crate::host::LinkRenderer;
use crate::naming::no_ns;
use crate::outline::{EntryKind, Outline, OutlineEntry};
use crate::types::Label;

/// CSS class of every outline list.
pub const OUTLINE_CLASS: &str = "pagnavtoc";

#[derive(Debug, Default)]
struct ListNode<'a> {
    entry: Option<&'a OutlineEntry>,
    children: Vec<ListNode<'a>>,
}

impl<'a> ListNode<'a> {
    /// Last child, creating a placeholder when there is none.
    fn last_child(&mut self) -> &mut ListNode<'a> {
        if self.children.is_empty() {
            self.children.push(ListNode::default());
        }
        let last = self.children.len() - 1;
        &mut self.children[last]
    }
}

fn build_tree(entries: &[OutlineEntry]) -> ListNode<'_> {
    let mut root = ListNode::default();
    for entry in entries {
        let mut node = &mut root;
        for _ in 1..entry.level.max(1) {
            node = node.last_child();
        }
        node.children.push(ListNode {
            entry: Some(entry),
            children: Vec::new(),
        });
    }
    root
}

/// Render entries as nested lists, formatting each item with `item`.
/// Nothing is rendered for no entries.
pub fn render_list(
    entries: &[OutlineEntry],
    class: &str,
    item: &dyn Fn(&OutlineEntry) -> Markup,
) -> Markup {
    let root = build_tree(entries);
    if root.children.is_empty() {
        return html! {};
    }
    render_nodes(&root.children, class, item)
}

fn render_nodes(nodes: &[ListNode<'_>], class: &str, item: &dyn Fn(&OutlineEntry) -> Markup) -> Markup {
    let ordered = nodes
        .iter()
        .find_map(|node| node.entry)
        .is_some_and(|entry| entry.ordered);

    let items = html! {
        @for node in nodes {
            (render_node(node, class, item))
        }
    };

    html! {
        @if ordered {
            ol class=(class) { (items) }
        } @else {
            ul class=(class) { (items) }
        }
    }
}

fn render_node(node: &ListNode<'_>, class: &str, item: &dyn Fn(&OutlineEntry) -> Markup) -> Markup {
    let children = (!node.children.is_empty()).then(|| render_nodes(&node.children, class, item));

    html! {
        @match node.entry {
            Some(entry) => {
                li class={ "level" (entry.level) } {
                    div.li { (item(entry)) }
                    @if let Some(children) = &children { (children) }
                }
            }
            None => {
                li.clear {
                    @if let Some(children) = &children { (children) }
                }
            }
        }
    }
}

/// Link markup of one outline entry. Untitled entries show the last id
/// component; pages with headings and promoted first headings are bold.
pub fn outline_item<H: LinkRenderer + ?Sized>(host: &H, entry: &OutlineEntry) -> Markup {
    let name = match &entry.title {
        Some(title) => title.clone(),
        None => no_ns(&entry.id).to_string(),
    };
    let (page, fragment) = entry.target();
    let link = host.internal_link(page, fragment, &Label::Text(name));

    html! {
        @if matches!(entry.kind, EntryKind::PageWithHeadings | EntryKind::FirstHeading) {
            strong { (link) }
        } @else {
            (link)
        }
    }
}

/// Render a walked outline with the host's links.
pub fn render_outline<H: LinkRenderer + ?Sized>(host: &H, outline: &Outline) -> Markup {
    render_list(outline.entries(), OUTLINE_CLASS, &|entry| outline_item(host, entry))
}
