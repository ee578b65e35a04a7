//! A small query surface over a parsed HTML tree.
//!
//! Field extraction only needs a handful of operations (scoped CSS queries,
//! attributes, text, classes, and a sibling walk), so it is written against
//! [`QueryNode`] instead of a concrete parser type.

use scraper::{ElementRef, Node, Selector};

/// A node following an element among its siblings.
#[derive(Debug, Clone)]
pub enum Sibling<N> {
    Element(N),
    Text(String),
}

pub trait QueryNode: Copy {
    /// Descendants matching `css`, in document order. An invalid selector
    /// matches nothing.
    fn select_all(&self, css: &str) -> Vec<Self>;

    fn select_first(&self, css: &str) -> Option<Self> {
        self.select_all(css).into_iter().next()
    }

    fn attr_value(&self, name: &str) -> Option<String>;

    /// Concatenated text of the node and its descendants.
    fn inner_text(&self) -> String;

    fn tag_name(&self) -> String;

    fn has_class(&self, class: &str) -> bool;

    /// Class tokens of this node and every descendant, in document order.
    fn class_tokens(&self) -> Vec<String>;

    fn parent_element(&self) -> Option<Self>;

    fn child_elements(&self) -> Vec<Self>;

    /// Element and text siblings after this node. Comments are skipped.
    fn following_siblings(&self) -> Vec<Sibling<Self>>;
}

impl<'a> QueryNode for ElementRef<'a> {
    fn select_all(&self, css: &str) -> Vec<Self> {
        match Selector::parse(css) {
            Ok(sel) => self.select(&sel).collect(),
            Err(_) => Vec::new(),
        }
    }

    fn attr_value(&self, name: &str) -> Option<String> {
        self.value().attr(name).map(str::to_string)
    }

    fn inner_text(&self) -> String {
        ElementRef::text(self).collect()
    }

    fn tag_name(&self) -> String {
        self.value().name().to_string()
    }

    fn has_class(&self, class: &str) -> bool {
        self.value().classes().any(|c| c == class)
    }

    fn class_tokens(&self) -> Vec<String> {
        self.descendants()
            .filter_map(ElementRef::wrap)
            .flat_map(|el| el.value().classes().map(str::to_string).collect::<Vec<_>>())
            .collect()
    }

    fn parent_element(&self) -> Option<Self> {
        self.parent().and_then(ElementRef::wrap)
    }

    fn child_elements(&self) -> Vec<Self> {
        self.children().filter_map(ElementRef::wrap).collect()
    }

    fn following_siblings(&self) -> Vec<Sibling<Self>> {
        self.next_siblings()
            .filter_map(|node| match node.value() {
                Node::Text(text) => Some(Sibling::Text(String::from(&**text))),
                Node::Element(_) => ElementRef::wrap(node).map(Sibling::Element),
                _ => None,
            })
            .collect()
    }
}
