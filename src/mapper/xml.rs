//! Small DOM helpers over `roxmltree` shared by every mapper.

use roxmltree::{Document, Node, ParsingOptions};

use crate::app::FeedError;

pub const MEDIA_NS: &str = "http://search.yahoo.com/mrss/";
pub const CONTENT_NS: &str = "http://purl.org/rss/1.0/modules/content/";
pub const DC_NS: &str = "http://purl.org/dc/elements/1.1/";
pub const ATOM_NS: &str = "http://www.w3.org/2005/Atom";

/// An element name, optionally qualified by namespace URI.
///
/// An unqualified tag matches elements in the feed's own vocabulary: no
/// namespace, or whatever default namespace is in scope (Atom, RSS 1.0).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Tag {
    pub ns: Option<&'static str>,
    pub name: &'static str,
}

impl Tag {
    pub const fn plain(name: &'static str) -> Self {
        Self { ns: None, name }
    }

    pub const fn ns(ns: &'static str, name: &'static str) -> Self {
        Self { ns: Some(ns), name }
    }

    pub fn matches(&self, node: Node<'_, '_>) -> bool {
        if !node.is_element() || node.tag_name().name() != self.name {
            return false;
        }
        match self.ns {
            Some(ns) => node.tag_name().namespace() == Some(ns),
            None => node.tag_name().namespace() == node.lookup_namespace_uri(None),
        }
    }
}

pub fn parse_document(text: &str) -> Result<Document<'_>, FeedError> {
    let options = ParsingOptions {
        allow_dtd: true,
        ..ParsingOptions::default()
    };
    Document::parse_with_options(text, options).map_err(|e| FeedError::Parse(e.to_string()))
}

/// Concatenated text of every descendant text node, trimmed.
pub fn text_content(node: Node<'_, '_>) -> String {
    node.descendants()
        .filter(|n| n.is_text())
        .filter_map(|n| n.text())
        .collect::<String>()
        .trim()
        .to_string()
}

pub fn child<'a, 'input>(node: Node<'a, 'input>, tag: Tag) -> Option<Node<'a, 'input>> {
    node.children().find(|n| tag.matches(*n))
}

pub fn descendants<'a, 'input>(
    node: Node<'a, 'input>,
    tag: Tag,
) -> impl Iterator<Item = Node<'a, 'input>> {
    node.descendants().skip(1).filter(move |n| tag.matches(*n))
}

/// First child among `tags` (tried in order) with non-empty text.
pub fn child_text_any(node: Node<'_, '_>, tags: &[Tag]) -> Option<String> {
    tags.iter().find_map(|tag| {
        child(node, *tag)
            .map(text_content)
            .filter(|text| !text.is_empty())
    })
}

/// Trimmed, non-empty attribute value.
pub fn attr(node: Node<'_, '_>, name: &str) -> Option<String> {
    node.attribute(name)
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(String::from)
}
