use roxmltree::{Document, Node};

use crate::mapper::image::ImageStrategy;
use crate::mapper::xml::{attr, child, text_content, Tag};
use crate::mapper::{FeedFormat, Profile};

/// Generic Atom 1.0.
pub const GENERIC_ATOM: Profile = Profile {
    name: "atom",
    format: FeedFormat::Atom,
    title_tags: &[Tag::plain("title")],
    description_tags: &[Tag::plain("summary"), Tag::plain("content")],
    date_tags: &[Tag::plain("updated"), Tag::plain("published")],
    image_chain: &[
        ImageStrategy::MediaThumbnail,
        ImageStrategy::MediaContentTyped,
        ImageStrategy::Enclosure,
    ],
    channel_logo: false,
};

/// `rel="alternate"` href, else the first link's href, else its text.
pub fn entry_link(entry: Node<'_, '_>) -> String {
    let link = Tag::plain("link");
    let alternate = entry
        .children()
        .filter(|n| link.matches(*n))
        .find(|n| n.attribute("rel") == Some("alternate"));

    alternate
        .or_else(|| child(entry, link))
        .map(|n| attr(n, "href").unwrap_or_else(|| text_content(n)))
        .unwrap_or_default()
}

/// Feed-level `<logo>`, falling back to `<icon>`.
pub fn feed_logo(doc: &Document<'_>) -> Option<String> {
    let root = doc.root_element();
    [Tag::plain("logo"), Tag::plain("icon")]
        .into_iter()
        .filter_map(|tag| child(root, tag))
        .map(text_content)
        .find(|url| !url.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mapper::xml::parse_document;
    use crate::mapper::Mapper;

    const ATOM_SAMPLE: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<feed xmlns="http://www.w3.org/2005/Atom" xmlns:media="http://search.yahoo.com/mrss/">
  <title>Atom Test Feed</title>
  <logo>https://example.com/atom-logo.png</logo>
  <entry>
    <title>Atom Entry 1</title>
    <link rel="self" href="https://example.com/atom1.xml"/>
    <link rel="alternate" href="https://example.com/atom1"/>
    <id>atom-entry-1</id>
    <updated>2024-01-01T00:00:00Z</updated>
    <published>2023-12-31T00:00:00Z</published>
    <summary>This is Atom entry 1</summary>
    <media:content url="https://example.com/content.jpg" type="image/jpeg"/>
    <media:thumbnail url="https://example.com/thumb.jpg"/>
  </entry>
  <entry>
    <title>Atom Entry 2</title>
    <link href="https://example.com/atom2"/>
    <published>2024-01-03T00:00:00Z</published>
    <content type="html">Full content of entry 2</content>
  </entry>
  <entry>
    <title>Summary-less</title>
    <link href="https://example.com/atom3"/>
  </entry>
</feed>"#;

    #[test]
    fn test_parse_atom() {
        let articles = GENERIC_ATOM.parse(ATOM_SAMPLE, "atom-test", None).unwrap();

        assert_eq!(articles.len(), 2);
        assert_eq!(articles[0].title, "Atom Entry 1");
        assert_eq!(articles[0].link, "https://example.com/atom1");
        assert_eq!(articles[0].description, "This is Atom entry 1");
        assert_eq!(articles[1].link, "https://example.com/atom2");
        assert_eq!(articles[1].description, "Full content of entry 2");
    }

    #[test]
    fn test_updated_preferred_over_published() {
        let articles = GENERIC_ATOM.parse(ATOM_SAMPLE, "atom-test", None).unwrap();
        assert_eq!(articles[0].published_at, 1_704_067_200_000);
        assert_eq!(articles[1].published_at, 1_704_240_000_000);
    }

    #[test]
    fn test_thumbnail_beats_media_content() {
        let articles = GENERIC_ATOM.parse(ATOM_SAMPLE, "atom-test", None).unwrap();
        assert_eq!(
            articles[0].image_url.as_deref(),
            Some("https://example.com/thumb.jpg")
        );
        assert_eq!(articles[1].image_url, None);
    }

    #[test]
    fn test_generic_atom_leaves_logo_absent() {
        let articles = GENERIC_ATOM.parse(ATOM_SAMPLE, "atom-test", None).unwrap();
        assert!(articles.iter().all(|a| a.source_logo_url.is_none()));
    }

    #[test]
    fn test_atom_profile_with_feed_logo() {
        let profile = Profile {
            channel_logo: true,
            ..GENERIC_ATOM
        };
        let articles = profile.parse(ATOM_SAMPLE, "atom-test", None).unwrap();
        assert_eq!(
            articles[0].source_logo_url.as_deref(),
            Some("https://example.com/atom-logo.png")
        );
    }

    #[test]
    fn test_link_text_fallback() {
        let doc = parse_document(
            r#"<feed xmlns="http://www.w3.org/2005/Atom"><entry><link>https://example.com/text</link></entry></feed>"#,
        )
        .unwrap();
        let entry = doc.descendants().find(|n| n.has_tag_name("entry")).unwrap();
        assert_eq!(entry_link(entry), "https://example.com/text");
    }
}
