use roxmltree::{Document, Node};

use crate::mapper::image::ImageStrategy;
use crate::mapper::xml::{child, text_content, Tag, CONTENT_NS, DC_NS};
use crate::mapper::{FeedFormat, Profile};

pub const TITLE_TAGS: &[Tag] = &[Tag::plain("title")];

pub const DESCRIPTION_TAGS: &[Tag] = &[
    Tag::plain("description"),
    Tag::plain("summary"),
    Tag::ns(CONTENT_NS, "encoded"),
];

pub const DATE_TAGS: &[Tag] = &[Tag::plain("pubDate"), Tag::ns(DC_NS, "date")];

/// Generic RSS 0.9x/1.0/2.0.
pub const GENERIC_RSS: Profile = Profile {
    name: "rss",
    format: FeedFormat::Rss,
    title_tags: TITLE_TAGS,
    description_tags: DESCRIPTION_TAGS,
    date_tags: DATE_TAGS,
    image_chain: &[
        ImageStrategy::Enclosure,
        ImageStrategy::MediaContentTyped,
        ImageStrategy::ImageElement,
    ],
    channel_logo: false,
};

pub fn item_link(item: Node<'_, '_>) -> String {
    child(item, Tag::plain("link"))
        .map(text_content)
        .unwrap_or_default()
}

/// `<channel><image><url>` text.
pub fn channel_logo(doc: &Document<'_>) -> Option<String> {
    let channel = doc
        .descendants()
        .find(|n| Tag::plain("channel").matches(*n))?;
    let image = child(channel, Tag::plain("image"))?;
    let url = text_content(child(image, Tag::plain("url"))?);
    (!url.is_empty()).then_some(url)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::FeedError;
    use crate::mapper::Mapper;

    const RSS_SAMPLE: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<rss version="2.0" xmlns:media="http://search.yahoo.com/mrss/" xmlns:content="http://purl.org/rss/1.0/modules/content/" xmlns:dc="http://purl.org/dc/elements/1.1/">
  <channel>
    <title>Test Feed</title>
    <image><url>https://example.com/logo.png</url></image>
    <item>
      <title>Test Item 1</title>
      <link>https://example.com/item1</link>
      <pubDate>Mon, 01 Jan 2024 00:00:00 GMT</pubDate>
      <description>This is item 1</description>
      <enclosure url="https://example.com/1.jpg" type="image/jpeg" length="0"/>
      <media:content url="https://example.com/1-media.jpg" type="image/jpeg"/>
    </item>
    <item>
      <title>Test Item 2</title>
      <link>https://example.com/item2</link>
      <dc:date>2024-01-02T00:00:00Z</dc:date>
      <content:encoded><![CDATA[<p>Body of item 2</p>]]></content:encoded>
      <media:content url="https://example.com/2.jpg" type="image/png"/>
    </item>
    <item>
      <title>No description</title>
      <link>https://example.com/item3</link>
    </item>
    <item>
      <title>   </title>
      <description>Blank title</description>
    </item>
  </channel>
</rss>"#;

    #[test]
    fn test_parse_rss() {
        let articles = GENERIC_RSS.parse(RSS_SAMPLE, "example", None).unwrap();

        assert_eq!(articles.len(), 2);
        assert_eq!(articles[0].title, "Test Item 1");
        assert_eq!(articles[0].description, "This is item 1");
        assert_eq!(articles[0].link, "https://example.com/item1");
        assert_eq!(articles[0].published_at, 1_704_067_200_000);
        assert_eq!(articles[0].source_id, "example");
        assert_eq!(articles[1].published_at, 1_704_153_600_000);
    }

    #[test]
    fn test_content_encoded_is_last_description_fallback() {
        let articles = GENERIC_RSS.parse(RSS_SAMPLE, "example", None).unwrap();
        assert_eq!(articles[1].description, "<p>Body of item 2</p>");
    }

    #[test]
    fn test_enclosure_beats_media_content() {
        let articles = GENERIC_RSS.parse(RSS_SAMPLE, "example", None).unwrap();
        assert_eq!(articles[0].image_url.as_deref(), Some("https://example.com/1.jpg"));
        assert_eq!(articles[1].image_url.as_deref(), Some("https://example.com/2.jpg"));
    }

    #[test]
    fn test_generic_rss_ignores_channel_logo() {
        let articles = GENERIC_RSS.parse(RSS_SAMPLE, "example", None).unwrap();
        assert!(articles.iter().all(|a| a.source_logo_url.is_none()));
    }

    #[test]
    fn test_logo_override_applies_to_every_article() {
        let articles = GENERIC_RSS
            .parse(RSS_SAMPLE, "example", Some("https://cdn.example.com/brand.svg"))
            .unwrap();
        assert!(articles
            .iter()
            .all(|a| a.source_logo_url.as_deref() == Some("https://cdn.example.com/brand.svg")));
    }

    #[test]
    fn test_missing_date_falls_back_to_now() {
        let xml = r#"<rss><channel><item>
            <title>Undated</title><description>d</description><pubDate>not a date</pubDate>
        </item></channel></rss>"#;
        let before = chrono::Utc::now().timestamp_millis();
        let articles = GENERIC_RSS.parse(xml, "x", None).unwrap();
        let after = chrono::Utc::now().timestamp_millis();
        assert!(articles[0].published_at >= before && articles[0].published_at <= after);
    }

    #[test]
    fn test_every_valid_item_is_emitted() {
        let items: String = (0..25)
            .map(|i| {
                format!(
                    "<item><title>Story {i}</title><description>Body {i}</description><link>https://example.com/{i}</link></item>"
                )
            })
            .collect();
        let xml = format!("<rss><channel>{items}</channel></rss>");
        assert_eq!(GENERIC_RSS.parse(&xml, "x", None).unwrap().len(), 25);
    }

    #[test]
    fn test_malformed_item_does_not_affect_siblings() {
        let xml = r#"<rss><channel>
            <item><title>Good one</title><description>fine</description><link>https://example.com/1</link></item>
            <item><title>Bad link</title><description>broken</description><link>http://bad host/</link></item>
            <item><title>Good two</title><description>fine</description><link>/relative/2</link></item>
        </channel></rss>"#;
        let articles = GENERIC_RSS.parse(xml, "x", None).unwrap();
        let titles: Vec<&str> = articles.iter().map(|a| a.title.as_str()).collect();
        assert_eq!(titles, vec!["Good one", "Good two"]);
    }

    #[test]
    fn test_long_fields_are_truncated() {
        let xml = format!(
            "<rss><channel><item><title>{}</title><description>{}</description></item></channel></rss>",
            "t".repeat(201),
            "d".repeat(501)
        );
        let articles = GENERIC_RSS.parse(&xml, "x", None).unwrap();
        assert_eq!(articles[0].title.chars().count(), 200);
        assert!(articles[0].title.ends_with("..."));
        assert_eq!(articles[0].description.chars().count(), 500);
    }

    #[test]
    fn test_entities_are_decoded_once() {
        let xml = r#"<rss><channel><item><title> Fish &amp;amp; Chips </title><description>A &lt;b&gt;bold&lt;/b&gt; claim</description></item></channel></rss>"#;
        let articles = GENERIC_RSS.parse(xml, "x", None).unwrap();
        assert_eq!(articles[0].title, "Fish &amp; Chips");
        assert_eq!(articles[0].description, "A <b>bold</b> claim");
    }

    #[test]
    fn test_document_error_fails_whole_feed() {
        let err = GENERIC_RSS
            .parse("<rss><channel><item>", "x", None)
            .unwrap_err();
        assert!(matches!(err, FeedError::Parse(_)));
    }

    #[test]
    fn test_channel_logo() {
        let doc = crate::mapper::xml::parse_document(RSS_SAMPLE).unwrap();
        assert_eq!(channel_logo(&doc).as_deref(), Some("https://example.com/logo.png"));
    }
}
