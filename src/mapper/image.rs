//! Image discovery strategies.
//!
//! Each mapper owns an ordered slice of [`ImageStrategy`] values. The chain is
//! evaluated front to back and the first strategy that yields a URL wins; no
//! later strategy is consulted.

use html_escape::decode_html_entities;
use roxmltree::Node;
use scraper::{Html, Selector};

use crate::mapper::xml::{attr, child, descendants, text_content, Tag, CONTENT_NS, MEDIA_NS};

const MEDIA_CONTENT: Tag = Tag::ns(MEDIA_NS, "content");
const MEDIA_THUMBNAIL: Tag = Tag::ns(MEDIA_NS, "thumbnail");
const MEDIA_GROUP: Tag = Tag::ns(MEDIA_NS, "group");
const CONTENT_ENCODED: Tag = Tag::ns(CONTENT_NS, "encoded");
const ENCLOSURE: Tag = Tag::plain("enclosure");
const IMAGE: Tag = Tag::plain("image");

/// Width above which a grouped `media:content` counts as large.
const LARGE_IMAGE_WIDTH: u32 = 500;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageStrategy {
    /// `<enclosure type="image/...">`
    Enclosure,
    /// `<media:content>` whose `type` is `image/...`
    MediaContentTyped,
    /// `<media:content>` whose `type` is `image/...` or whose `medium` is `image`
    MediaContentAny,
    /// `<media:content medium="image">`, or a `<media:thumbnail>` nested in any `<media:content>`
    MediaContentNested,
    /// First `<media:thumbnail>`
    MediaThumbnail,
    /// `<media:content medium="image">` inside the first `<media:group>`,
    /// preferring one wider than 500px, else the last
    MediaGroup,
    /// An `<image>` element carrying a `url` attribute or `<url>` child
    ImageElement,
    /// First `<img>` in the `content:encoded` HTML body, entities unescaped
    EncodedContentImg,
    /// First `<img>` in the rendered description HTML
    DescriptionImg,
}

impl ImageStrategy {
    pub fn extract(self, item: Node<'_, '_>, description: &str) -> Option<String> {
        match self {
            Self::Enclosure => descendants(item, ENCLOSURE)
                .find(|n| has_image_type(*n))
                .and_then(|n| attr(n, "url")),
            Self::MediaContentTyped => descendants(item, MEDIA_CONTENT)
                .find(|n| has_image_type(*n))
                .and_then(|n| attr(n, "url")),
            Self::MediaContentAny => descendants(item, MEDIA_CONTENT)
                .find(|n| has_image_type(*n) || is_image_medium(*n))
                .and_then(|n| attr(n, "url")),
            Self::MediaContentNested => media_content_nested(item),
            Self::MediaThumbnail => descendants(item, MEDIA_THUMBNAIL)
                .next()
                .and_then(|n| attr(n, "url")),
            Self::MediaGroup => media_group(item),
            Self::ImageElement => descendants(item, IMAGE).find_map(|n| {
                attr(n, "url").or_else(|| {
                    child(n, Tag::plain("url"))
                        .map(text_content)
                        .filter(|url| !url.is_empty())
                })
            }),
            Self::EncodedContentImg => child(item, CONTENT_ENCODED)
                .map(text_content)
                .and_then(|html| first_img_src(&html))
                .map(|src| decode_html_entities(&src).into_owned()),
            Self::DescriptionImg => first_img_src(description),
        }
    }
}

/// Run `chain` in order; the first URL found wins.
pub fn resolve(chain: &[ImageStrategy], item: Node<'_, '_>, description: &str) -> Option<String> {
    chain
        .iter()
        .find_map(|strategy| strategy.extract(item, description))
}

fn has_image_type(node: Node<'_, '_>) -> bool {
    node.attribute("type")
        .is_some_and(|t| t.trim_start().starts_with("image"))
}

fn is_image_medium(node: Node<'_, '_>) -> bool {
    node.attribute("medium").is_some_and(|m| m.trim() == "image")
}

fn media_content_nested(item: Node<'_, '_>) -> Option<String> {
    for content in descendants(item, MEDIA_CONTENT) {
        if is_image_medium(content) {
            if let Some(url) = attr(content, "url") {
                return Some(url);
            }
        }
        if let Some(url) = descendants(content, MEDIA_THUMBNAIL)
            .next()
            .and_then(|n| attr(n, "url"))
        {
            return Some(url);
        }
    }
    None
}

fn media_group(item: Node<'_, '_>) -> Option<String> {
    let group = descendants(item, MEDIA_GROUP).next()?;
    let images: Vec<Node<'_, '_>> = descendants(group, MEDIA_CONTENT)
        .filter(|n| is_image_medium(*n) && n.attribute("url").is_some())
        .collect();

    images
        .iter()
        .find(|n| width(**n) > LARGE_IMAGE_WIDTH)
        .or_else(|| images.last())
        .and_then(|n| attr(*n, "url"))
}

fn width(node: Node<'_, '_>) -> u32 {
    node.attribute("width")
        .and_then(|w| w.trim().parse().ok())
        .unwrap_or(0)
}

/// `src` of the first `<img>` in an HTML fragment.
pub fn first_img_src(html: &str) -> Option<String> {
    if !html.contains("<img") && !html.contains("<IMG") {
        return None;
    }
    let selector = Selector::parse("img").ok()?;
    let fragment = Html::parse_fragment(html);
    fragment
        .select(&selector)
        .next()
        .and_then(|img| img.value().attr("src"))
        .map(str::trim)
        .filter(|src| !src.is_empty())
        .map(String::from)
}
