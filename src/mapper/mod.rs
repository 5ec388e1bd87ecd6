//! Feed mappers: raw RSS/Atom XML in, normalized [`Article`]s out.
//!
//! Every mapper is a [`Profile`]: a feed format plus ordered lists of tag
//! alternatives and image strategies. The extraction algorithm is shared; the
//! profiles only differ in data, so each tier of a fallback chain can be
//! tested on its own.

pub mod atom;
pub mod date;
pub mod image;
pub mod registry;
pub mod rss;
pub mod sources;
pub mod xml;

use roxmltree::{Document, Node};
use url::Url;

use crate::app::{FeedError, ItemError};
use crate::domain::article::{truncate_description, truncate_title};
use crate::domain::Article;
use crate::mapper::image::ImageStrategy;
use crate::mapper::xml::{child_text_any, parse_document, Tag};

pub use registry::MapperRegistry;

/// Parses one feed document into articles.
pub trait Mapper: Send + Sync {
    fn name(&self) -> &'static str;

    /// `logo_override`, when present, becomes every article's `source_logo_url`.
    fn parse(
        &self,
        document: &str,
        source_id: &str,
        logo_override: Option<&str>,
    ) -> Result<Vec<Article>, FeedError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedFormat {
    Rss,
    Atom,
}

/// Data describing how one family of feeds is read.
#[derive(Debug, Clone, Copy)]
pub struct Profile {
    pub name: &'static str,
    pub format: FeedFormat,
    pub title_tags: &'static [Tag],
    pub description_tags: &'static [Tag],
    pub date_tags: &'static [Tag],
    pub image_chain: &'static [ImageStrategy],
    /// Whether the feed's own logo element may stand in for a missing override.
    pub channel_logo: bool,
}

impl Mapper for Profile {
    fn name(&self) -> &'static str {
        self.name
    }

    fn parse(
        &self,
        document: &str,
        source_id: &str,
        logo_override: Option<&str>,
    ) -> Result<Vec<Article>, FeedError> {
        let doc = parse_document(document)?;

        let logo = match logo_override.filter(|logo| !logo.trim().is_empty()) {
            Some(logo) => Some(logo.to_string()),
            None if self.channel_logo => self.feed_logo(&doc),
            None => None,
        };

        let mut articles = Vec::new();
        for entry in self.entries(&doc) {
            match self.extract_entry(entry, source_id, logo.as_deref()) {
                Ok(Some(article)) => articles.push(article),
                Ok(None) => {}
                Err(e) => {
                    tracing::warn!("Skipping {} entry for {}: {}", self.name, source_id, e);
                }
            }
        }

        tracing::debug!(
            "{} mapper produced {} articles for {}",
            self.name,
            articles.len(),
            source_id
        );
        Ok(articles)
    }
}

impl Profile {
    fn entries<'a, 'input>(
        &self,
        doc: &'a Document<'input>,
    ) -> impl Iterator<Item = Node<'a, 'input>> + 'a {
        let entry = match self.format {
            FeedFormat::Rss => Tag::plain("item"),
            FeedFormat::Atom => Tag::plain("entry"),
        };
        doc.descendants().filter(move |n| entry.matches(*n))
    }

    fn feed_logo(&self, doc: &Document<'_>) -> Option<String> {
        match self.format {
            FeedFormat::Rss => rss::channel_logo(doc),
            FeedFormat::Atom => atom::feed_logo(doc),
        }
    }

    /// `Ok(None)` means the entry lacks a title or description and is dropped
    /// without complaint.
    fn extract_entry(
        &self,
        entry: Node<'_, '_>,
        source_id: &str,
        logo: Option<&str>,
    ) -> Result<Option<Article>, ItemError> {
        let Some(title) = child_text_any(entry, self.title_tags).map(|t| t.trim().to_string())
        else {
            return Ok(None);
        };
        let Some(description) = child_text_any(entry, self.description_tags)
            .map(|d| d.trim().to_string())
        else {
            return Ok(None);
        };
        if title.is_empty() || description.is_empty() {
            return Ok(None);
        }

        let link = match self.format {
            FeedFormat::Rss => rss::item_link(entry),
            FeedFormat::Atom => atom::entry_link(entry),
        };
        check_link(&link)?;

        let published_at = child_text_any(entry, self.date_tags)
            .and_then(|text| date::parse_timestamp(&text))
            .unwrap_or_else(date::now_millis);

        let image_url = image::resolve(self.image_chain, entry, &description);

        Ok(Some(Article {
            title: truncate_title(&title),
            description: truncate_description(&description),
            link,
            published_at,
            source_id: source_id.to_string(),
            image_url,
            source_logo_url: logo.map(String::from),
        }))
    }
}

/// Links may be empty or relative; an absolute link must at least parse.
fn check_link(link: &str) -> Result<(), ItemError> {
    match Url::parse(link) {
        Ok(_) | Err(url::ParseError::RelativeUrlWithoutBase) => Ok(()),
        Err(_) => Err(ItemError::MalformedLink(link.to_string())),
    }
}
