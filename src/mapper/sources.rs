//! Mappers for individual high-traffic publishers.
//!
//! Each one reads ordinary RSS but knows where that publisher actually puts
//! its artwork. All of them fall back to the channel `<image>` for the logo
//! and end their image chain with the `<img>` inside the description.

use crate::mapper::image::ImageStrategy::{
    DescriptionImg, EncodedContentImg, Enclosure, MediaContentAny, MediaContentNested,
    MediaContentTyped, MediaGroup, MediaThumbnail,
};
use crate::mapper::rss::{DATE_TAGS, DESCRIPTION_TAGS, TITLE_TAGS};
use crate::mapper::xml::Tag;
use crate::mapper::{FeedFormat, Profile};

pub const BBC_ID: &str = "bbc-news";
pub const CNN_ID: &str = "cnn";
pub const BLOOMBERG_ID: &str = "bloomberg";
pub const NASA_ID: &str = "nasa";

/// BBC puts a `media:thumbnail` on nearly every item.
pub const BBC: Profile = Profile {
    name: "bbc",
    format: FeedFormat::Rss,
    title_tags: TITLE_TAGS,
    description_tags: DESCRIPTION_TAGS,
    date_tags: DATE_TAGS,
    image_chain: &[MediaThumbnail, MediaContentTyped, Enclosure, DescriptionImg],
    channel_logo: true,
};

/// CNN ships several renditions in a `media:group`.
pub const CNN: Profile = Profile {
    name: "cnn",
    format: FeedFormat::Rss,
    title_tags: TITLE_TAGS,
    description_tags: DESCRIPTION_TAGS,
    date_tags: DATE_TAGS,
    image_chain: &[
        MediaGroup,
        MediaThumbnail,
        MediaContentAny,
        Enclosure,
        DescriptionImg,
    ],
    channel_logo: true,
};

pub const BLOOMBERG: Profile = Profile {
    name: "bloomberg",
    format: FeedFormat::Rss,
    title_tags: TITLE_TAGS,
    description_tags: DESCRIPTION_TAGS,
    date_tags: DATE_TAGS,
    image_chain: &[MediaContentTyped, MediaThumbnail, Enclosure, DescriptionImg],
    channel_logo: true,
};

/// NASA embeds the lead image in `content:encoded`, so that body is
/// searched for artwork but never used as the description.
pub const NASA: Profile = Profile {
    name: "nasa",
    format: FeedFormat::Rss,
    title_tags: TITLE_TAGS,
    description_tags: &[Tag::plain("description"), Tag::plain("summary")],
    date_tags: DATE_TAGS,
    image_chain: &[
        EncodedContentImg,
        MediaThumbnail,
        MediaContentNested,
        Enclosure,
        DescriptionImg,
    ],
    channel_logo: true,
};

/// Source id and profile for every built-in specialized mapper.
pub const ALL: &[(&str, Profile)] = &[
    (BBC_ID, BBC),
    (CNN_ID, CNN),
    (BLOOMBERG_ID, BLOOMBERG),
    (NASA_ID, NASA),
];
