pub mod article;
pub mod feed;
pub mod status;

pub use article::Article;
pub use feed::Feed;
pub use status::{keys, EngineStatus, DEFAULT_REFRESH_INTERVAL_MIN};
