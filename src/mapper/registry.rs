use std::collections::HashMap;
use std::sync::Arc;

use crate::app::FeedError;
use crate::domain::Article;
use crate::mapper::atom::GENERIC_ATOM;
use crate::mapper::rss::GENERIC_RSS;
use crate::mapper::{sources, FeedFormat, Mapper};

/// Chooses a mapper per source id, falling back to content sniffing.
#[derive(Clone)]
pub struct MapperRegistry {
    specialized: HashMap<String, Arc<dyn Mapper>>,
    rss: Arc<dyn Mapper>,
    atom: Arc<dyn Mapper>,
}

impl Default for MapperRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl MapperRegistry {
    /// Registry with the built-in publisher mappers.
    pub fn new() -> Self {
        let mut registry = Self::generic_only();
        for (id, profile) in sources::ALL {
            registry.register(*id, Arc::new(*profile));
        }
        registry
    }

    pub fn generic_only() -> Self {
        Self {
            specialized: HashMap::new(),
            rss: Arc::new(GENERIC_RSS),
            atom: Arc::new(GENERIC_ATOM),
        }
    }

    pub fn register(&mut self, source_id: impl Into<String>, mapper: Arc<dyn Mapper>) {
        self.specialized.insert(source_id.into(), mapper);
    }

    pub fn resolve(&self, source_id: &str, document: &str) -> Result<Arc<dyn Mapper>, FeedError> {
        if let Some(mapper) = self.specialized.get(source_id) {
            return Ok(mapper.clone());
        }

        match sniff(document) {
            Some(FeedFormat::Atom) => Ok(self.atom.clone()),
            Some(FeedFormat::Rss) => Ok(self.rss.clone()),
            None => Err(FeedError::UnknownFormat(source_id.to_string())),
        }
    }

    /// Resolve and run the mapper in one step.
    pub fn parse(
        &self,
        source_id: &str,
        document: &str,
        logo_override: Option<&str>,
    ) -> Result<Vec<Article>, FeedError> {
        let mapper = self.resolve(source_id, document)?;
        tracing::debug!("Using {} mapper for {}", mapper.name(), source_id);
        mapper.parse(document, source_id, logo_override)
    }
}

/// Guess the format from the raw text.
///
/// Atom needs both a `<feed` element and Atom as the default namespace;
/// RSS documents that merely declare an `atom:` prefix stay RSS.
pub fn sniff(document: &str) -> Option<FeedFormat> {
    let atom_default_ns = document.contains(r#"xmlns="http://www.w3.org/2005/Atom""#)
        || document.contains("xmlns='http://www.w3.org/2005/Atom'");

    if document.contains("<feed") && atom_default_ns {
        Some(FeedFormat::Atom)
    } else if document.contains("<rss") || document.contains("<channel") {
        Some(FeedFormat::Rss)
    } else {
        None
    }
}
