use serde::{Deserialize, Serialize};

pub const DEFAULT_CATEGORY: &str = "Other";

/// An operator-configured RSS/Atom source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Feed {
    pub id: String,
    pub name: String,
    pub url: String,
    #[serde(default = "default_category")]
    pub category: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub logo_url: Option<String>,
}

fn default_category() -> String {
    DEFAULT_CATEGORY.to_string()
}

impl Feed {
    pub fn new(id: impl Into<String>, name: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            url: url.into(),
            category: default_category(),
            logo_url: None,
        }
    }

    pub fn display_name(&self) -> &str {
        if self.name.is_empty() {
            &self.url
        } else {
            &self.name
        }
    }

    /// The logo override, ignoring blank values.
    pub fn logo_override(&self) -> Option<&str> {
        self.logo_url.as_deref().filter(|logo| !logo.trim().is_empty())
    }
}
