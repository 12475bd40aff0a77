use serde::{Deserialize, Serialize};

/// One hit of a keyword search.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchItem {
    /// ID of the matching post.
    #[serde(default)]
    id: String,
    /// Text snippet around the match.
    #[serde(default)]
    context: String,
}

impl SearchItem {
    /// Creates a search hit.
    pub fn new(id: impl Into<String>, context: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            context: context.into(),
        }
    }

    /// Returns the ID of the matching post.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Returns the text snippet around the match.
    pub fn context(&self) -> &str {
        &self.context
    }
}
