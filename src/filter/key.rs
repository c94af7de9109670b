use serde::{Deserialize, Serialize};
use std::fmt;

/// Provenance of an attribute, encoded in the key as a prefix
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AttributeKind {
    /// `tag_` prefixed keys
    Tag,
    /// `resource_` prefixed keys
    Resource,
}

impl AttributeKind {
    pub fn prefix(&self) -> &'static str {
        match self {
            AttributeKind::Tag => "tag_",
            AttributeKind::Resource => "resource_",
        }
    }
}

/// An attribute key as typed by the user.
///
/// The raw text is kept verbatim (prefix included) so a filter serializes
/// back to exactly what was parsed. The prefix is only stripped for lookups.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AttributeKey(String);

/// Entry shape used when filtering against a typed attribute catalog
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CatalogEntry {
    pub key: String,
    #[serde(rename = "type")]
    pub kind: Option<AttributeKind>,
}

impl AttributeKey {
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    /// Build a key for `name` with the provenance prefix of `kind` attached
    pub fn typed(name: &str, kind: AttributeKind) -> Self {
        Self(format!("{}{}", kind.prefix(), name.trim()))
    }

    pub fn raw(&self) -> &str {
        &self.0
    }

    pub fn kind(&self) -> Option<AttributeKind> {
        let trimmed = self.0.trim_start();
        [AttributeKind::Tag, AttributeKind::Resource]
            .into_iter()
            .find(|kind| trimmed.starts_with(kind.prefix()))
    }

    /// Key name with any provenance prefix removed
    pub fn lookup_name(&self) -> &str {
        let trimmed = self.0.trim();
        match self.kind() {
            Some(kind) => trimmed[kind.prefix().len()..].trim(),
            None => trimmed,
        }
    }

    pub fn catalog_entry(&self) -> CatalogEntry {
        CatalogEntry {
            key: self.lookup_name().to_string(),
            kind: self.kind(),
        }
    }
}

impl fmt::Display for AttributeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for AttributeKey {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for AttributeKey {
    fn from(value: String) -> Self {
        Self(value)
    }
}
