use super::key::AttributeKey;
use super::operator::Operator;
use super::parser::TagToken;
use super::serializer::serialize_filter;
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

/// Opaque identifier of a committed filter
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FilterId(String);

impl FilterId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Generate a fresh short id (8 hex chars)
    pub fn generate() -> Self {
        let simple = uuid::Uuid::new_v4().simple().to_string();
        Self(simple[..8].to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for FilterId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One parsed filter condition: `key op value...`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StructuredFilter {
    #[serde(default = "FilterId::generate")]
    pub id: FilterId,
    pub key: AttributeKey,
    pub op: Operator,
    #[serde(default, deserialize_with = "one_or_many")]
    pub value: Vec<String>,
}

/// Older persisted filters store a single value as a bare string
fn one_or_many<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum OneOrMany {
        One(String),
        Many(Vec<String>),
    }

    Ok(match OneOrMany::deserialize(deserializer)? {
        OneOrMany::One(value) => vec![value],
        OneOrMany::Many(values) => values,
    })
}

impl StructuredFilter {
    pub fn new(key: impl Into<AttributeKey>, op: Operator, value: Vec<String>) -> Self {
        Self {
            id: FilterId::generate(),
            key: key.into(),
            op,
            value,
        }
    }

    /// Display token for this filter (e.g. `service_name IN cart, shop`)
    pub fn to_display(&self) -> String {
        serialize_filter(self)
    }
}

/// How items in a group are combined. Text input only ever produces AND.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum JoinOp {
    #[default]
    #[serde(rename = "AND")]
    And,
}

/// Ordered list of filters combined with AND
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct FilterGroup {
    pub items: Vec<StructuredFilter>,
    #[serde(default)]
    pub op: JoinOp,
}

impl FilterGroup {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a group from display tokens, skipping tokens without an operator
    pub fn from_tokens<I, S>(tokens: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let items = tokens
            .into_iter()
            .filter_map(|token| TagToken::parse(token.as_ref()).into_filter(FilterId::generate()))
            .collect();
        Self {
            items,
            op: JoinOp::And,
        }
    }

    pub fn push(&mut self, filter: StructuredFilter) {
        self.items.push(filter);
    }

    /// Remove one filter by id, keeping the relative order of the rest
    pub fn remove(&mut self, id: &FilterId) -> Option<StructuredFilter> {
        let index = self.items.iter().position(|item| &item.id == id)?;
        Some(self.items.remove(index))
    }

    pub fn get(&self, id: &FilterId) -> Option<&StructuredFilter> {
        self.items.iter().find(|item| &item.id == id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &StructuredFilter> {
        self.items.iter()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn to_tokens(&self) -> Vec<String> {
        self.items.iter().map(serialize_filter).collect()
    }
}
