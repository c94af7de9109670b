use super::state::SuggestionTarget;
use crate::config::{CatalogAttribute, EngineConfig};
use crate::filter::{AttributeKey, StructuredFilter};
use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use thiserror::Error;

/// Telemetry signal a query builder session filters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum DataSource {
    Metrics,
    #[default]
    Traces,
    Logs,
}

impl fmt::Display for DataSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DataSource::Metrics => write!(f, "metrics"),
            DataSource::Traces => write!(f, "traces"),
            DataSource::Logs => write!(f, "logs"),
        }
    }
}

/// One autocomplete option
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Suggestion {
    pub value: String,
    pub label: String,
}

impl Suggestion {
    pub fn new(value: impl Into<String>) -> Self {
        let value = value.into();
        Self {
            label: value.clone(),
            value,
        }
    }
}

/// Context sent along with every lookup
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SuggestionContext {
    pub data_source: DataSource,
    pub existing_filters: Vec<StructuredFilter>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SuggestionQuery {
    pub target: SuggestionTarget,
    pub context: SuggestionContext,
}

#[derive(Debug, Error)]
pub enum SuggestionError {
    #[error("Suggestion source unavailable: {0}")]
    Unavailable(String),

    #[error("No attributes known for data source '{0}'")]
    UnknownDataSource(DataSource),
}

/// Anything that can answer autocomplete lookups (remote API, local catalog)
pub trait SuggestionSource {
    fn fetch(&self, query: &SuggestionQuery) -> Result<Vec<Suggestion>, SuggestionError>;
}

/// Orders suggestion responses by request sequence number.
///
/// Only the response to the most recently issued request is applied,
/// whatever order the responses arrive in.
#[derive(Debug, Clone, Default)]
pub struct SuggestionTracker {
    latest: u64,
    loading: bool,
    suggestions: Vec<Suggestion>,
}

impl SuggestionTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new request and return its sequence number
    pub fn issue(&mut self) -> u64 {
        self.latest += 1;
        self.loading = true;
        self.latest
    }

    /// Apply a response. Returns `false` when it was stale and dropped.
    pub fn apply(&mut self, seq: u64, result: Result<Vec<Suggestion>, SuggestionError>) -> bool {
        if seq != self.latest {
            log::debug!(
                "Dropping stale suggestions (seq {}, latest {})",
                seq,
                self.latest
            );
            return false;
        }

        self.loading = false;
        match result {
            Ok(suggestions) => self.suggestions = suggestions,
            Err(err) => {
                log::warn!("Suggestion fetch failed: {}", err);
                self.suggestions.clear();
            }
        }
        true
    }

    /// Forget current suggestions and make every in-flight request stale
    pub fn invalidate(&mut self) {
        self.latest += 1;
        self.loading = false;
        self.suggestions.clear();
    }

    pub fn latest_seq(&self) -> u64 {
        self.latest
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn suggestions(&self) -> &[Suggestion] {
        &self.suggestions
    }
}

/// In-memory suggestion source backed by the configured attribute catalog
#[derive(Debug, Clone, Default)]
pub struct CatalogSuggestions {
    attributes: Vec<CatalogAttribute>,
    max_results: usize,
}

impl CatalogSuggestions {
    pub fn new(attributes: Vec<CatalogAttribute>, max_results: usize) -> Self {
        Self {
            attributes,
            max_results,
        }
    }

    pub fn from_config(config: &EngineConfig) -> Self {
        Self::new(config.catalog.clone(), config.suggestions.max_results)
    }

    fn attributes_for(&self, data_source: DataSource) -> impl Iterator<Item = &CatalogAttribute> {
        self.attributes
            .iter()
            .filter(move |attr| attr.data_source.is_none_or(|ds| ds == data_source))
    }
}

impl SuggestionSource for CatalogSuggestions {
    fn fetch(&self, query: &SuggestionQuery) -> Result<Vec<Suggestion>, SuggestionError> {
        let data_source = query.context.data_source;
        if self.attributes_for(data_source).next().is_none() {
            return Err(SuggestionError::UnknownDataSource(data_source));
        }

        let mut results: Vec<Suggestion> = match &query.target {
            SuggestionTarget::Keys { partial } => {
                let partial = AttributeKey::new(partial.as_str());
                let partial = partial.lookup_name().to_lowercase();
                let used: HashSet<String> = query
                    .context
                    .existing_filters
                    .iter()
                    .map(|f| f.key.lookup_name().to_lowercase())
                    .collect();

                let mut matches: Vec<&CatalogAttribute> = self
                    .attributes_for(data_source)
                    .filter(|attr| {
                        AttributeKey::new(attr.key.as_str())
                            .lookup_name()
                            .to_lowercase()
                            .starts_with(&partial)
                    })
                    .collect();
                // Keys already filtered on go last
                matches.sort_by_key(|attr| {
                    used.contains(&AttributeKey::new(attr.key.as_str()).lookup_name().to_lowercase())
                });
                matches
                    .into_iter()
                    .map(|attr| Suggestion::new(attr.key.as_str()))
                    .collect()
            }
            SuggestionTarget::Values { key, partial } => {
                let key = AttributeKey::new(key.as_str());
                let partial = partial.to_lowercase();
                self.attributes_for(data_source)
                    .filter(|attr| {
                        AttributeKey::new(attr.key.as_str()).lookup_name() == key.lookup_name()
                    })
                    .flat_map(|attr| attr.values.iter())
                    .filter(|value| value.to_lowercase().starts_with(&partial))
                    .map(|value| Suggestion::new(value.as_str()))
                    .collect()
            }
        };

        results.truncate(self.max_results);
        Ok(results)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::Operator;

    fn catalog() -> CatalogSuggestions {
        CatalogSuggestions::new(
            vec![
                CatalogAttribute {
                    key: "tag_service_name".into(),
                    values: vec!["cart".into(), "checkout".into(), "shop".into()],
                    data_source: None,
                },
                CatalogAttribute {
                    key: "resource_service_namespace".into(),
                    values: vec!["prod".into()],
                    data_source: Some(DataSource::Traces),
                },
                CatalogAttribute {
                    key: "severity_text".into(),
                    values: vec!["ERROR".into(), "INFO".into()],
                    data_source: Some(DataSource::Logs),
                },
            ],
            10,
        )
    }

    fn query(target: SuggestionTarget) -> SuggestionQuery {
        SuggestionQuery {
            target,
            context: SuggestionContext::default(),
        }
    }

    #[test]
    fn test_tracker_drops_stale_responses() {
        let mut tracker = SuggestionTracker::new();
        let first = tracker.issue();
        let second = tracker.issue();

        assert!(tracker.apply(second, Ok(vec![Suggestion::new("new")])));
        assert!(!tracker.apply(first, Ok(vec![Suggestion::new("old")])));
        assert_eq!(tracker.suggestions(), [Suggestion::new("new")]);
        assert!(!tracker.is_loading());
    }

    #[test]
    fn test_tracker_error_clears_suggestions() {
        let mut tracker = SuggestionTracker::new();
        let seq = tracker.issue();
        tracker.apply(seq, Ok(vec![Suggestion::new("x")]));

        let seq = tracker.issue();
        assert!(tracker.is_loading());
        assert!(tracker.apply(seq, Err(SuggestionError::Unavailable("timeout".into()))));
        assert!(tracker.suggestions().is_empty());
        assert!(!tracker.is_loading());
    }

    #[test]
    fn test_invalidate_makes_in_flight_stale() {
        let mut tracker = SuggestionTracker::new();
        let seq = tracker.issue();
        tracker.invalidate();
        assert!(!tracker.apply(seq, Ok(vec![Suggestion::new("late")])));
        assert!(tracker.suggestions().is_empty());
    }

    #[test]
    fn test_key_lookup_ignores_prefix() {
        let results = catalog()
            .fetch(&query(SuggestionTarget::Keys {
                partial: "service".into(),
            }))
            .unwrap();
        let values: Vec<_> = results.iter().map(|s| s.value.as_str()).collect();
        assert_eq!(values, vec!["tag_service_name", "resource_service_namespace"]);
    }

    #[test]
    fn test_used_keys_rank_last() {
        let mut q = query(SuggestionTarget::Keys {
            partial: "service".into(),
        });
        q.context.existing_filters = vec![StructuredFilter::new(
            "service_name",
            Operator::Equal,
            vec!["cart".into()],
        )];
        let results = catalog().fetch(&q).unwrap();
        assert_eq!(results[0].value, "resource_service_namespace");
    }

    #[test]
    fn test_value_lookup() {
        let results = catalog()
            .fetch(&query(SuggestionTarget::Values {
                key: "service_name".into(),
                partial: "C".into(),
            }))
            .unwrap();
        let values: Vec<_> = results.iter().map(|s| s.value.as_str()).collect();
        assert_eq!(values, vec!["cart", "checkout"]);
    }

    #[test]
    fn test_data_source_scoping() {
        let mut q = query(SuggestionTarget::Keys {
            partial: "sev".into(),
        });
        assert!(catalog().fetch(&q).unwrap().is_empty());
        q.context.data_source = DataSource::Logs;
        assert_eq!(catalog().fetch(&q).unwrap().len(), 1);
    }

    #[test]
    fn test_empty_catalog_is_an_error() {
        let empty = CatalogSuggestions::new(Vec::new(), 10);
        assert!(
            empty
                .fetch(&query(SuggestionTarget::Keys {
                    partial: "a".into()
                }))
                .is_err()
        );
    }
}
