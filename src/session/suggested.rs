//! Suggested filters: ready-made filter groups offered as single options
//!
//! An example query is shown as one option whose text is the group's
//! display tokens joined with ` , `. Selecting it commits every filter in
//! the group.

use super::suggest::Suggestion;
use crate::filter::{FilterGroup, TagToken};
use serde::Serialize;
use std::fmt;

/// Joins the tokens of one example query
pub const EXAMPLE_SEPARATOR: &str = " , ";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum OptionGroupKind {
    #[serde(rename = "Suggested Filters")]
    SuggestedFilters,
}

impl fmt::Display for OptionGroupKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OptionGroupKind::SuggestedFilters => write!(f, "Suggested Filters"),
        }
    }
}

/// A titled group of options shown under the search box
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OptionGroup {
    pub label: OptionGroupKind,
    pub title: String,
    pub options: Vec<Suggestion>,
}

pub fn example_query_option(group: &FilterGroup) -> Suggestion {
    Suggestion::new(group.to_tokens().join(EXAMPLE_SEPARATOR))
}

pub fn example_queries_to_options(groups: &[FilterGroup]) -> Vec<Suggestion> {
    groups.iter().map(example_query_option).collect()
}

/// Base option groups with `options` placed in the suggested filters group
pub fn option_groups(options: Vec<Suggestion>) -> Vec<OptionGroup> {
    vec![OptionGroup {
        label: OptionGroupKind::SuggestedFilters,
        title: OptionGroupKind::SuggestedFilters.to_string(),
        options,
    }]
}

/// Split an example query option back into its filters.
///
/// Returns `None` unless the text holds at least two parts and every part is
/// a complete filter, so a single value containing ` , ` is left alone.
pub fn split_example_query(text: &str) -> Option<Vec<TagToken>> {
    if !text.contains(EXAMPLE_SEPARATOR) {
        return None;
    }
    let tokens: Vec<TagToken> = text.split(EXAMPLE_SEPARATOR).map(TagToken::parse).collect();
    if tokens.len() < 2 || !tokens.iter().all(TagToken::is_complete) {
        return None;
    }
    Some(tokens)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::StructuredFilter;

    fn sample_example_queries() -> Vec<FilterGroup> {
        let json = r#"[
            {"items": [
                {"id": "7cbade63", "key": "container_id", "op": "=", "value": "debian"},
                {"id": "4094be10", "key": "container_name", "op": "=", "value": "hotrod"}
            ], "op": "AND"},
            {"items": [
                {"id": "7cbade63", "key": "container_id", "op": "=", "value": "debian"},
                {"id": "4094be10", "key": "container_name", "op": "=", "value": "xyz"}
            ], "op": "AND"}
        ]"#;
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn test_example_queries_become_joined_options() {
        let options = example_queries_to_options(&sample_example_queries());
        let values: Vec<_> = options.iter().map(|o| o.value.as_str()).collect();
        assert_eq!(
            values,
            vec![
                "container_id = debian , container_name = hotrod",
                "container_id = debian , container_name = xyz",
            ]
        );
        assert_eq!(options[0].label, options[0].value);
    }

    #[test]
    fn test_option_groups() {
        let groups = option_groups(example_queries_to_options(&sample_example_queries()));
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].label, OptionGroupKind::SuggestedFilters);
        assert_eq!(groups[0].title, "Suggested Filters");
        assert_eq!(groups[0].options.len(), 2);
    }

    #[test]
    fn test_split_round_trips_the_group() {
        let group = &sample_example_queries()[0];
        let option = example_query_option(group);
        let tokens = split_example_query(&option.value).expect("two complete filters");
        let displays: Vec<_> = tokens.iter().map(TagToken::to_display).collect();
        assert_eq!(displays, group.to_tokens());
    }

    #[test]
    fn test_split_leaves_single_filters_alone() {
        assert!(split_example_query("env = prod").is_none());
        // Second part is not a filter, so this is one value
        assert!(split_example_query("msg CONTAINS a , b").is_none());

        let in_list = StructuredFilter::new("k", crate::filter::Operator::In, vec!["a".into()]);
        let group = FilterGroup {
            items: vec![in_list],
            ..Default::default()
        };
        assert!(split_example_query(&example_query_option(&group).value).is_none());
    }
}
