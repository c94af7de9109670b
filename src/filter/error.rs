use thiserror::Error;

/// Errors that can occur while working with filter tokens
#[derive(Debug, Error)]
pub enum FilterParseError {
    #[error(
        "Unknown operator: '{0}'. Valid operators are: =, !=, IN, NOT_IN, LIKE, NOT_LIKE, REGEX, NOT_REGEX, EXISTS, NOT_EXISTS, CONTAINS, NOT_CONTAINS, >, >=, <, <=, HAS, NHAS"
    )]
    UnknownOperator(String),

    #[error("Invalid replacement pattern built from '{value}': {source}")]
    InvalidPattern {
        value: String,
        #[source]
        source: regex::Error,
    },

    #[error("Invalid value list '{input}': {source}")]
    InvalidValues {
        input: String,
        #[source]
        source: csv::Error,
    },
}
