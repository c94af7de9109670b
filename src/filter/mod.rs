//! Filter expression parsing and serialization
//!
//! A filter is written as a single display token and parsed into a
//! structured `(key, operator, values)` triple.
//!
//! # Syntax
//!
//! ```text
//! key OP value             Unary operators (=, !=, LIKE, REGEX, CONTAINS, HAS, >, <= ...)
//! key OP v1, v2, "v,3"     IN / NOT_IN take a CSV style list; quote values containing commas
//! key OP                   EXISTS / NOT_EXISTS take no value
//! ```
//!
//! Word operators are case-insensitive. Text without a recognizable operator
//! is treated as a key that is still being typed.
//!
//! # Examples
//!
//! ```text
//! http_method = GET
//! service_name IN cart, shop
//! http_status_code >= 500
//! duration_nano NOT_EXISTS
//! tag_service_name NOT_LIKE %test%
//! ```

pub mod entities;
pub mod error;
pub mod key;
pub mod operator;
pub mod parser;
pub mod serializer;

pub use entities::{FilterGroup, FilterId, JoinOp, StructuredFilter};
pub use error::FilterParseError;
pub use key::{AttributeKey, AttributeKind, CatalogEntry};
pub use operator::{Arity, Operator};
pub use parser::{
    TagToken, is_exists_not_exists_operator, is_in_nin_operator, parse_value_list, quote_value,
    replace_last_value,
};
pub use serializer::{normalize, render_token, serialize_filter};
