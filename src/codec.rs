//! Persisting filter groups in URL query parameters
//!
//! Filters are stored as a JSON array of structured filters, either as plain
//! URL-encoded JSON or as base64 of that JSON. Decoding never fails: a missing
//! or malformed parameter yields an empty group.

use crate::filter::{FilterGroup, JoinOp, StructuredFilter};
use base64::{Engine, engine::general_purpose::STANDARD as BASE64};
use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Encoding {
    /// URL-encoded JSON
    #[default]
    Json,
    /// Base64 of the JSON, then URL-encoded
    Base64,
}

#[derive(Debug, Error)]
pub enum CodecError {
    #[error("Invalid percent-encoding: {0}")]
    Url(#[from] std::string::FromUtf8Error),

    #[error("Invalid base64 payload: {0}")]
    Base64(#[from] base64::DecodeError),

    #[error("Invalid filter JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// Encode a group as a query parameter value (already URL-encoded)
pub fn encode_filters(group: &FilterGroup, encoding: Encoding) -> String {
    // Serializing plain strings and enums cannot fail
    let json = serde_json::to_string(&group.items).unwrap_or_else(|_| "[]".to_string());
    let payload = match encoding {
        Encoding::Json => json,
        Encoding::Base64 => BASE64.encode(json.as_bytes()),
    };
    urlencoding::encode(&payload).into_owned()
}

pub fn try_decode_filters(raw: &str, encoding: Encoding) -> Result<FilterGroup, CodecError> {
    let decoded = urlencoding::decode(raw.trim())?;
    let json = match encoding {
        Encoding::Json => decoded.into_owned(),
        Encoding::Base64 => {
            let bytes = BASE64.decode(decoded.as_bytes())?;
            String::from_utf8(bytes)?
        }
    };
    let items: Vec<StructuredFilter> = serde_json::from_str(&json)?;
    Ok(FilterGroup {
        items,
        op: JoinOp::And,
    })
}

/// Decode a parameter value, falling back to an empty group
pub fn decode_filters(raw: &str, encoding: Encoding) -> FilterGroup {
    if raw.trim().is_empty() {
        return FilterGroup::new();
    }
    try_decode_filters(raw, encoding).unwrap_or_else(|err| {
        log::warn!("Ignoring malformed filter state: {}", err);
        FilterGroup::new()
    })
}

/// `param=<encoded>` for the given group
pub fn to_query_param(group: &FilterGroup, param: &str, encoding: Encoding) -> String {
    format!(
        "{}={}",
        urlencoding::encode(param),
        encode_filters(group, encoding)
    )
}

/// Find `param` in a query string (`?a=1&search=...`) and decode it
pub fn filters_from_query(query: &str, param: &str, encoding: Encoding) -> FilterGroup {
    let query = query.trim().trim_start_matches('?');
    let value = query.split('&').find_map(|pair| {
        let (name, value) = pair.split_once('=').unwrap_or((pair, ""));
        let name = urlencoding::decode(name).ok()?;
        (name == param).then_some(value)
    });

    match value {
        Some(value) => decode_filters(value, encoding),
        None => FilterGroup::new(),
    }
}
