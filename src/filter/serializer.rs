use super::entities::StructuredFilter;
use super::operator::{Arity, Operator};
use super::parser::{TagToken, quote_value};

/// Render a display token from its parts.
///
/// Unary values are written verbatim; list values are quoted when needed so
/// the parser reads them back unchanged.
pub fn render_token(key: &str, op: Operator, values: &[String]) -> String {
    let key = key.trim();
    match op.arity() {
        Arity::Zero => format!("{} {}", key, op.display()),
        Arity::Unary => match values.first() {
            Some(value) => format!("{} {} {}", key, op.display(), value),
            None => format!("{} {}", key, op.display()),
        },
        Arity::Multi if values.is_empty() => format!("{} {}", key, op.display()),
        Arity::Multi => {
            let joined = values
                .iter()
                .map(|v| quote_value(v))
                .collect::<Vec<_>>()
                .join(", ");
            format!("{} {} {}", key, op.display(), joined)
        }
    }
}

/// Display token for a committed filter
pub fn serialize_filter(filter: &StructuredFilter) -> String {
    render_token(filter.key.raw(), filter.op, &filter.value)
}

/// Canonical form of a token: operator in display casing, spacing collapsed
pub fn normalize(token: &str) -> String {
    TagToken::parse(token).to_display()
}
