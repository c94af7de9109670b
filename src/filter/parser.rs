use super::entities::{FilterId, StructuredFilter};
use super::error::FilterParseError;
use super::operator::{Arity, Operator};
use super::serializer::render_token;
use regex::Regex;
use std::sync::LazyLock;

/// Splits `key <op> rest`.
///
/// The key is lazy, so the leftmost operator in the text wins. At a given
/// position the alternation is tried longest-first, which keeps `NOT_IN`
/// from being read as `IN` and `>=` from being read as `>`.
static TAG_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^\s*(.*?)\s*((?i:\bNOT_CONTAINS\b|\bNOT_EXISTS\b|\bNOT_REGEX\b|\bNOT_LIKE\b|\bNOT_IN\b|\bCONTAINS\b|\bEXISTS\b|\bREGEX\b|\bLIKE\b|\bNHAS\b|\bHAS\b|\bIN\b)|!=|>=|<=|=|>|<)\s*(.*)$",
    )
    .expect("valid tag regex")
});

/// A single display token decomposed into its parts
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TagToken {
    /// Key as typed, provenance prefix included
    pub key: String,
    /// `None` while the user is still typing the key
    pub operator: Option<Operator>,
    /// Parsed values; always empty for `EXISTS` / `NOT_EXISTS`
    pub values: Vec<String>,
    /// The value list ended with a bare comma, more values are coming
    pub pending: bool,
}

impl TagToken {
    /// Parse one display token such as `service_name IN shop, "check, out"`.
    ///
    /// This never fails: text without a recognizable operator is returned as
    /// a bare key.
    pub fn parse(token: &str) -> Self {
        let Some(caps) = TAG_RE.captures(token) else {
            return TagToken {
                key: token.trim().to_string(),
                ..Default::default()
            };
        };

        let key = caps.get(1).map_or("", |m| m.as_str()).trim().to_string();
        let op_text = caps.get(2).map_or("", |m| m.as_str());
        let rest = caps.get(3).map_or("", |m| m.as_str()).trim();

        let Some(operator) = Operator::from_display(op_text) else {
            return TagToken {
                key: token.trim().to_string(),
                ..Default::default()
            };
        };

        let (values, pending) = match operator.arity() {
            Arity::Zero => (Vec::new(), false),
            Arity::Unary if rest.is_empty() => (Vec::new(), false),
            Arity::Unary => (vec![rest.to_string()], false),
            Arity::Multi => parse_value_list(rest).unwrap_or_else(|err| {
                log::warn!("Falling back to plain comma split: {}", err);
                naive_value_list(rest)
            }),
        };

        TagToken {
            key,
            operator: Some(operator),
            values,
            pending,
        }
    }

    pub fn is_complete(&self) -> bool {
        if self.key.is_empty() {
            return false;
        }
        match self.operator {
            Some(op) if op.is_zero_arity() => true,
            Some(_) => !self.values.is_empty(),
            None => false,
        }
    }

    /// Canonical display form (operator casing and spacing normalized)
    pub fn to_display(&self) -> String {
        match self.operator {
            Some(op) => render_token(&self.key, op, &self.values),
            None => self.key.clone(),
        }
    }

    /// `None` unless the token is complete
    pub fn into_filter(self, id: FilterId) -> Option<StructuredFilter> {
        if !self.is_complete() {
            return None;
        }
        let op = self.operator?;
        Some(StructuredFilter {
            id,
            key: self.key.into(),
            op,
            value: self.values,
        })
    }
}

/// Parse the comma separated remainder of an `IN` / `NOT_IN` token.
///
/// Returns the values and whether the list ended with a bare comma.
pub fn parse_value_list(input: &str) -> Result<(Vec<String>, bool), FilterParseError> {
    let (tightened, open_quote) = tighten_delimiters(input.trim());
    if tightened.is_empty() {
        return Ok((Vec::new(), false));
    }

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(tightened.as_bytes());

    let mut fields = Vec::new();
    for record in reader.records() {
        let record = record.map_err(|source| FilterParseError::InvalidValues {
            input: input.to_string(),
            source,
        })?;
        fields.extend(record.iter().map(str::to_string));
    }

    // Only `""` is an empty value; bare empty segments are dropped
    let bare_empty = bare_empty_segments(&tightened);
    let values = if bare_empty.len() == fields.len() {
        fields
            .into_iter()
            .zip(bare_empty)
            .filter_map(|(field, bare)| (!bare).then_some(field))
            .collect()
    } else {
        fields.into_iter().filter(|f| !f.is_empty()).collect()
    };

    let pending = !open_quote && tightened.ends_with(',');
    Ok((values, pending))
}

/// For each comma separated segment, whether it is empty and unquoted
fn bare_empty_segments(tightened: &str) -> Vec<bool> {
    let mut segments = Vec::new();
    let mut in_quotes = false;
    let mut len = 0;

    for c in tightened.chars() {
        match c {
            '"' => {
                in_quotes = !in_quotes;
                len += 1;
            }
            ',' if !in_quotes => {
                segments.push(len == 0);
                len = 0;
            }
            _ => len += 1,
        }
    }
    segments.push(len == 0);
    segments
}

fn naive_value_list(input: &str) -> (Vec<String>, bool) {
    let pending = input.trim_end().ends_with(',');
    let values = input
        .split(',')
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
        .collect();
    (values, pending)
}

/// Drop whitespace around unquoted commas so quoted fields start right
/// after the delimiter. Also reports whether a quote is left open.
fn tighten_delimiters(input: &str) -> (String, bool) {
    let mut out = String::with_capacity(input.len());
    let mut in_quotes = false;
    let mut after_comma = false;

    for c in input.chars() {
        match c {
            '"' => {
                in_quotes = !in_quotes;
                after_comma = false;
                out.push(c);
            }
            ',' if !in_quotes => {
                let kept = out.trim_end().len();
                out.truncate(kept);
                out.push(',');
                after_comma = true;
            }
            c if after_comma && c.is_whitespace() => {}
            _ => {
                after_comma = false;
                out.push(c);
            }
        }
    }

    (out, in_quotes)
}

/// True when the token (or bare operator) uses `IN` / `NOT_IN`
pub fn is_in_nin_operator(token: &str) -> bool {
    matches!(
        TagToken::parse(token).operator,
        Some(Operator::In | Operator::NotIn)
    )
}

/// True when the token (or bare operator) uses `EXISTS` / `NOT_EXISTS`
pub fn is_exists_not_exists_operator(token: &str) -> bool {
    matches!(
        TagToken::parse(token).operator,
        Some(Operator::Exists | Operator::NotExists)
    )
}

/// Quote a list value when it would not survive CSV tokenizing as-is
pub fn quote_value(value: &str) -> String {
    let needs_quotes = value.is_empty()
        || value.contains(',')
        || value.contains('"')
        || value.trim() != value;
    if needs_quotes {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

/// Replace the last occurrence of `last` in `text` with `replacement` and
/// leave a trailing comma for the next value.
///
/// `last` is user input, so it is escaped before becoming a pattern.
pub fn replace_last_value(
    text: &str,
    last: &str,
    replacement: &str,
) -> Result<String, FilterParseError> {
    if last.is_empty() {
        return Ok(format!("{text}{replacement},"));
    }

    let pattern =
        Regex::new(&regex::escape(last)).map_err(|source| FilterParseError::InvalidPattern {
            value: last.to_string(),
            source,
        })?;

    let updated = match pattern.find_iter(text).last() {
        Some(m) => format!("{}{}{}", &text[..m.start()], replacement, &text[m.end()..]),
        None => format!("{text}{replacement}"),
    };

    Ok(format!("{updated},"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_equality() {
        let token = TagToken::parse("http_method = GET");
        assert_eq!(token.key, "http_method");
        assert_eq!(token.operator, Some(Operator::Equal));
        assert_eq!(token.values, vec!["GET"]);
        assert!(!token.pending);
    }

    #[test]
    fn test_parse_without_operator_is_a_key() {
        let token = TagToken::parse("  service_na ");
        assert_eq!(token.key, "service_na");
        assert_eq!(token.operator, None);
        assert!(token.values.is_empty());
        assert!(!token.is_complete());
    }

    #[test]
    fn test_longest_operator_wins() {
        assert_eq!(
            TagToken::parse("a NOT_IN x").operator,
            Some(Operator::NotIn)
        );
        assert_eq!(
            TagToken::parse("a NOT_LIKE x").operator,
            Some(Operator::NotLike)
        );
        assert_eq!(
            TagToken::parse("a >= 5").operator,
            Some(Operator::GreaterThanOrEqual)
        );
        assert_eq!(
            TagToken::parse("a != 5").operator,
            Some(Operator::NotEqual)
        );
        assert_eq!(TagToken::parse("a NHAS x").operator, Some(Operator::NotHas));
    }

    #[test]
    fn test_leftmost_operator_wins() {
        let token = TagToken::parse("message CONTAINS a = b");
        assert_eq!(token.key, "message");
        assert_eq!(token.operator, Some(Operator::Contains));
        assert_eq!(token.values, vec!["a = b"]);
    }

    #[test]
    fn test_operator_word_inside_key_is_not_an_operator() {
        let token = TagToken::parse("login_in_progress = true");
        assert_eq!(token.key, "login_in_progress");
        assert_eq!(token.operator, Some(Operator::Equal));
    }

    #[test]
    fn test_word_operators_case_insensitive() {
        let token = TagToken::parse("service_name in cart, shop");
        assert_eq!(token.operator, Some(Operator::In));
        assert_eq!(token.values, vec!["cart", "shop"]);
    }

    #[test]
    fn test_quoted_commas_survive() {
        let token = TagToken::parse(r#"service_name IN shop, cart, "check, out""#);
        assert_eq!(token.values, vec!["shop", "cart", "check, out"]);
    }

    #[test]
    fn test_trailing_comma_marks_pending() {
        let (values, pending) = parse_value_list("a,").unwrap();
        assert_eq!(values, vec!["a"]);
        assert!(pending);

        let (values, pending) = parse_value_list("a, b").unwrap();
        assert_eq!(values, vec!["a", "b"]);
        assert!(!pending);
    }

    #[test]
    fn test_bare_empty_segments_are_dropped() {
        let (values, pending) = parse_value_list("a, , b").unwrap();
        assert_eq!(values, vec!["a", "b"]);
        assert!(!pending);

        let (values, pending) = parse_value_list(",").unwrap();
        assert!(values.is_empty());
        assert!(pending);

        let token = TagToken::parse("k IN ,");
        assert!(!token.is_complete());
        assert!(token.into_filter(FilterId::new("x")).is_none());
    }

    #[test]
    fn test_quoted_empty_value_is_kept() {
        let (values, _) = parse_value_list(r#"a, "", b"#).unwrap();
        assert_eq!(values, vec!["a", "", "b"]);
    }

    #[test]
    fn test_operator_without_key_is_incomplete() {
        let token = TagToken::parse("EXISTS");
        assert_eq!(token.operator, Some(Operator::Exists));
        assert!(!token.is_complete());
        assert!(token.into_filter(FilterId::new("x")).is_none());
    }

    #[test]
    fn test_comma_inside_open_quote_is_not_pending() {
        let (_, pending) = parse_value_list(r#"a, "b,"#).unwrap();
        assert!(!pending);
    }

    #[test]
    fn test_zero_arity_ignores_remainder() {
        let token = TagToken::parse("status EXISTS whatever");
        assert_eq!(token.operator, Some(Operator::Exists));
        assert!(token.values.is_empty());
        assert!(token.is_complete());
    }

    #[test]
    fn test_tighten_delimiters() {
        assert_eq!(
            tighten_delimiters(r#"a , "b, c" ,d"#),
            (r#"a,"b, c",d"#.to_string(), false)
        );
        assert_eq!(tighten_delimiters(r#""open"#), (r#""open"#.to_string(), true));
    }

    #[test]
    fn test_quote_value() {
        assert_eq!(quote_value("plain"), "plain");
        assert_eq!(quote_value("a,b"), "\"a,b\"");
        assert_eq!(quote_value("say \"hi\""), "\"say \"\"hi\"\"\"");
        assert_eq!(quote_value(" padded"), "\" padded\"");
        assert_eq!(quote_value(""), "\"\"");
    }

    #[test]
    fn test_replace_last_value_escapes_metacharacters() {
        let result = replace_last_value("k IN a, [x-(", "[x-(", "cart").unwrap();
        assert_eq!(result, "k IN a, cart,");

        let result = replace_last_value("k IN a.b, a.b", "a.b", "z").unwrap();
        assert_eq!(result, "k IN a.b, z,");
    }

    #[test]
    fn test_replace_last_value_with_empty_last_appends() {
        let result = replace_last_value("k IN a, ", "", "b").unwrap();
        assert_eq!(result, "k IN a, b,");
    }
}
