use crate::filter::{FilterGroup, TagToken, quote_value};
use crate::session::{Session, Suggestion};
use colored::Colorize;
use comfy_table::presets::UTF8_FULL;
use comfy_table::{Cell, ContentArrangement, Table};
use serde_json::{Value, json};

pub fn create_styled_table(headers: &[&str]) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(headers.iter().map(|h| Cell::new(h)));
    table
}

/// Colored single-line rendering of a token: key, operator, values
pub fn colorize_token(token: &TagToken) -> String {
    match token.operator {
        None => token.key.italic().to_string(),
        Some(op) => {
            let mut out = format!("{} {}", token.key.cyan(), op.display().yellow().bold());
            if !token.values.is_empty() {
                let values = token
                    .values
                    .iter()
                    .map(|v| {
                        let v = if op.is_multi() { quote_value(v) } else { v.clone() };
                        v.green().to_string()
                    })
                    .collect::<Vec<_>>()
                    .join(", ");
                out.push(' ');
                out.push_str(&values);
            }
            out
        }
    }
}

pub fn format_tokens_text(tokens: &[TagToken]) -> String {
    let mut table = create_styled_table(&["Key", "Operator", "Code", "Values", "Complete"]);
    for token in tokens {
        let (display, code) = token
            .operator
            .map(|op| (op.display(), op.code()))
            .unwrap_or(("-", "-"));
        table.add_row(vec![
            Cell::new(&token.key),
            Cell::new(display),
            Cell::new(code),
            Cell::new(token.values.join(" | ")),
            Cell::new(if token.is_complete() { "yes" } else { "no" }),
        ]);
    }
    format!("{table}\n")
}

pub fn tokens_to_json(tokens: &[TagToken]) -> Value {
    Value::Array(
        tokens
            .iter()
            .map(|token| {
                json!({
                    "key": token.key,
                    "operator": token.operator.map(|op| op.code()),
                    "display": token.to_display(),
                    "values": token.values,
                    "pending": token.pending,
                    "complete": token.is_complete(),
                })
            })
            .collect(),
    )
}

pub fn format_group_text(group: &FilterGroup) -> String {
    let mut out = String::new();
    for filter in group.iter() {
        out.push_str(&format!(
            "{}  {}\n",
            filter.id.as_str().dimmed(),
            colorize_token(&TagToken::parse(&filter.to_display()))
        ));
    }
    if group.is_empty() {
        out.push_str(&format!("{}\n", "(no filters)".dimmed()));
    }
    out
}

pub fn format_suggestions_text(suggestions: &[Suggestion]) -> String {
    if suggestions.is_empty() {
        return format!("{}\n", "(no suggestions)".dimmed());
    }
    suggestions
        .iter()
        .map(|s| format!("{}\n", s.value))
        .collect()
}

/// Summary of a session after a replay
pub fn format_session_text(session: &Session, query_param: &str) -> String {
    let mut out = String::new();
    out.push_str(&format!("{}\n", "Filters".bold().bright_blue()));
    out.push_str(&format_group_text(session.group()));

    if !session.input().is_empty() {
        out.push_str(&format!(
            "{} {} ({})\n",
            "Input:".bold().bright_blue(),
            session.input(),
            session.state().stage()
        ));
    }
    out.push_str(&format!("{} {}\n", "URL:".bold().bright_blue(), query_param));
    out
}

pub fn session_to_json(session: &Session, query_param: &str) -> Value {
    json!({
        "filters": session.group(),
        "tags": session.tags(),
        "input": session.input(),
        "stage": session.state().stage().to_string(),
        "can_commit": session.can_commit(),
        "query_param": query_param,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tokens_to_json() {
        let tokens = vec![TagToken::parse("env = prod"), TagToken::parse("serv")];
        let json = tokens_to_json(&tokens);
        assert_eq!(json[0]["operator"], "eq");
        assert_eq!(json[0]["values"], json!(["prod"]));
        assert_eq!(json[1]["operator"], Value::Null);
        assert_eq!(json[1]["complete"], false);
    }

    #[test]
    fn test_text_table_lists_every_token() {
        colored::control::set_override(false);
        let text = format_tokens_text(&[
            TagToken::parse("service_name IN cart, shop"),
            TagToken::parse("status EXISTS"),
        ]);
        assert!(text.contains("service_name"));
        assert!(text.contains("cart | shop"));
        assert!(text.contains("nexists") || text.contains("exists"));
    }
}
