use super::suggested::split_example_query;
use crate::filter::{Arity, Operator, TagToken, quote_value};
use std::fmt;

/// Where the user is in building one filter
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Key,
    Operator,
    Value,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stage::Key => write!(f, "KEY"),
            Stage::Operator => write!(f, "OPERATOR"),
            Stage::Value => write!(f, "VALUE"),
        }
    }
}

/// Incremental parse state of the search box
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseState {
    /// Free text that does not (yet) contain an operator
    Key { raw: String },
    /// Key chosen, waiting for an operator. `operator` is only ever set to a
    /// zero-arity operator, which is ready to commit.
    Operator {
        key: String,
        operator: Option<Operator>,
    },
    /// Key and operator chosen, collecting values
    Value {
        key: String,
        operator: Operator,
        /// Comma-terminated values (multi-value operators only)
        values: Vec<String>,
        /// The value currently being typed
        pending: String,
    },
}

impl Default for ParseState {
    fn default() -> Self {
        ParseState::Key { raw: String::new() }
    }
}

/// A user action on the search box
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TagEvent {
    /// The input text changed to this value
    Input(String),
    /// A suggestion was picked
    Select(String),
    /// Enter / blur
    Commit,
    Backspace,
    /// Escape
    Cancel,
}

/// What the suggestion source should be asked for
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SuggestionTarget {
    Keys { partial: String },
    Values { key: String, partial: String },
}

/// Result of applying one event
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Step {
    pub state: ParseState,
    /// Complete filters the event finalized, in order
    pub committed: Vec<TagToken>,
    /// Suggestions to fetch for the new state
    pub fetch: Option<SuggestionTarget>,
}

impl ParseState {
    /// Derive the state from the full text of the search box
    pub fn from_text(text: &str) -> Self {
        let token = TagToken::parse(text);

        let Some(operator) = token.operator else {
            let key = text.trim();
            let has_trailing_space = text.ends_with(char::is_whitespace);
            return if has_trailing_space && !key.is_empty() {
                ParseState::Operator {
                    key: key.to_string(),
                    operator: None,
                }
            } else {
                ParseState::Key {
                    raw: key.to_string(),
                }
            };
        };

        // An operator word with nothing before it is still key text
        if token.key.is_empty() {
            return ParseState::Key {
                raw: text.trim().to_string(),
            };
        }

        match operator.arity() {
            Arity::Zero => ParseState::Operator {
                key: token.key,
                operator: Some(operator),
            },
            Arity::Unary => ParseState::Value {
                key: token.key,
                operator,
                values: Vec::new(),
                pending: token.values.into_iter().next().unwrap_or_default(),
            },
            Arity::Multi => {
                let mut values = token.values;
                let pending = if token.pending {
                    String::new()
                } else {
                    values.pop().unwrap_or_default()
                };
                ParseState::Value {
                    key: token.key,
                    operator,
                    values,
                    pending,
                }
            }
        }
    }

    /// Canonical text for this state; `from_text(render())` gives it back
    pub fn render(&self) -> String {
        match self {
            ParseState::Key { raw } => raw.clone(),
            ParseState::Operator {
                key,
                operator: None,
            } => format!("{key} "),
            ParseState::Operator {
                key,
                operator: Some(op),
            } => format!("{} {}", key, op.display()),
            ParseState::Value {
                key,
                operator,
                values,
                pending,
            } => {
                let mut out = format!("{} {} ", key, operator.display());
                if !values.is_empty() {
                    let joined = values
                        .iter()
                        .map(|v| quote_value(v))
                        .collect::<Vec<_>>()
                        .join(", ");
                    out.push_str(&joined);
                    out.push_str(", ");
                }
                if !pending.is_empty() {
                    if operator.is_multi() {
                        out.push_str(&quote_value(pending));
                    } else {
                        out.push_str(pending);
                    }
                }
                out
            }
        }
    }

    pub fn stage(&self) -> Stage {
        match self {
            ParseState::Key { .. } => Stage::Key,
            ParseState::Operator { .. } => Stage::Operator,
            ParseState::Value { .. } => Stage::Value,
        }
    }

    pub fn raw_text(&self) -> String {
        self.render()
    }

    pub fn committed_key(&self) -> Option<&str> {
        match self {
            ParseState::Key { .. } => None,
            ParseState::Operator { key, .. } | ParseState::Value { key, .. } => Some(key),
        }
    }

    pub fn committed_operator(&self) -> Option<Operator> {
        match self {
            ParseState::Key { .. } => None,
            ParseState::Operator { operator, .. } => *operator,
            ParseState::Value { operator, .. } => Some(*operator),
        }
    }

    pub fn accumulated_values(&self) -> &[String] {
        match self {
            ParseState::Value { values, .. } => values,
            _ => &[],
        }
    }

    pub fn pending_value(&self) -> &str {
        match self {
            ParseState::Value { pending, .. } => pending,
            _ => "",
        }
    }

    /// Multi-value list that is waiting for more values
    pub fn is_accumulating(&self) -> bool {
        matches!(
            self,
            ParseState::Value { operator, values, pending, .. }
                if operator.is_multi() && !values.is_empty() && pending.is_empty()
        )
    }

    /// Whether a commit action would produce a filter
    pub fn can_commit(&self) -> bool {
        self.to_token().is_some()
    }

    /// The filter this state would commit to, if complete
    pub fn to_token(&self) -> Option<TagToken> {
        match self {
            ParseState::Operator {
                key,
                operator: Some(op),
            } if op.is_zero_arity() && !key.is_empty() => Some(TagToken {
                key: key.clone(),
                operator: Some(*op),
                values: Vec::new(),
                pending: false,
            }),
            ParseState::Value {
                key,
                operator,
                values,
                pending,
            } => {
                let mut all = values.clone();
                if !pending.is_empty() {
                    all.push(pending.clone());
                }
                if all.is_empty() || key.is_empty() {
                    return None;
                }
                Some(TagToken {
                    key: key.clone(),
                    operator: Some(*operator),
                    values: all,
                    pending: false,
                })
            }
            _ => None,
        }
    }

    /// The partial text suggestions should be fetched for
    pub fn suggestion_target(&self) -> Option<SuggestionTarget> {
        match self {
            ParseState::Key { raw } if !raw.is_empty() => Some(SuggestionTarget::Keys {
                partial: raw.clone(),
            }),
            ParseState::Value { key, pending, .. } if !pending.is_empty() => {
                Some(SuggestionTarget::Values {
                    key: key.clone(),
                    partial: pending.clone(),
                })
            }
            _ => None,
        }
    }
}

/// Apply one event to a state.
///
/// Pure: no I/O, no ids, no suggestion bookkeeping. The caller owns those.
pub fn transition(state: &ParseState, event: &TagEvent) -> Step {
    let (next, committed) = match event {
        TagEvent::Input(text) => settle(ParseState::from_text(text)),
        TagEvent::Select(option) => select(state, option),
        TagEvent::Commit => match state.to_token() {
            Some(token) => (ParseState::default(), vec![token]),
            None => (state.clone(), Vec::new()),
        },
        TagEvent::Backspace => (backspace(state), Vec::new()),
        TagEvent::Cancel => (ParseState::default(), Vec::new()),
    };

    let fetch = next.suggestion_target();
    Step {
        state: next,
        committed,
        fetch,
    }
}

/// A zero-arity operator commits as soon as it is recognized
fn settle(state: ParseState) -> (ParseState, Vec<TagToken>) {
    match &state {
        ParseState::Operator {
            operator: Some(op), ..
        } if op.is_zero_arity() => {
            let token = state.to_token();
            (ParseState::default(), token.into_iter().collect())
        }
        _ => (state, Vec::new()),
    }
}

fn select(state: &ParseState, option: &str) -> (ParseState, Vec<TagToken>) {
    let option = option.trim();
    match state {
        ParseState::Key { .. } => {
            // Suggested filters carry several complete filters at once
            if let Some(tokens) = split_example_query(option) {
                return (ParseState::default(), tokens);
            }
            let token = TagToken::parse(option);
            if token.is_complete() {
                return (ParseState::default(), vec![token]);
            }
            if token.operator.is_some() {
                return settle(ParseState::from_text(option));
            }
            if option.is_empty() {
                return (state.clone(), Vec::new());
            }
            (
                ParseState::Operator {
                    key: option.to_string(),
                    operator: None,
                },
                Vec::new(),
            )
        }
        ParseState::Operator { key, .. } => match Operator::from_display(option) {
            Some(op) if op.is_zero_arity() => settle(ParseState::Operator {
                key: key.clone(),
                operator: Some(op),
            }),
            Some(op) => (
                ParseState::Value {
                    key: key.clone(),
                    operator: op,
                    values: Vec::new(),
                    pending: String::new(),
                },
                Vec::new(),
            ),
            None => settle(ParseState::from_text(option)),
        },
        ParseState::Value {
            key,
            operator,
            values,
            ..
        } => {
            if operator.is_multi() {
                let mut values = values.clone();
                values.push(option.to_string());
                (
                    ParseState::Value {
                        key: key.clone(),
                        operator: *operator,
                        values,
                        pending: String::new(),
                    },
                    Vec::new(),
                )
            } else {
                let token = TagToken {
                    key: key.clone(),
                    operator: Some(*operator),
                    values: vec![option.to_string()],
                    pending: false,
                };
                (ParseState::default(), vec![token])
            }
        }
    }
}

fn backspace(state: &ParseState) -> ParseState {
    match state {
        ParseState::Key { raw } => {
            let mut raw = raw.clone();
            raw.pop();
            ParseState::from_text(&raw)
        }
        ParseState::Operator { key, .. } => ParseState::Key { raw: key.clone() },
        ParseState::Value {
            key,
            operator,
            values,
            pending,
        } => {
            if !pending.is_empty() {
                let mut pending = pending.clone();
                pending.pop();
                return ParseState::Value {
                    key: key.clone(),
                    operator: *operator,
                    values: values.clone(),
                    pending,
                };
            }
            let mut values = values.clone();
            values.pop();
            if values.is_empty() {
                // Nothing left to edit: back to choosing an operator
                return ParseState::Operator {
                    key: key.clone(),
                    operator: None,
                };
            }
            ParseState::Value {
                key: key.clone(),
                operator: *operator,
                values,
                pending: String::new(),
            }
        }
    }
}
