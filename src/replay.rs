//! Replaying scripted search box interactions
//!
//! One action per line:
//!
//! ```text
//! type service_name IN ca     # input text changes to this value
//! select cart                 # pick a suggestion
//! enter                       # commit
//! backspace
//! cancel
//! edit 1                      # re-open the first committed filter
//! remove 2                    # drop the second committed filter
//! ```
//!
//! Blank lines and lines starting with `#` are skipped.

use crate::session::{Session, SuggestionSource, TagEvent, drive};
use std::fs;
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ScriptError {
    #[error("Failed to read script '{path}': {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Line {line}: unknown action '{action}'")]
    UnknownAction { line: usize, action: String },

    #[error("Line {line}: '{action}' needs a 1-based filter index, got '{arg}'")]
    InvalidIndex {
        line: usize,
        action: String,
        arg: String,
    },
}

/// One scripted action
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScriptAction {
    Event(TagEvent),
    Edit(usize),
    Remove(usize),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScriptStep {
    pub line: usize,
    pub action: ScriptAction,
}

pub fn parse_script(content: &str) -> Result<Vec<ScriptStep>, ScriptError> {
    let mut steps = Vec::new();

    for (idx, raw_line) in content.lines().enumerate() {
        let line = idx + 1;
        let trimmed = raw_line.trim_start();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }

        let (action, arg) = match trimmed.split_once(' ') {
            Some((action, arg)) => (action, arg),
            None => (trimmed.trim_end(), ""),
        };

        let action = match action.to_lowercase().as_str() {
            // Keep trailing spaces: "type env " moves to the operator stage
            "type" => ScriptAction::Event(TagEvent::Input(arg.to_string())),
            "select" => ScriptAction::Event(TagEvent::Select(arg.trim().to_string())),
            "enter" | "commit" => ScriptAction::Event(TagEvent::Commit),
            "backspace" => ScriptAction::Event(TagEvent::Backspace),
            "cancel" | "escape" => ScriptAction::Event(TagEvent::Cancel),
            "edit" => ScriptAction::Edit(parse_index(line, action, arg)?),
            "remove" => ScriptAction::Remove(parse_index(line, action, arg)?),
            _ => {
                return Err(ScriptError::UnknownAction {
                    line,
                    action: action.to_string(),
                });
            }
        };

        steps.push(ScriptStep { line, action });
    }

    Ok(steps)
}

fn parse_index(line: usize, action: &str, arg: &str) -> Result<usize, ScriptError> {
    arg.trim()
        .parse::<usize>()
        .ok()
        .filter(|n| *n > 0)
        .ok_or_else(|| ScriptError::InvalidIndex {
            line,
            action: action.to_string(),
            arg: arg.trim().to_string(),
        })
}

pub fn load_script(path: &Path) -> Result<Vec<ScriptStep>, ScriptError> {
    let content = fs::read_to_string(path).map_err(|source| ScriptError::Read {
        path: path.display().to_string(),
        source,
    })?;
    parse_script(&content)
}

/// Run the steps against a session, answering lookups from `source`
pub fn replay(session: &mut Session, source: &dyn SuggestionSource, steps: &[ScriptStep]) {
    for step in steps {
        match &step.action {
            ScriptAction::Event(event) => drive(session, source, event.clone()),
            ScriptAction::Edit(n) | ScriptAction::Remove(n) => {
                let Some(id) = session.group().items.get(n - 1).map(|f| f.id.clone()) else {
                    log::warn!("Line {}: no filter #{} to act on", step.line, n);
                    continue;
                };
                if matches!(step.action, ScriptAction::Edit(_)) {
                    if let Some(fetch) = session.update_tag(&id) {
                        let result = source.fetch(&fetch.query);
                        session.receive_suggestions(fetch.seq, result);
                    }
                } else {
                    session.remove_tag(&id);
                }
            }
        }
        log::debug!(
            "Line {}: stage {}, input {:?}",
            step.line,
            session.state().stage(),
            session.input()
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::{CatalogSuggestions, SessionContext};

    #[test]
    fn test_parse_script() {
        let steps = parse_script("# comment\n\ntype env \nselect =\nENTER\nedit 1\n").unwrap();
        assert_eq!(steps.len(), 4);
        assert_eq!(
            steps[0].action,
            ScriptAction::Event(TagEvent::Input("env ".into()))
        );
        assert_eq!(steps[2].action, ScriptAction::Event(TagEvent::Commit));
        assert_eq!(steps[3].action, ScriptAction::Edit(1));
        assert_eq!(steps[3].line, 6);
    }

    #[test]
    fn test_parse_script_errors() {
        assert!(matches!(
            parse_script("jump 3"),
            Err(ScriptError::UnknownAction { line: 1, .. })
        ));
        assert!(matches!(
            parse_script("enter\nremove zero"),
            Err(ScriptError::InvalidIndex { line: 2, .. })
        ));
        assert!(parse_script("edit 0").is_err());
    }

    #[test]
    fn test_replay_builds_filters() {
        let steps = parse_script(
            "type service_name IN cart, \nselect shop\nenter\ntype status EXISTS\ntype env = prod\nenter\nremove 2\n",
        )
        .unwrap();
        let mut session = Session::new(SessionContext::default());
        replay(&mut session, &CatalogSuggestions::default(), &steps);
        assert_eq!(session.tags(), vec!["service_name IN cart, shop", "env = prod"]);
    }
}
