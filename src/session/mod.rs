//! Autocomplete session for the query builder search box
//!
//! A [`Session`] owns the filters committed so far, the parse state of the
//! filter being typed, and the bookkeeping for suggestion lookups. All state
//! changes go through the pure [`transition`] reducer; the session only adds
//! ids, the filter group, and request sequencing on top.

pub mod state;
pub mod suggest;
pub mod suggested;

pub use state::{ParseState, Stage, Step, SuggestionTarget, TagEvent, transition};
pub use suggest::{
    CatalogSuggestions, DataSource, Suggestion, SuggestionContext, SuggestionError,
    SuggestionQuery, SuggestionSource, SuggestionTracker,
};
pub use suggested::{
    EXAMPLE_SEPARATOR, OptionGroup, OptionGroupKind, example_queries_to_options,
    example_query_option, option_groups, split_example_query,
};

use crate::filter::{
    FilterGroup, FilterId, Operator, StructuredFilter, quote_value, replace_last_value,
};

/// Per-session dependencies, passed in rather than read from globals
#[derive(Debug, Clone, Default)]
pub struct SessionContext {
    pub data_source: DataSource,
}

/// A suggestion lookup the host should perform
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingFetch {
    pub seq: u64,
    pub query: SuggestionQuery,
}

#[derive(Debug, Clone, Default)]
pub struct Session {
    context: SessionContext,
    group: FilterGroup,
    state: ParseState,
    input: String,
    tracker: SuggestionTracker,
    suggested: Vec<Suggestion>,
}

impl Session {
    pub fn new(context: SessionContext) -> Self {
        Self {
            context,
            ..Default::default()
        }
    }

    /// Start from filters restored elsewhere (e.g. from the URL)
    pub fn with_group(context: SessionContext, group: FilterGroup) -> Self {
        Self {
            context,
            group,
            ..Default::default()
        }
    }

    /// Offer these example queries while the search box is empty
    pub fn with_suggested_filters(mut self, examples: &[FilterGroup]) -> Self {
        self.suggested = example_queries_to_options(examples);
        self
    }

    /// Apply a user action. Returns the lookup to run, if any.
    pub fn handle(&mut self, event: TagEvent) -> Option<PendingFetch> {
        let step = transition(&self.state, &event);
        let next_input = self.next_input(&event, &step);

        for token in step.committed.iter().cloned() {
            if let Some(filter) = token.into_filter(FilterId::generate()) {
                log::debug!("Committed filter {}: {}", filter.id, filter.to_display());
                self.group.push(filter);
            }
        }

        self.state = step.state;
        self.input = next_input;
        self.request(step.fetch)
    }

    fn request(&mut self, target: Option<SuggestionTarget>) -> Option<PendingFetch> {
        let Some(target) = target else {
            self.tracker.invalidate();
            return None;
        };
        let seq = self.tracker.issue();
        Some(PendingFetch {
            seq,
            query: SuggestionQuery {
                target,
                context: SuggestionContext {
                    data_source: self.context.data_source,
                    existing_filters: self.group.items.clone(),
                },
            },
        })
    }

    /// Text the search box should show after `event`
    fn next_input(&self, event: &TagEvent, step: &Step) -> String {
        if !step.committed.is_empty() {
            return String::new();
        }
        match event {
            TagEvent::Input(text) => text.clone(),
            TagEvent::Select(option) if step.state.is_accumulating() => {
                let replacement = quote_value(option.trim());
                match replace_last_value(&self.input, self.state.pending_value(), &replacement) {
                    // The typed text may quote the pending value differently
                    Ok(spliced) if ParseState::from_text(&spliced) == step.state => spliced,
                    Ok(_) => step.state.render(),
                    Err(err) => {
                        log::warn!("Could not splice selection into input: {}", err);
                        step.state.render()
                    }
                }
            }
            _ => step.state.render(),
        }
    }

    /// Apply a lookup response. Stale responses are ignored.
    pub fn receive_suggestions(
        &mut self,
        seq: u64,
        result: Result<Vec<Suggestion>, SuggestionError>,
    ) -> bool {
        self.tracker.apply(seq, result)
    }

    /// Take a committed filter back into the search box for editing
    pub fn update_tag(&mut self, id: &FilterId) -> Option<PendingFetch> {
        let filter = self.group.remove(id)?;
        let text = filter.to_display();
        log::debug!("Editing filter {}: {}", filter.id, text);
        self.state = ParseState::from_text(&text);
        self.input = self.state.render();
        self.request(self.state.suggestion_target())
    }

    /// Drop one committed filter; the others are left untouched
    pub fn remove_tag(&mut self, id: &FilterId) -> Option<StructuredFilter> {
        self.group.remove(id)
    }

    /// Options to show under the search box
    pub fn options(&self) -> Vec<Suggestion> {
        match &self.state {
            ParseState::Operator { key, .. } => operator_options(key, ""),
            ParseState::Key { raw } if raw.is_empty() => self.suggested.clone(),
            ParseState::Key { raw } => {
                // "key NO" may be the start of an operator
                let mut options = raw
                    .rsplit_once(char::is_whitespace)
                    .map(|(key, typed)| operator_options(key.trim(), typed))
                    .unwrap_or_default();
                options.extend(self.tracker.suggestions().iter().cloned());
                options
            }
            ParseState::Value { .. } => self.tracker.suggestions().to_vec(),
        }
    }

    /// Option groups shown while nothing is typed
    pub fn option_groups(&self) -> Vec<OptionGroup> {
        option_groups(self.suggested.clone())
    }

    pub fn tags(&self) -> Vec<String> {
        self.group.to_tokens()
    }

    pub fn group(&self) -> &FilterGroup {
        &self.group
    }

    pub fn into_group(self) -> FilterGroup {
        self.group
    }

    pub fn state(&self) -> &ParseState {
        &self.state
    }

    pub fn input(&self) -> &str {
        &self.input
    }

    pub fn is_fetching(&self) -> bool {
        self.tracker.is_loading()
    }

    pub fn is_multi(&self) -> bool {
        self.state.committed_operator().is_some_and(|op| op.is_multi())
    }

    pub fn can_commit(&self) -> bool {
        self.state.can_commit()
    }
}

fn operator_options(key: &str, typed: &str) -> Vec<Suggestion> {
    if key.is_empty() {
        return Vec::new();
    }
    let typed = typed.to_ascii_uppercase();
    Operator::ALL
        .iter()
        .filter(|op| op.display().starts_with(&typed))
        .map(|op| Suggestion {
            value: format!("{} {}", key, op.display()),
            label: op.display().to_string(),
        })
        .collect()
}

/// Handle an event and answer its lookup right away (synchronous hosts)
pub fn drive(session: &mut Session, source: &dyn SuggestionSource, event: TagEvent) {
    if let Some(fetch) = session.handle(event) {
        let result = source.fetch(&fetch.query);
        session.receive_suggestions(fetch.seq, result);
    }
}
