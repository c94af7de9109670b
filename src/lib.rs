pub mod cli;
pub mod codec;
pub mod config;
pub mod display;
pub mod filter;
pub mod replay;
pub mod session;

use crate::codec::{Encoding, decode_filters, filters_from_query, to_query_param};
use crate::config::EngineConfig;
use crate::filter::{FilterGroup, StructuredFilter, TagToken};
use crate::session::{
    CatalogSuggestions, Session, SessionContext, SuggestionContext, SuggestionQuery,
    SuggestionSource, SuggestionTarget, example_queries_to_options,
};
use anyhow::{Context, Result};
use serde::Deserialize;
use std::io::Read;
use std::path::Path;

pub use cli::{ColorMode, Commands, OutputFormat, cli_parse};
pub use codec::{encode_filters, try_decode_filters};
pub use filter::{
    FilterId, Operator, is_exists_not_exists_operator, is_in_nin_operator, normalize,
    serialize_filter,
};

/// Filters given to `format`: a bare array or a whole group
#[derive(Deserialize)]
#[serde(untagged)]
enum FilterInput {
    Items(Vec<StructuredFilter>),
    Group(FilterGroup),
}

/// Parse JSON filters, falling back to JSON5 for hand-written input
fn parse_filter_input(raw: &str) -> Result<FilterGroup> {
    let input = serde_json::from_str::<FilterInput>(raw)
        .or_else(|_| json5::from_str::<FilterInput>(raw))
        .context("Input is neither a filter array nor a filter group")?;
    Ok(match input {
        FilterInput::Items(items) => FilterGroup {
            items,
            ..Default::default()
        },
        FilterInput::Group(group) => group,
    })
}

fn read_stdin() -> Result<String> {
    let mut buf = String::new();
    std::io::stdin()
        .read_to_string(&mut buf)
        .context("Failed to read filters from stdin")?;
    Ok(buf)
}

fn print_tokens(tokens: &[String], format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Text => {
            for token in tokens {
                println!("{}", display::colorize_token(&TagToken::parse(token)));
            }
        }
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(tokens)?),
    }
    Ok(())
}

fn print_group(group: &FilterGroup, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Text => print!("{}", display::format_group_text(group)),
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(group)?),
    }
    Ok(())
}

fn init_logging(level: &str) {
    // A second init (tests calling run twice) is harmless
    let _ = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp(None)
        .try_init();
}

fn load_engine_config(path: Option<&Path>) -> Result<EngineConfig> {
    config::load_config(path).context("Failed to load config")
}

pub fn run() -> Result<()> {
    let cli = cli_parse();
    init_logging(cli.log_level());

    match cli.color {
        ColorMode::Always => colored::control::set_override(true),
        ColorMode::Never => colored::control::set_override(false),
        ColorMode::Auto => {}
    }

    let config = load_engine_config(cli.config.as_deref())?;
    let format = cli.format;
    log::info!(
        "url param '{}' ({:?}), data source {}",
        config.url.param,
        config.url.encoding,
        config.suggestions.data_source
    );

    match &cli.command {
        Commands::Parse { tokens } => {
            let parsed: Vec<TagToken> = tokens.iter().map(|t| TagToken::parse(t)).collect();
            match format {
                OutputFormat::Text => print!("{}", display::format_tokens_text(&parsed)),
                OutputFormat::Json => println!(
                    "{}",
                    serde_json::to_string_pretty(&display::tokens_to_json(&parsed))?
                ),
            }
        }
        Commands::Format { input } => {
            let raw = match input {
                Some(raw) => raw.clone(),
                None => read_stdin()?,
            };
            let group = parse_filter_input(&raw)?;
            print_tokens(&group.to_tokens(), format)?;
        }
        Commands::Encode { tokens, encoding } => {
            let encoding = encoding.unwrap_or(config.url.encoding);
            let group = FilterGroup::from_tokens(tokens);
            if group.len() < tokens.len() {
                log::warn!(
                    "Skipped {} incomplete token(s)",
                    tokens.len() - group.len()
                );
            }
            let param = to_query_param(&group, &config.url.param, encoding);
            match format {
                OutputFormat::Text => println!("{param}"),
                OutputFormat::Json => println!(
                    "{}",
                    serde_json::to_string_pretty(&serde_json::json!({
                        "param": config.url.param,
                        "encoding": encoding,
                        "query": param,
                    }))?
                ),
            }
        }
        Commands::Decode {
            value,
            query,
            encoding,
        } => {
            let encoding: Encoding = encoding.unwrap_or(config.url.encoding);
            let group = if *query {
                filters_from_query(value, &config.url.param, encoding)
            } else {
                decode_filters(value, encoding)
            };
            print_group(&group, format)?;
        }
        Commands::Suggest {
            partial,
            key,
            data_source,
        } => {
            let source = CatalogSuggestions::from_config(&config);
            let target = match key {
                Some(key) => SuggestionTarget::Values {
                    key: key.clone(),
                    partial: partial.clone(),
                },
                None => SuggestionTarget::Keys {
                    partial: partial.clone(),
                },
            };
            let query = SuggestionQuery {
                target,
                context: SuggestionContext {
                    data_source: data_source.unwrap_or(config.suggestions.data_source),
                    existing_filters: Vec::new(),
                },
            };
            let mut suggestions = source.fetch(&query).unwrap_or_else(|err| {
                log::warn!("Suggestion lookup failed: {}", err);
                Vec::new()
            });
            if key.is_none() && partial.is_empty() {
                suggestions.extend(example_queries_to_options(
                    &config.suggestions.example_groups(),
                ));
            }
            match format {
                OutputFormat::Text => print!("{}", display::format_suggestions_text(&suggestions)),
                OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&suggestions)?),
            }
        }
        Commands::Replay { file, data_source } => {
            let steps = replay::load_script(file)?;
            let source = CatalogSuggestions::from_config(&config);
            let mut session = Session::new(SessionContext {
                data_source: data_source.unwrap_or(config.suggestions.data_source),
            })
            .with_suggested_filters(&config.suggestions.example_groups());
            replay::replay(&mut session, &source, &steps);

            let param = to_query_param(session.group(), &config.url.param, config.url.encoding);
            match format {
                OutputFormat::Text => print!("{}", display::format_session_text(&session, &param)),
                OutputFormat::Json => println!(
                    "{}",
                    serde_json::to_string_pretty(&display::session_to_json(&session, &param))?
                ),
            }
        }
    }

    Ok(())
}
