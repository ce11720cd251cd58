use clap::{Parser, Subcommand, ValueEnum};
use color_eyre::Result;
use color_eyre::eyre::{WrapErr, eyre};
use serde_json::Value;
use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use tablefilter::config::Config;
use tablefilter::core::{FilterGroup, FilterNode};
use tablefilter::editor::{SortDirection, SortItem};
use tablefilter::services::normalize_filter;
use tracing::{debug, info};

/// Normalize filter trees and build backend query requests
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Enable file logging at the given level (overrides RUST_LOG)
    #[arg(long = "logging", value_enum, global = true)]
    logging: Option<LogLevel>,
    /// Path to a config file (overrides default config discovery)
    #[arg(long = "config", value_name = "PATH", global = true)]
    config: Option<PathBuf>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the backend form of a user filter (`-` reads stdin)
    Normalize {
        filter: PathBuf,
    },
    /// Print the request a table would send for the given state
    Query {
        /// User filter file
        #[arg(long)]
        filter: Option<PathBuf>,
        /// Filter always and-ed in front of the user filter
        #[arg(long = "static-filter")]
        static_filter: Option<PathBuf>,
        /// Fulltext search string
        #[arg(long)]
        fulltext: Option<String>,
        #[arg(long, default_value_t = 0)]
        offset: usize,
        /// Page size; defaults to the configured paging default
        #[arg(long)]
        limit: Option<usize>,
        /// Sort entry, `field:ASC` or `field:DESC`. Repeat for more columns.
        #[arg(long = "sort", value_name = "FIELD:DIR", value_parser = parse_sort)]
        sort: Vec<SortItem>,
    },
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<LogLevel> for tracing::Level {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Error => tracing::Level::ERROR,
            LogLevel::Warn => tracing::Level::WARN,
            LogLevel::Info => tracing::Level::INFO,
            LogLevel::Debug => tracing::Level::DEBUG,
            LogLevel::Trace => tracing::Level::TRACE,
        }
    }
}

fn parse_sort(raw: &str) -> Result<SortItem, String> {
    let (field, direction) = match raw.rsplit_once(':') {
        Some((field, dir)) => (field, dir),
        None => (raw, "ASC"),
    };
    if field.is_empty() {
        return Err(format!("missing sort field in '{raw}'"));
    }
    let direction = match direction.to_ascii_uppercase().as_str() {
        "ASC" => SortDirection::Asc,
        "DESC" => SortDirection::Desc,
        other => return Err(format!("unknown sort direction '{other}'")),
    };
    Ok(SortItem::new(field, direction))
}

fn read_json(path: &Path) -> Result<Value> {
    let text = if path == Path::new("-") {
        let mut buf = String::new();
        io::stdin().read_to_string(&mut buf)?;
        buf
    } else {
        fs::read_to_string(path).wrap_err_with(|| format!("failed to read {}", path.display()))?
    };
    serde_json::from_str(&text).wrap_err_with(|| format!("invalid JSON in {}", path.display()))
}

fn read_group(path: &Path) -> Result<FilterGroup> {
    Ok(serde_json::from_value(read_json(path)?)?)
}

fn main() -> Result<()> {
    color_eyre::install()?;
    let args = Args::parse();
    tablefilter::logging::init_with(None, args.logging.map(Into::into))?;

    let cfg = Config::from_path(args.config.as_ref())
        .map_err(|e| eyre!("failed to load config: {e}"))?;
    debug!(fields = cfg.registry().fields().len(), "config loaded");

    let output = match args.command {
        Command::Normalize { filter } => {
            let group = read_group(&filter)?;
            let normalized = normalize_filter(Some(&group), &cfg.registry())?;
            match normalized {
                Some(group) => serde_json::to_value(&group)?,
                None => Value::Object(Default::default()),
            }
        }
        Command::Query {
            filter,
            static_filter,
            fulltext,
            offset,
            limit,
            sort,
        } => {
            let mut state = cfg.query_state();
            if let Some(path) = static_filter {
                let node: FilterNode = serde_json::from_value(read_json(&path)?)?;
                state.set_static_filter(Some(node))?;
            }
            if let Some(path) = filter {
                state.set_filter(Some(read_group(&path)?))?;
            }
            state.set_fulltext(fulltext)?;
            state.set_sort(sort)?;

            let limit = limit.unwrap_or_else(|| cfg.paging_default());
            let request = state
                .set_page(offset, limit)?
                .ok_or_else(|| eyre!("no request produced"))?;
            info!(rules = state.filter_rules_count(), "request built");
            request.to_json()?
        }
    };

    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}
