#![cfg(feature = "json_schema")]

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use jsonschema::{Draft, JSONSchema};
use schemars::schema_for;
use serde_json::Value;
use std::{fs, path::PathBuf, process::ExitCode};
use tablefilter::config::Config;

/// Print the table config schema, or check config files against it.
#[derive(Parser, Debug)]
#[command(name = "filter-schema", about = "Table config schema and config checker")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the config JSON schema, or write it to `--output`
    Schema {
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Check JSON5 config files. Unknown keys and wrong types are reported
    /// per file, followed by anything the config loader itself rejects.
    Validate {
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },
}

fn config_schema() -> Result<Value> {
    Ok(serde_json::to_value(schema_for!(Config))?)
}

/// Problems found in one file; empty when the file is usable
fn check_file(schema: &JSONSchema, path: &PathBuf) -> Result<Vec<String>> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    // checked as written: the loader would drop unknown keys silently
    let raw: Value = match json5::from_str(&text) {
        Ok(raw) => raw,
        Err(err) => return Ok(vec![format!("not valid JSON5: {err}")]),
    };

    let mut problems: Vec<String> = match schema.validate(&raw) {
        Ok(()) => Vec::new(),
        Err(errors) => errors
            .map(|err| format!("{err} at {}", err.instance_path))
            .collect(),
    };
    if problems.is_empty() {
        if let Err(err) = Config::from_path(Some(path)) {
            problems.push(err.to_string());
        }
    }
    Ok(problems)
}

fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    match cli.command {
        Command::Schema { output } => {
            let json = serde_json::to_string_pretty(&config_schema()?)?;
            match output {
                Some(path) => {
                    fs::write(&path, json)?;
                    eprintln!("Wrote schema to {}", path.display());
                }
                None => println!("{json}"),
            }
            Ok(ExitCode::SUCCESS)
        }
        Command::Validate { files } => {
            let schema_json = config_schema()?;
            let schema = JSONSchema::options()
                .with_draft(Draft::Draft7)
                .compile(&schema_json)
                .map_err(|err| anyhow::anyhow!("failed to compile config schema: {err}"))?;

            let mut failed = false;
            for file in &files {
                let problems = check_file(&schema, file)?;
                if problems.is_empty() {
                    println!("{}: ok", file.display());
                    continue;
                }
                failed = true;
                eprintln!("{}:", file.display());
                for problem in problems {
                    eprintln!("  - {problem}");
                }
            }
            Ok(if failed { ExitCode::FAILURE } else { ExitCode::SUCCESS })
        }
    }
}
