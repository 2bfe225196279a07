use anyhow::{Context, Result};
use clap::Parser;
use codequery::corpus::{estimate_complexity, language_for_extension, load_directory};
use codequery::output;
use codequery::query::{MatchLocations, evaluate_file};
use codequery::{CompiledQuery, SearchConfig, SearchEngine};
use serde::Serialize;
use std::io::IsTerminal;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "cq")]
#[command(about = "Boolean and filter queries over source code")]
struct Cli {
    /// Search query
    #[arg(trailing_var_arg = true, required = true)]
    query: Vec<String>,

    /// Directory to search in
    #[arg(short, long, default_value = ".")]
    path: PathBuf,

    /// Match case-sensitively
    #[arg(short = 's', long)]
    case_sensitive: bool,

    /// Print the result as JSON
    #[arg(long)]
    json: bool,

    /// Print the planned query and exit
    #[arg(long)]
    explain: bool,

    /// Evaluate a single file and print highlighted matching lines
    #[arg(long, value_name = "FILE")]
    file: Option<PathBuf>,

    /// Config file (defaults to the user config directory)
    #[arg(long, value_name = "CONFIG")]
    config: Option<PathBuf>,
}

#[derive(Serialize)]
struct JsonFileResult<'a> {
    path: &'a str,
    matched: bool,
    language: &'a str,
    complexity: u32,
    notices: &'a [String],
    locations: &'a MatchLocations,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_env("CQ_LOG").unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    match run(Cli::parse()) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::from(1),
        Err(err) => {
            eprintln!("error: {err:#}");
            ExitCode::from(2)
        }
    }
}

/// Returns whether anything matched
fn run(cli: Cli) -> Result<bool> {
    let mut config = match &cli.config {
        Some(path) => SearchConfig::load_from(path)?,
        None => SearchConfig::load()?,
    };
    if cli.case_sensitive {
        config.case_sensitive = true;
    }

    let query = cli.query.join(" ");
    let color = std::io::stdout().is_terminal() && !cli.json;
    let compiled = CompiledQuery::new(&query, config.max_query_terms)?;
    output::print_notices(&compiled.notices, color)?;

    if cli.explain {
        match &compiled.ast {
            Some(ast) => println!("{ast}"),
            None => println!("(match all)"),
        }
        return Ok(true);
    }

    if let Some(file) = &cli.file {
        return run_file(file, &compiled, &config, cli.json, color);
    }

    let documents = load_directory(&cli.path, &config)?;
    let engine = SearchEngine::new(documents, config);
    let result = engine.execute(compiled);

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        output::print_documents(&result.documents, color)?;
    }
    Ok(!result.documents.is_empty())
}

fn run_file(
    file: &Path,
    compiled: &CompiledQuery,
    config: &SearchConfig,
    json: bool,
    color: bool,
) -> Result<bool> {
    let content =
        std::fs::read(file).with_context(|| format!("Failed to read {}", file.display()))?;
    let location = file.to_string_lossy();
    let filename = file
        .file_name()
        .map(|n| n.to_string_lossy())
        .unwrap_or_default();

    let ast = compiled.ast.as_ref();
    let evaluation = evaluate_file(ast, &content, &filename, &location, config.case_sensitive);

    // Metadata is only computed for files that passed the content stage
    let extension = file.extension().and_then(|e| e.to_str()).unwrap_or_default();
    let language = language_for_extension(extension);
    let complexity = if evaluation.matched {
        estimate_complexity(&String::from_utf8_lossy(&content))
    } else {
        0
    };
    let evaluation = evaluation.with_metadata(language, complexity);

    if json {
        let result = JsonFileResult {
            path: &location,
            matched: evaluation.matched,
            language,
            complexity,
            notices: &compiled.notices,
            locations: &evaluation.locations,
        };
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else if evaluation.matched {
        output::print_file_matches(&location, &content, &evaluation.locations, color)?;
    }
    Ok(evaluation.matched)
}
