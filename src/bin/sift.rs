//! sift — the search-box query CLI
//!
//! Parses a search-box query, compiles it against a schema, and shows
//! exactly what the storage layer would receive.
//!
//! # Usage
//!
//! ```bash
//! # Compile against a JSON schema file
//! sift '?is_active ?price>100 | ?due' --schema schema.json
//!
//! # Introspect a live database
//! sift '\show=10 \page=2 lamp' --database-url postgres://localhost/app
//!
//! # No schema at all: everything falls back to in-process evaluation
//! sift 'office-chair--with-wheels-deadbeef ?has_note'
//! ```

use std::path::Path;
use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use colored::*;

use sift::compiler::{compile, CompiledConditional, DEFAULT_TABLE};
use sift::engine;
use sift::schema::{Schema, TypeResolver};

#[derive(Parser)]
#[command(name = "sift")]
#[command(version)]
#[command(about = "Search-box query compiler", long_about = None)]
#[command(after_help = "EXAMPLES:
    sift 'office-chair--with-wheels-deadbeef'
    sift '\\show=10 \\page=2 ?is_active ?price>100 | ?due' --schema schema.json
    sift '?has_note' --database-url postgres://localhost/app")]
struct Cli {
    /// The query to compile
    query: String,

    /// Target table (defaults to sift.toml [query] table, then "items")
    #[arg(short, long)]
    table: Option<String>,

    /// Table alias used in generated SQL
    #[arg(long)]
    alias: Option<String>,

    /// Default page size when no \show directive is present
    #[arg(long)]
    page_size: Option<i64>,

    /// JSON schema file (tables, columns, native types)
    #[arg(short, long)]
    schema: Option<String>,

    /// Introspect a live database instead of reading a schema file
    #[arg(long, env = "SIFT_DATABASE_URL")]
    database_url: Option<String>,

    /// Show the full parse breakdown
    #[arg(short, long)]
    verbose: bool,
}

/// Optional project-local `sift.toml`.
#[derive(Default, serde::Deserialize)]
struct FileConfig {
    #[serde(default)]
    postgres: PgSection,
    #[serde(default)]
    query: QuerySection,
}

#[derive(Default, serde::Deserialize)]
struct PgSection {
    url: Option<String>,
}

#[derive(Default, serde::Deserialize)]
struct QuerySection {
    table: Option<String>,
    page_size: Option<i64>,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = run(Cli::parse()).await {
        eprintln!("{} {}", "Error:".red().bold(), e);
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<()> {
    let config = load_config();

    let table = cli
        .table
        .clone()
        .or(config.query.table.clone())
        .unwrap_or_else(|| DEFAULT_TABLE.to_string());
    let page_size = cli.page_size.or(config.query.page_size).unwrap_or(50);

    // Flag first, then sift.toml; no schema at all still works — every
    // filter simply goes residual.
    let schema = if let Some(path) = &cli.schema {
        Schema::from_file(Path::new(path))?
    } else if let Some(url) = cli.database_url.as_ref().or(config.postgres.url.as_ref()) {
        let pool = engine::connect(url).await?;
        engine::load_schema(&pool).await?
    } else {
        Schema::new()
    };

    let resolver = TypeResolver::new(Arc::new(schema));
    let query = sift::parse(&cli.query);
    let compiled = compile(&query, &table, cli.alias.as_deref(), page_size, &resolver);

    if cli.verbose {
        println!("{} {}", "Input:".dimmed(), query.raw.yellow());
        println!();
    }

    if !query.identifiers.is_empty() {
        println!(
            "{} {}",
            "Identifiers:".cyan().bold(),
            query.identifiers.join(", ")
        );
    }
    if !query.free_text_terms.is_empty() {
        println!("{} {}", "Query text: ".cyan().bold(), query.query_text());
    }
    if !query.directives.is_empty() {
        let shown: Vec<String> = query.directives.iter().map(|d| d.to_string()).collect();
        println!("{} {}", "Directives: ".cyan().bold(), shown.join(" "));
    }
    if let Some(mode) = compiled.mode {
        println!("{} {:?}", "Mode:       ".cyan().bold(), mode);
    }

    println!();
    print_sql(&compiled);
    Ok(())
}

fn print_sql(compiled: &CompiledConditional) {
    let (sql, values) = engine::render_select(compiled);

    println!("{}", "Generated SQL:".green().bold());
    println!("{}", sql.white());

    if !values.is_empty() {
        println!();
        println!("{}", "Bindings:".cyan());
        for (i, value) in values.iter().enumerate() {
            println!("  ${} = {}", i + 1, value.to_string().yellow());
        }
    }

    if !compiled.residual_chains.is_empty() {
        println!();
        println!(
            "{} {} chain(s) must be evaluated in-process",
            "Residual:".yellow().bold(),
            compiled.residual_chains.len()
        );
        for chain in &compiled.residual_chains {
            let atoms: Vec<String> = chain
                .atoms
                .iter()
                .map(|a| {
                    let neg = if a.negated { "!" } else { "" };
                    match &a.value {
                        Some(v) => format!("?{}{}{}{}", neg, a.key, a.op, v),
                        None => format!("?{}{}", neg, a.key),
                    }
                })
                .collect();
            println!("  {}", atoms.join(" "));
        }
    }
}

fn load_config() -> FileConfig {
    let path = Path::new("sift.toml");
    if !path.exists() {
        return FileConfig::default();
    }
    match std::fs::read_to_string(path) {
        Ok(content) => toml::from_str(&content).unwrap_or_default(),
        Err(_) => FileConfig::default(),
    }
}
