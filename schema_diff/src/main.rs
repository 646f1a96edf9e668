use std::fs;
use std::path::PathBuf;

use anyhow::{bail, Context};
use clap::Parser;
use serde_json::json;

use schema_diff::config::{self, Config, LoggingConfig};
use schema_diff::utils::logging::init_logging;
use schema_diff::{SchemaComparison, SchemaDiffClient};

/// Compare two schema snapshots and print the DDL that turns the target into the source
#[derive(Debug, Parser)]
#[command(name = "schema_diff", version, about)]
struct Args {
    /// Source snapshot (.json, .yaml or .yml)
    #[arg(long)]
    source: PathBuf,

    /// Target snapshot (.json, .yaml or .yml)
    #[arg(long)]
    target: PathBuf,

    /// TOML configuration file
    #[arg(long)]
    config: Option<String>,

    /// Only report on this table, with its source, target and delta DDL
    #[arg(long)]
    table: Option<String>,

    /// Never treat ownership as a difference
    #[arg(long)]
    ignore_owner: bool,

    /// Compare text values with whitespace runs collapsed
    #[arg(long)]
    ignore_whitespace: bool,

    /// Output format: text, json or sql
    #[arg(long)]
    format: Option<String>,

    /// Write the result to this file instead of stdout
    #[arg(long)]
    output: Option<PathBuf>,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn main() {
    if let Err(err) = run() {
        eprintln!("Error: {:#}", err);
        std::process::exit(1);
    }
}

fn load_config(args: &Args) -> anyhow::Result<Config> {
    let mut config = match &args.config {
        Some(path) => config::load_from_file(path)
            .with_context(|| format!("loading configuration from {}", path))?,
        None => Config::default(),
    };

    config.compare.ignore_owner |= args.ignore_owner;
    config.compare.ignore_whitespace |= args.ignore_whitespace;
    if let Some(format) = &args.format {
        config.output.format = format.clone();
    }
    if config.logging.is_none() {
        let level = match args.verbose {
            0 => "warn",
            1 => "info",
            2 => "debug",
            _ => "trace",
        };
        config.logging = Some(LoggingConfig {
            level: level.to_string(),
            file: None,
            format: "text".to_string(),
            stdout: false,
        });
    }
    config.validate()?;
    Ok(config)
}

fn run() -> anyhow::Result<()> {
    let args = Args::parse();
    let config = load_config(&args)?;
    init_logging(&config.logging)?;

    let client = SchemaDiffClient::new(config)?;
    let comparison = client
        .compare_files(&args.source, &args.target)
        .with_context(|| {
            format!(
                "comparing {} with {}",
                args.source.display(),
                args.target.display()
            )
        })?;

    let format = client.config().output.format.as_str();
    let (rendered, failed) = match &args.table {
        Some(table) => (render_table(&client, &comparison, table, format)?, false),
        None => render_schema(&client, &comparison, format)?,
    };

    match &args.output {
        Some(path) => fs::write(path, rendered)
            .with_context(|| format!("writing {}", path.display()))?,
        None => print!("{}", rendered),
    }

    if failed {
        bail!("some tables could not be scripted, see the report for details");
    }
    Ok(())
}

fn render_table(
    client: &SchemaDiffClient,
    comparison: &SchemaComparison,
    table: &str,
    format: &str,
) -> anyhow::Result<String> {
    let ddl = client.ddl_compare(comparison, table)?;
    let rendered = match format {
        "json" => serde_json::to_string_pretty(&ddl)? + "\n",
        "sql" => format!("{}\n", ddl.diff_ddl),
        _ => format!(
            "-- Source\n{}\n\n-- Target\n{}\n\n-- Difference\n{}\n",
            ddl.source_ddl, ddl.target_ddl, ddl.diff_ddl
        ),
    };
    Ok(rendered)
}

fn render_schema(
    client: &SchemaDiffClient,
    comparison: &SchemaComparison,
    format: &str,
) -> anyhow::Result<(String, bool)> {
    let report = client.generate_script(comparison);
    let failed = !report.is_complete();

    let rendered = match format {
        "json" => {
            let payload = json!({
                "entries": comparison.entries(),
                "script": report.script,
                "failures": report.failures,
            });
            serde_json::to_string_pretty(&payload)? + "\n"
        }
        "sql" => report.script.clone(),
        _ => {
            let mut text = String::new();
            for entry in comparison.entries() {
                text.push_str(&format!("{:>4}  {:<12} {}\n", entry.id, entry.status.as_str(), entry.title));
            }
            for failure in &report.failures {
                text.push_str(&format!(
                    "failed: {} ({}): {}\n",
                    failure.table, failure.kind, failure.message
                ));
            }
            if !report.tables.is_empty() {
                text.push('\n');
                text.push_str(&report.script);
            }
            text
        }
    };
    Ok((rendered, failed))
}
