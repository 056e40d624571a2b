//! Ontoval CLI
//!
//! Checks that the values in one column of a CSV/TSV file are classified
//! under the classes named in another column, according to an RDF/OWL
//! ontology.

use anyhow::{anyhow, Context, Result};
use clap::{Args, Parser, Subcommand};
use colored::Colorize;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use ontoval_ingest_csv::load_dataset;
use ontoval_ingest_rdfowl::load_ontology;
use ontoval_validate::{
    render_report_json, render_report_text, run_with_oracle, verdict_line, SubsumptionOracle,
    ToldHierarchyOracle, ValidateOptions,
};

#[derive(Parser)]
#[command(name = "ontoval")]
#[command(
    author,
    version,
    about = "Ontoval: validate tabular data against an ontology's class hierarchy"
)]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug). `ONTOVAL_LOG`, then `RUST_LOG`, overrides.
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check that every value is a descendant (subclass or member) of its row's ancestor.
    Validate(ValidateArgs),
}

#[derive(Args)]
struct ValidateArgs {
    /// CSV file containing the data to validate (`.tsv` is read tab-separated)
    #[arg(short = 'c', long)]
    csv: PathBuf,
    /// Ontology to validate against (`.owl`/`.rdf`/`.ttl`/`.nt`/`.nq`/`.trig`)
    #[arg(short = 'w', long)]
    owl: PathBuf,
    /// Name of the column whose values are validated
    #[arg(short = 'l', long = "validate", value_name = "COLUMN")]
    value_column: String,
    /// Name of the column holding each row's ancestor
    #[arg(short = 'a', long = "ancestor", value_name = "COLUMN")]
    ancestor_column: String,
    /// Save results to this file instead of stdout
    #[arg(short = 'o', long)]
    output: Option<PathBuf>,
    /// Report format: text, json
    #[arg(long, default_value = "text")]
    format: String,
    /// Validate rows in parallel (report order is preserved)
    #[arg(long)]
    parallel: bool,
    /// Resolve every cell afresh instead of memoising repeated strings
    #[arg(long)]
    no_cache: bool,
    /// Exit non-zero when the input is not valid
    #[arg(long)]
    fail_on_invalid: bool,
    /// Extra CURIE prefix, e.g. `--prefix "ex: http://example.org/"` (repeatable)
    #[arg(short = 'p', long = "prefix", value_name = "PREFIX: IRI", value_parser = parse_prefix)]
    prefixes: Vec<(String, String)>,
}

fn parse_prefix(raw: &str) -> Result<(String, String), String> {
    let (prefix, namespace) = raw
        .split_once(':')
        .ok_or_else(|| format!("expected `PREFIX: IRI`, got `{raw}`"))?;
    let prefix = prefix.trim();
    let namespace = namespace.trim();
    if namespace.is_empty() || prefix.contains(char::is_whitespace) {
        return Err(format!("expected `PREFIX: IRI`, got `{raw}`"));
    }
    Ok((prefix.to_string(), namespace.to_string()))
}

fn init_tracing(verbose: u8) {
    let default_level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter = EnvFilter::try_from_env("ONTOVAL_LOG")
        .or_else(|_| EnvFilter::try_from_default_env())
        .unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Commands::Validate(args) => cmd_validate(&args),
    }
}

fn cmd_validate(args: &ValidateArgs) -> Result<()> {
    let format = args.format.trim().to_ascii_lowercase();
    if !matches!(format.as_str(), "text" | "json") {
        return Err(anyhow!("unknown --format `{format}` (expected text|json)"));
    }

    let dataset = load_dataset(&args.csv)
        .with_context(|| format!("failed to load dataset {}", args.csv.display()))?;
    let mut ontology = load_ontology(&args.owl)
        .with_context(|| format!("failed to load ontology {}", args.owl.display()))?;
    for (prefix, namespace) in &args.prefixes {
        ontology = ontology.with_prefix(prefix, namespace);
    }

    let oracle = ToldHierarchyOracle::new(&ontology);
    tracing::info!(
        oracle = oracle.name(),
        rows = dataset.len(),
        value_column = %args.value_column,
        ancestor_column = %args.ancestor_column,
        "validating"
    );

    let options = ValidateOptions {
        parallel: args.parallel,
        cache_resolutions: !args.no_cache,
    };
    let report = run_with_oracle(
        &dataset,
        &ontology,
        &oracle,
        &args.value_column,
        &args.ancestor_column,
        options,
    )?;

    // Only opened once validation succeeded: a fatal error leaves no report.
    let mut writer: Box<dyn Write> = match &args.output {
        Some(path) => Box::new(BufWriter::new(File::create(path).with_context(|| {
            format!("failed to create output {}", path.display())
        })?)),
        None => Box::new(io::stdout().lock()),
    };

    match format.as_str() {
        "json" => {
            writeln!(writer, "{}", render_report_json(&report)?)?;
        }
        _ => {
            writer.write_all(render_report_text(&report).as_bytes())?;
            writeln!(writer, "{}", verdict_line(report.valid))?;
        }
    }
    writer.flush()?;
    drop(writer);

    if let Some(path) = &args.output {
        eprintln!("{} {}", "wrote".green().bold(), path.display().to_string().bold());
    }

    if !report.valid && args.fail_on_invalid {
        return Err(anyhow!(
            "validation found {} invalid and {} unresolvable row(s)",
            report.summary.invalid,
            report.summary.unresolvable
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prefix_argument_splits_on_first_colon() {
        assert_eq!(
            parse_prefix("ex: http://example.org/pets#").unwrap(),
            ("ex".to_string(), "http://example.org/pets#".to_string())
        );
        assert_eq!(
            parse_prefix(":http://example.org/").unwrap(),
            (String::new(), "http://example.org/".to_string())
        );
        assert!(parse_prefix("ex").is_err());
        assert!(parse_prefix("ex:").is_err());
        assert!(parse_prefix("e x: http://example.org/").is_err());
    }
}
