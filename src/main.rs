//! Gridcalc - evaluate spreadsheet formulas from the command line

mod config;

use anyhow::Context;
use clap::Parser;
use gridcalc_core::Document;
use gridcalc_core::storage::write_csv_to;
use gridcalc_engine::BUILTINS;
use gridcalc_engine::engine::FORMULA_PREFIX;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "gridcalc", version, about = "Evaluate spreadsheet formulas")]
struct Cli {
    /// CSV file to load
    file: Option<PathBuf>,

    /// Evaluate one formula against the sheet and print its value
    #[arg(short = 'c', long = "command", value_name = "FORMULA", allow_hyphen_values = true)]
    command: Option<String>,

    /// Set a cell before evaluating, e.g. -s A1=42 or -s B1==A1*2 (repeatable)
    #[arg(short = 's', long = "set", value_name = "CELL=INPUT")]
    set: Vec<String>,

    /// Export the evaluated sheet to a CSV file
    #[arg(short = 'o', long = "output", value_name = "FILE")]
    output: Option<PathBuf>,

    /// Read settings from this TOML file instead of the user config dir
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Maximum formula nesting depth (overrides the config file)
    #[arg(long, value_name = "N")]
    max_depth: Option<usize>,

    /// List the built-in functions and exit
    #[arg(long)]
    functions: bool,
}

fn init_tracing() {
    let filter = EnvFilter::try_from_env("GRIDCALC_LOG").unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn print_functions() {
    for builtin in BUILTINS {
        println!(
            "{:<12} {:<12} {}",
            builtin.name,
            builtin.arity.to_string(),
            builtin.description
        );
    }
}

fn run(cli: Cli) -> anyhow::Result<ExitCode> {
    if cli.functions {
        print_functions();
        return Ok(ExitCode::SUCCESS);
    }

    let (mut config, warnings) = config::load_config(cli.config.as_deref());
    for warning in warnings {
        eprintln!("Warning: {}", warning);
    }
    if let Some(max_depth) = cli.max_depth {
        config.engine.max_depth = max_depth;
    }

    let mut doc = Document::with_options(config.engine);
    if let Some(path) = &cli.file {
        doc.load_csv(path)
            .with_context(|| format!("failed to load {}", path.display()))?;
    }
    for assignment in &cli.set {
        doc.apply_assignment(assignment)?;
    }
    if cli.file.is_some() && !cli.set.is_empty() {
        // Formulas from the file may read the cells just set.
        doc.recalculate();
    }

    let mut code = ExitCode::SUCCESS;
    if let Some(formula) = &cli.command {
        let formula = formula.trim();
        let formula = if formula.starts_with(FORMULA_PREFIX) {
            formula.to_string()
        } else {
            format!("{}{}", FORMULA_PREFIX, formula)
        };
        let result = doc.evaluate(&formula);
        println!("{}", result);
        if result.is_error() {
            code = ExitCode::FAILURE;
        }
    }

    if let Some(output_path) = &cli.output {
        doc.save_csv(output_path)
            .with_context(|| format!("failed to write {}", output_path.display()))?;
        eprintln!("Exported to {}", output_path.display());
    } else if cli.command.is_none() {
        let stdout = std::io::stdout();
        write_csv_to(&mut stdout.lock(), &doc.grid)?;
    }

    Ok(code)
}

fn main() -> ExitCode {
    init_tracing();
    let cli = Cli::parse();
    match run(cli) {
        Ok(code) => code,
        Err(err) => {
            eprintln!("Error: {:#}", err);
            ExitCode::FAILURE
        }
    }
}
