// Only compile UI module when TUI feature is enabled
#[cfg(feature = "tui")]
mod ui;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::fs::File;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing_subscriber::EnvFilter;

// Use library instead of local modules
use company_review::{export_record, CompanyValidator, Dataset, ReviewSession};

/// Review, correct and export company records.
#[derive(Parser, Debug)]
#[command(name = "company-review", version, about)]
struct Cli {
    /// Dataset JSON ({ naicsReference, companies }); defaults to the built-in sample
    #[arg(long, global = true)]
    data: Option<PathBuf>,

    /// Directory export files are written to
    #[arg(long, global = true, default_value = ".")]
    out_dir: PathBuf,

    /// Write logs here while the review UI owns the terminal
    #[arg(long, global = true)]
    log_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Open the interactive review editor (default)
    Review,
    /// Validate every record and list its issues
    Check,
    /// Export one record; refused while it has validation issues
    Export {
        /// Record id
        id: String,
    },
    /// Export every record, flagging the invalid ones
    ExportAll,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command.as_ref().unwrap_or(&Commands::Review) {
        Commands::Review => {
            init_file_logging(cli.log_file.as_deref())?;
            let dataset = load_dataset(cli.data.as_deref())?;
            run_ui_mode(dataset, &cli.out_dir)?;
        }
        Commands::Check => {
            init_logging();
            let dataset = load_dataset(cli.data.as_deref())?;
            let invalid = run_check(&dataset);
            if invalid > 0 {
                std::process::exit(1);
            }
        }
        Commands::Export { id } => {
            init_logging();
            let dataset = load_dataset(cli.data.as_deref())?;
            if !run_export(&dataset, id, &cli.out_dir)? {
                std::process::exit(1);
            }
        }
        Commands::ExportAll => {
            init_logging();
            let dataset = load_dataset(cli.data.as_deref())?;
            run_export_all(dataset, &cli.out_dir)?;
        }
    }

    Ok(())
}

// ============================================================================
// LOGGING
// ============================================================================

fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
}

/// CLI commands: logs on stderr, results on stdout
fn init_logging() {
    tracing_subscriber::fmt()
        .with_env_filter(env_filter())
        .with_writer(std::io::stderr)
        .init();
}

/// Review UI: logs go to a file, or nowhere, never to the alternate screen
fn init_file_logging(log_file: Option<&Path>) -> Result<()> {
    if let Some(path) = log_file {
        let file = File::create(path)
            .with_context(|| format!("cannot create log file {}", path.display()))?;

        tracing_subscriber::fmt()
            .with_env_filter(env_filter())
            .with_ansi(false)
            .with_writer(Mutex::new(file))
            .init();
    }
    Ok(())
}

fn load_dataset(path: Option<&Path>) -> Result<Dataset> {
    let dataset = match path {
        Some(path) => Dataset::load(path)
            .with_context(|| format!("cannot load dataset {}", path.display()))?,
        None => Dataset::sample().context("built-in sample dataset is broken")?,
    };
    Ok(dataset)
}

// ============================================================================
// COMMANDS
// ============================================================================

/// Returns the number of invalid records
fn run_check(dataset: &Dataset) -> usize {
    let validator = CompanyValidator::new(dataset.reference());

    println!("🔍 Checking {} companies", dataset.len());
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");

    let mut invalid = 0;
    for record in dataset.records() {
        let issues = validator.issues(&record.value);
        if issues.is_empty() {
            println!("✓ {} ({})", record.name, record.id);
            continue;
        }

        invalid += 1;
        println!("✗ {} ({}) - {} issue(s)", record.name, record.id, issues.len());
        for issue in &issues {
            println!("    {}", issue);
        }
    }

    for diagnostic in dataset.diagnostics() {
        println!("⚠️  {}", diagnostic);
    }

    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    println!("{} valid, {} invalid", dataset.len() - invalid, invalid);
    invalid
}

/// Returns false when the export was blocked
fn run_export(dataset: &Dataset, id: &str, out_dir: &Path) -> Result<bool> {
    let source = dataset
        .find(id)
        .with_context(|| format!("no company with id '{}'", id))?;

    let validator = CompanyValidator::new(dataset.reference());
    match export_record(&validator, &source.value) {
        Ok(document) => {
            let path = document.write_to(out_dir)?;
            println!("✅ Company data exported successfully!");
            println!("   {}", path.display());
            Ok(true)
        }
        Err(blocked) => {
            eprintln!("❌ {}", blocked.summary());
            eprintln!("   {}", blocked.details());
            Ok(false)
        }
    }
}

fn run_export_all(dataset: Dataset, out_dir: &Path) -> Result<()> {
    let session = ReviewSession::new(dataset);
    let bulk = session.export_all();
    let path = bulk.document.write_to(out_dir)?;

    let notice = bulk.notice();
    if bulk.has_warnings() {
        println!("⚠️  {}", notice.message);
    } else {
        println!("✅ {}", notice.message);
    }
    if let Some(detail) = notice.detail {
        println!("   {}", detail);
    }
    println!("   {}", path.display());

    Ok(())
}

#[cfg(feature = "tui")]
fn run_ui_mode(dataset: Dataset, out_dir: &Path) -> Result<()> {
    println!("🖥️  Loading company review...\n");

    let mut app = ui::App::new(ReviewSession::new(dataset), out_dir.to_path_buf())?;
    ui::run_ui(&mut app)?;

    println!("\n✅ Review closed");
    Ok(())
}

#[cfg(not(feature = "tui"))]
fn run_ui_mode(_dataset: Dataset, _out_dir: &Path) -> Result<()> {
    eprintln!("❌ Review UI not available!");
    eprintln!("   Rebuild with: cargo build --features tui");
    eprintln!("   Or use: company-review check | export <ID> | export-all");
    std::process::exit(1);
}
