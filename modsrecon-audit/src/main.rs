//! modsrecon-audit - MODS metadata reconciliation
//!
//! `audit` (default): compare every legacy MODS file under the root
//! directory with the live platform's copy and write mismatches to a CSV
//! report.
//!
//! `survey`: print every element and attribute path found under the root
//! directory with a sample value and occurrence count.

use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use modsrecon_audit::services::FileScanner;
use modsrecon_audit::{survey, AuditPipeline, ReportWriter};
use modsrecon_common::config::{load_config_layer, AuditConfig, TomlConfig, DEFAULT_PLACEHOLDER};
use modsrecon_common::IdentifierRegistry;

/// Command-line arguments for modsrecon-audit
#[derive(Parser, Debug)]
#[command(name = "modsrecon-audit")]
#[command(about = "Reconcile legacy MODS metadata against the live platform")]
#[command(version)]
#[command(args_conflicts_with_subcommands = true)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,

    #[command(flatten)]
    audit: AuditArgs,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Compare legacy and live MODS and write a mismatch report
    Audit(AuditArgs),
    /// List element and attribute paths found in a MODS directory
    Survey(SurveyArgs),
}

#[derive(Args, Debug, Default)]
struct AuditArgs {
    /// Directory holding one `{pid}.xml` file per object
    #[arg(short, long, env = "DIR")]
    root_dir: Option<PathBuf>,

    /// TOML config file (default: ~/.config/modsrecon/config.toml)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Base URL of live objects
    #[arg(long, env = "MODSRECON_BASE_URL")]
    base_url: Option<String>,

    /// `_format` query value for live fetches
    #[arg(long, env = "MODSRECON_FORMAT")]
    format: Option<String>,

    /// `nid,pid` registry CSV
    #[arg(long)]
    registry: Option<PathBuf>,

    /// Report CSV to write
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Concurrent workers
    #[arg(short, long, env = "MODSRECON_WORKERS")]
    workers: Option<usize>,

    /// File name skipped in the root directory
    #[arg(long)]
    placeholder: Option<String>,

    /// Resolve pids missing from the registry against the live platform
    #[arg(long)]
    resolve_remote: bool,

    /// Comma-separated columns to audit (default: all)
    #[arg(long, value_delimiter = ',')]
    fields: Option<Vec<String>>,

    /// Log level or filter directive (overrides RUST_LOG)
    #[arg(long)]
    log_level: Option<String>,
}

impl AuditArgs {
    fn to_layer(&self) -> TomlConfig {
        TomlConfig {
            root_dir: self.root_dir.clone(),
            base_url: self.base_url.clone(),
            format: self.format.clone(),
            registry_path: self.registry.clone(),
            report_path: self.output.clone(),
            workers: self.workers,
            placeholder: self.placeholder.clone(),
            resolve_remote: self.resolve_remote.then_some(true),
            fields: self.fields.clone(),
            ..Default::default()
        }
    }
}

#[derive(Args, Debug)]
struct SurveyArgs {
    /// Directory of MODS files to survey
    #[arg(short, long, env = "DIR")]
    root_dir: PathBuf,

    /// File name skipped in the root directory
    #[arg(long, default_value = DEFAULT_PLACEHOLDER)]
    placeholder: String,

    /// Log level or filter directive (overrides RUST_LOG)
    #[arg(long)]
    log_level: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Some(Command::Survey(args)) => run_survey(args),
        Some(Command::Audit(args)) => run_audit(args).await,
        None => run_audit(cli.audit).await,
    }
}

async fn run_audit(args: AuditArgs) -> Result<()> {
    let file_layer = load_config_layer(args.config.as_deref())?;
    let config = AuditConfig::resolve(args.to_layer(), file_layer)?;
    init_tracing(args.log_level.as_deref(), &config.log_level)?;

    info!("Starting modsrecon-audit {}", env!("CARGO_PKG_VERSION"));
    info!("Root directory: {}", config.root_dir.display());
    info!("Live platform: {}", config.base_url);

    let registry = IdentifierRegistry::load(&config.registry_path)
        .context("Failed to load identifier registry")?;

    let report = Arc::new(
        ReportWriter::create(&config.report_path, &config.mapping)
            .context("Failed to create report")?,
    );
    let report_path = config.report_path.clone();

    let pipeline = AuditPipeline::from_config(config, registry)?;
    let summary = pipeline.run(report).await.context("Audit failed")?;

    println!(
        "{} objects: {} mismatched, {} matched, {} skipped; report: {}",
        summary.processed,
        summary.mismatched,
        summary.matched,
        summary.skipped(),
        report_path.display()
    );
    Ok(())
}

fn run_survey(args: SurveyArgs) -> Result<()> {
    init_tracing(args.log_level.as_deref(), "info")?;

    let scanner = FileScanner::new(args.placeholder);
    let survey = survey::survey_dir(&args.root_dir, &scanner)
        .with_context(|| format!("Cannot survey {}", args.root_dir.display()))?;

    let stdout = std::io::stdout();
    let mut out = std::io::BufWriter::new(stdout.lock());
    survey.write_tsv(&mut out)?;
    out.flush()?;
    Ok(())
}

/// Install the fmt subscriber
///
/// Priority: `--log-level`, then `RUST_LOG`, then the configured level. A
/// bare level applies to this crate and the common crate only.
fn init_tracing(cli_level: Option<&str>, configured: &str) -> Result<()> {
    let filter = match cli_level {
        Some(level) => EnvFilter::try_new(directive(level))?,
        None => EnvFilter::try_from_default_env()
            .or_else(|_| EnvFilter::try_new(directive(configured)))?,
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
    Ok(())
}

fn directive(level: &str) -> String {
    if level.contains('=') || level.contains(',') {
        level.to_string()
    } else {
        format!("modsrecon_audit={0},modsrecon_common={0}", level)
    }
}
