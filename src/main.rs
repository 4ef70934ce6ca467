// Command-line front end: validates image files and prints one verdict per file.
//
// Exit status is 0 when every file is accepted, 1 when any file is rejected and 2
// on usage or I/O errors.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use serde::Serialize;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use leaf_gate::core_modules::utils::image_helper::image_helper::save_mask;
use leaf_gate::{
    Analysis, GateConfig, Inspection, LeafGate, Locale, ValidationPool, ValidationVerdict,
};

const EXIT_ALL_ACCEPTED: u8 = 0;
const EXIT_ANY_REJECTED: u8 = 1;
const EXIT_ERROR: u8 = 2;

#[derive(Clone, Copy, Debug, ValueEnum)]
enum LocaleArg {
    /// English reasons
    En,
    /// Indonesian reasons
    Id,
}

impl From<LocaleArg> for Locale {
    fn from(value: LocaleArg) -> Self {
        match value {
            LocaleArg::En => Locale::English,
            LocaleArg::Id => Locale::Indonesian,
        }
    }
}

#[derive(Parser)]
#[command(
    author,
    version,
    about = "Check whether images plausibly show a single plant leaf",
    long_about = None
)]
struct Cli {
    /// JSON file with gate configuration
    #[arg(long)]
    config: Option<PathBuf>,
    /// Language of rejection reasons (overrides the config file)
    #[arg(long, value_enum)]
    locale: Option<LocaleArg>,
    /// Print one JSON object per file instead of text
    #[arg(long)]
    json: bool,
    /// Number of validation workers (0 = one per CPU)
    #[arg(long, default_value_t = 0)]
    workers: usize,
    /// Per-image deadline in milliseconds
    #[arg(long)]
    timeout_ms: Option<u64>,
    /// Write each analysed image's green mask as a PNG into this directory
    #[arg(long)]
    mask_dir: Option<PathBuf>,
    /// Log pipeline diagnostics to stderr
    #[arg(long, short)]
    verbose: bool,
    /// Image files to validate
    #[arg(required = true)]
    files: Vec<PathBuf>,
}

/// One `--json` output line.
#[derive(Serialize)]
struct FileReport<'a> {
    file: &'a Path,
    #[serde(flatten)]
    verdict: &'a ValidationVerdict,
    #[serde(skip_serializing_if = "Option::is_none")]
    analysis: Option<&'a Analysis>,
}

fn init_tracing(verbose: bool) {
    let default_filter = if verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter)),
        )
        .init();
}

fn load_config(cli: &Cli) -> Result<GateConfig> {
    let mut config = match &cli.config {
        Some(path) => GateConfig::from_json_file(path)
            .with_context(|| format!("failed to load config from {}", path.display()))?,
        None => GateConfig::default(),
    };
    if let Some(locale) = cli.locale {
        config = config.with_locale(locale.into());
    }
    Ok(config)
}

fn render_line(path: &Path, inspection: &Inspection, json: bool) -> Result<String> {
    if json {
        let report = FileReport {
            file: path,
            verdict: &inspection.verdict,
            analysis: inspection.analysis.as_ref(),
        };
        return Ok(serde_json::to_string(&report)?);
    }

    let verdict = &inspection.verdict;
    Ok(if verdict.valid {
        format!("{}: ACCEPT", path.display())
    } else {
        format!(
            "{}: REJECT ({})",
            path.display(),
            verdict.reason.as_deref().unwrap_or_default()
        )
    })
}

fn exit_status(inspections: &[Inspection]) -> u8 {
    if inspections.iter().all(|inspection| inspection.verdict.valid) {
        EXIT_ALL_ACCEPTED
    } else {
        EXIT_ANY_REJECTED
    }
}

fn dump_masks(files: &[PathBuf], inspections: &[Inspection], mask_dir: &Path) -> Result<()> {
    std::fs::create_dir_all(mask_dir)
        .with_context(|| format!("failed to create {}", mask_dir.display()))?;

    for (path, inspection) in files.iter().zip(inspections) {
        let Some(analysis) = &inspection.analysis else {
            debug!(file = %path.display(), "no analysis, skipping mask");
            continue;
        };
        let Some(mask) = &analysis.green_mask else {
            debug!(file = %path.display(), "rejected before feature extraction, skipping mask");
            continue;
        };

        let stem = path
            .file_stem()
            .map_or_else(|| "image".into(), |stem| stem.to_string_lossy());
        let mask_path = mask_dir.join(format!("{stem}_mask.png"));
        save_mask(&mask_path, analysis.width, analysis.height, mask)
            .with_context(|| format!("failed to write {}", mask_path.display()))?;
        info!(mask = %mask_path.display(), "wrote green mask");
    }
    Ok(())
}

/// Validates every file, writes one line per file to `out` and returns the exit status.
async fn run(cli: &Cli, out: &mut impl Write) -> Result<u8> {
    let gate = LeafGate::new(load_config(cli)?);
    debug!(config = ?gate.config(), "leaf gate configured");

    let images = cli
        .files
        .iter()
        .map(|path| {
            std::fs::read(path).with_context(|| format!("failed to read {}", path.display()))
        })
        .collect::<Result<Vec<_>>>()?;

    let pool = ValidationPool::new(gate, cli.workers);
    let deadline = cli.timeout_ms.map(Duration::from_millis);
    let inspections = pool.inspect_all(images, deadline).await;
    pool.shutdown().await;

    for (path, inspection) in cli.files.iter().zip(&inspections) {
        writeln!(out, "{}", render_line(path, inspection, cli.json)?)?;
    }

    if let Some(mask_dir) = &cli.mask_dir {
        dump_masks(&cli.files, &inspections, mask_dir)?;
    }

    let accepted = inspections.iter().filter(|inspection| inspection.verdict.valid).count();
    let faults = inspections
        .iter()
        .filter(|inspection| inspection.verdict.code.is_some_and(|code| code.is_fault()))
        .count();
    info!(
        files = inspections.len(),
        accepted,
        rejected = inspections.len() - accepted - faults,
        faults,
        "validation finished"
    );

    Ok(exit_status(&inspections))
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match run(&cli, &mut std::io::stdout().lock()).await {
        Ok(status) => ExitCode::from(status),
        Err(error) => {
            eprintln!("error: {error:#}");
            ExitCode::from(EXIT_ERROR)
        }
    }
}
