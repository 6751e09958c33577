//! CLI binary for fileconvert.
//!
//! A thin shim over the library crate: the input argument is the file
//! picker, `--from`/`--to` are the format selectors, and the converted file
//! is downloaded into `--output-dir`.

use anyhow::{Context, Result};
use clap::Parser;
use fileconvert::{
    load_file, ConversionController, ConversionResult, FormatChoice, Observer, ServiceConfig,
    WorkflowObserver,
};
use indicatif::{ProgressBar, ProgressStyle};
use serde::Serialize;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn red(s: &str) -> String {
    format!("\x1b[31m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}
fn cyan(s: &str) -> String {
    format!("\x1b[36m{s}\x1b[0m")
}

// ── CLI observer using indicatif ─────────────────────────────────────────────

/// Terminal observer: a spinner labelled "Converting..." while the service
/// call is outstanding, plus one status line per event.
struct CliObserver {
    spinner: ProgressBar,
}

impl CliObserver {
    fn new() -> Arc<Self> {
        let spinner = ProgressBar::new_spinner();
        let style = ProgressStyle::with_template("{spinner:.cyan} {prefix:.bold}  {msg}  ⏱ {elapsed}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"]);
        spinner.set_style(style);
        spinner.set_prefix("Converting...");
        Arc::new(Self { spinner })
    }
}

impl WorkflowObserver for CliObserver {
    fn on_notice(&self, message: &str) {
        eprintln!("{} {}", cyan("ℹ"), message);
    }

    fn on_conversion_start(&self, file_name: &str, source: FormatChoice, target: FormatChoice) {
        self.spinner
            .set_message(format!("{file_name}  {}", dim(&format!("{source} → {target}"))));
        self.spinner.enable_steady_tick(Duration::from_millis(80));
    }

    fn on_conversion_complete(&self, result: &ConversionResult) {
        self.spinner.finish_and_clear();
        let size = result
            .file_size
            .map(|s| format!("  {}", dim(&format!("{s} bytes"))))
            .unwrap_or_default();
        eprintln!("{} {}{}", green("✔"), bold("Converted"), size);
    }

    fn on_conversion_error(&self, _message: &str) {
        self.spinner.finish_and_clear();
        eprintln!("{} {}", red("✘"), bold("Conversion failed"));
    }

    fn on_download_complete(&self, path: &Path) {
        eprintln!("{} Saved  →  {}", green("✔"), bold(&path.display().to_string()));
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # DWG drawing to PDF (the default formats), saved in the current directory
  fileconvert drawing.dwg

  # Spreadsheet to PDF into ./out
  fileconvert --from xls --to pdf report.xls -o out

  # Convert from URL, print the artifact URL only
  fileconvert --no-download https://example.com/plan.dwg

  # JSON summary
  fileconvert --json drawing.dwg

FORMATS:
  DWG, PDF, PNG, XLS (case-insensitive). Which pairs convert is decided by
  the service; unsupported pairs fail with a generic error.

ENVIRONMENT VARIABLES:
  CONVERT_API_SECRET      ConvertAPI secret (required)
  CONVERT_API_BASE_URL    Override the service endpoint
  RUST_LOG                Override the log filter
"#;

/// Convert files through the ConvertAPI service.
#[derive(Parser, Debug)]
#[command(
    name = "fileconvert",
    version,
    about = "Convert DWG, PDF, PNG and XLS files through the ConvertAPI service",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// Local file path or HTTP/HTTPS URL.
    input: String,

    /// Source format.
    #[arg(long, value_enum, ignore_case = true, default_value = "dwg")]
    from: FormatArg,

    /// Target format.
    #[arg(long, value_enum, ignore_case = true, default_value = "pdf")]
    to: FormatArg,

    /// Directory the converted file is saved into.
    #[arg(short, long = "output-dir", env = "FILECONVERT_OUTPUT_DIR", default_value = ".")]
    output_dir: PathBuf,

    /// Stop after conversion and print the artifact URL instead of downloading.
    #[arg(long)]
    no_download: bool,

    /// ConvertAPI secret.
    #[arg(long, env = "CONVERT_API_SECRET", hide_env_values = true)]
    secret: Option<String>,

    /// Service endpoint.
    #[arg(long, env = "CONVERT_API_BASE_URL")]
    base_url: Option<String>,

    /// Conversion timeout in seconds (default: wait indefinitely).
    #[arg(long, env = "FILECONVERT_API_TIMEOUT")]
    api_timeout: Option<u64>,

    /// HTTP download timeout in seconds, for URL inputs and the artifact.
    #[arg(long, env = "FILECONVERT_DOWNLOAD_TIMEOUT", default_value_t = 120)]
    download_timeout: u64,

    /// Print a JSON summary instead of human-readable output.
    #[arg(long)]
    json: bool,

    /// Disable the spinner.
    #[arg(long)]
    no_progress: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long)]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long)]
    quiet: bool,
}

#[derive(clap::ValueEnum, Clone, Copy, Debug)]
enum FormatArg {
    Dwg,
    Pdf,
    Png,
    Xls,
}

impl From<FormatArg> for FormatChoice {
    fn from(v: FormatArg) -> Self {
        match v {
            FormatArg::Dwg => FormatChoice::Dwg,
            FormatArg::Pdf => FormatChoice::Pdf,
            FormatArg::Png => FormatChoice::Png,
            FormatArg::Xls => FormatChoice::Xls,
        }
    }
}

/// What `--json` prints.
#[derive(Serialize)]
struct Summary<'a> {
    input: &'a str,
    file_name: &'a str,
    source: FormatChoice,
    target: FormatChoice,
    result: &'a ConversionResult,
    saved_to: Option<&'a Path>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // The spinner gives all the feedback that matters; keep library INFO
    // logs out of its way unless asked for.
    let show_progress = !cli.quiet && !cli.no_progress && !cli.json;
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet || show_progress {
        "error"
    } else {
        "info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    // ── Build config and controller ──────────────────────────────────────
    let config = build_config(&cli)?;
    let download_timeout = config.download_timeout_secs;

    let mut controller = ConversionController::from_config(config)
        .context("Failed to create the conversion client")?;
    if show_progress {
        controller = controller.with_observer(CliObserver::new() as Observer);
    }

    // ── Select file and formats ──────────────────────────────────────────
    let file = load_file(&cli.input, download_timeout)
        .await
        .context("Failed to load input")?;
    let file_name = file.name.clone();
    let source = FormatChoice::from(cli.from);
    let target = FormatChoice::from(cli.to);

    controller.select_file(file);
    controller.set_source_format(source);
    controller.set_target_format(target);

    // ── Convert ──────────────────────────────────────────────────────────
    let result = controller
        .request_conversion()
        .await
        .context("Conversion failed")?;

    // ── Download ─────────────────────────────────────────────────────────
    let saved = if cli.no_download {
        None
    } else {
        Some(
            controller
                .download_result(&cli.output_dir)
                .await
                .context("Download failed")?,
        )
    };

    if cli.json {
        let summary = Summary {
            input: &cli.input,
            file_name: &file_name,
            source,
            target,
            result: &result,
            saved_to: saved.as_deref(),
        };
        println!(
            "{}",
            serde_json::to_string_pretty(&summary).context("Failed to serialise summary")?
        );
    } else if saved.is_none() {
        println!("{}", result.url);
    } else if !cli.quiet && !show_progress {
        if let Some(ref path) = saved {
            eprintln!("Converted {} → {}", file_name, path.display());
        }
    }

    Ok(())
}

/// Map CLI args to `ServiceConfig`.
fn build_config(cli: &Cli) -> Result<ServiceConfig> {
    let mut builder = ServiceConfig::builder()
        .secret(cli.secret.clone().unwrap_or_default())
        .download_timeout_secs(cli.download_timeout);

    if let Some(ref url) = cli.base_url {
        builder = builder.base_url(url.clone());
    }
    if let Some(secs) = cli.api_timeout {
        builder = builder.api_timeout_secs(secs);
    }

    builder.build().context("Invalid configuration")
}
