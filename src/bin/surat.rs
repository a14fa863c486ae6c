//! CLI binary for surat-pengajuan.
//!
//! A thin shim over the library crate that maps CLI flags to
//! `PipelineConfig` and either serves the web form or processes one PDF.

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use std::io;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use surat_pengajuan::present::format_fields;
use surat_pengajuan::{
    extract_text, serve, Decoding, LetterKind, LibreOfficeConverter, LlmGenerator, Pipeline,
    PipelineConfig, PipelineProgress, Stage,
};
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

// ── CLI progress callback using indicatif ────────────────────────────────────

/// Spinner showing the current stage, with one log line per finished stage.
struct CliProgress {
    bar: ProgressBar,
}

impl CliProgress {
    fn new() -> Arc<Self> {
        let bar = ProgressBar::new_spinner();
        let style = ProgressStyle::with_template("{spinner:.cyan} {msg}  {elapsed:.dim}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"]);
        bar.set_style(style);
        bar.enable_steady_tick(Duration::from_millis(80));
        Arc::new(Self { bar })
    }

    fn finish(&self) {
        self.bar.finish_and_clear();
    }
}

impl PipelineProgress for CliProgress {
    fn on_stage_start(&self, stage: Stage) {
        self.bar.set_message(format!("{stage}…"));
    }

    fn on_stage_complete(&self, stage: Stage) {
        self.bar.println(format!("  {} {}", green("✓"), stage));
    }

    fn on_stage_error(&self, stage: Stage, error: &str) {
        let first_line = error.lines().next().unwrap_or(error);
        self.bar
            .println(format!("  {} {}  {}", red("✗"), stage, red(first_line)));
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Serve the upload form on http://127.0.0.1:8501
  surat serve

  # Generate an exemption letter from a request PDF
  surat process permohonan.pdf --kind dispen

  # Same, deterministic decoding, JSON result
  surat process permohonan.pdf --kind dispen --greedy --json

  # Show the text pdfium extracts (no API key needed)
  surat text permohonan.pdf

OUTPUT LAYOUT (under --output-dir):
  STD/, Dispen/                  saved uploads, timestamped
  surat_tugas/surat_tugas_<nama>.docx|.pdf
  surat_dispen/surat_dispensasi_<nama>.docx|.pdf

ENVIRONMENT VARIABLES:
  OPENAI_API_KEY          OpenAI API key
  ANTHROPIC_API_KEY       Anthropic API key
  EDGEQUAKE_LLM_PROVIDER  Override provider (openai, anthropic, gemini, ollama)
  EDGEQUAKE_MODEL         Override model ID
  PDFIUM_LIB_PATH         Directory containing libpdfium
  SURAT_SOFFICE           LibreOffice executable (default: soffice)
"#;

/// Generate student-affairs letters from uploaded request PDFs.
#[derive(Parser, Debug)]
#[command(
    name = "surat",
    version,
    about = "Generate student-affairs letters (DOCX + PDF) from request PDFs",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    #[command(flatten)]
    common: CommonArgs,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Serve the upload form.
    Serve {
        /// Address to bind.
        #[arg(long, env = "SURAT_BIND", default_value = "127.0.0.1")]
        bind: String,

        /// Port to listen on.
        #[arg(long, env = "SURAT_PORT", default_value_t = 8501)]
        port: u16,
    },

    /// Generate the letter for one request PDF.
    Process {
        /// Request PDF.
        input: PathBuf,

        /// Letter kind: std, dispen, or the full label.
        #[arg(short, long, value_parser = parse_kind)]
        kind: LetterKind,

        /// Print the submission as JSON.
        #[arg(long, env = "SURAT_JSON")]
        json: bool,
    },

    /// Print the text extracted from a PDF.
    Text {
        /// PDF to read.
        input: PathBuf,
    },
}

#[derive(Args, Debug)]
struct CommonArgs {
    /// Root folder for uploads and generated letters.
    #[arg(long, global = true, env = "SURAT_OUTPUT_DIR", default_value = ".")]
    output_dir: PathBuf,

    /// LLM model ID (e.g. gpt-4.1-nano).
    #[arg(long, global = true, env = "EDGEQUAKE_MODEL")]
    model: Option<String>,

    /// LLM provider: openai, anthropic, gemini, ollama, azure.
    #[arg(long, global = true, env = "EDGEQUAKE_PROVIDER")]
    provider: Option<String>,

    /// Deterministic decoding (temperature 0). Overrides --temperature/--top-p.
    #[arg(long, global = true, env = "SURAT_GREEDY")]
    greedy: bool,

    /// Sampling temperature (0.0–2.0).
    #[arg(long, global = true, env = "SURAT_TEMPERATURE", default_value_t = 0.7)]
    temperature: f32,

    /// Nucleus sampling mass (0.0–1.0].
    #[arg(long, global = true, env = "SURAT_TOP_P", default_value_t = 0.9)]
    top_p: f32,

    /// Document text budget in approximate tokens (words).
    #[arg(long, global = true, env = "SURAT_MAX_INPUT_TOKENS", default_value_t = 825)]
    max_input_tokens: usize,

    /// Max tokens the model may generate.
    #[arg(long, global = true, env = "SURAT_MAX_NEW_TOKENS", default_value_t = 200)]
    max_new_tokens: usize,

    /// LibreOffice executable used for DOCX → PDF.
    #[arg(long, global = true, env = "SURAT_SOFFICE", default_value = "soffice")]
    soffice: String,

    /// Directory containing the pdfium shared library.
    #[arg(long, global = true, env = "PDFIUM_LIB_PATH")]
    pdfium_dir: Option<PathBuf>,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, global = true, env = "SURAT_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, global = true, env = "SURAT_QUIET")]
    quiet: bool,
}

fn parse_kind(s: &str) -> Result<LetterKind, String> {
    s.parse().map_err(|e: surat_pengajuan::SuratError| e.to_string())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let common = &cli.common;

    // ── Logging setup ────────────────────────────────────────────────────
    // The spinner gives all the feedback that matters during `process`, so
    // library INFO logs are only shown for `serve` or with --verbose.
    let show_progress =
        matches!(cli.command, Command::Process { json: false, .. }) && !common.quiet;
    let filter = if common.verbose {
        "debug"
    } else if common.quiet || show_progress {
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

    let config = build_config(common)?;

    match cli.command {
        Command::Serve { ref bind, port } => run_serve(config, bind, port).await,
        Command::Process {
            ref input,
            kind,
            json,
        } => run_process(config, input, kind, json, show_progress, common.quiet).await,
        Command::Text { ref input } => {
            let text = extract_text(input, config.pdfium_lib_path.as_deref())
                .await
                .with_context(|| format!("Failed to read {}", input.display()))?;
            println!("{text}");
            Ok(())
        }
    }
}

async fn run_serve(config: PipelineConfig, bind: &str, port: u16) -> Result<()> {
    let addr: SocketAddr = format!("{bind}:{port}")
        .parse()
        .with_context(|| format!("Invalid bind address '{bind}:{port}'"))?;

    let generator = LlmGenerator::from_config(&config).context("Failed to set up the LLM")?;
    let converter = LibreOfficeConverter::new(config.soffice_bin.clone());
    if let Err(e) = converter.ensure_available().await {
        tracing::warn!(
            "{e}; letters will fail at PDF conversion until '{}' is installed",
            converter.program()
        );
    }

    let pipeline = Arc::new(Pipeline::new(config, generator, converter));
    serve(pipeline, addr).await.context("Server failed")
}

async fn run_process(
    config: PipelineConfig,
    input: &std::path::Path,
    kind: LetterKind,
    json: bool,
    show_progress: bool,
    quiet: bool,
) -> Result<()> {
    let generator = LlmGenerator::from_config(&config).context("Failed to set up the LLM")?;
    let converter = LibreOfficeConverter::new(config.soffice_bin.clone());
    let mut pipeline = Pipeline::new(config, generator, converter);

    let progress = show_progress.then(CliProgress::new);
    if let Some(ref p) = progress {
        pipeline = pipeline.with_progress(p.clone());
    }

    let result = pipeline.process_path(kind, input).await;
    if let Some(ref p) = progress {
        p.finish();
    }
    let submission = result.context("Processing failed")?;

    if json {
        let out = serde_json::to_string_pretty(&submission).context("Failed to serialise output")?;
        println!("{out}");
        return Ok(());
    }

    print!("{}", format_fields(&submission.fields));
    if !quiet {
        if submission.fields.is_empty() {
            eprintln!("{}", dim("(no fields extracted; letter has blank values)"));
        }
        eprintln!(
            "{} {}\n   {}",
            green("✔"),
            bold(&submission.document.pdf_path.display().to_string()),
            dim(&submission.document.docx_path.display().to_string()),
        );
    }
    Ok(())
}

/// Map CLI args to `PipelineConfig`.
fn build_config(args: &CommonArgs) -> Result<PipelineConfig> {
    let decoding = if args.greedy {
        Decoding::Greedy
    } else {
        Decoding::Sampled {
            temperature: args.temperature,
            top_p: args.top_p,
        }
    };

    let mut builder = PipelineConfig::builder()
        .output_root(&args.output_dir)
        .decoding(decoding)
        .max_input_tokens(args.max_input_tokens)
        .max_new_tokens(args.max_new_tokens)
        .soffice_bin(&args.soffice);

    if let Some(ref model) = args.model {
        builder = builder.model(model);
    }
    if let Some(ref provider) = args.provider {
        builder = builder.provider_name(provider);
    }
    if let Some(ref dir) = args.pdfium_dir {
        builder = builder.pdfium_lib_path(dir);
    }

    builder.build().context("Invalid configuration")
}
