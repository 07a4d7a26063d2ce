//! CLI binary for heic-convert.
//!
//! A thin shim over the library crate: maps CLI flags to
//! `ControllerConfig`, drives one file through the workflow and prints where
//! the result was saved.

use anyhow::{Context, Result};
use clap::Parser;
use heic_convert::{
    run_workflow, CandidateFile, Controller, ControllerConfig, ConvertError, DirectorySaver,
    ExternalDecoderCodec, Language, NoticeKind, Phase, RenderState, TargetFormat,
    WorkflowObserver,
};
use indicatif::{ProgressBar, ProgressStyle};
use std::io;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;
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

// ── Terminal observer using indicatif ────────────────────────────────────────

/// Shows a spinner while the decoder runs and mirrors notices to stderr.
struct SpinnerObserver {
    bar: ProgressBar,
}

impl SpinnerObserver {
    fn new() -> Arc<Self> {
        let bar = ProgressBar::new_spinner();
        let style = ProgressStyle::with_template("{spinner:.cyan} {prefix:.bold}  {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"]);
        bar.set_style(style);
        bar.set_prefix("Preparing");
        Arc::new(Self { bar })
    }
}

impl WorkflowObserver for SpinnerObserver {
    fn on_render(&self, state: &RenderState) {
        let Some(notice) = &state.notice else {
            return;
        };
        // Error notices are reported once, by main, when the workflow stops.
        let line = match notice.kind {
            NoticeKind::Info => dim(&notice.text),
            NoticeKind::Success => green(&notice.text),
            NoticeKind::Error => return,
        };
        self.bar.println(line);
    }

    fn on_conversion_start(&self, file_name: &str, format: TargetFormat) {
        self.bar.set_prefix("Converting");
        self.bar.set_message(format!("{file_name} → {}", format.label()));
        self.bar.enable_steady_tick(Duration::from_millis(80));
    }

    fn on_conversion_complete(&self, format: TargetFormat, size_bytes: usize, duration_ms: u64) {
        self.bar.finish_and_clear();
        eprintln!(
            "{} {} {}",
            green("✔"),
            bold(&format!("{} ({} bytes)", format.label(), size_bytes)),
            dim(&format!("{:.1}s", duration_ms as f64 / 1000.0)),
        );
    }

    fn on_conversion_error(&self, _detail: String) {
        // The diagnostic is already logged by the controller; the user only
        // sees the generic notice.
        self.bar.finish_and_clear();
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Convert to PNG next to the current directory
  heic2img IMG_0001.HEIC

  # JPEG at 80 % quality into ./out
  heic2img -f jpeg --quality 0.8 -o out IMG_0001.HEIC

  # English notices, final state as JSON
  heic2img --lang en --json photo.heic

OUTPUT NAMING:
  photo.heic  →  photo_convertido.png  /  photo_convertido.jpeg

ENVIRONMENT VARIABLES:
  HEIC2IMG_FORMAT       Default output format (png, jpeg)
  HEIC2IMG_OUTPUT       Output directory
  HEIC2IMG_DECODER      Decoder program (default: heif-dec)
  RUST_LOG              Override log filter

SETUP:
  The bundled codec runs libheif's `heif-dec`. Install it with your package
  manager (e.g. `apt install libheif-examples`, `brew install libheif`).
"#;

/// Convert HEIC photos to PNG or JPEG.
#[derive(Parser, Debug)]
#[command(
    name = "heic2img",
    version,
    about = "Convert HEIC photos to PNG or JPEG",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// Path to a .heic file.
    input: PathBuf,

    /// Output format: png or jpeg.
    #[arg(short, long, env = "HEIC2IMG_FORMAT", default_value = "png")]
    format: TargetFormat,

    /// Directory the converted image is saved into.
    #[arg(short, long, env = "HEIC2IMG_OUTPUT", default_value = ".")]
    output: PathBuf,

    /// Quality for lossy output (0.0–1.0).
    #[arg(long, env = "HEIC2IMG_QUALITY", default_value_t = heic_convert::config::DEFAULT_QUALITY)]
    quality: f32,

    /// Program used to decode HEIC.
    #[arg(long, env = "HEIC2IMG_DECODER", default_value = heic_convert::config::DEFAULT_DECODER_PROGRAM)]
    decoder: String,

    /// Decoder timeout in seconds.
    #[arg(long, env = "HEIC2IMG_DECODER_TIMEOUT", default_value_t = 120)]
    decoder_timeout: u64,

    /// Language of notices: es or en.
    #[arg(long, env = "HEIC2IMG_LANG", default_value = "es")]
    lang: Language,

    /// Print the final workflow state as JSON instead of the saved path.
    #[arg(long, env = "HEIC2IMG_JSON")]
    json: bool,

    /// Disable the spinner.
    #[arg(long, env = "HEIC2IMG_NO_PROGRESS")]
    no_progress: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "HEIC2IMG_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, env = "HEIC2IMG_QUIET")]
    quiet: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // The spinner provides the feedback that matters; keep library INFO logs
    // out of its way unless asked for.
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

    // ── Build controller ─────────────────────────────────────────────────
    let config = build_config(&cli)?;
    let codec = Arc::new(ExternalDecoderCodec::from_config(&config));
    let saver = Arc::new(DirectorySaver::new(&cli.output));
    let mut controller = Controller::new(config, codec, saver);
    if show_progress {
        controller.add_observer(SpinnerObserver::new());
    }

    let candidate = CandidateFile::from_path(&cli.input)
        .await
        .with_context(|| format!("Failed to read {}", cli.input.display()))?;

    // ── Run workflow ─────────────────────────────────────────────────────
    let result = run_workflow(&mut controller, candidate, cli.format).await;
    let state = controller.render();

    if cli.json {
        println!(
            "{}",
            serde_json::to_string_pretty(&state).context("Failed to serialise state")?
        );
    }

    let delivery = match result {
        Ok(d) => d,
        Err(e) if e.is_workflow_error() => {
            debug!("Workflow stopped: {e}");
            anyhow::bail!("{} {}", red("✘"), failure_message(&state, &e));
        }
        Err(e) => return Err(e).context("Conversion failed"),
    };

    if !cli.json {
        println!("{}", delivery.location);
    }
    if !cli.quiet && !cli.json && state.phase == Phase::Converted {
        eprintln!(
            "   {}  →  {}",
            dim(&format!("{} bytes", delivery.size_bytes)),
            bold(&delivery.file_name),
        );
    }

    Ok(())
}

/// What the user is told when a workflow operation fails: the controller's
/// notice, never the codec diagnostic carried by the error.
fn failure_message(state: &RenderState, err: &ConvertError) -> String {
    match &state.notice {
        Some(notice) if notice.kind == NoticeKind::Error => notice.text.clone(),
        _ => err.to_string(),
    }
}

/// Map CLI args to `ControllerConfig`.
fn build_config(cli: &Cli) -> Result<ControllerConfig> {
    ControllerConfig::builder()
        .quality(cli.quality)
        .default_format(cli.format)
        .language(cli.lang)
        .decoder_program(cli.decoder.clone())
        .decoder_timeout_secs(cli.decoder_timeout)
        .build()
        .context("Invalid configuration")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_defaults() {
        let cli = Cli::try_parse_from(["heic2img", "a.heic"]).unwrap();
        assert_eq!(cli.format, TargetFormat::Png);
        assert_eq!(cli.lang, Language::Spanish);
        assert_eq!(cli.output, PathBuf::from("."));
        let config = build_config(&cli).unwrap();
        assert_eq!(config.decoder_program, "heif-dec");
    }

    #[test]
    fn parses_jpg_alias_and_language() {
        let cli =
            Cli::try_parse_from(["heic2img", "-f", "jpg", "--lang", "en", "a.heic"]).unwrap();
        assert_eq!(cli.format, TargetFormat::Jpeg);
        assert_eq!(cli.lang, Language::English);
    }

    #[tokio::test]
    async fn failure_message_hides_codec_detail() {
        let config = ControllerConfig::default();
        let mut controller = Controller::new(
            config.clone(),
            Arc::new(ExternalDecoderCodec::from_config(&config)),
            Arc::new(DirectorySaver::new(std::env::temp_dir())),
        );
        let renamed_jpeg = CandidateFile::new("fake.heic", b"\xFF\xD8\xFF\xE0\x00\x10JFIF".to_vec());

        let err = run_workflow(&mut controller, renamed_jpeg, TargetFormat::Png)
            .await
            .unwrap_err();
        assert!(err.is_workflow_error());
        assert!(err.to_string().contains("first bytes"), "got: {err}");

        let msg = failure_message(&controller.render(), &err);
        assert_eq!(
            msg,
            "Error al convertir la imagen. Asegúrate de que el archivo sea un HEIC válido."
        );
        assert!(!msg.contains("first bytes"));
    }

    #[test]
    fn rejects_unknown_format() {
        assert!(Cli::try_parse_from(["heic2img", "-f", "gif", "a.heic"]).is_err());
    }
}
