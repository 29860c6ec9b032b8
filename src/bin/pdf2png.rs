//! CLI binary for edgequake-pdf2png.
//!
//! A thin shim over the library crate: `serve` (the default) runs the HTTP
//! service, `convert` renders a local PDF without a server.

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use edgequake_pdf2png::{
    convert_file, serve, ApiResponse, ConvertOptions, PdftoppmRasterizer, RotationDirection,
    ServiceConfig,
};
use std::io::{self, Write};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

const AFTER_HELP: &str = r#"EXAMPLES:
  # Start the service on $PORT (default 3000)
  pdf2png

  # Rotate landscape pages upright, listen on 8080
  pdf2png serve --port 8080 --auto-rotate

  # Upload a PDF
  curl -F "pdf=@doc.pdf;type=application/pdf" http://localhost:3000/convert-pdf

  # Per-request override of auto-rotation
  curl -F "pdf=@doc.pdf;type=application/pdf" -F autoRotate=true http://localhost:3000/convert-pdf

  # Convert locally, write the PNG
  pdf2png convert doc.pdf -o page1.png

  # Convert locally, print the JSON envelope the service would return
  pdf2png convert doc.pdf --json

ENVIRONMENT VARIABLES:
  PORT                    Listen port
  HOST                    Listen address
  PDF2PNG_PDFTOPPM        Path to the pdftoppm binary
  PDF2PNG_AUTO_ROTATE     Rotate landscape pages by default
  RUST_LOG                Log filter (e.g. info, edgequake_pdf2png=debug)

SETUP:
  pdftoppm ships with poppler:  apt install poppler-utils  |  brew install poppler
"#;

/// Render the first page of a PDF to a base64 PNG.
#[derive(Parser, Debug)]
#[command(
    name = "pdf2png",
    version,
    about = "Render the first page of a PDF to a base64 PNG over HTTP",
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP,
    args_conflicts_with_subcommands = true
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,

    /// `serve` flags, used when no subcommand is given.
    #[command(flatten)]
    serve: ServeArgs,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the HTTP service (default).
    Serve(ServeArgs),
    /// Convert a local PDF without starting a server.
    Convert(ConvertArgs),
}

#[derive(Args, Debug)]
struct ServeArgs {
    /// Address to bind.
    #[arg(long, env = "HOST", default_value = "0.0.0.0")]
    host: String,

    /// Port to listen on.
    #[arg(short, long, env = "PORT", default_value_t = 3000)]
    port: u16,

    /// Maximum upload size in MiB.
    #[arg(long, env = "PDF2PNG_MAX_UPLOAD_MB", default_value_t = 50)]
    max_upload_mb: usize,

    #[command(flatten)]
    render: RenderArgs,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "PDF2PNG_VERBOSE")]
    verbose: bool,
}

#[derive(Args, Debug)]
struct ConvertArgs {
    /// Local PDF file.
    input: PathBuf,

    /// Write the PNG to this file instead of printing the data URI.
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Print the JSON envelope the HTTP service would return.
    #[arg(long)]
    json: bool,

    #[command(flatten)]
    render: RenderArgs,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "PDF2PNG_VERBOSE")]
    verbose: bool,
}

/// Options shared by `serve` and `convert`.
#[derive(Args, Debug)]
struct RenderArgs {
    /// Path to the pdftoppm binary.
    #[arg(long, env = "PDF2PNG_PDFTOPPM", default_value = "pdftoppm")]
    pdftoppm: PathBuf,

    /// Rendering DPI (36–600).
    #[arg(long, env = "PDF2PNG_DPI", default_value_t = 150)]
    dpi: u32,

    /// Rotate landscape pages to portrait.
    #[arg(long, env = "PDF2PNG_AUTO_ROTATE")]
    auto_rotate: bool,

    /// Rotation direction used by --auto-rotate.
    #[arg(long, env = "PDF2PNG_ROTATION", value_enum, default_value = "cw")]
    rotation: RotationArg,

    /// Kill pdftoppm after this many seconds.
    #[arg(long, env = "PDF2PNG_TIMEOUT_SECS", default_value_t = 30)]
    timeout_secs: u64,

    /// Directory for per-request scratch files (default: OS temp dir).
    #[arg(long, env = "PDF2PNG_TEMP_DIR")]
    temp_dir: Option<PathBuf>,
}

#[derive(clap::ValueEnum, Clone, Copy, Debug)]
enum RotationArg {
    Cw,
    Ccw,
}

impl From<RotationArg> for RotationDirection {
    fn from(v: RotationArg) -> Self {
        match v {
            RotationArg::Cw => RotationDirection::Clockwise,
            RotationArg::Ccw => RotationDirection::CounterClockwise,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let command = cli.command.unwrap_or(Command::Serve(cli.serve));

    let verbose = match &command {
        Command::Serve(args) => args.verbose,
        Command::Convert(args) => args.verbose,
    };

    // ── Logging setup ────────────────────────────────────────────────────
    let filter = if verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    match command {
        Command::Serve(args) => run_serve(args).await,
        Command::Convert(args) => run_convert(args).await,
    }
}

async fn run_serve(args: ServeArgs) -> Result<()> {
    let config = serve_config(args)?;
    tracing::debug!("{:?}", config);

    serve(config, shutdown_signal())
        .await
        .context("Server failed")?;

    tracing::info!("Shut down cleanly");
    Ok(())
}

async fn run_convert(args: ConvertArgs) -> Result<()> {
    let config = build_config(&args.render)
        .build()
        .context("Invalid configuration")?;
    let rasterizer = PdftoppmRasterizer::from_config(&config);

    let output = convert_file(
        &args.input,
        &ConvertOptions::from(&config),
        &rasterizer,
        config.temp_root.as_deref(),
    )
    .await
    .with_context(|| format!("Conversion of {} failed", args.input.display()))?;

    if let Some(ref path) = args.output {
        tokio::fs::write(path, &output.png)
            .await
            .with_context(|| format!("Failed to write {}", path.display()))?;
        eprintln!(
            "Wrote {} ({} bytes{}) in {}ms",
            path.display(),
            output.png.len(),
            if output.rotated { ", rotated" } else { "" },
            output.duration_ms
        );
        return Ok(());
    }

    let stdout = io::stdout();
    let mut handle = stdout.lock();
    if args.json {
        let envelope = ApiResponse::ok("Conversion succeeded", output.image);
        let json = serde_json::to_string_pretty(&envelope).context("Failed to serialise output")?;
        writeln!(handle, "{json}").context("Failed to write to stdout")?;
    } else {
        writeln!(handle, "{}", output.image.base64).context("Failed to write to stdout")?;
    }

    Ok(())
}

fn serve_config(args: ServeArgs) -> Result<ServiceConfig> {
    build_config(&args.render)
        .host(args.host)
        .port(args.port)
        .max_upload_bytes(args.max_upload_mb.saturating_mul(1024 * 1024))
        .build()
        .context("Invalid configuration")
}

/// Map the shared render flags onto a config builder.
fn build_config(args: &RenderArgs) -> edgequake_pdf2png::ServiceConfigBuilder {
    let mut builder = ServiceConfig::builder()
        .pdftoppm_path(args.pdftoppm.clone())
        .dpi(args.dpi)
        .auto_rotate(args.auto_rotate)
        .rotation(args.rotation.into())
        .rasterize_timeout_secs(args.timeout_secs);

    if let Some(ref dir) = args.temp_dir {
        builder = builder.temp_root(dir.clone());
    }
    builder
}

/// Resolve on Ctrl+C or SIGTERM.
async fn shutdown_signal() {
    use tokio::signal;

    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C, shutting down gracefully...");
        },
        _ = terminate => {
            tracing::info!("Received SIGTERM, shutting down gracefully...");
        },
    }
}
