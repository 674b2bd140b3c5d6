//! `sketchgen` CLI - serve the sketch-to-image generator over HTTP.

use std::net::{IpAddr, SocketAddr};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use sketchgen::image::{save_image, sketchify, OutputFormat};
use sketchgen::model::{OnnxGenerator, DEFAULT_MODEL_PATH};
use sketchgen::server::{self, AppState, ServerConfig, DEFAULT_ALLOWED_ORIGINS};
use sketchgen::store::{OutputStore, DEFAULT_OUTPUT_DIR};
use sketchgen::{Config, Pipeline};

/// Turn photographs into pencil sketches and render them with a pretrained generator.
#[derive(Parser, Debug)]
#[command(name = "sketchgen")]
#[command(version, about, long_about = None)]
struct Args {
    /// Enable verbose output.
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Serve `POST /process-image`.
    Serve(ServeArgs),

    /// Convert a single image file into a pencil sketch, without the generator.
    Sketch {
        /// Input image path.
        #[arg(value_name = "INPUT")]
        input: PathBuf,

        /// Output image path; the format follows the extension (jpg, jpeg, png, webp, avif).
        #[arg(value_name = "OUTPUT")]
        output: PathBuf,
    },
}

#[derive(clap::Args, Debug)]
struct ServeArgs {
    /// Address to bind.
    #[arg(long, default_value = "127.0.0.1", value_name = "ADDR")]
    host: IpAddr,

    /// Port to listen on.
    #[arg(short, long, default_value = "5000", value_name = "PORT")]
    port: u16,

    /// Path to the ONNX generator.
    #[arg(short, long, default_value = DEFAULT_MODEL_PATH, value_name = "FILE")]
    model: PathBuf,

    /// Directory generated images are saved to.
    #[arg(short, long, default_value = DEFAULT_OUTPUT_DIR, value_name = "DIR")]
    output_dir: PathBuf,

    /// Square side sketches are resized to before inference.
    #[arg(long, default_value = "512", value_name = "INT")]
    input_size: u32,

    /// Always resize to --input-size, even if the model declares a different input shape.
    #[arg(long)]
    ignore_model_shape: bool,

    /// Browser origin allowed to call the service. Repeat for several origins.
    #[arg(long = "allowed-origin", value_name = "ORIGIN", default_values_t = DEFAULT_ALLOWED_ORIGINS.map(String::from))]
    allowed_origins: Vec<String>,

    /// Maximum upload size in megabytes.
    #[arg(long, default_value = "16", value_name = "MB")]
    max_upload_mb: usize,
}

fn main() -> ExitCode {
    let args = Args::parse();

    // Initialize logging
    let log_level = if args.verbose { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                format!("sketchgen={log_level},tower_http={log_level}").into()
            }),
        )
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();

    let result = match args.command {
        Command::Serve(serve) => run_server(serve),
        Command::Sketch { input, output } => run_sketch(&input, &output),
    };

    if let Err(err) = result {
        tracing::error!("{err:#}");
        return ExitCode::FAILURE;
    }

    ExitCode::SUCCESS
}

fn run_server(args: ServeArgs) -> Result<()> {
    let generator = OnnxGenerator::load(&args.model)
        .with_context(|| format!("Failed to load generator {}", args.model.display()))?;

    let config = Config {
        input_size: args.input_size,
        follow_model_shape: !args.ignore_model_shape,
    };
    let pipeline =
        Pipeline::new(&config, Arc::new(generator)).context("Failed to initialize pipeline")?;

    let store = OutputStore::create(&args.output_dir).with_context(|| {
        format!(
            "Failed to prepare output directory {}",
            args.output_dir.display()
        )
    })?;

    let server_config = ServerConfig {
        allowed_origins: args.allowed_origins,
        max_upload_bytes: args.max_upload_mb.saturating_mul(1024 * 1024),
    };
    let state = Arc::new(AppState { pipeline, store });
    let app = server::router(state, &server_config).context("Failed to build router")?;

    let addr = SocketAddr::new(args.host, args.port);
    let runtime = tokio::runtime::Runtime::new().context("Failed to start async runtime")?;
    runtime
        .block_on(server::serve(addr, app))
        .with_context(|| format!("Server on {addr} failed"))?;

    Ok(())
}

fn run_sketch(input: &Path, output: &Path) -> Result<()> {
    // Validate input file exists
    if !input.exists() {
        anyhow::bail!("Input file does not exist: {}", input.display());
    }

    let format = OutputFormat::from_path(output)
        .with_context(|| format!("Unsupported output extension: {}", output.display()))?;

    let photo = image::open(input)
        .with_context(|| format!("Failed to read image {}", input.display()))?;
    // Lossy encoders are fed RGB; the sketch itself is single-channel.
    let sketch = image::DynamicImage::ImageLuma8(sketchify(&photo.to_rgb8())).to_rgb8();
    let sketch = image::DynamicImage::ImageRgb8(sketch);
    save_image(&sketch, output, format)
        .with_context(|| format!("Failed to write sketch {}", output.display()))?;

    println!(
        "Successfully sketched {} -> {}",
        input.display(),
        output.display()
    );

    Ok(())
}
