use anyhow::Context;
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use colorlens::summary::{self, render_swatches};
use colorlens::{processor, ColorLens, LensConfig};

#[derive(Parser)]
#[command(name = "colorlens")]
#[command(about = "Hue remapping and dominant color summaries for color-vision-deficient viewers")]
struct Cli {
    /// JSON config file (defaults are used for anything it leaves out)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// History database file (overrides the config file)
    #[arg(long, global = true)]
    database: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Write the color-assist version of an image
    Colorize {
        /// Input image
        input: PathBuf,

        /// Output PNG path (default: <input>_colorized.png)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Print the dominant colors of an image as JSON
    Palette {
        /// Input image
        input: PathBuf,

        /// Number of colors
        #[arg(short, long)]
        k: Option<usize>,

        /// Clustering seed
        #[arg(long)]
        seed: Option<u64>,

        /// Also write a strip of color chips to this PNG
        #[arg(long)]
        swatches: Option<PathBuf>,

        /// Chip edge length in pixels
        #[arg(long, default_value_t = 64)]
        chip_size: u32,
    },
    /// Colorize and summarize an image, store the result and record it in history
    Process {
        /// Input image
        input: PathBuf,
    },
    /// Print recorded history as JSON, newest first
    History,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "colorlens=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().without_time().with_writer(std::io::stderr))
        .init();

    let mut config = match &cli.config {
        Some(path) => LensConfig::load(path)
            .with_context(|| format!("Failed to load config {}", path.display()))?,
        None => LensConfig::default(),
    };
    if let Some(database) = cli.database {
        config.database = Some(database);
    }

    match cli.command {
        Commands::Colorize { input, output } => run_colorize_command(&config, &input, output),
        Commands::Palette {
            input,
            k,
            seed,
            swatches,
            chip_size,
        } => run_palette_command(config, &input, k, seed, swatches, chip_size),
        Commands::Process { input } => run_process_command(config, &input).await,
        Commands::History => run_history_command(config).await,
    }
}

fn default_output(input: &Path) -> PathBuf {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "image".to_string());
    input.with_file_name(format!("{}_colorized.png", stem))
}

fn run_colorize_command(config: &LensConfig, input: &Path, output: Option<PathBuf>) -> anyhow::Result<()> {
    let img = processor::load_image(input)
        .with_context(|| format!("Failed to load {}", input.display()))?;
    let png = processor::colorize_to_png(&img, &config.transform, config.min_encoded_bytes)?;

    let output = output.unwrap_or_else(|| default_output(input));
    std::fs::write(&output, &png)
        .with_context(|| format!("Failed to write {}", output.display()))?;

    tracing::info!(output = %output.display(), bytes = png.len(), "wrote colorized image");
    println!("{}", output.display());
    Ok(())
}

fn run_palette_command(
    mut config: LensConfig,
    input: &Path,
    k: Option<usize>,
    seed: Option<u64>,
    swatches: Option<PathBuf>,
    chip_size: u32,
) -> anyhow::Result<()> {
    if let Some(k) = k {
        config.summary.k = k;
    }
    if let Some(seed) = seed {
        config.summary.clustering.seed = seed;
    }
    config.validate()?;

    let img = processor::load_image(input)
        .with_context(|| format!("Failed to load {}", input.display()))?;
    let summary = summary::summarize(&img, &config.summary)?;

    if summary.degenerate {
        tracing::warn!(
            found = summary.colors.len(),
            requested = config.summary.k,
            "image has fewer distinct colors than requested"
        );
    }

    if let Some(path) = swatches {
        render_swatches(&summary.colors, chip_size)?
            .save(&path)
            .with_context(|| format!("Failed to write {}", path.display()))?;
    }

    println!("{}", serde_json::to_string_pretty(&summary.colors)?);
    Ok(())
}

async fn run_process_command(config: LensConfig, input: &Path) -> anyhow::Result<()> {
    if config.database.is_none() {
        tracing::warn!("no --database given, history will not outlive this run");
    }

    let bytes = tokio::fs::read(input)
        .await
        .with_context(|| format!("Failed to read {}", input.display()))?;
    let filename = input
        .file_name()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "upload".to_string());

    let lens = ColorLens::new(config)?;
    tracing::debug!(storage = %lens.config().storage_dir.display(), "opened result store");
    let entry = lens.process_upload(filename, bytes).await?;

    tracing::info!(result = %lens.result_path(&entry).display(), "stored result");
    println!("{}", serde_json::to_string_pretty(&entry)?);
    Ok(())
}

async fn run_history_command(config: LensConfig) -> anyhow::Result<()> {
    if config.database.is_none() {
        anyhow::bail!("history needs a database; pass --database or set it in the config file");
    }

    let lens = ColorLens::new(config)?;
    let entries = lens.history().await?;
    println!("{}", serde_json::to_string_pretty(&entries)?);
    Ok(())
}
