//! VisionCraft CLI: command-line client for the VisionCraft image service.
//!
//! Set VISIONCRAFT_BASE_URL (default http://localhost:5000) or pass --base-url.
//! Each transform command uploads the file, runs one transform, and writes the
//! result next to the other downloads.

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use serde::Serialize;
use std::path::{Path, PathBuf};
use visioncraft_api_client::api::PROCESSED_DOWNLOAD_NAME;
use visioncraft_api_client::models::DEFAULT_QUALITY;
use visioncraft_api_client::{
    ApiClient, EditorSession, FilterStep, ImageFile, TransformOutcome, UpscaleMethod,
    WatermarkPlacement,
};
use visioncraft_cli::{init_tracing, TransformSummary};
use visioncraft_core::{ClientConfig, DecodedImage, ImageMime};

#[derive(Parser)]
#[command(name = "visioncraft", about = "VisionCraft image service CLI")]
struct Cli {
    /// Service origin, overrides VISIONCRAFT_BASE_URL
    #[arg(long, global = true)]
    base_url: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct Output {
    /// Directory the result is written to under its default name
    #[arg(long, default_value = ".")]
    out_dir: PathBuf,
    /// Exact output path, overrides --out-dir
    #[arg(long)]
    out: Option<PathBuf>,
    /// Do not write the result, only print the summary
    #[arg(long)]
    no_save: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Check that the service is reachable
    Ping,
    /// List the filters the service offers
    Filters,
    /// Upload an image and print its server filename
    Upload {
        /// Path to the image
        file: PathBuf,
    },
    /// Compress an image as JPEG
    Compress {
        file: PathBuf,
        /// JPEG quality, clamped to 1-100
        #[arg(long, default_value_t = i64::from(DEFAULT_QUALITY), allow_negative_numbers = true)]
        quality: i64,
        #[command(flatten)]
        output: Output,
    },
    /// Resize an image to exact dimensions
    Resize {
        file: PathBuf,
        #[arg(long)]
        width: u32,
        #[arg(long)]
        height: u32,
        #[command(flatten)]
        output: Output,
    },
    /// Crop an image to a pixel box
    Crop {
        file: PathBuf,
        #[arg(long, allow_negative_numbers = true)]
        left: i64,
        #[arg(long, allow_negative_numbers = true)]
        top: i64,
        #[arg(long, allow_negative_numbers = true)]
        right: i64,
        #[arg(long, allow_negative_numbers = true)]
        bottom: i64,
        #[command(flatten)]
        output: Output,
    },
    /// Convert an image to JPEG
    Convert {
        file: PathBuf,
        #[command(flatten)]
        output: Output,
    },
    /// Upscale an image 2x
    Upscale {
        file: PathBuf,
        /// nearest, bilinear, bicubic, or lanczos
        #[arg(long, default_value = "lanczos")]
        method: String,
        #[command(flatten)]
        output: Output,
    },
    /// Remove the background of an image
    RemoveBackground {
        file: PathBuf,
        #[command(flatten)]
        output: Output,
    },
    /// Paste a watermark image onto an image
    Watermark {
        file: PathBuf,
        /// Watermark image
        #[arg(long)]
        watermark: PathBuf,
        #[arg(long, default_value = "0", allow_negative_numbers = true)]
        x: i64,
        #[arg(long, default_value = "0", allow_negative_numbers = true)]
        y: i64,
        #[arg(long)]
        width: u32,
        #[arg(long)]
        height: u32,
        /// 0.0 to 1.0
        #[arg(long, default_value = "0.5")]
        opacity: f64,
        #[command(flatten)]
        output: Output,
    },
    /// Blur the faces in an image
    BlurFace {
        file: PathBuf,
        #[command(flatten)]
        output: Output,
    },
    /// Apply a pipeline of catalogue filters, in order, without uploading first
    Process {
        file: PathBuf,
        /// One step as JSON, e.g. '{"type":"threshold","params":{"method":"otsu"}}'; repeatable
        #[arg(long = "step", required = true)]
        steps: Vec<String>,
        #[command(flatten)]
        output: Output,
    },
}

fn print_json(value: &impl Serialize) -> anyhow::Result<()> {
    let out = serde_json::to_string_pretty(value).context("Serialize response")?;
    println!("{}", out);
    Ok(())
}

async fn open_session(client: &ApiClient, file: &Path) -> anyhow::Result<EditorSession> {
    let session = EditorSession::new(client.clone());
    let image = ImageFile::from_path(file)
        .await
        .with_context(|| format!("Failed to read image: {}", file.display()))?;
    session
        .upload(image)
        .await
        .with_context(|| format!("Upload failed: {}", file.display()))?;
    Ok(session)
}

async fn finish(outcome: TransformOutcome, output: &Output) -> anyhow::Result<()> {
    let saved_to = if output.no_save {
        None
    } else if let Some(path) = &output.out {
        outcome.image.save_as(path).await?;
        Some(path.clone())
    } else {
        Some(
            outcome
                .image
                .save_to_dir(&output.out_dir, outcome.operation)
                .await?,
        )
    };

    print_json(&TransformSummary::new(&outcome, saved_to.as_deref()))
}

fn parse_steps(raw: &[String]) -> anyhow::Result<Vec<FilterStep>> {
    raw.iter()
        .map(|step| {
            serde_json::from_str(step).with_context(|| format!("Invalid filter step: {}", step))
        })
        .collect()
}

async fn process(
    client: &ApiClient,
    file: &Path,
    steps: &[FilterStep],
    output: &Output,
) -> anyhow::Result<()> {
    let bytes = tokio::fs::read(file)
        .await
        .with_context(|| format!("Failed to read image: {}", file.display()))?;
    let hint = ImageMime::from_path(file).unwrap_or(ImageMime::Png);
    let image = DecodedImage::from_bytes(bytes, hint);

    let processed = client.process(&image, steps).await?;

    let saved_to = if output.no_save {
        None
    } else {
        let path = output
            .out
            .clone()
            .unwrap_or_else(|| output.out_dir.join(PROCESSED_DOWNLOAD_NAME));
        processed.save_as(&path).await?;
        Some(path)
    };

    print_json(&TransformSummary::for_image(
        "process",
        &processed,
        saved_to.as_deref(),
    ))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    let mut config = ClientConfig::from_env().context("Invalid VISIONCRAFT_* configuration")?;
    if let Some(base_url) = cli.base_url {
        config = config.with_base_url(base_url);
    }
    let client = ApiClient::new(&config).context("Failed to create API client")?;

    match cli.command {
        Commands::Ping => {
            let status = client.ping().await?;
            print_json(&status)?;
        }
        Commands::Filters => {
            let filters = client.filters().await?;
            print_json(&filters)?;
        }
        Commands::Upload { file } => {
            let session = open_session(&client, &file).await?;
            let asset = session.asset().context("Upload did not complete")?;
            print_json(&asset)?;
        }
        Commands::Compress {
            file,
            quality,
            output,
        } => {
            let session = open_session(&client, &file).await?;
            finish(session.compress(quality).await?, &output).await?;
        }
        Commands::Resize {
            file,
            width,
            height,
            output,
        } => {
            let session = open_session(&client, &file).await?;
            finish(session.resize(width, height).await?, &output).await?;
        }
        Commands::Crop {
            file,
            left,
            top,
            right,
            bottom,
            output,
        } => {
            let session = open_session(&client, &file).await?;
            finish(session.crop(left, top, right, bottom).await?, &output).await?;
        }
        Commands::Convert { file, output } => {
            let session = open_session(&client, &file).await?;
            finish(session.convert_to_jpg().await?, &output).await?;
        }
        Commands::Upscale {
            file,
            method,
            output,
        } => {
            let method = UpscaleMethod::parse(&method)?;
            let session = open_session(&client, &file).await?;
            finish(session.upscale(method).await?, &output).await?;
        }
        Commands::RemoveBackground { file, output } => {
            let session = open_session(&client, &file).await?;
            finish(session.remove_background().await?, &output).await?;
        }
        Commands::Watermark {
            file,
            watermark,
            x,
            y,
            width,
            height,
            opacity,
            output,
        } => {
            let session = open_session(&client, &file).await?;
            let overlay = ImageFile::from_path(&watermark)
                .await
                .with_context(|| format!("Failed to read watermark: {}", watermark.display()))?;
            session.upload_watermark(overlay).await?;

            let placement = WatermarkPlacement::new(width, height)
                .at(x, y)
                .with_opacity(opacity);
            finish(session.watermark(placement).await?, &output).await?;
        }
        Commands::BlurFace { file, output } => {
            let session = open_session(&client, &file).await?;
            finish(session.blur_face().await?, &output).await?;
        }
        Commands::Process {
            file,
            steps,
            output,
        } => {
            let steps = parse_steps(&steps)?;
            process(&client, &file, &steps, &output).await?;
        }
    }

    Ok(())
}
