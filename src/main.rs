use clap::Parser;
use image::ImageReader;
use std::path::{Path, PathBuf};

use eyesprite::annotate::LabelFont;
use eyesprite::{Frame, FramePipeline, LiveSession, OverlayAsset, PipelineConfig, Stage, SystemClock};

#[derive(Parser)]
#[command(name = "eyesprite")]
#[command(about = "Find pairs of eye-like shapes in frames and overlay a sprite on them")]
struct Cli {
    /// Input frame images, processed in order
    #[arg(value_name = "FRAME", required_unless_present = "print_config")]
    frames: Vec<PathBuf>,

    /// Sprite with alpha channel composited over every eye pair
    #[arg(long, value_name = "PNG", required_unless_present = "print_config")]
    overlay: Option<PathBuf>,

    /// Output directory (one PNG per frame) or file (single frame)
    #[arg(short, long, value_name = "PATH")]
    out: Option<PathBuf>,

    /// Stage to render; overrides the time-driven cycle
    #[arg(long, value_enum)]
    stage: Option<Stage>,

    /// Cycle through the debug stages by wall-clock time
    #[arg(long, conflicts_with = "stage")]
    cycle: bool,

    /// JSON configuration file
    #[arg(long, value_name = "JSON")]
    config: Option<PathBuf>,

    /// Draw pair outlines, stage label and size guides
    #[arg(long)]
    annotate: bool,

    /// TrueType font for the stage label
    #[arg(long, value_name = "TTF")]
    font: Option<PathBuf>,

    /// Report both orderings of every pair
    #[arg(long)]
    no_dedup: bool,

    /// Save debug outputs to directory (must be empty)
    #[arg(long, value_name = "DIR")]
    debug_out: Option<PathBuf>,

    /// Print the effective configuration as JSON and exit
    #[arg(long)]
    print_config: bool,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,
}

fn output_path(out: &Path, frame: &Path, frame_count: usize) -> PathBuf {
    if frame_count == 1 && out.extension().is_some() {
        return out.to_path_buf();
    }
    let stem = frame
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "frame".to_string());
    out.join(format!("{}_overlay.png", stem))
}

fn main() -> anyhow::Result<()> {
    let args = Cli::parse();

    let default_level = if args.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level)),
        )
        .init();

    let mut config = match &args.config {
        Some(path) => PipelineConfig::from_json_file(path)?,
        None => PipelineConfig::default(),
    };
    if args.annotate {
        config.annotation.enabled = true;
    }
    if args.no_dedup {
        config.pairing.dedup = false;
    }

    if args.print_config {
        println!("{}", config.to_json_string()?);
        return Ok(());
    }

    let overlay_path = args
        .overlay
        .as_ref()
        .ok_or_else(|| anyhow::anyhow!("--overlay is required"))?;
    let asset = OverlayAsset::open(overlay_path)
        .map_err(|e| anyhow::anyhow!("Failed to load overlay {}: {}", overlay_path.display(), e))?;
    tracing::info!(
        "Loaded overlay {} ({}x{})",
        overlay_path.display(),
        asset.width(),
        asset.height()
    );

    let mut pipeline = FramePipeline::new(config, asset)?;
    if let Some(font_path) = &args.font {
        pipeline = pipeline.with_label_font(LabelFont::open(font_path)?);
    }
    if let Some(debug_dir) = args.debug_out.clone() {
        pipeline = pipeline.with_debug(debug_dir)?;
    }

    if let Some(out) = &args.out {
        if args.frames.len() > 1 || out.extension().is_none() {
            std::fs::create_dir_all(out)?;
        }
    }

    let fixed_stage = args.stage.unwrap_or(Stage::AllPairs);
    let mut session = LiveSession::new(pipeline, SystemClock, args.cycle);

    let mut total_pairs = 0;
    for frame_path in &args.frames {
        let img = ImageReader::open(frame_path)?
            .decode()
            .map_err(|e| anyhow::anyhow!("Failed to decode image: {}", e))?;
        let frame = Frame::from_image(&img)?;

        let output = if args.cycle {
            session.next_frame(&frame)?
        } else {
            session.pipeline().process(&frame, fixed_stage)?
        };

        tracing::info!(
            "{}: stage {}, {} candidates, {} pairs",
            frame_path.display(),
            output.stage,
            output.candidates.len(),
            output.pairs.len()
        );
        if args.verbose {
            for pair in &output.pairs {
                let (a, b) = (pair.first.bbox(), pair.second.bbox());
                tracing::debug!(
                    "  pair ({}, {}): ({:.1}, {:.1}) {:.1}x{:.1} / ({:.1}, {:.1}) {:.1}x{:.1}",
                    pair.first_index,
                    pair.second_index,
                    a.center.x,
                    a.center.y,
                    a.width,
                    a.height,
                    b.center.x,
                    b.center.y,
                    b.width,
                    b.height
                );
            }
        }
        total_pairs += output.pairs.len();

        if let Some(out) = &args.out {
            let path = output_path(out, frame_path, args.frames.len());
            output
                .image
                .save(&path)
                .map_err(|e| anyhow::anyhow!("Failed to save {}: {}", path.display(), e))?;
        }
    }

    tracing::info!(
        "Processed {} frames, {} eye pairs in total",
        args.frames.len(),
        total_pairs
    );

    Ok(())
}
