//! detect_video - draw detections of one label over a video.
//!
//! Reads frames from a video file (or any other source `open_source` accepts), submits
//! each one for inference and draws the newest filtered result on it.

use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;

use oakview::cli::{self, BackendKind, OutputKind, SinkOptions};
use oakview::config::ViewerConfig;
use oakview::detect::Label;
use oakview::ingest::open_source;
use oakview::pipeline::{DisplayLoop, StalePolicy};

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "Detect objects in a video and draw their bounding boxes"
)]
struct Args {
    /// Model path (default models/mobilenet-ssd.onnx).
    model: Option<PathBuf>,

    /// Frame source: video file, image directory, /dev/videoN or stub://name.
    #[arg(long)]
    input: Option<String>,

    #[arg(long, value_enum, default_value = "tract")]
    backend: BackendKind,

    /// JSON-lines result log for --backend replay.
    #[arg(long)]
    replay: Option<PathBuf>,

    /// Label to keep.
    #[arg(long)]
    label: Option<Label>,

    /// Keep detections with confidence strictly above this.
    #[arg(long)]
    min_confidence: Option<f32>,

    #[arg(long, value_enum, default_value = "window")]
    output: OutputKind,

    /// Directory for --output jpeg.
    #[arg(long)]
    out: Option<PathBuf>,

    /// carry-forward, clear-on-miss or hold-last-hit.
    #[arg(long)]
    stale_policy: Option<StalePolicy>,

    /// Stop after this many frames.
    #[arg(long)]
    max_frames: Option<u64>,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    let mut cfg = ViewerConfig::load()?;
    if let Some(model) = args.model {
        cfg.model = model;
    }
    if let Some(input) = args.input {
        cfg.input = input;
    }
    if let Some(label) = args.label {
        cfg.detection.label = label;
    }
    if let Some(min_confidence) = args.min_confidence {
        cfg.detection.min_confidence = min_confidence;
    }
    if let Some(out) = args.out {
        cfg.output_dir = out;
    }
    if let Some(policy) = args.stale_policy {
        cfg.detection.stale_policy = policy;
    }
    cfg.validate()?;

    let interrupt = cli::install_interrupt()?;
    let source = open_source(&cfg.input, cfg.target_fps)?;
    let backend = cli::open_backend(args.backend, &cfg.model, args.replay.as_deref())?;
    let sink = cli::open_sink(
        args.output,
        SinkOptions {
            title: "previewout".to_string(),
            dir: cfg.output_dir.clone(),
            prefix: cfg.jpeg.prefix.clone(),
            quality: cfg.jpeg.quality,
        },
    )?;

    let mut pipeline = DisplayLoop::new(source, sink)
        .with_backend(backend)
        .with_filter(cfg.detection.filter())
        .with_policy(cfg.detection.stale_policy)
        .with_interrupt(interrupt);
    if let Some(max_frames) = args.max_frames {
        pipeline = pipeline.with_max_frames(max_frames);
    }

    let summary = pipeline.run()?;
    log::info!(
        "detect_video: {} frames, {} boxes drawn ({:?})",
        summary.frames,
        summary.detections_drawn,
        summary.stop
    );
    Ok(())
}
