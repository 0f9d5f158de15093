//! track_people - track people and report when activity starts and ends.

use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;

use oakview::cli::{self, BackendKind, OutputKind, SinkOptions};
use oakview::config::ViewerConfig;
use oakview::ingest::open_source;
use oakview::pipeline::DisplayLoop;
use oakview::render::OverlayStyle;
use oakview::track::{ActivityMonitor, Tracker};

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "Track people, draw tracklets and log activity start/end"
)]
struct Args {
    /// Model path (default models/mobilenet-ssd.onnx).
    model: Option<PathBuf>,

    /// Frame source: /dev/videoN, video file, image directory or stub://name.
    #[arg(long)]
    input: Option<String>,

    #[arg(long, value_enum, default_value = "tract")]
    backend: BackendKind,

    /// JSON-lines result log for --backend replay.
    #[arg(long)]
    replay: Option<PathBuf>,

    /// TrueType font for tracklet ids, labels and status.
    #[arg(long)]
    font: Option<PathBuf>,

    #[arg(long, value_enum, default_value = "window")]
    output: OutputKind,

    /// Directory for --output jpeg.
    #[arg(long)]
    out: Option<PathBuf>,

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
    if let Some(out) = args.out {
        cfg.output_dir = out;
    }
    cfg.validate()?;

    let style = match args.font.as_deref() {
        Some(path) => OverlayStyle::default().with_font_file(path)?,
        None => OverlayStyle::default(),
    };

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
        .with_style(style)
        .with_tracking(
            Tracker::new(cfg.tracker.clone()),
            ActivityMonitor::new(cfg.detection.label),
        )
        .with_interrupt(interrupt);
    if let Some(max_frames) = args.max_frames {
        pipeline = pipeline.with_max_frames(max_frames);
    }

    let summary = pipeline.run()?;
    log::info!(
        "track_people: {} frames, {} tracklet boxes drawn ({:?})",
        summary.frames,
        summary.detections_drawn,
        summary.stop
    );
    Ok(())
}
