//! jpeg_capture - save camera frames as numbered JPEG files.
//!
//! Each frame goes through an MJPEG encoder; the loop blocks on the encoder queue and
//! writes every packet verbatim as `test_000.jpg`, `test_001.jpg`, ... until interrupted
//! or the source ends.

use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;

use oakview::cli;
use oakview::config::ViewerConfig;
use oakview::ingest::open_source;
use oakview::encode::MjpegEncoder;
use oakview::pipeline::{DisplayLoop, ResultMode};
use oakview::sink::JpegSequenceSink;

#[derive(Parser, Debug)]
#[command(author, version, about = "Capture camera frames to numbered JPEG files")]
struct Args {
    /// Frame source (default from OAKVIEW_INPUT or config).
    #[arg(long)]
    source: Option<String>,

    /// Output directory.
    #[arg(long)]
    out: Option<PathBuf>,

    /// File name prefix.
    #[arg(long)]
    prefix: Option<String>,

    /// JPEG quality, 1..=100.
    #[arg(long)]
    quality: Option<u8>,

    /// Stop after this many frames.
    #[arg(long)]
    max_frames: Option<u64>,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    let mut cfg = ViewerConfig::load()?;
    if let Some(source) = args.source {
        cfg.input = source;
    }
    if let Some(out) = args.out {
        cfg.output_dir = out;
    }
    if let Some(prefix) = args.prefix {
        cfg.jpeg.prefix = prefix;
    }
    if let Some(quality) = args.quality {
        cfg.jpeg.quality = quality;
    }
    cfg.validate()?;

    let interrupt = cli::install_interrupt()?;
    let source = open_source(&cfg.input, cfg.target_fps)?;
    let sink = JpegSequenceSink::new(&cfg.output_dir)?.with_prefix(cfg.jpeg.prefix.clone());
    let encoder = MjpegEncoder::new(cfg.jpeg.quality)?;

    let mut pipeline = DisplayLoop::new(source, Box::new(sink))
        .with_encoder(encoder)
        .with_result_mode(ResultMode::Block)
        .with_interrupt(interrupt);
    if let Some(max_frames) = args.max_frames {
        pipeline = pipeline.with_max_frames(max_frames);
    }

    let summary = pipeline.run()?;
    log::info!(
        "jpeg_capture: wrote {} images to {} ({:?})",
        summary.encoded,
        cfg.output_dir.display(),
        summary.stop
    );
    Ok(())
}
