//! Frame ingestion sources.
//!
//! This module provides different sources of RGB frames:
//! - Synthetic frames (`stub://`), for tests and dry runs
//! - Local image directories and video files (video decoding behind `ingest-file-ffmpeg`)
//! - USB/V4L2 cameras (feature: ingest-v4l2)
//!
//! Sources are pulled one frame at a time. `next_frame` returning `Ok(None)` means the
//! input is exhausted and the caller should stop cleanly.

pub mod file;
#[cfg(feature = "ingest-file-ffmpeg")]
pub(crate) mod file_ffmpeg;
pub mod images;
mod normalize;
pub mod synthetic;
#[cfg(feature = "ingest-v4l2")]
pub mod v4l2;

use anyhow::{anyhow, Result};

use crate::frame::Frame;

pub use file::{FileConfig, FileSource};
pub use images::ImageSequenceSource;
pub use synthetic::{SyntheticConfig, SyntheticSource};
#[cfg(feature = "ingest-v4l2")]
pub use v4l2::{V4l2Config, V4l2Source};

/// A pull-based source of frames.
pub trait FrameSource {
    /// Open the underlying device or file.
    fn connect(&mut self) -> Result<()>;

    /// Next frame, or `None` at end of input.
    fn next_frame(&mut self) -> Result<Option<Frame>>;

    /// Capture statistics.
    fn stats(&self) -> SourceStats;
}

/// Statistics for a frame source.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SourceStats {
    pub frames_captured: u64,
    pub uri: String,
}

/// Pick a source implementation for `uri`.
///
/// - `stub://...` synthetic frames
/// - `/dev/video*` V4L2 camera
/// - anything else a local file or image directory
pub fn open_source(uri: &str, target_fps: u32) -> Result<Box<dyn FrameSource>> {
    if uri.trim().is_empty() {
        return Err(anyhow!("frame source uri is empty"));
    }
    if uri.starts_with("stub://") {
        return Ok(Box::new(SyntheticSource::new(SyntheticConfig::from_uri(uri)?)));
    }
    if uri.contains("://") {
        return Err(anyhow!(
            "unsupported source '{}': only local paths and stub:// are accepted",
            uri
        ));
    }
    if uri.starts_with("/dev/video") {
        return open_camera(uri, target_fps);
    }
    Ok(Box::new(FileSource::new(FileConfig {
        path: uri.to_string(),
        target_fps,
    })?))
}

#[cfg(feature = "ingest-v4l2")]
fn open_camera(uri: &str, target_fps: u32) -> Result<Box<dyn FrameSource>> {
    Ok(Box::new(V4l2Source::new(V4l2Config {
        device: uri.to_string(),
        target_fps,
        ..V4l2Config::default()
    })?))
}

#[cfg(not(feature = "ingest-v4l2"))]
fn open_camera(uri: &str, _target_fps: u32) -> Result<Box<dyn FrameSource>> {
    Err(anyhow!(
        "camera source {} requires the ingest-v4l2 feature",
        uri
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_network_urls() {
        assert!(open_source("rtsp://camera/stream", 10).is_err());
        assert!(open_source("http://example.com/a.mp4", 10).is_err());
        assert!(open_source("  ", 10).is_err());
    }

    #[test]
    fn stub_uri_opens_synthetic_source() -> Result<()> {
        let mut source = open_source("stub://test?frames=2", 10)?;
        source.connect()?;
        assert!(source.next_frame()?.is_some());
        assert!(source.next_frame()?.is_some());
        assert!(source.next_frame()?.is_none());
        assert_eq!(source.stats().frames_captured, 2);
        Ok(())
    }
}
