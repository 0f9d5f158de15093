//! Local file frame source.
//!
//! `FileSource` reads recorded input from the local filesystem:
//! - a directory is read as an image sequence
//! - any other path is decoded as a video file (requires `ingest-file-ffmpeg`)
//!
//! Remote URLs are rejected; the source never touches the network.

use std::path::Path;

use anyhow::{anyhow, Result};

#[cfg(feature = "ingest-file-ffmpeg")]
use super::file_ffmpeg::FfmpegFileSource;
use super::images::ImageSequenceSource;
use super::{FrameSource, SourceStats};
use crate::frame::Frame;

/// Configuration for a local file source.
#[derive(Clone, Debug)]
pub struct FileConfig {
    /// Local path (e.g., "./walk-720p.mp4" or a directory of frames).
    pub path: String,
    /// Nominal frame rate of the recording.
    pub target_fps: u32,
}

impl Default for FileConfig {
    fn default() -> Self {
        Self {
            path: String::new(),
            target_fps: 30,
        }
    }
}

/// Local file frame source.
pub struct FileSource {
    backend: FileBackend,
}

enum FileBackend {
    Images(ImageSequenceSource),
    #[cfg(feature = "ingest-file-ffmpeg")]
    Ffmpeg(FfmpegFileSource),
}

impl FileSource {
    pub fn new(config: FileConfig) -> Result<Self> {
        if !is_local_file_path(&config.path) {
            return Err(anyhow!(
                "file ingestion only supports local paths (no URL schemes)"
            ));
        }
        let path = Path::new(&config.path);
        if path.is_dir() {
            return Ok(Self {
                backend: FileBackend::Images(ImageSequenceSource::new(path)?),
            });
        }
        if !path.exists() {
            return Err(anyhow!("input file {} does not exist", config.path));
        }

        #[cfg(feature = "ingest-file-ffmpeg")]
        {
            Ok(Self {
                backend: FileBackend::Ffmpeg(FfmpegFileSource::new(config)?),
            })
        }
        #[cfg(not(feature = "ingest-file-ffmpeg"))]
        {
            Err(anyhow!(
                "decoding video file {} requires the ingest-file-ffmpeg feature",
                config.path
            ))
        }
    }
}

impl FrameSource for FileSource {
    fn connect(&mut self) -> Result<()> {
        match &mut self.backend {
            FileBackend::Images(source) => source.connect(),
            #[cfg(feature = "ingest-file-ffmpeg")]
            FileBackend::Ffmpeg(source) => source.connect(),
        }
    }

    fn next_frame(&mut self) -> Result<Option<Frame>> {
        match &mut self.backend {
            FileBackend::Images(source) => source.next_frame(),
            #[cfg(feature = "ingest-file-ffmpeg")]
            FileBackend::Ffmpeg(source) => source.next_frame(),
        }
    }

    fn stats(&self) -> SourceStats {
        match &self.backend {
            FileBackend::Images(source) => source.stats(),
            #[cfg(feature = "ingest-file-ffmpeg")]
            FileBackend::Ffmpeg(source) => source.stats(),
        }
    }
}

fn is_local_file_path(path: &str) -> bool {
    !path.trim().is_empty() && !path.contains("://")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_urls_and_empty_paths() {
        for path in ["", "   ", "rtsp://cam", "file:///tmp/a.mp4"] {
            let config = FileConfig {
                path: path.to_string(),
                ..FileConfig::default()
            };
            assert!(FileSource::new(config).is_err(), "{path} should be rejected");
        }
    }

    #[test]
    fn missing_file_is_an_error() {
        let config = FileConfig {
            path: "/nonexistent/walk-720p.mp4".to_string(),
            ..FileConfig::default()
        };
        assert!(FileSource::new(config).is_err());
    }

    #[test]
    fn directory_is_read_as_image_sequence() -> Result<()> {
        let dir = tempfile::tempdir()?;
        image::RgbImage::new(4, 4).save(dir.path().join("000.png"))?;
        let mut source = FileSource::new(FileConfig {
            path: dir.path().display().to_string(),
            ..FileConfig::default()
        })?;
        source.connect()?;
        assert!(source.next_frame()?.is_some());
        assert!(source.next_frame()?.is_none());
        Ok(())
    }
}
