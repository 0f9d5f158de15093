use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use super::{FrameSink, SinkControl};
use crate::encode::{check_quality, encode_jpeg};
use crate::frame::Frame;

pub const DEFAULT_PREFIX: &str = "test";
pub const DEFAULT_JPEG_QUALITY: u8 = 90;

/// Writes numbered JPEG files: `<dir>/<prefix>_000.jpg`, `<prefix>_001.jpg`, ...
#[derive(Debug)]
pub struct JpegSequenceSink {
    dir: PathBuf,
    prefix: String,
    quality: u8,
    written: u64,
}

impl JpegSequenceSink {
    pub fn new<P: AsRef<Path>>(dir: P) -> Result<Self> {
        let dir = dir.as_ref().to_path_buf();
        std::fs::create_dir_all(&dir)
            .with_context(|| format!("failed to create output dir {}", dir.display()))?;
        Ok(Self {
            dir,
            prefix: DEFAULT_PREFIX.to_string(),
            quality: DEFAULT_JPEG_QUALITY,
            written: 0,
        })
    }

    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = prefix.into();
        self
    }

    pub fn with_quality(mut self, quality: u8) -> Result<Self> {
        self.quality = check_quality(quality)?;
        Ok(self)
    }

    pub fn written(&self) -> u64 {
        self.written
    }

    /// Path the next image will be written to.
    pub fn next_path(&self) -> PathBuf {
        self.dir.join(format!("{}_{:03}.jpg", self.prefix, self.written))
    }

    fn create_next(&self) -> Result<(PathBuf, BufWriter<File>)> {
        let path = self.next_path();
        log::info!("Saving image {}", self.written);
        let file = File::create(&path)
            .with_context(|| format!("failed to create {}", path.display()))?;
        Ok((path, BufWriter::new(file)))
    }
}

impl FrameSink for JpegSequenceSink {
    fn name(&self) -> &'static str {
        "jpeg"
    }

    fn show(&mut self, frame: &Frame) -> Result<SinkControl> {
        let data = encode_jpeg(frame, self.quality)
            .with_context(|| format!("failed to encode {}", self.next_path().display()))?;
        self.write_encoded(&data)?;
        Ok(SinkControl::Continue)
    }

    fn write_encoded(&mut self, bytes: &[u8]) -> Result<()> {
        let (path, mut out) = self.create_next()?;
        out.write_all(bytes)
            .and_then(|_| out.flush())
            .with_context(|| format!("failed to write {}", path.display()))?;
        self.written += 1;
        Ok(())
    }
}
