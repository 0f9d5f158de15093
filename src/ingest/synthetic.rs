//! Synthetic frame source (`stub://`).
//!
//! Produces a moving gradient so consecutive frames differ. Used by tests and by the
//! binaries for dry runs without a camera or video file.

use anyhow::{anyhow, Result};

use super::{FrameSource, SourceStats};
use crate::frame::Frame;

/// Configuration for a synthetic source.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SyntheticConfig {
    pub uri: String,
    pub width: u32,
    pub height: u32,
    /// Frames to produce before reporting end of input. `None` runs forever.
    pub frames: Option<u64>,
}

impl Default for SyntheticConfig {
    fn default() -> Self {
        Self {
            uri: "stub://synthetic".to_string(),
            width: 640,
            height: 480,
            frames: None,
        }
    }
}

impl SyntheticConfig {
    /// Parse `stub://name?frames=N&width=W&height=H`.
    pub fn from_uri(uri: &str) -> Result<Self> {
        let rest = uri
            .strip_prefix("stub://")
            .ok_or_else(|| anyhow!("not a stub:// uri: {}", uri))?;
        let mut config = Self {
            uri: uri.to_string(),
            ..Self::default()
        };
        let Some((_, query)) = rest.split_once('?') else {
            return Ok(config);
        };
        for pair in query.split('&').filter(|p| !p.is_empty()) {
            let (key, value) = pair
                .split_once('=')
                .ok_or_else(|| anyhow!("malformed stub parameter '{}'", pair))?;
            let invalid = |_| anyhow!("stub parameter {} is not a valid integer", key);
            match key {
                "frames" => config.frames = Some(value.parse::<u64>().map_err(invalid)?),
                "width" => config.width = value.parse::<u32>().map_err(invalid)?,
                "height" => config.height = value.parse::<u32>().map_err(invalid)?,
                other => return Err(anyhow!("unknown stub parameter '{}'", other)),
            }
        }
        if config.width == 0 || config.height == 0 {
            return Err(anyhow!("stub frame dimensions must be non-zero"));
        }
        Ok(config)
    }
}

pub struct SyntheticSource {
    config: SyntheticConfig,
    frame_count: u64,
}

impl SyntheticSource {
    pub fn new(config: SyntheticConfig) -> Self {
        Self {
            config,
            frame_count: 0,
        }
    }

    fn generate_pixels(&self) -> Vec<u8> {
        let width = self.config.width as usize;
        let height = self.config.height as usize;
        let mut pixels = vec![0u8; width * height * 3];
        for (i, px) in pixels.chunks_exact_mut(3).enumerate() {
            let x = (i % width) as u64;
            let y = (i / width) as u64;
            px[0] = ((x + self.frame_count) % 256) as u8;
            px[1] = ((y + self.frame_count) % 256) as u8;
            px[2] = 96;
        }
        pixels
    }
}

impl FrameSource for SyntheticSource {
    fn connect(&mut self) -> Result<()> {
        log::info!("SyntheticSource: connected to {}", self.config.uri);
        Ok(())
    }

    fn next_frame(&mut self) -> Result<Option<Frame>> {
        if self.config.frames.is_some_and(|limit| self.frame_count >= limit) {
            return Ok(None);
        }
        let pixels = self.generate_pixels();
        let frame = Frame::from_rgb(
            pixels,
            self.config.width,
            self.config.height,
            self.frame_count,
        )?;
        self.frame_count += 1;
        Ok(Some(frame))
    }

    fn stats(&self) -> SourceStats {
        SourceStats {
            frames_captured: self.frame_count,
            uri: self.config.uri.clone(),
        }
    }
}
