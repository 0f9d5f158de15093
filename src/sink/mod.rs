//! Frame outputs.
//!
//! A sink receives each finished frame. Interactive sinks report a quit request through
//! [`SinkControl`].

use anyhow::Result;

use crate::frame::Frame;

mod jpeg;
#[cfg(feature = "display-window")]
mod window;

pub use jpeg::{JpegSequenceSink, DEFAULT_JPEG_QUALITY, DEFAULT_PREFIX};
#[cfg(feature = "display-window")]
pub use window::WindowSink;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SinkControl {
    Continue,
    Quit,
}

pub trait FrameSink {
    fn name(&self) -> &'static str;

    /// Present or store a frame.
    fn show(&mut self, frame: &Frame) -> Result<SinkControl>;

    /// Store an already-encoded image (e.g. a device-side JPEG).
    fn write_encoded(&mut self, bytes: &[u8]) -> Result<()>;
}

/// Discards frames, counting them.
#[derive(Debug, Default)]
pub struct NullSink {
    frames: u64,
    encoded: u64,
}

impl NullSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn frames(&self) -> u64 {
        self.frames
    }

    pub fn encoded(&self) -> u64 {
        self.encoded
    }
}

impl FrameSink for NullSink {
    fn name(&self) -> &'static str {
        "null"
    }

    fn show(&mut self, _frame: &Frame) -> Result<SinkControl> {
        self.frames += 1;
        Ok(SinkControl::Continue)
    }

    fn write_encoded(&mut self, _bytes: &[u8]) -> Result<()> {
        self.encoded += 1;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn null_sink_counts() -> Result<()> {
        let frame = Frame::from_rgb(vec![0u8; 12], 2, 2, 0)?;
        let mut sink = NullSink::new();
        assert_eq!(sink.show(&frame)?, SinkControl::Continue);
        assert_eq!(sink.show(&frame)?, SinkControl::Continue);
        sink.write_encoded(&[0xff, 0xd8])?;
        assert_eq!(sink.frames(), 2);
        assert_eq!(sink.encoded(), 1);
        Ok(())
    }
}
