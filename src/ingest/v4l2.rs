//! V4L2 camera source.
//!
//! Captures frames from a local device node (e.g. /dev/video0) through memory-mapped
//! buffers and converts them to RGB24. Capture is blocking: `next_frame` waits for the
//! device to deliver the next buffer.

use anyhow::{anyhow, Context, Result};
use ouroboros::self_referencing;

use super::normalize::{to_rgb24, PixelFormat};
use super::{FrameSource, SourceStats};
use crate::frame::Frame;

/// Configuration for a V4L2 source.
#[derive(Clone, Debug)]
pub struct V4l2Config {
    /// Device path (e.g., "/dev/video0")
    pub device: String,
    /// Requested frame rate. Zero leaves the device default.
    pub target_fps: u32,
    /// Preferred frame width.
    pub width: u32,
    /// Preferred frame height.
    pub height: u32,
}

impl Default for V4l2Config {
    fn default() -> Self {
        Self {
            device: "/dev/video0".to_string(),
            target_fps: 30,
            width: 1280,
            height: 720,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum WireFormat {
    Raw(PixelFormat),
    Mjpeg,
}

impl WireFormat {
    fn from_fourcc(fourcc: &[u8; 4]) -> Result<Self> {
        match fourcc {
            b"RGB3" => Ok(Self::Raw(PixelFormat::Rgb24)),
            b"BGR3" => Ok(Self::Raw(PixelFormat::Bgr24)),
            b"YUYV" => Ok(Self::Raw(PixelFormat::Yuyv)),
            b"MJPG" => Ok(Self::Mjpeg),
            other => Err(anyhow!(
                "unsupported v4l2 pixel format {}",
                String::from_utf8_lossy(other)
            )),
        }
    }
}

/// V4L2 frame source.
pub struct V4l2Source {
    config: V4l2Config,
    state: Option<V4l2State>,
    frame_count: u64,
    active_width: u32,
    active_height: u32,
    wire_format: WireFormat,
}

#[self_referencing]
struct V4l2State {
    device: v4l::Device,
    #[borrows(mut device)]
    #[covariant]
    stream: v4l::prelude::MmapStream<'this, v4l::Device>,
}

impl V4l2Source {
    pub fn new(config: V4l2Config) -> Result<Self> {
        Ok(Self {
            active_width: config.width,
            active_height: config.height,
            config,
            state: None,
            frame_count: 0,
            wire_format: WireFormat::Raw(PixelFormat::Yuyv),
        })
    }

    fn decode(&self, buf: &[u8]) -> Result<Frame> {
        match self.wire_format {
            WireFormat::Raw(format) => {
                let rgb = to_rgb24(buf, self.active_width, self.active_height, format)?;
                Frame::from_rgb(rgb, self.active_width, self.active_height, self.frame_count)
            }
            WireFormat::Mjpeg => {
                let image = image::load_from_memory(buf)
                    .context("decode mjpeg frame")?
                    .to_rgb8();
                Ok(Frame::from_image(image, self.frame_count))
            }
        }
    }
}

impl FrameSource for V4l2Source {
    fn connect(&mut self) -> Result<()> {
        use v4l::buffer::Type;
        use v4l::video::Capture;

        let mut device = v4l::Device::with_path(&self.config.device)
            .with_context(|| format!("open v4l2 device {}", self.config.device))?;
        let mut format = device.format().context("read v4l2 format")?;
        format.width = self.config.width;
        format.height = self.config.height;
        format.fourcc = v4l::FourCC::new(b"YUYV");

        let format = match device.set_format(&format) {
            Ok(format) => format,
            Err(err) => {
                log::warn!(
                    "V4l2Source: failed to set format on {}: {}",
                    self.config.device,
                    err
                );
                device
                    .format()
                    .context("read v4l2 format after set failure")?
            }
        };

        if self.config.target_fps > 0 {
            let params = v4l::video::capture::Parameters::with_fps(self.config.target_fps);
            if let Err(err) = device.set_params(&params) {
                log::warn!(
                    "V4l2Source: failed to set fps on {}: {}",
                    self.config.device,
                    err
                );
            }
        }

        self.wire_format = WireFormat::from_fourcc(&format.fourcc.repr)?;
        self.active_width = format.width;
        self.active_height = format.height;

        let state = V4l2StateBuilder {
            device,
            stream_builder: |device| {
                v4l::prelude::MmapStream::with_buffers(device, Type::VideoCapture, 4)
                    .map_err(|err| anyhow::Error::new(err).context("create v4l2 buffer stream"))
            },
        }
        .try_build()?;
        self.state = Some(state);

        log::info!(
            "V4l2Source: connected to {} ({}x{} {:?})",
            self.config.device,
            self.active_width,
            self.active_height,
            self.wire_format
        );
        Ok(())
    }

    fn next_frame(&mut self) -> Result<Option<Frame>> {
        use v4l::io::traits::CaptureStream;

        let state = self.state.as_mut().context("v4l2 device not connected")?;
        let buf = state
            .with_mut(|fields| fields.stream.next().map(|(buf, _meta)| buf.to_vec()))
            .context("capture v4l2 frame")?;

        let frame = self.decode(&buf)?;
        self.frame_count += 1;
        Ok(Some(frame))
    }

    fn stats(&self) -> SourceStats {
        SourceStats {
            frames_captured: self.frame_count,
            uri: self.config.device.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maps_known_fourccs() -> Result<()> {
        assert_eq!(
            WireFormat::from_fourcc(b"YUYV")?,
            WireFormat::Raw(PixelFormat::Yuyv)
        );
        assert_eq!(WireFormat::from_fourcc(b"MJPG")?, WireFormat::Mjpeg);
        assert!(WireFormat::from_fourcc(b"H264").is_err());
        Ok(())
    }

    #[test]
    fn missing_device_fails_to_connect() {
        let mut source = V4l2Source::new(V4l2Config {
            device: "/dev/video-does-not-exist".to_string(),
            ..V4l2Config::default()
        })
        .unwrap();
        assert!(source.connect().is_err());
    }
}
