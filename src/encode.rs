//! Host-side MJPEG encoder node.
//!
//! Frames submitted to [`MjpegEncoder`] are JPEG-encoded and queued as
//! [`EncodedPacket`]s. The display loop reads them with `get` or `try_get` and hands the
//! bytes to [`FrameSink::write_encoded`](crate::sink::FrameSink::write_encoded).

use anyhow::{anyhow, Context, Result};
use image::codecs::jpeg::JpegEncoder;

use crate::detect::OutputQueue;
use crate::frame::Frame;

/// Depth of the encoder output queue.
pub const ENCODER_QUEUE_SIZE: usize = 30;

/// One encoded frame.
#[derive(Clone, Debug, PartialEq)]
pub struct EncodedPacket {
    pub sequence: u64,
    pub data: Vec<u8>,
}

pub struct MjpegEncoder {
    quality: u8,
    queue: OutputQueue<EncodedPacket>,
}

impl MjpegEncoder {
    pub fn new(quality: u8) -> Result<Self> {
        Ok(Self {
            quality: check_quality(quality)?,
            queue: OutputQueue::new(ENCODER_QUEUE_SIZE),
        })
    }

    pub fn quality(&self) -> u8 {
        self.quality
    }

    pub fn submit(&mut self, frame: &Frame) -> Result<()> {
        let data = encode_jpeg(frame, self.quality)
            .with_context(|| format!("failed to encode frame {}", frame.sequence))?;
        let packet = EncodedPacket {
            sequence: frame.sequence,
            data,
        };
        if let Some(dropped) = self.queue.push(packet) {
            log::warn!(
                "MjpegEncoder: output queue full, dropped frame {}",
                dropped.sequence
            );
        }
        Ok(())
    }

    pub fn try_get(&mut self) -> Option<EncodedPacket> {
        self.queue.try_get()
    }

    /// Oldest queued packet. Encoding happens in `submit`, so this never waits; `None`
    /// means nothing has been submitted since the queue was last drained.
    pub fn get(&mut self) -> Option<EncodedPacket> {
        self.queue.try_get()
    }

    pub fn pending(&self) -> usize {
        self.queue.len()
    }
}

/// Encode `frame` as a baseline JPEG.
pub fn encode_jpeg(frame: &Frame, quality: u8) -> Result<Vec<u8>> {
    let mut data = Vec::new();
    JpegEncoder::new_with_quality(&mut data, check_quality(quality)?)
        .encode_image(frame.image())?;
    Ok(data)
}

pub(crate) fn check_quality(quality: u8) -> Result<u8> {
    if !(1..=100).contains(&quality) {
        return Err(anyhow!("jpeg quality must be in 1..=100, got {}", quality));
    }
    Ok(quality)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame(sequence: u64) -> Frame {
        Frame::from_rgb(vec![90u8; 8 * 6 * 3], 8, 6, sequence).unwrap()
    }

    #[test]
    fn packets_come_out_in_submission_order() -> Result<()> {
        let mut encoder = MjpegEncoder::new(80)?;
        encoder.submit(&frame(0))?;
        encoder.submit(&frame(1))?;
        assert_eq!(encoder.pending(), 2);

        let first = encoder.get().unwrap();
        assert_eq!(first.sequence, 0);
        assert_eq!(&first.data[..2], &[0xFF, 0xD8]);
        assert_eq!(encoder.try_get().map(|p| p.sequence), Some(1));
        assert!(encoder.get().is_none());
        Ok(())
    }

    #[test]
    fn full_queue_drops_oldest_packet() -> Result<()> {
        let mut encoder = MjpegEncoder::new(50)?;
        for sequence in 0..ENCODER_QUEUE_SIZE as u64 + 2 {
            encoder.submit(&frame(sequence))?;
        }
        assert_eq!(encoder.pending(), ENCODER_QUEUE_SIZE);
        assert_eq!(encoder.get().map(|p| p.sequence), Some(2));
        Ok(())
    }

    #[test]
    fn encoded_frame_decodes_to_same_size() -> Result<()> {
        let data = encode_jpeg(&frame(0), 90)?;
        let decoded = image::load_from_memory(&data)?;
        assert_eq!((decoded.width(), decoded.height()), (8, 6));
        assert!(encode_jpeg(&frame(0), 0).is_err());
        assert!(MjpegEncoder::new(101).is_err());
        Ok(())
    }
}
