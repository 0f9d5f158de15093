//! Framebuffer preview window.

use anyhow::{anyhow, Context, Result};
use minifb::{Key, Window, WindowOptions};

use super::{FrameSink, SinkControl};
use crate::frame::Frame;

pub struct WindowSink {
    title: String,
    window: Option<Window>,
    buffer: Vec<u32>,
    width: usize,
    height: usize,
}

impl WindowSink {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            window: None,
            buffer: Vec::new(),
            width: 0,
            height: 0,
        }
    }

    // minifb cannot resize an open window; recreate it when the frame size changes.
    fn ensure_window(&mut self, width: usize, height: usize) -> Result<&mut Window> {
        if self.window.is_none() || self.width != width || self.height != height {
            let window = Window::new(&self.title, width, height, WindowOptions::default())
                .map_err(|err| anyhow!("failed to open window '{}': {}", self.title, err))?;
            self.window = Some(window);
            self.width = width;
            self.height = height;
            self.buffer = vec![0u32; width * height];
        }
        self.window.as_mut().context("window not open")
    }
}

impl FrameSink for WindowSink {
    fn name(&self) -> &'static str {
        "window"
    }

    fn show(&mut self, frame: &Frame) -> Result<SinkControl> {
        let (width, height) = (frame.width() as usize, frame.height() as usize);
        self.ensure_window(width, height)?;
        rgb_to_0rgb(frame.pixels(), &mut self.buffer);

        let Some(window) = self.window.as_mut() else {
            return Ok(SinkControl::Quit);
        };
        if !window.is_open() || window.is_key_down(Key::Q) || window.is_key_down(Key::Escape) {
            return Ok(SinkControl::Quit);
        }
        window
            .update_with_buffer(&self.buffer, width, height)
            .map_err(|err| anyhow!("window update failed: {}", err))?;
        Ok(SinkControl::Continue)
    }

    fn write_encoded(&mut self, bytes: &[u8]) -> Result<()> {
        let image = image::load_from_memory(bytes)
            .context("decode image for display")?
            .to_rgb8();
        self.show(&Frame::from_image(image, 0)).map(|_| ())
    }
}

fn rgb_to_0rgb(src: &[u8], dst: &mut [u32]) {
    for (px, rgb) in dst.iter_mut().zip(src.chunks_exact(3)) {
        *px = (u32::from(rgb[0]) << 16) | (u32::from(rgb[1]) << 8) | u32::from(rgb[2]);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn packs_rgb_into_u32() {
        let mut dst = [0u32; 2];
        rgb_to_0rgb(&[0x12, 0x34, 0x56, 0, 0, 255], &mut dst);
        assert_eq!(dst, [0x0012_3456, 0x0000_00ff]);
    }
}
