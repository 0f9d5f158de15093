//! Frame buffers and coordinate spaces.
//!
//! - `Frame`: packed RGB24 pixels plus dimensions. Replaced every loop iteration.
//! - `PixelBox`: a rectangle in the pixel space of one particular frame.
//!
//! Detections travel through the crate in normalized 0..1 coordinates. The only way to
//! turn them into pixels is `Frame::denormalize`, which always uses the dimensions of the
//! frame being drawn on, so a box can never be scaled against a stale frame size.

use anyhow::{anyhow, Context, Result};
use image::{imageops::FilterType, RgbImage};

use crate::detect::NormBox;

/// Single RGB24 image buffer.
#[derive(Clone, Debug)]
pub struct Frame {
    image: RgbImage,
    /// Index of this frame within its source (0-based).
    pub sequence: u64,
}

impl Frame {
    /// Wrap packed RGB24 bytes. Fails if the length does not match `width * height * 3`.
    pub fn from_rgb(pixels: Vec<u8>, width: u32, height: u32, sequence: u64) -> Result<Self> {
        let expected = width
            .checked_mul(height)
            .and_then(|v| v.checked_mul(3))
            .ok_or_else(|| anyhow!("frame dimensions overflow"))? as usize;
        if pixels.len() != expected {
            return Err(anyhow!(
                "RGB frame length mismatch: expected {}, got {}",
                expected,
                pixels.len()
            ));
        }
        let image = RgbImage::from_raw(width, height, pixels)
            .context("RGB buffer does not fit frame dimensions")?;
        Ok(Self { image, sequence })
    }

    pub fn from_image(image: RgbImage, sequence: u64) -> Self {
        Self { image, sequence }
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    pub fn pixels(&self) -> &[u8] {
        self.image.as_raw()
    }

    pub fn image(&self) -> &RgbImage {
        &self.image
    }

    pub fn image_mut(&mut self) -> &mut RgbImage {
        &mut self.image
    }

    pub fn into_image(self) -> RgbImage {
        self.image
    }

    /// Scale a normalized box to this frame's pixel space.
    ///
    /// Coordinates are truncated toward zero, matching an `astype(int)` cast.
    pub fn denormalize(&self, bbox: &NormBox) -> PixelBox {
        let w = self.width() as f32;
        let h = self.height() as f32;
        PixelBox {
            left: (bbox.x_min * w) as i32,
            top: (bbox.y_min * h) as i32,
            right: (bbox.x_max * w) as i32,
            bottom: (bbox.y_max * h) as i32,
        }
    }

    /// Inverse of `denormalize` for this frame's dimensions.
    pub fn normalize(&self, bbox: &PixelBox) -> NormBox {
        let w = self.width() as f32;
        let h = self.height() as f32;
        NormBox {
            x_min: bbox.left as f32 / w,
            y_min: bbox.top as f32 / h,
            x_max: bbox.right as f32 / w,
            y_max: bbox.bottom as f32 / h,
        }
    }

    /// Resize to the network input and lay the channels out planar (CHW).
    ///
    /// Channel order is preserved; values stay in 0..=255.
    pub fn to_planar(&self, width: u32, height: u32) -> Vec<f32> {
        let resized;
        let source = if self.width() == width && self.height() == height {
            &self.image
        } else {
            resized = image::imageops::resize(&self.image, width, height, FilterType::Triangle);
            &resized
        };

        let plane = (width as usize) * (height as usize);
        let mut planar = vec![0f32; plane * 3];
        for (idx, pixel) in source.pixels().enumerate() {
            planar[idx] = pixel[0] as f32;
            planar[plane + idx] = pixel[1] as f32;
            planar[2 * plane + idx] = pixel[2] as f32;
        }
        planar
    }
}

/// Rectangle in pixel coordinates of a specific frame.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PixelBox {
    pub left: i32,
    pub top: i32,
    pub right: i32,
    pub bottom: i32,
}

impl PixelBox {
    pub fn new(left: i32, top: i32, right: i32, bottom: i32) -> Self {
        Self {
            left,
            top,
            right,
            bottom,
        }
    }

    pub fn width(&self) -> i32 {
        span(self.left, self.right)
    }

    pub fn height(&self) -> i32 {
        span(self.top, self.bottom)
    }

    /// Pixels inside the box.
    pub fn area(&self) -> i64 {
        self.width() as i64 * self.height() as i64
    }

    pub fn centroid(&self) -> (i32, i32) {
        (midpoint(self.left, self.right), midpoint(self.top, self.bottom))
    }

    /// Clamp the box to `[0, width] x [0, height]`.
    pub fn clamp_to(&self, width: u32, height: u32) -> PixelBox {
        let w = i32::try_from(width).unwrap_or(i32::MAX);
        let h = i32::try_from(height).unwrap_or(i32::MAX);
        PixelBox::new(
            self.left.clamp(0, w),
            self.top.clamp(0, h),
            self.right.clamp(0, w),
            self.bottom.clamp(0, h),
        )
    }

    /// Intersection over union with another box. Zero when either box is empty.
    pub fn iou(&self, other: &PixelBox) -> f32 {
        let left = self.left.max(other.left);
        let top = self.top.max(other.top);
        let right = self.right.min(other.right);
        let bottom = self.bottom.min(other.bottom);

        let inter = span(left, right) as i64 * span(top, bottom) as i64;
        if inter == 0 {
            return 0.0;
        }
        let union = self.area() + other.area() - inter;
        if union > 0 {
            inter as f32 / union as f32
        } else {
            0.0
        }
    }
}

/// Non-negative extent of `[start, end]`, saturating at `i32::MAX`.
fn span(start: i32, end: i32) -> i32 {
    (end as i64 - start as i64).clamp(0, i32::MAX as i64) as i32
}

fn midpoint(a: i32, b: i32) -> i32 {
    (a as i64 + (b as i64 - a as i64) / 2) as i32
}
