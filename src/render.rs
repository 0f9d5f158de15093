//! Overlay drawing.
//!
//! Detections are scaled to the frame they are drawn on at draw time; tracklets are
//! already in pixel space.

use std::path::Path;

use ab_glyph::{FontArc, PxScale};
use anyhow::{Context, Result};
use image::Rgb;
use imageproc::drawing::{draw_filled_circle_mut, draw_hollow_rect_mut, draw_text_mut};
use imageproc::rect::Rect;

use crate::detect::Detection;
use crate::frame::{Frame, PixelBox};
use crate::track::Tracklet;

/// Overlay colour: pure blue.
pub const DEFAULT_COLOR: [u8; 3] = [0, 0, 255];

/// How overlays are drawn.
#[derive(Clone)]
pub struct OverlayStyle {
    pub color: [u8; 3],
    /// Rectangle outline width in pixels.
    pub thickness: u32,
    /// Font for tracklet annotations. Without one, only shapes are drawn.
    pub font: Option<FontArc>,
    pub text_scale: f32,
}

impl Default for OverlayStyle {
    fn default() -> Self {
        Self {
            color: DEFAULT_COLOR,
            thickness: 2,
            font: None,
            text_scale: 16.0,
        }
    }
}

impl OverlayStyle {
    /// Load a TrueType/OpenType font for annotations.
    pub fn with_font_file<P: AsRef<Path>>(mut self, path: P) -> Result<Self> {
        let path = path.as_ref();
        let bytes = std::fs::read(path)
            .with_context(|| format!("failed to read font {}", path.display()))?;
        let font = FontArc::try_from_vec(bytes)
            .with_context(|| format!("invalid font file {}", path.display()))?;
        self.font = Some(font);
        Ok(self)
    }
}

/// Draw each detection as a rectangle scaled to `frame`. Returns the number drawn.
pub fn draw_detections(
    frame: &mut Frame,
    detections: &[Detection],
    style: &OverlayStyle,
) -> usize {
    let mut drawn = 0;
    for detection in detections {
        let bbox = frame.denormalize(&detection.bbox);
        if draw_box(frame, &bbox, style) {
            drawn += 1;
        }
    }
    drawn
}

/// Draw tracklets: box, centroid dot, and if a font is set the id, label and status.
pub fn draw_tracklets(
    frame: &mut Frame,
    tracklets: &[&Tracklet],
    style: &OverlayStyle,
) -> usize {
    let color = Rgb(style.color);
    let mut drawn = 0;
    for tracklet in tracklets {
        let bbox = tracklet.bbox.clamp_to(frame.width(), frame.height());
        if !draw_box(frame, &bbox, style) {
            continue;
        }
        drawn += 1;
        let centroid = bbox.centroid();
        draw_filled_circle_mut(frame.image_mut(), centroid, 1, color);

        let Some(font) = style.font.as_ref() else {
            continue;
        };
        let scale = PxScale::from(style.text_scale);
        let image = frame.image_mut();
        draw_text_mut(
            image,
            color,
            centroid.0,
            centroid.1,
            scale,
            font,
            &format!("ID {}", tracklet.id),
        );
        draw_text_mut(
            image,
            color,
            bbox.left,
            bbox.bottom - 40,
            scale,
            font,
            tracklet.label.name(),
        );
        draw_text_mut(
            image,
            color,
            bbox.left,
            bbox.bottom - 20,
            scale,
            font,
            tracklet.status.as_str(),
        );
    }
    drawn
}

/// Outline `bbox` with `style.thickness` nested rectangles, clipped to the frame.
/// Returns false when nothing of the box is visible.
fn draw_box(frame: &mut Frame, bbox: &PixelBox, style: &OverlayStyle) -> bool {
    let Some(clipped) = clip(bbox, frame.width(), frame.height()) else {
        return false;
    };
    let color = Rgb(style.color);
    for inset in 0..style.thickness.max(1) as i32 {
        let width = clipped.width() - 2 * inset;
        let height = clipped.height() - 2 * inset;
        if width <= 0 || height <= 0 {
            break;
        }
        let rect = Rect::at(clipped.left + inset, clipped.top + inset)
            .of_size(width as u32, height as u32);
        draw_hollow_rect_mut(frame.image_mut(), rect, color);
    }
    true
}

fn clip(bbox: &PixelBox, width: u32, height: u32) -> Option<PixelBox> {
    let clipped = bbox.clamp_to(width, height);
    (clipped.width() > 0 && clipped.height() > 0).then_some(clipped)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detect::{Label, NormBox};
    use crate::track::TrackStatus;

    fn black_frame(width: u32, height: u32) -> Frame {
        Frame::from_rgb(vec![0u8; (width * height * 3) as usize], width, height, 0).unwrap()
    }

    fn person(x_min: f32, y_min: f32, x_max: f32, y_max: f32) -> Detection {
        Detection {
            image_id: 0,
            label: Label::Person,
            confidence: 0.9,
            bbox: NormBox {
                x_min,
                y_min,
                x_max,
                y_max,
            },
        }
    }

    #[test]
    fn draws_outline_at_denormalized_position() {
        let mut frame = black_frame(100, 100);
        let style = OverlayStyle::default();
        let drawn = draw_detections(&mut frame, &[person(0.1, 0.1, 0.5, 0.5)], &style);
        assert_eq!(drawn, 1);

        let image = frame.image();
        assert_eq!(image.get_pixel(10, 10), &Rgb(DEFAULT_COLOR));
        assert_eq!(image.get_pixel(11, 11), &Rgb(DEFAULT_COLOR));
        assert_eq!(image.get_pixel(30, 30), &Rgb([0, 0, 0]));
        assert_eq!(image.get_pixel(5, 5), &Rgb([0, 0, 0]));
    }

    #[test]
    fn offscreen_boxes_are_skipped() {
        let mut frame = black_frame(50, 50);
        let style = OverlayStyle::default();
        let drawn = draw_detections(&mut frame, &[person(1.2, 1.2, 1.5, 1.5)], &style);
        assert_eq!(drawn, 0);
    }

    #[test]
    fn partially_visible_boxes_are_clipped() {
        let mut frame = black_frame(50, 50);
        let style = OverlayStyle::default();
        let drawn = draw_detections(&mut frame, &[person(-0.2, 0.5, 0.4, 1.4)], &style);
        assert_eq!(drawn, 1);
        assert_eq!(frame.image().get_pixel(0, 30), &Rgb(DEFAULT_COLOR));
    }

    #[test]
    fn tracklets_get_box_and_centroid() {
        let mut frame = black_frame(60, 60);
        let tracklet = Tracklet {
            id: 3,
            label: Label::Person,
            status: TrackStatus::Tracked,
            bbox: PixelBox::new(10, 10, 50, 50),
            confidence: 0.95,
            age: 1,
            lost_frames: 0,
        };
        let drawn = draw_tracklets(&mut frame, &[&tracklet], &OverlayStyle::default());
        assert_eq!(drawn, 1);
        assert_eq!(frame.image().get_pixel(30, 30), &Rgb(DEFAULT_COLOR));
        assert_eq!(frame.image().get_pixel(10, 30), &Rgb(DEFAULT_COLOR));
    }

    #[test]
    fn saturated_tracklet_is_drawn_at_the_frame_edge() {
        let mut frame = black_frame(40, 30);
        let tracklet = Tracklet {
            id: 0,
            label: Label::Person,
            status: TrackStatus::Tracked,
            bbox: PixelBox::new(i32::MIN, i32::MIN, i32::MAX, i32::MAX),
            confidence: 0.95,
            age: 1,
            lost_frames: 0,
        };
        let drawn = draw_tracklets(&mut frame, &[&tracklet], &OverlayStyle::default());
        assert_eq!(drawn, 1);
        assert_eq!(frame.image().get_pixel(0, 15), &Rgb(DEFAULT_COLOR));
        assert_eq!(frame.image().get_pixel(20, 15), &Rgb(DEFAULT_COLOR));
    }
}
