use anyhow::{anyhow, Result};

/// Pixel layouts delivered by capture devices.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(not(feature = "ingest-v4l2"), allow(dead_code))]
pub(crate) enum PixelFormat {
    Rgb24,
    Bgr24,
    Yuyv,
}

/// Convert device pixels to packed RGB24.
#[cfg_attr(not(feature = "ingest-v4l2"), allow(dead_code))]
pub(crate) fn to_rgb24(
    pixels: &[u8],
    width: u32,
    height: u32,
    format: PixelFormat,
) -> Result<Vec<u8>> {
    let area = (width as usize)
        .checked_mul(height as usize)
        .ok_or_else(|| anyhow!("frame dimensions overflow"))?;
    let expected = match format {
        PixelFormat::Rgb24 | PixelFormat::Bgr24 => area * 3,
        PixelFormat::Yuyv => area * 2,
    };
    if pixels.len() < expected {
        return Err(anyhow!(
            "{:?} frame too short: expected {}, got {}",
            format,
            expected,
            pixels.len()
        ));
    }
    let pixels = &pixels[..expected];

    match format {
        PixelFormat::Rgb24 => Ok(pixels.to_vec()),
        PixelFormat::Bgr24 => Ok(pixels
            .chunks_exact(3)
            .flat_map(|bgr| [bgr[2], bgr[1], bgr[0]])
            .collect()),
        PixelFormat::Yuyv => Ok(yuyv_to_rgb(pixels, area)),
    }
}

// Two pixels per 4-byte macropixel: Y0 U Y1 V.
fn yuyv_to_rgb(pixels: &[u8], area: usize) -> Vec<u8> {
    let mut rgb = Vec::with_capacity(area * 3);
    for macro_px in pixels.chunks_exact(4) {
        let u = macro_px[1] as f32 - 128.0;
        let v = macro_px[3] as f32 - 128.0;
        for y in [macro_px[0], macro_px[2]] {
            let y = y as f32;
            rgb.push(clamp_to_u8(y + 1.402 * v));
            rgb.push(clamp_to_u8(y - 0.344_136 * u - 0.714_136 * v));
            rgb.push(clamp_to_u8(y + 1.772 * u));
        }
    }
    rgb
}

fn clamp_to_u8(value: f32) -> u8 {
    value.round().clamp(0.0, 255.0) as u8
}
