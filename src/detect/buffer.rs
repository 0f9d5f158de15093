//! Flat inference result decoding.
//!
//! The network emits its first output layer as a flat run of floats: seven per
//! detection, `[image_id, label, confidence, x_min, y_min, x_max, y_max]`, with the last
//! record followed by a `-1` in the `image_id` slot. The device zero-fills whatever
//! follows the sentinel.

use anyhow::{anyhow, bail, Result};

use super::result::{Detection, Label, NormBox};

/// Floats per detection record.
pub const RECORD_LEN: usize = 7;

/// End-of-data marker.
pub const SENTINEL: f32 = -1.0;

/// Length of the record-aligned prefix that precedes the sentinel, if any.
pub fn sentinel_position(layer: &[f32]) -> Option<usize> {
    layer
        .iter()
        .step_by(RECORD_LEN)
        .position(|&v| v == SENTINEL)
        .map(|record| record * RECORD_LEN)
}

/// Decode a flat result layer into detection records.
///
/// Fails when the sentinel is missing or a label index is outside the label set.
pub fn parse_detections(layer: &[f32]) -> Result<Vec<Detection>> {
    let end = sentinel_position(layer).ok_or_else(|| {
        anyhow!(
            "result layer of {} values has no sentinel terminator",
            layer.len()
        )
    })?;

    layer[..end]
        .chunks_exact(RECORD_LEN)
        .enumerate()
        .map(|(idx, record)| parse_record(idx, record))
        .collect()
}

fn parse_record(idx: usize, record: &[f32]) -> Result<Detection> {
    let label_raw = record[1];
    if label_raw < 0.0 || label_raw.fract() != 0.0 {
        bail!("record {}: invalid label index {}", idx, label_raw);
    }
    let label = Label::from_index(label_raw as usize)
        .ok_or_else(|| anyhow!("record {}: label index {} out of range", idx, label_raw))?;

    Ok(Detection {
        image_id: record[0].max(0.0) as u32,
        label,
        confidence: record[2],
        bbox: NormBox {
            x_min: record[3],
            y_min: record[4],
            x_max: record[5],
            y_max: record[6],
        },
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(label: f32, confidence: f32) -> [f32; RECORD_LEN] {
        [0.0, label, confidence, 0.1, 0.2, 0.3, 0.4]
    }

    #[test]
    fn n_records_before_sentinel_yield_n_detections() -> Result<()> {
        for n in 0..6 {
            let mut layer = Vec::new();
            for i in 0..n {
                layer.extend_from_slice(&record((i % 21) as f32, 0.5));
            }
            layer.push(SENTINEL);
            assert_eq!(layer.len(), RECORD_LEN * n + 1);
            assert_eq!(parse_detections(&layer)?.len(), n);
        }
        Ok(())
    }

    #[test]
    fn decodes_all_fields() -> Result<()> {
        let layer = [0.0, 15.0, 0.9, 0.1, 0.1, 0.5, 0.5, -1.0];
        let detections = parse_detections(&layer)?;
        assert_eq!(detections.len(), 1);
        let det = &detections[0];
        assert_eq!(det.image_id, 0);
        assert_eq!(det.label, Label::Person);
        assert_eq!(det.confidence, 0.9);
        assert_eq!(det.bbox.x_min, 0.1);
        assert_eq!(det.bbox.y_max, 0.5);
        Ok(())
    }

    #[test]
    fn zero_fill_after_sentinel_is_ignored() -> Result<()> {
        let mut layer = record(15.0, 0.8).to_vec();
        layer.push(SENTINEL);
        layer.extend(std::iter::repeat(0.0).take(RECORD_LEN * 3 - 1));
        assert_eq!(parse_detections(&layer)?.len(), 1);
        Ok(())
    }

    #[test]
    fn sentinel_is_only_recognised_in_image_id_slot() -> Result<()> {
        // A -1 inside a record (here x_min) is not the terminator.
        let mut layer = vec![0.0, 15.0, 0.8, -1.0, 0.2, 0.3, 0.4];
        layer.push(SENTINEL);
        let detections = parse_detections(&layer)?;
        assert_eq!(detections.len(), 1);
        assert_eq!(detections[0].bbox.x_min, -1.0);
        Ok(())
    }

    #[test]
    fn missing_sentinel_is_an_error() {
        let layer = record(15.0, 0.9);
        assert!(parse_detections(&layer).is_err());
        assert!(parse_detections(&[]).is_err());
    }

    #[test]
    fn out_of_range_label_is_an_error() {
        let mut layer = record(21.0, 0.9).to_vec();
        layer.push(SENTINEL);
        assert!(parse_detections(&layer).is_err());

        let mut layer = record(2.5, 0.9).to_vec();
        layer.push(SENTINEL);
        assert!(parse_detections(&layer).is_err());
    }

    #[test]
    fn empty_result_is_just_the_sentinel() -> Result<()> {
        assert!(parse_detections(&[SENTINEL])?.is_empty());
        Ok(())
    }
}
