//! Greedy IoU tracker.
//!
//! Each frame, candidate pairs (tracklet, detection) with the same label and IoU at or
//! above `min_iou` are matched greedily by descending IoU. Matched tracklets are
//! `TRACKED`; unmatched ones become `LOST` and are dropped after `max_lost_frames`.
//! Unmatched detections open new tracklets while fewer than `max_tracklets` exist.

use crate::detect::{Detection, Label};
use crate::frame::{Frame, PixelBox};

#[derive(Debug, Clone, PartialEq)]
pub struct TrackerConfig {
    pub max_tracklets: usize,
    /// Detections at or below this confidence are not tracked.
    pub confidence_threshold: f32,
    pub min_iou: f32,
    pub max_lost_frames: u32,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            max_tracklets: 20,
            confidence_threshold: 0.9,
            min_iou: 0.3,
            max_lost_frames: 10,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrackStatus {
    Tracked,
    Lost,
}

impl TrackStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Tracked => "TRACKED",
            Self::Lost => "LOST",
        }
    }
}

/// A tracked object's per-frame state.
#[derive(Debug, Clone, PartialEq)]
pub struct Tracklet {
    pub id: u32,
    pub label: Label,
    pub status: TrackStatus,
    /// Last matched position, in pixels of the frame it was observed in.
    pub bbox: PixelBox,
    pub confidence: f32,
    /// Frames since the tracklet was opened.
    pub age: u32,
    /// Consecutive frames without a matching detection.
    pub lost_frames: u32,
}

impl Tracklet {
    pub fn is_active(&self) -> bool {
        self.status != TrackStatus::Lost
    }
}

pub struct Tracker {
    config: TrackerConfig,
    tracklets: Vec<Tracklet>,
    next_id: u32,
}

impl Tracker {
    pub fn new(config: TrackerConfig) -> Self {
        Self {
            config,
            tracklets: Vec::with_capacity(32),
            next_id: 0,
        }
    }

    pub fn config(&self) -> &TrackerConfig {
        &self.config
    }

    pub fn tracklets(&self) -> &[Tracklet] {
        &self.tracklets
    }

    /// Advance one frame. `detections` are normalized, scaled against `frame` and clamped
    /// to its bounds.
    pub fn update(&mut self, frame: &Frame, detections: &[Detection]) -> &[Tracklet] {
        let (width, height) = (frame.width(), frame.height());
        let observed: Vec<(Label, PixelBox, f32)> = detections
            .iter()
            .filter(|d| d.confidence > self.config.confidence_threshold)
            .map(|d| {
                let bbox = frame.denormalize(&d.bbox).clamp_to(width, height);
                (d.label, bbox, d.confidence)
            })
            .collect();
        self.update_pixels(&observed)
    }

    /// Advance one frame with detections already in pixel space.
    pub fn update_pixels(&mut self, observed: &[(Label, PixelBox, f32)]) -> &[Tracklet] {
        let mut track_matched = vec![false; self.tracklets.len()];
        let mut det_matched = vec![false; observed.len()];

        let mut pairs: Vec<(usize, usize, f32)> = Vec::new();
        for (ti, tracklet) in self.tracklets.iter().enumerate() {
            for (di, (label, bbox, _)) in observed.iter().enumerate() {
                if tracklet.label != *label {
                    continue;
                }
                let score = tracklet.bbox.iou(bbox);
                if score >= self.config.min_iou {
                    pairs.push((ti, di, score));
                }
            }
        }
        pairs.sort_by(|a, b| b.2.partial_cmp(&a.2).unwrap_or(std::cmp::Ordering::Equal));

        for (ti, di, _) in pairs {
            if track_matched[ti] || det_matched[di] {
                continue;
            }
            track_matched[ti] = true;
            det_matched[di] = true;
            let (_, bbox, confidence) = observed[di];
            let tracklet = &mut self.tracklets[ti];
            tracklet.bbox = bbox;
            tracklet.confidence = confidence;
            tracklet.status = TrackStatus::Tracked;
            tracklet.lost_frames = 0;
        }

        for (tracklet, matched) in self.tracklets.iter_mut().zip(&track_matched) {
            tracklet.age += 1;
            if !matched {
                tracklet.status = TrackStatus::Lost;
                tracklet.lost_frames += 1;
            }
        }

        let max_lost = self.config.max_lost_frames;
        self.tracklets.retain(|t| t.lost_frames <= max_lost);

        for (di, (label, bbox, confidence)) in observed.iter().enumerate() {
            if det_matched[di] {
                continue;
            }
            if self.tracklets.len() >= self.config.max_tracklets {
                log::debug!("tracker full ({} tracklets), detection ignored", self.tracklets.len());
                break;
            }
            self.tracklets.push(Tracklet {
                id: self.next_id,
                label: *label,
                status: TrackStatus::Tracked,
                bbox: *bbox,
                confidence: *confidence,
                age: 1,
                lost_frames: 0,
            });
            self.next_id += 1;
        }

        &self.tracklets
    }
}

impl Default for Tracker {
    fn default() -> Self {
        Self::new(TrackerConfig::default())
    }
}
