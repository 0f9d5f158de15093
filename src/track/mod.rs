//! Object tracking over per-frame detections.

mod activity;
mod tracker;

pub use activity::{ActivityEvent, ActivityMonitor};
pub use tracker::{TrackStatus, Tracker, TrackerConfig, Tracklet};
