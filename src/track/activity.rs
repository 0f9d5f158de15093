//! Start/end reporting for a watched label.
//!
//! Counts frames since the last sighting. A sighting after at least one empty frame
//! starts an activity; the first empty frame after a sighting ends it.

use chrono::{DateTime, Duration, Local};

use super::tracker::Tracklet;
use crate::detect::Label;

#[derive(Debug, Clone, PartialEq)]
pub enum ActivityEvent {
    Started {
        tracklet_id: u32,
        label: Label,
        at: DateTime<Local>,
    },
    Ended {
        duration: Duration,
    },
}

pub struct ActivityMonitor {
    label: Label,
    idle_frames: u64,
    started_at: DateTime<Local>,
}

impl ActivityMonitor {
    pub fn new(label: Label) -> Self {
        Self {
            label,
            // Nothing seen yet: the first sighting starts an activity and an empty first
            // frame ends nothing.
            idle_frames: 1,
            started_at: Local::now(),
        }
    }

    pub fn label(&self) -> Label {
        self.label
    }

    pub fn is_active(&self) -> bool {
        self.idle_frames == 0
    }

    /// Feed one frame's tracklets observed at `now`.
    pub fn observe(
        &mut self,
        tracklets: &[Tracklet],
        now: DateTime<Local>,
    ) -> Vec<ActivityEvent> {
        let mut events = Vec::new();
        self.idle_frames += 1;

        let sighting = tracklets
            .iter()
            .find(|t| t.label == self.label && t.is_active());
        if let Some(tracklet) = sighting {
            if self.idle_frames != 1 {
                self.started_at = now;
                log::info!("Start: {} {} {}", tracklet.id, self.label, now);
                events.push(ActivityEvent::Started {
                    tracklet_id: tracklet.id,
                    label: self.label,
                    at: now,
                });
            }
            self.idle_frames = 0;
        }

        if self.idle_frames == 1 {
            let duration = now - self.started_at;
            log::info!("End: {}s", duration.num_seconds());
            events.push(ActivityEvent::Ended { duration });
        }
        events
    }
}
