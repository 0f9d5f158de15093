//! Detection display loop.
//!
//! One iteration: read a frame, submit it for inference, fetch the newest result, filter
//! it, draw the overlay and hand the frame to the sink. The loop is single-threaded; the
//! only cross-thread input is the interrupt flag set by a signal handler.
//!
//! With an encoder attached, finished frames are JPEG-encoded and the packets read from
//! the encoder queue go to [`FrameSink::write_encoded`] instead of `show`.

use std::fmt;
use std::str::FromStr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use anyhow::{anyhow, Result};
use serde::Deserialize;

use crate::detect::{parse_detections, Detection, DetectionFilter, DetectorBackend, NnPacket};
use crate::encode::MjpegEncoder;
use crate::frame::Frame;
use crate::ingest::FrameSource;
use crate::render::{draw_detections, draw_tracklets, OverlayStyle};
use crate::sink::{FrameSink, SinkControl};
use crate::track::{ActivityEvent, ActivityMonitor, Tracker, Tracklet};

/// What to draw when an iteration brings no usable result.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum StalePolicy {
    /// Keep drawing the last result until a new one arrives.
    #[default]
    CarryForward,
    /// Draw nothing until a new result arrives.
    ClearOnMiss,
    /// Like `CarryForward`; a result with no surviving detections also keeps the overlay.
    HoldLastHit,
}

impl StalePolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::CarryForward => "carry-forward",
            Self::ClearOnMiss => "clear-on-miss",
            Self::HoldLastHit => "hold-last-hit",
        }
    }
}

impl fmt::Display for StalePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StalePolicy {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "carry-forward" => Ok(Self::CarryForward),
            "clear-on-miss" => Ok(Self::ClearOnMiss),
            "hold-last-hit" => Ok(Self::HoldLastHit),
            other => Err(anyhow!(
                "unknown stale policy '{}' (expected carry-forward, clear-on-miss or hold-last-hit)",
                other
            )),
        }
    }
}

/// How results are fetched from the backend and the encoder each iteration.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ResultMode {
    /// Take whatever is ready, possibly nothing.
    #[default]
    Poll,
    /// Wait for the next result.
    Block,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    EndOfStream,
    Quit,
    Interrupted,
    FrameLimit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopState {
    Running,
    Stopped(StopReason),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoopSummary {
    pub frames: u64,
    pub results: u64,
    /// Iterations without a usable result (nothing ready, or a malformed packet).
    pub misses: u64,
    pub detections_drawn: u64,
    /// Encoded packets handed to the sink.
    pub encoded: u64,
    pub stop: StopReason,
}

struct Tracking {
    tracker: Tracker,
    monitor: ActivityMonitor,
}

pub struct DisplayLoop {
    source: Box<dyn FrameSource>,
    backend: Option<Box<dyn DetectorBackend>>,
    sink: Box<dyn FrameSink>,
    filter: DetectionFilter,
    policy: StalePolicy,
    mode: ResultMode,
    style: OverlayStyle,
    tracking: Option<Tracking>,
    encoder: Option<MjpegEncoder>,
    interrupt: Arc<AtomicBool>,
    max_frames: Option<u64>,
    overlay: Vec<Detection>,
    events: Vec<ActivityEvent>,
    state: LoopState,
    frames: u64,
    results: u64,
    misses: u64,
    detections_drawn: u64,
    encoded: u64,
}

impl DisplayLoop {
    /// A loop that passes frames from `source` to `sink`. Add a backend to detect.
    pub fn new(source: Box<dyn FrameSource>, sink: Box<dyn FrameSink>) -> Self {
        Self {
            source,
            backend: None,
            sink,
            filter: DetectionFilter::default(),
            policy: StalePolicy::default(),
            mode: ResultMode::default(),
            style: OverlayStyle::default(),
            tracking: None,
            encoder: None,
            interrupt: Arc::new(AtomicBool::new(false)),
            max_frames: None,
            overlay: Vec::new(),
            events: Vec::new(),
            state: LoopState::Running,
            frames: 0,
            results: 0,
            misses: 0,
            detections_drawn: 0,
            encoded: 0,
        }
    }

    pub fn with_backend(mut self, backend: Box<dyn DetectorBackend>) -> Self {
        self.backend = Some(backend);
        self
    }

    pub fn with_filter(mut self, filter: DetectionFilter) -> Self {
        self.filter = filter;
        self
    }

    pub fn with_policy(mut self, policy: StalePolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_result_mode(mut self, mode: ResultMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_style(mut self, style: OverlayStyle) -> Self {
        self.style = style;
        self
    }

    /// Draw tracklets instead of raw detections and report activity for the monitor's label.
    pub fn with_tracking(mut self, tracker: Tracker, monitor: ActivityMonitor) -> Self {
        self.tracking = Some(Tracking { tracker, monitor });
        self
    }

    /// Encode each finished frame and store the packets through `write_encoded`.
    pub fn with_encoder(mut self, encoder: MjpegEncoder) -> Self {
        self.encoder = Some(encoder);
        self
    }

    /// Flag polled once per iteration; set it to stop with [`StopReason::Interrupted`].
    pub fn with_interrupt(mut self, interrupt: Arc<AtomicBool>) -> Self {
        self.interrupt = interrupt;
        self
    }

    pub fn with_max_frames(mut self, max_frames: u64) -> Self {
        self.max_frames = Some(max_frames);
        self
    }

    pub fn state(&self) -> LoopState {
        self.state
    }

    /// Detections currently drawn on each frame.
    pub fn overlay(&self) -> &[Detection] {
        &self.overlay
    }

    /// Activity events reported since the last call.
    pub fn take_events(&mut self) -> Vec<ActivityEvent> {
        std::mem::take(&mut self.events)
    }

    pub fn summary(&self) -> LoopSummary {
        LoopSummary {
            frames: self.frames,
            results: self.results,
            misses: self.misses,
            detections_drawn: self.detections_drawn,
            encoded: self.encoded,
            stop: match self.state {
                LoopState::Stopped(reason) => reason,
                LoopState::Running => StopReason::Interrupted,
            },
        }
    }

    /// Connect the source, warm up the backend and iterate until stopped.
    pub fn run(&mut self) -> Result<LoopSummary> {
        self.source.connect()?;
        if let Some(backend) = self.backend.as_mut() {
            backend.warm_up()?;
            log::info!(
                "DisplayLoop: backend {} ({}x{} input), stale policy {}",
                backend.name(),
                backend.input_size().0,
                backend.input_size().1,
                self.policy
            );
        }

        while self.step()? == LoopState::Running {}

        let summary = self.summary();
        let stats = self.source.stats();
        log::info!(
            "DisplayLoop: stopped ({:?}) after {} frames from {}: {} results, {} misses, {} boxes drawn, {} encoded",
            summary.stop,
            summary.frames,
            stats.uri,
            summary.results,
            summary.misses,
            summary.detections_drawn,
            summary.encoded
        );
        Ok(summary)
    }

    /// Run one iteration. The source must already be connected.
    pub fn step(&mut self) -> Result<LoopState> {
        if let LoopState::Stopped(_) = self.state {
            return Ok(self.state);
        }
        if self.interrupt.load(Ordering::SeqCst) {
            return Ok(self.stop(StopReason::Interrupted));
        }
        if self.max_frames.is_some_and(|limit| self.frames >= limit) {
            return Ok(self.stop(StopReason::FrameLimit));
        }

        let Some(mut frame) = self.source.next_frame()? else {
            return Ok(self.stop(StopReason::EndOfStream));
        };

        if self.backend.is_some() {
            let packet = self.fetch_result(&frame)?;
            self.update_overlay(packet);
        }

        self.draw(&mut frame);
        self.frames += 1;

        if let Some(encoder) = self.encoder.as_mut() {
            encoder.submit(&frame)?;
            let packets: Vec<_> = match self.mode {
                ResultMode::Block => encoder.get().into_iter().collect(),
                ResultMode::Poll => std::iter::from_fn(|| encoder.try_get()).collect(),
            };
            for packet in packets {
                self.sink.write_encoded(&packet.data)?;
                self.encoded += 1;
            }
            return Ok(self.state);
        }

        if self.sink.show(&frame)? == SinkControl::Quit {
            return Ok(self.stop(StopReason::Quit));
        }
        Ok(self.state)
    }

    fn stop(&mut self, reason: StopReason) -> LoopState {
        self.state = LoopState::Stopped(reason);
        self.state
    }

    fn fetch_result(&mut self, frame: &Frame) -> Result<Option<NnPacket>> {
        let Some(backend) = self.backend.as_mut() else {
            return Ok(None);
        };
        backend.submit(frame)?;
        match self.mode {
            ResultMode::Block => backend.get(),
            ResultMode::Poll => backend.try_get_latest(),
        }
    }

    fn update_overlay(&mut self, packet: Option<NnPacket>) {
        let detections = packet.and_then(|packet| match parse_detections(&packet.layer) {
            Ok(detections) => Some(detections),
            Err(err) => {
                log::warn!(
                    "DisplayLoop: dropping malformed result for frame {}: {:#}",
                    packet.sequence,
                    err
                );
                None
            }
        });

        let Some(detections) = detections else {
            self.misses += 1;
            if self.policy == StalePolicy::ClearOnMiss {
                self.overlay.clear();
            }
            return;
        };

        self.results += 1;
        let kept = self.filter.apply(&detections);
        for detection in &kept {
            log::info!("{} {:.2}", detection.label, detection.confidence);
        }
        if kept.is_empty() && self.policy == StalePolicy::HoldLastHit {
            return;
        }
        self.overlay = kept;
    }

    fn draw(&mut self, frame: &mut Frame) {
        match self.tracking.as_mut() {
            Some(tracking) => {
                let label = tracking.monitor.label();
                let tracklets = tracking.tracker.update(frame, &self.overlay);
                let visible: Vec<&Tracklet> = tracklets
                    .iter()
                    .filter(|t| t.label == label && t.is_active())
                    .collect();
                let drawn = draw_tracklets(frame, &visible, &self.style);
                self.detections_drawn += drawn as u64;
                let events = tracking.monitor.observe(tracklets, chrono::Local::now());
                self.events.extend(events);
            }
            None => {
                let drawn = draw_detections(frame, &self.overlay, &self.style);
                self.detections_drawn += drawn as u64;
            }
        }
    }
}
