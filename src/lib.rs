//! oakview: object-detection display pipelines.
//!
//! Frames come from a camera, video file, image directory or synthetic source, go
//! through an inference backend and come back as a flat result buffer. The buffer is
//! parsed into detections, filtered to one label above a confidence threshold, drawn
//! onto the frame and shown or saved.
//!
//! # Module Structure
//!
//! - `frame`: RGB frame buffer and pixel-space boxes
//! - `detect`: result buffer parsing, filtering, output queue, inference backends
//! - `ingest`: frame sources (synthetic, image directories, video files, V4L2)
//! - `render`: overlay drawing
//! - `encode`: host-side MJPEG encoder feeding pre-encoded frames to sinks
//! - `sink`: frame outputs (JPEG sequence, window, null)
//! - `track`: IoU tracker and activity start/end reporting
//! - `pipeline`: the display loop tying these together
//! - `config`: file and environment configuration
//! - `cli`: backend and sink selection shared by the binaries

pub mod cli;
pub mod config;
pub mod detect;
pub mod encode;
pub mod frame;
pub mod ingest;
pub mod pipeline;
pub mod render;
pub mod sink;
pub mod track;

pub use config::ViewerConfig;
pub use detect::{
    parse_detections, Detection, DetectionFilter, DetectorBackend, Label, NnPacket, NormBox,
    OutputQueue, ReplayBackend, StubBackend,
};
pub use encode::{EncodedPacket, MjpegEncoder};
pub use frame::{Frame, PixelBox};
pub use ingest::{open_source, FrameSource, SourceStats};
pub use pipeline::{DisplayLoop, LoopState, LoopSummary, ResultMode, StalePolicy, StopReason};
pub use render::OverlayStyle;
pub use sink::{FrameSink, JpegSequenceSink, NullSink, SinkControl};
pub use track::{ActivityEvent, ActivityMonitor, TrackStatus, Tracker, TrackerConfig, Tracklet};
