mod backend;
mod backends;
mod buffer;
mod filter;
mod queue;
mod result;

pub use backend::{DetectorBackend, NnPacket, DEFAULT_INPUT_SIZE};
#[cfg(feature = "backend-tract")]
pub use backends::TractBackend;
pub use backends::{ReplayBackend, StubBackend};
pub use buffer::{parse_detections, sentinel_position, RECORD_LEN, SENTINEL};
pub use filter::DetectionFilter;
pub use queue::{OutputQueue, DEFAULT_QUEUE_SIZE};
pub use result::{Detection, Label, NormBox};
