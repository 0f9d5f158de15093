use anyhow::Result;

use crate::frame::Frame;

/// Default network input edge (MobileNet-SSD takes 300x300).
pub const DEFAULT_INPUT_SIZE: u32 = 300;

/// One inference result: the first output layer, flattened.
#[derive(Clone, Debug, PartialEq)]
pub struct NnPacket {
    /// Sequence number of the frame this result belongs to.
    pub sequence: u64,
    pub layer: Vec<f32>,
}

/// Inference backend.
///
/// Frames go in through `submit`; results come back through an output queue read with
/// `try_get` (non-blocking) or `get` (blocking). A backend may lag behind submissions, so
/// callers must not assume a result per frame.
pub trait DetectorBackend {
    /// Backend identifier.
    fn name(&self) -> &'static str;

    /// Network input size `(width, height)`.
    fn input_size(&self) -> (u32, u32) {
        (DEFAULT_INPUT_SIZE, DEFAULT_INPUT_SIZE)
    }

    /// Send a frame for inference.
    fn submit(&mut self, frame: &Frame) -> Result<()>;

    /// Return the next ready result without waiting.
    fn try_get(&mut self) -> Result<Option<NnPacket>>;

    /// Return the newest ready result, discarding older ones, without waiting.
    fn try_get_latest(&mut self) -> Result<Option<NnPacket>> {
        let mut latest = None;
        while let Some(packet) = self.try_get()? {
            latest = Some(packet);
        }
        Ok(latest)
    }

    /// Wait for the next result. `Ok(None)` means the backend can produce nothing more.
    fn get(&mut self) -> Result<Option<NnPacket>>;

    /// Optional warm-up hook.
    fn warm_up(&mut self) -> Result<()> {
        Ok(())
    }
}

