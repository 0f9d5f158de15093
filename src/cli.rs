//! Helpers shared by the binaries: backend and sink selection, Ctrl-C wiring.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use anyhow::{anyhow, Context, Result};
use clap::ValueEnum;

use crate::detect::{DetectorBackend, ReplayBackend, StubBackend};
use crate::sink::{FrameSink, JpegSequenceSink, NullSink};

/// Person at the centre of the frame, used by `--backend stub`.
const STUB_LAYER: [f32; 8] = [0.0, 15.0, 0.95, 0.35, 0.2, 0.65, 0.9, -1.0];

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum BackendKind {
    /// ONNX model through tract (feature `backend-tract`).
    Tract,
    /// Recorded results from a JSON-lines file.
    Replay,
    /// A fixed detection on every frame.
    Stub,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputKind {
    /// Preview window (feature `display-window`).
    Window,
    /// Numbered JPEG files.
    Jpeg,
    /// Discard frames.
    None,
}

pub fn open_backend(
    kind: BackendKind,
    model: &Path,
    replay: Option<&Path>,
) -> Result<Box<dyn DetectorBackend>> {
    match kind {
        BackendKind::Stub => Ok(Box::new(
            StubBackend::from_layers(vec![STUB_LAYER.to_vec()]).repeating(),
        )),
        BackendKind::Replay => {
            let path =
                replay.ok_or_else(|| anyhow!("--backend replay requires --replay <path>"))?;
            Ok(Box::new(ReplayBackend::open(path)?))
        }
        BackendKind::Tract => open_tract(model),
    }
}

#[cfg(feature = "backend-tract")]
fn open_tract(model: &Path) -> Result<Box<dyn DetectorBackend>> {
    use crate::detect::{TractBackend, DEFAULT_INPUT_SIZE};
    let backend = TractBackend::new(model, DEFAULT_INPUT_SIZE, DEFAULT_INPUT_SIZE)
        .with_context(|| format!("failed to load model {}", model.display()))?;
    Ok(Box::new(backend))
}

#[cfg(not(feature = "backend-tract"))]
fn open_tract(model: &Path) -> Result<Box<dyn DetectorBackend>> {
    Err(anyhow!(
        "cannot load {}: built without the backend-tract feature",
        model.display()
    ))
}

pub struct SinkOptions {
    pub title: String,
    pub dir: PathBuf,
    pub prefix: String,
    pub quality: u8,
}

pub fn open_sink(kind: OutputKind, options: SinkOptions) -> Result<Box<dyn FrameSink>> {
    match kind {
        OutputKind::None => Ok(Box::new(NullSink::new())),
        OutputKind::Jpeg => Ok(Box::new(
            JpegSequenceSink::new(&options.dir)?
                .with_prefix(options.prefix)
                .with_quality(options.quality)?,
        )),
        OutputKind::Window => open_window(&options.title),
    }
}

#[cfg(feature = "display-window")]
fn open_window(title: &str) -> Result<Box<dyn FrameSink>> {
    Ok(Box::new(crate::sink::WindowSink::new(title)))
}

#[cfg(not(feature = "display-window"))]
fn open_window(title: &str) -> Result<Box<dyn FrameSink>> {
    Err(anyhow!(
        "cannot open window '{}': built without the display-window feature",
        title
    ))
}

/// Flag set by the Ctrl-C handler.
pub fn install_interrupt() -> Result<Arc<AtomicBool>> {
    let flag = Arc::new(AtomicBool::new(false));
    let handler_flag = flag.clone();
    ctrlc::set_handler(move || {
        handler_flag.store(true, Ordering::SeqCst);
    })
    .context("error setting Ctrl-C handler")?;
    Ok(flag)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn replay_requires_a_path() {
        let err = open_backend(BackendKind::Replay, Path::new("unused.onnx"), None)
            .err()
            .map(|e| e.to_string());
        assert_eq!(
            err.as_deref(),
            Some("--backend replay requires --replay <path>")
        );
    }

    #[test]
    fn stub_layer_is_a_single_person() -> Result<()> {
        let detections = crate::detect::parse_detections(&STUB_LAYER)?;
        assert_eq!(detections.len(), 1);
        assert_eq!(detections[0].label, crate::detect::Label::Person);
        Ok(())
    }
}
