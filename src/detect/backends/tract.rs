#![cfg(feature = "backend-tract")]

use std::path::Path;

use anyhow::{anyhow, Context, Result};
use tract_onnx::prelude::*;

use crate::detect::backend::{DetectorBackend, NnPacket};
use crate::detect::buffer::{sentinel_position, SENTINEL};
use crate::detect::queue::OutputQueue;
use crate::frame::Frame;

/// Tract-based backend for SSD-style ONNX detectors.
///
/// The model must take a `[1, 3, H, W]` f32 input and emit `[.., 7]` detection rows as
/// its first output. Inference runs inside `submit`; the result is queued for `try_get`.
pub struct TractBackend {
    model: SimplePlan<TypedFact, Box<dyn TypedOp>>,
    width: u32,
    height: u32,
    mean: f32,
    scale: f32,
    queue: OutputQueue<NnPacket>,
}

impl TractBackend {
    /// Load an ONNX model from disk and prepare it for inference.
    pub fn new<P: AsRef<Path>>(model_path: P, width: u32, height: u32) -> Result<Self> {
        let model_path = model_path.as_ref();
        let model = tract_onnx::onnx()
            .model_for_path(model_path)
            .with_context(|| format!("failed to load ONNX model from {}", model_path.display()))?
            .with_input_fact(
                0,
                InferenceFact::dt_shape(
                    f32::datum_type(),
                    tvec!(1, 3, height as usize, width as usize),
                ),
            )
            .context("failed to set input fact")?
            .into_optimized()
            .context("failed to optimize ONNX model")?
            .into_runnable()
            .context("failed to build runnable ONNX model")?;

        log::info!(
            "TractBackend: loaded {} ({}x{} input)",
            model_path.display(),
            width,
            height
        );

        Ok(Self {
            model,
            width,
            height,
            mean: 127.5,
            scale: 1.0 / 127.5,
            queue: OutputQueue::default(),
        })
    }

    /// Override input normalization: `(pixel - mean) * scale`.
    pub fn with_normalization(mut self, mean: f32, scale: f32) -> Self {
        self.mean = mean;
        self.scale = scale;
        self
    }

    fn build_input(&self, frame: &Frame) -> Result<Tensor> {
        let planar = frame.to_planar(self.width, self.height);
        let normalized: Vec<f32> = planar
            .into_iter()
            .map(|v| (v - self.mean) * self.scale)
            .collect();
        let input = tract_ndarray::Array4::from_shape_vec(
            (1, 3, self.height as usize, self.width as usize),
            normalized,
        )
        .context("planar input does not match model shape")?;
        Ok(input.into_tensor())
    }

    fn extract_layer(&self, outputs: TVec<TValue>) -> Result<Vec<f32>> {
        let output = outputs
            .first()
            .ok_or_else(|| anyhow!("model produced no outputs"))?;
        let values = output
            .to_array_view::<f32>()
            .context("model output tensor was not f32")?;
        let mut layer: Vec<f32> = values.iter().copied().collect();
        if sentinel_position(&layer).is_none() {
            layer.push(SENTINEL);
        }
        Ok(layer)
    }
}

impl DetectorBackend for TractBackend {
    fn name(&self) -> &'static str {
        "tract"
    }

    fn input_size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    fn submit(&mut self, frame: &Frame) -> Result<()> {
        let input = self.build_input(frame)?;
        let outputs = self
            .model
            .run(tvec!(input.into()))
            .context("ONNX inference failed")?;
        let layer = self.extract_layer(outputs)?;
        if self
            .queue
            .push(NnPacket {
                sequence: frame.sequence,
                layer,
            })
            .is_some()
        {
            log::debug!("TractBackend: output queue full, dropped oldest result");
        }
        Ok(())
    }

    fn try_get(&mut self) -> Result<Option<NnPacket>> {
        Ok(self.queue.try_get())
    }

    fn try_get_latest(&mut self) -> Result<Option<NnPacket>> {
        Ok(self.queue.latest())
    }

    fn get(&mut self) -> Result<Option<NnPacket>> {
        Ok(self.queue.try_get())
    }
}
