use std::collections::VecDeque;

use anyhow::Result;

use crate::detect::backend::{DetectorBackend, NnPacket};
use crate::detect::queue::OutputQueue;
use crate::frame::Frame;

/// Scripted backend for tests and `stub://` runs.
///
/// Each submitted frame consumes one script entry. `Some(layer)` becomes a result once
/// `latency` further frames have been submitted; `None` produces nothing for that frame.
pub struct StubBackend {
    script: VecDeque<Option<Vec<f32>>>,
    replay: Option<Vec<Option<Vec<f32>>>>,
    pending: VecDeque<(u64, NnPacket)>,
    queue: OutputQueue<NnPacket>,
    latency: u64,
    submitted: u64,
}

impl StubBackend {
    pub fn new(script: Vec<Option<Vec<f32>>>) -> Self {
        Self {
            script: script.into(),
            replay: None,
            pending: VecDeque::new(),
            queue: OutputQueue::default(),
            latency: 0,
            submitted: 0,
        }
    }

    /// One result per frame.
    pub fn from_layers(layers: Vec<Vec<f32>>) -> Self {
        Self::new(layers.into_iter().map(Some).collect())
    }

    /// Delay each result by `frames` submissions.
    pub fn with_latency(mut self, frames: u64) -> Self {
        self.latency = frames;
        self
    }

    /// Start the script over once it runs out.
    pub fn repeating(mut self) -> Self {
        self.replay = Some(self.script.iter().cloned().collect());
        self
    }

    fn next_entry(&mut self) -> Option<Option<Vec<f32>>> {
        if self.script.is_empty() {
            if let Some(replay) = &self.replay {
                self.script.extend(replay.iter().cloned());
            }
        }
        self.script.pop_front()
    }

    fn promote_ready(&mut self) {
        while let Some((ready_at, _)) = self.pending.front() {
            if *ready_at > self.submitted {
                break;
            }
            if let Some((_, packet)) = self.pending.pop_front() {
                self.queue.push(packet);
            }
        }
    }
}

impl DetectorBackend for StubBackend {
    fn name(&self) -> &'static str {
        "stub"
    }

    fn submit(&mut self, frame: &Frame) -> Result<()> {
        if let Some(Some(layer)) = self.next_entry() {
            let packet = NnPacket {
                sequence: frame.sequence,
                layer,
            };
            self.pending.push_back((self.submitted + 1 + self.latency, packet));
        }
        self.submitted += 1;
        Ok(())
    }

    fn try_get(&mut self) -> Result<Option<NnPacket>> {
        self.promote_ready();
        Ok(self.queue.try_get())
    }

    fn try_get_latest(&mut self) -> Result<Option<NnPacket>> {
        self.promote_ready();
        Ok(self.queue.latest())
    }

    fn get(&mut self) -> Result<Option<NnPacket>> {
        self.promote_ready();
        if let Some(packet) = self.queue.try_get() {
            return Ok(Some(packet));
        }
        Ok(self.pending.pop_front().map(|(_, packet)| packet))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame(sequence: u64) -> Frame {
        Frame::from_rgb(vec![0u8; 12], 2, 2, sequence).unwrap()
    }

    #[test]
    fn results_follow_script() -> Result<()> {
        let mut backend = StubBackend::new(vec![Some(vec![-1.0]), None, Some(vec![-1.0])]);

        backend.submit(&frame(0))?;
        assert_eq!(backend.try_get()?.map(|p| p.sequence), Some(0));

        backend.submit(&frame(1))?;
        assert!(backend.try_get()?.is_none());

        backend.submit(&frame(2))?;
        assert_eq!(backend.try_get()?.map(|p| p.sequence), Some(2));
        Ok(())
    }

    #[test]
    fn latency_delays_results() -> Result<()> {
        let mut backend = StubBackend::from_layers(vec![vec![-1.0], vec![-1.0]]).with_latency(1);

        backend.submit(&frame(0))?;
        assert!(backend.try_get()?.is_none());

        backend.submit(&frame(1))?;
        assert_eq!(backend.try_get()?.map(|p| p.sequence), Some(0));
        assert!(backend.try_get()?.is_none());
        Ok(())
    }

    #[test]
    fn latest_skips_older_ready_results() -> Result<()> {
        let mut backend = StubBackend::from_layers(vec![vec![-1.0]; 3]).with_latency(2);
        for sequence in 0..3 {
            backend.submit(&frame(sequence))?;
        }
        backend.submit(&frame(3))?;
        assert_eq!(backend.try_get_latest()?.map(|p| p.sequence), Some(1));
        assert!(backend.try_get()?.is_none());
        Ok(())
    }

    #[test]
    fn repeating_script_wraps() -> Result<()> {
        let mut backend = StubBackend::new(vec![Some(vec![-1.0]), None]).repeating();
        let mut hits = 0;
        for sequence in 0..6 {
            backend.submit(&frame(sequence))?;
            if backend.try_get()?.is_some() {
                hits += 1;
            }
        }
        assert_eq!(hits, 3);
        Ok(())
    }

    #[test]
    fn blocking_get_waits_for_pending() -> Result<()> {
        let mut backend = StubBackend::from_layers(vec![vec![-1.0]]).with_latency(5);
        backend.submit(&frame(0))?;
        assert!(backend.try_get()?.is_none());
        assert_eq!(backend.get()?.map(|p| p.sequence), Some(0));
        assert!(backend.get()?.is_none());
        Ok(())
    }
}
