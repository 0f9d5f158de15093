//! Replays recorded inference results.
//!
//! The log is JSON lines, one line per submitted frame. A line holds either the flat
//! result layer (`[0, 15, 0.91, 0.1, 0.2, 0.4, 0.9, -1]`) or `null` when the device
//! produced nothing for that frame. Blank lines are skipped.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::detect::backend::{DetectorBackend, NnPacket};
use crate::detect::queue::OutputQueue;
use crate::frame::Frame;

/// Backend that serves results from a recorded log.
pub struct ReplayBackend {
    path: PathBuf,
    entries: Vec<Option<Vec<f32>>>,
    cursor: usize,
    queue: OutputQueue<NnPacket>,
}

impl ReplayBackend {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let raw = fs::read_to_string(path)
            .with_context(|| format!("failed to read replay log {}", path.display()))?;
        let entries = parse_log(&raw)
            .with_context(|| format!("invalid replay log {}", path.display()))?;
        log::info!(
            "ReplayBackend: loaded {} entries from {}",
            entries.len(),
            path.display()
        );
        Ok(Self {
            path: path.to_path_buf(),
            entries,
            cursor: 0,
            queue: OutputQueue::default(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Entries not yet consumed by `submit`.
    pub fn remaining(&self) -> usize {
        self.entries.len().saturating_sub(self.cursor)
    }
}

fn parse_log(raw: &str) -> Result<Vec<Option<Vec<f32>>>> {
    raw.lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(idx, line)| {
            serde_json::from_str::<Option<Vec<f32>>>(line)
                .with_context(|| format!("line {}", idx + 1))
        })
        .collect()
}

impl DetectorBackend for ReplayBackend {
    fn name(&self) -> &'static str {
        "replay"
    }

    fn submit(&mut self, frame: &Frame) -> Result<()> {
        let Some(entry) = self.entries.get(self.cursor) else {
            return Ok(());
        };
        self.cursor += 1;
        if let Some(layer) = entry {
            self.queue.push(NnPacket {
                sequence: frame.sequence,
                layer: layer.clone(),
            });
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

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn frame(sequence: u64) -> Frame {
        Frame::from_rgb(vec![0u8; 12], 2, 2, sequence).unwrap()
    }

    #[test]
    fn replays_results_and_gaps() -> Result<()> {
        let mut file = NamedTempFile::new()?;
        writeln!(file, "[0, 15, 0.9, 0.1, 0.1, 0.5, 0.5, -1]")?;
        writeln!(file, "null")?;
        writeln!(file)?;
        writeln!(file, "[-1, 0, 0, 0, 0, 0, 0]")?;

        let mut backend = ReplayBackend::open(file.path())?;
        assert_eq!(backend.remaining(), 3);

        backend.submit(&frame(0))?;
        let packet = backend.try_get()?.expect("first result");
        assert_eq!(packet.layer.len(), 8);

        backend.submit(&frame(1))?;
        assert!(backend.try_get()?.is_none());

        backend.submit(&frame(2))?;
        assert_eq!(backend.try_get()?.map(|p| p.sequence), Some(2));

        // Exhausted log: frames keep flowing, results do not.
        backend.submit(&frame(3))?;
        assert!(backend.try_get()?.is_none());
        Ok(())
    }

    #[test]
    fn rejects_malformed_lines() -> Result<()> {
        let mut file = NamedTempFile::new()?;
        writeln!(file, "[0, 15, 0.9")?;
        assert!(ReplayBackend::open(file.path()).is_err());
        Ok(())
    }

    #[test]
    fn missing_file_names_the_path() {
        let err = ReplayBackend::open("/nonexistent/replay.jsonl")
            .err()
            .expect("open should fail");
        assert!(format!("{:#}", err).contains("/nonexistent/replay.jsonl"));
    }
}
