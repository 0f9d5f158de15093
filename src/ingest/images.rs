//! Image directory frame source.
//!
//! Treats a directory of still images as a recorded clip: files with a known image
//! extension are decoded in file-name order, one per frame.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};

use super::{FrameSource, SourceStats};
use crate::frame::Frame;

const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "bmp"];

pub struct ImageSequenceSource {
    dir: PathBuf,
    files: Vec<PathBuf>,
    cursor: usize,
}

impl ImageSequenceSource {
    pub fn new<P: AsRef<Path>>(dir: P) -> Result<Self> {
        let dir = dir.as_ref();
        if !dir.is_dir() {
            return Err(anyhow!("{} is not a directory", dir.display()));
        }
        Ok(Self {
            dir: dir.to_path_buf(),
            files: Vec::new(),
            cursor: 0,
        })
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}

fn is_image(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| IMAGE_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()))
        .unwrap_or(false)
}

impl FrameSource for ImageSequenceSource {
    fn connect(&mut self) -> Result<()> {
        let mut files = Vec::new();
        for entry in fs::read_dir(&self.dir)
            .with_context(|| format!("failed to list {}", self.dir.display()))?
        {
            let path = entry?.path();
            if path.is_file() && is_image(&path) {
                files.push(path);
            }
        }
        files.sort();
        if files.is_empty() {
            log::warn!("ImageSequenceSource: no images in {}", self.dir.display());
        }
        self.files = files;
        self.cursor = 0;
        log::info!(
            "ImageSequenceSource: connected to {} ({} images)",
            self.dir.display(),
            self.files.len()
        );
        Ok(())
    }

    fn next_frame(&mut self) -> Result<Option<Frame>> {
        let Some(path) = self.files.get(self.cursor) else {
            return Ok(None);
        };
        let image = image::open(path)
            .with_context(|| format!("failed to decode {}", path.display()))?
            .to_rgb8();
        let frame = Frame::from_image(image, self.cursor as u64);
        self.cursor += 1;
        Ok(Some(frame))
    }

    fn stats(&self) -> SourceStats {
        SourceStats {
            frames_captured: self.cursor as u64,
            uri: self.dir.display().to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage};

    #[test]
    fn reads_images_in_name_order() -> Result<()> {
        let dir = tempfile::tempdir()?;
        RgbImage::from_pixel(4, 2, Rgb([200, 0, 0])).save(dir.path().join("b.png"))?;
        RgbImage::from_pixel(4, 2, Rgb([0, 200, 0])).save(dir.path().join("a.png"))?;
        fs::write(dir.path().join("notes.txt"), "not an image")?;

        let mut source = ImageSequenceSource::new(dir.path())?;
        source.connect()?;
        assert_eq!(source.len(), 2);

        let first = source.next_frame()?.expect("a.png");
        assert_eq!(first.image().get_pixel(0, 0), &Rgb([0, 200, 0]));
        let second = source.next_frame()?.expect("b.png");
        assert_eq!(second.sequence, 1);
        assert!(source.next_frame()?.is_none());
        assert_eq!(source.stats().frames_captured, 2);
        Ok(())
    }

    #[test]
    fn rejects_missing_directory() {
        assert!(ImageSequenceSource::new("/nonexistent/frames").is_err());
    }
}
