use std::collections::VecDeque;
use std::fs;
use std::path::PathBuf;

use image::RgbImage;

use super::error::FrameError;

/// Pull-based supplier of camera frames.
pub trait FrameSource {
    fn open(&mut self) -> Result<(), FrameError>;

    /// Blocks until the next frame is available.
    fn next_frame(&mut self) -> Result<RgbImage, FrameError>;

    fn close(&mut self);
}

/// Reads a recorded sequence of image files from a directory, in file name order.
pub struct FrameDirectory {
    dir: PathBuf,
    pending: Option<VecDeque<PathBuf>>,
}

impl FrameDirectory {
    pub fn new(dir: PathBuf) -> Self {
        Self { dir, pending: None }
    }
}

impl FrameSource for FrameDirectory {
    fn open(&mut self) -> Result<(), FrameError> {
        if !self.dir.is_dir() {
            return Err(FrameError::NotFound(self.dir.display().to_string()));
        }

        let mut files = Vec::new();
        for entry in fs::read_dir(&self.dir)? {
            let path = entry?.path();
            if !path.is_file() {
                continue;
            }
            let is_image = path
                .extension()
                .and_then(|ext| ext.to_str())
                .map(|ext| matches!(ext.to_ascii_lowercase().as_str(), "png" | "jpg" | "jpeg"))
                .unwrap_or(false);
            if is_image {
                files.push(path);
            }
        }
        files.sort();

        log::info!("Opened {} frames from {}", files.len(), self.dir.display());
        self.pending = Some(files.into());
        Ok(())
    }

    fn next_frame(&mut self) -> Result<RgbImage, FrameError> {
        let pending = self.pending.as_mut().ok_or(FrameError::NotOpen)?;
        let path = pending.pop_front().ok_or(FrameError::EndOfStream)?;
        Ok(image::open(&path)?.to_rgb8())
    }

    fn close(&mut self) {
        self.pending = None;
    }
}

/// In-memory frame source, used to replay synthetic frames.
#[cfg(test)]
pub struct FrameSequence {
    frames: VecDeque<RgbImage>,
    open: bool,
}

#[cfg(test)]
impl FrameSequence {
    pub fn new(frames: Vec<RgbImage>) -> Self {
        Self {
            frames: frames.into(),
            open: false,
        }
    }
}

#[cfg(test)]
impl FrameSource for FrameSequence {
    fn open(&mut self) -> Result<(), FrameError> {
        self.open = true;
        Ok(())
    }

    fn next_frame(&mut self) -> Result<RgbImage, FrameError> {
        if !self.open {
            return Err(FrameError::NotOpen);
        }
        self.frames.pop_front().ok_or(FrameError::EndOfStream)
    }

    fn close(&mut self) {
        self.open = false;
    }
}
