//! Replay a directory of images as a frame source

use std::path::{Path, PathBuf};

use super::{Frame, FrameSource};
use crate::{Result, TrackerError};

const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "bmp"];

/// Frame source backed by image files, played back in file-name order
pub struct FrameSequenceCapture {
    frames: Vec<PathBuf>,
    position: usize,
    loop_playback: bool,
}

impl FrameSequenceCapture {
    /// Collect every image in `dir`
    pub fn from_directory(dir: &Path, loop_playback: bool) -> Result<Self> {
        let mut frames: Vec<PathBuf> = std::fs::read_dir(dir)?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|path| {
                path.extension()
                    .and_then(|ext| ext.to_str())
                    .map(|ext| IMAGE_EXTENSIONS.contains(&ext.to_lowercase().as_str()))
                    .unwrap_or(false)
            })
            .collect();
        frames.sort();

        if frames.is_empty() {
            return Err(TrackerError::Capture(format!(
                "no images found in {}",
                dir.display()
            )));
        }

        log::info!("Loaded {} frames from {}", frames.len(), dir.display());

        Ok(Self {
            frames,
            position: 0,
            loop_playback,
        })
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }
}

impl FrameSource for FrameSequenceCapture {
    fn capture(&mut self) -> Result<Frame> {
        if self.position >= self.frames.len() {
            if !self.loop_playback {
                return Err(TrackerError::Capture("frame sequence exhausted".to_string()));
            }
            self.position = 0;
        }

        let path = &self.frames[self.position];
        self.position += 1;

        let img = image::open(path)
            .map_err(|e| TrackerError::Capture(format!("{}: {}", path.display(), e)))?
            .to_rgb8();
        let (width, height) = img.dimensions();
        Ok(Frame::new(width, height, img.into_raw()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scratch_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("target-follow-{}-{}", name, std::process::id()));
        let _ = std::fs::remove_dir_all(&dir);
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn test_plays_in_name_order_then_ends() {
        let dir = scratch_dir("sequence");
        image::RgbImage::from_pixel(2, 2, image::Rgb([255, 0, 0]))
            .save(dir.join("b.png"))
            .unwrap();
        image::RgbImage::from_pixel(3, 1, image::Rgb([0, 255, 0]))
            .save(dir.join("a.png"))
            .unwrap();
        std::fs::write(dir.join("notes.txt"), "ignored").unwrap();

        let mut capture = FrameSequenceCapture::from_directory(&dir, false).unwrap();
        assert_eq!(capture.len(), 2);

        let first = capture.capture().unwrap();
        assert_eq!((first.width, first.height), (3, 1));
        assert_eq!(first.get_pixel(0, 0), Some([0, 255, 0]));

        let second = capture.capture().unwrap();
        assert_eq!(second.get_pixel(1, 1), Some([255, 0, 0]));

        assert!(matches!(capture.capture(), Err(TrackerError::Capture(_))));
        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_loop_playback() {
        let dir = scratch_dir("loop");
        image::RgbImage::new(1, 1).save(dir.join("only.png")).unwrap();

        let mut capture = FrameSequenceCapture::from_directory(&dir, true).unwrap();
        for _ in 0..3 {
            assert!(capture.capture().is_ok());
        }
        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_empty_directory() {
        let dir = scratch_dir("empty");
        assert!(FrameSequenceCapture::from_directory(&dir, false).is_err());
        let _ = std::fs::remove_dir_all(&dir);
    }
}
