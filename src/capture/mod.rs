//! Frame acquisition
//!
//! The tracking loop pulls one frame per iteration from a `FrameSource`.
//! Platform screen grabbing lives behind `cfg(windows)`; replay sources are
//! available everywhere for testing and offline runs.

#[cfg(feature = "vision")]
mod sequence;
#[cfg(target_os = "windows")]
mod screen;

#[cfg(feature = "vision")]
pub use sequence::FrameSequenceCapture;
#[cfg(target_os = "windows")]
pub use screen::ScreenCapture;

use crate::Result;

/// A captured frame, tightly packed RGB
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    /// Width in pixels
    pub width: u32,
    /// Height in pixels
    pub height: u32,
    /// RGB pixel data, row-major
    pub data: Vec<u8>,
}

impl Frame {
    /// Create a new frame
    pub fn new(width: u32, height: u32, data: Vec<u8>) -> Self {
        Self { width, height, data }
    }

    /// All-zero frame, used for model warm-up
    pub fn blank(width: u32, height: u32) -> Self {
        Self::new(width, height, vec![0; width as usize * height as usize * 3])
    }

    /// Get a pixel at (x, y)
    pub fn get_pixel(&self, x: u32, y: u32) -> Option<[u8; 3]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let idx = (y as usize * self.width as usize + x as usize) * 3;
        self.data.get(idx..idx + 3).map(|p| [p[0], p[1], p[2]])
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }
}

/// Produces one frame per request
pub trait FrameSource: Send {
    /// Capture the next frame. Failures are `TrackerError::Capture`.
    fn capture(&mut self) -> Result<Frame>;
}

impl<S: FrameSource + ?Sized> FrameSource for Box<S> {
    fn capture(&mut self) -> Result<Frame> {
        (**self).capture()
    }
}

/// Source that yields zero frames of a fixed size
#[derive(Debug, Clone)]
pub struct BlankFrameSource {
    width: u32,
    height: u32,
}

impl BlankFrameSource {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

impl FrameSource for BlankFrameSource {
    fn capture(&mut self) -> Result<Frame> {
        Ok(Frame::blank(self.width, self.height))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blank_frame() {
        let frame = Frame::blank(4, 2);
        assert_eq!(frame.data.len(), 24);
        assert_eq!(frame.get_pixel(3, 1), Some([0, 0, 0]));
        assert!(!frame.is_empty());
    }

    #[test]
    fn test_get_pixel() {
        let mut data = vec![0u8; 2 * 2 * 3];
        data[9..12].copy_from_slice(&[10, 20, 30]);
        let frame = Frame::new(2, 2, data);
        assert_eq!(frame.get_pixel(1, 1), Some([10, 20, 30]));
        assert_eq!(frame.get_pixel(2, 0), None);
        assert_eq!(frame.get_pixel(0, 2), None);
    }

    #[test]
    fn test_short_buffer() {
        let frame = Frame::new(2, 2, vec![0; 5]);
        assert_eq!(frame.get_pixel(1, 1), None);
    }

    #[test]
    fn test_blank_source() {
        let mut source = BlankFrameSource::new(8, 6);
        let frame = source.capture().unwrap();
        assert_eq!((frame.width, frame.height), (8, 6));
    }
}
