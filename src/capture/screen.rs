//! Primary monitor capture through GDI (Windows)

use windows::Win32::Foundation::HWND;
use windows::Win32::Graphics::Gdi::{
    BitBlt, CreateCompatibleBitmap, CreateCompatibleDC, DeleteDC, DeleteObject, GetDC, GetDIBits,
    ReleaseDC, SelectObject, BITMAPINFO, BITMAPINFOHEADER, BI_RGB, DIB_RGB_COLORS, SRCCOPY,
};
use windows::Win32::UI::WindowsAndMessaging::{GetSystemMetrics, SM_CXSCREEN, SM_CYSCREEN};

use super::{Frame, FrameSource};
use crate::{Result, TrackerError};

/// Screen capture of the primary monitor, or a region of it
pub struct ScreenCapture {
    /// Capture region (x, y, width, height); full screen when unset
    region: Option<(i32, i32, u32, u32)>,
}

impl ScreenCapture {
    /// Create a new screen capture instance
    pub fn new() -> Self {
        Self { region: None }
    }

    /// Set the capture region
    pub fn with_region(mut self, x: i32, y: i32, width: u32, height: u32) -> Self {
        self.region = Some((x, y, width, height));
        self
    }

    fn bounds(&self) -> (i32, i32, i32, i32) {
        match self.region {
            Some((x, y, w, h)) => (x, y, w as i32, h as i32),
            None => unsafe { (0, 0, GetSystemMetrics(SM_CXSCREEN), GetSystemMetrics(SM_CYSCREEN)) },
        }
    }
}

impl Default for ScreenCapture {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameSource for ScreenCapture {
    fn capture(&mut self) -> Result<Frame> {
        let (left, top, width, height) = self.bounds();
        if width <= 0 || height <= 0 {
            return Err(TrackerError::Capture(format!(
                "invalid capture size {}x{}",
                width, height
            )));
        }

        let mut bgra = vec![0u8; width as usize * height as usize * 4];

        unsafe {
            let screen_dc = GetDC(HWND::default());
            if screen_dc.is_invalid() {
                return Err(TrackerError::Capture("GetDC failed".to_string()));
            }
            let mem_dc = CreateCompatibleDC(screen_dc);
            let bitmap = CreateCompatibleBitmap(screen_dc, width, height);
            let previous = SelectObject(mem_dc, bitmap);

            let blit = BitBlt(mem_dc, 0, 0, width, height, screen_dc, left, top, SRCCOPY);

            let mut info = BITMAPINFO {
                bmiHeader: BITMAPINFOHEADER {
                    biSize: std::mem::size_of::<BITMAPINFOHEADER>() as u32,
                    biWidth: width,
                    // Negative height requests a top-down bitmap
                    biHeight: -height,
                    biPlanes: 1,
                    biBitCount: 32,
                    biCompression: BI_RGB.0,
                    ..Default::default()
                },
                ..Default::default()
            };
            let lines = GetDIBits(
                mem_dc,
                bitmap,
                0,
                height as u32,
                Some(bgra.as_mut_ptr().cast()),
                &mut info,
                DIB_RGB_COLORS,
            );

            SelectObject(mem_dc, previous);
            let _ = DeleteObject(bitmap);
            let _ = DeleteDC(mem_dc);
            ReleaseDC(HWND::default(), screen_dc);

            if let Err(e) = blit {
                return Err(TrackerError::Capture(format!("BitBlt failed: {}", e)));
            }
            if lines != height {
                return Err(TrackerError::Capture(format!(
                    "GetDIBits copied {} of {} lines",
                    lines, height
                )));
            }
        }

        let rgb = bgra
            .chunks_exact(4)
            .flat_map(|px| [px[2], px[1], px[0]])
            .collect();
        Ok(Frame::new(width as u32, height as u32, rgb))
    }
}
