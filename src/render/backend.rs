use crate::foundation::core::{Canvas, Rgba8};
use crate::foundation::error::WeaveResult;
use crate::scene::item::Item;

/// One rendered frame as RGBA8 pixels, row-major, `width * height * 4` bytes.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Frame {
    /// Frame width in pixels.
    pub width: u32,
    /// Frame height in pixels.
    pub height: u32,
    /// RGBA8 bytes, tightly packed, row-major.
    pub data: Vec<u8>,
    /// Whether `data` is premultiplied alpha.
    pub premultiplied: bool,
}

impl Frame {
    /// Frame filled with one straight-alpha color, stored premultiplied.
    pub fn solid(canvas: Canvas, color: Rgba8) -> Self {
        let px = color.to_premul();
        let mut data = Vec::with_capacity(canvas.frame_byte_len());
        for _ in 0..(canvas.width as usize * canvas.height as usize) {
            data.extend_from_slice(&px);
        }
        Self {
            width: canvas.width,
            height: canvas.height,
            data,
            premultiplied: true,
        }
    }

    pub fn canvas(&self) -> Canvas {
        Canvas {
            width: self.width,
            height: self.height,
        }
    }

    /// Pixel at `(x, y)`, if inside the frame.
    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let i = ((y as usize) * (self.width as usize) + (x as usize)) * 4;
        Some([
            self.data[i],
            self.data[i + 1],
            self.data[i + 2],
            self.data[i + 3],
        ])
    }
}

/// Rasterizer/compositor used by the scene driver.
///
/// `items` is a flat draw list, back to front: each item draws only its own shape, groups are
/// expanded by the caller. When `background` is given the items are composited over it and the
/// scene background is not painted again.
pub trait Renderer {
    fn canvas(&self) -> Canvas;

    fn render(&mut self, items: &[Item], background: Option<&Frame>) -> WeaveResult<Frame>;
}
