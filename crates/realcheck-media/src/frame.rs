//! Decoded video frames.

use image::RgbImage;

/// One decoded frame, tagged with its position in decode order.
#[derive(Debug, Clone)]
pub struct Frame {
    /// Zero-based decode index
    pub index: usize,
    /// RGB pixel data
    pub image: RgbImage,
}

impl Frame {
    pub fn new(index: usize, image: RgbImage) -> Self {
        Self { index, image }
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }
}
