use crate::frame::FrameData;
use embedded_graphics::pixelcolor::{IntoStorage, Rgb565};
use embedded_graphics::prelude::*;
use std::convert::Infallible;

use super::converter::DisplayConverter;

/// Fixed-size RGB565 pixel grid composed by the renderer every frame
#[derive(Debug, Clone, PartialEq)]
pub struct FrameBuffer {
    width: u32,
    height: u32,
    pixels: Vec<Rgb565>,
}

impl FrameBuffer {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            pixels: vec![Rgb565::BLACK; width as usize * height as usize],
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn fill(&mut self, color: Rgb565) {
        self.pixels.fill(color);
    }

    pub fn pixel(&self, x: u32, y: u32) -> Option<Rgb565> {
        if x >= self.width || y >= self.height {
            return None;
        }
        self.pixels
            .get(y as usize * self.width as usize + x as usize)
            .copied()
    }

    pub fn pixels(&self) -> &[Rgb565] {
        &self.pixels
    }

    /// Raw RGB565 words, row-major
    pub fn raw(&self) -> Vec<u16> {
        self.pixels.iter().map(|p| p.into_storage()).collect()
    }

    /// Count pixels of one color, mostly for tests
    pub fn count_color(&self, color: Rgb565) -> usize {
        self.pixels.iter().filter(|p| **p == color).count()
    }

    /// Nearest-neighbour scale an RGB24 frame over the whole buffer
    pub fn blit_frame(&mut self, frame: &FrameData) {
        if frame.width == 0 || frame.height == 0 || !frame.validate_size() {
            return;
        }

        let x_ratio = frame.width as f32 / self.width as f32;
        let y_ratio = frame.height as f32 / self.height as f32;
        let data = frame.data.as_slice();

        for dst_y in 0..self.height {
            let src_y = ((dst_y as f32 * y_ratio) as u32).min(frame.height - 1);
            for dst_x in 0..self.width {
                let src_x = ((dst_x as f32 * x_ratio) as u32).min(frame.width - 1);
                let src = (src_y as usize * frame.width as usize + src_x as usize) * 3;
                let color = DisplayConverter::rgb888_to_rgb565(
                    data[src],
                    data[src + 1],
                    data[src + 2],
                );
                self.pixels[dst_y as usize * self.width as usize + dst_x as usize] = color;
            }
        }
    }
}

impl DrawTarget for FrameBuffer {
    type Color = Rgb565;
    type Error = Infallible;

    fn draw_iter<I>(&mut self, pixels: I) -> Result<(), Self::Error>
    where
        I: IntoIterator<Item = Pixel<Self::Color>>,
    {
        for Pixel(Point { x, y }, color) in pixels {
            if x < 0 || y < 0 || x >= self.width as i32 || y >= self.height as i32 {
                continue;
            }
            let index = y as usize * self.width as usize + x as usize;
            self.pixels[index] = color;
        }
        Ok(())
    }

    fn clear(&mut self, color: Self::Color) -> Result<(), Self::Error> {
        self.fill(color);
        Ok(())
    }
}

impl OriginDimensions for FrameBuffer {
    fn size(&self) -> Size {
        Size::new(self.width, self.height)
    }
}
