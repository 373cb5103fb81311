use crate::config::Rotation;
use crate::error::DisplayError;
use embedded_graphics::pixelcolor::Rgb565;

/// Pixel format helpers between sensor frames and the panel
pub struct DisplayConverter;

impl DisplayConverter {
    /// Truncating 8-bit-per-channel to 5/6/5 conversion
    pub const fn rgb888_to_rgb565(r: u8, g: u8, b: u8) -> Rgb565 {
        Rgb565::new(r >> 3, g >> 2, b >> 3)
    }

    /// Convert a packed RGB24 buffer into RGB565 words
    pub fn rgb24_to_rgb565(
        rgb24_data: &[u8],
        width: u32,
        height: u32,
    ) -> Result<Vec<u16>, DisplayError> {
        let expected_size = (width * height * 3) as usize;
        if rgb24_data.len() != expected_size {
            return Err(DisplayError::FormatConversion {
                details: format!(
                    "Invalid RGB24 data size: expected {}, got {}",
                    expected_size,
                    rgb24_data.len()
                ),
            });
        }

        Ok(rgb24_data
            .chunks_exact(3)
            .map(|chunk| {
                let r = (chunk[0] >> 3) as u16;
                let g = (chunk[1] >> 2) as u16;
                let b = (chunk[2] >> 3) as u16;
                (r << 11) | (g << 5) | b
            })
            .collect())
    }

    /// Rotate a row-major RGB565 image; returns the words and the new (width, height)
    pub fn rotate_rgb565(
        data: &[u16],
        width: u32,
        height: u32,
        rotation: Rotation,
    ) -> Result<(Vec<u16>, u32, u32), DisplayError> {
        if data.len() != (width * height) as usize {
            return Err(DisplayError::FormatConversion {
                details: format!(
                    "Invalid RGB565 data size: expected {}, got {}",
                    width * height,
                    data.len()
                ),
            });
        }

        let (w, h) = (width as usize, height as usize);
        let (out_w, out_h) = match rotation {
            Rotation::Rotate180 => (w, h),
            Rotation::Rotate90 | Rotation::Rotate270 => (h, w),
        };

        let mut rotated = vec![0u16; data.len()];
        for y in 0..h {
            for x in 0..w {
                let (dx, dy) = match rotation {
                    Rotation::Rotate90 => (h - 1 - y, x),
                    Rotation::Rotate180 => (w - 1 - x, h - 1 - y),
                    Rotation::Rotate270 => (y, w - 1 - x),
                };
                rotated[dy * out_w + dx] = data[y * w + x];
            }
        }

        Ok((rotated, out_w as u32, out_h as u32))
    }

    /// Serialize words little-endian, the layout fbtft expects
    pub fn to_le_bytes(words: &[u16], out: &mut Vec<u8>) {
        out.clear();
        out.reserve(words.len() * 2);
        for word in words {
            out.extend_from_slice(&word.to_le_bytes());
        }
    }
}
