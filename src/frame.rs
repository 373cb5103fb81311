use std::sync::Arc;
use std::time::SystemTime;

/// RGB24 frame produced by a camera sensor
#[derive(Debug, Clone)]
pub struct FrameData {
    /// Monotonic per-sensor frame counter
    pub id: u64,
    /// When the sensor produced the frame
    pub timestamp: SystemTime,
    /// Packed RGB24 pixels, shared between the renderer and the encoder
    pub data: Arc<Vec<u8>>,
    pub width: u32,
    pub height: u32,
}

impl FrameData {
    pub const BYTES_PER_PIXEL: usize = 3;

    pub fn new(id: u64, timestamp: SystemTime, data: Vec<u8>, width: u32, height: u32) -> Self {
        Self {
            id,
            timestamp,
            data: Arc::new(data),
            width,
            height,
        }
    }

    pub fn expected_size(&self) -> usize {
        self.width as usize * self.height as usize * Self::BYTES_PER_PIXEL
    }

    /// Check the buffer length against the stated dimensions
    pub fn validate_size(&self) -> bool {
        self.data.len() == self.expected_size()
    }

    /// Pixel at (x, y); `None` outside the frame or on a short buffer
    pub fn pixel(&self, x: u32, y: u32) -> Option<(u8, u8, u8)> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let index = (y as usize * self.width as usize + x as usize) * Self::BYTES_PER_PIXEL;
        let rgb = self.data.get(index..index + Self::BYTES_PER_PIXEL)?;
        Some((rgb[0], rgb[1], rgb[2]))
    }

    pub fn age_ms(&self) -> u64 {
        SystemTime::now()
            .duration_since(self.timestamp)
            .unwrap_or_default()
            .as_millis() as u64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frame_size_validation() {
        let frame = FrameData::new(1, SystemTime::now(), vec![0; 4 * 2 * 3], 4, 2);
        assert!(frame.validate_size());

        let short = FrameData::new(2, SystemTime::now(), vec![0; 10], 4, 2);
        assert!(!short.validate_size());
        assert_eq!(short.pixel(3, 1), None);
    }

    #[test]
    fn test_pixel_lookup() {
        let mut data = vec![0u8; 2 * 2 * 3];
        data[9..12].copy_from_slice(&[10, 20, 30]);
        let frame = FrameData::new(1, SystemTime::now(), data, 2, 2);

        assert_eq!(frame.pixel(1, 1), Some((10, 20, 30)));
        assert_eq!(frame.pixel(0, 0), Some((0, 0, 0)));
        assert_eq!(frame.pixel(2, 0), None);
    }
}
