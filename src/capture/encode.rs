use crate::frame::FrameData;
use image::codecs::jpeg::JpegEncoder;
use image::ColorType;
use std::io::{self, BufWriter, Write};

/// Encode an RGB24 frame as JPEG into `out`
pub(crate) fn encode_jpeg<W: Write>(frame: &FrameData, quality: u8, out: W) -> io::Result<()> {
    if !frame.validate_size() {
        return Err(io::Error::new(
            io::ErrorKind::InvalidData,
            format!(
                "frame {} is {} bytes, expected {} for {}x{}",
                frame.id,
                frame.data.len(),
                frame.expected_size(),
                frame.width,
                frame.height
            ),
        ));
    }

    let mut writer = BufWriter::new(out);
    JpegEncoder::new_with_quality(&mut writer, quality.clamp(1, 100))
        .encode(&frame.data, frame.width, frame.height, ColorType::Rgb8)
        .map_err(|e| io::Error::new(io::ErrorKind::Other, e))?;
    writer.flush()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::SystemTime;

    #[test]
    fn test_encodes_valid_jpeg() {
        let frame = FrameData::new(1, SystemTime::now(), vec![128; 16 * 8 * 3], 16, 8);
        let mut out = Vec::new();
        encode_jpeg(&frame, 85, &mut out).unwrap();

        assert_eq!(&out[..2], &[0xFF, 0xD8]);
        assert_eq!(&out[out.len() - 2..], &[0xFF, 0xD9]);
    }

    #[test]
    fn test_rejects_short_frame() {
        let frame = FrameData::new(1, SystemTime::now(), vec![0; 10], 16, 8);
        assert!(encode_jpeg(&frame, 85, Vec::new()).is_err());
    }
}
