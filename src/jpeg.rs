//! JPEG encoding of staged frames.
//!
//! Frames arrive as packed 4-channel scanlines (3 color channels + 1
//! padding channel) with a row stride that may exceed `width * 4` due to
//! GPU readback alignment. Rows are repacked to RGB and handed to the
//! `image` crate's JPEG encoder at the profile's quality.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use image::codecs::jpeg::JpegEncoder;

use crate::error::{CaptureError, CaptureResult};

/// Encode one staged frame to `out_path`.
///
/// `pixels` must hold at least `stride * height` bytes. Failures to create
/// or write the file, and encoder-internal errors, are returned to the
/// caller; the frame is simply lost.
pub fn encode_frame(
    pixels: &[u8],
    stride: usize,
    width: u32,
    height: u32,
    quality: u8,
    out_path: &Path,
) -> CaptureResult<()> {
    let row_bytes = width as usize * 4;
    if stride < row_bytes {
        return Err(CaptureError::Encoding(format!(
            "stride {} shorter than row length {}",
            stride, row_bytes
        )));
    }
    if pixels.len() < stride * height as usize {
        return Err(CaptureError::Encoding(format!(
            "buffer holds {} bytes, need {} for {}x{} at stride {}",
            pixels.len(),
            stride * height as usize,
            width,
            height,
            stride
        )));
    }

    // Repack to tight RGB rows, dropping the padding channel and the
    // alignment tail of each row.
    let mut rgb = Vec::with_capacity(width as usize * height as usize * 3);
    for row in pixels.chunks_exact(stride).take(height as usize) {
        for px in row[..row_bytes].chunks_exact(4) {
            rgb.extend_from_slice(&px[..3]);
        }
    }

    let img: image::RgbImage = image::ImageBuffer::from_raw(width, height, rgb)
        .ok_or_else(|| CaptureError::Encoding("repacked buffer size mismatch".to_string()))?;

    let file = File::create(out_path)?;
    let mut writer = BufWriter::new(file);
    let mut encoder = JpegEncoder::new_with_quality(&mut writer, quality);
    encoder.encode_image(&img)?;
    writer.flush()?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::path::PathBuf;

    fn test_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("stillcap-jpeg-{}", name));
        let _ = fs::remove_dir_all(&dir);
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    fn solid_frame(width: u32, height: u32, stride: usize, rgb: [u8; 3]) -> Vec<u8> {
        let mut pixels = vec![0xAB; stride * height as usize];
        for y in 0..height as usize {
            for x in 0..width as usize {
                let at = y * stride + x * 4;
                pixels[at] = rgb[0];
                pixels[at + 1] = rgb[1];
                pixels[at + 2] = rgb[2];
                pixels[at + 3] = 0xFF;
            }
        }
        pixels
    }

    #[test]
    fn test_encode_tight_stride() {
        let dir = test_dir("tight");
        let path = dir.join("red.jpeg");
        let pixels = solid_frame(8, 4, 8 * 4, [255, 0, 0]);

        encode_frame(&pixels, 8 * 4, 8, 4, 90, &path).unwrap();

        let img = image::open(&path).unwrap().to_rgb8();
        assert_eq!((img.width(), img.height()), (8, 4));
        let px = img.get_pixel(3, 2);
        assert!(px[0] > 200 && px[1] < 80 && px[2] < 80, "expected red, got {:?}", px);

        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_encode_padded_stride() {
        let dir = test_dir("padded");
        let path = dir.join("green.jpeg");
        // 256-byte rows for a 8px-wide frame, as GPU readback would pad.
        let pixels = solid_frame(8, 4, 256, [0, 255, 0]);

        encode_frame(&pixels, 256, 8, 4, 90, &path).unwrap();

        let img = image::open(&path).unwrap().to_rgb8();
        assert_eq!((img.width(), img.height()), (8, 4));
        let px = img.get_pixel(7, 0);
        assert!(px[1] > 200 && px[0] < 80 && px[2] < 80, "expected green, got {:?}", px);

        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_encode_missing_dir_fails() {
        let dir = test_dir("missing");
        let path = dir.join("not-there").join("frame.jpeg");
        let pixels = solid_frame(4, 4, 16, [1, 2, 3]);

        let err = encode_frame(&pixels, 16, 4, 4, 80, &path).unwrap_err();
        assert!(matches!(err, CaptureError::Storage(_)));

        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_encode_short_buffer_fails() {
        let dir = test_dir("short");
        let path = dir.join("frame.jpeg");
        let pixels = vec![0u8; 16];

        let err = encode_frame(&pixels, 64, 16, 16, 80, &path).unwrap_err();
        assert!(matches!(err, CaptureError::Encoding(_)));
        assert!(!path.exists());

        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_encode_stride_below_row_length_fails() {
        let dir = test_dir("stride");
        let path = dir.join("frame.jpeg");
        let pixels = vec![0u8; 1024];

        let err = encode_frame(&pixels, 8, 16, 4, 80, &path).unwrap_err();
        assert!(matches!(err, CaptureError::Encoding(_)));

        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_quality_affects_file_size() {
        let dir = test_dir("quality");
        let noisy: Vec<u8> = (0..64u32 * 64 * 4)
            .map(|i| ((i * 31 + i / 7) % 251) as u8)
            .collect();

        let low = dir.join("low.jpeg");
        let high = dir.join("high.jpeg");
        encode_frame(&noisy, 64 * 4, 64, 64, 10, &low).unwrap();
        encode_frame(&noisy, 64 * 4, 64, 64, 95, &high).unwrap();

        let low_size = fs::metadata(&low).unwrap().len();
        let high_size = fs::metadata(&high).unwrap().len();
        assert!(
            high_size > low_size,
            "quality 95 ({} bytes) should outweigh quality 10 ({} bytes)",
            high_size,
            low_size
        );

        let _ = fs::remove_dir_all(&dir);
    }
}
