//! CPU reference implementation of [`GpuScaler`].
//!
//! Used by the demo binary and the integration tests in place of a real
//! device. Downscaling is nearest-neighbor; the staging buffer pads rows to
//! the same 256-byte alignment GPU readback would, so consumers see
//! realistic strides.

use crate::sampler::{GpuScaler, MappedPixels};

/// Readback rows are padded to this alignment, matching GPU copy rules.
const READBACK_ROW_ALIGN: usize = 256;

struct SourceFrame {
    data: Vec<u8>,
    width: u32,
    height: u32,
}

/// Software stand-in for the host's GPU downscale/readback capability.
///
/// The host (or demo loop) feeds packed 4-channel source frames through
/// [`SoftwareScaler::set_source_frame`]; the pipeline drives the rest
/// through the [`GpuScaler`] trait.
#[derive(Default)]
pub struct SoftwareScaler {
    source: Option<SourceFrame>,
    target: Vec<u8>,
    target_size: (u32, u32),
    staging: Vec<u8>,
    staging_size: (u32, u32),
    stride: usize,
    mapped: bool,
}

impl SoftwareScaler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed the next source frame as tight packed 4-channel scanlines.
    ///
    /// A buffer whose length does not match `width * height * 4` is
    /// rejected and the previous source kept.
    pub fn set_source_frame(&mut self, data: Vec<u8>, width: u32, height: u32) {
        let expected = width as usize * height as usize * 4;
        if data.len() != expected {
            log::warn!(
                "[SAMPLER] Rejected source frame: {} bytes for {}x{} (expected {})",
                data.len(),
                width,
                height,
                expected
            );
            return;
        }
        self.source = Some(SourceFrame {
            data,
            width,
            height,
        });
    }
}

impl GpuScaler for SoftwareScaler {
    fn source_size(&mut self) -> (u32, u32) {
        match &self.source {
            Some(src) => (src.width, src.height),
            None => (0, 0),
        }
    }

    fn render_scaled(&mut self, width: u32, height: u32) -> bool {
        let Some(src) = &self.source else {
            return false;
        };

        // Nearest-neighbor sample into a tight 4-channel target.
        self.target.resize(width as usize * height as usize * 4, 0);
        let src_row = src.width as usize * 4;
        for y in 0..height as usize {
            let sy = y * src.height as usize / height as usize;
            for x in 0..width as usize {
                let sx = x * src.width as usize / width as usize;
                let from = sy * src_row + sx * 4;
                let to = (y * width as usize + x) * 4;
                self.target[to..to + 4].copy_from_slice(&src.data[from..from + 4]);
            }
        }
        self.target_size = (width, height);
        true
    }

    fn resize_staging(&mut self, width: u32, height: u32) -> bool {
        let row_bytes = width as usize * 4;
        self.stride = (row_bytes + READBACK_ROW_ALIGN - 1) & !(READBACK_ROW_ALIGN - 1);
        self.staging = vec![0u8; self.stride * height as usize];
        self.staging_size = (width, height);
        true
    }

    fn map_staged(&mut self) -> Option<MappedPixels<'_>> {
        if self.mapped {
            return None;
        }
        if self.target_size == (0, 0) || self.target_size != self.staging_size {
            return None;
        }

        let (width, height) = self.target_size;
        let row_bytes = width as usize * 4;
        for y in 0..height as usize {
            let from = y * row_bytes;
            let to = y * self.stride;
            self.staging[to..to + row_bytes].copy_from_slice(&self.target[from..from + row_bytes]);
        }

        self.mapped = true;
        Some(MappedPixels {
            data: &self.staging,
            stride: self.stride,
        })
    }

    fn unmap(&mut self) {
        self.mapped = false;
    }
}
