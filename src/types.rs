//! Core types shared across the capture pipeline.

use std::sync::atomic::{AtomicU64, Ordering};

/// A downscaled frame staged out of GPU memory, ready for encoding.
///
/// Pixel data is packed 4 bytes per pixel (3 color channels + 1 padding
/// channel). Rows are `stride` bytes apart; `stride` may exceed `width * 4`
/// because GPU readback pads rows to an alignment boundary.
#[derive(Debug, Clone)]
pub struct RawFrame {
    /// Pixel data, `stride * height` bytes.
    pub data: Vec<u8>,
    /// Row length in bytes (>= width * 4).
    pub stride: usize,
    /// Frame width in pixels.
    pub width: u32,
    /// Frame height in pixels.
    pub height: u32,
}

impl RawFrame {
    pub fn new(data: Vec<u8>, stride: usize, width: u32, height: u32) -> Self {
        Self {
            data,
            stride,
            width,
            height,
        }
    }
}

/// Shared pipeline counters, updated from both threads.
#[derive(Debug, Default)]
pub struct CaptureStats {
    /// Frames published into the handoff slot.
    frames_published: AtomicU64,
    /// Frames displaced from the slot by a newer publish before encoding.
    frames_coalesced: AtomicU64,
    /// Frames successfully written to disk.
    frames_encoded: AtomicU64,
    /// Frames dropped because the encode or session I/O failed.
    encode_failures: AtomicU64,
    /// Session folders opened.
    sessions_opened: AtomicU64,
}

impl CaptureStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_published(&self) {
        self.frames_published.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_coalesced(&self) {
        self.frames_coalesced.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_encoded(&self) {
        self.frames_encoded.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_encode_failure(&self) {
        self.encode_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_session_opened(&self) {
        self.sessions_opened.fetch_add(1, Ordering::Relaxed);
    }

    /// Read a consistent-enough snapshot of all counters.
    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            frames_published: self.frames_published.load(Ordering::Relaxed),
            frames_coalesced: self.frames_coalesced.load(Ordering::Relaxed),
            frames_encoded: self.frames_encoded.load(Ordering::Relaxed),
            encode_failures: self.encode_failures.load(Ordering::Relaxed),
            sessions_opened: self.sessions_opened.load(Ordering::Relaxed),
        }
    }
}

/// Point-in-time view of [`CaptureStats`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StatsSnapshot {
    pub frames_published: u64,
    pub frames_coalesced: u64,
    pub frames_encoded: u64,
    pub encode_failures: u64,
    pub sessions_opened: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_raw_frame_new() {
        let frame = RawFrame::new(vec![0u8; 256 * 2], 256, 60, 2);
        assert_eq!(frame.stride, 256);
        assert_eq!(frame.width, 60);
        assert_eq!(frame.height, 2);
        assert_eq!(frame.data.len(), 512);
    }

    #[test]
    fn test_stats_counters() {
        let stats = CaptureStats::new();
        stats.record_published();
        stats.record_published();
        stats.record_coalesced();
        stats.record_encoded();
        stats.record_encode_failure();
        stats.record_session_opened();

        let snap = stats.snapshot();
        assert_eq!(snap.frames_published, 2);
        assert_eq!(snap.frames_coalesced, 1);
        assert_eq!(snap.frames_encoded, 1);
        assert_eq!(snap.encode_failures, 1);
        assert_eq!(snap.sessions_opened, 1);
    }

    #[test]
    fn test_snapshot_default_is_zero() {
        let snap = CaptureStats::new().snapshot();
        assert_eq!(snap, StatsSnapshot::default());
    }
}
