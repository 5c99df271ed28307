//! Render-tick sampling: throttle, downscale, stage, publish.
//!
//! The sampler runs on the host's render thread. Each tick it decides
//! whether to capture (throttle), asks the [`GpuScaler`] to downscale the
//! source into an offscreen target, stages the result to CPU-visible
//! memory, and publishes an owned copy into the handoff slot. It never
//! blocks on the encode side.

use std::sync::Arc;
use std::time::Instant;

use crate::mailbox::MailboxSender;
use crate::pipeline::SharedState;
use crate::types::RawFrame;

/// GPU downscale/readback capability, implemented by the host.
///
/// All methods are called from the render thread only and must return
/// promptly. The GPU resources behind an implementation stay owned by that
/// implementation; the sampler only ever copies mapped bytes out.
pub trait GpuScaler {
    /// Base dimensions of the upstream source. Zero in either axis means
    /// the source is not ready this tick.
    fn source_size(&mut self) -> (u32, u32);

    /// Composite the source into an offscreen target of the given size.
    /// Returns false when the render pass cannot begin this tick.
    fn render_scaled(&mut self, width: u32, height: u32) -> bool;

    /// Recreate the CPU-readback surface for a new target size. Returns
    /// false when the surface cannot be (re)allocated.
    fn resize_staging(&mut self, width: u32, height: u32) -> bool;

    /// Stage the rendered target into CPU-visible memory and map it. The
    /// view stays valid until [`GpuScaler::unmap`].
    fn map_staged(&mut self) -> Option<MappedPixels<'_>>;

    /// Release the mapping produced by [`GpuScaler::map_staged`].
    fn unmap(&mut self);
}

/// Borrowed view of mapped staging memory.
///
/// Holds `stride * height` bytes of packed 4-channel scanlines; `stride`
/// may exceed `width * 4` due to readback row alignment.
pub struct MappedPixels<'a> {
    pub data: &'a [u8],
    pub stride: usize,
}

/// Why a tick did or did not publish a frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// A frame was staged and published for encoding.
    Published,
    /// Skipped: the throttle interval has not elapsed yet.
    Throttled,
    /// Skipped: the upstream source reported zero dimensions.
    SourceNotReady,
    /// Skipped: the downscale render pass could not begin.
    RenderUnavailable,
    /// Skipped: the staging surface could not be resized or mapped.
    StagingUnavailable,
}

/// Target size preserving the source aspect ratio against the desired
/// envelope: the constraining axis is pinned to the envelope and the other
/// axis scales with the source ratio, rounded to the nearest pixel.
pub fn fit_target(base_w: u32, base_h: u32, desired_w: u32, desired_h: u32) -> (u32, u32) {
    let (bw, bh) = (base_w as u64, base_h as u64);
    let (dw, dh) = (desired_w as u64, desired_h as u64);

    if bw * dh < dw * bh {
        // Source is narrower than the envelope: pin width.
        let height = (bh * dw + bw / 2) / bw;
        (desired_w, height as u32)
    } else {
        // Source is wider than or equal to the envelope: pin height.
        let width = (bw * dh + bh / 2) / bh;
        (width as u32, desired_h)
    }
}

/// Producer half of the pipeline, driven once per host render tick.
pub(crate) struct TickSampler<S: GpuScaler> {
    scaler: S,
    frames: MailboxSender<RawFrame>,
    shared: Arc<SharedState>,
    last_capture: Option<Instant>,
    staging_size: Option<(u32, u32)>,
}

impl<S: GpuScaler> TickSampler<S> {
    pub(crate) fn new(
        scaler: S,
        frames: MailboxSender<RawFrame>,
        shared: Arc<SharedState>,
    ) -> Self {
        Self {
            scaler,
            frames,
            shared,
            last_capture: None,
            staging_size: None,
        }
    }

    /// Run one sampling tick. The throttle clock advances only when a
    /// frame is actually published, so a skipped tick retries at full
    /// cadence.
    pub(crate) fn tick(&mut self) -> TickOutcome {
        let now = Instant::now();
        let (interval, desired_w, desired_h) = {
            let profile = self.shared.profile.read();
            (
                profile.min_interval(),
                profile.target_width,
                profile.target_height,
            )
        };

        if let Some(last) = self.last_capture {
            if now.duration_since(last) < interval {
                return TickOutcome::Throttled;
            }
        }

        let (base_w, base_h) = self.scaler.source_size();
        if base_w == 0 || base_h == 0 {
            return TickOutcome::SourceNotReady;
        }

        let (width, height) = fit_target(base_w, base_h, desired_w, desired_h);
        if !self.scaler.render_scaled(width, height) {
            return TickOutcome::RenderUnavailable;
        }

        if self.staging_size != Some((width, height)) {
            if !self.scaler.resize_staging(width, height) {
                return TickOutcome::StagingUnavailable;
            }
            self.staging_size = Some((width, height));
        }

        let frame = match self.scaler.map_staged() {
            Some(mapped) => RawFrame::new(mapped.data.to_vec(), mapped.stride, width, height),
            None => return TickOutcome::StagingUnavailable,
        };
        self.scaler.unmap();

        if let Some(displaced) = self.frames.publish(frame) {
            self.shared.stats.record_coalesced();
            log::debug!(
                "[SAMPLER] Coalesced unconsumed {}x{} frame",
                displaced.width,
                displaced.height
            );
        }
        self.shared.stats.record_published();
        self.last_capture = Some(now);
        TickOutcome::Published
    }

    /// Close the handoff so the encode worker drains out.
    pub(crate) fn close(&self) {
        self.frames.close();
    }

    pub(crate) fn scaler_mut(&mut self) -> &mut S {
        &mut self.scaler
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mailbox::{mailbox, MailboxReceiver};
    use crate::profile::CaptureProfile;

    fn profile(interval_ms: u64, width: u32, height: u32) -> CaptureProfile {
        CaptureProfile {
            id: "test".to_string(),
            name: "Test".to_string(),
            quality: 80,
            target_width: width,
            target_height: height,
            frames_per_session: 10,
            min_interval_ms: interval_ms,
        }
    }

    /// Scriptable scaler that fabricates frames on demand.
    struct ScriptedScaler {
        source: (u32, u32),
        render_ok: bool,
        map_ok: bool,
        stride_pad: usize,
        rendered: (u32, u32),
        staging: Vec<u8>,
        render_calls: u32,
        resize_calls: u32,
    }

    impl ScriptedScaler {
        fn new(source: (u32, u32)) -> Self {
            Self {
                source,
                render_ok: true,
                map_ok: true,
                stride_pad: 0,
                rendered: (0, 0),
                staging: Vec::new(),
                render_calls: 0,
                resize_calls: 0,
            }
        }
    }

    impl GpuScaler for ScriptedScaler {
        fn source_size(&mut self) -> (u32, u32) {
            self.source
        }

        fn render_scaled(&mut self, width: u32, height: u32) -> bool {
            self.render_calls += 1;
            self.rendered = (width, height);
            self.render_ok
        }

        fn resize_staging(&mut self, _width: u32, _height: u32) -> bool {
            self.resize_calls += 1;
            true
        }

        fn map_staged(&mut self) -> Option<MappedPixels<'_>> {
            if !self.map_ok {
                return None;
            }
            let stride = self.rendered.0 as usize * 4 + self.stride_pad;
            self.staging = vec![0x11; stride * self.rendered.1 as usize];
            Some(MappedPixels {
                data: &self.staging,
                stride,
            })
        }

        fn unmap(&mut self) {}
    }

    fn sampler_with(
        scaler: ScriptedScaler,
        profile: CaptureProfile,
    ) -> (TickSampler<ScriptedScaler>, MailboxReceiver<RawFrame>) {
        let (tx, rx) = mailbox();
        let shared = Arc::new(SharedState::new(profile));
        (TickSampler::new(scaler, tx, shared), rx)
    }

    #[test]
    fn test_fit_target_equal_ratios_is_exact() {
        assert_eq!(fit_target(1920, 1080, 1280, 720), (1280, 720));
        assert_eq!(fit_target(1280, 720, 1280, 720), (1280, 720));
    }

    #[test]
    fn test_fit_target_narrower_source_pins_width() {
        assert_eq!(fit_target(1024, 768, 1280, 720), (1280, 960));
    }

    #[test]
    fn test_fit_target_wider_source_pins_height() {
        // 21:9 source against a 16:9 envelope.
        assert_eq!(fit_target(2560, 1080, 1280, 720), (1707, 720));
    }

    #[test]
    fn test_fit_target_tall_source() {
        assert_eq!(fit_target(720, 1280, 1280, 720), (1280, 2276));
    }

    #[test]
    fn test_tick_publishes_then_throttles() {
        let (mut sampler, rx) = sampler_with(ScriptedScaler::new((1920, 1080)), profile(60_000, 1280, 720));

        assert_eq!(sampler.tick(), TickOutcome::Published);
        assert_eq!(sampler.tick(), TickOutcome::Throttled);

        let frame = rx.recv().unwrap();
        assert_eq!((frame.width, frame.height), (1280, 720));
    }

    #[test]
    fn test_zero_interval_publishes_every_tick() {
        let (mut sampler, rx) = sampler_with(ScriptedScaler::new((1920, 1080)), profile(0, 640, 360));

        assert_eq!(sampler.tick(), TickOutcome::Published);
        assert_eq!(sampler.tick(), TickOutcome::Published);
        assert_eq!(sampler.tick(), TickOutcome::Published);

        // Latest-wins: only the newest frame remains.
        assert!(rx.recv().is_some());
    }

    #[test]
    fn test_source_not_ready_skips_without_advancing_clock() {
        let mut scaler = ScriptedScaler::new((0, 1080));
        scaler.render_ok = true;
        let (mut sampler, rx) = sampler_with(scaler, profile(60_000, 1280, 720));

        assert_eq!(sampler.tick(), TickOutcome::SourceNotReady);

        // Source comes up; the skipped tick did not start the throttle.
        sampler.scaler_mut().source = (1920, 1080);
        assert_eq!(sampler.tick(), TickOutcome::Published);
        assert!(rx.recv().is_some());
    }

    #[test]
    fn test_render_failure_skips_tick() {
        let mut scaler = ScriptedScaler::new((1920, 1080));
        scaler.render_ok = false;
        let (mut sampler, _rx) = sampler_with(scaler, profile(60_000, 1280, 720));

        assert_eq!(sampler.tick(), TickOutcome::RenderUnavailable);

        sampler.scaler_mut().render_ok = true;
        assert_eq!(sampler.tick(), TickOutcome::Published);
    }

    #[test]
    fn test_map_failure_skips_tick() {
        let mut scaler = ScriptedScaler::new((1920, 1080));
        scaler.map_ok = false;
        let (mut sampler, _rx) = sampler_with(scaler, profile(0, 1280, 720));

        assert_eq!(sampler.tick(), TickOutcome::StagingUnavailable);
    }

    #[test]
    fn test_staging_resized_only_on_size_change() {
        let (mut sampler, _rx) = sampler_with(ScriptedScaler::new((1920, 1080)), profile(0, 1280, 720));

        assert_eq!(sampler.tick(), TickOutcome::Published);
        assert_eq!(sampler.tick(), TickOutcome::Published);
        assert_eq!(sampler.scaler_mut().resize_calls, 1);

        // Source size change forces a new target and a staging resize.
        sampler.scaler_mut().source = (1024, 768);
        assert_eq!(sampler.tick(), TickOutcome::Published);
        assert_eq!(sampler.scaler_mut().resize_calls, 2);
        assert_eq!(sampler.scaler_mut().rendered, (1280, 960));
    }

    #[test]
    fn test_published_frame_carries_padded_stride() {
        let mut scaler = ScriptedScaler::new((1280, 720));
        scaler.stride_pad = 64;
        let (mut sampler, rx) = sampler_with(scaler, profile(0, 1280, 720));

        assert_eq!(sampler.tick(), TickOutcome::Published);
        let frame = rx.recv().unwrap();
        assert_eq!(frame.stride, 1280 * 4 + 64);
        assert_eq!(frame.data.len(), frame.stride * 720);
    }

    #[test]
    fn test_coalescing_counts_displaced_frames() {
        let (mut sampler, rx) = sampler_with(ScriptedScaler::new((1920, 1080)), profile(0, 640, 360));

        sampler.tick();
        sampler.tick();
        sampler.tick();

        assert_eq!(sampler.shared.stats.snapshot().frames_published, 3);
        assert_eq!(sampler.shared.stats.snapshot().frames_coalesced, 2);
        assert!(rx.recv().is_some());
    }
}
