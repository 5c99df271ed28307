//! Demo: drive the capture pipeline against a synthetic animated source.
//!
//! Runs a ~60Hz render loop for a few seconds, switches the capture
//! profile midway, and reports where the JPEG sessions landed.
//! `RUST_LOG=debug` surfaces per-tick decisions.

use std::thread;
use std::time::Duration;

use stillcap::{CaptureConfig, CapturePipeline, CaptureResult, SoftwareScaler, TickOutcome};

const SOURCE_W: u32 = 1280;
const SOURCE_H: u32 = 720;

fn main() -> CaptureResult<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let mut config = CaptureConfig::default();
    config.storage_root = Some(std::env::temp_dir().join("stillcap-demo"));
    // Shorten the built-in cadence so a short run produces output.
    for profile in &mut config.profiles {
        profile.min_interval_ms = 150;
        profile.frames_per_session = 4;
    }

    let mut pipeline = CapturePipeline::new(config, SoftwareScaler::new())?;
    log::info!("[DEMO] Capturing to {}", pipeline.captures_root().display());

    for tick in 0..180u32 {
        pipeline
            .scaler_mut()
            .set_source_frame(render_source(tick), SOURCE_W, SOURCE_H);

        match pipeline.on_render_tick() {
            TickOutcome::Published => log::debug!("[DEMO] Tick {} published", tick),
            outcome => log::trace!("[DEMO] Tick {} skipped: {:?}", tick, outcome),
        }

        if tick == 90 {
            pipeline.select_profile("fast");
        }
        thread::sleep(Duration::from_millis(16));
    }

    pipeline.shutdown();

    let stats = pipeline.stats();
    log::info!(
        "[DEMO] Done: {} published, {} encoded, {} coalesced, {} failures, {} sessions",
        stats.frames_published,
        stats.frames_encoded,
        stats.frames_coalesced,
        stats.encode_failures,
        stats.sessions_opened
    );
    Ok(())
}

/// Animated gradient so successive captures differ visibly.
fn render_source(tick: u32) -> Vec<u8> {
    let mut data = Vec::with_capacity((SOURCE_W * SOURCE_H * 4) as usize);
    let phase = tick * 3;
    for y in 0..SOURCE_H {
        for x in 0..SOURCE_W {
            data.extend_from_slice(&[
                ((x + phase) % 256) as u8,
                ((y + phase / 2) % 256) as u8,
                ((x + y) % 256) as u8,
                255,
            ]);
        }
    }
    data
}
