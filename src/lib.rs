//! Periodic frame capture for live-rendered video sources.
//!
//! Samples the host's rendered output on its render ticks, downscales each
//! sample on the GPU, and encodes JPEGs into timestamped session folders on
//! a background thread. The render thread never blocks on encoding: frames
//! cross over through a single-slot latest-wins mailbox.
//!
//! ## Components
//! - `pipeline`: `CapturePipeline`, the host-facing surface
//! - `sampler`: per-tick throttle/downscale/stage state machine, `GpuScaler` trait
//! - `worker`: background encode thread
//! - `mailbox`: single-slot latest-wins handoff
//! - `session`: session folders, rotation, timestamp naming
//! - `jpeg`: scanline extraction and JPEG encoding
//! - `profile`: capture profiles and the built-in catalog
//! - `config`: construction-time configuration
//! - `software`: CPU reference `GpuScaler` for tests and the demo binary
//!
//! ```no_run
//! use stillcap::{CaptureConfig, CapturePipeline, CaptureResult, SoftwareScaler};
//!
//! fn main() -> CaptureResult<()> {
//!     let mut pipeline = CapturePipeline::new(CaptureConfig::default(), SoftwareScaler::new())?;
//!     // From the host's render loop:
//!     pipeline.on_render_tick();
//!     pipeline.shutdown();
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod error;
pub mod jpeg;
pub mod mailbox;
pub mod pipeline;
pub mod profile;
pub mod sampler;
pub mod session;
pub mod software;
pub mod types;
mod worker;

pub use config::CaptureConfig;
pub use error::{CaptureError, CaptureResult, ResultExt};
pub use pipeline::CapturePipeline;
pub use profile::{CaptureProfile, ProfileCatalog, BUILTIN_PROFILES};
pub use sampler::{fit_target, GpuScaler, MappedPixels, TickOutcome};
pub use session::timestamp_id;
pub use software::SoftwareScaler;
pub use types::{RawFrame, StatsSnapshot};
