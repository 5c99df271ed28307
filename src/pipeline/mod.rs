//! Capture pipeline assembly and host-facing surface.
//!
//! [`CapturePipeline`] owns both ends of the pipeline: the render-thread
//! sampler and the encode worker thread, wired together by the single-slot
//! frame mailbox. The host drives it with one [`CapturePipeline::on_render_tick`]
//! call per render tick and tears it down with [`CapturePipeline::shutdown`]
//! (also run from `Drop`).


use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::thread::JoinHandle;

use parking_lot::RwLock;

use crate::config::CaptureConfig;
use crate::error::{CaptureError, CaptureResult, ResultExt};
use crate::mailbox::mailbox;
use crate::profile::{CaptureProfile, ProfileCatalog};
use crate::sampler::{GpuScaler, TickOutcome, TickSampler};
use crate::session::SessionManager;
use crate::types::{CaptureStats, StatsSnapshot};
use crate::worker::EncodeWorker;

/// State shared between the render-thread sampler and the encode worker.
pub(crate) struct SharedState {
    /// Currently selected profile; write-swapped by profile selection,
    /// read once per tick and once per encoded frame.
    pub(crate) profile: RwLock<CaptureProfile>,
    pub(crate) stats: CaptureStats,
}

impl SharedState {
    pub(crate) fn new(profile: CaptureProfile) -> Self {
        Self {
            profile: RwLock::new(profile),
            stats: CaptureStats::new(),
        }
    }
}

/// Periodic frame capture: GPU downscale on the render thread, JPEG
/// encoding on a background worker, latest-wins handoff in between.
pub struct CapturePipeline<S: GpuScaler> {
    sampler: TickSampler<S>,
    shared: Arc<SharedState>,
    catalog: ProfileCatalog,
    captures_root: PathBuf,
    worker: Option<JoinHandle<()>>,
}

impl<S: GpuScaler> CapturePipeline<S> {
    /// Build the pipeline and start the encode worker.
    ///
    /// Creates `<root>/<product_dir>/Captures` plus one subdirectory per
    /// catalog profile. `root` is `config.storage_root` when set, else the
    /// OS app-data directory. Fails when the root cannot be resolved, the
    /// directories cannot be created, the catalog is unusable, or the
    /// worker thread cannot be spawned; partially created state is
    /// released on the way out.
    pub fn new(mut config: CaptureConfig, scaler: S) -> CaptureResult<Self> {
        config.validate();
        if config.product_dir.is_empty() {
            return Err(CaptureError::InvalidConfig(
                "productDir must not be empty".to_string(),
            ));
        }
        let catalog = ProfileCatalog::new(config.profiles)?;

        let root = match config.storage_root {
            Some(root) => root,
            None => dirs::data_dir().ok_or(CaptureError::DataDirUnavailable)?,
        };
        let captures_root = root.join(&config.product_dir).join("Captures");
        fs::create_dir_all(&captures_root)
            .with_context(|| format!("create captures root {}", captures_root.display()))?;
        for profile in catalog.profiles() {
            let dir = captures_root.join(&profile.name);
            fs::create_dir_all(&dir)
                .with_context(|| format!("create profile folder {}", dir.display()))?;
        }

        let initial = match config.initial_profile.as_deref() {
            Some(id) => match catalog.resolve(id) {
                Some(profile) => profile.clone(),
                None => {
                    log::warn!(
                        "[CAPTURE] Unknown initial profile {:?}, using {}",
                        id,
                        catalog.default_profile().name
                    );
                    catalog.default_profile().clone()
                }
            },
            None => catalog.default_profile().clone(),
        };

        let shared = Arc::new(SharedState::new(initial.clone()));
        let (frames_tx, frames_rx) = mailbox();
        let worker = EncodeWorker::new(
            SessionManager::new(captures_root.clone()),
            Arc::clone(&shared),
            frames_rx,
        )
        .spawn()?;

        log::info!(
            "[CAPTURE] Pipeline ready at {} (profile {})",
            captures_root.display(),
            initial.name
        );

        Ok(Self {
            sampler: TickSampler::new(scaler, frames_tx, Arc::clone(&shared)),
            shared,
            catalog,
            captures_root,
            worker: Some(worker),
        })
    }

    /// Run one sampling tick on the caller's (render) thread.
    ///
    /// Returns promptly and never blocks on the encode side.
    pub fn on_render_tick(&mut self) -> TickOutcome {
        self.sampler.tick()
    }

    /// Switch the active capture profile by catalog id.
    ///
    /// The swap is atomic; the next processed frame rotates into a fresh
    /// session under the new profile. Unknown ids are a logged no-op and
    /// return false.
    pub fn select_profile(&self, id: &str) -> bool {
        match self.catalog.resolve(id) {
            Some(profile) => {
                let mut selected = self.shared.profile.write();
                if selected.id != profile.id {
                    log::info!(
                        "[CAPTURE] Switching profile {} -> {}",
                        selected.name,
                        profile.name
                    );
                    *selected = profile.clone();
                }
                true
            }
            None => {
                log::warn!("[CAPTURE] Ignoring unknown profile {:?}", id);
                false
            }
        }
    }

    /// Snapshot of the currently selected profile.
    pub fn selected_profile(&self) -> CaptureProfile {
        self.shared.profile.read().clone()
    }

    /// Profiles recognized by this pipeline, in catalog order.
    pub fn profiles(&self) -> &[CaptureProfile] {
        self.catalog.profiles()
    }

    /// Root directory session folders are created under.
    pub fn captures_root(&self) -> &Path {
        &self.captures_root
    }

    /// Snapshot of the pipeline counters.
    pub fn stats(&self) -> StatsSnapshot {
        self.shared.stats.snapshot()
    }

    /// Access the wrapped scaler, e.g. to feed source frames to a
    /// [`crate::SoftwareScaler`].
    pub fn scaler_mut(&mut self) -> &mut S {
        self.sampler.scaler_mut()
    }

    /// Stop capturing: close the handoff, then join the worker. The worker
    /// exits without processing further frames and finalizes the open
    /// session on the way out. Safe to call more than once; `Drop` calls
    /// it as well.
    pub fn shutdown(&mut self) {
        self.sampler.close();
        if let Some(handle) = self.worker.take() {
            log::info!("[CAPTURE] Waiting for encode worker to drain");
            if handle.join().is_err() {
                log::error!("[CAPTURE] Encode worker panicked");
            }
        }
    }
}

impl<S: GpuScaler> Drop for CapturePipeline<S> {
    // Worker must be joined before the scaler is released.
    fn drop(&mut self) {
        self.shutdown();
    }
}
