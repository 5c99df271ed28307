//! Background encode worker.
//!
//! Owns the session state and consumes the frame mailbox on a dedicated
//! thread. Session rotation, JPEG encoding, and the shutdown finalize all
//! happen here, off the render thread.

use std::sync::Arc;
use std::thread::{self, JoinHandle};

use chrono::{DateTime, Local};

use crate::error::{CaptureError, CaptureResult};
use crate::jpeg;
use crate::mailbox::MailboxReceiver;
use crate::pipeline::SharedState;
use crate::session::SessionManager;
use crate::types::RawFrame;

pub(crate) struct EncodeWorker {
    sessions: SessionManager,
    shared: Arc<SharedState>,
    frames: MailboxReceiver<RawFrame>,
}

impl EncodeWorker {
    pub(crate) fn new(
        sessions: SessionManager,
        shared: Arc<SharedState>,
        frames: MailboxReceiver<RawFrame>,
    ) -> Self {
        Self {
            sessions,
            shared,
            frames,
        }
    }

    /// Start the worker thread. It runs until the frame mailbox closes.
    pub(crate) fn spawn(self) -> CaptureResult<JoinHandle<()>> {
        thread::Builder::new()
            .name("stillcap-encode".to_string())
            .spawn(move || self.run())
            .map_err(|e| CaptureError::WorkerSpawn(e.to_string()))
    }

    fn run(mut self) {
        log::info!("[ENCODER] Encode worker started");
        while let Some(frame) = self.frames.recv() {
            self.handle_frame(frame, Local::now());
        }
        // Mailbox closed; seal whatever session is open.
        self.sessions.finalize_current();
        log::info!("[ENCODER] Encode worker stopped");
    }

    fn handle_frame(&mut self, frame: RawFrame, at: DateTime<Local>) {
        let profile = self.shared.profile.read().clone();

        if self.sessions.should_rotate(&profile) {
            if let Err(e) = self.sessions.rotate(at, &profile) {
                log::error!("[ENCODER] Failed to open session folder: {}", e);
                self.shared.stats.record_encode_failure();
                return;
            }
            self.shared.stats.record_session_opened();
        }

        let Some(path) = self.sessions.frame_path(at) else {
            // Rotation above guarantees an open session; treat a miss as a
            // dropped frame rather than panic.
            self.shared.stats.record_encode_failure();
            return;
        };

        match jpeg::encode_frame(
            &frame.data,
            frame.stride,
            frame.width,
            frame.height,
            profile.quality,
            &path,
        ) {
            Ok(()) => {
                self.shared.stats.record_encoded();
                log::debug!("[ENCODER] Wrote {}", path.display());
            }
            Err(e) => {
                self.shared.stats.record_encode_failure();
                log::warn!("[ENCODER] Failed to encode {}: {}", path.display(), e);
            }
        }

        // The session slot is consumed even when the encode failed, so a
        // bad frame cannot wedge rotation.
        self.sessions.record_frame();
    }
}
