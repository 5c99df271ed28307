//! Session folders: rotation, naming, and completion markers.
//!
//! Frames are grouped into timestamped folders per profile. A folder
//! rotates out when its frame budget is exhausted or the selected profile
//! changes; rotation writes an empty `done` marker so downstream consumers
//! know the folder will never gain more frames.

use std::fs::{self, File};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};

use crate::error::{CaptureResult, ResultExt};
use crate::profile::CaptureProfile;

/// Format a timestamp as the canonical 17-digit folder/file id
/// (`YYYYMMDDhhmmssSSS`, millisecond precision).
pub fn timestamp_id(at: DateTime<Local>) -> String {
    at.format("%Y%m%d%H%M%S%3f").to_string()
}

/// One rotation period of captured frames sharing a folder.
#[derive(Debug)]
pub struct Session {
    dir: PathBuf,
    folder_id: String,
    profile_tag: String,
    frame_count: u32,
    completed: bool,
}

impl Session {
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn folder_id(&self) -> &str {
        &self.folder_id
    }

    pub fn profile_tag(&self) -> &str {
        &self.profile_tag
    }

    pub fn frame_count(&self) -> u32 {
        self.frame_count
    }

    /// Write the `done` marker. Guarded so it runs at most once; after
    /// this the session never gains frames.
    fn finalize(&mut self) {
        if self.completed {
            return;
        }
        self.completed = true;

        let marker = self.dir.join("done");
        match File::create(&marker) {
            Ok(_) => log::info!(
                "[SESSION] Finalized {} ({} frames)",
                self.folder_id,
                self.frame_count
            ),
            Err(e) => log::error!(
                "[SESSION] Failed to write done marker in {}: {}",
                self.dir.display(),
                e
            ),
        }
    }
}

/// Owns the current session and applies the rotation policy.
#[derive(Debug)]
pub struct SessionManager {
    captures_root: PathBuf,
    current: Option<Session>,
}

impl SessionManager {
    pub fn new(captures_root: PathBuf) -> Self {
        Self {
            captures_root,
            current: None,
        }
    }

    pub fn current(&self) -> Option<&Session> {
        self.current.as_ref()
    }

    /// True when the next frame needs a fresh folder: no session is open,
    /// the frame budget is exhausted, or the selected profile changed.
    pub fn should_rotate(&self, profile: &CaptureProfile) -> bool {
        match &self.current {
            None => true,
            Some(session) => {
                session.frame_count >= profile.frames_per_session
                    || session.profile_tag != profile.name
            }
        }
    }

    /// Finalize the outgoing session (if any) and open a fresh folder
    /// named after `at` under the profile's directory.
    ///
    /// On failure no session is open, so the next frame retries the open.
    pub fn rotate(&mut self, at: DateTime<Local>, profile: &CaptureProfile) -> CaptureResult<()> {
        if let Some(mut outgoing) = self.current.take() {
            outgoing.finalize();
        }

        let folder_id = timestamp_id(at);
        let dir = self.captures_root.join(&profile.name).join(&folder_id);
        fs::create_dir_all(&dir)
            .with_context(|| format!("create session folder {}", dir.display()))?;

        log::info!("[SESSION] Opened {} for profile {}", folder_id, profile.name);
        self.current = Some(Session {
            dir,
            folder_id,
            profile_tag: profile.name.clone(),
            frame_count: 0,
            completed: false,
        });
        Ok(())
    }

    /// Finalize and drop the current session, if any. Idempotent.
    pub fn finalize_current(&mut self) {
        if let Some(mut session) = self.current.take() {
            session.finalize();
        }
    }

    /// Path for a frame captured at `at` in the current session.
    ///
    /// Two captures within the same millisecond collide and overwrite;
    /// callers must not assume sub-millisecond uniqueness.
    pub fn frame_path(&self, at: DateTime<Local>) -> Option<PathBuf> {
        self.current
            .as_ref()
            .map(|session| session.dir.join(format!("{}.jpeg", timestamp_id(at))))
    }

    /// Count a processed frame against the current session's budget.
    pub fn record_frame(&mut self) {
        if let Some(session) = &mut self.current {
            session.frame_count += 1;
        }
    }
}
