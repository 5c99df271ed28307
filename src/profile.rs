//! Capture profiles and the profile catalog.
//!
//! A profile bundles the quality/resolution/cadence/session-length
//! parameters for one capture target. Profiles are data: hosts extend the
//! catalog by passing more entries in [`crate::CaptureConfig`], not by
//! adding code.

use std::time::Duration;

use lazy_static::lazy_static;
use serde::{Deserialize, Serialize};

use crate::error::{CaptureError, CaptureResult};

/// Parameters applied while a profile is selected.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CaptureProfile {
    /// Identifier used by the host's settings surface.
    pub id: String,
    /// Display name, also the on-disk profile directory name.
    pub name: String,
    /// JPEG quality (1-100).
    pub quality: u8,
    /// Desired output width in pixels.
    pub target_width: u32,
    /// Desired output height in pixels.
    pub target_height: u32,
    /// Frames captured into one session folder before rotation.
    pub frames_per_session: u32,
    /// Minimum spacing between two accepted captures, in milliseconds.
    pub min_interval_ms: u64,
}

impl CaptureProfile {
    /// Validate and clamp settings to acceptable ranges.
    pub fn validate(&mut self) {
        self.quality = self.quality.clamp(1, 100);
        self.target_width = self.target_width.max(16);
        self.target_height = self.target_height.max(16);
        self.frames_per_session = self.frames_per_session.max(1);
    }

    /// Throttle interval as a [`Duration`]. Zero means capture at tick rate.
    pub fn min_interval(&self) -> Duration {
        Duration::from_millis(self.min_interval_ms)
    }
}

lazy_static! {
    /// Built-in profile table. Hosts typically start from these and add
    /// their own entries.
    pub static ref BUILTIN_PROFILES: Vec<CaptureProfile> = vec![
        CaptureProfile {
            id: "high-fidelity".to_string(),
            name: "HighFidelity".to_string(),
            quality: 90,
            target_width: 1920,
            target_height: 1080,
            frames_per_session: 15,
            min_interval_ms: 2000,
        },
        CaptureProfile {
            id: "fast".to_string(),
            name: "Fast".to_string(),
            quality: 70,
            target_width: 1280,
            target_height: 720,
            frames_per_session: 20,
            min_interval_ms: 1000,
        },
    ];
}

/// Lookup table from profile identifier to profile record.
///
/// The first entry is the default selection. Unknown identifiers resolve to
/// `None` and leave the active profile unchanged.
#[derive(Debug, Clone)]
pub struct ProfileCatalog {
    profiles: Vec<CaptureProfile>,
}

impl ProfileCatalog {
    /// Build a catalog from configured profiles, clamping each entry.
    ///
    /// An empty list or a profile without an id/name is rejected: the
    /// pipeline needs at least one valid default.
    pub fn new(profiles: Vec<CaptureProfile>) -> CaptureResult<Self> {
        if profiles.is_empty() {
            return Err(CaptureError::InvalidConfig(
                "profile catalog is empty".to_string(),
            ));
        }

        let mut validated = Vec::with_capacity(profiles.len());
        for mut profile in profiles {
            if profile.id.is_empty() || profile.name.is_empty() {
                return Err(CaptureError::InvalidConfig(format!(
                    "profile with empty id or name (id: {:?}, name: {:?})",
                    profile.id, profile.name
                )));
            }
            profile.validate();
            validated.push(profile);
        }

        Ok(Self {
            profiles: validated,
        })
    }

    /// Look up a profile by identifier.
    pub fn resolve(&self, id: &str) -> Option<&CaptureProfile> {
        self.profiles.iter().find(|p| p.id == id)
    }

    /// The default selection (first entry).
    pub fn default_profile(&self) -> &CaptureProfile {
        &self.profiles[0]
    }

    pub fn profiles(&self) -> &[CaptureProfile] {
        &self.profiles
    }
}
