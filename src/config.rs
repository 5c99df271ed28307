//! Pipeline configuration.
//!
//! All capture behavior is parameterized through [`CaptureConfig`], passed
//! explicitly at construction. There is no global mutable configuration.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::profile::{CaptureProfile, BUILTIN_PROFILES};

/// Construction-time configuration for [`crate::CapturePipeline`].
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CaptureConfig {
    /// Product directory name under the app-data root.
    pub product_dir: String,

    /// Explicit storage root. `None` resolves the OS app-data directory.
    pub storage_root: Option<PathBuf>,

    /// Identifier of the initially selected profile. `None` or an unknown
    /// id selects the catalog's first profile.
    pub initial_profile: Option<String>,

    /// Recognized capture profiles. The first entry is the default.
    pub profiles: Vec<CaptureProfile>,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            product_dir: "Stillcap".to_string(),
            storage_root: None,
            initial_profile: None,
            profiles: BUILTIN_PROFILES.clone(),
        }
    }
}

impl CaptureConfig {
    /// Validate and clamp settings to acceptable ranges.
    pub fn validate(&mut self) {
        for profile in &mut self.profiles {
            profile.validate();
        }
    }
}
