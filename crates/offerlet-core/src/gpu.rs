//! GPU scheduling policy

use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::{ConfigError, Feature, Features};

/// How GPU requirements take part in offer matching
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GpuSchedulingMode {
    /// GPU requirements are not evaluated
    #[default]
    Undefined,
    /// GPU units must come from reserved fragments
    Restricted,
    /// GPU units may come from any accepted fragment
    Unrestricted,
}

impl FromStr for GpuSchedulingMode {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "undefined" => Ok(GpuSchedulingMode::Undefined),
            "restricted" => Ok(GpuSchedulingMode::Restricted),
            "unrestricted" => Ok(GpuSchedulingMode::Unrestricted),
            other => Err(ConfigError::InvalidMode(other.to_string())),
        }
    }
}

impl std::fmt::Display for GpuSchedulingMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GpuSchedulingMode::Undefined => write!(f, "undefined"),
            GpuSchedulingMode::Restricted => write!(f, "restricted"),
            GpuSchedulingMode::Unrestricted => write!(f, "unrestricted"),
        }
    }
}

/// GPU scheduling policy, built once from configuration
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GpuPolicy {
    mode: GpuSchedulingMode,
}

impl GpuPolicy {
    /// Parse `mode` and check it against the GPU feature flag
    ///
    /// The literal is parsed first, so an unknown value reports
    /// [`ConfigError::InvalidMode`] regardless of the feature flag.
    pub fn validate(mode: &str, gpu_feature_enabled: bool) -> Result<GpuSchedulingMode, ConfigError> {
        let parsed: GpuSchedulingMode = mode.parse()?;
        if parsed != GpuSchedulingMode::Undefined && !gpu_feature_enabled {
            return Err(ConfigError::GpuFeatureRequired {
                mode: parsed.to_string(),
            });
        }
        Ok(parsed)
    }

    /// Build the policy from the configured mode and enabled features
    pub fn new(mode: &str, features: &Features) -> Result<Self, ConfigError> {
        let mode = Self::validate(mode, features.is_enabled(Feature::GpuResources))?;
        Ok(Self { mode })
    }

    /// The validated mode
    pub fn mode(&self) -> GpuSchedulingMode {
        self.mode
    }

    /// Whether GPU requirements are evaluated at all
    pub fn evaluates_gpus(&self) -> bool {
        self.mode != GpuSchedulingMode::Undefined
    }

    /// Whether GPU units must come from reserved fragments
    pub fn requires_reservation(&self) -> bool {
        self.mode == GpuSchedulingMode::Restricted
    }
}
