//! Feature flags enabled for a framework instance

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::str::FromStr;

use crate::ConfigError;

/// Optional framework features
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Feature {
    /// Accept and match GPU resources
    GpuResources,
}

impl FromStr for Feature {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "gpu_resources" => Ok(Feature::GpuResources),
            other => Err(ConfigError::UnknownFeature(other.to_string())),
        }
    }
}

impl std::fmt::Display for Feature {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Feature::GpuResources => write!(f, "gpu_resources"),
        }
    }
}

/// The set of enabled features, fixed at startup
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Features {
    enabled: BTreeSet<Feature>,
}

impl Features {
    /// Create an empty feature set
    pub fn none() -> Self {
        Self::default()
    }

    /// Parse feature names, failing on the first unknown one
    pub fn parse<I, S>(names: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let enabled = names
            .into_iter()
            .map(|n| n.as_ref().parse())
            .collect::<Result<BTreeSet<Feature>, _>>()?;
        Ok(Self { enabled })
    }

    /// Check whether a feature is enabled
    pub fn is_enabled(&self, feature: Feature) -> bool {
        self.enabled.contains(&feature)
    }

    /// Iterate over enabled features
    pub fn iter(&self) -> impl Iterator<Item = Feature> + '_ {
        self.enabled.iter().copied()
    }
}

impl FromIterator<Feature> for Features {
    fn from_iter<T: IntoIterator<Item = Feature>>(iter: T) -> Self {
        Self {
            enabled: iter.into_iter().collect(),
        }
    }
}
