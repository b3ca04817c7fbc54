//! Configuration types for offerlet

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::path::Path;
use tracing::info;

use crate::{Features, GpuPolicy, OfferletError, OfferletResult, RolePolicy};

/// Main framework configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FrameworkConfig {
    /// Framework settings
    pub framework: FrameworkSettings,
    /// Logging configuration
    pub logging: LoggingConfig,
}

impl FrameworkConfig {
    /// Load configuration from a TOML file
    pub fn from_file(path: &Path) -> OfferletResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            OfferletError::ConfigLoad(format!("Failed to read {}: {}", path.display(), e))
        })?;
        Self::from_toml_str(&content)
    }

    /// Parse configuration from TOML text
    pub fn from_toml_str(content: &str) -> OfferletResult<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Build the startup policies, failing on the first invalid setting
    pub fn policies(&self) -> OfferletResult<FrameworkPolicies> {
        let settings = &self.framework;

        let features = Features::parse(&settings.features)?;
        let roles = RolePolicy::new(
            settings.role.clone(),
            settings.default_accepted_roles.clone(),
        )?;
        let gpu = GpuPolicy::new(&settings.gpu_scheduling_behavior, &features)?;

        info!(
            framework = %settings.name,
            expected_roles = ?roles.expected_roles(),
            gpu_mode = %gpu.mode(),
            "Framework policies loaded"
        );

        Ok(FrameworkPolicies {
            features,
            roles,
            gpu,
            fragment_order: settings.fragment_order.clone(),
        })
    }
}

/// Framework settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FrameworkSettings {
    /// Framework name
    pub name: String,
    /// Primary role the framework registers with
    pub role: Option<String>,
    /// Override for the roles accepted by default
    pub default_accepted_roles: Option<BTreeSet<String>>,
    /// Enabled feature names
    pub features: Vec<String>,
    /// GPU scheduling behavior literal
    pub gpu_scheduling_behavior: String,
    /// Order in which offered fragments are consumed
    pub fragment_order: FragmentOrder,
}

impl Default for FrameworkSettings {
    fn default() -> Self {
        Self {
            name: "offerlet".to_string(),
            role: None,
            default_accepted_roles: None,
            features: Vec::new(),
            gpu_scheduling_behavior: "undefined".to_string(),
            fragment_order: FragmentOrder::UnreservedFirst,
        }
    }
}

/// Fragment consumption order
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FragmentOrder {
    /// Consume fragments in the order the offer lists them
    AsOffered,
    /// Consume unreserved fragments before reserved ones
    #[default]
    UnreservedFirst,
    /// Consume fragments by the position of their role in the list;
    /// unlisted roles go last
    RolePriority(Vec<String>),
}

/// Policies derived from a validated configuration
#[derive(Debug, Clone)]
pub struct FrameworkPolicies {
    pub features: Features,
    pub roles: RolePolicy,
    pub gpu: GpuPolicy,
    pub fragment_order: FragmentOrder,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LoggingConfig {
    /// Log level
    pub level: String,
    /// Log format (json or text)
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "text".to_string(),
        }
    }
}
