//! Error types for offerlet

use std::collections::BTreeSet;
use thiserror::Error;

/// Configuration validation failure
///
/// Raised once while building the framework policies at startup. Every
/// variant carries the offending value(s) so the loader can print an
/// actionable message before refusing to start.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// An accepted-roles list was given but contains no roles
    #[error("accepted resource roles must not be empty")]
    EmptySet,

    /// Accepted roles that the framework will never be offered
    #[error(
        "accepted resource roles contain roles the framework is not offered: {}",
        join_roles(.extraneous)
    )]
    RolesNotOffered { extraneous: BTreeSet<String> },

    /// A GPU scheduling mode was configured without the GPU feature
    #[error("gpu scheduling behavior '{mode}' requires the gpu_resources feature to be enabled")]
    GpuFeatureRequired { mode: String },

    /// Unrecognized GPU scheduling mode literal
    #[error("invalid gpu scheduling behavior '{0}', expected one of: undefined, restricted, unrestricted")]
    InvalidMode(String),

    /// Unrecognized feature flag
    #[error("unknown feature '{0}'")]
    UnknownFeature(String),
}

fn join_roles(roles: &BTreeSet<String>) -> String {
    roles
        .iter()
        .map(String::as_str)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Main error type for offerlet
#[derive(Error, Debug)]
pub enum OfferletError {
    /// Configuration validation error
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Configuration could not be read or parsed
    #[error("Failed to load configuration: {0}")]
    ConfigLoad(String),

    /// Requirement rejected at construction
    #[error("Invalid requirement: {0}")]
    InvalidRequirement(String),

    /// Offer violates the fragment invariants
    #[error("Malformed offer: {0}")]
    MalformedOffer(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Result type for offerlet operations
pub type OfferletResult<T> = Result<T, OfferletError>;

impl From<serde_json::Error> for OfferletError {
    fn from(err: serde_json::Error) -> Self {
        OfferletError::Serialization(err.to_string())
    }
}

impl From<toml::de::Error> for OfferletError {
    fn from(err: toml::de::Error) -> Self {
        OfferletError::ConfigLoad(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = OfferletError::InvalidRequirement("gpus must be positive".to_string());
        assert_eq!(err.to_string(), "Invalid requirement: gpus must be positive");
    }

    #[test]
    fn test_roles_not_offered_lists_sorted_roles() {
        let err = ConfigError::RolesNotOffered {
            extraneous: ["zeta".to_string(), "other".to_string()].into_iter().collect(),
        };
        assert_eq!(
            err.to_string(),
            "accepted resource roles contain roles the framework is not offered: other, zeta"
        );
    }

    #[test]
    fn test_config_error_wraps_into_main_error() {
        let err: OfferletError = ConfigError::EmptySet.into();
        assert!(matches!(err, OfferletError::Config(ConfigError::EmptySet)));
        assert_eq!(
            err.to_string(),
            "Configuration error: accepted resource roles must not be empty"
        );
    }

    #[test]
    fn test_error_from_io() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: OfferletError = io_err.into();
        assert!(matches!(err, OfferletError::Io(_)));
    }
}
