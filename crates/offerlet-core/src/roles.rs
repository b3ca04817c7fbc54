//! Role admission policy
//!
//! Decides which resource roles a framework instance accepts offers for.
//! The wildcard role is always accepted; the configured primary role, if
//! any, is accepted as well. Nothing else is ever implicitly accepted.

use std::collections::BTreeSet;
use tracing::debug;

use crate::{ConfigError, UNRESERVED_ROLE};

/// Role admission policy, built once from configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RolePolicy {
    primary_role: Option<String>,
    default_accepted_roles: Option<BTreeSet<String>>,
}

impl RolePolicy {
    /// Create a policy, validating the accepted-roles override against the
    /// roles the framework can be offered
    pub fn new(
        primary_role: Option<String>,
        default_accepted_roles: Option<BTreeSet<String>>,
    ) -> Result<Self, ConfigError> {
        let mut policy = Self {
            primary_role,
            default_accepted_roles: None,
        };

        if let Some(candidates) = default_accepted_roles {
            policy.default_accepted_roles = Some(policy.validate(&candidates)?);
        }

        debug!(
            primary_role = ?policy.primary_role,
            accepted = ?policy.default_accepted_roles(),
            "Role policy configured"
        );

        Ok(policy)
    }

    /// Policy with no primary role and no override
    pub fn unreserved_only() -> Self {
        Self {
            primary_role: None,
            default_accepted_roles: None,
        }
    }

    /// The configured primary role
    pub fn primary_role(&self) -> Option<&str> {
        self.primary_role.as_deref()
    }

    /// Roles this framework can be offered resources for
    pub fn expected_roles(&self) -> BTreeSet<String> {
        let mut roles = BTreeSet::new();
        roles.insert(UNRESERVED_ROLE.to_string());
        if let Some(role) = &self.primary_role {
            roles.insert(role.clone());
        }
        roles
    }

    /// Check that `candidates` is a non-empty subset of the expected roles
    pub fn validate(&self, candidates: &BTreeSet<String>) -> Result<BTreeSet<String>, ConfigError> {
        if candidates.is_empty() {
            return Err(ConfigError::EmptySet);
        }

        let expected = self.expected_roles();
        let extraneous: BTreeSet<String> = candidates.difference(&expected).cloned().collect();
        if !extraneous.is_empty() {
            return Err(ConfigError::RolesNotOffered { extraneous });
        }

        Ok(candidates.clone())
    }

    /// Roles accepted when a workload does not name its own
    pub fn default_accepted_roles(&self) -> BTreeSet<String> {
        self.default_accepted_roles
            .clone()
            .unwrap_or_else(|| self.expected_roles())
    }
}

impl Default for RolePolicy {
    fn default() -> Self {
        Self::unreserved_only()
    }
}
