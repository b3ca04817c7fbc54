//! Set-resource matcher
//!
//! Decides whether the fragments of one offer can satisfy a requirement for
//! discrete, individually identified units, and records exactly which units
//! are consumed from which fragment.
//!
//! Fragments are walked in the order given by the caller. Whole fragments
//! are consumed until the next one would overshoot; from that fragment the
//! lexicographically smallest unit ids are taken. Fragments whose role is
//! not accepted are invisible: they are neither consumed nor counted.

use offerlet_core::{GpuPolicy, Requirement, ResourceFragment};
use std::collections::BTreeSet;
use tracing::debug;

use crate::result::{Consumption, MatchResult, NoMatch, ScopeNote, SetMatch};

/// Matcher for set-typed resources such as GPUs
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SetResourceMatcher {
    /// Only reserved fragments may be consumed
    require_reservation: bool,
}

impl SetResourceMatcher {
    /// Matcher that accepts reserved and unreserved fragments
    pub fn new() -> Self {
        Self {
            require_reservation: false,
        }
    }

    /// Matcher that only consumes reserved fragments
    pub fn reserved_only() -> Self {
        Self {
            require_reservation: true,
        }
    }

    /// Matcher honoring the GPU scheduling mode
    pub fn for_gpu_policy(policy: &GpuPolicy) -> Self {
        Self {
            require_reservation: policy.requires_reservation(),
        }
    }

    pub fn requires_reservation(&self) -> bool {
        self.require_reservation
    }

    fn admits(&self, fragment: &ResourceFragment, accepted_roles: &BTreeSet<String>) -> bool {
        accepted_roles.contains(&fragment.role)
            && (!self.require_reservation || fragment.reservation.is_some())
    }

    /// Match `requirement` against `fragments`, consumed in slice order
    ///
    /// # Panics
    ///
    /// Panics if `requirement.required_value` is zero; requirements are
    /// validated when they are built.
    pub fn match_requirement(
        &self,
        requirement: &Requirement,
        fragments: &[ResourceFragment],
        accepted_roles: &BTreeSet<String>,
        scope_note: ScopeNote,
    ) -> MatchResult {
        assert!(
            requirement.required_value > 0,
            "requirement {} must ask for at least one unit",
            requirement.resource_name
        );

        let candidates: Vec<&ResourceFragment> = fragments
            .iter()
            .filter(|f| self.admits(f, accepted_roles))
            .collect();

        let offered_total: usize = candidates.iter().map(|f| f.unit_count()).sum();
        let required = requirement.required_value as usize;

        if offered_total < required {
            debug!(
                resource = %requirement.resource_name,
                required = required,
                offered = offered_total,
                skipped = fragments.len() - candidates.len(),
                "Requirement not satisfied"
            );
            return MatchResult::NoMatch(NoMatch {
                resource_name: requirement.resource_name.clone(),
                required_value: requirement.required_value,
                offered_total,
                scope_note,
            });
        }

        let mut consumed = Vec::new();
        let mut remaining = required;

        for fragment in candidates {
            if remaining == 0 {
                break;
            }

            // BTreeSet iteration is sorted, so a partial take is the
            // lexicographically smallest ids.
            let take = remaining.min(fragment.unit_count());
            let consumed_unit_ids: BTreeSet<String> =
                fragment.unit_ids.iter().take(take).cloned().collect();

            if consumed_unit_ids.is_empty() {
                continue;
            }

            remaining -= consumed_unit_ids.len();
            consumed.push(Consumption {
                consumed_unit_ids,
                role: fragment.role.clone(),
                provider_id: fragment.provider_id.clone(),
                reservation: fragment.reservation.clone(),
            });
        }

        debug!(
            resource = %requirement.resource_name,
            required = required,
            offered = offered_total,
            fragments = consumed.len(),
            "Requirement satisfied"
        );

        MatchResult::Match(SetMatch {
            resource_name: requirement.resource_name.clone(),
            required_value: requirement.required_value,
            consumed,
            scope_note,
        })
    }
}
