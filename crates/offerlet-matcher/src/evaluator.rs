//! Per-offer evaluation
//!
//! Wires the startup policies to the set-resource matcher. One evaluator is
//! built per framework instance and shared read-only across every offer
//! evaluation.

use offerlet_core::{FrameworkPolicies, GpuPolicy, Offer, Requirement, RolePolicy};
use std::collections::BTreeSet;
use std::sync::Arc;
use tracing::{debug, info};

use crate::ordering::{ordering_for, FragmentOrdering, UnreservedFirst};
use crate::result::{MatchResult, ScopeNote, SetMatch};
use crate::set_matcher::SetResourceMatcher;

/// Outcome of evaluating one requirement against one offer
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Evaluation {
    /// The requirement was not evaluated
    Skipped { reason: String },
    /// The matcher ran
    Evaluated(MatchResult),
}

impl Evaluation {
    pub fn is_match(&self) -> bool {
        matches!(self, Evaluation::Evaluated(r) if r.is_match())
    }
}

impl std::fmt::Display for Evaluation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Evaluation::Skipped { reason } => write!(f, "SKIPPED ({})", reason),
            Evaluation::Evaluated(result) => write!(f, "{}", result),
        }
    }
}

/// Accept/decline decision over a batch of offers for one requirement
#[derive(Debug, Clone, Default)]
pub struct OfferSelection {
    /// First matching offer and its match
    pub selected: Option<(String, SetMatch)>,
    /// Offers before the selected one that did not match
    pub declined: Vec<String>,
}

impl OfferSelection {
    /// Pick the first matching offer from evaluations given in offer order
    ///
    /// Offers before the selected one are declined; offers after it are
    /// left untouched. Skipped evaluations count as declined.
    pub fn from_evaluations<I, S>(evaluations: I) -> Self
    where
        I: IntoIterator<Item = (S, Evaluation)>,
        S: Into<String>,
    {
        let mut selection = Self::default();

        for (offer_id, evaluation) in evaluations {
            let offer_id = offer_id.into();
            match evaluation {
                Evaluation::Evaluated(MatchResult::Match(m)) => {
                    info!(offer_id = %offer_id, result = %m, "Offer selected");
                    selection.selected = Some((offer_id, m));
                    break;
                }
                _ => selection.declined.push(offer_id),
            }
        }

        selection
    }
}

/// Evaluates offers against requirements for one framework instance
pub struct OfferEvaluator {
    roles: Arc<RolePolicy>,
    gpu: GpuPolicy,
    gpu_matcher: SetResourceMatcher,
    matcher: SetResourceMatcher,
    ordering: Arc<dyn FragmentOrdering>,
}

impl OfferEvaluator {
    /// Create an evaluator with the default fragment order
    pub fn new(roles: Arc<RolePolicy>, gpu: GpuPolicy) -> Self {
        Self {
            roles,
            gpu_matcher: SetResourceMatcher::for_gpu_policy(&gpu),
            matcher: SetResourceMatcher::new(),
            gpu,
            ordering: Arc::new(UnreservedFirst),
        }
    }

    /// Create an evaluator from validated configuration
    pub fn from_policies(policies: &FrameworkPolicies) -> Self {
        Self::new(Arc::new(policies.roles.clone()), policies.gpu)
            .with_ordering(ordering_for(&policies.fragment_order))
    }

    /// Replace the fragment ordering strategy
    pub fn with_ordering(mut self, ordering: Arc<dyn FragmentOrdering>) -> Self {
        self.ordering = ordering;
        self
    }

    /// Roles matched against
    pub fn accepted_roles(&self) -> BTreeSet<String> {
        self.roles.default_accepted_roles()
    }

    /// Matcher for `requirement`; the GPU mode only constrains GPUs
    fn matcher_for(&self, requirement: &Requirement) -> &SetResourceMatcher {
        if requirement.is_gpu() {
            &self.gpu_matcher
        } else {
            &self.matcher
        }
    }

    /// Evaluate `requirement` against a single offer
    pub fn evaluate(
        &self,
        offer: &Offer,
        requirement: &Requirement,
        scope_note: ScopeNote,
    ) -> Evaluation {
        if requirement.is_gpu() && !self.gpu.evaluates_gpus() {
            debug!(offer_id = %offer.id, "GPU scheduling undefined, skipping GPU requirement");
            return Evaluation::Skipped {
                reason: format!("gpu scheduling behavior is {}", self.gpu.mode()),
            };
        }

        // Own copy per requirement so evaluations never share a fragment list.
        let fragments = self
            .ordering
            .order(offer.fragments_for(&requirement.resource_name));

        let result = self.matcher_for(requirement).match_requirement(
            requirement,
            &fragments,
            &self.accepted_roles(),
            scope_note,
        );

        debug!(
            offer_id = %offer.id,
            hostname = %offer.hostname,
            ordering = self.ordering.name(),
            result = %result,
            "Offer evaluated"
        );

        Evaluation::Evaluated(result)
    }
}
