//! Fragment consumption order
//!
//! The matcher consumes fragments in exactly the order it is handed, so
//! the strategy chosen here decides which fragments a match draws from.
//! Every strategy is a stable sort: fragments that compare equal keep
//! their offer order, which keeps repeated evaluations identical.

use offerlet_core::{FragmentOrder, ResourceFragment};
use std::sync::Arc;

/// Strategy for ordering offered fragments before matching
pub trait FragmentOrdering: Send + Sync {
    /// Return the fragments in consumption order
    fn order(&self, fragments: Vec<ResourceFragment>) -> Vec<ResourceFragment>;

    /// Name of the strategy
    fn name(&self) -> &str;
}

/// Keep the offer order
pub struct AsOffered;

impl FragmentOrdering for AsOffered {
    fn order(&self, fragments: Vec<ResourceFragment>) -> Vec<ResourceFragment> {
        fragments
    }

    fn name(&self) -> &str {
        "AsOffered"
    }
}

/// Unreserved-role fragments first, then unreserved fragments of other
/// roles, reserved fragments last
pub struct UnreservedFirst;

impl UnreservedFirst {
    fn rank(fragment: &ResourceFragment) -> u8 {
        match (fragment.is_unreserved_role(), fragment.reservation.is_some()) {
            (true, false) => 0,
            (false, false) => 1,
            (_, true) => 2,
        }
    }
}

impl FragmentOrdering for UnreservedFirst {
    fn order(&self, mut fragments: Vec<ResourceFragment>) -> Vec<ResourceFragment> {
        fragments.sort_by_key(Self::rank);
        fragments
    }

    fn name(&self) -> &str {
        "UnreservedFirst"
    }
}

/// Order by position of the fragment's role in a priority list; roles not
/// listed go last
pub struct RolePriority {
    roles: Vec<String>,
}

impl RolePriority {
    pub fn new(roles: Vec<String>) -> Self {
        Self { roles }
    }
}

impl FragmentOrdering for RolePriority {
    fn order(&self, mut fragments: Vec<ResourceFragment>) -> Vec<ResourceFragment> {
        fragments.sort_by_key(|f| {
            self.roles
                .iter()
                .position(|r| *r == f.role)
                .unwrap_or(self.roles.len())
        });
        fragments
    }

    fn name(&self) -> &str {
        "RolePriority"
    }
}

/// Strategy for a configured fragment order
pub fn ordering_for(order: &FragmentOrder) -> Arc<dyn FragmentOrdering> {
    match order {
        FragmentOrder::AsOffered => Arc::new(AsOffered),
        FragmentOrder::UnreservedFirst => Arc::new(UnreservedFirst),
        FragmentOrder::RolePriority(roles) => Arc::new(RolePriority::new(roles.clone())),
    }
}
