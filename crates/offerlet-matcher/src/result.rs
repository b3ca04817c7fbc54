//! Match outcomes and consumption records

use offerlet_core::{ProviderId, ReservationInfo};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Free-text annotation describing the matching scope
///
/// Diagnostics only; never compared when match results are compared.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ScopeNote(pub String);

impl ScopeNote {
    pub fn new(note: impl Into<String>) -> Self {
        Self(note.into())
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl std::fmt::Display for ScopeNote {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// One fragment's contribution to a satisfied requirement
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Consumption {
    /// Units taken from the fragment, never empty
    pub consumed_unit_ids: BTreeSet<String>,
    /// Role of the source fragment
    pub role: String,
    /// Provider of the source fragment
    pub provider_id: Option<ProviderId>,
    /// Reservation of the source fragment
    pub reservation: Option<ReservationInfo>,
}

/// Resource declaration for an acceptance message, one per scope tuple
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceDescriptor {
    /// Resource name (e.g., "gpus")
    pub name: String,
    pub role: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reservation: Option<ReservationInfo>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub provider_id: Option<ProviderId>,
    /// Union of the units consumed under this scope
    pub unit_ids: BTreeSet<String>,
}

/// A requirement satisfied by an offer
#[derive(Debug, Clone)]
pub struct SetMatch {
    pub resource_name: String,
    pub required_value: u32,
    /// Consumed portions, in consumption order
    pub consumed: Vec<Consumption>,
    pub scope_note: ScopeNote,
}

impl SetMatch {
    /// Total number of consumed units
    pub fn consumed_total(&self) -> usize {
        self.consumed.iter().map(|c| c.consumed_unit_ids.len()).sum()
    }

    /// Union of all consumed units
    pub fn consumed_unit_ids(&self) -> BTreeSet<String> {
        self.consumed
            .iter()
            .flat_map(|c| c.consumed_unit_ids.iter().cloned())
            .collect()
    }

    /// Merge the consumed portions into one descriptor per distinct
    /// (role, reservation, provider) tuple
    ///
    /// Descriptors follow the order in which each tuple first appears in
    /// [`SetMatch::consumed`].
    pub fn to_consumed_resources(&self) -> Vec<ResourceDescriptor> {
        let mut descriptors: Vec<ResourceDescriptor> = Vec::new();

        for consumption in &self.consumed {
            let existing = descriptors.iter_mut().find(|d| {
                d.role == consumption.role
                    && d.reservation == consumption.reservation
                    && d.provider_id == consumption.provider_id
            });

            match existing {
                Some(descriptor) => descriptor
                    .unit_ids
                    .extend(consumption.consumed_unit_ids.iter().cloned()),
                None => descriptors.push(ResourceDescriptor {
                    name: self.resource_name.clone(),
                    role: consumption.role.clone(),
                    reservation: consumption.reservation.clone(),
                    provider_id: consumption.provider_id.clone(),
                    unit_ids: consumption.consumed_unit_ids.clone(),
                }),
            }
        }

        descriptors
    }
}

impl PartialEq for SetMatch {
    fn eq(&self, other: &Self) -> bool {
        self.resource_name == other.resource_name
            && self.required_value == other.required_value
            && self.consumed == other.consumed
    }
}

impl Eq for SetMatch {}

impl std::fmt::Display for SetMatch {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}{} SATISFIED ({} <= {})",
            self.resource_name,
            self.scope_note,
            self.required_value,
            self.consumed_total()
        )
    }
}

/// A requirement the offer cannot satisfy
///
/// Has no resource-building operation; only [`SetMatch`] can be turned
/// into acceptance resources.
#[derive(Debug, Clone)]
pub struct NoMatch {
    pub resource_name: String,
    pub required_value: u32,
    /// Units available under the considered roles, always below `required_value`
    pub offered_total: usize,
    pub scope_note: ScopeNote,
}

impl PartialEq for NoMatch {
    fn eq(&self, other: &Self) -> bool {
        self.resource_name == other.resource_name
            && self.required_value == other.required_value
            && self.offered_total == other.offered_total
    }
}

impl Eq for NoMatch {}

impl std::fmt::Display for NoMatch {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}{} NOT SATISFIED ({} > {})",
            self.resource_name, self.scope_note, self.required_value, self.offered_total
        )
    }
}

/// Outcome of matching one requirement against one offer
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MatchResult {
    Match(SetMatch),
    NoMatch(NoMatch),
}

impl MatchResult {
    pub fn is_match(&self) -> bool {
        matches!(self, MatchResult::Match(_))
    }

    pub fn as_match(&self) -> Option<&SetMatch> {
        match self {
            MatchResult::Match(m) => Some(m),
            MatchResult::NoMatch(_) => None,
        }
    }

    pub fn into_match(self) -> Option<SetMatch> {
        match self {
            MatchResult::Match(m) => Some(m),
            MatchResult::NoMatch(_) => None,
        }
    }

    pub fn resource_name(&self) -> &str {
        match self {
            MatchResult::Match(m) => &m.resource_name,
            MatchResult::NoMatch(n) => &n.resource_name,
        }
    }

    pub fn scope_note(&self) -> &ScopeNote {
        match self {
            MatchResult::Match(m) => &m.scope_note,
            MatchResult::NoMatch(n) => &n.scope_note,
        }
    }
}

impl std::fmt::Display for MatchResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MatchResult::Match(m) => write!(f, "{}", m),
            MatchResult::NoMatch(n) => write!(f, "{}", n),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn consumption(role: &str, units: &[&str]) -> Consumption {
        Consumption {
            consumed_unit_ids: units.iter().map(|s| s.to_string()).collect(),
            role: role.to_string(),
            provider_id: None,
            reservation: None,
        }
    }

    fn set_match(consumed: Vec<Consumption>) -> SetMatch {
        SetMatch {
            resource_name: "gpus".to_string(),
            required_value: 3,
            consumed,
            scope_note: ScopeNote::default(),
        }
    }

    #[test]
    fn test_match_display() {
        let mut m = set_match(vec![
            consumption("unreserved", &["g1", "g2"]),
            consumption("unreserved", &["g3"]),
        ]);
        assert_eq!(m.to_string(), "gpus SATISFIED (3 <= 3)");

        m.scope_note = ScopeNote::new(" [window-a]");
        assert_eq!(
            MatchResult::Match(m).to_string(),
            "gpus [window-a] SATISFIED (3 <= 3)"
        );
    }

    #[test]
    fn test_no_match_display() {
        let n = NoMatch {
            resource_name: "gpus".to_string(),
            required_value: 5,
            offered_total: 4,
            scope_note: ScopeNote::default(),
        };
        assert_eq!(n.to_string(), "gpus NOT SATISFIED (5 > 4)");
    }

    #[test]
    fn test_scope_note_ignored_by_equality() {
        let a = set_match(vec![consumption("unreserved", &["g1"])]);
        let mut b = a.clone();
        b.scope_note = ScopeNote::new("maintenance");
        assert_eq!(a, b);
    }

    #[test]
    fn test_consumed_resources_merge_same_scope() {
        let m = set_match(vec![
            consumption("unreserved", &["g1", "g2"]),
            consumption("unreserved", &["g3"]),
        ]);

        let resources = m.to_consumed_resources();
        assert_eq!(resources.len(), 1);
        assert_eq!(resources[0].name, "gpus");
        assert_eq!(resources[0].unit_ids.len(), 3);
    }

    #[test]
    fn test_consumed_resources_split_by_role_and_reservation() {
        let mut reserved_a = consumption("gpu-team", &["g1"]);
        reserved_a.reservation = Some(ReservationInfo::for_principal("a"));
        let mut reserved_b = consumption("gpu-team", &["g2"]);
        reserved_b.reservation = Some(ReservationInfo::for_principal("b"));
        let mut provided = consumption("gpu-team", &["g5"]);
        provided.reservation = Some(ReservationInfo::for_principal("a"));
        provided.provider_id = Some(ProviderId::new("rp-1"));

        let m = set_match(vec![
            consumption("unreserved", &["g3"]),
            reserved_a,
            consumption("gpu-team", &["g4"]),
            reserved_b,
            provided,
        ]);

        let resources = m.to_consumed_resources();
        assert_eq!(resources.len(), 5);

        let roles: Vec<&str> = resources.iter().map(|r| r.role.as_str()).collect();
        assert_eq!(
            roles,
            vec!["unreserved", "gpu-team", "gpu-team", "gpu-team", "gpu-team"]
        );

        let union: BTreeSet<String> = resources
            .iter()
            .flat_map(|r| r.unit_ids.iter().cloned())
            .collect();
        assert_eq!(union, m.consumed_unit_ids());
    }

    #[test]
    fn test_consumed_resources_merge_non_adjacent() {
        let m = set_match(vec![
            consumption("gpu-team", &["g1"]),
            consumption("unreserved", &["g2"]),
            consumption("gpu-team", &["g3"]),
        ]);

        let resources = m.to_consumed_resources();
        assert_eq!(resources.len(), 2);
        assert_eq!(resources[0].role, "gpu-team");
        assert_eq!(resources[0].unit_ids.len(), 2);
        assert_eq!(resources[1].role, "unreserved");
    }

    #[test]
    fn test_match_result_accessors() {
        let result = MatchResult::NoMatch(NoMatch {
            resource_name: "gpus".to_string(),
            required_value: 2,
            offered_total: 0,
            scope_note: ScopeNote::new(" [rack-7]"),
        });
        assert!(!result.is_match());
        assert!(result.as_match().is_none());
        assert_eq!(result.resource_name(), "gpus");
        assert_eq!(result.scope_note().to_string(), " [rack-7]");
    }
}
