//! Offer, fragment and requirement type definitions

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashMap};

use crate::{OfferletError, OfferletResult};

/// Wildcard role under which unreserved resources are offered
pub const UNRESERVED_ROLE: &str = "unreserved";

/// Resource name used for GPU requirements
pub const GPU_RESOURCE: &str = "gpus";

/// Reservation marker attached to a pre-reserved fragment
///
/// Opaque to the matcher; it is only compared and passed through.
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ReservationInfo {
    /// Principal that made the reservation
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub principal: Option<String>,
    /// Reservation labels
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub labels: BTreeMap<String, String>,
}

impl ReservationInfo {
    /// Create a reservation made by the given principal
    pub fn for_principal(principal: impl Into<String>) -> Self {
        Self {
            principal: Some(principal.into()),
            labels: BTreeMap::new(),
        }
    }

    /// Add a label
    pub fn with_label(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.labels.insert(key.into(), value.into());
        self
    }
}

/// Identifier of a pluggable resource provider
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProviderId(pub String);

impl ProviderId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }
}

impl std::fmt::Display for ProviderId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One chunk of offered set-resource data, scoped by role, reservation and provider
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceFragment {
    /// Role the fragment was offered under
    pub role: String,
    /// Unit identifiers available in this fragment, kept sorted
    pub unit_ids: BTreeSet<String>,
    /// Reservation, if the fragment is pre-reserved
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reservation: Option<ReservationInfo>,
    /// Resource provider the fragment originates from
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provider_id: Option<ProviderId>,
}

impl ResourceFragment {
    /// Create an unreserved fragment offered under `role`
    pub fn new<I, S>(role: impl Into<String>, unit_ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            role: role.into(),
            unit_ids: unit_ids.into_iter().map(Into::into).collect(),
            reservation: None,
            provider_id: None,
        }
    }

    /// Attach a reservation
    pub fn with_reservation(mut self, reservation: ReservationInfo) -> Self {
        self.reservation = Some(reservation);
        self
    }

    /// Attach a resource provider
    pub fn with_provider(mut self, provider_id: ProviderId) -> Self {
        self.provider_id = Some(provider_id);
        self
    }

    /// Number of units in this fragment
    pub fn unit_count(&self) -> usize {
        self.unit_ids.len()
    }

    /// Whether the fragment was offered under the wildcard role
    pub fn is_unreserved_role(&self) -> bool {
        self.role == UNRESERVED_ROLE
    }
}

/// A discrete-resource requirement, e.g. three GPUs
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Requirement {
    /// Resource name (e.g., "gpus")
    pub resource_name: String,
    /// Number of units required, always positive
    pub required_value: u32,
}

impl Requirement {
    /// Create a requirement, rejecting a zero value
    pub fn new(resource_name: impl Into<String>, required_value: u32) -> OfferletResult<Self> {
        let resource_name = resource_name.into();
        if required_value == 0 {
            return Err(OfferletError::InvalidRequirement(format!(
                "{} must be greater than zero",
                resource_name
            )));
        }
        Ok(Self {
            resource_name,
            required_value,
        })
    }

    /// Create a GPU requirement
    pub fn gpus(count: u32) -> OfferletResult<Self> {
        Self::new(GPU_RESOURCE, count)
    }

    /// Whether this requirement asks for GPUs
    pub fn is_gpu(&self) -> bool {
        self.resource_name == GPU_RESOURCE
    }
}

/// A resource entry of an offer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OfferedResource {
    /// Resource name (e.g., "gpus")
    pub name: String,
    /// Offered fragment
    #[serde(flatten)]
    pub fragment: ResourceFragment,
}

/// A decoded resource offer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Offer {
    /// Offer identifier assigned by the resource manager
    pub id: String,
    /// Agent host the resources live on
    #[serde(default)]
    pub hostname: String,
    /// Offered resources
    #[serde(default)]
    pub resources: Vec<OfferedResource>,
}

impl Offer {
    /// Create an empty offer
    pub fn new(id: impl Into<String>, hostname: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            hostname: hostname.into(),
            resources: Vec::new(),
        }
    }

    /// Add a fragment for the named resource
    pub fn with_fragment(mut self, name: impl Into<String>, fragment: ResourceFragment) -> Self {
        self.resources.push(OfferedResource {
            name: name.into(),
            fragment,
        });
        self
    }

    /// Copy out the fragments offered for `name`, in offer order
    pub fn fragments_for(&self, name: &str) -> Vec<ResourceFragment> {
        self.resources
            .iter()
            .filter(|r| r.name == name)
            .map(|r| r.fragment.clone())
            .collect()
    }

    /// Check that fragments are non-empty and that no unit appears twice
    /// within the same resource
    pub fn validate(&self) -> OfferletResult<()> {
        let mut seen: HashMap<&str, BTreeSet<&str>> = HashMap::new();

        for resource in &self.resources {
            if resource.fragment.unit_ids.is_empty() {
                return Err(OfferletError::MalformedOffer(format!(
                    "offer {} has an empty {} fragment for role {}",
                    self.id, resource.name, resource.fragment.role
                )));
            }

            let units = seen.entry(resource.name.as_str()).or_default();
            for unit in &resource.fragment.unit_ids {
                if !units.insert(unit.as_str()) {
                    return Err(OfferletError::MalformedOffer(format!(
                        "offer {} lists {} unit {} in more than one fragment",
                        self.id, resource.name, unit
                    )));
                }
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_requirement_rejects_zero() {
        let result = Requirement::gpus(0);
        assert!(matches!(result, Err(OfferletError::InvalidRequirement(_))));
    }

    #[test]
    fn test_requirement_gpus() {
        let req = Requirement::gpus(2).unwrap();
        assert_eq!(req.resource_name, "gpus");
        assert_eq!(req.required_value, 2);
        assert!(req.is_gpu());
    }

    #[test]
    fn test_fragment_units_are_sorted() {
        let fragment = ResourceFragment::new(UNRESERVED_ROLE, ["g3", "g1", "g2"]);
        let units: Vec<&str> = fragment.unit_ids.iter().map(String::as_str).collect();
        assert_eq!(units, vec!["g1", "g2", "g3"]);
        assert!(fragment.is_unreserved_role());
    }

    #[test]
    fn test_fragments_for_filters_by_name() {
        let offer = Offer::new("o1", "agent-1")
            .with_fragment("gpus", ResourceFragment::new(UNRESERVED_ROLE, ["g1"]))
            .with_fragment("ports", ResourceFragment::new(UNRESERVED_ROLE, ["31000"]))
            .with_fragment("gpus", ResourceFragment::new("gpu-team", ["g2"]));

        let gpus = offer.fragments_for("gpus");
        assert_eq!(gpus.len(), 2);
        assert_eq!(gpus[1].role, "gpu-team");
    }

    #[test]
    fn test_validate_rejects_duplicate_units() {
        let offer = Offer::new("o1", "agent-1")
            .with_fragment("gpus", ResourceFragment::new(UNRESERVED_ROLE, ["g1", "g2"]))
            .with_fragment("gpus", ResourceFragment::new("gpu-team", ["g2"]));

        assert!(matches!(
            offer.validate(),
            Err(OfferletError::MalformedOffer(_))
        ));
    }

    #[test]
    fn test_validate_allows_same_id_across_resources() {
        let offer = Offer::new("o1", "agent-1")
            .with_fragment("gpus", ResourceFragment::new(UNRESERVED_ROLE, ["0"]))
            .with_fragment("disks", ResourceFragment::new(UNRESERVED_ROLE, ["0"]));

        assert!(offer.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_empty_fragment() {
        let offer = Offer::new("o1", "agent-1")
            .with_fragment("gpus", ResourceFragment::new(UNRESERVED_ROLE, Vec::<String>::new()));

        assert!(offer.validate().is_err());
    }

    #[test]
    fn test_offer_parse_json() {
        let json = r#"{
            "id": "offer-1",
            "hostname": "agent-1",
            "resources": [
                {"name": "gpus", "role": "unreserved", "unit_ids": ["g2", "g1"]},
                {
                    "name": "gpus",
                    "role": "gpu-team",
                    "unit_ids": ["g3"],
                    "reservation": {"principal": "ops", "labels": {"pool": "a100"}},
                    "provider_id": "rp-1"
                }
            ]
        }"#;

        let offer: Offer = serde_json::from_str(json).unwrap();
        assert_eq!(offer.resources.len(), 2);
        let reserved = &offer.resources[1].fragment;
        assert_eq!(
            reserved.reservation,
            Some(ReservationInfo::for_principal("ops").with_label("pool", "a100"))
        );
        assert_eq!(reserved.provider_id, Some(ProviderId::new("rp-1")));
    }
}
