//! offerlet-matcher: Set-resource offer matching for offerlet
//!
//! This crate decides whether an offer satisfies a discrete-resource
//! requirement and which offer fragments are consumed:
//! - Set-resource matching with role isolation
//! - Match results and acceptance resource descriptors
//! - Fragment ordering strategies
//! - Per-offer evaluation against the framework policies

pub mod evaluator;
pub mod ordering;
pub mod result;
pub mod set_matcher;

pub use evaluator::{Evaluation, OfferEvaluator, OfferSelection};
pub use ordering::{AsOffered, FragmentOrdering, RolePriority, UnreservedFirst};
pub use result::{Consumption, MatchResult, NoMatch, ResourceDescriptor, ScopeNote, SetMatch};
pub use set_matcher::SetResourceMatcher;
