//! offerlet-core: Core types and policies for offerlet
//!
//! This crate provides the fundamental types used throughout offerlet:
//! - Offer, fragment and requirement definitions
//! - Role admission policy
//! - GPU scheduling policy and feature flags
//! - Configuration types
//! - Error handling

pub mod config;
pub mod error;
pub mod features;
pub mod gpu;
pub mod model;
pub mod roles;

pub use config::*;
pub use error::*;
pub use features::*;
pub use gpu::*;
pub use model::*;
pub use roles::*;
