//! statz-registry — maps view names to registered backend descriptors.
//!
//! The backend accepts points only for metrics it has a descriptor for,
//! and descriptor creation must happen exactly once per view. The
//! registry makes that idempotent: a cached name is never re-created,
//! a backend "already exists" reply is adopted as success, and a
//! transient failure is never cached so the next cycle retries.

pub mod registry;

pub use registry::{DescriptorHandle, DescriptorRegistry, Resolution};
