//! Compatibility-runtime collaborators: subprocess execution and the
//! Windows registry inside the bottle
//!
//! All interaction with Wine/CrossOver goes through the narrow
//! [`RegistryRunner`] seam so the synchronizer can be exercised against a
//! scripted fake. The real implementation, [`WineRunner`], locates a usable
//! Wine binary, sets up bottle/prefix environment, and enforces an explicit
//! timeout on every invocation — a hung `reg` process must not stall a
//! synchronization pass indefinitely.

pub mod registry;
pub mod runner;

pub use registry::CompatLayerRegistry;
pub use runner::{CommandOutput, RegistryRunner, WineRunner};
