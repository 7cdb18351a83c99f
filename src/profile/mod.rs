//! Compatibility profiles: model, persistence, launch-options composition
//!
//! A profile records the per-game overrides this engine applies outside the
//! store's own settings: Windows compatibility mode, forced 640x480 or
//! windowed rendering, reduced color depth, high-DPI behavior, fullscreen
//! optimization opt-out, and run-as-administrator. Profiles live in a single
//! versioned JSON file; a profile with no overrides is never persisted —
//! "default" and "absent" are the same state.

pub mod launch_options;
pub mod models;
pub mod store;

pub use models::{
    CompatibilityMode, CompatibilityPreset, CompatibilityProfile, HighDpiOverrideMode,
    ReducedColorMode,
};
pub use store::ProfileStore;
