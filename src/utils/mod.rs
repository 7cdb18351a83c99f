//! Utility modules
//!
//! Provides logging initialization for hosts embedding the engine.

pub mod logging;

pub use logging::init_logging;
