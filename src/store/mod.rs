//! Store management: backends, orchestration, synchronization, preflight
//!
//! # Overview
//!
//! One [`StoreManager`] instance serves one store backend and owns:
//!
//! - the backend's directory layout under the application home
//! - the fingerprint-keyed installed-game cache
//! - profile persistence and the synchronization passes that reconcile
//!   profiles into the store config files and the bottle's registry
//!
//! Backends are data, not code: [`StoreBackend::spec`] returns the fixed
//! constants (paths, bottle names, client locations) that distinguish
//! Steam, Battle.net, Epic and GOG; every behavior lives in the shared
//! manager and synchronizer.

pub mod backend;
pub mod manager;
pub mod preflight;
pub mod sync;

pub use backend::{BackendSpec, ClientCandidate, LibrarySpec, StoreBackend};
pub use manager::{GameLibraryState, StoreEnvironment, StoreManager};
pub use preflight::{PreflightCheck, PreflightCheckKind, PreflightReport, PreflightStatus};
pub use sync::{ProfileSynchronizer, SyncRequest};
