//! Fleetsync core library: fleet records, the shared snapshot store,
//! startup configuration, and Google API credentials.
//!
//! Public API surface:
//! - [`types`]: [`FleetRecord`], [`Snapshot`], the fixed field schema
//! - [`snapshot`]: [`SnapshotStore`], the single-writer/multi-reader slot
//! - [`config`]: [`SyncConfig`]
//! - [`auth`]: [`Credentials`] shared by the store and sheet clients, [`MetadataServer`]
//! - [`error`]: [`ConfigError`], [`AuthError`]

pub mod auth;
pub mod config;
pub mod error;
pub mod snapshot;
pub mod types;

pub use auth::{Credentials, MetadataServer};
pub use config::SyncConfig;
pub use error::{AuthError, ConfigError};
pub use snapshot::SnapshotStore;
pub use types::{FleetRecord, Snapshot, FIELD_COUNT, FIELD_NAMES};
