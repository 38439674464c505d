//! # fleetsync-datastore
//!
//! Record fetcher: reads every `rsync_url` entity in a namespace and
//! normalizes each into a [`FleetRecord`](fleetsync_core::FleetRecord).
//!
//! The store itself sits behind [`RecordSource`]; [`DatastoreClient`] is the
//! Cloud Datastore REST implementation used in production.

pub mod client;
pub mod error;
pub mod fetcher;

pub use client::DatastoreClient;
pub use error::FetchError;
pub use fetcher::{fetch, normalize, RawItem, RecordSource, COLLECTION_KIND};
