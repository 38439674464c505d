//! Store query interface and record normalization.

use std::collections::BTreeMap;

use fleetsync_core::FleetRecord;

use crate::error::FetchError;

/// Entity kind the scrapers write their per-node status under.
pub const COLLECTION_KIND: &str = "rsync_url";

/// One entity as delivered by the store: its key name plus string properties.
///
/// Non-string property values have already been rendered to strings by the
/// source; null values are simply absent.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawItem {
    /// Key name; `None` for entities keyed by numeric id.
    pub key_name: Option<String>,
    pub properties: BTreeMap<String, String>,
}

impl RawItem {
    pub fn new(key_name: impl Into<String>) -> Self {
        Self {
            key_name: Some(key_name.into()),
            properties: BTreeMap::new(),
        }
    }

    pub fn with(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.properties.insert(name.into(), value.into());
        self
    }
}

/// Read-only query access to the key-value store.
pub trait RecordSource: Send + Sync {
    /// Every entity of `kind` under `namespace`, in store delivery order.
    fn query(&self, namespace: &str, kind: &str) -> Result<Vec<RawItem>, FetchError>;
}

/// Build a [`FleetRecord`] from a raw entity.
///
/// The address comes from the key name; every other column from its named
/// property, defaulting to the empty string. Returns `None` for entities with
/// no usable key name.
pub fn normalize(item: RawItem) -> Option<FleetRecord> {
    let address = item.key_name.filter(|name| !name.is_empty())?;
    let mut record = FleetRecord::new(address);
    for (name, value) in item.properties {
        if let Some(slot) = record.property_mut(&name) {
            *slot = value;
        }
    }
    Some(record)
}

/// Fetch every fleet record in `namespace`.
///
/// No retries here; the scheduler re-attempts on its next cycle.
pub fn fetch<S>(source: &S, namespace: &str) -> Result<Vec<FleetRecord>, FetchError>
where
    S: RecordSource + ?Sized,
{
    let items = source.query(namespace, COLLECTION_KIND)?;
    let total = items.len();
    let records: Vec<FleetRecord> = items.into_iter().filter_map(normalize).collect();
    if records.len() != total {
        tracing::warn!(
            namespace,
            skipped = total - records.len(),
            "skipped entities without a key name",
        );
    }
    tracing::debug!(namespace, records = records.len(), "fetched fleet records");
    Ok(records)
}
