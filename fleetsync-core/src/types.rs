//! Domain types for the fleet mirror.
//!
//! Every field of a [`FleetRecord`] is a plain `String`; the empty string means
//! unknown or absent. Field order is fixed and shared by the status page, the
//! spreadsheet rows, and the sort order of both.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Number of columns in the fixed field schema.
pub const FIELD_COUNT: usize = 6;

/// Column names in fixed field order. These are the property names used by
/// the scrapers that write the store, and the header row of both read surfaces.
pub const FIELD_NAMES: [&str; FIELD_COUNT] = [
    "dropboxrsyncaddress",
    "contact",
    "lastsuccessfulcollection",
    "errorsincelastsuccessful",
    "lastcollectionattempt",
    "maxrawfilemtimearchived",
];

// ---------------------------------------------------------------------------
// FleetRecord
// ---------------------------------------------------------------------------

/// Status of one collection node, keyed by its sync address.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FleetRecord {
    /// Remote sync endpoint. Unique within a snapshot; never empty.
    pub address: String,
    pub contact: String,
    pub last_successful_collection: String,
    pub errors_since_last_successful: String,
    pub last_collection_attempt: String,
    /// High-watermark of archived data age, read by deletion-safety tooling.
    pub max_raw_file_mtime_archived: String,
}

impl FleetRecord {
    /// Build a record with only the address set; every other field is empty.
    pub fn new(address: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            ..Self::default()
        }
    }

    /// Field values in fixed field order (matching [`FIELD_NAMES`]).
    pub fn fields(&self) -> [&str; FIELD_COUNT] {
        [
            &self.address,
            &self.contact,
            &self.last_successful_collection,
            &self.errors_since_last_successful,
            &self.last_collection_attempt,
            &self.max_raw_file_mtime_archived,
        ]
    }

    /// Mutable access to the non-address field stored under `name`.
    ///
    /// Returns `None` for the address column (it comes from the entity key)
    /// and for names outside the schema.
    pub fn property_mut(&mut self, name: &str) -> Option<&mut String> {
        match name {
            "contact" => Some(&mut self.contact),
            "lastsuccessfulcollection" => Some(&mut self.last_successful_collection),
            "errorsincelastsuccessful" => Some(&mut self.errors_since_last_successful),
            "lastcollectionattempt" => Some(&mut self.last_collection_attempt),
            "maxrawfilemtimearchived" => Some(&mut self.max_raw_file_mtime_archived),
            _ => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Snapshot
// ---------------------------------------------------------------------------

/// One immutable capture of the whole fleet.
///
/// Records keep the order the store delivered them in; use
/// [`Snapshot::sorted_records`] wherever a deterministic order is needed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    /// Assigned by [`crate::SnapshotStore::publish`]; 0 for the initial empty snapshot.
    pub version: u64,
    pub captured_at: DateTime<Utc>,
    pub records: Vec<FleetRecord>,
}

impl Snapshot {
    /// Capture `records` as of now. The version is assigned on publish.
    pub fn new(records: Vec<FleetRecord>) -> Self {
        Self::captured(records, Utc::now())
    }

    /// Capture `records` with an explicit capture time.
    pub fn captured(records: Vec<FleetRecord>, captured_at: DateTime<Utc>) -> Self {
        Self {
            version: 0,
            captured_at,
            records,
        }
    }

    /// The snapshot readers see before anything has been published.
    pub fn empty() -> Self {
        Self::new(Vec::new())
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Records sorted lexicographically by the full tuple of field values in
    /// fixed field order.
    pub fn sorted_records(&self) -> Vec<&FleetRecord> {
        let mut sorted: Vec<&FleetRecord> = self.records.iter().collect();
        sorted.sort_by(|a, b| a.fields().cmp(&b.fields()));
        sorted
    }
}

impl Default for Snapshot {
    fn default() -> Self {
        Self::empty()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
