//! # fleetsync-sheets
//!
//! Spreadsheet publisher: turns a [`Snapshot`](fleetsync_core::Snapshot) into
//! header-plus-rows form and bulk-upserts it into the sheet that deletion
//! tooling reads.
//!
//! Call [`publish`] with any [`SheetSink`]; [`SheetsClient`] is the Google
//! Sheets implementation.

pub mod client;
pub mod error;
pub mod publisher;

pub use client::SheetsClient;
pub use error::UploadError;
pub use publisher::{publish, snapshot_rows, SheetSink};
