//! Sink interface and snapshot → rows conversion.

use fleetsync_core::{Snapshot, FIELD_NAMES};

use crate::error::UploadError;

/// Write-only bulk upsert into a spreadsheet.
///
/// Implementations must be idempotent: upserting the same rows twice leaves
/// the sheet in the same state as upserting them once.
pub trait SheetSink: Send + Sync {
    fn upsert(&self, spreadsheet_id: &str, rows: &[Vec<String>]) -> Result<(), UploadError>;
}

/// Header row followed by one row per record, sorted by the full field tuple.
pub fn snapshot_rows(snapshot: &Snapshot) -> Vec<Vec<String>> {
    let mut rows = Vec::with_capacity(snapshot.len() + 1);
    rows.push(FIELD_NAMES.iter().map(|name| name.to_string()).collect());
    rows.extend(
        snapshot
            .sorted_records()
            .into_iter()
            .map(|record| record.fields().iter().map(|f| f.to_string()).collect()),
    );
    rows
}

/// Upload `snapshot` to `spreadsheet_id`, returning the number of data rows written.
pub fn publish<S>(sink: &S, spreadsheet_id: &str, snapshot: &Snapshot) -> Result<usize, UploadError>
where
    S: SheetSink + ?Sized,
{
    let rows = snapshot_rows(snapshot);
    sink.upsert(spreadsheet_id, &rows)?;
    tracing::debug!(
        spreadsheet_id,
        version = snapshot.version,
        rows = snapshot.len(),
        "uploaded snapshot to sheet",
    );
    Ok(snapshot.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::sync::Mutex;

    use fleetsync_core::FleetRecord;

    /// Keeps the last rows written per sheet, the way an overwrite sink does.
    #[derive(Default)]
    struct MemorySink {
        sheets: Mutex<HashMap<String, Vec<Vec<String>>>>,
    }

    impl SheetSink for MemorySink {
        fn upsert(&self, spreadsheet_id: &str, rows: &[Vec<String>]) -> Result<(), UploadError> {
            self.sheets
                .lock()
                .unwrap()
                .insert(spreadsheet_id.to_string(), rows.to_vec());
            Ok(())
        }
    }

    struct RefusingSink;

    impl SheetSink for RefusingSink {
        fn upsert(&self, _: &str, _: &[Vec<String>]) -> Result<(), UploadError> {
            Err(UploadError::Rejected {
                status: 429,
                body: "quota exceeded".into(),
            })
        }
    }

    fn snapshot() -> Snapshot {
        Snapshot::new(vec![
            FleetRecord {
                contact: "zed".into(),
                ..FleetRecord::new("rsync://b")
            },
            FleetRecord::new("rsync://a"),
        ])
    }

    #[test]
    fn rows_start_with_header() {
        let rows = snapshot_rows(&snapshot());
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0], FIELD_NAMES);
        assert_eq!(rows[1][0], "rsync://a");
        assert_eq!(rows[2][..2], ["rsync://b", "zed"]);
    }

    #[test]
    fn empty_snapshot_writes_only_header() {
        let rows = snapshot_rows(&Snapshot::empty());
        assert_eq!(rows.len(), 1);
    }

    #[test]
    fn republishing_is_idempotent() {
        let sink = MemorySink::default();
        let snap = snapshot();
        publish(&sink, "sheet-1", &snap).expect("first");
        let after_first = sink.sheets.lock().unwrap()["sheet-1"].clone();
        assert_eq!(publish(&sink, "sheet-1", &snap).expect("second"), 2);
        assert_eq!(sink.sheets.lock().unwrap()["sheet-1"], after_first);
    }

    #[test]
    fn sink_errors_propagate() {
        let err = publish(&RefusingSink, "sheet-1", &snapshot()).expect_err("refused");
        assert!(matches!(err, UploadError::Rejected { status: 429, .. }));
    }
}
