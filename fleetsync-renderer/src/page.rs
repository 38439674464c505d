//! Status page model and renderer.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tera::{Context, Tera, Value};

use fleetsync_core::{Snapshot, FIELD_NAMES};

use crate::error::RenderError;

const TEMPLATE_NAME: &str = "status.html";
const TEMPLATE: &str = include_str!("templates/status.html.tera");

/// Placeholder shown instead of a table when the snapshot has no records.
pub const NO_DATA: &str = "<p>NO DATA</p>";

/// `Sun Oct 18 09:30:00 2026 UTC`
const TIMESTAMP_FORMAT: &str = "%a %b %e %H:%M:%S %Y UTC";

// ---------------------------------------------------------------------------
// StatusPage
// ---------------------------------------------------------------------------

/// Everything the status template needs, built from one snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatusPage {
    pub namespace: String,
    pub headers: Vec<String>,
    /// Field values in fixed field order, sorted by the full tuple.
    pub rows: Vec<Vec<String>>,
    pub version: u64,
    /// Snapshot capture time; `None` while nothing has been fetched.
    pub captured_at: Option<String>,
    pub rendered_at: String,
}

impl StatusPage {
    pub fn from_snapshot(
        snapshot: &Snapshot,
        namespace: impl Into<String>,
        rendered_at: DateTime<Utc>,
    ) -> Self {
        let rows = snapshot
            .sorted_records()
            .into_iter()
            .map(|record| record.fields().iter().map(|f| f.to_string()).collect())
            .collect();
        let captured_at = (snapshot.version > 0)
            .then(|| snapshot.captured_at.format(TIMESTAMP_FORMAT).to_string());

        Self {
            namespace: namespace.into(),
            headers: FIELD_NAMES.iter().map(|name| name.to_string()).collect(),
            rows,
            version: snapshot.version,
            captured_at,
            rendered_at: rendered_at.format(TIMESTAMP_FORMAT).to_string(),
        }
    }

    pub fn has_data(&self) -> bool {
        !self.rows.is_empty()
    }
}

// ---------------------------------------------------------------------------
// StatusRenderer
// ---------------------------------------------------------------------------

/// Escape the characters that matter inside element content and attributes.
///
/// `tera::escape_html` (and tera's autoescape) also rewrites `/` as `&#x2F;`,
/// which would mangle every `rsync://` address in the table, so `/` is kept.
fn cell(value: &Value, _args: &HashMap<String, Value>) -> tera::Result<Value> {
    let raw = match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    };
    let mut escaped = String::with_capacity(raw.len());
    for ch in raw.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            c => escaped.push(c),
        }
    }
    Ok(Value::String(escaped))
}

/// Renders [`StatusPage`] values with the embedded template.
///
/// Create once at startup and share; rendering takes `&self`.
pub struct StatusRenderer {
    tera: Tera,
}

impl StatusRenderer {
    pub fn new() -> Result<Self, RenderError> {
        let mut tera = Tera::default();
        // Every interpolated value goes through the `cell` filter instead.
        tera.autoescape_on(vec![]);
        tera.register_filter("cell", cell);
        tera.add_raw_template(TEMPLATE_NAME, TEMPLATE)?;
        Ok(Self { tera })
    }

    pub fn render(&self, page: &StatusPage) -> Result<String, RenderError> {
        let mut context = Context::from_serialize(page)?;
        context.insert("no_data", NO_DATA);
        Ok(self.tera.render(TEMPLATE_NAME, &context)?)
    }
}
