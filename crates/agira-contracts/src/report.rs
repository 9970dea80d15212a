//! Report context and persisted report artifact types.
//!
//! `ReportContext` is the only input to rendering. `ReportDocument` is the row
//! written once per `generate_and_store` call; it is never mutated afterwards.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Arbitrary JSON mapping handed to a report template.
///
/// The same map is snapshotted verbatim into `ReportDocument::context_json`.
pub type ReportContext = Map<String, Value>;

/// Unique identifier of a persisted report row.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ReportId(pub uuid::Uuid);

impl ReportId {
    /// Create a new, unique report ID.
    pub fn new() -> Self {
        Self(uuid::Uuid::new_v4())
    }
}

impl Default for ReportId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for ReportId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

fn file_name_component(raw: &str) -> String {
    raw.replace(['/', '\\'], "-")
}

/// A rendered, hashed, and stored report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportDocument {
    pub id: ReportId,
    /// Registry key of the template that rendered this report, e.g. "change.v1".
    pub report_key: String,
    /// Kind of the subject the report is about, e.g. "change".
    pub object_type: String,
    /// Identifier of the subject, always stored as a string.
    pub object_id: String,
    pub created_at: DateTime<Utc>,
    pub created_by: Option<String>,
    /// Pretty-printed (2-space indent) JSON of the rendering context.
    pub context_json: String,
    /// Lowercase hex SHA-256 of the exact stored bytes.
    pub sha256: String,
    pub metadata_json: Option<String>,
    /// Generated name: `{report_key}_{object_type}_{object_id}_{YYYYMMDD_HHMMSS}.pdf`.
    pub file_name: String,
    /// Reference returned by the file store for the stored bytes.
    pub file_path: String,
    pub size_bytes: u64,
}

impl ReportDocument {
    /// Build the storage file name for a report rendered at `at`.
    ///
    /// Path separators in any component become `-`, so the name is always a
    /// single path component. Two renders of the same subject within one
    /// second share a name; file stores resolve that by picking a free name,
    /// and `file_path` on the row records where the bytes actually went.
    pub fn file_name_for(
        report_key: &str,
        object_type: &str,
        object_id: &str,
        at: DateTime<Utc>,
    ) -> String {
        format!(
            "{}_{}_{}_{}.pdf",
            file_name_component(report_key),
            file_name_component(object_type),
            file_name_component(object_id),
            at.format("%Y%m%d_%H%M%S")
        )
    }

    /// Parse the stored context snapshot back into a map.
    pub fn context(&self) -> serde_json::Result<ReportContext> {
        serde_json::from_str(&self.context_json)
    }
}
