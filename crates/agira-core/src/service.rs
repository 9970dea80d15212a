//! The report service: render, hash, and persist reports.
//!
//! Pipeline per `generate_and_store` call:
//!
//!   Registry lookup → Context check → Story → Layout + page decoration → PDF
//!   → SHA-256 → File store → Report row
//!
//! Nothing is stored unless rendering succeeded, and storage failures are
//! returned to the caller without retry.

use std::sync::Arc;

use chrono::Utc;
use sha2::{Digest, Sha256};
use tracing::{debug, info, warn};

use agira_contracts::{
    error::{AgiraError, AgiraResult},
    report::{ReportContext, ReportDocument, ReportId},
};
use agira_render::{DocTemplate, PageCanvas, PageGeometry, PageInfo};

use crate::{
    registry::ReportRegistry,
    traits::{FileStore, ReportRepository, ReportTemplate},
};

/// Lowercase hex SHA-256 of `bytes`.
pub fn sha256_hex(bytes: &[u8]) -> String {
    hex::encode(Sha256::digest(bytes))
}

/// Renders registered reports and stores them with a context snapshot.
pub struct ReportService {
    registry: Arc<ReportRegistry>,
    files: Arc<dyn FileStore>,
    repository: Arc<dyn ReportRepository>,
    geometry: PageGeometry,
}

impl ReportService {
    pub fn new(
        registry: Arc<ReportRegistry>,
        files: Arc<dyn FileStore>,
        repository: Arc<dyn ReportRepository>,
    ) -> Self {
        Self {
            registry,
            files,
            repository,
            geometry: PageGeometry::a4_report(),
        }
    }

    pub fn registry(&self) -> &ReportRegistry {
        &self.registry
    }

    /// Render the report `report_key` for `context` and return the PDF bytes.
    ///
    /// # Errors
    ///
    /// - `NotRegistered` for an unknown key
    /// - `InvalidContext` when the template's context schema rejects `context`
    /// - whatever the template's `build_story` returns, unchanged
    pub fn render(&self, report_key: &str, context: &ReportContext) -> AgiraResult<Vec<u8>> {
        let template = self.registry.get(report_key)?;
        validate_context(template.as_ref(), report_key, context)?;

        debug!(report_key = %report_key, "building report story");
        let story = template.build_story(context)?;

        let mut on_first_page = |canvas: &mut PageCanvas, page: &PageInfo| {
            template.draw_header_footer(canvas, page, context)
        };
        let mut on_later_pages = |canvas: &mut PageCanvas, page: &PageInfo| {
            template.draw_header_footer(canvas, page, context)
        };

        DocTemplate::new(self.geometry)
            .with_title(report_key)
            .build(&story, &mut on_first_page, &mut on_later_pages)
    }

    /// Render the report, hash it, store the file, and persist its row.
    ///
    /// Returns the persisted row. `sha256` is the digest of exactly the bytes
    /// handed to the file store.
    pub fn generate_and_store(
        &self,
        report_key: &str,
        object_type: &str,
        object_id: &str,
        context: &ReportContext,
        created_by: Option<&str>,
        metadata: Option<&serde_json::Value>,
    ) -> AgiraResult<ReportDocument> {
        let bytes = self.render(report_key, context)?;
        let sha256 = sha256_hex(&bytes);

        let context_json =
            serde_json::to_string_pretty(context).map_err(|e| AgiraError::RenderFailed {
                reason: format!("context is not serializable: {}", e),
            })?;
        let metadata_json = metadata
            .map(serde_json::to_string)
            .transpose()
            .map_err(|e| AgiraError::RenderFailed {
                reason: format!("metadata is not serializable: {}", e),
            })?;

        let created_at = Utc::now();
        let file_name = ReportDocument::file_name_for(report_key, object_type, object_id, created_at);

        let file_path = self.files.save(&file_name, &bytes).map_err(|e| {
            warn!(report_key = %report_key, file_name = %file_name, error = %e, "report file could not be stored");
            e
        })?;

        let document = ReportDocument {
            id: ReportId::new(),
            report_key: report_key.to_string(),
            object_type: object_type.to_string(),
            object_id: object_id.to_string(),
            created_at,
            created_by: created_by.map(str::to_string),
            context_json,
            sha256,
            metadata_json,
            file_name,
            file_path,
            size_bytes: bytes.len() as u64,
        };

        self.repository.insert(&document).map_err(|e| {
            warn!(report_key = %report_key, report_id = %document.id, error = %e, "report row could not be persisted");
            e
        })?;

        info!(
            report_key = %report_key,
            object_type = %object_type,
            object_id = %object_id,
            report_id = %document.id,
            sha256 = %document.sha256,
            size_bytes = document.size_bytes,
            "report generated and stored"
        );

        Ok(document)
    }
}

/// Check `context` against the template's schema, collecting every violation.
fn validate_context(
    template: &dyn ReportTemplate,
    report_key: &str,
    context: &ReportContext,
) -> AgiraResult<()> {
    let Some(schema) = template.context_schema() else {
        return Ok(());
    };

    let validator = jsonschema::validator_for(&schema).map_err(|e| AgiraError::RenderFailed {
        reason: format!("context schema of '{}' is invalid: {}", report_key, e),
    })?;

    let instance = serde_json::Value::Object(context.clone());
    let violations: Vec<String> = validator
        .iter_errors(&instance)
        .map(|error| format!("{}: {}", error.instance_path, error))
        .collect();

    if violations.is_empty() {
        Ok(())
    } else {
        warn!(report_key = %report_key, violations = violations.len(), "report context rejected");
        Err(AgiraError::InvalidContext {
            reason: violations.join("; "),
        })
    }
}

// ── Tests ────────────────────────────────────────────────────────────────────
