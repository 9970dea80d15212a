//! # agira-reports
//!
//! Built-in report templates and the storage backends reports are written
//! to.
//!
//! - [`change_v1`]: the Change Report (`change.v1`)
//! - [`files`]: `FsFileStore` and `InMemoryFileStore`
//! - [`repository`]: `InMemoryReportRepository` and `JsonlReportRepository`
//!
//! Applications call [`default_registry`] once at startup and share the
//! result with their `ReportService`.

pub mod change_v1;
pub mod files;
pub mod repository;

use std::sync::Arc;

use agira_contracts::error::AgiraResult;
use agira_core::{traits::ReportTemplate, ReportRegistry};

pub use change_v1::{ChangeReportV1, CHANGE_REPORT_KEY};
pub use files::{FsFileStore, InMemoryFileStore};
pub use repository::{InMemoryReportRepository, JsonlReportRepository};

/// Register every built-in template on `registry`.
pub fn register_builtin(registry: &ReportRegistry) -> AgiraResult<()> {
    registry.register(CHANGE_REPORT_KEY, || Box::new(ChangeReportV1) as Box<dyn ReportTemplate>)?;
    Ok(())
}

/// A registry holding all built-in templates.
pub fn default_registry() -> AgiraResult<Arc<ReportRegistry>> {
    let registry = ReportRegistry::new();
    register_builtin(&registry)?;
    Ok(Arc::new(registry))
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use sha2::{Digest, Sha256};

    use agira_contracts::{error::AgiraError, report::ReportContext};
    use agira_core::{sha256_hex, traits::FileStore, traits::ReportRepository, ReportService};

    use super::*;

    fn context() -> ReportContext {
        json!({
            "title": "Upgrade PostgreSQL to 16",
            "project": "Agira",
            "created_by": "alice",
            "created_at": "2024-01-01",
            "status": "Planned",
            "risk": "Medium",
            "description": "Upgrade the primary cluster.\nReplicas follow.",
            "items": [{ "title": "DB maintenance", "status": "Working" }],
            "approvals": [
                { "approver": "Alice", "status": "Accept", "decision_at": "2024-01-01" }
            ]
        })
        .as_object()
        .cloned()
        .unwrap()
    }

    // ── Registry ──────────────────────────────────────────────────────────────

    #[test]
    fn default_registry_lists_builtins() {
        let registry = default_registry().unwrap();
        assert_eq!(registry.list(), vec![CHANGE_REPORT_KEY]);
        assert!(registry.get(CHANGE_REPORT_KEY).is_ok());
    }

    #[test]
    fn registering_builtins_twice_is_rejected() {
        let registry = ReportRegistry::new();
        register_builtin(&registry).unwrap();
        assert!(matches!(
            register_builtin(&registry),
            Err(AgiraError::DuplicateRegistration { .. })
        ));
    }

    // ── End to end ────────────────────────────────────────────────────────────

    #[test]
    fn generate_and_store_hash_matches_stored_bytes() {
        let dir = tempfile::tempdir().unwrap();
        let files = Arc::new(FsFileStore::new(dir.path().join("reports")));
        let repository = Arc::new(JsonlReportRepository::new(dir.path().join("index.jsonl")));
        let service = ReportService::new(default_registry().unwrap(), files.clone(), repository.clone());

        let doc = service
            .generate_and_store(CHANGE_REPORT_KEY, "change", "42", &context(), Some("alice"), None)
            .unwrap();

        let stored = files.open(&doc.file_path).unwrap();
        assert!(stored.starts_with(b"%PDF-"));
        assert_eq!(doc.sha256, hex::encode(Sha256::digest(&stored)));
        assert_eq!(doc.size_bytes, stored.len() as u64);
        assert!(doc.file_name.starts_with("change.v1_change_42_"));
        assert_eq!(doc.context().unwrap(), context());

        assert_eq!(repository.get(&doc.id).unwrap(), Some(doc.clone()));
        assert_eq!(repository.list_for_object("change", "42").unwrap(), vec![doc]);
    }

    #[test]
    fn every_generation_appends_a_new_row() {
        let files = Arc::new(InMemoryFileStore::new());
        let repository = Arc::new(InMemoryReportRepository::new());
        let service = ReportService::new(default_registry().unwrap(), files, repository.clone());

        let first = service
            .generate_and_store(CHANGE_REPORT_KEY, "change", "1", &context(), None, None)
            .unwrap();
        let second = service
            .generate_and_store(CHANGE_REPORT_KEY, "change", "1", &context(), None, Some(&json!({"reason": "resend"})))
            .unwrap();

        assert_ne!(first.id, second.id);
        assert_eq!(second.metadata_json.as_deref(), Some(r#"{"reason":"resend"}"#));
        assert_eq!(repository.len(), 2);
    }

    #[test]
    fn same_second_collision_keeps_earlier_hash_valid() {
        let dir = tempfile::tempdir().unwrap();
        let files = Arc::new(FsFileStore::new(dir.path()));
        let repository = Arc::new(InMemoryReportRepository::new());
        let service = ReportService::new(default_registry().unwrap(), files.clone(), repository);

        let mut first_ctx = context();
        first_ctx.insert("title".to_string(), json!("First"));
        let first = service
            .generate_and_store(CHANGE_REPORT_KEY, "change", "1", &first_ctx, None, None)
            .unwrap();

        // Another writer lands on the same name before the next render.
        let intruder = files.save(&first.file_name, b"unrelated bytes").unwrap();
        assert_ne!(intruder, first.file_path);

        let mut second_ctx = context();
        second_ctx.insert("title".to_string(), json!("Second"));
        let second = service
            .generate_and_store(CHANGE_REPORT_KEY, "change", "1", &second_ctx, None, None)
            .unwrap();

        assert_ne!(first.file_path, second.file_path);
        assert_eq!(first.sha256, sha256_hex(&files.open(&first.file_path).unwrap()));
        assert_eq!(second.sha256, sha256_hex(&files.open(&second.file_path).unwrap()));
    }

    #[test]
    fn object_ids_with_separators_are_stored() {
        let dir = tempfile::tempdir().unwrap();
        let files = Arc::new(FsFileStore::new(dir.path()));
        let repository = Arc::new(InMemoryReportRepository::new());
        let service = ReportService::new(default_registry().unwrap(), files.clone(), repository.clone());

        let doc = service
            .generate_and_store(CHANGE_REPORT_KEY, "change", "PRJ/42", &context(), None, None)
            .unwrap();

        assert_eq!(doc.object_id, "PRJ/42");
        assert!(doc.file_name.starts_with("change.v1_change_PRJ-42_"));
        assert!(std::path::Path::new(&doc.file_path).starts_with(dir.path()));
        assert_eq!(doc.sha256, sha256_hex(&files.open(&doc.file_path).unwrap()));
        assert_eq!(repository.list_for_object("change", "PRJ/42").unwrap(), vec![doc]);
    }

    #[test]
    fn malformed_approvals_are_rejected_before_storage() {
        let files = Arc::new(InMemoryFileStore::new());
        let repository = Arc::new(InMemoryReportRepository::new());
        let service = ReportService::new(default_registry().unwrap(), files.clone(), repository.clone());

        let mut ctx = context();
        ctx.insert("approvals".to_string(), json!("Alice approved"));

        let err = service
            .generate_and_store(CHANGE_REPORT_KEY, "change", "1", &ctx, None, None)
            .unwrap_err();
        assert!(matches!(err, AgiraError::InvalidContext { .. }));
        assert!(files.names().is_empty());
        assert!(repository.is_empty());
    }

    #[test]
    fn long_reports_span_pages() {
        let service = ReportService::new(
            default_registry().unwrap(),
            Arc::new(InMemoryFileStore::new()),
            Arc::new(InMemoryReportRepository::new()),
        );

        let mut ctx = context();
        let items: Vec<_> = (0..120)
            .map(|i| json!({ "title": format!("Item {i}"), "status": "Working" }))
            .collect();
        ctx.insert("items".to_string(), json!(items));

        let pdf = service.render(CHANGE_REPORT_KEY, &ctx).unwrap();
        let text = String::from_utf8_lossy(&pdf);
        assert!(text.contains("(Page 2) Tj"));
        assert!(text.contains("(Item 119) Tj"));
    }
}
