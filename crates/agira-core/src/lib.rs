//! # agira-core
//!
//! Report orchestration for Agira.
//!
//! This crate provides:
//! - The collaborator traits (`ReportTemplate`, `FileStore`,
//!   `ReportRepository`, `KeyValueStore`)
//! - `ReportRegistry`, the key → template factory map
//! - `ReportService`, which renders, hashes, and stores reports
//! - `{{ name }}` placeholder helpers and the ordered middleware `Pipeline`
//!
//! ## Usage
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use agira_core::{ReportRegistry, ReportService};
//!
//! let registry = Arc::new(ReportRegistry::new());
//! registry.register("change.v1", || Box::new(ChangeReportV1) as Box<dyn ReportTemplate>)?;
//! let service = ReportService::new(registry, files, repository);
//! let doc = service.generate_and_store("change.v1", "change", "42", &ctx, Some("alice"), None)?;
//! ```

pub mod pipeline;
pub mod placeholders;
pub mod registry;
pub mod service;
pub mod traits;

pub use registry::ReportRegistry;
pub use service::{sha256_hex, ReportService};
