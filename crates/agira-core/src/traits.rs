//! Core trait definitions for the Agira reporting core.
//!
//! These traits are the seams between the orchestration code in this crate
//! and the pieces supplied by the hosting application:
//!
//! - `ReportTemplate`: turns a context into content blocks (one per report type)
//! - `FileStore`: durable storage for rendered report bytes
//! - `ReportRepository`: append-only store for report rows
//! - `KeyValueStore`: backing store for the agent response cache

use agira_contracts::{
    error::AgiraResult,
    report::{ReportContext, ReportDocument, ReportId},
};
use agira_render::{Flowable, PageCanvas, PageInfo};

/// A report type: builds the story for a context and optionally decorates
/// every page.
///
/// A fresh instance is created for every render, so implementations may keep
/// per-render state without synchronization.
pub trait ReportTemplate {
    /// Produce the ordered content blocks for `context`.
    ///
    /// Must be deterministic: identical contexts yield identical stories.
    /// Errors returned here propagate to the caller unchanged and nothing is
    /// stored.
    fn build_story(&self, context: &ReportContext) -> AgiraResult<Vec<Flowable>>;

    /// Draw the running header and footer on one page.
    ///
    /// Called once per page, first page included. The default draws nothing.
    fn draw_header_footer(&self, _canvas: &mut PageCanvas, _page: &PageInfo, _context: &ReportContext) {}

    /// JSON Schema the context must satisfy before rendering starts.
    fn context_schema(&self) -> Option<serde_json::Value> {
        None
    }
}

/// Factory stored in the registry; invoked once per lookup.
pub type TemplateFactory = Box<dyn Fn() -> Box<dyn ReportTemplate> + Send + Sync>;

/// Durable storage for rendered report files.
pub trait FileStore: Send + Sync {
    /// Store `bytes` under `name` and return the reference to persist on the
    /// report row.
    ///
    /// Never overwrites: when `name` is taken the bytes are stored under a
    /// derived free name, and the returned reference points at them.
    fn save(&self, name: &str, bytes: &[u8]) -> AgiraResult<String>;

    /// Read back the bytes stored at `path`.
    fn open(&self, path: &str) -> AgiraResult<Vec<u8>>;
}

/// Append-only store for report rows.
///
/// Rows are inserted exactly once and never updated.
pub trait ReportRepository: Send + Sync {
    fn insert(&self, document: &ReportDocument) -> AgiraResult<()>;

    fn get(&self, id: &ReportId) -> AgiraResult<Option<ReportDocument>>;

    /// All reports about one subject, oldest first.
    fn list_for_object(&self, object_type: &str, object_id: &str) -> AgiraResult<Vec<ReportDocument>>;
}

/// Minimal key-value contract the agent cache needs: GET, SETEX, PING.
///
/// Implementations report every backend problem as
/// `AgiraError::CacheBackend`; the cache service decides how to degrade.
pub trait KeyValueStore: Send + Sync {
    fn ping(&self) -> AgiraResult<()>;

    fn get(&self, key: &str) -> AgiraResult<Option<String>>;

    /// Set `key` to `value` with an expiry, atomically.
    fn set_ex(&self, key: &str, value: &str, ttl_seconds: u64) -> AgiraResult<()>;
}
