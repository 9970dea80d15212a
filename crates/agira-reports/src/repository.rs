//! `ReportRepository` implementations.
//!
//! Both are append-only: a row is written once by `insert` and never updated.
//! Inserting an id that already exists is a `StorageFailed` error.

use std::{
    fs::{self, OpenOptions},
    io::{BufRead, BufReader, Write},
    path::PathBuf,
    sync::{Arc, Mutex},
};

use tracing::debug;

use agira_contracts::{
    error::{AgiraError, AgiraResult},
    report::{ReportDocument, ReportId},
};
use agira_core::traits::ReportRepository;

fn duplicate(id: &ReportId) -> AgiraError {
    AgiraError::StorageFailed {
        reason: format!("report {} already stored", id),
    }
}

// ── In-memory ─────────────────────────────────────────────────────────────────

/// Rows kept in insertion order. Clones share the same rows.
#[derive(Debug, Clone, Default)]
pub struct InMemoryReportRepository {
    rows: Arc<Mutex<Vec<ReportDocument>>>,
}

impl InMemoryReportRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.rows.lock().map(|rows| rows.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> AgiraResult<std::sync::MutexGuard<'_, Vec<ReportDocument>>> {
        self.rows.lock().map_err(|e| AgiraError::StorageFailed {
            reason: format!("repository lock poisoned: {}", e),
        })
    }
}

impl ReportRepository for InMemoryReportRepository {
    fn insert(&self, document: &ReportDocument) -> AgiraResult<()> {
        let mut rows = self.lock()?;
        if rows.iter().any(|row| row.id == document.id) {
            return Err(duplicate(&document.id));
        }
        rows.push(document.clone());
        Ok(())
    }

    fn get(&self, id: &ReportId) -> AgiraResult<Option<ReportDocument>> {
        Ok(self.lock()?.iter().find(|row| &row.id == id).cloned())
    }

    fn list_for_object(&self, object_type: &str, object_id: &str) -> AgiraResult<Vec<ReportDocument>> {
        let mut found: Vec<ReportDocument> = self
            .lock()?
            .iter()
            .filter(|row| row.object_type == object_type && row.object_id == object_id)
            .cloned()
            .collect();
        found.sort_by_key(|row| row.created_at);
        Ok(found)
    }
}

// ── JSON Lines file ───────────────────────────────────────────────────────────

/// One JSON object per line, appended on insert.
///
/// The whole index is re-read for lookups. A missing file is an empty index.
#[derive(Debug)]
pub struct JsonlReportRepository {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl JsonlReportRepository {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    fn read_all(&self) -> AgiraResult<Vec<ReportDocument>> {
        let file = match fs::File::open(&self.path) {
            Ok(file) => file,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => {
                return Err(AgiraError::StorageFailed {
                    reason: format!("cannot open '{}': {}", self.path.display(), e),
                })
            }
        };

        let mut rows = Vec::new();
        for (index, line) in BufReader::new(file).lines().enumerate() {
            let line = line.map_err(|e| AgiraError::StorageFailed {
                reason: format!("cannot read '{}': {}", self.path.display(), e),
            })?;
            if line.trim().is_empty() {
                continue;
            }
            let row = serde_json::from_str(&line).map_err(|e| AgiraError::StorageFailed {
                reason: format!("{}:{}: malformed report row: {}", self.path.display(), index + 1, e),
            })?;
            rows.push(row);
        }
        Ok(rows)
    }
}

impl ReportRepository for JsonlReportRepository {
    fn insert(&self, document: &ReportDocument) -> AgiraResult<()> {
        let _guard = self.write_lock.lock().map_err(|e| AgiraError::StorageFailed {
            reason: format!("index lock poisoned: {}", e),
        })?;

        if self.read_all()?.iter().any(|row| row.id == document.id) {
            return Err(duplicate(&document.id));
        }

        let mut line = serde_json::to_string(document).map_err(|e| AgiraError::StorageFailed {
            reason: format!("cannot serialize report row: {}", e),
        })?;
        line.push('\n');

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| AgiraError::StorageFailed {
                reason: format!("cannot create '{}': {}", parent.display(), e),
            })?;
        }

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(|e| AgiraError::StorageFailed {
                reason: format!("cannot open '{}': {}", self.path.display(), e),
            })?;
        file.write_all(line.as_bytes())
            .map_err(|e| AgiraError::StorageFailed {
                reason: format!("cannot append to '{}': {}", self.path.display(), e),
            })?;

        debug!(report_id = %document.id, index = %self.path.display(), "report row appended");
        Ok(())
    }

    fn get(&self, id: &ReportId) -> AgiraResult<Option<ReportDocument>> {
        Ok(self.read_all()?.into_iter().find(|row| &row.id == id))
    }

    fn list_for_object(&self, object_type: &str, object_id: &str) -> AgiraResult<Vec<ReportDocument>> {
        let mut found: Vec<ReportDocument> = self
            .read_all()?
            .into_iter()
            .filter(|row| row.object_type == object_type && row.object_id == object_id)
            .collect();
        found.sort_by_key(|row| row.created_at);
        Ok(found)
    }
}
