//! Report template registry.
//!
//! Maps report keys such as `"change.v1"` to template factories. Built once
//! at startup and then shared read-mostly; the map sits behind an `RwLock`
//! so a late registration cannot race a lookup.

use std::collections::BTreeMap;
use std::sync::{PoisonError, RwLock};

use tracing::debug;

use agira_contracts::error::{AgiraError, AgiraResult};

use crate::traits::{ReportTemplate, TemplateFactory};

/// Registry of report templates keyed by report key.
#[derive(Default)]
pub struct ReportRegistry {
    factories: RwLock<BTreeMap<String, TemplateFactory>>,
}

impl ReportRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `factory` under `key`.
    ///
    /// Returns `DuplicateRegistration` if the key is taken; the existing
    /// factory is kept.
    pub fn register<F>(&self, key: impl Into<String>, factory: F) -> AgiraResult<()>
    where
        F: Fn() -> Box<dyn ReportTemplate> + Send + Sync + 'static,
    {
        let key = key.into();
        // Inserts are atomic, so a poisoned map is still consistent.
        let mut factories = self.factories.write().unwrap_or_else(PoisonError::into_inner);
        if factories.contains_key(&key) {
            return Err(AgiraError::DuplicateRegistration { key });
        }
        debug!(report_key = %key, "report template registered");
        factories.insert(key, Box::new(factory));
        Ok(())
    }

    /// Build a fresh template for `key`.
    pub fn get(&self, key: &str) -> AgiraResult<Box<dyn ReportTemplate>> {
        let factories = self.factories.read().unwrap_or_else(PoisonError::into_inner);
        factories
            .get(key)
            .map(|factory| factory())
            .ok_or_else(|| AgiraError::NotRegistered {
                key: key.to_string(),
            })
    }

    pub fn is_registered(&self, key: &str) -> bool {
        self.factories
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(key)
    }

    /// All registered keys in sorted order.
    pub fn list(&self) -> Vec<String> {
        self.factories
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .keys()
            .cloned()
            .collect()
    }
}

impl std::fmt::Debug for ReportRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReportRegistry")
            .field("keys", &self.list())
            .finish()
    }
}
