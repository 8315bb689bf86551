//! MCP session state.
//!
//! The explicit context every tool call runs against: the platform API
//! handle, the shared answer catalog and the default fuzzy threshold.

use std::sync::Arc;

use crate::catalog::{AnswerCatalog, CatalogLoad};
use crate::client::{AnswerRecord, SurveyApi};
use crate::matcher::DEFAULT_FUZZY_THRESHOLD;

/// MCP session state.
pub struct McpSession {
    /// Platform API
    api: Box<dyn SurveyApi>,
    /// Answer library cache
    catalog: AnswerCatalog,
    /// Threshold used when a tool call does not pass one
    fuzzy_threshold: f64,
}

impl McpSession {
    /// Create a session around a platform API handle.
    pub fn new(api: impl SurveyApi + 'static) -> Self {
        Self {
            api: Box::new(api),
            catalog: AnswerCatalog::default(),
            fuzzy_threshold: DEFAULT_FUZZY_THRESHOLD,
        }
    }

    /// Use a custom catalog (e.g. with a different page size).
    pub fn with_catalog(mut self, catalog: AnswerCatalog) -> Self {
        self.catalog = catalog;
        self
    }

    /// Override the default fuzzy threshold.
    pub fn with_fuzzy_threshold(mut self, threshold: f64) -> Self {
        self.fuzzy_threshold = threshold;
        self
    }

    /// The platform API.
    pub fn api(&self) -> &dyn SurveyApi {
        self.api.as_ref()
    }

    /// Default fuzzy threshold.
    pub fn fuzzy_threshold(&self) -> f64 {
        self.fuzzy_threshold
    }

    /// Answer library, loading it on first use.
    pub fn answers(&self) -> Arc<[AnswerRecord]> {
        self.catalog.ensure_loaded(self.api())
    }

    /// Load the answer library now, replacing any cached copy.
    pub fn reload_catalog(&self) -> CatalogLoad {
        self.catalog.reload(self.api())
    }
}
