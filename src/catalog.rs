//! Process-wide cache of the platform's answer library.
//!
//! Loaded once (eagerly at startup or lazily by the first lookup) and then
//! only read. A failed load leaves an empty catalog behind, so every lookup
//! degrades to "no match" instead of erroring.

use std::collections::HashSet;
use std::sync::{Arc, Mutex, MutexGuard};

use serde::Serialize;
use tracing::{info, warn};

use crate::client::{AnswerRecord, SurveyApi};

/// Page size large enough to fetch the whole library in one round trip.
pub const DEFAULT_PAGE_SIZE: usize = 10_000;

/// Summary of a catalog (re)load.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CatalogLoad {
    /// Number of distinct answers now cached.
    pub count: usize,
    /// Why the fetch failed, if it did. The cache is empty in that case.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// In-memory snapshot of every answer visible platform-wide.
pub struct AnswerCatalog {
    page_size: usize,
    answers: Mutex<Option<Arc<[AnswerRecord]>>>,
}

impl AnswerCatalog {
    /// Create an unloaded catalog.
    pub fn new(page_size: usize) -> Self {
        Self {
            page_size: page_size.max(1),
            answers: Mutex::new(None),
        }
    }

    /// Whether a load (successful or not) has happened.
    #[cfg(test)]
    pub fn is_loaded(&self) -> bool {
        self.lock().is_some()
    }

    /// Return the cached answers, loading them first if nothing is cached.
    ///
    /// The lock is held across the fetch, so concurrent first callers
    /// share a single load.
    pub fn ensure_loaded(&self, api: &dyn SurveyApi) -> Arc<[AnswerRecord]> {
        let mut guard = self.lock();
        if let Some(answers) = guard.as_ref() {
            return Arc::clone(answers);
        }
        let (answers, _) = self.fetch(api);
        *guard = Some(Arc::clone(&answers));
        answers
    }

    /// Refetch the library, replacing whatever was cached.
    pub fn reload(&self, api: &dyn SurveyApi) -> CatalogLoad {
        let mut guard = self.lock();
        let (answers, load) = self.fetch(api);
        *guard = Some(answers);
        load
    }

    /// Current contents without triggering a load. Empty when unloaded.
    #[cfg(test)]
    pub fn snapshot(&self) -> Arc<[AnswerRecord]> {
        self.lock()
            .as_ref()
            .map(Arc::clone)
            .unwrap_or_else(|| Arc::from(Vec::new()))
    }

    fn fetch(&self, api: &dyn SurveyApi) -> (Arc<[AnswerRecord]>, CatalogLoad) {
        info!(page_size = self.page_size, "loading answer library");
        match api.library_answers(self.page_size) {
            Ok(records) => {
                let answers = dedup_by_id(records);
                info!(count = answers.len(), "answer library loaded");
                let load = CatalogLoad {
                    count: answers.len(),
                    error: None,
                };
                (Arc::from(answers), load)
            }
            Err(e) => {
                warn!(error = %e, "failed to load answer library, continuing with an empty catalog");
                let load = CatalogLoad {
                    count: 0,
                    error: Some(e.to_string()),
                };
                (Arc::from(Vec::new()), load)
            }
        }
    }

    // A panic while holding the lock cannot leave a half-written catalog,
    // so a poisoned guard is still safe to use.
    fn lock(&self) -> MutexGuard<'_, Option<Arc<[AnswerRecord]>>> {
        self.answers.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl Default for AnswerCatalog {
    fn default() -> Self {
        Self::new(DEFAULT_PAGE_SIZE)
    }
}

fn dedup_by_id(records: Vec<AnswerRecord>) -> Vec<AnswerRecord> {
    let mut seen = HashSet::new();
    records
        .into_iter()
        .filter(|r| seen.insert(r.id.clone()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::DraftAnswer;
    use crate::error::{ApiError, ApiResult};
    use serde_json::Value as JsonValue;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    struct LibraryOnly {
        result: ApiResult<Vec<AnswerRecord>>,
        calls: AtomicUsize,
        delay: Duration,
    }

    impl LibraryOnly {
        fn new(result: ApiResult<Vec<AnswerRecord>>) -> Self {
            Self {
                result,
                calls: AtomicUsize::new(0),
                delay: Duration::ZERO,
            }
        }
    }

    impl SurveyApi for LibraryOnly {
        fn library_answers(&self, _page_size: usize) -> ApiResult<Vec<AnswerRecord>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            std::thread::sleep(self.delay);
            self.result.clone()
        }
        fn survey_draft(&self, _: u64) -> ApiResult<Vec<DraftAnswer>> {
            unreachable!()
        }
        fn set_answer_selected(&self, _: u64, _: &str, _: bool) -> ApiResult<JsonValue> {
            unreachable!()
        }
        fn commit_survey_draft(&self, _: u64) -> ApiResult<JsonValue> {
            unreachable!()
        }
        fn project_survey(&self, _: u64) -> ApiResult<JsonValue> {
            unreachable!()
        }
    }

    fn record(id: &str, text: &str) -> AnswerRecord {
        AnswerRecord {
            id: id.to_string(),
            text: text.to_string(),
            question: String::new(),
            description: String::new(),
            is_active: true,
        }
    }

    #[test]
    fn test_loads_once_and_dedups() {
        let api = LibraryOnly::new(Ok(vec![
            record("A1", "Java"),
            record("A2", "Go"),
            record("A1", "Java 2"),
        ]));
        let catalog = AnswerCatalog::default();
        assert!(!catalog.is_loaded());

        let first = catalog.ensure_loaded(&api);
        let second = catalog.ensure_loaded(&api);
        assert_eq!(first.len(), 2);
        assert_eq!(first[0].text, "Java");
        assert_eq!(second.len(), 2);
        assert_eq!(api.calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_concurrent_first_load_fetches_once() {
        let api = LibraryOnly {
            delay: Duration::from_millis(50),
            ..LibraryOnly::new(Ok(vec![record("A1", "Java"), record("A2", "Go")]))
        };
        let catalog = AnswerCatalog::default();

        let sizes: Vec<usize> = std::thread::scope(|scope| {
            let handles: Vec<_> = (0..8)
                .map(|_| scope.spawn(|| catalog.ensure_loaded(&api).len()))
                .collect();
            handles.into_iter().map(|h| h.join().unwrap()).collect()
        });

        assert_eq!(sizes, vec![2; 8]);
        assert_eq!(api.calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_failed_load_leaves_empty_catalog() {
        let api = LibraryOnly::new(Err(ApiError::Api("connection error".into())));
        let catalog = AnswerCatalog::default();
        let load = catalog.reload(&api);
        assert_eq!(load.count, 0);
        assert!(load.error.is_some());
        assert!(catalog.is_loaded());
        assert!(catalog.ensure_loaded(&api).is_empty());
        // No retry behind the caller's back.
        assert_eq!(api.calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_reload_replaces() {
        let api = LibraryOnly::new(Ok(vec![record("A1", "Java")]));
        let catalog = AnswerCatalog::new(50);
        assert!(catalog.snapshot().is_empty());
        catalog.ensure_loaded(&api);
        let load = catalog.reload(&api);
        assert_eq!(load, CatalogLoad { count: 1, error: None });
        assert_eq!(api.calls.load(Ordering::SeqCst), 2);
    }
}
