//! Converging a project's survey draft onto a requested answer set.
//!
//! Three modes share one code path:
//! - set: the draft ends up with exactly the target answers selected;
//! - add: targets get selected, nothing gets deselected;
//! - remove: named answers get deselected, everything else is kept.
//!
//! Every decision is made from a freshly fetched draft. Answers already in
//! their desired state are never written. Individual mutation failures are
//! collected per item; only failing to read the draft aborts an operation.

use std::collections::HashSet;

use serde::Serialize;
use serde_json::Value as JsonValue;
use tracing::{debug, info, warn};

use crate::client::{AnswerRecord, DraftAnswer, SurveyApi};
use crate::error::ApiResult;
use crate::matcher::{match_terms, MatchResult, MatchType};
use crate::outcome::{FailureKind, ItemFailure, Outcome};
use crate::resolver::{select_answer, AnswerRef, Selection};

const COMMIT_NOTE: &str =
    "Draft updated but not committed. Call commit_survey_draft to apply changes.";

/// Options for set and remove mode.
#[derive(Debug, Clone, Copy)]
pub struct ReconcileOptions {
    /// Resolve blocked targets through sibling answers.
    pub auto_resolve_dependencies: bool,
    /// Publish the draft afterwards.
    pub commit: bool,
}

impl Default for ReconcileOptions {
    fn default() -> Self {
        Self {
            auto_resolve_dependencies: true,
            commit: false,
        }
    }
}

/// Publish state after a reconciliation.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum CommitStatus {
    /// No commit was requested.
    NotRequested {
        /// Reminder that the draft is unpublished.
        note: String,
    },
    /// The draft was published.
    Committed {
        /// Body returned by the platform.
        result: JsonValue,
    },
    /// Reconciliation finished but publishing failed; retry the commit alone.
    Failed {
        /// Failure category of the commit call.
        kind: FailureKind,
        /// API error message.
        error: String,
    },
}

impl CommitStatus {
    /// Whether the draft got published.
    pub fn is_committed(&self) -> bool {
        matches!(self, CommitStatus::Committed { .. })
    }
}

/// Report for set, update and remove mode.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReconcileReport {
    /// Project whose draft was reconciled.
    pub project_id: u64,
    /// Answer ids the draft was converged onto.
    pub target_answers: Vec<String>,
    /// Answers selected by this call.
    pub selected: Vec<String>,
    /// Answers deselected by this call.
    pub deselected: Vec<String>,
    /// Number of answers selected.
    pub selected_count: usize,
    /// Number of answers deselected.
    pub deselected_count: usize,
    /// Sibling answers selected to unblock targets.
    pub dependencies_added: Vec<AnswerRef>,
    /// Target ids that do not exist in the draft.
    pub missing_answers: Vec<String>,
    /// Answers asked to be removed that were not selected.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub not_selected: Vec<String>,
    /// How search texts were resolved, for the text-driven modes.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub matches: Vec<MatchResult>,
    /// Publish state.
    pub commit: CommitStatus,
}

/// Converge the draft onto exactly `targets`.
pub fn set_survey_answers(
    api: &dyn SurveyApi,
    project_id: u64,
    targets: &[String],
    options: ReconcileOptions,
) -> Outcome<ReconcileReport> {
    let draft = match fetch_draft(api, project_id) {
        Ok(draft) => draft,
        Err(e) => return Outcome::from_api_error(&e),
    };
    let (report, failures) = converge(api, project_id, &draft, targets, options);
    Outcome::from_report(report, failures)
}

/// Match `texts` against the catalog and converge the draft onto the matches.
///
/// Unmatched texts are reported as failures. If nothing matched, the draft
/// is left alone rather than cleared.
pub fn set_survey_answers_by_text(
    api: &dyn SurveyApi,
    catalog: &[AnswerRecord],
    project_id: u64,
    texts: &[String],
    threshold: f64,
    options: ReconcileOptions,
) -> Outcome<ReconcileReport> {
    let matches = match_terms(catalog, texts, threshold);
    let mut failures = unresolved_texts(&matches);
    if !texts.is_empty() && failures.len() == texts.len() {
        return Outcome::Failure {
            kind: FailureKind::UnresolvedText,
            detail: format!(
                "None of the answer texts matched (threshold: {}); the draft was not changed",
                threshold
            ),
        };
    }
    let targets = matched_ids(&matches);

    let draft = match fetch_draft(api, project_id) {
        Ok(draft) => draft,
        Err(e) => return Outcome::from_api_error(&e),
    };
    let (mut report, converge_failures) = converge(api, project_id, &draft, &targets, options);
    report.matches = matches;
    failures.extend(converge_failures);
    Outcome::from_report(report, failures)
}

/// Deselect the answers matching `texts`, keeping every other selection.
pub fn remove_survey_answers_by_text(
    api: &dyn SurveyApi,
    catalog: &[AnswerRecord],
    project_id: u64,
    texts: &[String],
    threshold: f64,
    options: ReconcileOptions,
) -> Outcome<ReconcileReport> {
    let matches = match_terms(catalog, texts, threshold);
    let mut failures = unresolved_texts(&matches);
    let removals: HashSet<String> = matched_ids(&matches).into_iter().collect();

    let draft = match fetch_draft(api, project_id) {
        Ok(draft) => draft,
        Err(e) => return Outcome::from_api_error(&e),
    };

    let keep: Vec<String> = draft
        .iter()
        .filter(|a| a.selected && !removals.contains(&a.id))
        .map(|a| a.id.clone())
        .collect();
    let not_selected: Vec<String> = matched_ids(&matches)
        .into_iter()
        .filter(|id| !draft.iter().any(|a| a.selected && a.id == *id))
        .collect();

    let (mut report, converge_failures) = converge(api, project_id, &draft, &keep, options);
    report.not_selected = not_selected;
    report.matches = matches;
    failures.extend(converge_failures);
    Outcome::from_report(report, failures)
}

/// Publish the draft.
pub fn commit_draft(api: &dyn SurveyApi, project_id: u64) -> ApiResult<JsonValue> {
    info!(project_id, "committing survey draft");
    let result = api.commit_survey_draft(project_id)?;
    info!(project_id, "survey draft committed");
    Ok(result)
}

/// Report for a standalone commit.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CommitReport {
    /// Project whose draft was published.
    pub project_id: u64,
    /// Body returned by the platform.
    pub result: JsonValue,
}

/// Publish the draft, reporting a failed publish as a `commit` failure.
pub fn commit_survey(api: &dyn SurveyApi, project_id: u64) -> Outcome<CommitReport> {
    match commit_draft(api, project_id) {
        Ok(result) => Outcome::Success {
            report: CommitReport { project_id, result },
        },
        Err(e) => {
            warn!(project_id, error = %e, "failed to commit survey draft");
            Outcome::Failure {
                kind: FailureKind::Commit,
                detail: e.to_string(),
            }
        }
    }
}

fn fetch_draft(api: &dyn SurveyApi, project_id: u64) -> ApiResult<Vec<DraftAnswer>> {
    api.survey_draft(project_id).map_err(|e| {
        warn!(project_id, error = %e, "failed to retrieve survey draft");
        e
    })
}

/// Deselect everything selected outside `targets`, then select each target
/// that is not selected yet.
fn converge(
    api: &dyn SurveyApi,
    project_id: u64,
    draft: &[DraftAnswer],
    targets: &[String],
    options: ReconcileOptions,
) -> (ReconcileReport, Vec<ItemFailure>) {
    let targets = dedup(targets);
    let target_set: HashSet<&str> = targets.iter().map(String::as_str).collect();
    let present: HashSet<&str> = draft.iter().map(|a| a.id.as_str()).collect();

    let mut failures = Vec::new();
    let mut selected = Vec::new();
    let mut deselected = Vec::new();
    let mut dependencies = Vec::new();

    let missing: Vec<String> = targets
        .iter()
        .filter(|id| !present.contains(id.as_str()))
        .cloned()
        .collect();
    for id in &missing {
        failures.push(ItemFailure::new(
            id.clone(),
            FailureKind::NotFound,
            format!("Answer {} not found in survey draft", id),
        ));
    }

    for answer in draft
        .iter()
        .filter(|a| a.selected && !target_set.contains(a.id.as_str()))
    {
        debug!(project_id, answer = %answer.id, "deselecting answer");
        match api.set_answer_selected(project_id, &answer.id, false) {
            Ok(_) => deselected.push(answer.id.clone()),
            Err(e) => {
                warn!(project_id, answer = %answer.id, error = %e, "failed to deselect answer");
                failures.push(ItemFailure::from_api(answer.id.clone(), &e));
            }
        }
    }

    for answer in draft
        .iter()
        .filter(|a| !a.selected && target_set.contains(a.id.as_str()))
    {
        match select_answer(api, project_id, &answer.id, options.auto_resolve_dependencies) {
            Ok(selection) => {
                dependencies.extend_from_slice(selection.dependencies_added());
                match &selection {
                    Selection::Selected | Selection::Resolved { .. } => {
                        selected.push(answer.id.clone())
                    }
                    // Picked up earlier in this call as another target's prerequisite.
                    Selection::AlreadySelected if was_added(&dependencies, &answer.id) => {
                        selected.push(answer.id.clone())
                    }
                    Selection::AlreadySelected => {}
                    other => failures.push(selection_failure(&answer.id, other)),
                }
            }
            Err(e) => {
                warn!(project_id, answer = %answer.id, error = %e, "failed to select answer");
                failures.push(ItemFailure::from_api(answer.id.clone(), &e));
            }
        }
    }

    let commit = if options.commit {
        match commit_draft(api, project_id) {
            Ok(result) => CommitStatus::Committed { result },
            Err(e) => {
                warn!(project_id, error = %e, "failed to commit survey draft");
                CommitStatus::Failed {
                    kind: FailureKind::from(&e),
                    error: e.to_string(),
                }
            }
        }
    } else {
        CommitStatus::NotRequested {
            note: COMMIT_NOTE.to_string(),
        }
    };

    let report = ReconcileReport {
        project_id,
        selected_count: selected.len(),
        deselected_count: deselected.len(),
        target_answers: targets,
        selected,
        deselected,
        dependencies_added: dependencies,
        missing_answers: missing,
        not_selected: Vec::new(),
        matches: Vec::new(),
        commit,
    };
    (report, failures)
}

/// Bucketed report for add mode.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AddReport {
    /// Project whose draft was updated.
    pub project_id: u64,
    /// Counts per bucket.
    pub summary: AddSummary,
    /// Answers newly selected.
    pub added: Vec<AddedAnswer>,
    /// Answers that were already selected.
    pub skipped: Vec<SkippedAnswer>,
    /// Texts that could not be added.
    pub failed: Vec<FailedAnswer>,
    /// Sibling answers selected while resolving blockers.
    pub dependencies: Vec<AnswerRef>,
}

/// Counts per [`AddReport`] bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct AddSummary {
    /// Newly selected answers.
    pub added: usize,
    /// Already selected answers.
    pub skipped: usize,
    /// Failed texts.
    pub failed: usize,
    /// Sibling answers selected as dependencies.
    pub dependencies_added: usize,
}

/// A text whose answer got selected.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AddedAnswer {
    /// Search text as supplied.
    pub text: String,
    /// Selected answer.
    pub answer_id: String,
    /// Canonical answer text.
    pub matched_text: Option<String>,
    /// How the text matched.
    pub match_type: MatchType,
    /// Match similarity.
    pub similarity: f64,
}

/// A text whose answer was already selected.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SkippedAnswer {
    /// Search text as supplied.
    pub text: String,
    /// Matched answer.
    pub answer_id: String,
    /// Why nothing was done.
    pub reason: String,
}

/// A text that could not be added.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FailedAnswer {
    /// Search text as supplied.
    pub text: String,
    /// Matched answer, if the text matched at all.
    pub answer_id: Option<String>,
    /// Failure category.
    pub kind: FailureKind,
    /// Why it failed.
    pub reason: String,
    /// What the caller could try next.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggestion: Option<String>,
    /// Matcher output for unmatched texts.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub match_info: Option<MatchResult>,
}

/// Match `texts` and select each matched answer, resolving blockers.
///
/// Items are processed one after another; each sees the draft as left by
/// the previous one. A failing item never stops the batch.
pub fn add_survey_answers_by_text(
    api: &dyn SurveyApi,
    catalog: &[AnswerRecord],
    project_id: u64,
    texts: &[String],
    threshold: f64,
    auto_resolve_dependencies: bool,
) -> Outcome<AddReport> {
    debug!(project_id, texts = ?texts, "looking up answers");
    let matches = match_terms(catalog, texts, threshold);

    let mut added = Vec::new();
    let mut skipped = Vec::new();
    let mut failed = Vec::new();
    let mut dependencies = Vec::new();

    for m in matches {
        let Some(answer_id) = m.answer_id.clone() else {
            failed.push(FailedAnswer {
                text: m.search_term.clone(),
                answer_id: None,
                kind: FailureKind::UnresolvedText,
                reason: "Answer not found".to_string(),
                suggestion: Some(
                    "Lower fuzzy_threshold or check the wording with find_survey_answers"
                        .to_string(),
                ),
                match_info: Some(m),
            });
            continue;
        };

        match select_answer(api, project_id, &answer_id, auto_resolve_dependencies) {
            Ok(Selection::AlreadySelected) if was_added(&dependencies, &answer_id) => {
                debug!(project_id, answer = %answer_id, "added earlier as a prerequisite");
                added.push(AddedAnswer {
                    text: m.search_term,
                    answer_id,
                    matched_text: m.matched_text,
                    match_type: m.match_type,
                    similarity: m.similarity,
                });
            }
            Ok(Selection::AlreadySelected) => skipped.push(SkippedAnswer {
                text: m.search_term,
                answer_id,
                reason: "Already selected".to_string(),
            }),
            Ok(selection) if selection.is_success() => {
                let deps = selection.dependencies_added();
                debug!(project_id, answer = %answer_id, dependencies = deps.len(), "added answer");
                dependencies.extend_from_slice(deps);
                added.push(AddedAnswer {
                    text: m.search_term,
                    answer_id,
                    matched_text: m.matched_text,
                    match_type: m.match_type,
                    similarity: m.similarity,
                });
            }
            Ok(selection) => {
                warn!(project_id, answer = %answer_id, state = ?selection, "failed to add answer");
                dependencies.extend_from_slice(selection.dependencies_added());
                failed.push(FailedAnswer {
                    kind: selection_kind(&selection),
                    reason: selection.error(&answer_id).unwrap_or_default(),
                    suggestion: selection.suggestion(),
                    text: m.search_term,
                    answer_id: Some(answer_id),
                    match_info: None,
                });
            }
            Err(e) => {
                warn!(project_id, answer = %answer_id, error = %e, "failed to add answer");
                failed.push(FailedAnswer {
                    text: m.search_term,
                    answer_id: Some(answer_id),
                    kind: FailureKind::from(&e),
                    reason: e.to_string(),
                    suggestion: None,
                    match_info: None,
                });
            }
        }
    }

    let failures = failed
        .iter()
        .map(|f| {
            ItemFailure::new(f.text.clone(), f.kind, f.reason.clone())
                .with_suggestion(f.suggestion.clone())
        })
        .collect();
    let report = AddReport {
        project_id,
        summary: AddSummary {
            added: added.len(),
            skipped: skipped.len(),
            failed: failed.len(),
            dependencies_added: dependencies.len(),
        },
        added,
        skipped,
        failed,
        dependencies,
    };
    Outcome::from_report(report, failures)
}

/// Report for a single-answer selection.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SelectReport {
    /// Project whose draft was updated.
    pub project_id: u64,
    /// Answer that was asked for.
    pub answer_id: String,
    /// Where the resolver ended up.
    pub selection: Selection,
}

/// Select one answer by id, resolving blockers when allowed.
pub fn add_survey_answer(
    api: &dyn SurveyApi,
    project_id: u64,
    answer_id: &str,
    auto_resolve_dependencies: bool,
) -> Outcome<SelectReport> {
    let selection = match select_answer(api, project_id, answer_id, auto_resolve_dependencies) {
        Ok(selection) => selection,
        Err(e) => return Outcome::from_api_error(&e),
    };
    let failures = if selection.is_success() {
        Vec::new()
    } else {
        vec![selection_failure(answer_id, &selection)]
    };
    let report = SelectReport {
        project_id,
        answer_id: answer_id.to_string(),
        selection,
    };
    Outcome::from_report(report, failures)
}

fn selection_kind(selection: &Selection) -> FailureKind {
    match selection {
        Selection::NotFound => FailureKind::NotFound,
        Selection::SelectFailed { .. } => FailureKind::Api,
        _ => FailureKind::UnresolvedDependency,
    }
}

fn selection_failure(answer_id: &str, selection: &Selection) -> ItemFailure {
    ItemFailure::new(
        answer_id,
        selection_kind(selection),
        selection.error(answer_id).unwrap_or_default(),
    )
    .with_suggestion(selection.suggestion())
}

fn was_added(dependencies: &[AnswerRef], answer_id: &str) -> bool {
    dependencies.iter().any(|d| d.id == answer_id)
}

fn unresolved_texts(matches: &[MatchResult]) -> Vec<ItemFailure> {
    matches
        .iter()
        .filter(|m| !m.is_match())
        .map(|m| {
            ItemFailure::new(
                m.search_term.clone(),
                FailureKind::UnresolvedText,
                m.message.clone().unwrap_or_default(),
            )
        })
        .collect()
}

fn matched_ids(matches: &[MatchResult]) -> Vec<String> {
    dedup(&matches.iter().filter_map(|m| m.answer_id.clone()).collect::<Vec<_>>())
}

/// Drop repeated ids, keeping first occurrences in order.
fn dedup(ids: &[String]) -> Vec<String> {
    let mut seen = HashSet::new();
    ids.iter()
        .filter(|id| seen.insert(id.as_str()))
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ApiError;
    use std::sync::Mutex;

    /// Flat draft with no prerequisites; records every PATCH.
    struct FlatDraft {
        answers: Mutex<Vec<DraftAnswer>>,
        patches: Mutex<Vec<(String, bool)>>,
        commit_error: Option<ApiError>,
    }

    impl FlatDraft {
        fn new(answers: &[(&str, &str, bool)]) -> Self {
            Self {
                answers: Mutex::new(
                    answers
                        .iter()
                        .map(|(id, text, selected)| DraftAnswer {
                            id: id.to_string(),
                            selected: *selected,
                            valid: true,
                            question: format!("Q-{}", id),
                            text: text.to_string(),
                        })
                        .collect(),
                ),
                patches: Mutex::new(Vec::new()),
                commit_error: None,
            }
        }

        fn take_patches(&self) -> Vec<(String, bool)> {
            std::mem::take(&mut *self.patches.lock().unwrap())
        }

        fn selected(&self) -> Vec<String> {
            self.answers
                .lock()
                .unwrap()
                .iter()
                .filter(|a| a.selected)
                .map(|a| a.id.clone())
                .collect()
        }

        fn catalog(&self) -> Vec<AnswerRecord> {
            self.answers
                .lock()
                .unwrap()
                .iter()
                .map(|a| AnswerRecord {
                    id: a.id.clone(),
                    text: a.text.clone(),
                    question: a.question.clone(),
                    description: String::new(),
                    is_active: true,
                })
                .collect()
        }
    }

    impl SurveyApi for FlatDraft {
        fn library_answers(&self, _: usize) -> ApiResult<Vec<AnswerRecord>> {
            Ok(self.catalog())
        }

        fn survey_draft(&self, _: u64) -> ApiResult<Vec<DraftAnswer>> {
            Ok(self.answers.lock().unwrap().clone())
        }

        fn set_answer_selected(&self, _: u64, answer_id: &str, selected: bool) -> ApiResult<JsonValue> {
            self.patches
                .lock()
                .unwrap()
                .push((answer_id.to_string(), selected));
            if let Some(a) = self
                .answers
                .lock()
                .unwrap()
                .iter_mut()
                .find(|a| a.id == answer_id)
            {
                a.selected = selected;
            }
            Ok(JsonValue::Null)
        }

        fn commit_survey_draft(&self, _: u64) -> ApiResult<JsonValue> {
            match &self.commit_error {
                Some(e) => Err(e.clone()),
                None => Ok(serde_json::json!({"committed": true})),
            }
        }

        fn project_survey(&self, _: u64) -> ApiResult<JsonValue> {
            Ok(JsonValue::Null)
        }
    }

    fn strings(ids: &[&str]) -> Vec<String> {
        ids.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_set_issues_minimal_operations() {
        let api = FlatDraft::new(&[("A1", "Java", true), ("A2", "Python", true), ("A3", "Go", false)]);
        let outcome = set_survey_answers(&api, 7, &strings(&["A2", "A3"]), ReconcileOptions::default());
        assert!(outcome.is_success());
        assert_eq!(
            api.take_patches(),
            vec![("A1".to_string(), false), ("A3".to_string(), true)]
        );
        let report = outcome.report().unwrap();
        assert_eq!(report.selected_count, 1);
        assert_eq!(report.deselected_count, 1);
        assert!(!report.commit.is_committed());
    }

    #[test]
    fn test_set_is_idempotent() {
        let api = FlatDraft::new(&[("A1", "Java", true), ("A2", "Python", false)]);
        let targets = strings(&["A2"]);
        set_survey_answers(&api, 7, &targets, ReconcileOptions::default());
        api.take_patches();

        let outcome = set_survey_answers(&api, 7, &targets, ReconcileOptions::default());
        assert!(api.take_patches().is_empty());
        let report = outcome.report().unwrap();
        assert_eq!(report.selected_count + report.deselected_count, 0);
    }

    #[test]
    fn test_missing_targets_reported() {
        let api = FlatDraft::new(&[("A1", "Java", false)]);
        let outcome = set_survey_answers(&api, 7, &strings(&["A1", "A404"]), ReconcileOptions::default());
        let report = outcome.report().unwrap();
        assert_eq!(report.missing_answers, vec!["A404".to_string()]);
        assert_eq!(report.selected, vec!["A1".to_string()]);
        assert_eq!(outcome.failures()[0].kind, FailureKind::NotFound);
    }

    #[test]
    fn test_commit_failure_kept_apart() {
        let mut api = FlatDraft::new(&[("A1", "Java", false)]);
        api.commit_error = Some(ApiError::Api("503 - maintenance".into()));
        let options = ReconcileOptions {
            commit: true,
            ..ReconcileOptions::default()
        };
        let outcome = set_survey_answers(&api, 7, &strings(&["A1"]), options);
        assert!(outcome.is_success());
        match &outcome.report().unwrap().commit {
            CommitStatus::Failed { kind, .. } => assert_eq!(*kind, FailureKind::Api),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_standalone_commit() {
        let mut api = FlatDraft::new(&[("A1", "Java", true)]);
        assert!(commit_survey(&api, 7).is_success());

        api.commit_error = Some(ApiError::Auth("authentication failed".into()));
        match commit_survey(&api, 7) {
            Outcome::Failure { kind, detail } => {
                assert_eq!(kind, FailureKind::Commit);
                assert!(detail.contains("authentication failed"));
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_set_by_text_with_nothing_matched_changes_nothing() {
        let api = FlatDraft::new(&[("A1", "Java", true)]);
        let catalog = api.catalog();
        let outcome = set_survey_answers_by_text(
            &api,
            &catalog,
            7,
            &strings(&["COBOL"]),
            0.75,
            ReconcileOptions::default(),
        );
        assert!(matches!(
            outcome,
            Outcome::Failure {
                kind: FailureKind::UnresolvedText,
                ..
            }
        ));
        assert!(api.take_patches().is_empty());
    }

    #[test]
    fn test_remove_keeps_other_selections() {
        let api = FlatDraft::new(&[("A1", "Java", true), ("A2", "Python", true), ("A3", "Go", false)]);
        let catalog = api.catalog();
        let outcome = remove_survey_answers_by_text(
            &api,
            &catalog,
            7,
            &strings(&["python", "Go"]),
            0.75,
            ReconcileOptions::default(),
        );
        assert_eq!(api.take_patches(), vec![("A2".to_string(), false)]);
        assert_eq!(api.selected(), vec!["A1".to_string()]);
        let report = outcome.report().unwrap();
        assert_eq!(report.not_selected, vec!["A3".to_string()]);
        assert_eq!(report.matches.len(), 2);
    }

    #[test]
    fn test_add_buckets() {
        let api = FlatDraft::new(&[("A1", "Java", true), ("A2", "Python", false)]);
        let catalog = api.catalog();
        let outcome = add_survey_answers_by_text(
            &api,
            &catalog,
            7,
            &strings(&["Java", "Pyton", "COBOL"]),
            0.75,
            true,
        );
        let report = outcome.report().unwrap();
        assert_eq!(
            report.summary,
            AddSummary {
                added: 1,
                skipped: 1,
                failed: 1,
                dependencies_added: 0
            }
        );
        assert_eq!(report.added[0].answer_id, "A2");
        assert_eq!(report.added[0].match_type, MatchType::Fuzzy);
        assert_eq!(report.failed[0].kind, FailureKind::UnresolvedText);
        assert!(report.failed[0].match_info.is_some());
        // Nothing is ever deselected in add mode.
        assert!(api.take_patches().iter().all(|(_, selected)| *selected));
    }
}
