//! Selecting a single answer in a survey draft, resolving blockers.
//!
//! The platform marks an answer `valid = false` while its prerequisites are
//! unmet. With auto-resolution on, the resolver tries the target's sibling
//! answers (same question) one at a time: select the sibling, refetch the
//! draft, and stop as soon as the target turns valid.
//!
//! The search is greedy and never backtracks. Siblings selected on a path
//! that did not help stay selected. Each sibling is tried at most once.

use std::collections::HashSet;

use serde::Serialize;
use tracing::{debug, warn};

use crate::client::{DraftAnswer, SurveyApi};
use crate::error::ApiResult;

/// Lightweight reference to a draft answer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AnswerRef {
    /// Answer token.
    pub id: String,
    /// Answer label.
    pub text: String,
}

impl From<&DraftAnswer> for AnswerRef {
    fn from(answer: &DraftAnswer) -> Self {
        Self {
            id: answer.id.clone(),
            text: answer.text.clone(),
        }
    }
}

/// Terminal state of one selection attempt.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum Selection {
    /// The answer was already selected; nothing was written.
    AlreadySelected,
    /// The answer was valid and got selected directly.
    Selected,
    /// Selecting sibling answers unblocked the target, which is now selected.
    Resolved {
        /// Siblings selected on the way, in order.
        dependencies_added: Vec<AnswerRef>,
    },
    /// The answer is not part of this project's survey.
    NotFound,
    /// The answer is blocked and auto-resolution was disabled.
    Blocked,
    /// Every sibling was tried and the answer is still blocked.
    Unresolved {
        /// Siblings that were tried, in order.
        attempted: Vec<AnswerRef>,
        /// Siblings that were selected and remain selected.
        left_selected: Vec<AnswerRef>,
    },
    /// The final select call for the target failed.
    SelectFailed {
        /// API error message.
        error: String,
        /// Siblings selected before the failure.
        dependencies_added: Vec<AnswerRef>,
    },
}

impl Selection {
    /// Whether the answer ends up selected.
    pub fn is_success(&self) -> bool {
        matches!(
            self,
            Selection::AlreadySelected | Selection::Selected | Selection::Resolved { .. }
        )
    }

    /// Siblings selected as a side effect, whether or not they helped.
    pub fn dependencies_added(&self) -> &[AnswerRef] {
        match self {
            Selection::Resolved { dependencies_added }
            | Selection::SelectFailed {
                dependencies_added, ..
            } => dependencies_added,
            Selection::Unresolved { left_selected, .. } => left_selected,
            _ => &[],
        }
    }

    /// Failure message for unsuccessful states.
    pub fn error(&self, answer_id: &str) -> Option<String> {
        match self {
            Selection::NotFound => Some(format!("Answer {} not found in survey", answer_id)),
            Selection::Blocked => Some("Answer has unmet dependencies".to_string()),
            Selection::Unresolved { .. } => {
                Some("Could not automatically resolve dependencies".to_string())
            }
            Selection::SelectFailed { error, .. } => Some(error.clone()),
            _ => None,
        }
    }

    /// What the caller could try next, for unsuccessful states.
    pub fn suggestion(&self) -> Option<String> {
        match self {
            Selection::Blocked => Some(
                "Enable auto_resolve_dependencies to select prerequisite answers automatically"
                    .to_string(),
            ),
            Selection::Unresolved { .. } => Some(
                "This answer may require prerequisite answers from different questions"
                    .to_string(),
            ),
            _ => None,
        }
    }
}

/// Select `answer_id` in the project's draft.
///
/// Only the initial draft fetch is fatal. Failures of individual mutations
/// or refetches during resolution are logged and the search moves on.
pub fn select_answer(
    api: &dyn SurveyApi,
    project_id: u64,
    answer_id: &str,
    auto_resolve: bool,
) -> ApiResult<Selection> {
    let mut draft = api.survey_draft(project_id)?;

    let target = match find(&draft, answer_id) {
        Some(t) => t.clone(),
        None => return Ok(Selection::NotFound),
    };
    if target.selected {
        return Ok(Selection::AlreadySelected);
    }
    if target.valid {
        debug!(project_id, answer_id, "selecting answer");
        return Ok(match api.set_answer_selected(project_id, answer_id, true) {
            Ok(_) => Selection::Selected,
            Err(e) => Selection::SelectFailed {
                error: e.to_string(),
                dependencies_added: Vec::new(),
            },
        });
    }
    if !auto_resolve {
        return Ok(Selection::Blocked);
    }

    debug!(
        project_id,
        answer_id,
        question = %target.question,
        "answer is blocked, trying sibling answers"
    );

    let mut visited: HashSet<String> = HashSet::new();
    let mut attempted = Vec::new();
    let mut added = Vec::new();

    while let Some(sibling) = next_sibling(&draft, &target, &visited) {
        visited.insert(sibling.id.clone());
        attempted.push(AnswerRef::from(&sibling));

        debug!(project_id, sibling = %sibling.id, text = %sibling.text, "trying prerequisite");
        if let Err(e) = api.set_answer_selected(project_id, &sibling.id, true) {
            warn!(project_id, sibling = %sibling.id, error = %e, "could not select prerequisite");
            continue;
        }
        added.push(AnswerRef::from(&sibling));

        match api.survey_draft(project_id) {
            Ok(fresh) => draft = fresh,
            Err(e) => {
                warn!(project_id, error = %e, "could not refresh draft after selecting prerequisite");
                mark_selected(&mut draft, &sibling.id);
                continue;
            }
        }

        match find(&draft, answer_id) {
            Some(t) if t.selected => {
                return Ok(Selection::Resolved {
                    dependencies_added: added,
                })
            }
            Some(t) if t.valid => {
                debug!(project_id, answer_id, "answer unblocked, selecting");
                return Ok(match api.set_answer_selected(project_id, answer_id, true) {
                    Ok(_) => Selection::Resolved {
                        dependencies_added: added,
                    },
                    Err(e) => Selection::SelectFailed {
                        error: e.to_string(),
                        dependencies_added: added,
                    },
                });
            }
            _ => {}
        }
    }

    warn!(
        project_id,
        answer_id,
        attempted = attempted.len(),
        "could not resolve dependencies"
    );
    Ok(Selection::Unresolved {
        attempted,
        left_selected: added,
    })
}

fn find<'a>(draft: &'a [DraftAnswer], answer_id: &str) -> Option<&'a DraftAnswer> {
    draft.iter().find(|a| a.id == answer_id)
}

/// Next untried, valid, unselected answer under the target's question.
fn next_sibling(
    draft: &[DraftAnswer],
    target: &DraftAnswer,
    visited: &HashSet<String>,
) -> Option<DraftAnswer> {
    draft
        .iter()
        .find(|a| {
            a.id != target.id
                && a.question == target.question
                && a.valid
                && !a.selected
                && !visited.contains(&a.id)
        })
        .cloned()
}

fn mark_selected(draft: &mut [DraftAnswer], answer_id: &str) {
    if let Some(a) = draft.iter_mut().find(|a| a.id == answer_id) {
        a.selected = true;
    }
}
