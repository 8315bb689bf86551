//! Answer matching and text-driven survey edits.
//!
//! Tools: find_survey_answers, add_survey_answers_by_text, set_project_survey_by_text,
//!        remove_survey_answers_by_text, add_survey_answer, reload_answer_catalog

use serde_json::{Map, Value as JsonValue};

use crate::convert::{
    get_optional_bool, get_optional_threshold, get_project_id, get_string_arg,
    get_string_array_arg, to_json,
};
use crate::error::{McpError, Result};
use crate::matcher::match_terms;
use crate::reconcile::{self, ReconcileOptions};
use crate::schema;
use crate::session::McpSession;
use crate::tools::ToolDef;

/// Tool names handled by this module.
pub const NAMES: &[&str] = &[
    "find_survey_answers",
    "add_survey_answers_by_text",
    "set_project_survey_by_text",
    "remove_survey_answers_by_text",
    "add_survey_answer",
    "reload_answer_catalog",
];

/// Get all answer tool definitions.
pub fn tools() -> Vec<ToolDef> {
    vec![
        ToolDef::new(
            "find_survey_answers",
            "Find survey answer IDs by searching for answer text (e.g. 'Python', 'Django'). \
             Case-insensitive; tries exact, then substring, then fuzzy matching so typos \
             still resolve. Returns exactly one result per search text.",
            schema!(object {
                required: { "search_texts": array_string },
                optional: { "fuzzy_threshold": number }
            }),
        ),
        ToolDef::new(
            "add_survey_answers_by_text",
            "ADD answers to a project's survey draft by text, keeping every existing answer. \
             Blocked answers get their prerequisites selected automatically unless \
             auto_resolve_dependencies is false. Does not commit the draft.",
            schema!(object {
                required: { "project_id": project_id, "answer_texts": array_string },
                optional: { "fuzzy_threshold": number, "auto_resolve_dependencies": boolean }
            }),
        ),
        ToolDef::new(
            "set_project_survey_by_text",
            "SET/REPLACE all survey answers of a project by text. Answers not listed are \
             deselected. Set survey_complete to publish the draft afterwards.",
            schema!(object {
                required: { "project_id": project_id, "answer_texts": array_string },
                optional: { "fuzzy_threshold": number, "survey_complete": boolean }
            }),
        ),
        ToolDef::new(
            "remove_survey_answers_by_text",
            "Remove specific answers from a project's survey draft by text. All other \
             selected answers are kept.",
            schema!(object {
                required: { "project_id": project_id, "answer_texts": array_string },
                optional: { "fuzzy_threshold": number, "survey_complete": boolean }
            }),
        ),
        ToolDef::new(
            "add_survey_answer",
            "Select one answer by ID in a project's survey draft. If the answer is blocked by \
             unmet prerequisites, sibling answers of the same question are tried until it \
             becomes selectable.",
            schema!(object {
                required: { "project_id": project_id, "answer_id": string },
                optional: { "auto_resolve_dependencies": boolean }
            }),
        ),
        ToolDef::new(
            "reload_answer_catalog",
            "Reload the cached library of all survey answers used for text matching.",
            schema!(object {}),
        ),
    ]
}

/// Dispatch an answer tool call.
pub fn dispatch(
    session: &McpSession,
    name: &str,
    args: Map<String, JsonValue>,
) -> Result<JsonValue> {
    match name {
        "find_survey_answers" => {
            let texts = get_string_array_arg(&args, "search_texts")?;
            let threshold = resolve_threshold(session, &args)?;

            let results = match_terms(&session.answers(), &texts, threshold);
            to_json(&results)
        }

        "add_survey_answers_by_text" => {
            let project_id = get_project_id(&args, "project_id")?;
            let texts = get_string_array_arg(&args, "answer_texts")?;
            let threshold = resolve_threshold(session, &args)?;
            let auto_resolve = get_optional_bool(&args, "auto_resolve_dependencies").unwrap_or(true);

            let outcome = reconcile::add_survey_answers_by_text(
                session.api(),
                &session.answers(),
                project_id,
                &texts,
                threshold,
                auto_resolve,
            );
            to_json(&outcome)
        }

        "set_project_survey_by_text" => {
            let project_id = get_project_id(&args, "project_id")?;
            let texts = get_string_array_arg(&args, "answer_texts")?;
            let threshold = resolve_threshold(session, &args)?;
            let options = ReconcileOptions {
                commit: get_optional_bool(&args, "survey_complete").unwrap_or(false),
                ..ReconcileOptions::default()
            };

            let outcome = reconcile::set_survey_answers_by_text(
                session.api(),
                &session.answers(),
                project_id,
                &texts,
                threshold,
                options,
            );
            to_json(&outcome)
        }

        "remove_survey_answers_by_text" => {
            let project_id = get_project_id(&args, "project_id")?;
            let texts = get_string_array_arg(&args, "answer_texts")?;
            let threshold = resolve_threshold(session, &args)?;
            let options = ReconcileOptions {
                commit: get_optional_bool(&args, "survey_complete").unwrap_or(false),
                ..ReconcileOptions::default()
            };

            let outcome = reconcile::remove_survey_answers_by_text(
                session.api(),
                &session.answers(),
                project_id,
                &texts,
                threshold,
                options,
            );
            to_json(&outcome)
        }

        "add_survey_answer" => {
            let project_id = get_project_id(&args, "project_id")?;
            let answer_id = get_string_arg(&args, "answer_id")?;
            let auto_resolve = get_optional_bool(&args, "auto_resolve_dependencies").unwrap_or(true);

            let outcome = reconcile::add_survey_answer(session.api(), project_id, &answer_id, auto_resolve);
            to_json(&outcome)
        }

        "reload_answer_catalog" => to_json(&session.reload_catalog()),

        _ => Err(McpError::UnknownTool(name.to_string())),
    }
}

/// Per-call threshold, falling back to the session default.
fn resolve_threshold(session: &McpSession, args: &Map<String, JsonValue>) -> Result<f64> {
    Ok(get_optional_threshold(args, "fuzzy_threshold")?.unwrap_or_else(|| session.fuzzy_threshold()))
}
