//! Survey structure, id-based draft edits and publishing.
//!
//! Tools: get_project_survey, get_survey_answers_for_project, update_project_survey,
//!        commit_survey_draft

use serde_json::{Map, Value as JsonValue};

use crate::convert::{get_optional_bool, get_project_id, get_string_array_arg, to_json};
use crate::error::{McpError, Result};
use crate::reconcile::{self, ReconcileOptions};
use crate::schema;
use crate::session::McpSession;
use crate::tools::ToolDef;

/// Tool names handled by this module.
pub const NAMES: &[&str] = &[
    "get_project_survey",
    "get_survey_answers_for_project",
    "update_project_survey",
    "commit_survey_draft",
];

/// Get all survey tool definitions.
pub fn tools() -> Vec<ToolDef> {
    vec![
        ToolDef::new(
            "get_project_survey",
            "Get the complete survey structure of a project: sections, questions and ALL \
             possible answers. Use get_survey_answers_for_project to see only selected answers.",
            schema!(object {
                required: { "project_id": project_id }
            }),
        ),
        ToolDef::new(
            "get_survey_answers_for_project",
            "Get the survey answers currently selected for a project (from its draft, which \
             mirrors the published survey until edited).",
            schema!(object {
                required: { "project_id": project_id }
            }),
        ),
        ToolDef::new(
            "update_project_survey",
            "Set a project's survey answers using answer IDs (not text). Answers not listed \
             are deselected. Set survey_complete to publish the draft afterwards.",
            schema!(object {
                required: { "project_id": project_id, "answers": array_string },
                optional: { "survey_complete": boolean }
            }),
        ),
        ToolDef::new(
            "commit_survey_draft",
            "Commit the survey draft to publish the survey and generate countermeasures.",
            schema!(object {
                required: { "project_id": project_id }
            }),
        ),
    ]
}

/// Dispatch a survey tool call.
pub fn dispatch(
    session: &McpSession,
    name: &str,
    args: Map<String, JsonValue>,
) -> Result<JsonValue> {
    match name {
        "get_project_survey" => {
            let project_id = get_project_id(&args, "project_id")?;
            Ok(session.api().project_survey(project_id)?)
        }

        "get_survey_answers_for_project" => {
            let project_id = get_project_id(&args, "project_id")?;

            let draft = session.api().survey_draft(project_id)?;
            let selected: Vec<JsonValue> = draft
                .iter()
                .filter(|a| a.selected)
                .map(|a| {
                    serde_json::json!({
                        "id": a.id,
                        "text": a.text,
                        "question": a.question,
                    })
                })
                .collect();
            Ok(serde_json::json!({
                "project_id": project_id,
                "selected_count": selected.len(),
                "answers": selected,
            }))
        }

        "update_project_survey" => {
            let project_id = get_project_id(&args, "project_id")?;
            // An empty list is a legitimate "clear everything" request here.
            let answers = match args.get("answers") {
                Some(JsonValue::Array(a)) if a.is_empty() => Vec::new(),
                _ => get_string_array_arg(&args, "answers")?,
            };
            let options = ReconcileOptions {
                commit: get_optional_bool(&args, "survey_complete").unwrap_or(false),
                ..ReconcileOptions::default()
            };

            let outcome = reconcile::set_survey_answers(session.api(), project_id, &answers, options);
            to_json(&outcome)
        }

        "commit_survey_draft" => {
            let project_id = get_project_id(&args, "project_id")?;
            to_json(&reconcile::commit_survey(session.api(), project_id))
        }

        _ => Err(McpError::UnknownTool(name.to_string())),
    }
}
