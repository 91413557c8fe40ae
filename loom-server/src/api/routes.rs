//! HTTP handlers, mapping §6 operations onto Session Manager
//! calls. Thin by design: no business logic lives here.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{json, Value};

use loom_core::id::SessionId;
use loom_core::types::Changes;

use crate::api::dto::{
    CreateSessionRequest, CreateSessionResponse, EditRequest, EditResponse,
    SessionDetailsResponse, SessionHistoryResponse, VersionHistoryEntry,
};
use crate::api::error::ApiError;
use crate::state::AppState;

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/v1/design-sessions", post(create_session))
        .route("/api/v1/design-sessions/{sid}", get(get_session))
        .route("/api/v1/design-sessions/{sid}/edit", post(edit_session))
        .route("/api/v1/design-sessions/{sid}/history", get(get_history))
        .with_state(state)
}

fn parse_sid(raw: &str) -> Result<SessionId, ApiError> {
    raw.parse()
        .map_err(|_| ApiError::bad_request(format!("invalid session id: {raw}")))
}

async fn create_session(
    State(state): State<AppState>,
    Json(req): Json<CreateSessionRequest>,
) -> Result<(StatusCode, Json<CreateSessionResponse>), ApiError> {
    let user_id = req.user_id.unwrap_or_else(|| "anonymous".to_string());
    let (session, wireframe) = state
        .session_manager
        .create_session_with_generator(&user_id, &req.prompt, state.generator.as_ref())
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(CreateSessionResponse {
            session_id: session.session_id.to_string(),
            wireframe_json: wireframe,
            version: 1,
        }),
    ))
}

async fn edit_session(
    State(state): State<AppState>,
    Path(sid_raw): Path<String>,
    Json(req): Json<EditRequest>,
) -> Result<Json<EditResponse>, ApiError> {
    let sid = parse_sid(&sid_raw)?;

    let (processed, _current) = state
        .session_manager
        .process_edit_prompt(sid, &req.edit_prompt)
        .await?;

    // §6 external generator contract: a runtime failure at the edit path
    // surfaces as 500, unlike the create path's placeholder fallback.
    let updated_wireframe = state
        .generator
        .generate(&processed.enhanced_prompt)
        .await?;

    let mut extra_metadata = serde_json::Map::new();
    extra_metadata.insert("confidence".to_string(), json!(processed.confidence));
    extra_metadata.insert(
        "needs_clarification".to_string(),
        json!(processed.needs_clarification),
    );
    if !processed.clarification_options.is_empty() {
        extra_metadata.insert(
            "clarification_options".to_string(),
            json!(processed.clarification_options),
        );
    }

    let changes = Changes {
        prompt: req.edit_prompt.clone(),
        edit_type: Some(processed.edit_type),
        target_elements: processed.target_elements,
        summary: req.edit_prompt,
        processing_time_ms: None,
    };

    let result = state
        .session_manager
        .apply_edit(sid, updated_wireframe, changes, extra_metadata)
        .await?;

    Ok(Json(EditResponse {
        session_id: sid.to_string(),
        wireframe_json: result.updated_wireframe,
        version: result.new_version,
        changes_summary: result.changes_summary,
        processing_time_ms: result.processing_time_ms,
    }))
}

async fn get_session(
    State(state): State<AppState>,
    Path(sid_raw): Path<String>,
) -> Result<Json<SessionDetailsResponse>, ApiError> {
    let sid = parse_sid(&sid_raw)?;

    let session = state
        .session_manager
        .get_session(sid)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("session {sid} not found")))?;

    let current_wireframe = state
        .session_manager
        .get_current_wireframe(sid)
        .await?
        .unwrap_or_else(|| Value::Object(Default::default()));
    let recent_edits = state.session_manager.get_recent_edits(sid, 10).await?;

    Ok(Json(SessionDetailsResponse::new(
        session,
        current_wireframe,
        recent_edits,
    )))
}

async fn get_history(
    State(state): State<AppState>,
    Path(sid_raw): Path<String>,
) -> Result<Json<SessionHistoryResponse>, ApiError> {
    let sid = parse_sid(&sid_raw)?;

    // Ensures a 404 (not a 200 with an empty list) for unknown sessions.
    state
        .session_manager
        .get_session(sid)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("session {sid} not found")))?;

    let history = state.session_manager.get_session_history(sid).await?;
    let total_versions = history.len();
    let versions: Vec<VersionHistoryEntry> = history.into_iter().map(VersionHistoryEntry::from).collect();

    Ok(Json(SessionHistoryResponse {
        session_id: sid.to_string(),
        versions,
        total_versions,
    }))
}
