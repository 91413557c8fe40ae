//! Request/response shapes for the `/api/v1/design-sessions` surface
//! (§6). All timestamps are ISO-8601 UTC.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use loom_core::types::{DesignState, EditContext, Session};

#[derive(Debug, Deserialize)]
pub struct CreateSessionRequest {
    pub prompt: String,
    #[serde(default)]
    pub user_id: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct CreateSessionResponse {
    pub session_id: String,
    pub wireframe_json: Value,
    pub version: u64,
}

#[derive(Debug, Deserialize)]
pub struct EditRequest {
    pub edit_prompt: String,
}

#[derive(Debug, Serialize)]
pub struct EditResponse {
    pub session_id: String,
    pub wireframe_json: Value,
    pub version: u64,
    pub changes_summary: String,
    pub processing_time_ms: u64,
}

#[derive(Debug, Serialize)]
pub struct RecentEdit {
    pub prompt: String,
    pub edit_type: String,
    pub target_elements: Vec<String>,
    pub timestamp: DateTime<Utc>,
    pub processing_time_ms: u64,
}

impl From<&EditContext> for RecentEdit {
    fn from(ctx: &EditContext) -> Self {
        Self {
            prompt: ctx.prompt.clone(),
            edit_type: ctx.edit_type.to_string(),
            target_elements: ctx.target_elements.clone(),
            timestamp: ctx.timestamp,
            processing_time_ms: ctx.processing_time_ms,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct SessionDetailsResponse {
    pub session_id: String,
    pub user_id: String,
    pub initial_prompt: String,
    pub current_version: u64,
    pub total_edits: u64,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub last_activity: DateTime<Utc>,
    pub current_wireframe: Value,
    pub recent_edits: Vec<RecentEdit>,
}

impl SessionDetailsResponse {
    pub fn new(session: Session, current_wireframe: Value, recent_edits: Vec<EditContext>) -> Self {
        Self {
            session_id: session.session_id.to_string(),
            user_id: session.user_id,
            initial_prompt: session.initial_prompt,
            current_version: session.current_version,
            total_edits: session.total_edits,
            status: session.status.to_string(),
            created_at: session.created_at,
            last_activity: session.last_activity,
            current_wireframe,
            recent_edits: recent_edits.iter().map(RecentEdit::from).collect(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct VersionHistoryEntry {
    pub version: u64,
    pub created_at: DateTime<Utc>,
    pub metadata: Value,
    pub element_count: usize,
    pub wireframe_json: Value,
}

impl From<DesignState> for VersionHistoryEntry {
    fn from(state: DesignState) -> Self {
        let element_count = state
            .wireframe_json
            .get("children")
            .and_then(Value::as_array)
            .map_or(0, Vec::len);
        Self {
            version: state.version,
            created_at: state.created_at,
            metadata: serde_json::to_value(&state.metadata).unwrap_or(Value::Null),
            element_count,
            wireframe_json: state.wireframe_json,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct SessionHistoryResponse {
    pub session_id: String,
    pub versions: Vec<VersionHistoryEntry>,
    pub total_versions: usize,
}
