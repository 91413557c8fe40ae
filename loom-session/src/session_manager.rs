//! The Session Manager (§4.4): the sole write-path coordinator, composing
//! the State Store, Version Manager, and Context Engine into the session
//! lifecycle and the edit path.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::Utc;
use serde_json::Value;
use tracing::{instrument, warn};

use loom_context::ContextEngine;
use loom_core::error::{LoomError, Result};
use loom_core::id::SessionId;
use loom_core::types::{
    Changes, DesignState, EditContext, EditResult, EditType, IntegrityReport, Session,
    SessionMetrics, SessionStatus,
};
use loom_storage::StateStore;

use crate::generator::WireframeGenerator;
use crate::version_manager::VersionManager;

/// The sole write-path coordinator (§4.4). Holds no mutable process-wide
/// state of its own (§5); all mutation goes through `store`.
pub struct SessionManager {
    store: Arc<dyn StateStore>,
    version_manager: VersionManager,
    context_engine: ContextEngine,
    context_limit: usize,
    session_ttl: Duration,
}

impl SessionManager {
    pub fn new(
        store: Arc<dyn StateStore>,
        version_manager: VersionManager,
        context_engine: ContextEngine,
        context_limit: usize,
        session_ttl: Duration,
    ) -> Self {
        Self {
            store,
            version_manager,
            context_engine,
            context_limit,
            session_ttl,
        }
    }

    /// §4.4 `CreateSession`: constructs and stores a fresh active session
    /// at `current_version = 0`. The caller is responsible for invoking the
    /// generator and calling [`SessionManager::initialize_state`] (or
    /// [`SessionManager::create_session_with_generator`], which does both).
    #[instrument(skip(self, initial_prompt), fields(user_id = %user_id))]
    pub async fn create_session(&self, user_id: &str, initial_prompt: &str) -> Result<Session> {
        let session = Session::new(user_id, initial_prompt);
        let created = self.store.create_session(&session).await?;
        if !created {
            return Err(LoomError::storage(format!(
                "failed to create session {}",
                session.session_id
            )));
        }
        Ok(session)
    }

    /// Stores version 1 for a freshly created session (§4.4: "the session
    /// must not be left without a v1").
    pub async fn initialize_state(&self, sid: SessionId, wireframe_json: Value) -> Result<u64> {
        let changes = Changes {
            prompt: String::new(),
            edit_type: Some(EditType::Add),
            target_elements: Vec::new(),
            summary: "Initial design created".to_string(),
            processing_time_ms: Some(0),
        };
        self.version_manager
            .create_version(sid, wireframe_json, &changes, serde_json::Map::new())
            .await
    }

    /// The full create path (§4.4 + §9 "distinguished generator-fallback
    /// event"): create the session record, call the generator, and fall
    /// back to the placeholder wireframe on any generator failure — the
    /// session is never left without a v1.
    pub async fn create_session_with_generator(
        &self,
        user_id: &str,
        initial_prompt: &str,
        generator: &dyn WireframeGenerator,
    ) -> Result<(Session, Value)> {
        let session = self.create_session(user_id, initial_prompt).await?;
        let wireframe = match generator.generate(initial_prompt).await {
            Ok(wireframe) if wireframe.is_object() => wireframe,
            Ok(_) => {
                warn!(session_id = %session.session_id, "generator returned a non-object wireframe, using placeholder");
                crate::generator::placeholder_wireframe(initial_prompt)
            }
            Err(e) => {
                warn!(session_id = %session.session_id, error = %e, "generator fallback used");
                crate::generator::placeholder_wireframe(initial_prompt)
            }
        };
        self.initialize_state(session.session_id, wireframe.clone())
            .await?;
        Ok((session, wireframe))
    }

    /// §4.4 `GetSession`: lazily expires sessions past `SESSION_TTL`, and
    /// bumps `last_activity` on every successful read (§8 P5).
    #[instrument(skip(self))]
    pub async fn get_session(&self, sid: SessionId) -> Result<Option<Session>> {
        let Some(mut session) = self.store.get_session_metadata(sid).await? else {
            return Ok(None);
        };

        let now = Utc::now();
        let idle = now.signed_duration_since(session.last_activity);
        if idle.num_seconds() > self.session_ttl.as_secs() as i64 {
            self.store
                .set_session_status(sid, SessionStatus::Expired)
                .await?;
            return Ok(None);
        }

        self.store.update_session_activity(sid, now).await?;
        session.last_activity = now;
        Ok(Some(session))
    }

    /// §4.4 `ApplyEdit`, the primary edit path.
    #[instrument(skip(self, new_wireframe, changes, extra_metadata), fields(session_id = %sid))]
    pub async fn apply_edit(
        &self,
        sid: SessionId,
        new_wireframe: Value,
        changes: Changes,
        extra_metadata: serde_json::Map<String, Value>,
    ) -> Result<EditResult> {
        let session = self
            .get_session(sid)
            .await?
            .ok_or_else(|| LoomError::not_found(format!("session {sid} not found or expired")))?;

        if session.status != SessionStatus::Active {
            return Err(LoomError::inactive(format!(
                "session {sid} is {} and cannot be edited",
                session.status
            )));
        }

        let started = Instant::now();
        let new_version = self
            .version_manager
            .create_version(sid, new_wireframe.clone(), &changes, extra_metadata)
            .await?;
        let processing_time_ms = started.elapsed().as_millis() as u64;

        // §3 invariant 4: every write path refreshes TTL on the session's
        // keys, independent of the implicit (and non-guaranteed) refresh
        // `UpdateSessionActivity` would otherwise provide (§4.1).
        if let Err(e) = self.store.refresh_ttl(sid, self.session_ttl).await {
            warn!(session_id = %sid, error = %e, "failed to refresh session TTL after edit");
        }

        let edit_type = changes.edit_type.unwrap_or(EditType::Modify);
        let context = EditContext {
            prompt: changes.prompt.clone(),
            edit_type,
            target_elements: changes.target_elements.clone(),
            timestamp: Utc::now(),
            processing_time_ms,
        };

        // §4.4 failure semantics: context-list/counter errors are advisory
        // and never roll back an already-stored version.
        if let Err(e) = self
            .store
            .add_context_entry(sid, &context, self.context_limit)
            .await
        {
            warn!(session_id = %sid, error = %e, "context advisory fault: failed to append edit context");
        }
        if let Err(e) = self.store.increment_edit_count(sid).await {
            warn!(session_id = %sid, error = %e, "context advisory fault: failed to increment edit count");
        }

        Ok(EditResult {
            success: true,
            new_version,
            updated_wireframe: new_wireframe,
            changes_summary: changes.summary,
            processing_time_ms,
        })
    }

    /// Runs an edit prompt through the Context Engine and applies the
    /// resulting edit, returning both the processed edit (for clients that
    /// want the enhanced prompt / clarification options) and the result of
    /// generating from it. Callers needing clarification-first flows
    /// should inspect `ProcessedEdit::needs_clarification` before calling
    /// the generator at all.
    pub async fn process_edit_prompt(
        &self,
        sid: SessionId,
        edit_prompt: &str,
    ) -> Result<(loom_context::ProcessedEdit, DesignState)> {
        let current = self
            .store
            .get_design_state(sid, None)
            .await?
            .ok_or_else(|| LoomError::not_found(format!("session {sid} has no current state")))?;

        let recent_contexts = self.store.get_context_history(sid, self.context_limit).await?;
        let processed = self
            .context_engine
            .process(&current.wireframe_json, edit_prompt, &recent_contexts);
        Ok((processed, current))
    }

    /// Fetches the current (latest) wireframe document, used by the
    /// transport adapter's `GET /design-sessions/{sid}` (§6).
    pub async fn get_current_wireframe(&self, sid: SessionId) -> Result<Option<Value>> {
        Ok(self
            .store
            .get_design_state(sid, None)
            .await?
            .map(|state| state.wireframe_json))
    }

    /// Fetches up to `limit` most-recent edit contexts, newest-first.
    pub async fn get_recent_edits(&self, sid: SessionId, limit: usize) -> Result<Vec<EditContext>> {
        self.store.get_context_history(sid, limit).await
    }

    /// §4.4 `GetSessionHistory`: missing individual states are skipped, not
    /// fatal.
    pub async fn get_session_history(&self, sid: SessionId) -> Result<Vec<DesignState>> {
        self.get_session(sid)
            .await?
            .ok_or_else(|| LoomError::not_found(format!("session {sid} not found")))?;

        let versions = self.store.get_all_versions(sid).await?;
        let mut history = Vec::with_capacity(versions.len());
        for version in versions {
            if let Some(state) = self.store.get_design_state(sid, Some(version)).await? {
                history.push(state);
            }
        }
        Ok(history)
    }

    /// §4.4 `VerifySessionIntegrity`.
    pub async fn verify_session_integrity(&self, sid: SessionId) -> Result<IntegrityReport> {
        let versions = self.store.get_all_versions(sid).await?;
        let mut report = IntegrityReport {
            total: versions.len() as u64,
            ..Default::default()
        };
        for version in versions {
            if self
                .version_manager
                .verify_version_integrity(sid, version)
                .await?
            {
                report.valid += 1;
            } else {
                report.invalid += 1;
                report.corrupted_versions.push(version);
            }
        }
        Ok(report)
    }

    /// §4.4 `GetSessionMetrics`: delegates to the Version Manager, falling
    /// back to the context list when version data is unavailable.
    pub async fn get_session_metrics(&self, sid: SessionId) -> Result<SessionMetrics> {
        if let Some(metrics) = self.version_manager.calculate_session_metrics(sid).await? {
            return Ok(metrics);
        }

        let session = self
            .store
            .get_session_metadata(sid)
            .await?
            .ok_or_else(|| LoomError::not_found(format!("session {sid} not found")))?;
        let contexts = self.store.get_context_history(sid, self.context_limit).await?;

        let mut distribution: HashMap<EditType, u32> = HashMap::new();
        let mut total_processing_ms = 0u64;
        for ctx in &contexts {
            *distribution.entry(ctx.edit_type).or_insert(0) += 1;
            total_processing_ms += ctx.processing_time_ms;
        }
        let average_processing_time_ms = if contexts.is_empty() {
            0.0
        } else {
            total_processing_ms as f64 / contexts.len() as f64
        };

        Ok(SessionMetrics {
            total_edits: session.total_edits,
            session_duration_minutes: session
                .last_activity
                .signed_duration_since(session.created_at)
                .num_minutes(),
            edit_type_distribution: distribution,
            average_processing_time_ms,
        })
    }

    /// Explicit client-initiated completion (§4.4 state machine:
    /// `active -> completed`).
    pub async fn complete_session(&self, sid: SessionId) -> Result<()> {
        let session = self
            .get_session(sid)
            .await?
            .ok_or_else(|| LoomError::not_found(format!("session {sid} not found")))?;
        if session.status != SessionStatus::Active {
            return Err(LoomError::inactive(format!(
                "session {sid} is already {}",
                session.status
            )));
        }
        self.store
            .set_session_status(sid, SessionStatus::Completed)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generator::PlaceholderGenerator;
    use loom_storage::InMemoryStateStore;
    use serde_json::json;

    fn build_manager() -> SessionManager {
        let store: Arc<dyn StateStore> = Arc::new(InMemoryStateStore::new());
        let version_manager = VersionManager::new(store.clone(), 50, 10);
        let context_engine = ContextEngine::new(0.7);
        SessionManager::new(store, version_manager, context_engine, 10, Duration::from_secs(24 * 3600))
    }

    #[tokio::test]
    async fn create_and_one_edit_matches_scenario_1() {
        let manager = build_manager();
        let generator = PlaceholderGenerator;
        let (session, wireframe) = manager
            .create_session_with_generator("anonymous", "Create a login form", &generator)
            .await
            .unwrap();
        assert_eq!(wireframe["elements"][0]["text"], "Create a login form");

        let result = manager
            .apply_edit(
                session.session_id,
                json!({"elements": [{"id": "submit-1", "type": "button"}]}),
                Changes {
                    prompt: "add a submit button".into(),
                    edit_type: Some(EditType::Add),
                    target_elements: vec!["submit-1".into()],
                    summary: "1 elements added".into(),
                    processing_time_ms: None,
                },
                serde_json::Map::new(),
            )
            .await
            .unwrap();

        assert_eq!(result.new_version, 2);

        let history = manager.get_session_history(session.session_id).await.unwrap();
        assert_eq!(history.len(), 2);

        let contexts = manager
            .get_session_metrics(session.session_id)
            .await
            .unwrap();
        assert_eq!(contexts.total_edits, 1);
    }

    #[tokio::test]
    async fn editing_completed_session_is_rejected() {
        let manager = build_manager();
        let generator = PlaceholderGenerator;
        let (session, _) = manager
            .create_session_with_generator("anonymous", "p", &generator)
            .await
            .unwrap();
        manager.complete_session(session.session_id).await.unwrap();

        let err = manager
            .apply_edit(
                session.session_id,
                json!({}),
                Changes::default(),
                serde_json::Map::new(),
            )
            .await
            .unwrap_err();
        assert!(err.is_inactive());
    }

    #[tokio::test]
    async fn expired_session_is_not_found_on_read() {
        let manager = build_manager();
        let session = manager.create_session("anonymous", "p").await.unwrap();
        manager
            .store
            .update_session_activity(
                session.session_id,
                Utc::now() - chrono::Duration::hours(25),
            )
            .await
            .unwrap();

        let result = manager.get_session(session.session_id).await.unwrap();
        assert!(result.is_none());

        let raw = manager
            .store
            .get_session_metadata(session.session_id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(raw.status, SessionStatus::Expired);
    }

    #[tokio::test]
    async fn unknown_session_apply_edit_is_not_found() {
        let manager = build_manager();
        let err = manager
            .apply_edit(SessionId::new(), json!({}), Changes::default(), serde_json::Map::new())
            .await
            .unwrap_err();
        assert!(err.is_not_found());
    }
}
