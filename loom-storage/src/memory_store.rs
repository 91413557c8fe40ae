//! In-process fake `StateStore`, used by unit tests so they do not require
//! a live Redis (SPEC_FULL §10.4).

use std::collections::{HashMap, HashSet, VecDeque};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::Mutex;

use loom_core::error::Result;
use loom_core::id::SessionId;
use loom_core::types::{DesignState, EditContext, Session, SessionStatus, VersionMetadataRecord};

#[derive(Default)]
struct SessionRecord {
    session: Session,
    states: HashMap<u64, DesignState>,
    version_metadata: HashMap<u64, VersionMetadataRecord>,
    context: VecDeque<EditContext>,
}

impl Default for Session {
    fn default() -> Self {
        Session::new("anonymous", "")
    }
}

#[derive(Default)]
struct Inner {
    sessions: HashMap<SessionId, SessionRecord>,
    user_sessions: HashMap<String, HashSet<SessionId>>,
}

/// An in-memory `StateStore`. Not cleared by TTL; `refresh_ttl` is a no-op.
#[derive(Default)]
pub struct InMemoryStateStore {
    inner: Mutex<Inner>,
}

impl InMemoryStateStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl crate::store::StateStore for InMemoryStateStore {
    async fn create_session(&self, session: &Session) -> Result<bool> {
        let mut inner = self.inner.lock().await;
        inner.user_sessions
            .entry(session.user_id.clone())
            .or_default()
            .insert(session.session_id);
        inner.sessions.insert(
            session.session_id,
            SessionRecord {
                session: session.clone(),
                ..Default::default()
            },
        );
        Ok(true)
    }

    async fn get_session_metadata(&self, sid: SessionId) -> Result<Option<Session>> {
        let inner = self.inner.lock().await;
        Ok(inner.sessions.get(&sid).map(|r| r.session.clone()))
    }

    async fn update_session_activity(&self, sid: SessionId, now: DateTime<Utc>) -> Result<()> {
        let mut inner = self.inner.lock().await;
        if let Some(r) = inner.sessions.get_mut(&sid) {
            r.session.last_activity = now;
        }
        Ok(())
    }

    async fn set_session_status(&self, sid: SessionId, status: SessionStatus) -> Result<()> {
        let mut inner = self.inner.lock().await;
        if let Some(r) = inner.sessions.get_mut(&sid) {
            r.session.status = status;
        }
        Ok(())
    }

    async fn store_design_state(&self, state: &DesignState) -> Result<()> {
        let mut inner = self.inner.lock().await;
        if let Some(r) = inner.sessions.get_mut(&state.session_id) {
            r.session.current_version = state.version;
            r.states.insert(state.version, state.clone());
        }
        Ok(())
    }

    async fn get_design_state(
        &self,
        sid: SessionId,
        version: Option<u64>,
    ) -> Result<Option<DesignState>> {
        let inner = self.inner.lock().await;
        let Some(r) = inner.sessions.get(&sid) else {
            return Ok(None);
        };
        let version = version.unwrap_or(r.session.current_version);
        Ok(r.states.get(&version).cloned())
    }

    async fn get_all_versions(&self, sid: SessionId) -> Result<Vec<u64>> {
        let inner = self.inner.lock().await;
        let Some(r) = inner.sessions.get(&sid) else {
            return Ok(Vec::new());
        };
        let mut versions: Vec<u64> = r.states.keys().copied().collect();
        versions.sort_unstable();
        Ok(versions)
    }

    async fn store_version_metadata(
        &self,
        sid: SessionId,
        record: &VersionMetadataRecord,
    ) -> Result<()> {
        let mut inner = self.inner.lock().await;
        if let Some(r) = inner.sessions.get_mut(&sid) {
            r.version_metadata.insert(record.version, record.clone());
        }
        Ok(())
    }

    async fn get_version_metadata(
        &self,
        sid: SessionId,
        version: u64,
    ) -> Result<Option<VersionMetadataRecord>> {
        let inner = self.inner.lock().await;
        Ok(inner
            .sessions
            .get(&sid)
            .and_then(|r| r.version_metadata.get(&version).cloned()))
    }

    async fn add_context_entry(
        &self,
        sid: SessionId,
        ctx: &EditContext,
        limit: usize,
    ) -> Result<()> {
        let mut inner = self.inner.lock().await;
        if let Some(r) = inner.sessions.get_mut(&sid) {
            r.context.push_front(ctx.clone());
            while r.context.len() > limit {
                r.context.pop_back();
            }
        }
        Ok(())
    }

    async fn get_context_history(&self, sid: SessionId, limit: usize) -> Result<Vec<EditContext>> {
        let inner = self.inner.lock().await;
        Ok(inner
            .sessions
            .get(&sid)
            .map(|r| r.context.iter().take(limit).cloned().collect())
            .unwrap_or_default())
    }

    async fn increment_edit_count(&self, sid: SessionId) -> Result<u64> {
        let mut inner = self.inner.lock().await;
        if let Some(r) = inner.sessions.get_mut(&sid) {
            r.session.total_edits += 1;
            return Ok(r.session.total_edits);
        }
        Ok(0)
    }

    async fn cleanup_session(&self, sid: SessionId) -> Result<()> {
        let mut inner = self.inner.lock().await;
        if let Some(r) = inner.sessions.remove(&sid) {
            if let Some(set) = inner.user_sessions.get_mut(&r.session.user_id) {
                set.remove(&sid);
            }
        }
        Ok(())
    }

    async fn get_user_sessions(&self, user_id: &str) -> Result<Vec<SessionId>> {
        let inner = self.inner.lock().await;
        Ok(inner
            .user_sessions
            .get(user_id)
            .map(|set| set.iter().copied().collect())
            .unwrap_or_default())
    }

    async fn refresh_ttl(&self, _sid: SessionId, _ttl: Duration) -> Result<()> {
        Ok(())
    }
}
