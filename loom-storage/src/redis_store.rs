//! Redis-backed `StateStore` implementation.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use futures::StreamExt;
use redis::aio::ConnectionManager;
use redis::AsyncCommands;
use tracing::{error, instrument, warn};

use loom_core::error::{LoomError, Result};
use loom_core::id::SessionId;
use loom_core::types::{DesignState, EditContext, Session, SessionStatus, VersionMetadataRecord};

use crate::keyspace;

/// A `StateStore` backed by a single shared Redis connection (§5: "Global
/// state is limited to a single State Store connection, created lazily,
/// torn down on shutdown").
pub struct RedisStateStore {
    conn: ConnectionManager,
    ttl_secs: i64,
}

impl RedisStateStore {
    /// Connects with the default TTL (24h, §6 `SESSION_TTL_HOURS`
    /// default). Use [`RedisStateStore::connect_with_ttl`] to honor a
    /// configured `Settings::session_ttl`.
    pub async fn connect(redis_url: &str) -> Result<Self> {
        Self::connect_with_ttl(redis_url, Duration::from_secs(24 * 3600)).await
    }

    /// Connects with an explicit session TTL (§3 invariant 4: every key for
    /// a session expires no later than `SESSION_TTL` past `last_activity`).
    pub async fn connect_with_ttl(redis_url: &str, ttl: Duration) -> Result<Self> {
        let client = redis::Client::open(redis_url)
            .map_err(|e| LoomError::storage(format!("invalid redis url: {e}")))?;
        let conn = client
            .get_connection_manager()
            .await
            .map_err(|e| LoomError::storage(format!("failed to connect to redis: {e}")))?;
        Ok(Self {
            conn,
            ttl_secs: ttl.as_secs() as i64,
        })
    }

    fn conn(&self) -> ConnectionManager {
        self.conn.clone()
    }
}

fn storage_err(op: &str, e: redis::RedisError) -> LoomError {
    error!(operation = op, error = %e, "redis operation failed");
    LoomError::storage(format!("{op}: {e}"))
}

#[async_trait]
impl crate::store::StateStore for RedisStateStore {
    #[instrument(skip(self, session), fields(session_id = %session.session_id))]
    async fn create_session(&self, session: &Session) -> Result<bool> {
        let mut conn = self.conn();
        let key = keyspace::metadata_key(session.session_id);
        let fields = session_to_fields(session);
        let ttl = self.ttl_secs;

        let result: std::result::Result<(), redis::RedisError> = async {
            conn.hset_multiple(&key, &fields).await?;
            conn.expire(&key, ttl).await?;
            let user_key = keyspace::user_sessions_key(&session.user_id);
            conn.sadd(&user_key, session.session_id.to_string()).await?;
            conn.expire(&user_key, ttl).await?;
            Ok(())
        }
        .await;

        match result {
            Ok(()) => Ok(true),
            Err(e) => {
                warn!(error = %e, "create_session failed, reporting as not created");
                Ok(false)
            }
        }
    }

    #[instrument(skip(self))]
    async fn get_session_metadata(&self, sid: SessionId) -> Result<Option<Session>> {
        let mut conn = self.conn();
        let key = keyspace::metadata_key(sid);
        let fields: HashMap<String, String> = conn
            .hgetall(&key)
            .await
            .map_err(|e| storage_err("get_session_metadata", e))?;
        if fields.is_empty() {
            return Ok(None);
        }
        Ok(Some(session_from_fields(sid, &fields)?))
    }

    async fn update_session_activity(&self, sid: SessionId, now: DateTime<Utc>) -> Result<()> {
        let mut conn = self.conn();
        let key = keyspace::metadata_key(sid);
        conn.hset(&key, "last_activity", now.to_rfc3339())
            .await
            .map_err(|e| storage_err("update_session_activity", e))?;
        Ok(())
    }

    async fn set_session_status(&self, sid: SessionId, status: SessionStatus) -> Result<()> {
        let mut conn = self.conn();
        let key = keyspace::metadata_key(sid);
        conn.hset(&key, "status", status.as_str())
            .await
            .map_err(|e| storage_err("set_session_status", e))?;
        Ok(())
    }

    #[instrument(skip(self, state), fields(session_id = %state.session_id, version = state.version))]
    async fn store_design_state(&self, state: &DesignState) -> Result<()> {
        let mut conn = self.conn();
        let key = keyspace::state_key(state.session_id, state.version);
        let wireframe_json = serde_json::to_string(&state.wireframe_json)?;
        let metadata = serde_json::to_string(&state.metadata)?;

        let fields = [
            ("wireframe_json", wireframe_json),
            ("metadata", metadata),
            ("created_at", state.created_at.to_rfc3339()),
            ("version", state.version.to_string()),
        ];
        conn.hset_multiple(&key, &fields)
            .await
            .map_err(|e| storage_err("store_design_state", e))?;
        conn.expire(&key, self.ttl_secs)
            .await
            .map_err(|e| storage_err("store_design_state/expire", e))?;

        let meta_key = keyspace::metadata_key(state.session_id);
        conn.hset(&meta_key, "current_version", state.version)
            .await
            .map_err(|e| storage_err("store_design_state/current_version", e))?;
        Ok(())
    }

    async fn get_design_state(
        &self,
        sid: SessionId,
        version: Option<u64>,
    ) -> Result<Option<DesignState>> {
        let mut conn = self.conn();
        let version = match version {
            Some(v) => v,
            None => {
                let meta_key = keyspace::metadata_key(sid);
                let raw: Option<String> = conn
                    .hget(&meta_key, "current_version")
                    .await
                    .map_err(|e| storage_err("get_design_state/current_version", e))?;
                match raw.and_then(|v| v.parse::<u64>().ok()) {
                    Some(v) => v,
                    None => return Ok(None),
                }
            }
        };

        let key = keyspace::state_key(sid, version);
        let fields: HashMap<String, String> = conn
            .hgetall(&key)
            .await
            .map_err(|e| storage_err("get_design_state", e))?;
        if fields.is_empty() {
            return Ok(None);
        }
        Ok(Some(design_state_from_fields(sid, version, &fields)?))
    }

    async fn get_all_versions(&self, sid: SessionId) -> Result<Vec<u64>> {
        let mut conn = self.conn();
        let pattern = keyspace::state_key_pattern(sid);
        let prefix = keyspace::state_key_prefix(sid);
        let mut versions = Vec::new();

        let mut iter: redis::AsyncIter<String> = conn
            .scan_match(&pattern)
            .await
            .map_err(|e| storage_err("get_all_versions/scan", e))?;
        while let Some(key) = iter.next().await {
            if let Some(v) = keyspace::parse_trailing_version(&key, &prefix) {
                versions.push(v);
            }
        }
        drop(iter);
        versions.sort_unstable();
        Ok(versions)
    }

    async fn store_version_metadata(
        &self,
        sid: SessionId,
        record: &VersionMetadataRecord,
    ) -> Result<()> {
        let mut conn = self.conn();
        let key = keyspace::version_metadata_key(sid, record.version);
        let target_elements = serde_json::to_string(&record.target_elements)?;
        let fields = [
            ("version", record.version.to_string()),
            ("created_at", record.created_at.to_rfc3339()),
            ("changes_summary", record.changes_summary.clone()),
            ("edit_type", record.edit_type.as_str().to_string()),
            ("target_elements", target_elements),
            ("processing_time_ms", record.processing_time_ms.to_string()),
            ("content_hash", record.content_hash.clone()),
            ("compressed", record.compressed.to_string()),
        ];
        conn.hset_multiple(&key, &fields)
            .await
            .map_err(|e| storage_err("store_version_metadata", e))?;
        Ok(())
    }

    async fn get_version_metadata(
        &self,
        sid: SessionId,
        version: u64,
    ) -> Result<Option<VersionMetadataRecord>> {
        let mut conn = self.conn();
        let key = keyspace::version_metadata_key(sid, version);
        let fields: HashMap<String, String> = conn
            .hgetall(&key)
            .await
            .map_err(|e| storage_err("get_version_metadata", e))?;
        if fields.is_empty() {
            return Ok(None);
        }
        Ok(Some(version_metadata_from_fields(&fields)?))
    }

    async fn add_context_entry(
        &self,
        sid: SessionId,
        ctx: &EditContext,
        limit: usize,
    ) -> Result<()> {
        let mut conn = self.conn();
        let key = keyspace::context_key(sid);
        let payload = serde_json::to_string(ctx)?;
        conn.lpush(&key, payload)
            .await
            .map_err(|e| storage_err("add_context_entry/lpush", e))?;
        let keep = limit.saturating_sub(1) as isize;
        conn.ltrim(&key, 0, keep)
            .await
            .map_err(|e| storage_err("add_context_entry/ltrim", e))?;
        conn.expire(&key, self.ttl_secs)
            .await
            .map_err(|e| storage_err("add_context_entry/expire", e))?;
        Ok(())
    }

    async fn get_context_history(&self, sid: SessionId, limit: usize) -> Result<Vec<EditContext>> {
        let mut conn = self.conn();
        let key = keyspace::context_key(sid);
        let stop = (limit as isize).saturating_sub(1);
        let raw: Vec<String> = conn
            .lrange(&key, 0, stop)
            .await
            .map_err(|e| storage_err("get_context_history", e))?;
        raw.into_iter()
            .map(|s| serde_json::from_str(&s).map_err(LoomError::from))
            .collect()
    }

    async fn increment_edit_count(&self, sid: SessionId) -> Result<u64> {
        let mut conn = self.conn();
        let key = keyspace::metadata_key(sid);
        let new_total: i64 = conn
            .hincr(&key, "total_edits", 1)
            .await
            .map_err(|e| storage_err("increment_edit_count", e))?;
        Ok(new_total as u64)
    }

    async fn cleanup_session(&self, sid: SessionId) -> Result<()> {
        let mut conn = self.conn();
        let mut keys = vec![
            keyspace::metadata_key(sid),
            keyspace::context_key(sid),
        ];

        for pattern in [keyspace::state_key_pattern(sid), keyspace::version_metadata_pattern(sid)] {
            let mut iter: redis::AsyncIter<String> = conn
                .scan_match(&pattern)
                .await
                .map_err(|e| storage_err("cleanup_session/scan", e))?;
            while let Some(key) = iter.next().await {
                keys.push(key);
            }
        }

        if !keys.is_empty() {
            conn.del(keys)
                .await
                .map_err(|e| storage_err("cleanup_session/del", e))?;
        }
        Ok(())
    }

    async fn get_user_sessions(&self, user_id: &str) -> Result<Vec<SessionId>> {
        let mut conn = self.conn();
        let key = keyspace::user_sessions_key(user_id);
        let raw: Vec<String> = conn
            .smembers(&key)
            .await
            .map_err(|e| storage_err("get_user_sessions", e))?;
        Ok(raw
            .into_iter()
            .filter_map(|s| s.parse::<SessionId>().ok())
            .collect())
    }

    async fn refresh_ttl(&self, sid: SessionId, ttl: Duration) -> Result<()> {
        let mut conn = self.conn();
        let secs = ttl.as_secs() as i64;
        for key in [keyspace::metadata_key(sid), keyspace::context_key(sid)] {
            conn.expire(&key, secs)
                .await
                .map_err(|e| storage_err("refresh_ttl", e))?;
        }
        Ok(())
    }
}

fn session_to_fields(session: &Session) -> Vec<(&'static str, String)> {
    vec![
        ("session_id", session.session_id.to_string()),
        ("user_id", session.user_id.clone()),
        ("initial_prompt", session.initial_prompt.clone()),
        ("current_version", session.current_version.to_string()),
        ("created_at", session.created_at.to_rfc3339()),
        ("last_activity", session.last_activity.to_rfc3339()),
        ("status", session.status.as_str().to_string()),
        ("total_edits", session.total_edits.to_string()),
    ]
}

fn session_from_fields(sid: SessionId, fields: &HashMap<String, String>) -> Result<Session> {
    let get = |k: &str| -> Result<&String> {
        fields
            .get(k)
            .ok_or_else(|| LoomError::storage(format!("missing field {k} in session hash")))
    };
    Ok(Session {
        session_id: sid,
        user_id: get("user_id")?.clone(),
        initial_prompt: get("initial_prompt")?.clone(),
        current_version: get("current_version")?.parse().unwrap_or(0),
        created_at: parse_timestamp(get("created_at")?)?,
        last_activity: parse_timestamp(get("last_activity")?)?,
        status: get("status")?.parse()?,
        total_edits: get("total_edits")?.parse().unwrap_or(0),
    })
}

fn design_state_from_fields(
    sid: SessionId,
    version: u64,
    fields: &HashMap<String, String>,
) -> Result<DesignState> {
    let get = |k: &str| -> Result<&String> {
        fields
            .get(k)
            .ok_or_else(|| LoomError::storage(format!("missing field {k} in state hash")))
    };
    Ok(DesignState {
        session_id: sid,
        version,
        wireframe_json: serde_json::from_str(get("wireframe_json")?)?,
        metadata: serde_json::from_str(get("metadata")?)?,
        created_at: parse_timestamp(get("created_at")?)?,
    })
}

fn version_metadata_from_fields(fields: &HashMap<String, String>) -> Result<VersionMetadataRecord> {
    let get = |k: &str| -> Result<&String> {
        fields
            .get(k)
            .ok_or_else(|| LoomError::storage(format!("missing field {k} in version metadata hash")))
    };
    Ok(VersionMetadataRecord {
        version: get("version")?.parse().unwrap_or(0),
        created_at: parse_timestamp(get("created_at")?)?,
        changes_summary: get("changes_summary")?.clone(),
        edit_type: get("edit_type")?.parse()?,
        target_elements: serde_json::from_str(get("target_elements")?)?,
        processing_time_ms: get("processing_time_ms")?.parse().unwrap_or(0),
        content_hash: get("content_hash")?.clone(),
        compressed: get("compressed")?.parse().unwrap_or(false),
    })
}

fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| LoomError::storage(format!("invalid timestamp {raw:?}: {e}")))
}
