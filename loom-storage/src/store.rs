//! The `StateStore` seam (§4.1): typed key-value operations over a
//! Redis-compatible store, with no business logic.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use loom_core::error::Result;
use loom_core::id::SessionId;
use loom_core::types::{DesignState, EditContext, Session, SessionStatus, VersionMetadataRecord};

/// Every operation here follows the failure semantics of §4.1: storage
/// errors are caught and logged by the implementation and returned as a
/// `LoomError::Storage`, never as a panic or an unhandled exception. Absence
/// (nil, in §4.1's vocabulary) is `Ok(None)`, not an error.
#[async_trait]
pub trait StateStore: Send + Sync {
    /// Writes the metadata hash, adds `sid` to the user's session set, and
    /// sets TTL on both. Returns `false` (not an error) on storage fault so
    /// callers interpret it uniformly as "could not create".
    async fn create_session(&self, session: &Session) -> Result<bool>;

    async fn get_session_metadata(&self, sid: SessionId) -> Result<Option<Session>>;

    /// Overwrites `last_activity`. Does NOT refresh TTL — that is a
    /// separate, explicit concern on write paths (§4.1).
    async fn update_session_activity(&self, sid: SessionId, now: DateTime<Utc>) -> Result<()>;

    async fn set_session_status(&self, sid: SessionId, status: SessionStatus) -> Result<()>;

    /// Serializes `wireframe_json` and `metadata` with stable key ordering,
    /// overwrites `current_version` in the metadata hash, and sets the
    /// state key's TTL.
    async fn store_design_state(&self, state: &DesignState) -> Result<()>;

    /// If `version` is `None`, reads `current_version` from the metadata
    /// hash first.
    async fn get_design_state(
        &self,
        sid: SessionId,
        version: Option<u64>,
    ) -> Result<Option<DesignState>>;

    /// Scans `session:{sid}:state:v*`, extracts trailing integers, and
    /// returns them sorted ascending.
    async fn get_all_versions(&self, sid: SessionId) -> Result<Vec<u64>>;

    async fn store_version_metadata(
        &self,
        sid: SessionId,
        record: &VersionMetadataRecord,
    ) -> Result<()>;

    async fn get_version_metadata(
        &self,
        sid: SessionId,
        version: u64,
    ) -> Result<Option<VersionMetadataRecord>>;

    /// Prepends JSON to the context list, trims to `limit`, refreshes TTL.
    async fn add_context_entry(&self, sid: SessionId, ctx: &EditContext, limit: usize)
        -> Result<()>;

    /// Returns at most `limit` entries, head-first (newest first).
    async fn get_context_history(&self, sid: SessionId, limit: usize) -> Result<Vec<EditContext>>;

    /// Atomically increments `total_edits` and returns the new value.
    async fn increment_edit_count(&self, sid: SessionId) -> Result<u64>;

    /// Deletes all keys matching the session's key patterns.
    async fn cleanup_session(&self, sid: SessionId) -> Result<()>;

    async fn get_user_sessions(&self, user_id: &str) -> Result<Vec<SessionId>>;

    /// Refreshes TTL on the session's keys to `ttl` past now.
    async fn refresh_ttl(&self, sid: SessionId, ttl: Duration) -> Result<()>;
}
