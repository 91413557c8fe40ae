//! Version (DesignState) records, metadata projections, and diffs.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::edit::EditType;
use crate::id::SessionId;

/// The `changes.summary` nested field carried in every `StateMetadata`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ChangesSummary {
    pub summary: String,
}

/// Strongly-typed projection of a DesignState's free-form `metadata` map
/// (§3, §9 re-architecture note: typed record with an explicit "extra" map
/// for forward-compat keys not named by §3).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StateMetadata {
    pub content_hash: String,
    pub edit_type: EditType,
    pub target_elements: Vec<String>,
    pub processing_time_ms: u64,
    pub changes: ChangesSummary,
    #[serde(default)]
    pub compressed: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub original_size: Option<u64>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// An immutable document version (§3 `DesignState`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DesignState {
    pub session_id: SessionId,
    pub version: u64,
    pub wireframe_json: serde_json::Value,
    pub metadata: StateMetadata,
    pub created_at: DateTime<Utc>,
}

/// Fast-access projection of a DesignState for history listings without
/// loading the full document (§3 `VersionMetadataRecord`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VersionMetadataRecord {
    pub version: u64,
    pub created_at: DateTime<Utc>,
    pub changes_summary: String,
    pub edit_type: EditType,
    pub target_elements: Vec<String>,
    pub processing_time_ms: u64,
    pub content_hash: String,
    pub compressed: bool,
}

/// `{from, to}` pair for a single modified element or metadata key.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Modified {
    pub id: String,
    pub from: serde_json::Value,
    pub to: serde_json::Value,
}

/// `{from, to}` pair without an id, used for `metadata_changes`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChangedValue {
    pub from: serde_json::Value,
    pub to: serde_json::Value,
}

/// Result of `VersionManager::get_version_diff` (§4.2).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VersionDiff {
    pub from_version: u64,
    pub to_version: u64,
    pub added: Vec<serde_json::Value>,
    pub removed: Vec<serde_json::Value>,
    pub modified: Vec<Modified>,
    pub metadata_changes: HashMap<String, ChangedValue>,
    pub summary: String,
}
