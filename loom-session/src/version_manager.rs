//! The Version Manager (§4.2): enforces version monotonicity, content
//! integrity, and version immutability; computes diffs; compacts old
//! versions.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use serde_json::Value;
use tracing::{debug, info, instrument, warn};

use loom_core::error::{LoomError, Result};
use loom_core::hash::{canonical_byte_len, content_hash};
use loom_core::id::SessionId;
use loom_core::types::{
    ChangedValue, Changes, ChangesSummary, DesignState, EditType, Modified, SessionMetrics,
    StateMetadata, VersionDiff, VersionMetadataRecord,
};
use loom_storage::StateStore;

/// Builds versions atop the state store and enforces the invariants of
/// §3 (monotonicity, content integrity, immutability-except-compaction).
pub struct VersionManager {
    store: Arc<dyn StateStore>,
    max_versions_per_session: usize,
    compression_keep_recent: usize,
}

impl VersionManager {
    pub fn new(
        store: Arc<dyn StateStore>,
        max_versions_per_session: usize,
        compression_keep_recent: usize,
    ) -> Self {
        Self {
            store,
            max_versions_per_session,
            compression_keep_recent,
        }
    }

    /// §4.2 `CreateVersion`: computes the content hash, stores the new
    /// immutable `DesignState` and its `VersionMetadataRecord`, and
    /// triggers compaction if the session has grown past
    /// `max_versions_per_session`.
    #[instrument(skip(self, wireframe_json, changes, extra_metadata), fields(session_id = %sid))]
    pub async fn create_version(
        &self,
        sid: SessionId,
        wireframe_json: Value,
        changes: &Changes,
        extra_metadata: serde_json::Map<String, Value>,
    ) -> Result<u64> {
        let session = self
            .store
            .get_session_metadata(sid)
            .await?
            .ok_or_else(|| LoomError::not_found(format!("session {sid} not found")))?;

        let new_version = session.current_version + 1;
        let hash = content_hash(&wireframe_json);

        let metadata = StateMetadata {
            content_hash: hash.clone(),
            edit_type: changes.edit_type.unwrap_or(EditType::Modify),
            target_elements: changes.target_elements.clone(),
            processing_time_ms: changes.processing_time_ms.unwrap_or(0),
            changes: ChangesSummary {
                summary: changes.summary.clone(),
            },
            compressed: false,
            original_size: None,
            extra: extra_metadata,
        };

        let state = DesignState {
            session_id: sid,
            version: new_version,
            wireframe_json,
            metadata,
            created_at: Utc::now(),
        };

        self.store.store_design_state(&state).await.map_err(|e| {
            LoomError::storage(format!("failed to store version {new_version} for {sid}: {e}"))
        })?;

        let record = VersionMetadataRecord {
            version: new_version,
            created_at: state.created_at,
            changes_summary: state.metadata.changes.summary.clone(),
            edit_type: state.metadata.edit_type,
            target_elements: state.metadata.target_elements.clone(),
            processing_time_ms: state.metadata.processing_time_ms,
            content_hash: hash,
            compressed: false,
        };
        self.store.store_version_metadata(sid, &record).await?;

        self.check_and_compress(sid).await?;

        Ok(new_version)
    }

    /// §4.2 step 7: compacts once a session exceeds `max_versions_per_session`.
    async fn check_and_compress(&self, sid: SessionId) -> Result<()> {
        let versions = self.store.get_all_versions(sid).await?;
        if versions.len() > self.max_versions_per_session {
            let compressed = self
                .compress_old_versions(sid, self.compression_keep_recent)
                .await?;
            if compressed > 0 {
                info!(session_id = %sid, compressed, "compacted old versions");
            }
        }
        Ok(())
    }

    /// §4.2 `GetVersionDiff`: diffs `wireframe_json["elements"]` between
    /// two versions, keyed by `id`; elements without `id` are diff-invisible.
    pub async fn get_version_diff(
        &self,
        sid: SessionId,
        from_version: u64,
        to_version: u64,
    ) -> Result<Option<VersionDiff>> {
        let (from_state, to_state) = tokio::try_join!(
            self.store.get_design_state(sid, Some(from_version)),
            self.store.get_design_state(sid, Some(to_version)),
        )?;
        let (Some(from_state), Some(to_state)) = (from_state, to_state) else {
            return Ok(None);
        };

        let from_elements = element_id_map(&from_state.wireframe_json);
        let to_elements = element_id_map(&to_state.wireframe_json);

        let mut added = Vec::new();
        let mut modified = Vec::new();
        for (id, to_value) in &to_elements {
            match from_elements.get(id) {
                None => added.push(to_value.clone()),
                Some(from_value) if from_value != to_value => modified.push(Modified {
                    id: id.clone(),
                    from: from_value.clone(),
                    to: to_value.clone(),
                }),
                Some(_) => {}
            }
        }
        let removed: Vec<Value> = from_elements
            .iter()
            .filter(|(id, _)| !to_elements.contains_key(*id))
            .map(|(_, v)| v.clone())
            .collect();

        let metadata_changes = metadata_diff(&from_state.metadata, &to_state.metadata)?;
        let summary = build_summary(added.len(), removed.len(), modified.len());

        Ok(Some(VersionDiff {
            from_version,
            to_version,
            added,
            removed,
            modified,
            metadata_changes,
            summary,
        }))
    }

    /// §4.2 `CompressOldVersions`: rewrites every version older than the
    /// `keep_recent` most recent ones into a structural skeleton, in place,
    /// preserving version number and timestamp.
    #[instrument(skip(self), fields(session_id = %sid))]
    pub async fn compress_old_versions(&self, sid: SessionId, keep_recent: usize) -> Result<u64> {
        let mut versions = self.store.get_all_versions(sid).await?;
        versions.sort_unstable_by(|a, b| b.cmp(a));
        let to_compress = versions.into_iter().skip(keep_recent);

        let mut count = 0u64;
        for version in to_compress {
            let Some(record) = self.store.get_version_metadata(sid, version).await? else {
                continue;
            };
            if record.compressed {
                continue;
            }
            let Some(state) = self.store.get_design_state(sid, Some(version)).await? else {
                continue;
            };

            let original_size = canonical_byte_len(&state.wireframe_json);
            let skeleton = build_skeleton(&state.wireframe_json);

            let mut new_metadata = state.metadata.clone();
            new_metadata.compressed = true;
            new_metadata.original_size = Some(original_size);

            let compacted = DesignState {
                session_id: sid,
                version,
                wireframe_json: skeleton,
                metadata: new_metadata,
                created_at: state.created_at,
            };
            self.store.store_design_state(&compacted).await?;

            let mut new_record = record.clone();
            new_record.compressed = true;
            self.store.store_version_metadata(sid, &new_record).await?;

            debug!(session_id = %sid, version, "compressed version");
            count += 1;
        }

        Ok(count)
    }

    /// §4.2 `VerifyVersionIntegrity`: recomputes the canonical-JSON hash and
    /// compares to the stored `content_hash`. Integrity checks on
    /// `compressed=true` versions are suppressed and reported as valid —
    /// compaction necessarily rewrites `wireframe_json`, so the original
    /// hash can never match again (documented open question in SPEC_FULL).
    pub async fn verify_version_integrity(&self, sid: SessionId, version: u64) -> Result<bool> {
        let Some(state) = self.store.get_design_state(sid, Some(version)).await? else {
            return Ok(false);
        };
        if state.metadata.content_hash.is_empty() {
            return Ok(false);
        }
        if state.metadata.compressed {
            return Ok(true);
        }
        let recomputed = content_hash(&state.wireframe_json);
        let valid = recomputed == state.metadata.content_hash;
        if !valid {
            warn!(session_id = %sid, version, "content hash mismatch");
        }
        Ok(valid)
    }

    /// SPEC_FULL §1 resolved ambiguity: `total_edits` is `len(all_versions)
    /// - 1` (the initial version is not itself an edit); duration is whole
    /// minutes.
    pub async fn calculate_session_metrics(&self, sid: SessionId) -> Result<Option<SessionMetrics>> {
        let Some(session) = self.store.get_session_metadata(sid).await? else {
            return Ok(None);
        };
        let versions = self.store.get_all_versions(sid).await?;
        if versions.is_empty() {
            return Ok(None);
        }

        let total_edits = versions.len().saturating_sub(1) as u64;
        let session_duration_minutes = (session.last_activity - session.created_at).num_minutes();

        let mut distribution: HashMap<EditType, u32> = HashMap::new();
        let mut total_processing_ms: u64 = 0;
        let mut sampled = 0u64;
        // Skip the initial version (versions[0], the lowest per §4.1's
        // ascending sort): it isn't itself an edit, consistent with
        // `total_edits` above.
        for version in versions.iter().skip(1) {
            if let Some(record) = self.store.get_version_metadata(sid, *version).await? {
                *distribution.entry(record.edit_type).or_insert(0) += 1;
                total_processing_ms += record.processing_time_ms;
                sampled += 1;
            }
        }
        let average_processing_time_ms = if sampled > 0 {
            total_processing_ms as f64 / sampled as f64
        } else {
            0.0
        };

        Ok(Some(SessionMetrics {
            total_edits,
            session_duration_minutes,
            edit_type_distribution: distribution,
            average_processing_time_ms,
        }))
    }
}

fn element_id_map(wireframe_json: &Value) -> HashMap<String, Value> {
    let mut map = HashMap::new();
    if let Some(elements) = wireframe_json.get("elements").and_then(Value::as_array) {
        for element in elements {
            if let Some(id) = element.get("id").and_then(Value::as_str) {
                map.insert(id.to_string(), element.clone());
            }
        }
    }
    map
}

fn metadata_diff(
    from: &StateMetadata,
    to: &StateMetadata,
) -> Result<HashMap<String, ChangedValue>> {
    let from_value = serde_json::to_value(from)?;
    let to_value = serde_json::to_value(to)?;
    let (Value::Object(from_map), Value::Object(to_map)) = (from_value, to_value) else {
        return Ok(HashMap::new());
    };

    let mut keys: Vec<&String> = from_map.keys().chain(to_map.keys()).collect();
    keys.sort();
    keys.dedup();

    let mut changes = HashMap::new();
    for key in keys {
        let from_v = from_map.get(key).cloned().unwrap_or(Value::Null);
        let to_v = to_map.get(key).cloned().unwrap_or(Value::Null);
        if from_v != to_v {
            changes.insert(key.clone(), ChangedValue { from: from_v, to: to_v });
        }
    }
    Ok(changes)
}

fn build_summary(added: usize, removed: usize, modified: usize) -> String {
    let mut parts = Vec::new();
    if added > 0 {
        parts.push(format!("{added} elements added"));
    }
    if removed > 0 {
        parts.push(format!("{removed} elements removed"));
    }
    if modified > 0 {
        parts.push(format!("{modified} elements modified"));
    }
    if parts.is_empty() {
        "No changes detected".to_string()
    } else {
        parts.join(", ")
    }
}

/// §4.2 compaction skeleton: `{elements: [{id,type,position,size}], layout,
/// compressed: true}`, dropping every other key.
fn build_skeleton(wireframe_json: &Value) -> Value {
    let mut skeleton = serde_json::Map::new();

    let elements: Vec<Value> = wireframe_json
        .get("elements")
        .and_then(Value::as_array)
        .map(|elements| elements.iter().map(skeleton_element).collect())
        .unwrap_or_default();
    skeleton.insert("elements".to_string(), Value::Array(elements));

    if let Some(layout) = wireframe_json.get("layout") {
        skeleton.insert("layout".to_string(), layout.clone());
    }
    skeleton.insert("compressed".to_string(), Value::Bool(true));

    Value::Object(skeleton)
}

fn skeleton_element(element: &Value) -> Value {
    let mut out = serde_json::Map::new();
    for key in ["id", "type", "position", "size"] {
        if let Some(v) = element.get(key) {
            out.insert(key.to_string(), v.clone());
        }
    }
    Value::Object(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use loom_core::types::Session;
    use loom_storage::InMemoryStateStore;
    use serde_json::json;

    async fn seed_session(store: &Arc<dyn StateStore>) -> SessionId {
        let session = Session::new("anonymous", "initial prompt");
        let sid = session.session_id;
        store.create_session(&session).await.unwrap();
        let vm = VersionManager::new(store.clone(), 50, 10);
        vm.create_version(
            sid,
            json!({"elements": []}),
            &Changes {
                prompt: "initial".into(),
                edit_type: Some(EditType::Add),
                target_elements: vec![],
                summary: "Initial design".into(),
                processing_time_ms: Some(0),
            },
            serde_json::Map::new(),
        )
        .await
        .unwrap();
        sid
    }

    #[tokio::test]
    async fn create_version_increments_monotonically() {
        let store: Arc<dyn StateStore> = Arc::new(InMemoryStateStore::new());
        let sid = seed_session(&store).await;
        let vm = VersionManager::new(store.clone(), 50, 10);

        let v2 = vm
            .create_version(
                sid,
                json!({"elements": [{"id": "a", "type": "button"}]}),
                &Changes {
                    prompt: "add a button".into(),
                    edit_type: Some(EditType::Add),
                    target_elements: vec!["a".into()],
                    summary: "1 elements added".into(),
                    processing_time_ms: Some(5),
                },
                serde_json::Map::new(),
            )
            .await
            .unwrap();
        assert_eq!(v2, 2);

        let versions = store.get_all_versions(sid).await.unwrap();
        assert_eq!(versions, vec![1, 2]);
    }

    #[tokio::test]
    async fn unknown_session_is_not_found() {
        let store: Arc<dyn StateStore> = Arc::new(InMemoryStateStore::new());
        let vm = VersionManager::new(store, 50, 10);
        let err = vm
            .create_version(
                SessionId::new(),
                json!({}),
                &Changes::default(),
                serde_json::Map::new(),
            )
            .await
            .unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn version_diff_is_self_consistent() {
        let store: Arc<dyn StateStore> = Arc::new(InMemoryStateStore::new());
        let sid = seed_session(&store).await;
        let vm = VersionManager::new(store.clone(), 50, 10);

        vm.create_version(
            sid,
            json!({"elements": [
                {"id": "a", "type": "button", "text": "Go"},
                {"id": "b", "type": "text"}
            ]}),
            &Changes {
                summary: "2 elements added".into(),
                ..Default::default()
            },
            serde_json::Map::new(),
        )
        .await
        .unwrap();

        vm.create_version(
            sid,
            json!({"elements": [
                {"id": "a", "type": "button", "text": "Submit"},
                {"id": "c", "type": "image"}
            ]}),
            &Changes {
                summary: "1 elements added, 1 elements removed, 1 elements modified".into(),
                ..Default::default()
            },
            serde_json::Map::new(),
        )
        .await
        .unwrap();

        let diff = vm.get_version_diff(sid, 2, 3).await.unwrap().unwrap();
        assert_eq!(diff.added.len(), 1);
        assert_eq!(diff.removed.len(), 1);
        assert_eq!(diff.modified.len(), 1);

        let mut to_ids: Vec<String> = vec!["a".into(), "c".into()];
        let mut derived: Vec<String> = vec!["a".into()]; // unchanged/modified id retained
        derived.extend(diff.added.iter().filter_map(|v| v.get("id").and_then(Value::as_str)).map(str::to_string));
        to_ids.sort();
        derived.sort();
        derived.dedup();
        assert_eq!(to_ids, derived);
    }

    #[tokio::test]
    async fn diff_of_missing_version_is_none() {
        let store: Arc<dyn StateStore> = Arc::new(InMemoryStateStore::new());
        let sid = seed_session(&store).await;
        let vm = VersionManager::new(store, 50, 10);
        assert!(vm.get_version_diff(sid, 1, 99).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn compression_preserves_version_numbers_and_is_idempotent() {
        let store: Arc<dyn StateStore> = Arc::new(InMemoryStateStore::new());
        let sid = seed_session(&store).await;
        let vm = VersionManager::new(store.clone(), 5, 2);

        for i in 0..5 {
            vm.create_version(
                sid,
                json!({"elements": [{"id": format!("e{i}"), "type": "button", "style": {"color": "red"}, "position": {"x": 0, "y": 0}, "size": {"w": 1, "h": 1}}]}),
                &Changes {
                    summary: format!("edit {i}"),
                    ..Default::default()
                },
                serde_json::Map::new(),
            )
            .await
            .unwrap();
        }

        let versions = store.get_all_versions(sid).await.unwrap();
        assert_eq!(versions, vec![1, 2, 3, 4, 5, 6]);

        for v in 1..=4 {
            let state = store.get_design_state(sid, Some(v)).await.unwrap().unwrap();
            assert!(state.metadata.compressed);
            assert!(state.wireframe_json.get("compressed").is_some());
        }
        for v in 5..=6 {
            let state = store.get_design_state(sid, Some(v)).await.unwrap().unwrap();
            assert!(!state.metadata.compressed);
        }

        let recompressed = vm.compress_old_versions(sid, 2).await.unwrap();
        assert_eq!(recompressed, 0);
    }

    #[tokio::test]
    async fn integrity_check_detects_corruption() {
        let store: Arc<dyn StateStore> = Arc::new(InMemoryStateStore::new());
        let sid = seed_session(&store).await;
        let vm = VersionManager::new(store.clone(), 50, 10);
        assert!(vm.verify_version_integrity(sid, 1).await.unwrap());

        let mut corrupted = store.get_design_state(sid, Some(1)).await.unwrap().unwrap();
        corrupted.wireframe_json = json!({"elements": [{"id": "tampered"}]});
        store.store_design_state(&corrupted).await.unwrap();

        assert!(!vm.verify_version_integrity(sid, 1).await.unwrap());
    }

    #[tokio::test]
    async fn session_metrics_exclude_the_initial_version() {
        let store: Arc<dyn StateStore> = Arc::new(InMemoryStateStore::new());
        let sid = seed_session(&store).await; // version 1: edit_type Add, 0ms
        let vm = VersionManager::new(store.clone(), 50, 10);

        vm.create_version(
            sid,
            json!({"elements": [{"id": "a", "type": "button"}]}),
            &Changes {
                prompt: "add a button".into(),
                edit_type: Some(EditType::Add),
                target_elements: vec!["a".into()],
                summary: "1 elements added".into(),
                processing_time_ms: Some(20),
            },
            serde_json::Map::new(),
        )
        .await
        .unwrap();

        let metrics = vm.calculate_session_metrics(sid).await.unwrap().unwrap();
        assert_eq!(metrics.total_edits, 1);
        assert_eq!(metrics.edit_type_distribution.get(&EditType::Add), Some(&1));
        assert_eq!(metrics.average_processing_time_ms, 20.0);
    }
}
