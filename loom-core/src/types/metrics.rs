//! Aggregate session metrics and integrity-check reports.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use super::edit::EditType;

/// Result of `SessionManager::get_session_metrics` (§4.4).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionMetrics {
    pub total_edits: u64,
    pub session_duration_minutes: i64,
    pub edit_type_distribution: HashMap<EditType, u32>,
    pub average_processing_time_ms: f64,
}

/// Result of `SessionManager::verify_session_integrity` (§4.4).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IntegrityReport {
    pub total: u64,
    pub valid: u64,
    pub invalid: u64,
    pub corrupted_versions: Vec<u64>,
}
