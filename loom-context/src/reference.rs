//! Reference resolution (§4.3): resolves pronouns and explicit element
//! references in an edit prompt against the current design and recent
//! edit contexts, producing resolved element ids and a confidence score.

use loom_core::types::EditContext;
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;

use crate::elements::{element_id, element_type};
use crate::vocabulary::is_known_type;

static PRONOUN_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\b(?:it|that|this|them|those|these)\b").expect("static regex compiles"));

static EXPLICIT_TYPE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\b(?:the|that|this)\s+(\w+)\b").expect("static regex compiles"));

/// Result of resolving references in one prompt.
pub struct Resolution {
    pub resolved_elements: Vec<String>,
    pub confidence: f64,
}

/// Returns the first id in `recent_contexts`' most-recent non-empty
/// `target_elements` list (recent_contexts is assumed newest-first, per
/// `StateStore::get_context_history`).
fn most_recent_target(recent_contexts: &[EditContext]) -> Option<String> {
    recent_contexts
        .iter()
        .find(|c| !c.target_elements.is_empty())
        .map(|c| c.target_elements[0].clone())
}

fn explicit_type_word(prompt_lower: &str) -> Option<String> {
    EXPLICIT_TYPE_RE.captures_iter(prompt_lower).find_map(|cap| {
        let word = cap.get(1)?.as_str();
        is_known_type(word).then(|| word.to_string())
    })
}

/// Resolves `prompt`'s references against `design_elements` and
/// `recent_contexts` (§4.3 reference resolution table).
pub fn resolve(prompt: &str, design_elements: &[Value], recent_contexts: &[EditContext]) -> Resolution {
    let lower = prompt.to_lowercase();
    let mut resolved: Vec<String> = Vec::new();
    let mut confidences: Vec<f64> = Vec::new();

    if PRONOUN_RE.is_match(&lower) {
        if let Some(target) = most_recent_target(recent_contexts) {
            resolved.push(target);
        }
        confidences.push(0.6);
    }

    if let Some(type_word) = explicit_type_word(&lower) {
        // Count every type-matching element, whether or not it carries an
        // `id` — an id-less match still counts toward "a single element of
        // that type", using the bare type word as its stand-in id so it
        // isn't silently dropped from the match set.
        let matches: Vec<String> = design_elements
            .iter()
            .filter(|e| element_type(e).is_some_and(|t| t.eq_ignore_ascii_case(&type_word)))
            .map(|e| element_id(e).unwrap_or_else(|| type_word.clone()))
            .collect();
        let confidence = match matches.len() {
            1 => 0.9,
            n if n > 1 => 0.6,
            _ => 0.3,
        };
        if matches.is_empty() {
            resolved.push(type_word);
        } else {
            resolved.extend(matches);
        }
        confidences.push(confidence);
    }

    if confidences.is_empty() && !recent_contexts.is_empty() {
        if let Some(target) = most_recent_target(recent_contexts) {
            resolved.push(target);
            confidences.push(0.4);
        }
    }

    let mut deduped = Vec::new();
    for id in resolved {
        if !deduped.contains(&id) {
            deduped.push(id);
        }
    }

    let confidence = if confidences.is_empty() {
        0.0
    } else {
        confidences.iter().sum::<f64>() / confidences.len() as f64
    };

    Resolution {
        resolved_elements: deduped,
        confidence,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use loom_core::types::EditType;
    use serde_json::json;

    fn context(targets: &[&str]) -> EditContext {
        EditContext {
            prompt: "prior edit".into(),
            edit_type: EditType::Style,
            target_elements: targets.iter().map(|s| s.to_string()).collect(),
            timestamp: Utc::now(),
            processing_time_ms: 10,
        }
    }

    #[test]
    fn pronoun_resolves_to_most_recent_target() {
        let recent = vec![context(&["button-1"])];
        let res = resolve("make it bigger", &[], &recent);
        assert_eq!(res.resolved_elements, vec!["button-1"]);
        assert!((res.confidence - 0.6).abs() < f64::EPSILON);
    }

    #[test]
    fn explicit_type_with_single_match_is_high_confidence() {
        let design = vec![json!({"type": "button", "id": "button-1"})];
        let res = resolve("change the button", &design, &[]);
        assert_eq!(res.resolved_elements, vec!["button-1"]);
        assert!((res.confidence - 0.9).abs() < f64::EPSILON);
    }

    #[test]
    fn explicit_type_with_multiple_matches_is_medium_confidence() {
        let design = vec![
            json!({"type": "button", "id": "button-1"}),
            json!({"type": "button", "id": "button-2"}),
        ];
        let res = resolve("change the button", &design, &[]);
        assert_eq!(res.resolved_elements.len(), 2);
        assert!((res.confidence - 0.6).abs() < f64::EPSILON);
    }

    #[test]
    fn explicit_type_with_single_id_less_match_is_still_high_confidence() {
        let design = vec![json!({"type": "button"})];
        let res = resolve("change the button", &design, &[]);
        assert_eq!(res.resolved_elements, vec!["button".to_string()]);
        assert!((res.confidence - 0.9).abs() < f64::EPSILON);
    }

    #[test]
    fn no_reference_found_and_empty_history_is_zero_confidence() {
        let res = resolve("do something", &[], &[]);
        assert!(res.resolved_elements.is_empty());
        assert_eq!(res.confidence, 0.0);
    }

    #[test]
    fn inference_fallback_uses_recent_context() {
        let recent = vec![context(&["card-3"])];
        let res = resolve("make something nicer", &[], &recent);
        assert_eq!(res.resolved_elements, vec!["card-3"]);
        assert!((res.confidence - 0.4).abs() < f64::EPSILON);
    }
}
