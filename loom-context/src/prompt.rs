//! Enhanced prompt construction (§4.3): rewrites an edit prompt into a
//! richer prompt carrying design context for the downstream generator.

use loom_core::types::EditContext;
use serde_json::Value;

use crate::elements::{element_id, element_text, element_type};

const MAX_ELEMENTS_SUMMARIZED: usize = 5;
const MAX_RECENT_CONTEXTS: usize = 3;

const CLOSING_INSTRUCTION: &str = "Resolve any pronouns or ambiguous references (it, that, this, \
them, those, these) against the context above, and apply the requested change to the \
appropriate element(s) of the current design.";

fn summarize_element(element: &Value) -> String {
    let kind = element_type(element).unwrap_or("element");
    let mut line = format!("- {kind}");
    if let Some(id) = element_id(element) {
        line.push_str(&format!(" (id: {id})"));
    }
    if let Some(text) = element_text(element) {
        if !text.is_empty() {
            line.push_str(&format!(": '{text}'"));
        }
    }
    line
}

/// Builds the enhanced prompt, skipping any section with no content
/// (§4.3 enhanced prompt construction, ordered 1–5).
pub fn build_enhanced_prompt(
    original_prompt: &str,
    design_elements: &[Value],
    recent_contexts: &[EditContext],
) -> String {
    let elements_section = if design_elements.is_empty() {
        None
    } else {
        let lines: Vec<String> = design_elements
            .iter()
            .take(MAX_ELEMENTS_SUMMARIZED)
            .map(summarize_element)
            .collect();
        Some(format!("Elements in design:\n{}", lines.join("\n")))
    };

    let recent_section = if recent_contexts.is_empty() {
        None
    } else {
        let lines: Vec<String> = recent_contexts
            .iter()
            .take(MAX_RECENT_CONTEXTS)
            .enumerate()
            .map(|(i, ctx)| format!("{}. {} (type: {})", i + 1, ctx.prompt, ctx.edit_type))
            .collect();
        Some(format!("Recent Changes:\n{}", lines.join("\n")))
    };

    let mut parts: Vec<String> = Vec::new();
    if elements_section.is_some() || recent_section.is_some() {
        parts.push("Current Design Context:".to_string());
    }
    if let Some(section) = elements_section {
        parts.push(section);
    }
    if let Some(section) = recent_section {
        parts.push(section);
    }
    parts.push(format!("User Request: {original_prompt}"));
    parts.push(CLOSING_INSTRUCTION.to_string());

    parts.join("\n\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use loom_core::types::EditType;
    use serde_json::json;

    #[test]
    fn skips_empty_sections() {
        let prompt = build_enhanced_prompt("add a button", &[], &[]);
        assert!(!prompt.contains("Current Design Context"));
        assert!(prompt.contains("User Request: add a button"));
        assert!(prompt.contains("Resolve any pronouns"));
    }

    #[test]
    fn summarizes_up_to_five_elements() {
        let elements: Vec<Value> = (0..8)
            .map(|i| json!({"type": "button", "id": format!("b-{i}")}))
            .collect();
        let prompt = build_enhanced_prompt("make it bigger", &elements, &[]);
        assert_eq!(prompt.matches("- button").count(), MAX_ELEMENTS_SUMMARIZED);
    }

    #[test]
    fn includes_up_to_three_recent_contexts() {
        let recent: Vec<EditContext> = (0..5)
            .map(|i| EditContext {
                prompt: format!("edit {i}"),
                edit_type: EditType::Style,
                target_elements: vec![],
                timestamp: Utc::now(),
                processing_time_ms: 1,
            })
            .collect();
        let prompt = build_enhanced_prompt("do more", &[], &recent);
        assert_eq!(prompt.matches("(type: style)").count(), MAX_RECENT_CONTEXTS);
    }
}
