//! The `ContextEngine` (§4.3): composes intent classification, element
//! extraction, reference resolution, enhanced-prompt construction, and
//! clarification into one `process` call.

use serde_json::Value;
use tracing::{instrument, warn};

use loom_core::types::{EditContext, EditIntent, EditType};

use crate::{clarification, elements, intent, prompt, reference};

/// Output of `ContextEngine::process` (§4.3).
#[derive(Debug, Clone)]
pub struct ProcessedEdit {
    pub intent: EditIntent,
    pub edit_type: EditType,
    pub target_elements: Vec<String>,
    pub confidence: f64,
    pub enhanced_prompt: String,
    pub needs_clarification: bool,
    pub clarification_options: Vec<String>,
}

impl ProcessedEdit {
    /// The fallback emitted when processing cannot proceed (§4.3 failure
    /// semantics: "any internal exception yields a fallback ProcessedEdit
    /// with intent=UNCLEAR, confidence=0.0, needs_clarification=true").
    fn fallback(original_prompt: &str) -> Self {
        Self {
            intent: EditIntent::Unclear,
            edit_type: EditType::Modify,
            target_elements: Vec::new(),
            confidence: 0.0,
            enhanced_prompt: format!("User Request: {original_prompt}"),
            needs_clarification: true,
            clarification_options: vec![
                "Please specify which element and what change you'd like to make.".to_string(),
            ],
        }
    }
}

/// A stateless, cheaply-constructed classifier built once at startup from
/// `Settings::confidence_threshold` (§9: "compiled once and reused").
#[derive(Debug, Clone, Copy)]
pub struct ContextEngine {
    confidence_threshold: f64,
}

impl ContextEngine {
    pub fn new(confidence_threshold: f64) -> Self {
        Self {
            confidence_threshold,
        }
    }

    /// Transforms `(current_design, edit_prompt, recent_contexts)` into a
    /// `ProcessedEdit` (§4.3). `recent_contexts` is newest-first, matching
    /// `StateStore::get_context_history`'s contract.
    #[instrument(skip(self, current_design, recent_contexts), fields(prompt_len = edit_prompt.len()))]
    pub fn process(
        &self,
        current_design: &Value,
        edit_prompt: &str,
        recent_contexts: &[EditContext],
    ) -> ProcessedEdit {
        if edit_prompt.trim().is_empty() {
            warn!("empty edit prompt, falling back to clarification");
            return ProcessedEdit::fallback(edit_prompt);
        }

        let design_elements = elements::extract_elements(current_design);
        let classified_intent = intent::classify(edit_prompt);
        let resolution = reference::resolve(edit_prompt, &design_elements, recent_contexts);
        let enhanced_prompt =
            prompt::build_enhanced_prompt(edit_prompt, &design_elements, recent_contexts);

        let needs_clarification = resolution.confidence < self.confidence_threshold;
        let clarification_options = if needs_clarification {
            clarification::build_options(
                classified_intent,
                &resolution.resolved_elements,
                &design_elements,
            )
        } else {
            Vec::new()
        };

        ProcessedEdit {
            intent: classified_intent,
            edit_type: classified_intent.edit_type(),
            target_elements: resolution.resolved_elements,
            confidence: resolution.confidence,
            enhanced_prompt,
            needs_clarification,
            clarification_options,
        }
    }
}
