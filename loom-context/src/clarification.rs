//! Clarification option generation (§4.3): produced when confidence falls
//! below `CONFIDENCE_THRESHOLD`.

use loom_core::types::EditIntent;
use serde_json::Value;

use crate::elements::element_type;

const MAX_AVAILABLE_TYPES: usize = 5;

/// Builds the clarification option list for a resolution that fell below
/// threshold. Returns an empty list when `confidence >= threshold` (the
/// caller is expected to gate on that itself; this function assumes it
/// was already below).
pub fn build_options(
    intent: EditIntent,
    resolved_elements: &[String],
    design_elements: &[Value],
) -> Vec<String> {
    let mut options = Vec::new();

    if resolved_elements.len() > 1 {
        options.push(format!(
            "Which element do you want to modify: {}?",
            resolved_elements.join(", ")
        ));
    } else if resolved_elements.is_empty() {
        if design_elements.is_empty() {
            options.push(
                "Please specify which element and what change you'd like to make.".to_string(),
            );
        } else {
            let mut types: Vec<&str> = Vec::new();
            for element in design_elements {
                if let Some(t) = element_type(element) {
                    if !types.contains(&t) {
                        types.push(t);
                    }
                }
                if types.len() >= MAX_AVAILABLE_TYPES {
                    break;
                }
            }
            options.push(format!(
                "Which element do you want to modify? Available: {}",
                types.join(", ")
            ));
        }
    }

    if intent == EditIntent::Unclear {
        options.push(
            "What would you like to do? (e.g. add, remove, move, restyle, or change the text \
of an element)"
                .to_string(),
        );
    }

    options
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn multiple_targets_asks_which_one() {
        let opts = build_options(
            EditIntent::ModifyElement,
            &["button-1".to_string(), "button-2".to_string()],
            &[],
        );
        assert_eq!(opts.len(), 1);
        assert!(opts[0].contains("button-1"));
        assert!(opts[0].contains("button-2"));
    }

    #[test]
    fn no_targets_with_design_elements_lists_available_types() {
        let design = vec![json!({"type": "button"}), json!({"type": "card"})];
        let opts = build_options(EditIntent::ModifyElement, &[], &design);
        assert_eq!(opts.len(), 1);
        assert!(opts[0].contains("button"));
        assert!(opts[0].contains("card"));
    }

    #[test]
    fn no_targets_and_empty_design_is_generic() {
        let opts = build_options(EditIntent::ModifyElement, &[], &[]);
        assert_eq!(opts.len(), 1);
        assert!(opts[0].contains("Please specify"));
    }

    #[test]
    fn unclear_intent_appends_extra_option() {
        let opts = build_options(EditIntent::Unclear, &[], &[]);
        assert_eq!(opts.len(), 2);
    }
}
