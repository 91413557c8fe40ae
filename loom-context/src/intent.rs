//! Intent classification (§4.3): an ordered pattern match against the edit
//! prompt, case-insensitive. Regex patterns are compiled once (§9
//! re-architecture note: "dynamic pattern lists ... compiled once and
//! reused across requests") and reused across every call.

use loom_core::types::EditIntent;
use once_cell::sync::Lazy;
use regex::Regex;

static ADD_ELEMENT_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)\b(?:add|insert)\b[^.!?]{0,40}\b(button|btn|link|header|title|text|input|field|image|img|icon|menu|nav|navigation|sidebar|footer|card|container|box|div|section|form|table|list|element)\b",
    )
    .expect("static regex compiles")
});

static REMOVE_ELEMENT_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\b(?:remove|delete|hide)\b").expect("static regex compiles"));

static CHANGE_COLOR_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\bcolou?r\b").expect("static regex compiles"));

static CHANGE_SIZE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(?:bigger|smaller|larger|large|small|tiny|huge|size)\b")
        .expect("static regex compiles")
});

static CHANGE_POSITION_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\b(?:move|position|align)\b").expect("static regex compiles"));

static QUOTED_TEXT_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"["']([^"']*)["']"#).expect("static regex compiles"));

static TEXT_TO_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\btext\b[^.!?]{0,30}\bto\b").expect("static regex compiles"));

static CHANGE_STYLE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\b(?:style|look|appearance)\b").expect("static regex compiles"));

/// Step 1: regex-based classification, first match wins, in the
/// precedence order §4.3 fixes: ADD, REMOVE, COLOR, SIZE,
/// POSITION, TEXT, STYLE.
fn classify_by_regex(prompt: &str) -> Option<EditIntent> {
    if ADD_ELEMENT_RE.is_match(prompt) {
        return Some(EditIntent::AddElement);
    }
    if REMOVE_ELEMENT_RE.is_match(prompt) {
        return Some(EditIntent::RemoveElement);
    }
    if CHANGE_COLOR_RE.is_match(prompt) {
        return Some(EditIntent::ChangeColor);
    }
    if CHANGE_SIZE_RE.is_match(prompt) {
        return Some(EditIntent::ChangeSize);
    }
    if CHANGE_POSITION_RE.is_match(prompt) {
        return Some(EditIntent::ChangePosition);
    }
    if QUOTED_TEXT_RE.is_match(prompt) || TEXT_TO_RE.is_match(prompt) {
        return Some(EditIntent::ChangeText);
    }
    if CHANGE_STYLE_RE.is_match(prompt) {
        return Some(EditIntent::ChangeStyle);
    }
    None
}

/// Step 2: keyword fallback, evaluated only when no regex matched, in the
/// strict (more-specific-first) order §4.3 fixes.
fn classify_by_keyword(lower: &str) -> Option<EditIntent> {
    if CHANGE_SIZE_RE.is_match(lower) {
        return Some(EditIntent::ChangeSize);
    }
    let has_text_keyword = lower.contains("text") || lower.contains("label") || lower.contains("caption");
    if has_text_keyword && (QUOTED_TEXT_RE.is_match(lower) || TEXT_TO_RE.is_match(lower)) {
        return Some(EditIntent::ChangeText);
    }
    if lower.contains("move") || lower.contains("position") || lower.contains("align") {
        return Some(EditIntent::ChangePosition);
    }
    if lower.contains("color") || lower.contains("colour") {
        return Some(EditIntent::ChangeColor);
    }
    if lower.contains("add") || lower.contains("create") || lower.contains("insert") || lower.contains("new") {
        return Some(EditIntent::AddElement);
    }
    if lower.contains("remove") || lower.contains("delete") || lower.contains("hide") {
        return Some(EditIntent::RemoveElement);
    }
    if lower.contains("style") || lower.contains("look") || lower.contains("appearance") {
        return Some(EditIntent::ChangeStyle);
    }
    None
}

/// Classifies an edit prompt's intent (§4.3, §8 property P7: deterministic
/// — same prompt always yields the same intent).
pub fn classify(prompt: &str) -> EditIntent {
    let lower = prompt.to_lowercase();
    classify_by_regex(&lower)
        .or_else(|| classify_by_keyword(&lower))
        .unwrap_or(EditIntent::Unclear)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn add_button_is_add_element() {
        assert_eq!(classify("add a submit button"), EditIntent::AddElement);
    }

    #[test]
    fn remove_is_remove_element() {
        assert_eq!(classify("remove the header"), EditIntent::RemoveElement);
    }

    #[test]
    fn bigger_is_change_size() {
        assert_eq!(classify("make it bigger"), EditIntent::ChangeSize);
    }

    #[test]
    fn color_change_is_change_color() {
        assert_eq!(classify("change the button color to blue"), EditIntent::ChangeColor);
    }

    #[test]
    fn move_is_change_position() {
        assert_eq!(classify("move the sidebar to the left"), EditIntent::ChangePosition);
    }

    #[test]
    fn quoted_text_is_change_text() {
        assert_eq!(
            classify(r#"change the text to "Submit Now""#),
            EditIntent::ChangeText
        );
    }

    #[test]
    fn style_word_is_change_style() {
        assert_eq!(classify("give it a more modern look"), EditIntent::ChangeStyle);
    }

    #[test]
    fn vague_prompt_is_unclear() {
        assert_eq!(classify("change the button"), EditIntent::Unclear);
    }

    #[test]
    fn classification_is_deterministic() {
        let prompt = "add a bigger button";
        assert_eq!(classify(prompt), classify(prompt));
    }
}
