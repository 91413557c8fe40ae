//! Element extraction from a wireframe document (§4.3): a depth-first walk
//! that treats any mapping carrying at least one of `{type, component,
//! element}` as an element, following children through `{children,
//! components, elements}` (scalar values ignored).

use serde_json::Value;

/// Extracts every element in `design`, in deterministic discovery order.
pub fn extract_elements(design: &Value) -> Vec<Value> {
    let mut out = Vec::new();
    walk(design, &mut out);
    out
}

fn walk(value: &Value, out: &mut Vec<Value>) {
    match value {
        Value::Object(map) => {
            let is_element = map.contains_key("type")
                || map.contains_key("component")
                || map.contains_key("element");
            if is_element {
                out.push(Value::Object(map.clone()));
            }
            for key in ["children", "components", "elements"] {
                if let Some(child) = map.get(key) {
                    walk(child, out);
                }
            }
        }
        Value::Array(items) => {
            for item in items {
                walk(item, out);
            }
        }
        _ => {}
    }
}

/// An element's type name, checking `type`, then `component`, then
/// `element`, in that order.
pub fn element_type(element: &Value) -> Option<&str> {
    element
        .get("type")
        .or_else(|| element.get("component"))
        .or_else(|| element.get("element"))
        .and_then(Value::as_str)
}

pub fn element_id(element: &Value) -> Option<String> {
    element.get("id").and_then(Value::as_str).map(str::to_string)
}

/// A human-readable label for the element summary line (§4.3 enhanced
/// prompt construction: `"'{text_or_label}'"`).
pub fn element_text(element: &Value) -> Option<&str> {
    element
        .get("text")
        .or_else(|| element.get("label"))
        .or_else(|| element.get("content"))
        .and_then(Value::as_str)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn extracts_nested_elements_depth_first() {
        let design = json!({
            "type": "container",
            "children": [
                {"type": "button", "id": "btn-1", "text": "Submit"},
                {"type": "section", "children": [
                    {"type": "text", "id": "txt-1"}
                ]}
            ]
        });
        let elements = extract_elements(&design);
        let types: Vec<&str> = elements.iter().filter_map(element_type).collect();
        assert_eq!(types, vec!["container", "button", "section", "text"]);
    }

    #[test]
    fn ignores_scalar_children_values() {
        let design = json!({"type": "box", "children": "not a list"});
        let elements = extract_elements(&design);
        assert_eq!(elements.len(), 1);
    }

    #[test]
    fn nodes_without_type_component_or_element_are_not_elements() {
        let design = json!({"layout": "grid", "children": [{"type": "card", "id": "c-1"}]});
        let elements = extract_elements(&design);
        assert_eq!(elements.len(), 1);
        assert_eq!(element_type(&elements[0]), Some("card"));
    }
}
