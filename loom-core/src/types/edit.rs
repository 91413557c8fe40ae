//! Edit classification and edit-path value types.

use serde::{Deserialize, Serialize};

/// The coarse, wire-facing edit taxonomy (§3 `EditType`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EditType {
    Modify,
    Add,
    Remove,
    Style,
    Layout,
}

impl EditType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Modify => "modify",
            Self::Add => "add",
            Self::Remove => "remove",
            Self::Style => "style",
            Self::Layout => "layout",
        }
    }
}

impl std::fmt::Display for EditType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for EditType {
    type Err = crate::error::LoomError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "modify" => Ok(Self::Modify),
            "add" => Ok(Self::Add),
            "remove" => Ok(Self::Remove),
            "style" => Ok(Self::Style),
            "layout" => Ok(Self::Layout),
            other => Err(crate::error::LoomError::invalid_input(format!(
                "unknown edit type: {other}"
            ))),
        }
    }
}

/// The fine-grained classification internal to the Context Engine
/// (§3 `EditIntent`, ten values).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EditIntent {
    ModifyElement,
    AddElement,
    RemoveElement,
    ChangeStyle,
    ChangeColor,
    ChangeSize,
    ChangePosition,
    ChangeText,
    ChangeLayout,
    Unclear,
}

impl EditIntent {
    /// Fixed intent→EditType mapping (spec §4.3).
    pub fn edit_type(&self) -> EditType {
        match self {
            Self::AddElement => EditType::Add,
            Self::RemoveElement => EditType::Remove,
            Self::ModifyElement => EditType::Modify,
            Self::ChangeStyle | Self::ChangeColor | Self::ChangeSize => EditType::Style,
            Self::ChangeText => EditType::Modify,
            Self::ChangePosition | Self::ChangeLayout => EditType::Layout,
            Self::Unclear => EditType::Modify,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ModifyElement => "modify_element",
            Self::AddElement => "add_element",
            Self::RemoveElement => "remove_element",
            Self::ChangeStyle => "change_style",
            Self::ChangeColor => "change_color",
            Self::ChangeSize => "change_size",
            Self::ChangePosition => "change_position",
            Self::ChangeText => "change_text",
            Self::ChangeLayout => "change_layout",
            Self::Unclear => "unclear",
        }
    }
}

impl std::fmt::Display for EditIntent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Caller-supplied description of an edit, passed into
/// `VersionManager::create_version` (§4.2 `changes` argument).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Changes {
    pub prompt: String,
    pub edit_type: Option<EditType>,
    pub target_elements: Vec<String>,
    pub summary: String,
    pub processing_time_ms: Option<u64>,
}

/// One entry in a session's bounded context list (§3 `EditContext`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EditContext {
    pub prompt: String,
    pub edit_type: EditType,
    pub target_elements: Vec<String>,
    pub timestamp: chrono::DateTime<chrono::Utc>,
    pub processing_time_ms: u64,
}

/// Result of `SessionManager::apply_edit` (§4.4).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EditResult {
    pub success: bool,
    pub new_version: u64,
    pub updated_wireframe: serde_json::Value,
    pub changes_summary: String,
    pub processing_time_ms: u64,
}
