//! The layout operation catalog and its wire form.
//!
//! Operations arrive as tool calls: `{"function": "<wire name>", "args": {…}}`
//! with camelCase argument names. Each variant holds a typed argument struct.

use crate::error::EditError;
use cg_core::model::BaselineShift;
use cg_core::LockAxis;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

/// Move an element so its visual center lands on a grid cell anchor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MoveToGrid {
    pub element_id: String,
    pub grid_cell: String,
    /// Alignment name (`top-left`, `TL`, …). Unknown names mean center.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alignment: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lock_axis: Option<LockAxis>,
}

/// Set an element's anchor translation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MoveToPixel {
    pub element_id: String,
    pub x: f64,
    pub y: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Resize {
    pub element_id: String,
    pub width: f64,
    pub height: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SetOpacity {
    pub element_id: String,
    pub opacity: f64,
}

/// RGBA arguments shared by fill and text color. Channels are in [0, 1].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SetColor {
    pub element_id: String,
    pub red: f64,
    pub green: f64,
    pub blue: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alpha: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SetText {
    pub element_id: String,
    pub new_text: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SetFontSize {
    pub element_id: String,
    pub font_size: f64,
}

/// Partial text style update. At least one field must be present.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SetTextStyle {
    pub element_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub letter_spacing: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub underline: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub baseline_shift: Option<BaselineShift>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Delete {
    pub element_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

/// Request a generated image, either new or replacing the image nearest to
/// a grid cell.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateImage {
    pub prompt: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub grid_cell: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub replace_existing_grid_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remove_background: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_size_percent: Option<f64>,
}

/// One layout edit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "function", content = "args")]
pub enum Operation {
    #[serde(rename = "move_element_to_grid")]
    MoveToGrid(MoveToGrid),
    #[serde(rename = "update_element_position")]
    MoveToPixel(MoveToPixel),
    #[serde(rename = "update_element_size")]
    Resize(Resize),
    #[serde(rename = "update_element_opacity")]
    SetOpacity(SetOpacity),
    #[serde(rename = "update_element_fill")]
    SetFill(SetColor),
    #[serde(rename = "update_text_content")]
    SetText(SetText),
    #[serde(rename = "update_text_color")]
    SetTextColor(SetColor),
    #[serde(rename = "update_text_font_size")]
    SetTextFontSize(SetFontSize),
    #[serde(rename = "update_text_style")]
    SetTextStyle(SetTextStyle),
    #[serde(rename = "delete_element")]
    Delete(Delete),
    #[serde(rename = "generate_and_apply_image")]
    GenerateImage(GenerateImage),
}

/// Every wire name, in catalog order.
pub const WIRE_NAMES: &[&str] = &[
    "move_element_to_grid",
    "update_element_position",
    "update_element_size",
    "update_element_opacity",
    "update_element_fill",
    "update_text_content",
    "update_text_color",
    "update_text_font_size",
    "update_text_style",
    "delete_element",
    "generate_and_apply_image",
];

impl Operation {
    /// Decode a tool call given as a function name plus argument object.
    pub fn from_call(function: &str, args: Value) -> Result<Self, EditError> {
        if !WIRE_NAMES.contains(&function) {
            return Err(EditError::UnknownFunction(function.to_string()));
        }
        serde_json::from_value(json!({ "function": function, "args": args })).map_err(|e| {
            EditError::InvalidArgs {
                function: function.to_string(),
                reason: e.to_string(),
            }
        })
    }

    /// Decode a tool call from its full wire form.
    pub fn from_wire(value: Value) -> Result<Self, EditError> {
        let function = value
            .get("function")
            .and_then(Value::as_str)
            .ok_or_else(|| EditError::InvalidArgs {
                function: String::new(),
                reason: "missing `function`".into(),
            })?
            .to_string();
        let args = value.get("args").cloned().unwrap_or(Value::Object(Default::default()));
        Self::from_call(&function, args)
    }

    pub fn wire_name(&self) -> &'static str {
        match self {
            Self::MoveToGrid(_) => "move_element_to_grid",
            Self::MoveToPixel(_) => "update_element_position",
            Self::Resize(_) => "update_element_size",
            Self::SetOpacity(_) => "update_element_opacity",
            Self::SetFill(_) => "update_element_fill",
            Self::SetText(_) => "update_text_content",
            Self::SetTextColor(_) => "update_text_color",
            Self::SetTextFontSize(_) => "update_text_font_size",
            Self::SetTextStyle(_) => "update_text_style",
            Self::Delete(_) => "delete_element",
            Self::GenerateImage(_) => "generate_and_apply_image",
        }
    }

    /// The addressed element id, for operations that address one.
    pub fn element_id(&self) -> Option<&str> {
        match self {
            Self::MoveToGrid(a) => Some(&a.element_id),
            Self::MoveToPixel(a) => Some(&a.element_id),
            Self::Resize(a) => Some(&a.element_id),
            Self::SetOpacity(a) => Some(&a.element_id),
            Self::SetFill(a) | Self::SetTextColor(a) => Some(&a.element_id),
            Self::SetText(a) => Some(&a.element_id),
            Self::SetTextFontSize(a) => Some(&a.element_id),
            Self::SetTextStyle(a) => Some(&a.element_id),
            Self::Delete(a) => Some(&a.element_id),
            Self::GenerateImage(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn decodes_wire_form() {
        let op = Operation::from_wire(json!({
            "function": "move_element_to_grid",
            "args": {"elementId": "b6658a97", "gridCell": "C-5", "alignment": "top-left", "lockAxis": "horizontal"}
        }))
        .unwrap();
        assert_eq!(
            op,
            Operation::MoveToGrid(MoveToGrid {
                element_id: "b6658a97".into(),
                grid_cell: "C-5".into(),
                alignment: Some("top-left".into()),
                lock_axis: Some(LockAxis::Horizontal),
            })
        );
        assert_eq!(op.wire_name(), "move_element_to_grid");
        assert_eq!(op.element_id(), Some("b6658a97"));
    }

    #[test]
    fn every_wire_name_round_trips() {
        let samples = [
            json!({"elementId": "a", "gridCell": "A-1"}),
            json!({"elementId": "a", "x": 1, "y": 2}),
            json!({"elementId": "a", "width": 1, "height": 2}),
            json!({"elementId": "a", "opacity": 0.5}),
            json!({"elementId": "a", "red": 1, "green": 0, "blue": 0}),
            json!({"elementId": "a", "newText": "hi"}),
            json!({"elementId": "a", "red": 1, "green": 0, "blue": 0, "alpha": 0.5}),
            json!({"elementId": "a", "fontSize": 12}),
            json!({"elementId": "a", "baselineShift": "superscript"}),
            json!({"elementId": "a", "reason": "clutter"}),
            json!({"prompt": "a red balloon"}),
        ];
        for (name, args) in WIRE_NAMES.iter().zip(samples) {
            let op = Operation::from_call(name, args).unwrap();
            assert_eq!(op.wire_name(), *name);
            let back = serde_json::to_value(&op).unwrap();
            assert_eq!(back["function"], json!(name));
        }
    }

    #[test]
    fn unknown_and_malformed_calls() {
        assert_eq!(
            Operation::from_call("rotate_element", json!({})),
            Err(EditError::UnknownFunction("rotate_element".into()))
        );
        let err = Operation::from_call("update_element_opacity", json!({"elementId": "a"}))
            .unwrap_err();
        assert!(matches!(err, EditError::InvalidArgs { .. }));
        assert!(
            Operation::from_call("update_text_style", json!({"elementId": "a", "baselineShift": "sideways"}))
                .is_err()
        );
    }
}
