//! Form field value objects

use crate::state::DenyReason;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Kind of form element placed on the canvas
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FieldType {
    Text,
    Textarea,
    Email,
    Number,
    Password,
    Date,
    Select,
    MultiSelect,
    Checkbox,
    Radio,
    Submit,
}

impl FieldType {
    /// Every field type, in palette order
    pub const ALL: [FieldType; 11] = [
        FieldType::Text,
        FieldType::Textarea,
        FieldType::Email,
        FieldType::Number,
        FieldType::Password,
        FieldType::Date,
        FieldType::Select,
        FieldType::MultiSelect,
        FieldType::Checkbox,
        FieldType::Radio,
        FieldType::Submit,
    ];

    /// Wire name, as used in exported JSON
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Textarea => "textarea",
            Self::Email => "email",
            Self::Number => "number",
            Self::Password => "password",
            Self::Date => "date",
            Self::Select => "select",
            Self::MultiSelect => "multi-select",
            Self::Checkbox => "checkbox",
            Self::Radio => "radio",
            Self::Submit => "submit",
        }
    }

    /// Label given to a freshly dropped field
    pub fn default_label(&self) -> &'static str {
        match self {
            Self::Text => "Text Input",
            Self::Textarea => "Text Area",
            Self::Email => "Email",
            Self::Number => "Number",
            Self::Password => "Password",
            Self::Date => "Date",
            Self::Select => "Select",
            Self::MultiSelect => "Multi Select",
            Self::Checkbox => "Checkbox",
            Self::Radio => "Radio Group",
            Self::Submit => "Submit",
        }
    }

    pub fn default_placeholder(&self) -> Option<&'static str> {
        match self {
            Self::Text => Some("Enter text..."),
            Self::Textarea => Some("Enter a longer answer..."),
            Self::Email => Some("name@example.com"),
            Self::Number => Some("0"),
            Self::Password => Some("Enter password..."),
            _ => None,
        }
    }

    /// Text-like fields accept a placeholder
    pub fn supports_placeholder(&self) -> bool {
        self.default_placeholder().is_some()
    }

    /// Choice fields carry an ordered option list
    pub fn is_choice(&self) -> bool {
        matches!(self, Self::Select | Self::MultiSelect | Self::Radio)
    }

    pub fn is_submit(&self) -> bool {
        matches!(self, Self::Submit)
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FieldType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        FieldType::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| format!("unknown field type: {s}"))
    }
}

/// A single element of a form definition
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Field {
    pub id: String,
    #[serde(rename = "type")]
    pub field_type: FieldType,
    pub label: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub placeholder: Option<String>,
    #[serde(default)]
    pub required: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub options: Option<Vec<String>>,
}

impl Field {
    /// Create a field of the given type with a fresh id and per-type defaults
    pub fn new(field_type: FieldType) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            field_type,
            label: field_type.default_label().to_string(),
            placeholder: field_type.default_placeholder().map(str::to_string),
            required: false,
            options: field_type
                .is_choice()
                .then(|| vec!["Option 1".into(), "Option 2".into(), "Option 3".into()]),
        }
    }

    /// Create a field with a custom label
    pub fn with_label(field_type: FieldType, label: &str) -> Self {
        Self {
            label: label.to_string(),
            ..Self::new(field_type)
        }
    }

    pub fn is_submit(&self) -> bool {
        self.field_type.is_submit()
    }

    /// Check the field is fit to place on a form: non-blank id and label,
    /// and no placeholder or options its type does not carry
    pub fn check(&self) -> Result<(), DenyReason> {
        if self.id.trim().is_empty() {
            return Err(DenyReason::BlankId);
        }
        if self.label.trim().is_empty() {
            return Err(DenyReason::BlankLabel);
        }
        if self.placeholder.is_some() && !self.field_type.supports_placeholder() {
            return Err(DenyReason::PlaceholderNotSupported);
        }
        if self.options.is_some() && !self.field_type.is_choice() {
            return Err(DenyReason::OptionsNotSupported);
        }
        Ok(())
    }

    /// Copy of this field under a new id
    pub fn duplicate(&self) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            label: format!("{} (copy)", self.label),
            ..self.clone()
        }
    }
}

/// Partial changes merged into an existing field.
///
/// `placeholder: Some(None)` clears the placeholder.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldUpdate {
    pub label: Option<String>,
    pub placeholder: Option<Option<String>>,
    pub required: Option<bool>,
    pub options: Option<Vec<String>>,
}

impl FieldUpdate {
    pub fn label(label: impl Into<String>) -> Self {
        Self {
            label: Some(label.into()),
            ..Default::default()
        }
    }

    pub fn required(required: bool) -> Self {
        Self {
            required: Some(required),
            ..Default::default()
        }
    }

    pub fn options(options: Vec<String>) -> Self {
        Self {
            options: Some(options),
            ..Default::default()
        }
    }

    pub fn placeholder(placeholder: Option<String>) -> Self {
        Self {
            placeholder: Some(placeholder),
            ..Default::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.label.is_none()
            && self.placeholder.is_none()
            && self.required.is_none()
            && self.options.is_none()
    }

    /// Check the update against the field's type without applying it
    pub fn check(&self, field: &Field) -> Result<(), DenyReason> {
        if self.label.as_deref().is_some_and(|l| l.trim().is_empty()) {
            return Err(DenyReason::BlankLabel);
        }
        if self.placeholder.as_ref().is_some_and(Option::is_some)
            && !field.field_type.supports_placeholder()
        {
            return Err(DenyReason::PlaceholderNotSupported);
        }
        if self.options.is_some() && !field.field_type.is_choice() {
            return Err(DenyReason::OptionsNotSupported);
        }
        Ok(())
    }

    /// Merge into `field`, returning whether anything changed
    pub fn apply(&self, field: &mut Field) -> bool {
        let before = field.clone();
        if let Some(label) = &self.label {
            field.label = label.clone();
        }
        if let Some(placeholder) = &self.placeholder {
            field.placeholder = placeholder.clone();
        }
        if let Some(required) = self.required {
            field.required = required;
        }
        if let Some(options) = &self.options {
            field.options = Some(options.clone());
        }
        *field != before
    }
}
