//! Form definition export/import unit

use super::field::{Field, FieldType};
use crate::error::ValidationError;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashSet;

/// Title used when none is given or the given one is blank
pub const DEFAULT_FORM_TITLE: &str = "Untitled Form";

fn default_title() -> String {
    DEFAULT_FORM_TITLE.to_string()
}

/// A complete form definition: title plus fields in canvas order
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FormData {
    #[serde(default = "default_title")]
    pub form_title: String,
    pub fields: Vec<Field>,
}

impl Default for FormData {
    fn default() -> Self {
        Self {
            form_title: default_title(),
            fields: Vec::new(),
        }
    }
}

impl FormData {
    pub fn new(form_title: impl Into<String>, fields: Vec<Field>) -> Self {
        Self {
            form_title: form_title.into(),
            fields,
        }
    }

    /// Parse and validate an exported form.
    ///
    /// The payload is inspected as raw JSON first so a rejection names the
    /// offending field and attribute.
    pub fn from_json(input: &str) -> Result<Self, ValidationError> {
        let value: Value = serde_json::from_str(input)
            .map_err(|e| ValidationError::MalformedJson(e.to_string()))?;
        Self::from_value(value)
    }

    pub fn from_value(value: Value) -> Result<Self, ValidationError> {
        let Value::Object(mut root) = value else {
            return Err(ValidationError::NotAnObject);
        };

        let entries = match root.remove("fields") {
            None => return Err(ValidationError::MissingFields),
            Some(Value::Array(entries)) => entries,
            Some(_) => return Err(ValidationError::FieldsNotArray),
        };

        let form_title = match root.remove("formTitle") {
            Some(Value::String(title)) => normalize_title(&title),
            None | Some(Value::Null) => default_title(),
            Some(_) => return Err(ValidationError::InvalidTitle),
        };

        let fields = entries
            .into_iter()
            .enumerate()
            .map(|(index, entry)| parse_field(index, entry))
            .collect::<Result<Vec<_>, _>>()?;

        let data = Self { form_title, fields };
        data.validate()?;
        Ok(data)
    }

    /// Check the structural invariants of an already-typed form
    pub fn validate(&self) -> Result<(), ValidationError> {
        let mut seen = HashSet::new();
        for (index, field) in self.fields.iter().enumerate() {
            if field.id.trim().is_empty() {
                return Err(ValidationError::MissingAttribute {
                    index,
                    attribute: "id",
                });
            }
            if field.label.trim().is_empty() {
                return Err(ValidationError::MissingAttribute {
                    index,
                    attribute: "label",
                });
            }
            if !seen.insert(field.id.as_str()) {
                return Err(ValidationError::DuplicateId(field.id.clone()));
            }
        }
        if !submit_invariant_holds(&self.fields) {
            return Err(ValidationError::SubmitInvariant);
        }
        Ok(())
    }

    /// Pretty-printed JSON with two-space indentation
    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty() && self.form_title == DEFAULT_FORM_TITLE
    }
}

/// Trim a title; a blank one becomes [`DEFAULT_FORM_TITLE`]
pub fn normalize_title(title: &str) -> String {
    let trimmed = title.trim();
    if trimmed.is_empty() {
        default_title()
    } else {
        trimmed.to_string()
    }
}

/// File name for an export made on `date`, e.g. `form-2024-05-01.json`
pub fn export_file_name(date: NaiveDate) -> String {
    format!("form-{}.json", date.format("%Y-%m-%d"))
}

/// At most one submit field, and only alongside a non-submit field
pub fn submit_invariant_holds(fields: &[Field]) -> bool {
    let submits = fields.iter().filter(|f| f.is_submit()).count();
    let others = fields.len() - submits;
    submits == 0 || (submits == 1 && others > 0)
}

fn parse_field(index: usize, entry: Value) -> Result<Field, ValidationError> {
    let Value::Object(map) = entry else {
        return Err(ValidationError::FieldNotObject { index });
    };

    for attribute in ["id", "type", "label"] {
        require_string(&map, index, attribute)?;
    }

    let type_name = map.get("type").and_then(Value::as_str).unwrap_or_default();
    if type_name.parse::<FieldType>().is_err() {
        return Err(ValidationError::UnknownFieldType {
            index,
            value: type_name.to_string(),
        });
    }

    if map.get("required").is_some_and(|v| !v.is_boolean()) {
        return Err(ValidationError::InvalidAttribute {
            index,
            attribute: "required",
        });
    }
    if map
        .get("placeholder")
        .is_some_and(|v| !(v.is_string() || v.is_null()))
    {
        return Err(ValidationError::InvalidAttribute {
            index,
            attribute: "placeholder",
        });
    }
    if let Some(options) = map.get("options") {
        let valid = options.is_null()
            || options
                .as_array()
                .is_some_and(|items| items.iter().all(Value::is_string));
        if !valid {
            return Err(ValidationError::InvalidAttribute {
                index,
                attribute: "options",
            });
        }
    }

    serde_json::from_value(Value::Object(map)).map_err(|_| ValidationError::InvalidAttribute {
        index,
        attribute: "field",
    })
}

fn require_string(
    map: &Map<String, Value>,
    index: usize,
    attribute: &'static str,
) -> Result<(), ValidationError> {
    match map.get(attribute).and_then(Value::as_str) {
        Some(s) if !s.trim().is_empty() => Ok(()),
        _ => Err(ValidationError::MissingAttribute { index, attribute }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn text_field(id: &str, label: &str) -> Field {
        Field {
            id: id.to_string(),
            field_type: FieldType::Text,
            label: label.to_string(),
            placeholder: None,
            required: false,
            options: None,
        }
    }

    mod parsing {
        use super::*;
        use pretty_assertions::assert_eq;

        #[test]
        fn test_minimal_field_is_accepted() {
            let data =
                FormData::from_json(r#"{"fields": [{"id": "f1", "type": "text", "label": "Name"}]}"#)
                    .unwrap();
            assert_eq!(data.fields.len(), 1);
            assert_eq!(data.form_title, DEFAULT_FORM_TITLE);
        }

        #[test]
        fn test_missing_id_is_rejected() {
            let err = FormData::from_json(r#"{"fields": [{"type": "text", "label": "x"}]}"#)
                .unwrap_err();
            assert_eq!(
                err,
                ValidationError::MissingAttribute {
                    index: 0,
                    attribute: "id"
                }
            );
        }

        #[test]
        fn test_empty_label_is_rejected() {
            let err = FormData::from_value(json!({
                "fields": [{"id": "f1", "type": "text", "label": ""}]
            }))
            .unwrap_err();
            assert_eq!(
                err,
                ValidationError::MissingAttribute {
                    index: 0,
                    attribute: "label"
                }
            );
        }

        #[test]
        fn test_missing_fields_is_rejected() {
            let err = FormData::from_value(json!({"formTitle": "T"})).unwrap_err();
            assert_eq!(err, ValidationError::MissingFields);
        }

        #[test]
        fn test_fields_not_array_is_rejected() {
            let err = FormData::from_value(json!({"fields": {"id": "f1"}})).unwrap_err();
            assert_eq!(err, ValidationError::FieldsNotArray);
        }

        #[test]
        fn test_non_object_root_is_rejected() {
            let err = FormData::from_value(json!([1, 2])).unwrap_err();
            assert_eq!(err, ValidationError::NotAnObject);
        }

        #[test]
        fn test_non_object_field_is_rejected() {
            let err = FormData::from_value(json!({"fields": ["text"]})).unwrap_err();
            assert_eq!(err, ValidationError::FieldNotObject { index: 0 });
        }

        #[test]
        fn test_malformed_json_is_rejected() {
            let err = FormData::from_json("{not json").unwrap_err();
            assert!(matches!(err, ValidationError::MalformedJson(_)));
        }

        #[test]
        fn test_unknown_type_is_rejected() {
            let err = FormData::from_value(json!({
                "fields": [{"id": "f1", "type": "slider", "label": "Volume"}]
            }))
            .unwrap_err();
            assert_eq!(
                err,
                ValidationError::UnknownFieldType {
                    index: 0,
                    value: "slider".to_string()
                }
            );
        }

        #[test]
        fn test_non_boolean_required_is_rejected() {
            let err = FormData::from_value(json!({
                "fields": [{"id": "f1", "type": "text", "label": "Name", "required": "yes"}]
            }))
            .unwrap_err();
            assert_eq!(
                err,
                ValidationError::InvalidAttribute {
                    index: 0,
                    attribute: "required"
                }
            );
        }

        #[test]
        fn test_non_string_options_are_rejected() {
            let err = FormData::from_value(json!({
                "fields": [{"id": "f1", "type": "select", "label": "Pick", "options": [1, 2]}]
            }))
            .unwrap_err();
            assert_eq!(
                err,
                ValidationError::InvalidAttribute {
                    index: 0,
                    attribute: "options"
                }
            );
        }

        #[test]
        fn test_duplicate_ids_are_rejected() {
            let err = FormData::from_value(json!({
                "fields": [
                    {"id": "f1", "type": "text", "label": "A"},
                    {"id": "f1", "type": "text", "label": "B"}
                ]
            }))
            .unwrap_err();
            assert_eq!(err, ValidationError::DuplicateId("f1".to_string()));
        }

        #[test]
        fn test_title_is_normalized() {
            let data = FormData::from_value(json!({"formTitle": "  Signup  ", "fields": []}))
                .unwrap();
            assert_eq!(data.form_title, "Signup");

            let data = FormData::from_value(json!({"formTitle": "   ", "fields": []})).unwrap();
            assert_eq!(data.form_title, DEFAULT_FORM_TITLE);
        }

        #[test]
        fn test_non_string_title_is_rejected() {
            let err = FormData::from_value(json!({"formTitle": 42, "fields": []})).unwrap_err();
            assert_eq!(err, ValidationError::InvalidTitle);
        }

        #[test]
        fn test_lone_submit_is_rejected() {
            let err = FormData::from_value(json!({
                "fields": [{"id": "s", "type": "submit", "label": "Send"}]
            }))
            .unwrap_err();
            assert_eq!(err, ValidationError::SubmitInvariant);
        }
    }

    mod export {
        use super::*;
        use pretty_assertions::assert_eq;

        #[test]
        fn test_pretty_json_uses_two_space_indent() {
            let data = FormData::new("Signup", vec![text_field("f1", "Name")]);
            let json = data.to_json_pretty().unwrap();
            assert!(json.starts_with("{\n  \"formTitle\": \"Signup\""));
            assert!(json.contains("\n    {\n      \"id\": \"f1\""));
        }

        #[test]
        fn test_export_then_parse_is_identity() {
            let mut select = Field::new(FieldType::Select);
            select.required = true;
            let data = FormData::new(
                "Survey",
                vec![
                    text_field("f1", "Name"),
                    select,
                    Field::new(FieldType::Submit),
                ],
            );
            let parsed = FormData::from_json(&data.to_json_pretty().unwrap()).unwrap();
            assert_eq!(parsed, data);
        }

        #[test]
        fn test_export_file_name_has_date_only() {
            let date = NaiveDate::from_ymd_opt(2024, 3, 7).unwrap();
            assert_eq!(export_file_name(date), "form-2024-03-07.json");
        }
    }

    mod invariants {
        use super::*;

        #[test]
        fn test_submit_invariant() {
            let submit = Field::new(FieldType::Submit);
            assert!(submit_invariant_holds(&[]));
            assert!(!submit_invariant_holds(&[submit.clone()]));
            assert!(submit_invariant_holds(&[
                text_field("a", "A"),
                submit.clone()
            ]));
            assert!(!submit_invariant_holds(&[
                text_field("a", "A"),
                submit.clone(),
                Field::new(FieldType::Submit)
            ]));
        }

        #[test]
        fn test_default_form_is_empty() {
            assert!(FormData::default().is_empty());
            assert!(!FormData::new("Mine", vec![]).is_empty());
        }
    }
}
