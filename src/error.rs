//! Error types for form import, storage and the application boundary

use thiserror::Error;

/// Reasons an imported form definition is rejected.
///
/// Validation happens before any state is touched, so a failed import never
/// leaves the store half-updated.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Invalid JSON: {0}")]
    MalformedJson(String),

    #[error("Form data must be a JSON object")]
    NotAnObject,

    #[error("Form data is missing the \"fields\" array")]
    MissingFields,

    #[error("\"fields\" must be an array")]
    FieldsNotArray,

    #[error("\"formTitle\" must be a string")]
    InvalidTitle,

    #[error("Field {index} is not an object")]
    FieldNotObject { index: usize },

    #[error("Field {index} is missing a non-empty \"{attribute}\"")]
    MissingAttribute {
        index: usize,
        attribute: &'static str,
    },

    #[error("Field {index} has unknown type \"{value}\"")]
    UnknownFieldType { index: usize, value: String },

    #[error("Field {index} has an invalid \"{attribute}\" value")]
    InvalidAttribute {
        index: usize,
        attribute: &'static str,
    },

    #[error("Duplicate field id \"{0}\"")]
    DuplicateId(String),

    #[error("A form may contain one submit button, and only alongside other fields")]
    SubmitInvariant,
}

/// Errors raised by a durable storage backend.
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("No data directory available on this platform")]
    NoDataDir,

    #[error("Stored form is invalid: {0}")]
    Invalid(#[from] ValidationError),
}

/// Umbrella error for operations crossing the file/storage boundary.
#[derive(Error, Debug)]
pub enum FormError {
    #[error("Could not read or write file: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_attribute_message() {
        let err = ValidationError::MissingAttribute {
            index: 2,
            attribute: "id",
        };
        assert_eq!(err.to_string(), "Field 2 is missing a non-empty \"id\"");
    }

    #[test]
    fn test_validation_converts_into_form_error() {
        let err: FormError = ValidationError::MissingFields.into();
        assert!(matches!(
            err,
            FormError::Validation(ValidationError::MissingFields)
        ));
        assert_eq!(err.to_string(), "Form data is missing the \"fields\" array");
    }

    #[test]
    fn test_storage_error_from_io() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        let err: StorageError = io.into();
        assert!(err.to_string().contains("gone"));
    }
}
