//! Form definition domain layer
//!
//! Plain data: fields, their per-type defaults, and the `FormData` unit that
//! is exported, imported and persisted.

mod field;
mod form_data;

pub use field::{Field, FieldType, FieldUpdate};
pub use form_data::{
    export_file_name, normalize_title, submit_invariant_holds, FormData, DEFAULT_FORM_TITLE,
};
