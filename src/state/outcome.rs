//! Result of a store mutation

/// Why the store refused a mutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DenyReason {
    /// The form already has a submit button
    DuplicateSubmit,
    /// A submit button needs at least one other field
    SubmitWithoutFields,
    /// Removing the field would leave the submit button alone on the form
    SubmitWouldBeOrphaned,
    /// Submit buttons cannot be duplicated
    CannotDuplicateSubmit,
    /// A field with the same id is already on the form
    DuplicateId,
    /// Placeholder set on a field type that has none
    PlaceholderNotSupported,
    /// Options set on a field type that is not a choice
    OptionsNotSupported,
    /// Fields need a non-blank id
    BlankId,
    /// Fields need a non-blank label
    BlankLabel,
}

impl DenyReason {
    pub fn message(&self) -> &'static str {
        match self {
            Self::DuplicateSubmit => "The form already has a submit button",
            Self::SubmitWithoutFields => "Add at least one field before the submit button",
            Self::SubmitWouldBeOrphaned => "The submit button needs at least one other field",
            Self::CannotDuplicateSubmit => "Submit buttons cannot be duplicated",
            Self::DuplicateId => "A field with this id already exists",
            Self::PlaceholderNotSupported => "This field type has no placeholder",
            Self::OptionsNotSupported => "This field type has no options",
            Self::BlankId => "Field ids cannot be blank",
            Self::BlankLabel => "Labels cannot be blank",
        }
    }
}

/// What a mutating operation did.
///
/// Only `Applied` records history, marks the form dirty and schedules an
/// auto-save.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Applied,
    /// The form was already in the requested state
    Unchanged,
    /// No field with the given id
    NotFound,
    Denied(DenyReason),
}

impl Outcome {
    pub fn is_applied(&self) -> bool {
        matches!(self, Outcome::Applied)
    }
}
