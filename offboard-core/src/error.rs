use serde::Serialize;

/// Class of validation rule that rejected a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
#[non_exhaustive]
pub enum Rule {
    /// Request body is not a JSON object.
    Type,
    /// A required field is missing, null or empty.
    Required,
    /// String longer than its maximum length.
    MaxLength,
    /// Integer outside its allowed range.
    Range,
    /// String does not match its pattern.
    Pattern,
    /// String is not a valid value of its format (e.g. a calendar date).
    Format,
    /// String contains a shell metacharacter.
    UnsafeCharacters,
    /// Field not declared by the schema.
    AdditionalProperties,
}

/// Errors produced while validating a request body.
///
/// Every variant names the offending field and maps to HTTP 400.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[non_exhaustive]
pub enum ValidationError {
    /// The body is not a JSON object.
    #[error("request body must be a JSON object")]
    NotAnObject,

    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: &'static str },

    /// A field has the wrong JSON type.
    #[error("{field} must be of type {expected}")]
    Type { field: &'static str, expected: &'static str },

    /// A string field is too long.
    #[error("{field} exceeds maximum length of {max} characters")]
    MaxLength { field: &'static str, max: usize },

    /// An integer field is out of range.
    #[error("{field} must be between {min} and {max}")]
    Range { field: &'static str, min: i64, max: i64 },

    /// A string field does not match its pattern.
    #[error("Invalid {field} format: {hint}")]
    Pattern { field: &'static str, hint: &'static str },

    /// A string field is not a valid value of its declared format.
    #[error("Invalid {field} format: expected {format}")]
    Format { field: &'static str, format: &'static str },

    /// A string field contains a shell metacharacter.
    #[error("{field} contains invalid characters")]
    UnsafeCharacters { field: &'static str },

    /// The body contains a field the schema does not declare.
    #[error("additional property '{field}' is not allowed")]
    AdditionalProperty { field: String },
}

impl ValidationError {
    /// The rule class that failed.
    #[must_use]
    pub fn rule(&self) -> Rule {
        match self {
            Self::NotAnObject | Self::Type { .. } => Rule::Type,
            Self::Required { .. } => Rule::Required,
            Self::MaxLength { .. } => Rule::MaxLength,
            Self::Range { .. } => Rule::Range,
            Self::Pattern { .. } => Rule::Pattern,
            Self::Format { .. } => Rule::Format,
            Self::UnsafeCharacters { .. } => Rule::UnsafeCharacters,
            Self::AdditionalProperty { .. } => Rule::AdditionalProperties,
        }
    }

    /// The offending field, if the failure is tied to one.
    #[must_use]
    pub fn field(&self) -> Option<&str> {
        match self {
            Self::NotAnObject => None,
            Self::Required { field }
            | Self::Type { field, .. }
            | Self::MaxLength { field, .. }
            | Self::Range { field, .. }
            | Self::Pattern { field, .. }
            | Self::Format { field, .. }
            | Self::UnsafeCharacters { field } => Some(field),
            Self::AdditionalProperty { field } => Some(field),
        }
    }
}
