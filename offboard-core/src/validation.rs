//! Declarative request schemas and the validator that enforces them.
//!
//! Rules are evaluated in phases across the whole body, so the first error
//! reported is always from the earliest failing phase:
//!
//! 1. presence of required fields
//! 2. JSON type
//! 3. maximum length / integer range
//! 4. pattern / format
//! 5. shell metacharacter rejection
//! 6. undeclared fields
//!
//! Validation never panics; every failure is a [`ValidationError`].

use std::sync::LazyLock;

use chrono::NaiveDate;
use regex::Regex;
use serde_json::{Map, Value};

use crate::error::ValidationError;

/// Characters rejected in every string field, regardless of pattern.
pub const UNSAFE_CHARS: &[char] = &[';', '&', '|', '`', '$', '<', '>'];

#[expect(clippy::expect_used, reason = "patterns are compile-time constants")]
fn compile(pattern: &str) -> Regex {
    Regex::new(pattern).expect("static validation regex is valid")
}

static UPN_REGEX: LazyLock<Regex> =
    LazyLock::new(|| compile(r"^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}$"));

static TICKET_REGEX: LazyLock<Regex> = LazyLock::new(|| compile(r"^[A-Z]+-[0-9]+$"));

static DATE_REGEX: LazyLock<Regex> = LazyLock::new(|| compile(r"^\d{4}-\d{2}-\d{2}$"));

/// Returns `true` if `s` contains any of [`UNSAFE_CHARS`].
#[must_use]
pub fn contains_unsafe_chars(s: &str) -> bool {
    s.contains(UNSAFE_CHARS)
}

/// Syntax rule applied to a string field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum TextRule {
    /// User Principal Name (`local@domain.tld`).
    Upn,
    /// Ticket identifier such as `HR-1234`.
    TicketId,
    /// ISO-8601 calendar date (`YYYY-MM-DD`).
    IsoDate,
}

impl TextRule {
    fn check(self, field: &'static str, value: &str) -> Result<(), ValidationError> {
        let ok = match self {
            Self::Upn => UPN_REGEX.is_match(value),
            Self::TicketId => TICKET_REGEX.is_match(value),
            Self::IsoDate => {
                DATE_REGEX.is_match(value) && NaiveDate::parse_from_str(value, "%Y-%m-%d").is_ok()
            }
        };
        if ok {
            return Ok(());
        }
        // A miss caused by a metacharacter is reported as such, whatever the
        // rule.
        if contains_unsafe_chars(value) {
            return Err(ValidationError::UnsafeCharacters { field });
        }
        match self {
            Self::Upn => Err(ValidationError::Pattern { field, hint: "expected user@domain.tld" }),
            Self::TicketId => Err(ValidationError::Pattern {
                field,
                hint: "expected uppercase prefix, dash and number (e.g. HR-1234)",
            }),
            Self::IsoDate => {
                Err(ValidationError::Format { field, format: "ISO-8601 date (YYYY-MM-DD)" })
            }
        }
    }
}

/// Expected JSON type and constraints of a field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum FieldKind {
    /// String with a maximum length (in characters) and an optional syntax rule.
    Text { max_len: Option<usize>, rule: Option<TextRule> },
    /// Integer within an inclusive range.
    Integer { min: i64, max: i64 },
    /// Boolean.
    Boolean,
}

impl FieldKind {
    const fn type_name(&self) -> &'static str {
        match self {
            Self::Text { .. } => "string",
            Self::Integer { .. } => "integer",
            Self::Boolean => "boolean",
        }
    }

    fn type_matches(&self, value: &Value) -> bool {
        match self {
            Self::Text { .. } => value.is_string(),
            Self::Integer { .. } => value.is_i64() || value.is_u64(),
            Self::Boolean => value.is_boolean(),
        }
    }
}

/// Default applied to an absent optional field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum DefaultValue {
    Bool(bool),
    Int(i64),
}

impl DefaultValue {
    fn to_json(self) -> Value {
        match self {
            Self::Bool(b) => Value::Bool(b),
            Self::Int(i) => Value::from(i),
        }
    }
}

/// One declared field of a [`Schema`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldSpec {
    pub name: &'static str,
    pub required: bool,
    pub kind: FieldKind,
    pub default: Option<DefaultValue>,
}

impl FieldSpec {
    /// A required string field.
    #[must_use]
    pub const fn required_text(name: &'static str, max_len: usize, rule: TextRule) -> Self {
        Self {
            name,
            required: true,
            kind: FieldKind::Text { max_len: Some(max_len), rule: Some(rule) },
            default: None,
        }
    }

    /// An optional string field.
    #[must_use]
    pub const fn optional_text(name: &'static str, rule: TextRule) -> Self {
        Self { name, required: false, kind: FieldKind::Text { max_len: None, rule: Some(rule) }, default: None }
    }

    /// An optional boolean field with a default.
    #[must_use]
    pub const fn optional_bool(name: &'static str, default: bool) -> Self {
        Self { name, required: false, kind: FieldKind::Boolean, default: Some(DefaultValue::Bool(default)) }
    }

    /// An optional integer field with a default.
    #[must_use]
    pub const fn optional_int(name: &'static str, min: i64, max: i64, default: i64) -> Self {
        Self {
            name,
            required: false,
            kind: FieldKind::Integer { min, max },
            default: Some(DefaultValue::Int(default)),
        }
    }
}

/// A closed set of fields describing a request body.
#[derive(Debug, Clone, Copy)]
pub struct Schema {
    pub fields: &'static [FieldSpec],
}

impl Schema {
    fn spec(&self, name: &str) -> Option<&FieldSpec> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Validate `body` against this schema.
    ///
    /// On success returns the body with defaults filled in for absent
    /// optional fields. Optional fields sent as `null` are treated as absent.
    ///
    /// # Errors
    /// Returns the first [`ValidationError`] found, in phase order.
    pub fn validate(&self, body: &Value) -> Result<Validated, ValidationError> {
        let Value::Object(obj) = body else {
            return Err(ValidationError::NotAnObject);
        };

        let present = |spec: &FieldSpec| obj.get(spec.name).filter(|v| !v.is_null());

        for spec in self.fields.iter().filter(|f| f.required) {
            match present(spec) {
                None => return Err(ValidationError::Required { field: spec.name }),
                Some(Value::String(s)) if s.is_empty() => {
                    return Err(ValidationError::Required { field: spec.name });
                }
                Some(_) => {}
            }
        }

        for spec in self.fields {
            if let Some(v) = present(spec) {
                if !spec.kind.type_matches(v) {
                    return Err(ValidationError::Type {
                        field: spec.name,
                        expected: spec.kind.type_name(),
                    });
                }
            }
        }

        for spec in self.fields {
            let Some(v) = present(spec) else { continue };
            match spec.kind {
                FieldKind::Text { max_len: Some(max), .. } => {
                    if v.as_str().is_some_and(|s| s.chars().count() > max) {
                        return Err(ValidationError::MaxLength { field: spec.name, max });
                    }
                }
                FieldKind::Integer { min, max } => {
                    let in_range = v.as_i64().is_some_and(|i| (min..=max).contains(&i));
                    if !in_range {
                        return Err(ValidationError::Range { field: spec.name, min, max });
                    }
                }
                FieldKind::Text { max_len: None, .. } | FieldKind::Boolean => {}
            }
        }

        for spec in self.fields {
            if let (Some(Value::String(s)), FieldKind::Text { rule: Some(rule), .. }) =
                (present(spec), spec.kind)
            {
                rule.check(spec.name, s)?;
            }
        }

        for spec in self.fields {
            if let Some(Value::String(s)) = present(spec) {
                if contains_unsafe_chars(s) {
                    return Err(ValidationError::UnsafeCharacters { field: spec.name });
                }
            }
        }

        if let Some(extra) = obj.keys().find(|k| self.spec(k).is_none()) {
            return Err(ValidationError::AdditionalProperty { field: extra.clone() });
        }

        let mut normalized = Map::with_capacity(self.fields.len());
        for spec in self.fields {
            if let Some(v) = present(spec) {
                normalized.insert(spec.name.to_owned(), v.clone());
            } else if let Some(default) = spec.default {
                normalized.insert(spec.name.to_owned(), default.to_json());
            }
        }
        Ok(Validated(normalized))
    }
}

/// A request body that passed [`Schema::validate`], with defaults applied.
#[derive(Debug, Clone, PartialEq)]
pub struct Validated(Map<String, Value>);

impl Validated {
    /// A string field, if present.
    #[must_use]
    pub fn text(&self, field: &str) -> Option<&str> {
        self.0.get(field).and_then(Value::as_str)
    }

    /// A required string field.
    ///
    /// # Errors
    /// Returns [`ValidationError::Required`] if the field is absent, which only
    /// happens when the schema did not declare it as required.
    pub fn required_text(&self, field: &'static str) -> Result<String, ValidationError> {
        self.text(field).map(str::to_owned).ok_or(ValidationError::Required { field })
    }

    /// A boolean field, `false` if absent.
    #[must_use]
    pub fn flag(&self, field: &str) -> bool {
        self.0.get(field).and_then(Value::as_bool).unwrap_or(false)
    }

    /// An integer field, if present.
    #[must_use]
    pub fn integer(&self, field: &str) -> Option<i64> {
        self.0.get(field).and_then(Value::as_i64)
    }

    /// Consume into the underlying JSON object.
    #[must_use]
    pub fn into_inner(self) -> Map<String, Value> {
        self.0
    }
}
