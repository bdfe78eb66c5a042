//! Data models for the clinic administration console.
//!
//! Both entity types (doctors and patients) implement [`Record`], which is
//! everything the generic list and form screens need to know about them:
//! where they live on the API, how they are searched, how they are shown in
//! a table and how a form draft turns back into a request body.

use serde::de::{self, DeserializeOwned, Unexpected, Visitor};
use serde::{Deserialize, Deserializer, Serialize};
use std::{fmt, str::FromStr};
use thiserror::Error;
use time::{macros::format_description, Date};

pub mod doctor;
pub mod patient;
pub mod specialty;

pub use doctor::{Doctor, DoctorFields};
pub use patient::Patient;
pub use specialty::{Specialty, SPECIALTIES};

/// Server-assigned identifier shared by every record type.
///
/// The API is not consistent about whether ids are numbers or numeric
/// strings, so decoding accepts both and rejects anything else.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct RecordId(u64);

impl RecordId {
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for RecordId {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim().parse::<u64>().map(RecordId)
    }
}

impl<'de> Deserialize<'de> for RecordId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct IdVisitor;

        impl<'de> Visitor<'de> for IdVisitor {
            type Value = RecordId;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a non-negative integer id or a string holding one")
            }

            fn visit_u64<E: de::Error>(self, v: u64) -> Result<RecordId, E> {
                Ok(RecordId(v))
            }

            fn visit_i64<E: de::Error>(self, v: i64) -> Result<RecordId, E> {
                u64::try_from(v)
                    .map(RecordId)
                    .map_err(|_| E::invalid_value(Unexpected::Signed(v), &self))
            }

            fn visit_str<E: de::Error>(self, v: &str) -> Result<RecordId, E> {
                v.parse()
                    .map_err(|_| E::invalid_value(Unexpected::Str(v), &self))
            }
        }

        deserializer.deserialize_any(IdVisitor)
    }
}

/// Errors raised while turning a form draft into a request body.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("{0} cannot be empty")]
    Required(&'static str),

    #[error("{0} must be a valid email address")]
    InvalidEmail(&'static str),

    #[error("{label} must be a date in YYYY-MM-DD form, got '{value}'")]
    InvalidDate { label: &'static str, value: String },

    #[error("Specialty {0} is not one of the known specialties")]
    UnknownSpecialty(u32),

    #[error("Specialty '{0}' is not a valid specialty id")]
    InvalidSpecialty(String),
}

/// How a form field is edited and validated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Text,
    Email,
    Date,
    Multiline,
    /// Picked from the specialty catalog, never typed.
    Specialty,
}

/// One entry of a record's form layout.
#[derive(Debug, Clone, Copy)]
pub struct FieldSpec {
    pub label: &'static str,
    pub kind: FieldKind,
    pub required: bool,
}

impl FieldSpec {
    pub const fn required(label: &'static str, kind: FieldKind) -> Self {
        Self {
            label,
            kind,
            required: true,
        }
    }

    pub const fn optional(label: &'static str, kind: FieldKind) -> Self {
        Self {
            label,
            kind,
            required: false,
        }
    }
}

/// A table column: header text and its share of the table width.
#[derive(Debug, Clone, Copy)]
pub struct Column {
    pub title: &'static str,
    pub width: u16,
}

impl Column {
    pub const fn new(title: &'static str, width: u16) -> Self {
        Self { title, width }
    }
}

/// The in-progress values of a form, one string per [`FieldSpec`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Draft {
    values: Vec<String>,
}

impl Draft {
    pub fn new(values: Vec<String>) -> Self {
        Self { values }
    }

    /// Raw value of a field, empty when the index is out of range.
    pub fn get(&self, index: usize) -> &str {
        self.values.get(index).map(String::as_str).unwrap_or("")
    }

    /// Value of a field with surrounding whitespace removed.
    pub fn text(&self, index: usize) -> String {
        self.get(index).trim().to_string()
    }

    pub fn set(&mut self, index: usize, value: impl Into<String>) {
        if let Some(slot) = self.values.get_mut(index) {
            *slot = value.into();
        }
    }

    pub fn push_char(&mut self, index: usize, c: char) {
        if let Some(slot) = self.values.get_mut(index) {
            slot.push(c);
        }
    }

    pub fn pop_char(&mut self, index: usize) {
        if let Some(slot) = self.values.get_mut(index) {
            slot.pop();
        }
    }
}

/// Behaviour shared by doctors and patients.
pub trait Record: DeserializeOwned + Clone + Send + 'static {
    /// Request body for create and update. Never contains the id.
    type Fields: Serialize + Clone + Send + Sync + 'static;

    /// Path segment under `/api/`.
    const COLLECTION: &'static str;
    /// Lower-case singular noun used in messages.
    const SINGULAR: &'static str;
    /// Heading of the list screen.
    const TITLE: &'static str;
    const COLUMNS: &'static [Column];
    const FORM: &'static [FieldSpec];

    fn id(&self) -> RecordId;

    /// First name, last name and email: the fields the list search looks at.
    fn search_fields(&self) -> [&str; 3];

    fn display_name(&self) -> String;

    /// Table cells, one per entry of [`Record::COLUMNS`].
    fn cells(&self, specialties: &[Specialty]) -> Vec<String>;

    fn details(&self, specialties: &[Specialty]) -> Vec<(&'static str, String)>;

    fn to_draft(&self) -> Draft;

    fn empty_draft(specialties: &[Specialty]) -> Draft;

    /// Builds the request body from an already validated draft.
    fn from_draft(draft: &Draft, specialties: &[Specialty])
        -> Result<Self::Fields, ValidationError>;

    /// Case-insensitive substring match over [`Record::search_fields`].
    /// `needle` must already be lower-cased.
    fn matches(&self, needle: &str) -> bool {
        needle.is_empty()
            || self
                .search_fields()
                .iter()
                .any(|field| field.to_lowercase().contains(needle))
    }

    /// Validates a draft against [`Record::FORM`] and builds the request body.
    fn parse_draft(
        draft: &Draft,
        specialties: &[Specialty],
    ) -> Result<Self::Fields, ValidationError> {
        validate_draft(Self::FORM, draft, specialties)?;
        Self::from_draft(draft, specialties)
    }
}

/// Indices of the records matching `term`, in their original order.
pub fn filter_indices<R: Record>(records: &[R], term: &str) -> Vec<usize> {
    let needle = term.to_lowercase();
    records
        .iter()
        .enumerate()
        .filter(|(_, record)| record.matches(&needle))
        .map(|(index, _)| index)
        .collect()
}

/// Required-field and input-type checks, in form order. The first problem wins.
pub fn validate_draft(
    specs: &[FieldSpec],
    draft: &Draft,
    specialties: &[Specialty],
) -> Result<(), ValidationError> {
    for (index, spec) in specs.iter().enumerate() {
        let value = draft.text(index);
        if value.is_empty() {
            if spec.required {
                return Err(ValidationError::Required(spec.label));
            }
            continue;
        }
        match spec.kind {
            FieldKind::Email => {
                if !is_email(&value) {
                    return Err(ValidationError::InvalidEmail(spec.label));
                }
            }
            FieldKind::Date => {
                parse_date(spec.label, &value)?;
            }
            FieldKind::Specialty => {
                parse_specialty(&value, specialties)?;
            }
            FieldKind::Text | FieldKind::Multiline => {}
        }
    }
    Ok(())
}

/// The shape an `<input type="email">` accepts: something, `@`, something.
pub fn is_email(value: &str) -> bool {
    if value.chars().any(char::is_whitespace) {
        return false;
    }
    match value.split_once('@') {
        Some((local, domain)) => !local.is_empty() && !domain.is_empty() && !domain.contains('@'),
        None => false,
    }
}

pub fn parse_date(label: &'static str, value: &str) -> Result<Date, ValidationError> {
    Date::parse(value.trim(), format_description!("[year]-[month]-[day]")).map_err(|_| {
        ValidationError::InvalidDate {
            label,
            value: value.to_string(),
        }
    })
}

pub fn parse_specialty(value: &str, specialties: &[Specialty]) -> Result<u32, ValidationError> {
    let id = value
        .trim()
        .parse::<u32>()
        .map_err(|_| ValidationError::InvalidSpecialty(value.to_string()))?;
    if specialties.iter().any(|s| s.id == id) {
        Ok(id)
    } else {
        Err(ValidationError::UnknownSpecialty(id))
    }
}

/// Treats a JSON `null` the same as a missing string.
pub(crate) fn null_as_empty<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}
