//! Patient records.

use super::specialty::Specialty;
use super::{
    null_as_empty, parse_date, Column, Draft, FieldKind, FieldSpec, Record, RecordId,
    ValidationError,
};
use serde::{Deserialize, Serialize};
use time::{Date, OffsetDateTime};

const FIRST_NAME: usize = 0;
const LAST_NAME: usize = 1;
const EMAIL: usize = 2;
const PHONE: usize = 3;
const DATE_OF_BIRTH: usize = 4;
const ADDRESS: usize = 5;

/// Everything about a patient except the server-assigned id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PatientFields {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub phone_number: String,
    #[serde(with = "date_only")]
    pub date_of_birth: Date,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub address: String,
}

/// A patient as returned by the API.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Patient {
    pub id: RecordId,
    #[serde(flatten)]
    pub fields: PatientFields,
}

impl Patient {
    /// Whole years between the date of birth and `today`.
    pub fn age_on(&self, today: Date) -> i32 {
        let born = self.fields.date_of_birth;
        let mut age = today.year() - born.year();
        if (today.month() as u8, today.day()) < (born.month() as u8, born.day()) {
            age -= 1;
        }
        age.max(0)
    }
}

/// Dates travel as `YYYY-MM-DD`. The API sometimes sends a full timestamp,
/// in which case everything from the `T` on is dropped.
pub mod date_only {
    use serde::{de, Deserialize, Deserializer, Serializer};
    use time::{macros::format_description, Date};

    pub fn serialize<S: Serializer>(date: &Date, serializer: S) -> Result<S::Ok, S::Error> {
        let text = date
            .format(format_description!("[year]-[month]-[day]"))
            .map_err(serde::ser::Error::custom)?;
        serializer.serialize_str(&text)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Date, D::Error> {
        let raw = String::deserialize(deserializer)?;
        parse(&raw).map_err(|_| {
            de::Error::invalid_value(de::Unexpected::Str(&raw), &"a YYYY-MM-DD date")
        })
    }

    pub fn parse(raw: &str) -> Result<Date, time::error::Parse> {
        let day = raw.split('T').next().unwrap_or(raw).trim();
        Date::parse(day, format_description!("[year]-[month]-[day]"))
    }

    pub fn format(date: Date) -> String {
        date.format(format_description!("[year]-[month]-[day]"))
            .unwrap_or_default()
    }
}

impl Record for Patient {
    type Fields = PatientFields;

    const COLLECTION: &'static str = "patients";
    const SINGULAR: &'static str = "patient";
    const TITLE: &'static str = "🏥 PATIENT LIST";
    const COLUMNS: &'static [Column] = &[
        Column::new("ID", 6),
        Column::new("Name", 22),
        Column::new("Email", 24),
        Column::new("Phone", 14),
        Column::new("Date of Birth", 12),
        Column::new("Address", 22),
    ];
    const FORM: &'static [FieldSpec] = &[
        FieldSpec::required("First Name", FieldKind::Text),
        FieldSpec::required("Last Name", FieldKind::Text),
        FieldSpec::required("Email", FieldKind::Email),
        FieldSpec::required("Phone Number", FieldKind::Text),
        FieldSpec::required("Date of Birth", FieldKind::Date),
        FieldSpec::required("Address", FieldKind::Multiline),
    ];

    fn id(&self) -> RecordId {
        self.id
    }

    fn search_fields(&self) -> [&str; 3] {
        [
            self.fields.first_name.as_str(),
            self.fields.last_name.as_str(),
            self.fields.email.as_str(),
        ]
    }

    fn display_name(&self) -> String {
        format!("{} {}", self.fields.first_name, self.fields.last_name)
    }

    fn cells(&self, _specialties: &[Specialty]) -> Vec<String> {
        vec![
            self.id.to_string(),
            self.display_name(),
            self.fields.email.clone(),
            self.fields.phone_number.clone(),
            date_only::format(self.fields.date_of_birth),
            self.fields.address.clone(),
        ]
    }

    fn details(&self, _specialties: &[Specialty]) -> Vec<(&'static str, String)> {
        let today = OffsetDateTime::now_local()
            .unwrap_or_else(|_| OffsetDateTime::now_utc())
            .date();
        vec![
            ("Name", self.display_name()),
            (
                "Born",
                format!(
                    "{} (age {})",
                    date_only::format(self.fields.date_of_birth),
                    self.age_on(today)
                ),
            ),
            ("Email", self.fields.email.clone()),
            ("Phone", self.fields.phone_number.clone()),
            ("Address", self.fields.address.clone()),
        ]
    }

    fn to_draft(&self) -> Draft {
        Draft::new(vec![
            self.fields.first_name.clone(),
            self.fields.last_name.clone(),
            self.fields.email.clone(),
            self.fields.phone_number.clone(),
            date_only::format(self.fields.date_of_birth),
            self.fields.address.clone(),
        ])
    }

    fn empty_draft(_specialties: &[Specialty]) -> Draft {
        Draft::new(vec![String::new(); Self::FORM.len()])
    }

    fn from_draft(
        draft: &Draft,
        _specialties: &[Specialty],
    ) -> Result<PatientFields, ValidationError> {
        Ok(PatientFields {
            first_name: draft.text(FIRST_NAME),
            last_name: draft.text(LAST_NAME),
            email: draft.text(EMAIL),
            phone_number: draft.text(PHONE),
            date_of_birth: parse_date("Date of Birth", draft.get(DATE_OF_BIRTH))?,
            address: draft.text(ADDRESS),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::SPECIALTIES;
    use time::macros::date;

    fn sample() -> Patient {
        serde_json::from_str(
            r#"{
                "id": 5,
                "firstName": "Maria",
                "lastName": "Lopez",
                "email": "maria@example.com",
                "phoneNumber": "555-0101",
                "dateOfBirth": "1990-05-01T00:00:00Z",
                "address": "12 Elm Street"
            }"#,
        )
        .unwrap()
    }

    #[test]
    fn timestamp_birth_dates_become_date_only() {
        let patient = sample();
        assert_eq!(patient.fields.date_of_birth, date!(1990 - 05 - 01));
        assert_eq!(patient.to_draft().get(DATE_OF_BIRTH), "1990-05-01");
    }

    #[test]
    fn birth_date_serialises_without_time() {
        let body = serde_json::to_value(&sample().fields).unwrap();
        assert_eq!(body["dateOfBirth"], "1990-05-01");
        assert_eq!(body["phoneNumber"], "555-0101");
        assert!(body.get("id").is_none());
    }

    #[test]
    fn invalid_birth_date_fails_to_decode() {
        let json = r#"{"id":1,"firstName":"a","lastName":"b","email":"c@d",
                       "phoneNumber":"1","dateOfBirth":"not a date","address":"x"}"#;
        assert!(serde_json::from_str::<Patient>(json).is_err());
    }

    #[test]
    fn draft_round_trips_through_form() {
        let patient = sample();
        let fields = Patient::parse_draft(&patient.to_draft(), SPECIALTIES).unwrap();
        assert_eq!(fields, patient.fields);
    }

    #[test]
    fn empty_birth_date_is_required() {
        let mut draft = sample().to_draft();
        draft.set(DATE_OF_BIRTH, "");
        assert_eq!(
            Patient::parse_draft(&draft, SPECIALTIES),
            Err(ValidationError::Required("Date of Birth"))
        );
    }

    #[test]
    fn age_counts_completed_years() {
        let patient = sample();
        assert_eq!(patient.age_on(date!(2020 - 04 - 30)), 29);
        assert_eq!(patient.age_on(date!(2020 - 05 - 01)), 30);
        assert_eq!(patient.age_on(date!(1980 - 01 - 01)), 0);
    }
}
