//! Doctor records.

use super::specialty::{self, Specialty};
use super::{
    null_as_empty, parse_specialty, Column, Draft, FieldKind, FieldSpec, Record, RecordId,
    ValidationError,
};
use serde::{Deserialize, Serialize};

const FIRST_NAME: usize = 0;
const LAST_NAME: usize = 1;
const EMAIL: usize = 2;
const PHONE: usize = 3;
const SPECIALTY: usize = 4;
const BIO: usize = 5;

/// Everything about a doctor except the server-assigned id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DoctorFields {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub phone_number: String,
    pub category_id: u32,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub bio: String,
}

/// A doctor as returned by the API.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Doctor {
    pub id: RecordId,
    #[serde(flatten)]
    pub fields: DoctorFields,
}

impl Record for Doctor {
    type Fields = DoctorFields;

    const COLLECTION: &'static str = "doctors";
    const SINGULAR: &'static str = "doctor";
    const TITLE: &'static str = "🩺 MEDICAL TEAM";
    const COLUMNS: &'static [Column] = &[
        Column::new("ID", 6),
        Column::new("Name", 26),
        Column::new("Specialty", 16),
        Column::new("Email", 30),
        Column::new("Phone", 22),
    ];
    const FORM: &'static [FieldSpec] = &[
        FieldSpec::required("First Name", FieldKind::Text),
        FieldSpec::required("Last Name", FieldKind::Text),
        FieldSpec::required("Email", FieldKind::Email),
        FieldSpec::required("Phone Number", FieldKind::Text),
        FieldSpec::required("Specialty", FieldKind::Specialty),
        FieldSpec::optional("Bio", FieldKind::Multiline),
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
        format!("Dr. {} {}", self.fields.first_name, self.fields.last_name)
    }

    fn cells(&self, specialties: &[Specialty]) -> Vec<String> {
        vec![
            self.id.to_string(),
            self.display_name(),
            specialty::label(specialties, self.fields.category_id),
            self.fields.email.clone(),
            if self.fields.phone_number.is_empty() {
                "No phone provided".to_string()
            } else {
                self.fields.phone_number.clone()
            },
        ]
    }

    fn details(&self, specialties: &[Specialty]) -> Vec<(&'static str, String)> {
        vec![
            ("Name", self.display_name()),
            (
                "Specialty",
                specialty::label(specialties, self.fields.category_id),
            ),
            ("Email", self.fields.email.clone()),
            ("Phone", self.fields.phone_number.clone()),
            ("Bio", self.fields.bio.clone()),
        ]
    }

    fn to_draft(&self) -> Draft {
        Draft::new(vec![
            self.fields.first_name.clone(),
            self.fields.last_name.clone(),
            self.fields.email.clone(),
            self.fields.phone_number.clone(),
            self.fields.category_id.to_string(),
            self.fields.bio.clone(),
        ])
    }

    fn empty_draft(specialties: &[Specialty]) -> Draft {
        let default_specialty = specialties
            .first()
            .map(|s| s.id.to_string())
            .unwrap_or_default();
        let mut values = vec![String::new(); Self::FORM.len()];
        values[SPECIALTY] = default_specialty;
        Draft::new(values)
    }

    fn from_draft(
        draft: &Draft,
        specialties: &[Specialty],
    ) -> Result<DoctorFields, ValidationError> {
        Ok(DoctorFields {
            first_name: draft.text(FIRST_NAME),
            last_name: draft.text(LAST_NAME),
            email: draft.text(EMAIL),
            phone_number: draft.text(PHONE),
            category_id: parse_specialty(draft.get(SPECIALTY), specialties)?,
            bio: draft.text(BIO),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{filter_indices, SPECIALTIES};

    fn doctor(id: u64, first: &str, last: &str, email: &str) -> Doctor {
        Doctor {
            id: RecordId::new(id),
            fields: DoctorFields {
                first_name: first.into(),
                last_name: last.into(),
                email: email.into(),
                phone_number: String::new(),
                category_id: 7,
                bio: String::new(),
            },
        }
    }

    #[test]
    fn decodes_api_payload_with_extra_and_null_fields() {
        let json = r#"{
            "id": "3",
            "firstName": "Alice",
            "lastName": "Smith",
            "email": "alice@clinic.org",
            "phoneNumber": null,
            "categoryId": 9,
            "createdAt": "2024-01-01T00:00:00Z"
        }"#;
        let parsed: Doctor = serde_json::from_str(json).unwrap();
        assert_eq!(parsed.id, RecordId::new(3));
        assert_eq!(parsed.fields.phone_number, "");
        assert_eq!(parsed.fields.bio, "");
        assert_eq!(parsed.fields.category_id, 9);
    }

    #[test]
    fn body_is_camel_case_without_id() {
        let body = serde_json::to_value(&doctor(4, "Bob", "Jones", "bob@x.org").fields).unwrap();
        assert_eq!(body["firstName"], "Bob");
        assert_eq!(body["categoryId"], 7);
        assert!(body.get("id").is_none());
    }

    #[test]
    fn search_matches_name_or_email_case_insensitively() {
        let doctors = vec![
            doctor(1, "Alice", "Smith", "alice@clinic.org"),
            doctor(2, "Bob", "Jones", "bob@clinic.org"),
        ];
        assert_eq!(filter_indices(&doctors, "smith"), vec![0]);
        assert_eq!(filter_indices(&doctors, "BOB@"), vec![1]);
        assert_eq!(filter_indices(&doctors, "clinic"), vec![0, 1]);
        assert_eq!(filter_indices(&doctors, ""), vec![0, 1]);
        assert!(filter_indices(&doctors, "cardio").is_empty());
    }

    #[test]
    fn search_term_whitespace_is_significant() {
        let doctors = vec![
            doctor(1, "Alice", "Smith", "alice@clinic.org"),
            doctor(2, "Bob", "Jones", "bob@clinic.org"),
        ];
        assert!(filter_indices(&doctors, " smith").is_empty());
        assert!(filter_indices(&doctors, " ").is_empty());
    }

    #[test]
    fn unknown_specialty_is_rejected() {
        let mut draft = doctor(1, "Alice", "Smith", "alice@clinic.org").to_draft();
        draft.set(PHONE, "555-0100");
        draft.set(SPECIALTY, "99");
        assert_eq!(
            Doctor::parse_draft(&draft, SPECIALTIES),
            Err(ValidationError::UnknownSpecialty(99))
        );
    }

    #[test]
    fn empty_draft_defaults_to_first_specialty() {
        let draft = Doctor::empty_draft(SPECIALTIES);
        let mut expected = vec![String::new(); Doctor::FORM.len()];
        expected[SPECIALTY] = "7".to_string();
        assert_eq!(draft, Draft::new(expected));
    }
}
