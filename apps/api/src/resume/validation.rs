//! Per-section rules applied before a section is saved.
//!
//! The same checks run in the editor client (so invalid input never leaves the
//! machine) and in the PATCH handler.

use std::fmt;

use thiserror::Error;

use crate::export::style::parse_hex_color;
use crate::models::resume::{
    EducationEntry, ExperienceEntry, PersonalDetails, ProjectEntry, SectionUpdate, SkillEntry,
};
use crate::templates::TemplateKind;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    /// Wire path of the offending field, e.g. `skills[2].name`.
    pub field: String,
    pub message: String,
}

impl fmt::Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{}", .0.iter().map(ToString::to_string).collect::<Vec<_>>().join("; "))]
pub struct SectionErrors(pub Vec<FieldError>);

impl SectionErrors {
    pub fn fields(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(|e| e.field.as_str())
    }
}

#[derive(Default)]
struct Collector(Vec<FieldError>);

impl Collector {
    fn push(&mut self, field: impl Into<String>, message: &str) {
        self.0.push(FieldError {
            field: field.into(),
            message: message.to_string(),
        });
    }

    fn finish(self) -> Result<(), SectionErrors> {
        if self.0.is_empty() {
            Ok(())
        } else {
            Err(SectionErrors(self.0))
        }
    }
}

pub fn validate_update(update: &SectionUpdate) -> Result<(), SectionErrors> {
    let mut errors = Collector::default();
    match update {
        SectionUpdate::Title(title) => {
            if title.trim().is_empty() {
                errors.push("title", "Title is required.");
            }
        }
        SectionUpdate::ThemeColor(color) => {
            if parse_hex_color(color).is_none() {
                errors.push("themeColor", "Theme color must be a hex color such as #1e1d64.");
            }
        }
        SectionUpdate::Template(id) => {
            if TemplateKind::from_id(id).is_none() {
                errors.push("template", "Unknown template.");
            }
        }
        SectionUpdate::PersonalDetails(details) => check_personal_details(details, &mut errors),
        SectionUpdate::Summary(_) => {}
        SectionUpdate::Experience(entries) => {
            for (i, entry) in entries.iter().enumerate() {
                check_experience(i, entry, &mut errors);
            }
        }
        SectionUpdate::Education(entries) => {
            for (i, entry) in entries.iter().enumerate() {
                check_education(i, entry, &mut errors);
            }
        }
        SectionUpdate::Projects(entries) => {
            for (i, entry) in entries.iter().enumerate() {
                check_project(i, entry, &mut errors);
            }
        }
        SectionUpdate::Skills(entries) => {
            for (i, entry) in entries.iter().enumerate() {
                check_skill(i, entry, &mut errors);
            }
        }
    }
    errors.finish()
}

fn check_personal_details(d: &PersonalDetails, errors: &mut Collector) {
    for (field, value, label) in [
        ("personalDetails.firstName", d.first_name.trim(), "First name"),
        ("personalDetails.lastName", d.last_name.trim(), "Last name"),
    ] {
        if value.is_empty() {
            errors.push(field, &format!("{label} is required."));
        } else if !value.chars().all(|c| c.is_ascii_alphabetic() || c.is_whitespace()) {
            errors.push(field, &format!("{label} can only contain letters and spaces."));
        }
    }

    let job_title = d.job_title.trim();
    if job_title.is_empty() {
        errors.push("personalDetails.jobTitle", "Job title is required.");
    } else if job_title.chars().count() < 2 {
        errors.push("personalDetails.jobTitle", "Job title must be at least 2 characters.");
    }

    let address = d.address.trim();
    if address.is_empty() {
        errors.push("personalDetails.address", "Address is required.");
    } else if address.chars().count() < 5 {
        errors.push("personalDetails.address", "Address must be at least 5 characters.");
    }

    let phone = d.phone.trim();
    if phone.is_empty() {
        errors.push("personalDetails.phone", "Phone number is required.");
    } else if !is_phone(phone) {
        errors.push("personalDetails.phone", "Enter a valid phone number (10-15 digits).");
    }

    let email = d.email.trim();
    if email.is_empty() {
        errors.push("personalDetails.email", "Email is required.");
    } else if !is_email_shaped(email) {
        errors.push("personalDetails.email", "Please enter a valid email address.");
    }
}

fn check_experience(i: usize, e: &ExperienceEntry, errors: &mut Collector) {
    if e.title.trim().is_empty() {
        errors.push(format!("experience[{i}].title"), "Position title is required.");
    }
    if e.company_name.trim().is_empty() {
        errors.push(format!("experience[{i}].companyName"), "Company name is required.");
    }
}

fn check_education(i: usize, e: &EducationEntry, errors: &mut Collector) {
    if e.university_name.trim().is_empty() {
        errors.push(format!("education[{i}].universityName"), "University name is required.");
    }
    if e.degree.trim().is_empty() {
        errors.push(format!("education[{i}].degree"), "Degree is required.");
    }
}

fn check_project(i: usize, p: &ProjectEntry, errors: &mut Collector) {
    if p.project_name.trim().is_empty() {
        errors.push(format!("projects[{i}].projectName"), "Project name is required.");
    }
    if let Some(link) = &p.project_link {
        if link.trim().contains(char::is_whitespace) {
            errors.push(format!("projects[{i}].projectLink"), "Project link must not contain spaces.");
        }
    }
}

fn check_skill(i: usize, s: &SkillEntry, errors: &mut Collector) {
    if s.name.trim().is_empty() {
        errors.push(format!("skills[{i}].name"), "Skill name is required.");
    }
    if !(0.0..=5.0).contains(&s.rating) {
        errors.push(format!("skills[{i}].rating"), "Rating must be between 0 and 5.");
    }
}

/// `+` optional, then 10 to 15 digits.
pub fn is_phone(phone: &str) -> bool {
    let digits = phone.strip_prefix('+').unwrap_or(phone);
    (10..=15).contains(&digits.len()) && digits.bytes().all(|b| b.is_ascii_digit())
}

/// `local@domain.tld` with no whitespace and exactly one `@`.
pub fn is_email_shaped(email: &str) -> bool {
    if email.contains(char::is_whitespace) {
        return false;
    }
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    if local.is_empty() || domain.contains('@') {
        return false;
    }
    // At least one dot with something on both sides of it.
    domain
        .char_indices()
        .any(|(i, c)| c == '.' && i > 0 && i + 1 < domain.len())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_details() -> PersonalDetails {
        PersonalDetails {
            first_name: "Jane".into(),
            last_name: "van Doe".into(),
            job_title: "Engineer".into(),
            address: "12 Main St".into(),
            phone: "+919876543210".into(),
            email: "jane@doe.dev".into(),
        }
    }

    #[test]
    fn test_valid_personal_details_pass() {
        assert!(validate_update(&SectionUpdate::PersonalDetails(valid_details())).is_ok());
    }

    #[test]
    fn test_personal_details_rules() {
        let details = PersonalDetails {
            first_name: "J4ne".into(),
            last_name: "".into(),
            job_title: "X".into(),
            address: "Rd".into(),
            phone: "12345".into(),
            email: "jane@doe".into(),
        };
        let err = validate_update(&SectionUpdate::PersonalDetails(details)).unwrap_err();
        let fields: Vec<_> = err.fields().collect();
        assert_eq!(
            fields,
            vec![
                "personalDetails.firstName",
                "personalDetails.lastName",
                "personalDetails.jobTitle",
                "personalDetails.address",
                "personalDetails.phone",
                "personalDetails.email",
            ]
        );
    }

    #[test]
    fn test_blank_skill_name_is_rejected() {
        let update = SectionUpdate::Skills(vec![
            SkillEntry { name: "Rust".into(), rating: 4.0 },
            SkillEntry { name: "   ".into(), rating: 3.0 },
        ]);
        let err = validate_update(&update).unwrap_err();
        assert_eq!(err.to_string(), "skills[1].name: Skill name is required.");
    }

    #[test]
    fn test_skill_rating_out_of_range() {
        let update = SectionUpdate::Skills(vec![SkillEntry { name: "Go".into(), rating: 7.0 }]);
        assert!(validate_update(&update).is_err());
    }

    #[test]
    fn test_theme_color_and_template() {
        assert!(validate_update(&SectionUpdate::ThemeColor("#1e1d64ff".into())).is_ok());
        assert!(validate_update(&SectionUpdate::ThemeColor("navy".into())).is_err());
        assert!(validate_update(&SectionUpdate::Template("third-template".into())).is_ok());
        assert!(validate_update(&SectionUpdate::Template("fifth-template".into())).is_err());
    }

    #[test]
    fn test_entries_require_names() {
        let update = SectionUpdate::Experience(vec![ExperienceEntry::default()]);
        assert_eq!(validate_update(&update).unwrap_err().0.len(), 2);
        let update = SectionUpdate::Projects(vec![ProjectEntry {
            project_name: "CLI".into(),
            project_link: Some("github.com/a b".into()),
            ..Default::default()
        }]);
        assert_eq!(
            validate_update(&update).unwrap_err().fields().collect::<Vec<_>>(),
            vec!["projects[0].projectLink"]
        );
    }

    #[test]
    fn test_phone_and_email_shapes() {
        assert!(is_phone("9876543210"));
        assert!(is_phone("+123456789012345"));
        assert!(!is_phone("+1234567890123456"));
        assert!(!is_phone("98765-43210"));
        assert!(is_email_shaped("a@b.co"));
        assert!(!is_email_shaped("a@.co"));
        assert!(!is_email_shaped("a b@c.d"));
        assert!(!is_email_shaped("@c.d"));
    }
}
