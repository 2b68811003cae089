use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use sqlx::FromRow;
use uuid::Uuid;

/// Theme color assigned to new resumes when the caller does not pick one.
pub const DEFAULT_THEME_COLOR: &str = "#1e1d64ff";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PersonalDetails {
    pub first_name: String,
    pub last_name: String,
    pub job_title: String,
    pub address: String,
    pub phone: String,
    pub email: String,
}

impl PersonalDetails {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name.trim(), self.last_name.trim())
            .trim()
            .to_string()
    }

    pub fn is_empty(&self) -> bool {
        self == &PersonalDetails::default()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ExperienceEntry {
    pub title: String,
    pub company_name: String,
    pub city: String,
    pub state: String,
    /// Free-form; never parsed server-side.
    pub start_date: String,
    pub end_date: String,
    pub currently_working: bool,
    /// Rich-text HTML fragment.
    pub work_summary: String,
}

impl ExperienceEntry {
    pub fn location(&self) -> String {
        join_non_empty(&[self.city.as_str(), self.state.as_str()], ", ")
    }

    pub fn date_range(&self) -> String {
        let end = if self.currently_working {
            "Present"
        } else {
            self.end_date.as_str()
        };
        join_non_empty(&[self.start_date.as_str(), end], " - ")
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EducationEntry {
    pub university_name: String,
    pub degree: String,
    pub major: String,
    pub grade: String,
    /// "CGPA", "GPA", "Percentage" ... shown in front of the grade.
    pub grade_type: String,
    pub start_date: String,
    pub end_date: String,
    pub description: String,
}

impl EducationEntry {
    pub fn date_range(&self) -> String {
        join_non_empty(&[self.start_date.as_str(), self.end_date.as_str()], " - ")
    }

    pub fn grade_label(&self) -> String {
        join_non_empty(&[self.grade_type.as_str(), self.grade.as_str()], ": ")
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ProjectEntry {
    pub project_name: String,
    /// Comma separated list as typed by the user.
    pub tech_stack: String,
    /// Rich-text HTML fragment.
    pub project_summary: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub project_link: Option<String>,
}

impl ProjectEntry {
    pub fn tech_list(&self) -> Vec<&str> {
        self.tech_stack
            .split(',')
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .collect()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SkillEntry {
    pub name: String,
    /// Proficiency on a 0..=5 scale (half steps allowed).
    pub rating: f32,
}

impl SkillEntry {
    pub fn percent(&self) -> u32 {
        (self.rating.clamp(0.0, 5.0) * 20.0).round() as u32
    }
}

/// One resume as persisted by the backend and held by clients as a working copy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResumeDocument {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub title: String,
    pub theme_color: String,
    pub template: String,
    #[serde(default)]
    pub personal_details: PersonalDetails,
    #[serde(default)]
    pub summary: String,
    #[serde(default)]
    pub experience: Vec<ExperienceEntry>,
    #[serde(default)]
    pub education: Vec<EducationEntry>,
    #[serde(default)]
    pub projects: Vec<ProjectEntry>,
    #[serde(default)]
    pub skills: Vec<SkillEntry>,
    pub revision: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ResumeDocument {
    /// A freshly created resume: every section empty.
    pub fn new(owner_id: Uuid, title: String, theme_color: String, template: String) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            owner_id,
            title,
            theme_color,
            template,
            personal_details: PersonalDetails::default(),
            summary: String::new(),
            experience: Vec::new(),
            education: Vec::new(),
            projects: Vec::new(),
            skills: Vec::new(),
            revision: 0,
            created_at: now,
            updated_at: now,
        }
    }

    /// Merges one top-level section into the document. Every other section is left
    /// exactly as it was.
    pub fn apply(&mut self, update: SectionUpdate) {
        match update {
            SectionUpdate::Title(v) => self.title = v,
            SectionUpdate::ThemeColor(v) => self.theme_color = v,
            SectionUpdate::Template(v) => self.template = v,
            SectionUpdate::PersonalDetails(v) => self.personal_details = v,
            SectionUpdate::Summary(v) => self.summary = v,
            SectionUpdate::Experience(v) => self.experience = v,
            SectionUpdate::Education(v) => self.education = v,
            SectionUpdate::Projects(v) => self.projects = v,
            SectionUpdate::Skills(v) => self.skills = v,
        }
    }
}

/// Top-level fields that can be saved independently.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Section {
    Title,
    ThemeColor,
    Template,
    PersonalDetails,
    Summary,
    Experience,
    Education,
    Projects,
    Skills,
}

impl Section {
    pub fn as_str(&self) -> &'static str {
        match self {
            Section::Title => "title",
            Section::ThemeColor => "themeColor",
            Section::Template => "template",
            Section::PersonalDetails => "personalDetails",
            Section::Summary => "summary",
            Section::Experience => "experience",
            Section::Education => "education",
            Section::Projects => "projects",
            Section::Skills => "skills",
        }
    }

    /// Column holding this section in the `resumes` table.
    pub fn column(&self) -> &'static str {
        match self {
            Section::Title => "title",
            Section::ThemeColor => "theme_color",
            Section::Template => "template",
            Section::PersonalDetails => "personal_details",
            Section::Summary => "summary",
            Section::Experience => "experience",
            Section::Education => "education",
            Section::Projects => "projects",
            Section::Skills => "skills",
        }
    }
}

/// A partial update carrying exactly one section.
///
/// Wire form is a single-key object: `{"skills": [...]}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SectionUpdate {
    Title(String),
    ThemeColor(String),
    Template(String),
    PersonalDetails(PersonalDetails),
    Summary(String),
    Experience(Vec<ExperienceEntry>),
    Education(Vec<EducationEntry>),
    Projects(Vec<ProjectEntry>),
    Skills(Vec<SkillEntry>),
}

impl SectionUpdate {
    pub fn section(&self) -> Section {
        match self {
            SectionUpdate::Title(_) => Section::Title,
            SectionUpdate::ThemeColor(_) => Section::ThemeColor,
            SectionUpdate::Template(_) => Section::Template,
            SectionUpdate::PersonalDetails(_) => Section::PersonalDetails,
            SectionUpdate::Summary(_) => Section::Summary,
            SectionUpdate::Experience(_) => Section::Experience,
            SectionUpdate::Education(_) => Section::Education,
            SectionUpdate::Projects(_) => Section::Projects,
            SectionUpdate::Skills(_) => Section::Skills,
        }
    }
}

#[derive(Debug, Clone, FromRow)]
pub struct ResumeRow {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub title: String,
    pub theme_color: String,
    pub template: String,
    pub personal_details: Json<PersonalDetails>,
    pub summary: String,
    pub experience: Json<Vec<ExperienceEntry>>,
    pub education: Json<Vec<EducationEntry>>,
    pub projects: Json<Vec<ProjectEntry>>,
    pub skills: Json<Vec<SkillEntry>>,
    pub revision: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<ResumeRow> for ResumeDocument {
    fn from(row: ResumeRow) -> Self {
        Self {
            id: row.id,
            owner_id: row.owner_id,
            title: row.title,
            theme_color: row.theme_color,
            template: row.template,
            personal_details: row.personal_details.0,
            summary: row.summary,
            experience: row.experience.0,
            education: row.education.0,
            projects: row.projects.0,
            skills: row.skills.0,
            revision: row.revision,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

fn join_non_empty(parts: &[&str], sep: &str) -> String {
    parts
        .iter()
        .map(|p| p.trim())
        .filter(|p| !p.is_empty())
        .collect::<Vec<_>>()
        .join(sep)
}
