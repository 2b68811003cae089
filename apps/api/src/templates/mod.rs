//! Visual templates. Each one maps a [`ResumeDocument`] to a document tree that the
//! preview endpoint serializes and the export pipeline captures.

mod first;
mod fourth;
pub mod parts;
pub mod rich_text;
mod second;
mod third;

use serde::{Deserialize, Serialize};

use crate::export::dom::{Document, Element};
use crate::export::font_metrics::FontFamily;
use crate::models::resume::ResumeDocument;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TemplateKind {
    #[serde(rename = "first-template")]
    First,
    #[serde(rename = "second-template")]
    Second,
    #[serde(rename = "third-template")]
    Third,
    #[serde(rename = "fourth-template")]
    Fourth,
}

/// Static description of a template and what the exporter may do with it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TemplateSpec {
    pub id: &'static str,
    pub label: &'static str,
    pub font: FontFamily,
    /// Tall captures are sliced over several pages instead of shrunk onto one.
    pub supports_multi_page: bool,
}

impl TemplateKind {
    pub const ALL: [TemplateKind; 4] = [
        TemplateKind::First,
        TemplateKind::Second,
        TemplateKind::Third,
        TemplateKind::Fourth,
    ];

    pub fn from_id(id: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.id() == id.trim())
    }

    pub fn id(&self) -> &'static str {
        self.spec().id
    }

    pub fn spec(&self) -> TemplateSpec {
        match self {
            TemplateKind::First => TemplateSpec {
                id: "first-template",
                label: "Classic",
                font: FontFamily::Sans,
                supports_multi_page: false,
            },
            TemplateKind::Second => TemplateSpec {
                id: "second-template",
                label: "Ruled",
                font: FontFamily::Sans,
                supports_multi_page: false,
            },
            TemplateKind::Third => TemplateSpec {
                id: "third-template",
                label: "Boxed",
                font: FontFamily::Georgia,
                supports_multi_page: true,
            },
            TemplateKind::Fourth => TemplateSpec {
                id: "fourth-template",
                label: "Two column",
                font: FontFamily::Times,
                supports_multi_page: false,
            },
        }
    }

    /// The resume body without any page chrome.
    pub fn render_body(&self, resume: &ResumeDocument) -> Element {
        match self {
            TemplateKind::First => first::render(resume),
            TemplateKind::Second => second::render(resume),
            TemplateKind::Third => third::render(resume),
            TemplateKind::Fourth => fourth::render(resume),
        }
    }
}

/// Renders the full view page: a screen-only toolbar and the A4 print area
/// holding the `.print` node.
pub fn render_view(resume: &ResumeDocument, kind: TemplateKind) -> Document {
    let export_base = format!("/api/resumes/{}", resume.id);
    let query = format!("?template={}", kind.id());

    let toolbar = Element::new("div")
        .class("no-print")
        .attr("id", "noPrint")
        .style("text-align", "center")
        .style("margin", "40px 0")
        .child(Element::new("h2").text("Congrats! Your Automated Resume is ready !"))
        .child(
            Element::new("p")
                .style("color", "#9ca3af")
                .text("Now you are ready to download your resume"),
        )
        .child(
            Element::new("div")
                .style("display", "flex")
                .style("justify-content", "center")
                .style("gap", "8px")
                .child(
                    Element::new("button")
                        .attr("data-href", format!("{export_base}/export/pdf{query}"))
                        .text("Download as PDF"),
                )
                .child(
                    Element::new("button")
                        .attr("data-href", format!("{export_base}/export/word{query}"))
                        .text("Download as Word"),
                )
                .child(
                    Element::new("a")
                        .attr("href", format!("{export_base}/preview{query}"))
                        .text("Share"),
                ),
        );

    // Preview frame: themed top border around the template body.
    let frame = Element::new("div")
        .class("preview-frame")
        .style("border-top", format!("20px solid {}", resume.theme_color))
        .style("padding", "56px")
        .child(kind.render_body(resume));

    let print_area = Element::new("div")
        .class("print-area")
        .style("width", "210mm")
        .style("height", "297mm")
        .style("padding", "32px")
        .style("background", "#ffffff")
        .child(Element::new("div").class("print").child(frame));

    let title = if resume.title.trim().is_empty() {
        "Resume".to_string()
    } else {
        resume.title.clone()
    };

    Document::new(
        Element::new("html")
            .child(
                Element::new("head")
                    .child(Element::new("meta").attr("charset", "UTF-8"))
                    .child(Element::new("title").text(title)),
            )
            .child(
                Element::new("body")
                    .style("margin", "0")
                    .style("font-family", FontFamily::Sans.css_stack())
                    .child(toolbar)
                    .child(print_area),
            ),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::resume::{
        EducationEntry, ExperienceEntry, PersonalDetails, ProjectEntry, SkillEntry,
    };
    use uuid::Uuid;

    fn sample() -> ResumeDocument {
        let mut doc = ResumeDocument::new(
            Uuid::new_v4(),
            "Backend Resume".into(),
            "#1e1d64ff".into(),
            "third-template".into(),
        );
        doc.personal_details = PersonalDetails {
            first_name: "Jane".into(),
            last_name: "Doe".into(),
            job_title: "Backend Engineer".into(),
            address: "12 Main Street".into(),
            phone: "+15551234567".into(),
            email: "jane@doe.dev".into(),
        };
        doc.summary = "<p>Builds <strong>reliable</strong> services.</p>".into();
        doc.experience = vec![ExperienceEntry {
            title: "Engineer".into(),
            company_name: "Acme".into(),
            start_date: "2021".into(),
            currently_working: true,
            work_summary: "- Shipped billing\n- Cut p99 by 40%".into(),
            ..Default::default()
        }];
        doc.education = vec![EducationEntry {
            university_name: "State University".into(),
            degree: "BSc".into(),
            major: "Computer Science".into(),
            ..Default::default()
        }];
        doc.projects = vec![ProjectEntry {
            project_name: "Resume Builder".into(),
            tech_stack: "Rust, Axum".into(),
            project_summary: "Server-side exports".into(),
            project_link: Some("github.com/jane/resume".into()),
        }];
        doc.skills = vec![SkillEntry { name: "Rust".into(), rating: 4.5 }];
        doc
    }

    #[test]
    fn test_ids_round_trip_and_unknown_is_none() {
        for kind in TemplateKind::ALL {
            assert_eq!(TemplateKind::from_id(kind.id()), Some(kind));
        }
        assert_eq!(TemplateKind::from_id("fifth-template"), None);
    }

    #[test]
    fn test_only_third_template_paginates() {
        let multi: Vec<_> = TemplateKind::ALL
            .into_iter()
            .filter(|k| k.spec().supports_multi_page)
            .collect();
        assert_eq!(multi, vec![TemplateKind::Third]);
    }

    #[test]
    fn test_view_has_toolbar_outside_print_node() {
        let view = render_view(&sample(), TemplateKind::First);
        let print = view.find_by_class("print").unwrap();
        assert!(print.find_by_class("no-print").is_none());
        assert!(view.find_by_class("no-print").is_some());
        let area = view.find_by_class("print-area").unwrap();
        assert_eq!(area.style.get("width"), Some("210mm"));
        assert_eq!(area.style.get("height"), Some("297mm"));
    }

    #[test]
    fn test_every_template_renders_all_sections() {
        let resume = sample();
        for kind in TemplateKind::ALL {
            let view = render_view(&resume, kind);
            let text = view.find_by_class("print").unwrap().text_content();
            for expected in [
                "Jane Doe",
                "Backend Engineer",
                "reliable",
                "Shipped billing",
                "State University",
                "Resume Builder",
                "Rust",
                "90%",
            ] {
                assert!(text.contains(expected), "{kind:?} missing {expected}");
            }
            let frame = view.find_by_class("preview-frame").unwrap();
            assert_eq!(frame.style.get("border-top"), Some("20px solid #1e1d64ff"));
        }
    }

    #[test]
    fn test_empty_sections_are_omitted() {
        let resume = ResumeDocument::new(
            Uuid::new_v4(),
            "Blank".into(),
            "#000000".into(),
            "first-template".into(),
        );
        for kind in TemplateKind::ALL {
            let view = render_view(&resume, kind);
            for class in ["experience", "projects", "education", "skills", "summary"] {
                assert!(view.find_by_class(class).is_none(), "{kind:?} rendered {class}");
            }
        }
    }

    #[test]
    fn test_project_link_gets_scheme() {
        let html = render_view(&sample(), TemplateKind::Fourth).to_html();
        assert!(html.contains("href=\"https://github.com/jane/resume\""));
    }
}
