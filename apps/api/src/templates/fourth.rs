//! Two columns: identity, education and skills on the left; work on the right.

use crate::export::dom::Element;
use crate::export::font_metrics::FontFamily;
use crate::models::resume::ResumeDocument;
use crate::templates::parts::{
    contacts, project_href, rich_block, section_title, skill_meter, INK, MUTED,
};

fn column(width: Option<&str>) -> Element {
    let col = Element::new("div")
        .style("display", "flex")
        .style("flex-direction", "column")
        .style("gap", "16px");
    match width {
        Some(w) => col.style("width", w),
        None => col.style("flex", "1"),
    }
}

pub fn render(resume: &ResumeDocument) -> Element {
    let theme = resume.theme_color.as_str();
    let details = &resume.personal_details;

    let mut identity = Element::new("div")
        .class("personal-details")
        .child(
            Element::new("h1")
                .style("font-size", "22px")
                .style("color", theme)
                .text(details.full_name()),
        )
        .child(
            Element::new("div")
                .style("font-size", "13px")
                .style("color", MUTED)
                .style("margin-bottom", "6px")
                .text(&details.job_title),
        );
    for (value, href) in contacts(details) {
        let line = Element::new("div").style("font-size", "12px");
        identity = identity.child(match href {
            Some(href) => line.child(Element::new("a").attr("href", href).text(value)),
            None => line.text(value),
        });
    }

    let mut left = column(Some("34%")).child(identity);
    let mut right = column(None);

    if !resume.summary.trim().is_empty() {
        left = left.child(
            Element::new("div")
                .class("summary")
                .child(section_title("Profile", theme, "left"))
                .child(rich_block(&resume.summary, 12.0)),
        );
    }

    if !resume.education.is_empty() {
        let mut section = Element::new("div")
            .class("education")
            .child(section_title("Education", theme, "left"));
        for school in &resume.education {
            section = section.child(
                Element::new("div")
                    .style("margin-bottom", "8px")
                    .style("font-size", "12px")
                    .child(Element::new("strong").text(&school.university_name))
                    .child(Element::new("div").text(format!("{} {}", school.degree, school.major).trim().to_string()))
                    .child(
                        Element::new("div")
                            .style("color", MUTED)
                            .text(school.date_range()),
                    )
                    .child(Element::new("div").text(school.grade_label())),
            );
        }
        left = left.child(section);
    }

    if !resume.skills.is_empty() {
        left = left.child(
            Element::new("div")
                .class("skills")
                .child(section_title("Skills", theme, "left"))
                .children(resume.skills.iter().map(|s| skill_meter(s, theme))),
        );
    }

    if !resume.experience.is_empty() {
        let mut section = Element::new("div")
            .class("experience")
            .child(section_title("Experience", theme, "left"));
        for job in &resume.experience {
            section = section.child(
                Element::new("div")
                    .style("margin-bottom", "12px")
                    .child(Element::new("h3").style("font-size", "14px").text(&job.title))
                    .child(
                        Element::new("div")
                            .style("font-size", "12px")
                            .style("color", theme)
                            .text(format!("{} {}", job.company_name, job.date_range()).trim().to_string()),
                    )
                    .child(
                        Element::new("div")
                            .style("font-size", "11px")
                            .style("color", MUTED)
                            .text(job.location()),
                    )
                    .child(rich_block(&job.work_summary, 12.0)),
            );
        }
        right = right.child(section);
    }

    if !resume.projects.is_empty() {
        let mut section = Element::new("div")
            .class("projects")
            .child(section_title("Projects", theme, "left"));
        for project in &resume.projects {
            let mut title = Element::new("h3")
                .style("font-size", "14px")
                .text(&project.project_name);
            if let Some(link) = project.project_link.as_deref().filter(|l| !l.trim().is_empty()) {
                title = title.text(" ").child(
                    Element::new("a")
                        .attr("href", project_href(link))
                        .style("font-size", "12px")
                        .style("color", theme)
                        .text("Link to Demo"),
                );
            }
            section = section.child(
                Element::new("div")
                    .style("margin-bottom", "12px")
                    .child(title)
                    .child(
                        Element::new("div")
                            .style("font-size", "12px")
                            .style("color", "#222222")
                            .text(project.tech_list().join(", ")),
                    )
                    .child(rich_block(&project.project_summary, 12.0)),
            );
        }
        right = right.child(section);
    }

    Element::new("div")
        .class("template fourth-template")
        .style("font-family", FontFamily::Times.css_stack())
        .style("color", INK)
        .style("padding", "12px 18px")
        .child(
            Element::new("div")
                .style("display", "flex")
                .style("gap", "24px")
                .child(left)
                .child(right),
        )
}
