//! Classic single-column layout: centred header, themed section titles.

use crate::export::dom::Element;
use crate::export::font_metrics::FontFamily;
use crate::models::resume::ResumeDocument;
use crate::templates::parts::{
    contact_line, grid, project_href, rich_block, rule, section_title, skill_meter, split_row, INK,
    MUTED,
};

pub fn render(resume: &ResumeDocument) -> Element {
    let theme = resume.theme_color.as_str();
    let details = &resume.personal_details;
    let mut page = Element::new("div")
        .class("template first-template")
        .style("font-family", FontFamily::Sans.css_stack())
        .style("color", INK);

    page = page.child(
        Element::new("div")
            .class("personal-details")
            .child(
                Element::new("h2")
                    .style("font-size", "20px")
                    .style("text-align", "center")
                    .style("color", theme)
                    .text(details.full_name()),
            )
            .child(
                Element::new("h3")
                    .style("font-size", "14px")
                    .style("text-align", "center")
                    .style("font-weight", "500")
                    .text(&details.job_title),
            )
            .child(contact_line(details, theme))
            .child(rule(theme, 1.5).style("margin", "8px 0")),
    );

    if !resume.summary.trim().is_empty() {
        page = page.child(
            Element::new("div")
                .class("summary")
                .style("margin-bottom", "12px")
                .child(rich_block(&resume.summary, 12.0)),
        );
    }

    if !resume.experience.is_empty() {
        let mut section = Element::new("div")
            .class("experience")
            .style("margin-bottom", "12px")
            .child(section_title("Professional Experience", theme, "center"));
        for job in &resume.experience {
            let place = [job.company_name.as_str(), job.city.as_str(), job.state.as_str()]
                .iter()
                .filter(|p| !p.trim().is_empty())
                .copied()
                .collect::<Vec<_>>()
                .join(", ");
            section = section.child(
                Element::new("div")
                    .style("margin-bottom", "10px")
                    .child(
                        Element::new("h3")
                            .style("font-size", "13px")
                            .style("color", theme)
                            .text(&job.title),
                    )
                    .child(split_row(
                        Element::new("span").style("font-size", "12px").text(place),
                        &job.date_range(),
                    ))
                    .child(rich_block(&job.work_summary, 12.0)),
            );
        }
        page = page.child(section);
    }

    if !resume.projects.is_empty() {
        let mut section = Element::new("div")
            .class("projects")
            .style("margin-bottom", "12px")
            .child(section_title("Projects", theme, "center"));
        for project in &resume.projects {
            let mut title = Element::new("h3")
                .style("font-size", "13px")
                .style("color", theme)
                .text(&project.project_name);
            if let Some(link) = project.project_link.as_deref().filter(|l| !l.trim().is_empty()) {
                title = title.text(" ").child(
                    Element::new("a")
                        .attr("href", project_href(link))
                        .style("font-size", "11px")
                        .text("(link)"),
                );
            }
            section = section.child(
                Element::new("div")
                    .style("margin-bottom", "10px")
                    .child(title)
                    .child(
                        Element::new("div")
                            .style("font-size", "12px")
                            .style("color", MUTED)
                            .text(project.tech_list().join(", ")),
                    )
                    .child(rich_block(&project.project_summary, 12.0)),
            );
        }
        page = page.child(section);
    }

    if !resume.education.is_empty() {
        let mut section = Element::new("div")
            .class("education")
            .style("margin-bottom", "12px")
            .child(section_title("Education", theme, "center"));
        for school in &resume.education {
            let degree = [school.degree.as_str(), school.major.as_str()]
                .iter()
                .filter(|p| !p.trim().is_empty())
                .copied()
                .collect::<Vec<_>>()
                .join(" in ");
            section = section.child(
                Element::new("div")
                    .style("margin-bottom", "10px")
                    .child(
                        Element::new("h3")
                            .style("font-size", "13px")
                            .style("color", theme)
                            .text(&school.university_name),
                    )
                    .child(split_row(
                        Element::new("span").style("font-size", "12px").text(degree),
                        &school.date_range(),
                    ))
                    .child(
                        Element::new("div")
                            .style("font-size", "12px")
                            .text(school.grade_label()),
                    )
                    .child(rich_block(&school.description, 12.0)),
            );
        }
        page = page.child(section);
    }

    if !resume.skills.is_empty() {
        let meters = resume.skills.iter().map(|s| skill_meter(s, theme)).collect();
        page = page.child(
            Element::new("div")
                .class("skills")
                .child(section_title("Skills", theme, "center"))
                .child(grid(meters, 2, 16.0)),
        );
    }

    page
}
