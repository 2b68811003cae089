//! Serif headings with trailing rules and right-aligned dates.

use crate::export::dom::Element;
use crate::export::font_metrics::FontFamily;
use crate::models::resume::ResumeDocument;
use crate::templates::parts::{
    contact_line, grid, project_href, rich_block, rule, skill_meter, split_row, INK, MUTED,
};

fn heading(title: &str, theme: &str) -> Element {
    Element::new("div")
        .style("display", "flex")
        .style("gap", "12px")
        .style("margin-bottom", "8px")
        .child(
            Element::new("h2")
                .style("font-size", "13px")
                .style("color", theme)
                .style("text-transform", "uppercase")
                .text(title),
        )
        .child(
            Element::new("div")
                .style("flex", "1")
                .style("margin-top", "9px")
                .style("border-top", format!("1px solid {theme}")),
        )
}

fn entry(title: &str, subtitle: String, dates: &str, body: &str) -> Element {
    Element::new("div")
        .style("margin-bottom", "14px")
        .child(split_row(
            Element::new("h3")
                .style("font-size", "13px")
                .style("font-family", FontFamily::Georgia.css_stack())
                .text(title),
            dates,
        ))
        .child(
            Element::new("div")
                .style("font-size", "12px")
                .style("color", MUTED)
                .text(subtitle),
        )
        .child(rich_block(body, 12.0))
}

pub fn render(resume: &ResumeDocument) -> Element {
    let theme = resume.theme_color.as_str();
    let details = &resume.personal_details;
    let mut page = Element::new("div")
        .class("template second-template")
        .style("font-family", FontFamily::Sans.css_stack())
        .style("color", INK);

    page = page.child(
        Element::new("header")
            .class("personal-details")
            .style("margin-bottom", "16px")
            .child(
                Element::new("h1")
                    .style("font-family", FontFamily::Georgia.css_stack())
                    .style("font-size", "26px")
                    .style("text-align", "center")
                    .style("color", theme)
                    .text(details.full_name()),
            )
            .child(
                Element::new("div")
                    .style("font-size", "13px")
                    .style("text-align", "center")
                    .style("color", MUTED)
                    .style("margin", "4px 0 8px 0")
                    .text(&details.job_title),
            )
            .child(contact_line(details, theme))
            .child(rule(theme, 1.0).style("margin-top", "12px")),
    );

    if !resume.summary.trim().is_empty() {
        page = page.child(
            Element::new("div")
                .class("summary")
                .style("margin-bottom", "16px")
                .child(heading("Summary", theme))
                .child(rich_block(&resume.summary, 12.0)),
        );
    }

    if !resume.experience.is_empty() {
        let mut section = Element::new("div")
            .class("experience")
            .child(heading("Work Experience", theme));
        for job in &resume.experience {
            let at = [job.company_name.clone(), job.location()]
                .into_iter()
                .filter(|p| !p.is_empty())
                .collect::<Vec<_>>()
                .join(", ");
            section = section.child(entry(&job.title, at, &job.date_range(), &job.work_summary));
        }
        page = page.child(section);
    }

    if !resume.projects.is_empty() {
        let mut section = Element::new("div")
            .class("projects")
            .child(heading("Projects", theme));
        for project in &resume.projects {
            let mut item = entry(
                &project.project_name,
                project.tech_list().join(" · "),
                "",
                &project.project_summary,
            );
            if let Some(link) = project.project_link.as_deref().filter(|l| !l.trim().is_empty()) {
                item = item.child(
                    Element::new("a")
                        .attr("href", project_href(link))
                        .style("font-size", "11px")
                        .style("color", theme)
                        .text(link.trim()),
                );
            }
            section = section.child(item);
        }
        page = page.child(section);
    }

    if !resume.education.is_empty() {
        let mut section = Element::new("div")
            .class("education")
            .child(heading("Education", theme));
        for school in &resume.education {
            let subtitle = [school.degree.clone(), school.major.clone(), school.grade_label()]
                .into_iter()
                .filter(|p| !p.is_empty())
                .collect::<Vec<_>>()
                .join(" | ");
            section = section.child(entry(
                &school.university_name,
                subtitle,
                &school.date_range(),
                &school.description,
            ));
        }
        page = page.child(section);
    }

    if !resume.skills.is_empty() {
        let meters = resume.skills.iter().map(|s| skill_meter(s, theme)).collect();
        page = page.child(
            Element::new("div")
                .class("skills")
                .child(heading("Skills", theme))
                .child(grid(meters, 3, 12.0)),
        );
    }

    page
}
