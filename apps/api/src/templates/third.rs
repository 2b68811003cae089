//! Boxed sections on a serif card. The only layout allowed to run over several pages.

use crate::export::dom::Element;
use crate::export::font_metrics::FontFamily;
use crate::models::resume::ResumeDocument;
use crate::templates::parts::{
    contact_line, grid, project_href, rich_block, rule, skill_meter, split_row, INK, MUTED,
};

const BOX_BORDER: &str = "#f1f5f9";

fn section_box(class: &str) -> Element {
    Element::new("div")
        .class(class)
        .style("padding", "10px")
        .style("border", format!("1px solid {BOX_BORDER}"))
        .style("background", "#ffffff")
}

fn centered_title(title: &str, theme: &str) -> Element {
    Element::new("div")
        .style("margin-bottom", "6px")
        .child(
            Element::new("h2")
                .style("font-size", "16px")
                .style("text-align", "center")
                .style("text-transform", "uppercase")
                .style("color", theme)
                .style("line-height", "1")
                .style("margin-bottom", "6px")
                .text(title),
        )
        .child(rule(theme, 1.5))
}

pub fn render(resume: &ResumeDocument) -> Element {
    let theme = resume.theme_color.as_str();
    let details = &resume.personal_details;

    let header = Element::new("div")
        .class("personal-details")
        .style("padding", "12px")
        .child(
            Element::new("h1")
                .style("font-size", "26px")
                .style("text-align", "center")
                .style("color", theme)
                .text(details.full_name()),
        )
        .child(
            Element::new("div")
                .style("text-align", "center")
                .style("font-size", "14px")
                .style("color", MUTED)
                .style("margin-bottom", "6px")
                .text(&details.job_title),
        )
        .child(contact_line(details, theme));

    let mut content = Element::new("div")
        .style("padding", "12px")
        .style("display", "grid")
        .style("gap", "10px");

    if !resume.summary.trim().is_empty() {
        content = content.child(
            section_box("summary")
                .child(centered_title("Summary", theme))
                .child(rich_block(&resume.summary, 13.0)),
        );
    }

    if !resume.experience.is_empty() {
        let mut block = section_box("experience").child(centered_title("Experience", theme));
        for job in &resume.experience {
            block = block.child(
                Element::new("div")
                    .style("margin-top", "8px")
                    .child(split_row(
                        Element::new("h3").style("font-size", "14px").text(&job.title),
                        &job.date_range(),
                    ))
                    .child(
                        Element::new("div")
                            .style("font-size", "12px")
                            .style("color", theme)
                            .text(
                                [job.company_name.clone(), job.location()]
                                    .into_iter()
                                    .filter(|p| !p.is_empty())
                                    .collect::<Vec<_>>()
                                    .join(" | "),
                            ),
                    )
                    .child(rich_block(&job.work_summary, 12.0)),
            );
        }
        content = content.child(block);
    }

    if !resume.projects.is_empty() {
        let mut block = section_box("projects").child(centered_title("Projects", theme));
        for project in &resume.projects {
            let mut item = Element::new("div")
                .style("margin-top", "8px")
                .child(Element::new("h3").style("font-size", "14px").text(&project.project_name))
                .child(
                    Element::new("div")
                        .style("font-size", "12px")
                        .style("color", MUTED)
                        .text(project.tech_list().join(", ")),
                )
                .child(rich_block(&project.project_summary, 12.0));
            if let Some(link) = project.project_link.as_deref().filter(|l| !l.trim().is_empty()) {
                item = item.child(
                    Element::new("a")
                        .attr("href", project_href(link))
                        .style("font-size", "12px")
                        .style("color", theme)
                        .text("Link to Demo"),
                );
            }
            block = block.child(item);
        }
        content = content.child(block);
    }

    if !resume.education.is_empty() {
        let mut block = section_box("education").child(centered_title("Education", theme));
        for school in &resume.education {
            block = block.child(
                Element::new("div")
                    .style("margin-top", "8px")
                    .child(split_row(
                        Element::new("h3").style("font-size", "14px").text(&school.university_name),
                        &school.date_range(),
                    ))
                    .child(
                        Element::new("div")
                            .style("font-size", "12px")
                            .text(format!("{} {}", school.degree, school.major).trim().to_string()),
                    )
                    .child(
                        Element::new("div")
                            .style("font-size", "12px")
                            .style("color", MUTED)
                            .text(school.grade_label()),
                    )
                    .child(rich_block(&school.description, 12.0)),
            );
        }
        content = content.child(block);
    }

    if !resume.skills.is_empty() {
        let meters = resume.skills.iter().map(|s| skill_meter(s, theme)).collect();
        content = content.child(
            section_box("skills")
                .child(centered_title("Skills", theme))
                .child(grid(meters, 3, 8.0)),
        );
    }

    Element::new("div")
        .class("template third-template")
        .style("font-family", FontFamily::Georgia.css_stack())
        .style("color", INK)
        .child(
            Element::new("div")
                .class("card")
                .style("width", "100%")
                .style("max-width", "900px")
                .style("margin", "0 auto")
                .child(header)
                .child(content),
        )
}
