//! Building blocks shared by the template renderers.

use crate::export::dom::Element;
use crate::models::resume::{PersonalDetails, SkillEntry};
use crate::templates::rich_text::render_rich_text;

pub const MUTED: &str = "#4b5563";
pub const INK: &str = "#111827";
pub const TRACK: &str = "#e5e7eb";

/// A filled horizontal rule.
pub fn rule(color: &str, thickness_px: f32) -> Element {
    Element::new("div")
        .style("height", format!("{thickness_px}px"))
        .style("background", color)
}

/// Section heading followed by a full-width rule.
pub fn section_title(title: &str, theme: &str, align: &str) -> Element {
    Element::new("div")
        .style("margin-bottom", "8px")
        .child(
            Element::new("h2")
                .style("font-size", "14px")
                .style("color", theme)
                .style("text-align", align)
                .style("text-transform", "uppercase")
                .style("margin-bottom", "4px")
                .text(title),
        )
        .child(rule(theme, 1.5))
}

/// Left label, right label, pushed to opposite edges.
pub fn split_row(left: Element, right: &str) -> Element {
    Element::new("div")
        .style("display", "flex")
        .style("justify-content", "space-between")
        .child(left)
        .child(
            Element::new("span")
                .style("font-size", "12px")
                .style("color", MUTED)
                .text(right),
        )
}

pub fn rich_block(raw: &str, font_size_px: f32) -> Element {
    Element::new("div")
        .class("rich-text")
        .style("font-size", format!("{font_size_px}px"))
        .style("margin-top", "4px")
        .nodes(render_rich_text(raw))
}

/// Skill name with its percentage and a proportional bar.
pub fn skill_meter(skill: &SkillEntry, theme: &str) -> Element {
    let percent = skill.percent();
    Element::new("div")
        .class("skill")
        .style("margin-bottom", "6px")
        .child(split_row(
            Element::new("span").style("font-size", "12px").text(&skill.name),
            &format!("{percent}%"),
        ))
        .child(
            Element::new("div")
                .style("height", "6px")
                .style("margin-top", "2px")
                .style("background", TRACK)
                .child(
                    Element::new("div")
                        .style("width", format!("{percent}%"))
                        .style("height", "6px")
                        .style("background", theme),
                ),
        )
}

/// Lays `cells` out `per_row` to a line, padding the last row so columns align.
pub fn grid(cells: Vec<Element>, per_row: usize, gap_px: f32) -> Element {
    let per_row = per_row.max(1);
    let mut rows = Vec::new();
    let mut cells = cells.into_iter().peekable();
    while cells.peek().is_some() {
        let mut row: Vec<Element> = cells.by_ref().take(per_row).collect();
        while row.len() < per_row {
            row.push(Element::new("div"));
        }
        rows.push(
            Element::new("div")
                .style("display", "flex")
                .style("gap", format!("{gap_px}px"))
                .children(row.into_iter().map(|c| c.style("flex", "1"))),
        );
    }
    Element::new("div")
        .style("display", "flex")
        .style("flex-direction", "column")
        .style("gap", format!("{gap_px}px"))
        .children(rows)
}

/// Contact entries worth printing, with a link target where one makes sense.
pub fn contacts(details: &PersonalDetails) -> Vec<(String, Option<String>)> {
    let mut out = Vec::new();
    if !details.address.trim().is_empty() {
        out.push((details.address.clone(), None));
    }
    if !details.email.trim().is_empty() {
        out.push((details.email.clone(), Some(format!("mailto:{}", details.email))));
    }
    if !details.phone.trim().is_empty() {
        out.push((details.phone.clone(), Some(format!("tel:{}", details.phone))));
    }
    out
}

pub fn contact_line(details: &PersonalDetails, theme: &str) -> Element {
    let items = contacts(details);
    let count = items.len();
    let mut line = Element::new("div")
        .style("font-size", "12px")
        .style("text-align", "center")
        .style("color", MUTED);
    for (i, (value, href)) in items.into_iter().enumerate() {
        line = match href {
            Some(href) => line.child(Element::new("a").attr("href", href).text(value)),
            None => line.child(Element::new("span").text(value)),
        };
        if i + 1 < count {
            line = line.child(Element::new("span").style("color", theme).text(" | "));
        }
    }
    line
}

/// Project links are stored as typed; bare hosts get an https scheme.
pub fn project_href(link: &str) -> String {
    let link = link.trim();
    if link.starts_with("http://") || link.starts_with("https://") {
        link.to_string()
    } else {
        format!("https://{link}")
    }
}
