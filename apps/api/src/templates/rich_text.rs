//! Rich-text section fields (summaries) turned into safe document nodes.
//!
//! Editors store HTML fragments; older records and API clients send plain text.
//! HTML goes through an allow-list, plain text with bullet markers becomes a list.

use scraper::{ElementRef, Html, Node as HtmlNode};

use crate::export::dom::{Element, Node};

const ALLOWED_TAGS: &[&str] = &[
    "p", "br", "ul", "ol", "li", "strong", "b", "em", "i", "u", "span", "a",
];

/// Dropped together with everything inside them.
const DROPPED_TAGS: &[&str] = &[
    "script", "style", "iframe", "object", "embed", "head", "title", "noscript", "template",
];

const BULLET_MARKERS: &[char] = &['-', '•', '*'];

/// Renders a stored rich-text value into document nodes.
pub fn render_rich_text(raw: &str) -> Vec<Node> {
    let text = raw.trim();
    if text.is_empty() {
        return Vec::new();
    }
    if contains_html(text) {
        sanitize_html(text)
    } else {
        render_plain_text(text)
    }
}

/// True when the value contains something shaped like an HTML tag.
pub fn contains_html(text: &str) -> bool {
    let mut rest = text;
    while let Some(open) = rest.find('<') {
        let after = &rest[open + 1..];
        let name = after.strip_prefix('/').unwrap_or(after);
        if name.starts_with(|c: char| c.is_ascii_alphabetic()) && after.contains('>') {
            return true;
        }
        rest = after;
    }
    false
}

/// Parses an HTML fragment and keeps only allow-listed markup.
pub fn sanitize_html(html: &str) -> Vec<Node> {
    let fragment = Html::parse_fragment(html);
    let mut out = Vec::new();
    sanitize_children(fragment.root_element(), &mut out);
    out
}

fn sanitize_children(parent: ElementRef<'_>, out: &mut Vec<Node>) {
    for child in parent.children() {
        match child.value() {
            HtmlNode::Text(text) => {
                let text: &str = text;
                if !text.is_empty() {
                    out.push(Node::Text(text.to_string()));
                }
            }
            HtmlNode::Element(_) => {
                if let Some(el) = ElementRef::wrap(child) {
                    sanitize_element(el, out);
                }
            }
            _ => {}
        }
    }
}

fn sanitize_element(el: ElementRef<'_>, out: &mut Vec<Node>) {
    let name = el.value().name().to_ascii_lowercase();
    if DROPPED_TAGS.contains(&name.as_str()) {
        return;
    }
    if !ALLOWED_TAGS.contains(&name.as_str()) {
        // Unknown wrappers (div, font, section ...) are unwrapped.
        sanitize_children(el, out);
        return;
    }

    let mut clean = Element::new(&name);
    if name == "a" {
        match el.value().attr("href").filter(|href| is_safe_href(href)) {
            Some(href) => clean = clean.attr("href", href.trim()),
            None => {
                sanitize_children(el, out);
                return;
            }
        }
    }
    let mut children = Vec::new();
    sanitize_children(el, &mut children);
    out.push(Node::Element(clean.nodes(children)));
}

fn is_safe_href(href: &str) -> bool {
    let href = href.trim().to_ascii_lowercase();
    href.starts_with("http://") || href.starts_with("https://") || href.starts_with("mailto:")
}

/// Bullet-prefixed lines become a list (every non-empty line an item); anything
/// else is one paragraph.
pub fn render_plain_text(text: &str) -> Vec<Node> {
    let lines: Vec<&str> = text.lines().map(str::trim).filter(|l| !l.is_empty()).collect();
    if lines.iter().any(|l| strip_bullet(l).is_some()) {
        let items = lines.iter().map(|l| {
            Element::new("li")
                .style("margin-bottom", "4px")
                .text(strip_bullet(l).unwrap_or(l))
        });
        let list = Element::new("ul")
            .style("margin", "6px 0 0 0")
            .style("padding-left", "18px")
            .children(items);
        return vec![Node::Element(list)];
    }
    vec![Node::Element(
        Element::new("p").style("margin", "0").text(lines.join(" ")),
    )]
}

fn strip_bullet(line: &str) -> Option<&str> {
    let rest = line.strip_prefix(BULLET_MARKERS)?;
    rest.starts_with(char::is_whitespace).then(|| rest.trim_start())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn html_of(nodes: &[Node]) -> String {
        Element::new("div").nodes(nodes.to_vec()).inner_html()
    }

    #[test]
    fn test_plain_bullets_become_list() {
        let nodes = render_plain_text("- Built API\n• Wrote tests\n\n* Shipped v1\nMentored interns");
        let html = html_of(&nodes);
        assert!(html.starts_with("<ul"));
        assert_eq!(html.matches("<li").count(), 4);
        assert!(html.contains(">Built API</li>"));
        assert!(html.contains(">Mentored interns</li>"));
    }

    #[test]
    fn test_plain_text_without_bullets_is_paragraph() {
        let html = html_of(&render_rich_text("Led a team of four.\nCut costs by 20%."));
        assert_eq!(html, "<p style=\"margin: 0;\">Led a team of four. Cut costs by 20%.</p>");
    }

    #[test]
    fn test_dash_without_space_is_not_a_bullet() {
        let html = html_of(&render_rich_text("-10% latency"));
        assert!(html.starts_with("<p"));
    }

    #[test]
    fn test_html_is_sanitized() {
        let raw = r#"<div><p onclick="x()">Hi <strong>there</strong></p><script>alert(1)</script><ul><li>One</li></ul><a href="javascript:evil()">bad</a> <a href="https://ok.dev">good</a></div>"#;
        let html = html_of(&render_rich_text(raw));
        assert_eq!(
            html,
            "<p>Hi <strong>there</strong></p><ul><li>One</li></ul>bad <a href=\"https://ok.dev\">good</a>"
        );
    }

    #[test]
    fn test_empty_input() {
        assert!(render_rich_text("   ").is_empty());
    }

    #[test]
    fn test_contains_html_detection() {
        assert!(contains_html("<p>x</p>"));
        assert!(contains_html("a <br/> b"));
        assert!(!contains_html("3 < 4 and 5 > 2"));
        assert!(!contains_html("plain"));
    }
}
