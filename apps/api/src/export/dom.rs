//! Minimal document tree produced by the template renderers.
//!
//! This is the "live" view a PDF/Word export reads from: templates build it, the
//! export pipeline locates the `.print` subtree in it, and HTML previews serialize it.

use crate::export::style::InlineStyle;

const VOID_TAGS: &[&str] = &["br", "hr", "img", "meta", "link", "input"];

const BLOCK_TAGS: &[&str] = &[
    "html", "body", "div", "section", "header", "footer", "main", "article", "aside", "nav",
    "h1", "h2", "h3", "h4", "h5", "h6", "p", "ul", "ol", "li", "table", "tr", "hr",
];

#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    Element(Element),
    Text(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Element {
    pub tag: String,
    pub classes: Vec<String>,
    pub attrs: Vec<(String, String)>,
    pub style: InlineStyle,
    pub children: Vec<Node>,
}

impl Element {
    pub fn new(tag: &str) -> Self {
        Self {
            tag: tag.to_ascii_lowercase(),
            classes: Vec::new(),
            attrs: Vec::new(),
            style: InlineStyle::new(),
            children: Vec::new(),
        }
    }

    pub fn class(mut self, class: &str) -> Self {
        self.classes.extend(class.split_whitespace().map(str::to_string));
        self
    }

    pub fn attr(mut self, name: &str, value: impl Into<String>) -> Self {
        self.attrs.push((name.to_string(), value.into()));
        self
    }

    pub fn style(mut self, prop: &str, value: impl Into<String>) -> Self {
        self.style.set(prop, value);
        self
    }

    pub fn child(mut self, element: Element) -> Self {
        self.children.push(Node::Element(element));
        self
    }

    pub fn children(mut self, elements: impl IntoIterator<Item = Element>) -> Self {
        self.children
            .extend(elements.into_iter().map(Node::Element));
        self
    }

    pub fn nodes(mut self, nodes: impl IntoIterator<Item = Node>) -> Self {
        self.children.extend(nodes);
        self
    }

    pub fn text(mut self, text: impl Into<String>) -> Self {
        self.children.push(Node::Text(text.into()));
        self
    }

    pub fn has_class(&self, class: &str) -> bool {
        self.classes.iter().any(|c| c == class)
    }

    pub fn get_attr(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn is_block(&self) -> bool {
        match self.style.get("display") {
            Some("block") | Some("flex") | Some("grid") => true,
            Some("inline") | Some("inline-block") => false,
            _ => BLOCK_TAGS.contains(&self.tag.as_str()),
        }
    }

    /// Depth-first search, including `self`.
    pub fn find_by_class(&self, class: &str) -> Option<&Element> {
        if self.has_class(class) {
            return Some(self);
        }
        self.child_elements().find_map(|c| c.find_by_class(class))
    }

    pub fn find_by_class_mut(&mut self, class: &str) -> Option<&mut Element> {
        if self.has_class(class) {
            return Some(self);
        }
        self.children.iter_mut().find_map(|c| match c {
            Node::Element(e) => e.find_by_class_mut(class),
            Node::Text(_) => None,
        })
    }

    pub fn child_elements(&self) -> impl Iterator<Item = &Element> {
        self.children.iter().filter_map(|c| match c {
            Node::Element(e) => Some(e),
            Node::Text(_) => None,
        })
    }

    /// Removes every descendant element for which `pred` holds, subtree included.
    pub fn remove_where(&mut self, pred: &dyn Fn(&Element) -> bool) {
        self.children.retain(|c| match c {
            Node::Element(e) => !pred(e),
            Node::Text(_) => true,
        });
        for child in &mut self.children {
            if let Node::Element(e) = child {
                e.remove_where(pred);
            }
        }
    }

    /// True if any descendant (or `self`) satisfies `pred`.
    pub fn any(&self, pred: &dyn Fn(&Element) -> bool) -> bool {
        pred(self) || self.child_elements().any(|c| c.any(pred))
    }

    pub fn text_content(&self) -> String {
        let mut out = String::new();
        collect_text(self, &mut out);
        out
    }

    pub fn outer_html(&self) -> String {
        let mut out = String::new();
        write_element(self, &mut out);
        out
    }

    pub fn inner_html(&self) -> String {
        let mut out = String::new();
        for child in &self.children {
            write_node(child, &mut out);
        }
        out
    }
}

/// A full rendered page.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub root: Element,
}

impl Document {
    pub fn new(root: Element) -> Self {
        Self { root }
    }

    pub fn find_by_class(&self, class: &str) -> Option<&Element> {
        self.root.find_by_class(class)
    }

    pub fn find_by_class_mut(&mut self, class: &str) -> Option<&mut Element> {
        self.root.find_by_class_mut(class)
    }

    pub fn to_html(&self) -> String {
        format!("<!DOCTYPE html>{}", self.root.outer_html())
    }
}

fn collect_text(el: &Element, out: &mut String) {
    for child in &el.children {
        match child {
            Node::Text(t) => out.push_str(t),
            Node::Element(e) => collect_text(e, out),
        }
    }
}

fn write_node(node: &Node, out: &mut String) {
    match node {
        Node::Text(t) => out.push_str(&escape_text(t)),
        Node::Element(e) => write_element(e, out),
    }
}

fn write_element(el: &Element, out: &mut String) {
    out.push('<');
    out.push_str(&el.tag);
    if !el.classes.is_empty() {
        out.push_str(" class=\"");
        out.push_str(&escape_attr(&el.classes.join(" ")));
        out.push('"');
    }
    for (name, value) in &el.attrs {
        out.push(' ');
        out.push_str(name);
        out.push_str("=\"");
        out.push_str(&escape_attr(value));
        out.push('"');
    }
    if !el.style.is_empty() {
        out.push_str(" style=\"");
        out.push_str(&escape_attr(&el.style.to_css()));
        out.push('"');
    }
    out.push('>');
    if VOID_TAGS.contains(&el.tag.as_str()) {
        return;
    }
    for child in &el.children {
        write_node(child, out);
    }
    out.push_str("</");
    out.push_str(&el.tag);
    out.push('>');
}

pub fn escape_text(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

pub fn escape_attr(s: &str) -> String {
    escape_text(s).replace('"', "&quot;")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Element {
        Element::new("div")
            .class("print")
            .child(Element::new("h2").text("Skills & Tools"))
            .child(
                Element::new("div")
                    .class("no-print")
                    .child(Element::new("button").text("Download")),
            )
            .child(Element::new("a").attr("href", "https://x.dev").text("link"))
    }

    #[test]
    fn test_find_by_class_includes_self_and_descendants() {
        let root = Element::new("body").child(sample());
        assert!(root.find_by_class("print").is_some());
        assert!(root.find_by_class("no-print").is_some());
        assert!(root.find_by_class("missing").is_none());
    }

    #[test]
    fn test_remove_where_drops_subtrees() {
        let mut el = sample();
        el.remove_where(&|e| e.tag == "a" || e.has_class("no-print"));
        assert!(!el.any(&|e| e.tag == "a" || e.tag == "button"));
        assert_eq!(el.text_content(), "Skills & Tools");
    }

    #[test]
    fn test_serialization_escapes() {
        let el = Element::new("p")
            .attr("title", "say \"hi\"")
            .style("color", "#111")
            .text("a < b")
            .child(Element::new("br"));
        assert_eq!(
            el.outer_html(),
            "<p title=\"say &quot;hi&quot;\" style=\"color: #111;\">a &lt; b<br></p>"
        );
    }

    #[test]
    fn test_display_overrides_tag_default() {
        assert!(Element::new("div").is_block());
        assert!(!Element::new("span").is_block());
        assert!(!Element::new("div").style("display", "inline").is_block());
        assert!(Element::new("span").style("display", "flex").is_block());
    }
}
