//! Word-compatible HTML export of the printable subtree.

use crate::export::dom::Element;

pub const WORD_MIME: &str = "application/msword";
pub const WORD_FILE_NAME: &str = "resume.doc";

const SHELL_HEAD: &str = r#"<html xmlns:o="urn:schemas-microsoft-com:office:office" xmlns:w="urn:schemas-microsoft-com:office:word" xmlns="http://www.w3.org/TR/REC-html40">
<head>
<meta charset="UTF-8">
<title>Resume</title>
<style>
body { font-family: Arial, sans-serif; margin: 0; padding: 20px; line-height: 1.4; }
.print { width: 100%; max-width: 800px; margin: 0 auto; }
* { box-sizing: border-box; }
@page { margin: 0.5in; }
</style>
</head>
<body>
"#;

const SHELL_TAIL: &str = "\n</body>\n</html>\n";

/// Elements that only make sense on screen.
pub fn is_interactive(el: &Element) -> bool {
    el.tag == "button" || el.tag == "a" || el.has_class("no-print")
}

/// Builds the `.doc` payload from the `.print` node. The node itself is never modified.
pub fn build_word_document(print_node: &Element) -> String {
    let mut clone = print_node.clone();
    clone.remove_where(&is_interactive);
    format!("{SHELL_HEAD}{}{SHELL_TAIL}", clone.inner_html())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn print_node() -> Element {
        Element::new("div")
            .class("print")
            .child(Element::new("h2").text("Jane Doe"))
            .child(
                Element::new("div")
                    .class("no-print")
                    .child(Element::new("span").text("toolbar")),
            )
            .child(
                Element::new("p")
                    .text("Portfolio: ")
                    .child(Element::new("a").attr("href", "https://jane.dev").text("jane.dev")),
            )
            .child(Element::new("button").text("Download"))
    }

    #[test]
    fn test_strips_buttons_links_and_no_print() {
        let doc = build_word_document(&print_node());
        assert!(doc.contains("<h2>Jane Doe</h2>"));
        assert!(doc.contains("Portfolio: "));
        for banned in ["<button", "<a ", "no-print", "toolbar", "jane.dev"] {
            assert!(!doc.contains(banned), "found {banned}");
        }
    }

    #[test]
    fn test_source_node_is_untouched() {
        let node = print_node();
        let before = node.clone();
        let _ = build_word_document(&node);
        assert_eq!(node, before);
    }

    #[test]
    fn test_shell_carries_office_namespaces_and_page_margin() {
        let doc = build_word_document(&Element::new("div"));
        assert!(doc.starts_with("<html xmlns:o=\"urn:schemas-microsoft-com:office:office\""));
        assert!(doc.contains("<meta charset=\"UTF-8\">"));
        assert!(doc.contains("@page { margin: 0.5in; }"));
        assert!(doc.trim_end().ends_with("</html>"));
    }
}
