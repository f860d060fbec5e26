//! Element tree parser for White Bear pages.
//!
//! Pages are hand-edited HTML, so they are parsed the way a browser would
//! ([`scraper`] on top of html5ever): unquoted and valueless attributes,
//! unclosed elements, raw `<script>`/`<style>` bodies and stray `&` are all
//! accepted, and the implied `html`, `head` and `body` elements are always
//! present. A plain-text file (a search-engine verification file, for
//! instance) therefore still produces a tree, with its text in `body`.
//!
//! Only bytes that are not UTF-8 and blank files are a [`ParseError`]. The
//! tree keeps what schema matching and media extraction need: tag,
//! attributes, children and the collapsed text of each element.

use scraper::{ElementRef, Html};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ParseError {
    #[error("invalid UTF-8: {0}")]
    Utf8(#[from] std::str::Utf8Error),
    #[error("document is empty")]
    Empty,
}

/// One element of a parsed page.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Element {
    pub tag: String,
    /// Attributes with lower-cased names. Order is not significant.
    pub attributes: Vec<(String, String)>,
    pub children: Vec<Element>,
    /// Text directly inside this element (not its children), whitespace collapsed.
    pub text: String,
}

impl Element {
    pub fn new(tag: &str) -> Self {
        Self {
            tag: tag.to_string(),
            ..Default::default()
        }
    }

    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    pub fn has_class(&self, class: &str) -> bool {
        self.attr("class")
            .is_some_and(|classes| classes.split_whitespace().any(|c| c == class))
    }

    /// Direct children with the given tag.
    pub fn children_named<'a>(&'a self, tag: &'a str) -> impl Iterator<Item = &'a Element> + 'a {
        self.children.iter().filter(move |c| c.tag == tag)
    }

    /// All descendants in document order, excluding `self`.
    pub fn descendants(&self) -> Descendants<'_> {
        Descendants {
            stack: self.children.iter().rev().collect(),
        }
    }

    /// First descendant with the given tag, in document order.
    pub fn find_first(&self, tag: &str) -> Option<&Element> {
        self.descendants().find(|e| e.tag == tag)
    }

    /// Text of this element and all of its descendants, space separated.
    pub fn text_content(&self) -> String {
        let mut parts: Vec<&str> = Vec::new();
        if !self.text.is_empty() {
            parts.push(&self.text);
        }
        for element in self.descendants() {
            if !element.text.is_empty() {
                parts.push(&element.text);
            }
        }
        parts.join(" ")
    }
}

/// Depth-first iterator returned by [`Element::descendants`].
pub struct Descendants<'a> {
    stack: Vec<&'a Element>,
}

impl<'a> Iterator for Descendants<'a> {
    type Item = &'a Element;

    fn next(&mut self) -> Option<Self::Item> {
        let next = self.stack.pop()?;
        self.stack.extend(next.children.iter().rev());
        Some(next)
    }
}

/// Parse raw file bytes. The bytes must be UTF-8; a leading BOM is ignored.
pub fn parse_bytes(bytes: &[u8]) -> Result<Element, ParseError> {
    let source = std::str::from_utf8(bytes)?;
    parse(source)
}

/// Parse a page into its root element, always `<html>`.
pub fn parse(source: &str) -> Result<Element, ParseError> {
    let source = source.strip_prefix('\u{feff}').unwrap_or(source);
    if source.trim().is_empty() {
        return Err(ParseError::Empty);
    }

    let document = Html::parse_document(source);
    if !document.errors.is_empty() {
        tracing::trace!(recovered = document.errors.len(), "Recovered from markup errors");
    }
    Ok(build(document.root_element()))
}

fn build(node: ElementRef<'_>) -> Element {
    let value = node.value();
    let mut element = Element::new(value.name());
    element.attributes = value
        .attrs()
        .map(|(name, val)| (name.to_string(), val.to_string()))
        .collect();

    let mut text = String::new();
    for child in node.children() {
        if let Some(child_element) = ElementRef::wrap(child) {
            element.children.push(build(child_element));
        } else if let Some(fragment) = child.value().as_text() {
            text.push_str(fragment);
        }
    }
    element.text = collapse_whitespace(&text);
    element
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn body(root: &Element) -> &Element {
        root.find_first("body").unwrap()
    }

    #[test]
    fn parses_nested_elements_and_attributes() {
        let root = parse(
            r#"<html lang="en"><body><div id="container" class="page wide"><p>Hi</p></div></body></html>"#,
        )
        .unwrap();

        assert_eq!(root.tag, "html");
        assert_eq!(root.attr("lang"), Some("en"));
        let div = root.find_first("div").unwrap();
        assert_eq!(div.attr("id"), Some("container"));
        assert!(div.has_class("wide"));
        assert!(!div.has_class("narrow"));
        assert_eq!(div.children[0].text, "Hi");
    }

    #[test]
    fn tag_names_are_lower_cased() {
        let root = parse("<HTML><Body><DIV ID=x></DIV></BODY></html>").unwrap();
        assert_eq!(root.tag, "html");
        let div = body(&root).children_named("div").next().unwrap();
        assert_eq!(div.attr("id"), Some("x"));
    }

    #[test]
    fn implied_head_and_body_are_added() {
        let root = parse("<!DOCTYPE html>\n<!-- generated -->\n<p>Loose</p>").unwrap();
        let tags: Vec<&str> = root.children.iter().map(|c| c.tag.as_str()).collect();
        assert_eq!(tags, vec!["head", "body"]);
        assert_eq!(body(&root).children[0].text, "Loose");
    }

    #[test]
    fn unclosed_void_elements_are_accepted() {
        let root = parse(
            r#"<html><head><meta charset="utf-8"><link rel="stylesheet" href="s.css"></head><body>a<br>b</body></html>"#,
        )
        .unwrap();
        let head = root.find_first("head").unwrap();
        assert_eq!(head.children.len(), 2);
        assert_eq!(head.children[0].attr("charset"), Some("utf-8"));
        assert!(head.children[1].children.is_empty());
        assert_eq!(body(&root).text, "ab");
    }

    #[test]
    fn self_closed_void_elements_are_accepted() {
        let root = parse(r#"<html><body><img src="a.jpg" alt="A"/></body></html>"#).unwrap();
        assert_eq!(root.find_first("img").unwrap().attr("alt"), Some("A"));
    }

    #[test]
    fn entities_decode_into_text() {
        let root = parse("<p>Fish &amp; chips&#33; &copy;</p>").unwrap();
        assert_eq!(root.find_first("p").unwrap().text, "Fish & chips! \u{a9}");
    }

    #[test]
    fn bare_ampersand_stays_literal() {
        let root = parse("<p>fish & chips &zz stuff</p>").unwrap();
        assert_eq!(
            root.find_first("p").unwrap().text,
            "fish & chips &zz stuff"
        );
    }

    #[test]
    fn attribute_entities_are_unescaped() {
        let root = parse(r#"<a title="Salt &amp; pepper"></a>"#).unwrap();
        assert_eq!(
            root.find_first("a").unwrap().attr("title"),
            Some("Salt & pepper")
        );
    }

    #[test]
    fn unquoted_and_valueless_attributes_are_accepted() {
        let root = parse(
            r#"<html><body><div id=main><script async src="a.js"></script></div></body></html>"#,
        )
        .unwrap();
        assert_eq!(root.find_first("div").unwrap().attr("id"), Some("main"));
        let script = root.find_first("script").unwrap();
        assert_eq!(script.attr("async"), Some(""));
        assert_eq!(script.attr("src"), Some("a.js"));
    }

    #[test]
    fn script_and_style_bodies_are_raw_text() {
        let root = parse(
            "<html><head><style>p > a { color: red }</style></head>\
             <body><script>if (1 < 2 && a) { b('</p>') }</script><p>after</p></body></html>",
        )
        .unwrap();
        assert_eq!(root.find_first("style").unwrap().text, "p > a { color: red }");
        assert!(root.find_first("script").unwrap().text.starts_with("if (1 < 2 && a)"));
        assert!(root.find_first("script").unwrap().children.is_empty());
        assert_eq!(root.find_first("p").unwrap().text, "after");
    }

    #[test]
    fn malformed_nesting_is_recovered() {
        let root = parse("<html><body><div><p>open</span></body></html>").unwrap();
        let div = root.find_first("div").unwrap();
        assert_eq!(div.children[0].tag, "p");
        assert_eq!(div.children[0].text, "open");
    }

    #[test]
    fn byte_order_mark_is_ignored() {
        let root = parse_bytes("\u{feff}<html><body><p>x</p></body></html>".as_bytes()).unwrap();
        assert_eq!(root.tag, "html");
        assert_eq!(root.find_first("p").unwrap().text, "x");
    }

    #[test]
    fn text_only_file_lands_in_body() {
        let root = parse("google-site-verification: google0123abcd.html\n").unwrap();
        assert_eq!(root.tag, "html");
        assert_eq!(
            body(&root).text,
            "google-site-verification: google0123abcd.html"
        );
        assert!(body(&root).children.is_empty());
    }

    #[test]
    fn empty_document_is_error() {
        assert!(matches!(parse(""), Err(ParseError::Empty)));
        assert!(matches!(parse("   \n\t"), Err(ParseError::Empty)));
        assert!(matches!(parse_bytes(b"\xef\xbb\xbf\n"), Err(ParseError::Empty)));
    }

    #[test]
    fn invalid_utf8_is_error() {
        let result = parse_bytes(&[b'<', b'p', b'>', 0xff, b'<', b'/', b'p', b'>']);
        assert!(matches!(result, Err(ParseError::Utf8(_))));
    }

    #[test]
    fn text_content_joins_descendants() {
        let root = parse("<h1>White <em>Bear</em></h1>").unwrap();
        assert_eq!(root.find_first("h1").unwrap().text_content(), "White Bear");
    }

    #[test]
    fn descendants_walk_in_document_order() {
        let root = parse("<div><b><i></i></b><span></span></div>").unwrap();
        let div = root.find_first("div").unwrap();
        let tags: Vec<&str> = div.descendants().map(|e| e.tag.as_str()).collect();
        assert_eq!(tags, vec!["b", "i", "span"]);
    }
}
