//! CLI output formatting.
//!
//! # Information-First Display
//!
//! Output is **information-centric, not file-centric**. The primary display
//! for every document is its semantic identity (its `<title>` and positional
//! index) with the file name shown as secondary context via an indented
//! `Source:` line. Documents without a title fall back to the file name in
//! parentheses.
//!
//! # Output Format
//!
//! ## Check
//!
//! ```text
//! Index
//! 001 White Bear
//!     Source: index.html
//!
//! Articles
//! 001 Bears
//!     Source: bears.html
//! 002 Wolves
//!     Source: wolves.html
//!
//! Menus
//! 001 Animals
//!     Source: menu-animals.html
//!
//! Loaded 2 articles, 1 menu and the index page from site/
//! ```
//!
//! ## SEO
//!
//! ```text
//! 001 Bears
//!     001 bear.jpg
//!     002 polar.jpg (attention)
//!         Link title: Default value, please change it
//!
//! Checked 2 images in 1 article, 1 flagged
//! ```
//!
//! # Architecture
//!
//! Each report has a `format_*` function (returns `Vec<String>`) for
//! testability and a `print_*` wrapper that writes to stdout. Format
//! functions are pure: no I/O, no side effects.

use crate::document::Document;
use crate::loader::Session;
use crate::media::ArticleImage;
use crate::seo::Indicator;

// ============================================================================
// Shared display helpers
// ============================================================================

/// Format a 1-based positional index as 3-digit zero-padded.
fn format_index(pos: usize) -> String {
    format!("{:0>3}", pos)
}

/// Return indentation string: 4 spaces per depth level.
fn indent(depth: usize) -> String {
    "    ".repeat(depth)
}

/// Titled documents show the title, untitled ones the file name in parens.
///
/// ```text
/// 001 Bears            // titled
/// 001 (draft.html)     // untitled
/// ```
fn document_line(index: usize, title: Option<&str>, filename: &str) -> String {
    match title {
        Some(t) if !t.is_empty() => format!("{} {}", format_index(index), t),
        _ => format!("{} ({})", format_index(index), filename),
    }
}

/// `1 article`, `2 articles`.
fn count(n: usize, noun: &str) -> String {
    if n == 1 {
        format!("{} {}", n, noun)
    } else {
        format!("{} {}s", n, noun)
    }
}

fn document_section<'a>(
    lines: &mut Vec<String>,
    heading: &str,
    documents: impl Iterator<Item = &'a Document>,
) {
    lines.push(heading.to_string());
    let mut empty = true;
    for (i, doc) in documents.enumerate() {
        empty = false;
        lines.push(document_line(i + 1, doc.title(), doc.filename()));
        lines.push(format!("{}Source: {}", indent(1), doc.filename()));
    }
    if empty {
        lines.push(format!("{}(none)", indent(1)));
    }
}

// ============================================================================
// Check output
// ============================================================================

/// Format the inventory of a loaded web root.
pub fn format_session(session: &Session) -> Vec<String> {
    let mut lines = Vec::new();

    document_section(&mut lines, "Index", session.index().into_iter());
    lines.push(String::new());
    document_section(&mut lines, "Articles", session.articles().values());
    lines.push(String::new());
    document_section(&mut lines, "Menus", session.menus().values());
    lines.push(String::new());

    let index = if session.index().is_some() {
        "the index page"
    } else {
        "no index page"
    };
    lines.push(format!(
        "Loaded {}, {} and {} from {}",
        count(session.articles().len(), "article"),
        count(session.menus().len(), "menu"),
        index,
        session.directory().display()
    ));
    lines
}

/// Print the inventory to stdout.
pub fn print_session(session: &Session) {
    for line in format_session(session) {
        println!("{}", line);
    }
}

// ============================================================================
// SEO output
// ============================================================================

/// Format image SEO results per article.
///
/// Every image is listed; flagged images are marked and followed by the
/// message of each failing field.
pub fn format_seo_report(reports: &[(&Document, Vec<ArticleImage>)]) -> Vec<String> {
    let mut lines = Vec::new();
    let mut total = 0;
    let mut flagged = 0;

    for (i, (doc, images)) in reports.iter().enumerate() {
        lines.push(document_line(i + 1, doc.title(), doc.filename()));
        if images.is_empty() {
            lines.push(format!("{}(no images)", indent(1)));
        }
        for (j, image) in images.iter().enumerate() {
            total += 1;
            let marker = match image.indicator() {
                Indicator::Attention => {
                    flagged += 1;
                    " (attention)"
                }
                Indicator::Neutral => "",
            };
            lines.push(format!(
                "{}{} {}{}",
                indent(1),
                format_index(j + 1),
                image.original_filename(),
                marker
            ));
            for field in image.fields() {
                if !field.error_message().is_empty() {
                    lines.push(format!(
                        "{}{}: {}",
                        indent(2),
                        field.kind(),
                        field.error_message()
                    ));
                }
            }
        }
    }

    if !lines.is_empty() {
        lines.push(String::new());
    }
    lines.push(format!(
        "Checked {} in {}, {} flagged",
        count(total, "image"),
        count(reports.len(), "article"),
        flagged
    ));
    lines
}

/// Print the SEO report to stdout.
pub fn print_seo_report(reports: &[(&Document, Vec<ArticleImage>)]) {
    for line in format_seo_report(reports) {
        println!("{}", line);
    }
}
