//! Shared test utilities for the whitebear test suite.
//!
//! Provides page builders that satisfy the bundled role schemas, fixture
//! setup, and lookup helpers over a loaded [`Session`].
//!
//! # Usage
//!
//! ```rust
//! use crate::test_helpers::*;
//!
//! let tmp = setup_fixtures();
//! write_page(tmp.path(), "otters.html", &article_page("Otters", &[]));
//! let session = load(tmp.path()).unwrap();
//!
//! let article = find_article(&session, "otters.html");
//! assert_eq!(article.title(), Some("Otters"));
//! assert_eq!(menu_names(&session), vec!["menu-animals.html", "menu-places.html"]);
//! ```

use std::fmt::Write as _;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

use crate::config::WhitebearConfig;
use crate::document::Document;
use crate::loader::{LoadError, Session, classify_directory};
use crate::schema::SchemaRegistry;

// =========================================================================
// Fixture setup
// =========================================================================

/// Copy `fixtures/site/` to a temp directory and return it.
///
/// Tests get an isolated copy they can mutate without affecting other tests
/// or the source fixtures.
pub fn setup_fixtures() -> TempDir {
    let tmp = TempDir::new().unwrap();
    let fixtures = Path::new(env!("CARGO_MANIFEST_DIR")).join("fixtures/site");
    copy_dir_recursive(&fixtures, tmp.path()).unwrap();
    tmp
}

fn copy_dir_recursive(src: &Path, dst: &Path) -> std::io::Result<()> {
    for entry in fs::read_dir(src)? {
        let entry = entry?;
        let src_path = entry.path();
        let dst_path = dst.join(entry.file_name());

        if src_path.is_dir() {
            fs::create_dir_all(&dst_path)?;
            copy_dir_recursive(&src_path, &dst_path)?;
        } else {
            fs::copy(&src_path, &dst_path)?;
        }
    }
    Ok(())
}

/// Write `html` to `dir/name` and return the path.
pub fn write_page(dir: &Path, name: &str, html: &str) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, html).unwrap();
    path
}

/// Classify `dir` with the bundled schemas and default config.
pub fn load(dir: &Path) -> Result<Session, LoadError> {
    let registry = SchemaRegistry::bundled().unwrap();
    classify_directory(&registry, &WhitebearConfig::default(), dir)
}

// =========================================================================
// Page builders: each satisfies exactly one bundled schema
// =========================================================================

fn page(title: &str, main: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html lang="en">
  <head>
    <meta charset="utf-8"/>
    <title>{title}</title>
    <meta name="description" content="{title} at White Bear"/>
  </head>
  <body>
    <div id="container">
      <header id="heading"><h2>White Bear</h2></header>
      <nav id="main-menu"><a href="index.html" title="Home">Home</a></nav>
{main}
      <footer id="footer"><p>&copy; White Bear</p></footer>
    </div>
  </body>
</html>
"#
    )
}

/// A front page with the news section.
pub fn index_page(title: &str) -> String {
    page(
        title,
        r#"      <section id="news"><p>Nothing new.</p></section>"#,
    )
}

/// An article. Each image is `(href, title, src, alt)`.
pub fn article_page(title: &str, images: &[(&str, &str, &str, &str)]) -> String {
    let mut main = format!(
        "      <article id=\"main-text\"><h1>{title}</h1><p>Text about {title}.</p></article>\n"
    );
    if !images.is_empty() {
        main.push_str("      <aside id=\"side-images\">\n");
        for (href, link_title, src, alt) in images {
            writeln!(
                main,
                r#"        <figure><a href="{href}" title="{link_title}"><img src="{src}" alt="{alt}"/></a></figure>"#
            )
            .unwrap();
        }
        main.push_str("      </aside>");
    }
    page(title, &main)
}

/// A menu linking to each of `hrefs`.
pub fn menu_page(title: &str, hrefs: &[&str]) -> String {
    let mut main = String::from("      <section id=\"menu-items\">\n");
    for href in hrefs {
        writeln!(
            main,
            r#"        <article class="menu-item"><a href="{href}" title="{href}">{href}</a></article>"#
        )
        .unwrap();
    }
    main.push_str("      </section>");
    page(title, &main)
}

// =========================================================================
// Session lookups: panic with a clear message on miss
// =========================================================================

/// Find an article by file name. Panics if not found.
pub fn find_article<'a>(session: &'a Session, filename: &str) -> &'a Document {
    session.articles().get(filename).unwrap_or_else(|| {
        let names = article_names(session);
        panic!("article '{filename}' not found. Available: {names:?}")
    })
}

/// Find a menu by file name. Panics if not found.
pub fn find_menu<'a>(session: &'a Session, filename: &str) -> &'a Document {
    session.menus().get(filename).unwrap_or_else(|| {
        let names = menu_names(session);
        panic!("menu '{filename}' not found. Available: {names:?}")
    })
}

/// All article file names in order.
pub fn article_names(session: &Session) -> Vec<&str> {
    session.articles().keys().map(String::as_str).collect()
}

/// All menu file names in order.
pub fn menu_names(session: &Session) -> Vec<&str> {
    session.menus().keys().map(String::as_str).collect()
}
