//! Images embedded in articles.
//!
//! An article's side column holds linked images:
//!
//! ```html
//! <figure>
//!   <a href="images/bear.jpg" title="Brown bear fishing">
//!     <img src="images/thumbnails/bear.jpg" alt="Brown bear catching a salmon"/>
//!   </a>
//! </figure>
//! ```
//!
//! The link `title` and the image `alt` are the fields an author edits and
//! the ones search engines read, so each [`ArticleImage`] carries them as
//! [`FieldRecord`]s and can re-run the SEO checks on itself. The linked
//! original and the thumbnail are resolved against the web root and kept
//! only when they pass the access check.

use crate::access::check_accessible;
use crate::document::Document;
use crate::html::Element;
use crate::loader::{LoadError, read_page};
use crate::seo::{FieldKind, FieldRecord, Indicator, SeoPolicies};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone)]
pub struct ArticleImage {
    href: String,
    src: String,
    link_title: FieldRecord,
    alt: FieldRecord,
    original_path: Option<PathBuf>,
    thumbnail_path: Option<PathBuf>,
    indicator: Indicator,
}

impl ArticleImage {
    /// Build an unchecked image. Paths are resolved against `web_root`.
    pub fn new(href: &str, link_title: &str, src: &str, alt: &str, web_root: &Path) -> Self {
        Self {
            href: href.to_string(),
            src: src.to_string(),
            link_title: FieldRecord::new(FieldKind::LinkTitle, link_title),
            alt: FieldRecord::new(FieldKind::ImageAlt, alt),
            original_path: resolve_local(web_root, href),
            thumbnail_path: resolve_local(web_root, src),
            indicator: Indicator::Neutral,
        }
    }

    /// Target of the link, as written in the page.
    pub fn href(&self) -> &str {
        &self.href
    }

    /// Thumbnail source, as written in the page.
    pub fn src(&self) -> &str {
        &self.src
    }

    pub fn link_title(&self) -> &FieldRecord {
        &self.link_title
    }

    pub fn alt(&self) -> &FieldRecord {
        &self.alt
    }

    pub fn original_path(&self) -> Option<&Path> {
        self.original_path.as_deref()
    }

    pub fn thumbnail_path(&self) -> Option<&Path> {
        self.thumbnail_path.as_deref()
    }

    pub fn original_filename(&self) -> &str {
        file_part(&self.href)
    }

    pub fn thumbnail_filename(&self) -> &str {
        file_part(&self.src)
    }

    pub fn indicator(&self) -> Indicator {
        self.indicator
    }

    /// The two field records, link title first.
    pub fn fields(&self) -> [&FieldRecord; 2] {
        [&self.link_title, &self.alt]
    }

    /// Messages of the fields that failed the last check.
    pub fn messages(&self) -> Vec<&str> {
        self.fields()
            .into_iter()
            .map(FieldRecord::error_message)
            .filter(|m| !m.is_empty())
            .collect()
    }

    /// Clear every flag, then check both fields. Returns true when both pass.
    pub fn seo_test_self(&mut self, policies: &SeoPolicies) -> bool {
        self.indicator = Indicator::Neutral;
        let title_ok = self.link_title.revalidate(policies);
        let alt_ok = self.alt.revalidate(policies);
        if !(title_ok && alt_ok) {
            self.indicator = Indicator::Attention;
        }
        title_ok && alt_ok
    }

    pub fn set_link_title(&mut self, value: impl Into<String>, policies: &SeoPolicies) -> bool {
        self.link_title.set_value(value, policies);
        self.seo_test_self(policies)
    }

    pub fn set_alt(&mut self, value: impl Into<String>, policies: &SeoPolicies) -> bool {
        self.alt.set_value(value, policies);
        self.seo_test_self(policies)
    }
}

/// Every `<a href>` that wraps an `<img>`, in document order. Unchecked.
pub fn collect_images(root: &Element, web_root: &Path) -> Vec<ArticleImage> {
    root.descendants()
        .filter(|e| e.tag == "a")
        .filter_map(|link| {
            let href = link.attr("href")?;
            let img = link.children_named("img").next()?;
            Some(ArticleImage::new(
                href,
                link.attr("title").unwrap_or_default(),
                img.attr("src").unwrap_or_default(),
                img.attr("alt").unwrap_or_default(),
                web_root,
            ))
        })
        .collect()
}

/// Re-read `document` from disk and return its images, already checked.
pub fn article_images(
    document: &Document,
    policies: &SeoPolicies,
) -> Result<Vec<ArticleImage>, LoadError> {
    let path = document.full_path();
    check_accessible(path)?;
    let root = read_page(path)?;
    let web_root = path.parent().unwrap_or(Path::new("."));

    let mut images = collect_images(&root, web_root);
    for image in &mut images {
        if !image.seo_test_self(policies) {
            tracing::debug!(
                page = %document.filename(),
                image = %image.href(),
                "Image failed SEO checks"
            );
        }
    }
    Ok(images)
}

/// Local file behind a page-relative reference, if it exists and is accessible.
fn resolve_local(web_root: &Path, reference: &str) -> Option<PathBuf> {
    let reference = reference.split(['?', '#']).next().unwrap_or_default();
    if reference.is_empty() || reference.contains("://") || reference.starts_with("//") {
        return None;
    }
    if reference.starts_with("data:") || reference.starts_with("mailto:") {
        return None;
    }
    let path = web_root.join(reference.trim_start_matches('/'));
    match check_accessible(&path) {
        Ok(()) => Some(path),
        Err(err) => {
            tracing::debug!(error = %err, "Image file unavailable");
            None
        }
    }
}

fn file_part(reference: &str) -> &str {
    reference.rsplit('/').next().unwrap_or(reference)
}
