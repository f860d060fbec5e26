//! Web root loading and document classification.
//!
//! Turns a directory of HTML pages into a [`Session`]: every page classified
//! as an article, a menu or the index, or the whole load fails with a
//! [`LoadError`] naming the offending path.
//!
//! ## Web Root Layout
//!
//! ```text
//! site/
//! ├── whitebear.toml          # Optional configuration
//! ├── index.html              # Mandatory, must satisfy the index schema
//! ├── bears.html              # Article
//! ├── menu-animals.html       # Menu
//! ├── google0123abcd.html     # Search-engine verification, skipped
//! ├── 404.html                # Error page, skipped
//! └── images/                 # Not scanned (non-recursive)
//! ```
//!
//! ## Steps
//!
//! 1. **Directory gate**: the directory must be accessible and contain the
//!    index page, which must parse and satisfy the index schema.
//! 2. **Enumeration**: every regular file directly in the directory with the
//!    configured extension is access-checked, read and parsed.
//! 3. **Classification**: schemas are tried in [`Role::PRECEDENCE`] order and
//!    the first match decides the role.
//! 4. **Unmatched pages**: deny-listed names are skipped, anything else
//!    aborts the load.
//! 5. **Construction**: the menu table is built to completion and sealed
//!    before any article is created, so every article sees the full menu
//!    set of its own load and nothing else.
//!
//! Steps 2-4 run per file, sequentially or on the rayon pool when
//! `processing.parallel` is set. Either way the first error aborts the load;
//! in parallel mode which file's error wins is unspecified.

use crate::access::{AccessError, check_accessible};
use crate::config::{ClassificationConfig, WhitebearConfig};
use crate::document::{Document, MenuTable, Role};
use crate::html::{self, Element, ParseError};
use crate::schema::{SchemaRegistry, Violation};
use rayon::prelude::*;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;
use walkdir::WalkDir;

#[derive(Error, Debug)]
pub enum LoadError {
    #[error("Access error: {0}")]
    Access(#[from] AccessError),
    #[error("Missing index page: {} does not exist", .0.display())]
    MissingIndex(PathBuf),
    #[error(
        "Not a White Bear directory: {} fails the index schema ({})",
        .path.display(),
        join_violations(.violations)
    )]
    NotWhitebearDirectory {
        path: PathBuf,
        violations: Vec<Violation>,
    },
    #[error("Syntax error in {}: {source}", .path.display())]
    Syntax { path: PathBuf, source: ParseError },
    #[error(
        "Unrecognized file: {} matches no page schema (article: {})",
        .path.display(),
        join_violations(.violations)
    )]
    UnrecognizedFile {
        path: PathBuf,
        /// Why the page is not an article.
        violations: Vec<Violation>,
    },
}

impl LoadError {
    /// The directory or file the error is about.
    pub fn path(&self) -> &Path {
        match self {
            LoadError::Access(err) => err.path(),
            LoadError::MissingIndex(path)
            | LoadError::NotWhitebearDirectory { path, .. }
            | LoadError::Syntax { path, .. }
            | LoadError::UnrecognizedFile { path, .. } => path,
        }
    }
}

fn join_violations(violations: &[Violation]) -> String {
    violations
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// File name markers of pages that may match no schema without failing the load.
#[derive(Debug, Clone, Default)]
pub struct DenyList {
    markers: Vec<String>,
}

impl DenyList {
    pub fn new(markers: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            markers: markers.into_iter().map(Into::into).collect(),
        }
    }

    pub fn markers(&self) -> &[String] {
        &self.markers
    }

    /// Whether `filename` contains any marker.
    pub fn is_skipped(&self, filename: &str) -> bool {
        self.markers.iter().any(|m| filename.contains(m.as_str()))
    }
}

impl From<&ClassificationConfig> for DenyList {
    fn from(config: &ClassificationConfig) -> Self {
        Self::new(config.skip_markers.iter().cloned())
    }
}

/// The result of one successful load. Read-only once returned.
#[derive(Debug, Clone, Serialize)]
pub struct Session {
    directory: PathBuf,
    #[serde(skip_serializing_if = "Option::is_none")]
    index: Option<Document>,
    articles: BTreeMap<String, Document>,
    menus: Arc<MenuTable>,
}

impl Session {
    /// The directory path as it was supplied to the load.
    pub fn directory(&self) -> &Path {
        &self.directory
    }

    /// The page classified as the index, if any page was.
    ///
    /// The index file always satisfies the index schema, but with loose
    /// custom schemas an earlier role in the precedence order can claim it.
    pub fn index(&self) -> Option<&Document> {
        self.index.as_ref()
    }

    pub fn articles(&self) -> &BTreeMap<String, Document> {
        &self.articles
    }

    pub fn menus(&self) -> &MenuTable {
        &self.menus
    }

    /// The shared handle every article of this session points at.
    pub fn menu_table(&self) -> &Arc<MenuTable> {
        &self.menus
    }

    /// Total number of classified documents.
    pub fn len(&self) -> usize {
        self.articles.len() + self.menus.len() + usize::from(self.index.is_some())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// A page that passed steps 2-3, before its document is built.
#[derive(Debug)]
struct Classified {
    filename: String,
    full_path: PathBuf,
    role: Role,
    title: Option<String>,
}

/// Classify every page of `dir`. All or nothing.
pub fn classify_directory(
    registry: &SchemaRegistry,
    config: &WhitebearConfig,
    dir: &Path,
) -> Result<Session, LoadError> {
    let classification = &config.classification;

    // Step 1: directory gate
    check_accessible(dir)?;
    let index_path = dir.join(&classification.index_filename);
    if !index_path.is_file() {
        return Err(LoadError::MissingIndex(index_path));
    }
    check_accessible(&index_path)?;
    let index_root = read_page(&index_path)?;
    let violations = registry.violations(&index_root, Role::Index);
    if !violations.is_empty() {
        return Err(LoadError::NotWhitebearDirectory {
            path: index_path,
            violations,
        });
    }

    // Steps 2-4
    let paths = collect_pages(dir, &classification.extension)?;
    let deny = DenyList::from(classification);
    let classify = |path: &PathBuf| classify_page(registry, &deny, path.as_path());
    let outcomes: Vec<Option<Classified>> = if config.processing.parallel {
        paths.par_iter().map(classify).collect::<Result<_, _>>()?
    } else {
        paths.iter().map(classify).collect::<Result<_, _>>()?
    };

    // Step 5: menus first, then articles sharing the sealed table
    let mut menus = MenuTable::new();
    let mut article_pages = Vec::new();
    let mut index_pages = Vec::new();
    for page in outcomes.into_iter().flatten() {
        match page.role {
            Role::Menu => {
                let doc = Document::menu(page.filename.clone(), page.full_path, page.title);
                menus.insert(page.filename, doc);
            }
            Role::Article => article_pages.push(page),
            Role::Index => index_pages.push(page),
        }
    }
    let menus = Arc::new(menus);

    let articles: BTreeMap<String, Document> = article_pages
        .into_iter()
        .map(|page| {
            let doc = Document::article(
                page.filename.clone(),
                page.full_path,
                page.title,
                Arc::clone(&menus),
            );
            (page.filename, doc)
        })
        .collect();

    let index = select_index(index_pages, &classification.index_filename);

    tracing::info!(
        directory = %dir.display(),
        articles = articles.len(),
        menus = menus.len(),
        "Loaded web root"
    );

    Ok(Session {
        directory: dir.to_path_buf(),
        index,
        articles,
        menus,
    })
}

/// Regular files directly in `dir` with exactly `extension`, in name order.
///
/// Symlinks are followed, so a linked page is classified like any other and
/// a dangling link fails the load.
fn collect_pages(dir: &Path, extension: &str) -> Result<Vec<PathBuf>, LoadError> {
    let mut pages = Vec::new();
    for entry in WalkDir::new(dir)
        .min_depth(1)
        .max_depth(1)
        .follow_links(true)
        .sort_by_file_name()
    {
        let entry = entry.map_err(|err| {
            let path = err.path().unwrap_or(dir).to_path_buf();
            AccessError::from_io(&path, err.into())
        })?;
        let is_page = entry.file_type().is_file()
            && entry.path().extension().and_then(|e| e.to_str()) == Some(extension);
        if is_page {
            pages.push(entry.into_path());
        }
    }
    Ok(pages)
}

/// Steps 2-4 for one file. `Ok(None)` means skipped.
fn classify_page(
    registry: &SchemaRegistry,
    deny: &DenyList,
    path: &Path,
) -> Result<Option<Classified>, LoadError> {
    let filename = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();

    check_accessible(path)?;
    let root = read_page(path)?;

    let Some(role) = registry.classify(&root) else {
        if deny.is_skipped(&filename) {
            tracing::debug!(file = %path.display(), "Skipping deny-listed page");
            return Ok(None);
        }
        let violations = registry.violations(&root, Role::Article);
        tracing::debug!(file = %path.display(), ?violations, "Page matches no schema");
        return Err(LoadError::UnrecognizedFile {
            path: path.to_path_buf(),
            violations,
        });
    };

    let full_path = fs::canonicalize(path).map_err(|e| AccessError::from_io(path, e))?;
    tracing::debug!(file = %filename, %role, "Classified page");

    Ok(Some(Classified {
        filename,
        full_path,
        role,
        title: page_title(&root),
    }))
}

pub(crate) fn read_page(path: &Path) -> Result<Element, LoadError> {
    let bytes = fs::read(path).map_err(|e| AccessError::from_io(path, e))?;
    html::parse_bytes(&bytes).map_err(|source| LoadError::Syntax {
        path: path.to_path_buf(),
        source,
    })
}

fn page_title(root: &Element) -> Option<String> {
    root.children_named("head")
        .flat_map(|head| head.children_named("title"))
        .map(Element::text_content)
        .find(|t| !t.is_empty())
}

/// Keep one index document: the configured file name if present, else the
/// first by name.
fn select_index(mut pages: Vec<Classified>, preferred: &str) -> Option<Document> {
    if pages.is_empty() {
        return None;
    }
    let chosen = pages
        .iter()
        .position(|p| p.filename == preferred)
        .unwrap_or(0);
    let chosen = pages.remove(chosen);
    for ignored in &pages {
        tracing::warn!(
            file = %ignored.full_path.display(),
            index = %chosen.filename,
            "Ignoring additional index page"
        );
    }
    Some(Document::index(chosen.filename, chosen.full_path, chosen.title))
}

/// Holds the schema registry and the current session.
///
/// A load replaces the previous session wholesale; a failed load leaves no
/// session at all, but the directory it was asked for is still reported.
#[derive(Debug)]
pub struct DirectoryLoader {
    registry: Arc<SchemaRegistry>,
    config: WhitebearConfig,
    directory: Option<PathBuf>,
    session: Option<Session>,
}

impl DirectoryLoader {
    pub fn new(registry: Arc<SchemaRegistry>, config: WhitebearConfig) -> Self {
        Self {
            registry,
            config,
            directory: None,
            session: None,
        }
    }

    pub fn registry(&self) -> &Arc<SchemaRegistry> {
        &self.registry
    }

    pub fn config(&self) -> &WhitebearConfig {
        &self.config
    }

    pub fn load(&mut self, dir: &Path) -> Result<&Session, LoadError> {
        self.directory = Some(dir.to_path_buf());
        self.session = None;
        let session = classify_directory(&self.registry, &self.config, dir)?;
        Ok(self.session.insert(session))
    }

    pub fn session(&self) -> Option<&Session> {
        self.session.as_ref()
    }

    /// The directory passed to the latest [`load`](Self::load), whether or
    /// not it succeeded.
    pub fn directory(&self) -> Option<&Path> {
        self.directory.as_deref()
    }

    pub fn articles(&self) -> Option<&BTreeMap<String, Document>> {
        self.session.as_ref().map(Session::articles)
    }

    pub fn menus(&self) -> Option<&MenuTable> {
        self.session.as_ref().map(Session::menus)
    }

    pub fn index_page(&self) -> Option<&Document> {
        self.session.as_ref().and_then(Session::index)
    }
}
