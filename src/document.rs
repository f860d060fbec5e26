//! The classified document model.
//!
//! A [`Document`] is created once per file that satisfied one of the role
//! schemas and never changes afterwards: the fields are private and only
//! exposed through read accessors. Articles additionally carry a shared,
//! read-only handle to the complete menu table of the same load, so an
//! editor can offer every menu as a navigation target.

use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Menus of one load session, keyed by file name.
pub type MenuTable = BTreeMap<String, Document>;

/// What a page is, decided by the first schema it satisfies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Article,
    Menu,
    Index,
}

impl Role {
    /// Order in which schemas are tried. The first match decides the role.
    pub const PRECEDENCE: [Role; 3] = [Role::Article, Role::Menu, Role::Index];

    /// Logical name of the schema describing this role.
    pub fn schema_name(self) -> &'static str {
        match self {
            Role::Article => "article",
            Role::Menu => "menu",
            Role::Index => "index",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.schema_name())
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Document {
    filename: String,
    full_path: PathBuf,
    role: Role,
    #[serde(skip_serializing_if = "Option::is_none")]
    title: Option<String>,
    #[serde(skip)]
    menus: Option<Arc<MenuTable>>,
}

impl Document {
    pub(crate) fn article(
        filename: String,
        full_path: PathBuf,
        title: Option<String>,
        menus: Arc<MenuTable>,
    ) -> Self {
        Self {
            filename,
            full_path,
            role: Role::Article,
            title,
            menus: Some(menus),
        }
    }

    pub(crate) fn menu(filename: String, full_path: PathBuf, title: Option<String>) -> Self {
        Self {
            filename,
            full_path,
            role: Role::Menu,
            title,
            menus: None,
        }
    }

    pub(crate) fn index(filename: String, full_path: PathBuf, title: Option<String>) -> Self {
        Self {
            filename,
            full_path,
            role: Role::Index,
            title,
            menus: None,
        }
    }

    /// Base name on disk, unique within its role collection.
    pub fn filename(&self) -> &str {
        &self.filename
    }

    /// Canonical absolute path.
    pub fn full_path(&self) -> &Path {
        &self.full_path
    }

    pub fn role(&self) -> Role {
        self.role
    }

    /// Text of the page's `<title>`, if it has one.
    pub fn title(&self) -> Option<&str> {
        self.title.as_deref()
    }

    /// Menus available for cross-linking. `Some` for articles only.
    pub fn menus(&self) -> Option<&MenuTable> {
        self.menus.as_deref()
    }

    /// The shared menu table handle, for identity comparisons.
    pub fn menu_table(&self) -> Option<&Arc<MenuTable>> {
        self.menus.as_ref()
    }
}

impl fmt::Display for Document {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} document {} ({})",
            self.role,
            self.filename,
            self.full_path.display()
        )
    }
}
