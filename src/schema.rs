//! Structural schemas for the three page roles.
//!
//! A schema is a small TOML document describing which elements a page of a
//! given role must (and must not) contain:
//!
//! ```toml
//! root = "html"
//!
//! [[require]]
//! path = "body/div#container/article#main-text"   # relative to the root
//! min = 1                                          # default 1
//! max = 1                                          # default unbounded
//! attributes = ["class"]                           # on every match
//!
//! [[forbid]]
//! path = "body/div#container/section#news"
//! ```
//!
//! Path segments select direct children and take the forms `tag`, `tag#id`,
//! `tag.class` and `tag[attr=value]`.
//!
//! Schemas are fetched by logical name (`index`, `article`, `menu`) through a
//! [`SchemaSource`]. The stock schemas are compiled into the binary; a web
//! root can point `[schemas] directory` at its own `schema_<name>.toml`
//! files instead. Loading is all-or-nothing: a [`SchemaRegistry`] exists only
//! if all three schemas were found and compiled.

use crate::config::SchemaConfig;
use crate::document::Role;
use crate::html::Element;
use serde::Deserialize;
use std::borrow::Cow;
use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SchemaError {
    #[error("Schema '{0}' not found")]
    Missing(String),
    #[error("Failed to read schema '{name}': {source}")]
    Read {
        name: String,
        source: std::io::Error,
    },
    #[error("Schema '{name}' is not valid TOML: {source}")]
    Toml {
        name: String,
        source: toml::de::Error,
    },
    #[error("Schema '{name}' is malformed: {reason}")]
    Malformed { name: String, reason: String },
}

/// Resolves a schema's logical name to its text.
pub trait SchemaSource {
    fn fetch(&self, name: &str) -> Result<Cow<'_, str>, SchemaError>;
}

/// The stock schemas shipped with the crate.
#[derive(Debug, Clone, Copy, Default)]
pub struct BundledSchemas;

impl SchemaSource for BundledSchemas {
    fn fetch(&self, name: &str) -> Result<Cow<'_, str>, SchemaError> {
        let text = match name {
            "index" => include_str!("../schemas/schema_index.toml"),
            "article" => include_str!("../schemas/schema_article.toml"),
            "menu" => include_str!("../schemas/schema_menu.toml"),
            _ => return Err(SchemaError::Missing(name.to_string())),
        };
        Ok(Cow::Borrowed(text))
    }
}

/// Reads `schema_<name>.toml` files from a directory.
#[derive(Debug, Clone)]
pub struct SchemaDirectory {
    dir: PathBuf,
}

impl SchemaDirectory {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn file_for(&self, name: &str) -> PathBuf {
        self.dir.join(format!("schema_{name}.toml"))
    }
}

impl SchemaSource for SchemaDirectory {
    fn fetch(&self, name: &str) -> Result<Cow<'_, str>, SchemaError> {
        match fs::read_to_string(self.file_for(name)) {
            Ok(text) => Ok(Cow::Owned(text)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(SchemaError::Missing(name.to_string()))
            }
            Err(source) => Err(SchemaError::Read {
                name: name.to_string(),
                source,
            }),
        }
    }
}

impl SchemaSource for BTreeMap<String, String> {
    fn fetch(&self, name: &str) -> Result<Cow<'_, str>, SchemaError> {
        self.get(name)
            .map(|text| Cow::Borrowed(text.as_str()))
            .ok_or_else(|| SchemaError::Missing(name.to_string()))
    }
}

// =============================================================================
// Schema file format
// =============================================================================

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct SchemaFile {
    root: String,
    #[serde(default)]
    require: Vec<RequireRule>,
    #[serde(default)]
    forbid: Vec<ForbidRule>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RequireRule {
    path: String,
    #[serde(default = "default_min")]
    min: usize,
    max: Option<usize>,
    #[serde(default)]
    attributes: Vec<String>,
}

fn default_min() -> usize {
    1
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct ForbidRule {
    path: String,
}

// =============================================================================
// Compiled paths
// =============================================================================

#[derive(Debug, Clone, PartialEq)]
enum Predicate {
    Id(String),
    Class(String),
    Attribute { name: String, value: String },
}

/// One path segment: a tag plus an optional predicate.
#[derive(Debug, Clone, PartialEq)]
struct Step {
    tag: String,
    predicate: Option<Predicate>,
}

impl Step {
    fn parse(segment: &str) -> Result<Self, String> {
        let (tag, predicate) = if let Some(open) = segment.find('[') {
            let inner = segment[open + 1..]
                .strip_suffix(']')
                .ok_or_else(|| format!("unterminated predicate in '{segment}'"))?;
            let (name, value) = inner
                .split_once('=')
                .ok_or_else(|| format!("predicate in '{segment}' must be attr=value"))?;
            let value = value.trim().trim_matches(|c| c == '"' || c == '\'');
            (
                &segment[..open],
                Some(Predicate::Attribute {
                    name: name.trim().to_ascii_lowercase(),
                    value: value.to_string(),
                }),
            )
        } else if let Some((tag, id)) = segment.split_once('#') {
            (tag, Some(Predicate::Id(id.to_string())))
        } else if let Some((tag, class)) = segment.split_once('.') {
            (tag, Some(Predicate::Class(class.to_string())))
        } else {
            (segment, None)
        };

        if tag.is_empty() || !tag.chars().all(|c| c.is_ascii_alphanumeric() || c == '-') {
            return Err(format!("invalid tag name in '{segment}'"));
        }
        let empty_predicate = match &predicate {
            Some(Predicate::Id(v)) | Some(Predicate::Class(v)) => v.is_empty(),
            Some(Predicate::Attribute { name, value }) => name.is_empty() || value.is_empty(),
            None => false,
        };
        if empty_predicate {
            return Err(format!("empty predicate in '{segment}'"));
        }

        Ok(Self {
            tag: tag.to_ascii_lowercase(),
            predicate,
        })
    }

    fn matches(&self, element: &Element) -> bool {
        if element.tag != self.tag {
            return false;
        }
        match &self.predicate {
            None => true,
            Some(Predicate::Id(id)) => element.attr("id") == Some(id.as_str()),
            Some(Predicate::Class(class)) => element.has_class(class),
            Some(Predicate::Attribute { name, value }) => {
                element.attr(name) == Some(value.as_str())
            }
        }
    }
}

#[derive(Debug, Clone)]
struct ElementPath {
    raw: String,
    steps: Vec<Step>,
}

impl ElementPath {
    fn parse(raw: &str) -> Result<Self, String> {
        let steps = raw
            .split('/')
            .map(Step::parse)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self {
            raw: raw.to_string(),
            steps,
        })
    }

    /// All elements reached by walking the steps down from `root`.
    fn select<'a>(&self, root: &'a Element) -> Vec<&'a Element> {
        let mut current = vec![root];
        for step in &self.steps {
            current = current
                .into_iter()
                .flat_map(|e| e.children.iter().filter(move |c| step.matches(c)))
                .collect();
            if current.is_empty() {
                break;
            }
        }
        current
    }
}

#[derive(Debug, Clone)]
struct Requirement {
    path: ElementPath,
    min: usize,
    max: Option<usize>,
    attributes: Vec<String>,
}

/// A single failed rule, kept as the diagnostic log of a validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Violation {
    Root { expected: String, found: String },
    TooFew { path: String, min: usize, found: usize },
    TooMany { path: String, max: usize, found: usize },
    MissingAttribute { path: String, attribute: String },
    Forbidden { path: String, found: usize },
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Violation::Root { expected, found } => {
                write!(f, "root element is <{found}>, expected <{expected}>")
            }
            Violation::TooFew { path, min, found } => {
                write!(f, "{path}: expected at least {min}, found {found}")
            }
            Violation::TooMany { path, max, found } => {
                write!(f, "{path}: expected at most {max}, found {found}")
            }
            Violation::MissingAttribute { path, attribute } => {
                write!(f, "{path}: missing attribute '{attribute}'")
            }
            Violation::Forbidden { path, found } => {
                write!(f, "{path}: not allowed, found {found}")
            }
        }
    }
}

/// A compiled structural schema.
#[derive(Debug, Clone)]
pub struct Schema {
    name: String,
    root: String,
    require: Vec<Requirement>,
    forbid: Vec<ElementPath>,
}

impl Schema {
    /// Compile schema text. `name` only labels errors and diagnostics.
    pub fn parse(name: &str, text: &str) -> Result<Self, SchemaError> {
        let malformed = |reason: String| SchemaError::Malformed {
            name: name.to_string(),
            reason,
        };

        let file: SchemaFile = toml::from_str(text).map_err(|source| SchemaError::Toml {
            name: name.to_string(),
            source,
        })?;

        let root = Step::parse(&file.root).map_err(malformed)?;
        if root.predicate.is_some() {
            return Err(malformed(format!("root '{}' cannot have a predicate", file.root)));
        }

        let mut require = Vec::with_capacity(file.require.len());
        for rule in file.require {
            if let Some(max) = rule.max
                && max < rule.min
            {
                return Err(malformed(format!(
                    "{}: max {} is below min {}",
                    rule.path, max, rule.min
                )));
            }
            require.push(Requirement {
                path: ElementPath::parse(&rule.path).map_err(malformed)?,
                min: rule.min,
                max: rule.max,
                attributes: rule
                    .attributes
                    .iter()
                    .map(|a| a.to_ascii_lowercase())
                    .collect(),
            });
        }

        let forbid = file
            .forbid
            .iter()
            .map(|rule| ElementPath::parse(&rule.path))
            .collect::<Result<Vec<_>, _>>()
            .map_err(malformed)?;

        Ok(Self {
            name: name.to_string(),
            root: root.tag,
            require,
            forbid,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Every rule the document breaks. Empty means the document conforms.
    pub fn violations(&self, document: &Element) -> Vec<Violation> {
        if document.tag != self.root {
            return vec![Violation::Root {
                expected: self.root.clone(),
                found: document.tag.clone(),
            }];
        }

        let mut violations = Vec::new();
        for rule in &self.require {
            let matched = rule.path.select(document);
            if matched.len() < rule.min {
                violations.push(Violation::TooFew {
                    path: rule.path.raw.clone(),
                    min: rule.min,
                    found: matched.len(),
                });
            }
            if let Some(max) = rule.max
                && matched.len() > max
            {
                violations.push(Violation::TooMany {
                    path: rule.path.raw.clone(),
                    max,
                    found: matched.len(),
                });
            }
            for attribute in &rule.attributes {
                if matched.iter().any(|e| e.attr(attribute).is_none()) {
                    violations.push(Violation::MissingAttribute {
                        path: rule.path.raw.clone(),
                        attribute: attribute.clone(),
                    });
                }
            }
        }
        for path in &self.forbid {
            let found = path.select(document).len();
            if found > 0 {
                violations.push(Violation::Forbidden {
                    path: path.raw.clone(),
                    found,
                });
            }
        }
        violations
    }

    pub fn matches(&self, document: &Element) -> bool {
        self.violations(document).is_empty()
    }
}

// =============================================================================
// Registry
// =============================================================================

/// The three role schemas, loaded once and read-only afterwards.
///
/// The registry is a plain value: share it between loaders with an `Arc`.
#[derive(Debug, Clone)]
pub struct SchemaRegistry {
    article: Schema,
    menu: Schema,
    index: Schema,
}

impl SchemaRegistry {
    /// Load and compile all three schemas, failing on the first problem.
    pub fn load(source: &impl SchemaSource) -> Result<Self, SchemaError> {
        let load = |role: Role| -> Result<Schema, SchemaError> {
            let name = role.schema_name();
            let text = source.fetch(name)?;
            let schema = Schema::parse(name, &text)?;
            tracing::debug!(schema = name, "Loaded schema");
            Ok(schema)
        };

        Ok(Self {
            article: load(Role::Article)?,
            menu: load(Role::Menu)?,
            index: load(Role::Index)?,
        })
    }

    pub fn bundled() -> Result<Self, SchemaError> {
        Self::load(&BundledSchemas)
    }

    /// Load from `[schemas] directory` if configured, else the bundled set.
    ///
    /// A relative directory is resolved against `base` (the web root).
    pub fn from_config(config: &SchemaConfig, base: &Path) -> Result<Self, SchemaError> {
        match &config.directory {
            Some(dir) => Self::load(&SchemaDirectory::new(base.join(dir))),
            None => Self::bundled(),
        }
    }

    pub fn schema(&self, role: Role) -> &Schema {
        match role {
            Role::Article => &self.article,
            Role::Menu => &self.menu,
            Role::Index => &self.index,
        }
    }

    /// Whether `document` satisfies the schema for `role`.
    pub fn validate(&self, document: &Element, role: Role) -> bool {
        self.schema(role).matches(document)
    }

    pub fn violations(&self, document: &Element, role: Role) -> Vec<Violation> {
        self.schema(role).violations(document)
    }

    /// The first role, in [`Role::PRECEDENCE`] order, whose schema matches.
    pub fn classify(&self, document: &Element) -> Option<Role> {
        Role::PRECEDENCE
            .into_iter()
            .find(|&role| self.validate(document, role))
    }
}
