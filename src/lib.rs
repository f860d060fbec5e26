//! # White Bear
//!
//! Loads the web root of a White Bear site: a flat directory of hand-edited
//! HTML pages. Every page is classified as the index, an article or a menu by
//! checking it against a structural schema for each role, and the result is
//! a read-only [`loader::Session`] an editor can work from.
//!
//! # Architecture: Two-Pass Classification
//!
//! ```text
//! 1. Gate      index.html  →  must satisfy the index schema
//! 2. Classify  *.html      →  (file, role, title) per page, or abort
//! 3. Build     menus first →  sealed Arc<MenuTable> → articles share it
//! ```
//!
//! Classification is all-or-nothing. The first page that cannot be accessed,
//! parsed or matched stops the load with a [`loader::LoadError`] naming it;
//! there is never a partially loaded session. Pages are classified before any
//! document is built, so articles only ever point at the complete menu set of
//! their own load.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`loader`] | Directory gate, page enumeration, classification, sessions |
//! | [`schema`] | TOML structural schemas and the role registry |
//! | [`html`] | Page parser producing an element tree |
//! | [`document`] | Immutable classified documents and roles |
//! | [`access`] | Read/write permission check run before every open |
//! | [`seo`] | Length and placeholder checks for editable text fields |
//! | [`media`] | Linked images in articles and their SEO self-check |
//! | [`config`] | `whitebear.toml` loading, validation and merging |
//! | [`output`] | CLI output formatting |
//!
//! # Design Decisions
//!
//! ## Role Precedence
//!
//! Schemas are tried in a fixed order: article, menu, index. The bundled
//! schemas are mutually exclusive, so for them the order never changes an
//! outcome, but custom schemas may overlap and the order is what keeps
//! classification deterministic.
//!
//! ## Schemas as Data
//!
//! A schema lists required and forbidden element paths with optional counts
//! and attributes. The stock schemas are compiled into the binary; a web root
//! may ship its own through `[schemas] directory`. The [`schema::SchemaRegistry`]
//! is an ordinary value passed to each load, so independent registries can
//! coexist.
//!
//! ## Checked Before Opened
//!
//! Every directory and page must be readable and writable before it is
//! parsed, even though loading never writes. Pages the editor could not save
//! fail the load up front rather than at save time.

pub mod access;
pub mod config;
pub mod document;
pub mod html;
pub mod loader;
pub mod media;
pub mod output;
pub mod schema;
pub mod seo;

#[cfg(test)]
pub(crate) mod test_helpers;
