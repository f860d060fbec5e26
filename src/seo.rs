//! SEO self-checks for short text fields attached to media.
//!
//! Each field kind (an image's link title, its alt description) has a
//! [`FieldPolicy`]: an inclusive length range and the placeholder text that
//! is inserted when a new element is created. A value passes when its length
//! is within the range and it is not the untouched placeholder.
//!
//! Every rule is evaluated on every check; when several fail, the message of
//! the last failing rule is the one reported. Results are never cached: a
//! [`FieldRecord`] clears its message and status before each re-check, so a
//! flag can never outlive the edit that fixed it.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Message for a value left at its placeholder default.
pub const PLACEHOLDER_MESSAGE: &str = "Default value, please change it";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldKind {
    LinkTitle,
    ImageAlt,
}

impl FieldKind {
    pub fn label(self) -> &'static str {
        match self {
            FieldKind::LinkTitle => "Link title",
            FieldKind::ImageAlt => "Image alt",
        }
    }
}

impl fmt::Display for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Length bounds and placeholder for one field kind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FieldPolicy {
    /// Minimum length in characters, inclusive.
    pub min: usize,
    /// Maximum length in characters, inclusive.
    pub max: usize,
    /// Text a freshly created field starts with.
    pub placeholder: String,
}

impl FieldPolicy {
    pub fn default_link_title() -> Self {
        Self {
            min: 3,
            max: 100,
            placeholder: "Link title".to_string(),
        }
    }

    pub fn default_image_alt() -> Self {
        Self {
            min: 3,
            max: 125,
            placeholder: "Image description".to_string(),
        }
    }

    pub fn length_message(&self, kind: FieldKind) -> String {
        format!(
            "{} length must be between {} and {} characters",
            kind.label(),
            self.min,
            self.max
        )
    }

    /// Run every rule against `value`. Never fails; a bad value is a normal result.
    pub fn check(&self, kind: FieldKind, value: &str) -> FieldCheck {
        let mut check = FieldCheck::passed();

        let length = value.chars().count();
        if length < self.min || length > self.max {
            check.flag(self.length_message(kind));
        }

        if value == self.placeholder {
            check.flag(PLACEHOLDER_MESSAGE.to_string());
        }

        check
    }
}

/// Policies for every field kind, as configured under `[seo]`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SeoPolicies {
    pub link_title: FieldPolicy,
    pub image_alt: FieldPolicy,
}

impl Default for SeoPolicies {
    fn default() -> Self {
        Self {
            link_title: FieldPolicy::default_link_title(),
            image_alt: FieldPolicy::default_image_alt(),
        }
    }
}

impl SeoPolicies {
    pub fn policy(&self, kind: FieldKind) -> &FieldPolicy {
        match kind {
            FieldKind::LinkTitle => &self.link_title,
            FieldKind::ImageAlt => &self.image_alt,
        }
    }

    pub fn check(&self, kind: FieldKind, value: &str) -> FieldCheck {
        self.policy(kind).check(kind, value)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldStatus {
    Ok,
    Flagged,
}

/// Visual hint for the editor: attention colour versus neutral.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Indicator {
    #[default]
    Neutral,
    Attention,
}

/// Outcome of one check: pass/fail plus the message of the last failed rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldCheck {
    pub ok: bool,
    /// Empty when `ok`.
    pub message: String,
}

impl FieldCheck {
    fn passed() -> Self {
        Self {
            ok: true,
            message: String::new(),
        }
    }

    fn flag(&mut self, message: String) {
        self.ok = false;
        self.message = message;
    }

    pub fn status(&self) -> FieldStatus {
        if self.ok {
            FieldStatus::Ok
        } else {
            FieldStatus::Flagged
        }
    }

    pub fn indicator(&self) -> Indicator {
        if self.ok {
            Indicator::Neutral
        } else {
            Indicator::Attention
        }
    }
}

/// An editable field value with its derived message and status.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldRecord {
    kind: FieldKind,
    value: String,
    error_message: String,
    status: FieldStatus,
}

impl FieldRecord {
    /// A new, not yet checked record. Starts neutral.
    pub fn new(kind: FieldKind, value: impl Into<String>) -> Self {
        Self {
            kind,
            value: value.into(),
            error_message: String::new(),
            status: FieldStatus::Ok,
        }
    }

    pub fn kind(&self) -> FieldKind {
        self.kind
    }

    pub fn value(&self) -> &str {
        &self.value
    }

    pub fn error_message(&self) -> &str {
        &self.error_message
    }

    pub fn status(&self) -> FieldStatus {
        self.status
    }

    pub fn indicator(&self) -> Indicator {
        match self.status {
            FieldStatus::Ok => Indicator::Neutral,
            FieldStatus::Flagged => Indicator::Attention,
        }
    }

    /// Replace the value and re-check it.
    pub fn set_value(&mut self, value: impl Into<String>, policies: &SeoPolicies) -> bool {
        self.value = value.into();
        self.revalidate(policies)
    }

    /// Reset to neutral, then re-run every rule against the current value.
    pub fn revalidate(&mut self, policies: &SeoPolicies) -> bool {
        self.error_message.clear();
        self.status = FieldStatus::Ok;

        let check = policies.check(self.kind, &self.value);
        self.status = check.status();
        self.error_message = check.message;
        check.ok
    }
}
