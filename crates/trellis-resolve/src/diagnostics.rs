//! Structured diagnostics collected during resolution

use crate::namespace::ComponentKey;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Severity level for diagnostics
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    Warning,
    Info,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Severity::Error => "error",
            Severity::Warning => "warning",
            Severity::Info => "info",
        };
        f.write_str(label)
    }
}

/// A non-fatal anomaly found while declaring or resolving attributes.
///
/// `owner` is the entity (or mixin, for declaration-time problems) the
/// diagnostic belongs to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Diagnostic {
    UnresolvedMixin {
        owner: String,
        mixin: String,
    },
    InvalidValueForType {
        owner: String,
        component: ComponentKey,
        property: String,
        value: String,
        expected: String,
        reason: String,
    },
    UnknownComponentType {
        owner: String,
        component: ComponentKey,
    },
    DuplicateSchema {
        name: String,
    },
    MalformedAttributeString {
        owner: String,
        attribute: String,
        input: String,
        reason: String,
    },
    UnknownProperty {
        owner: String,
        component: ComponentKey,
        property: String,
    },
}

impl Diagnostic {
    pub fn severity(&self) -> Severity {
        match self {
            Diagnostic::InvalidValueForType { .. }
            | Diagnostic::MalformedAttributeString { .. }
            | Diagnostic::DuplicateSchema { .. } => Severity::Error,
            Diagnostic::UnresolvedMixin { .. } | Diagnostic::UnknownProperty { .. } => {
                Severity::Warning
            }
            Diagnostic::UnknownComponentType { .. } => Severity::Info,
        }
    }

    /// The entity or mixin this diagnostic is about, if any
    pub fn owner(&self) -> Option<&str> {
        match self {
            Diagnostic::UnresolvedMixin { owner, .. }
            | Diagnostic::InvalidValueForType { owner, .. }
            | Diagnostic::UnknownComponentType { owner, .. }
            | Diagnostic::MalformedAttributeString { owner, .. }
            | Diagnostic::UnknownProperty { owner, .. } => Some(owner),
            Diagnostic::DuplicateSchema { .. } => None,
        }
    }

    /// Emit through `tracing` at a level matching the severity
    pub(crate) fn log(&self) {
        match self.severity() {
            Severity::Error | Severity::Warning => tracing::warn!("{}", self),
            Severity::Info => tracing::debug!("{}", self),
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Diagnostic::UnresolvedMixin { owner, mixin } => {
                write!(f, "{}: mixin '{}' is not registered", owner, mixin)
            }
            Diagnostic::InvalidValueForType {
                owner,
                component,
                property,
                value,
                expected,
                reason,
            } => write!(
                f,
                "{}: {}.{} = '{}' is not a valid {} ({}), using default",
                owner, component, property, value, expected, reason
            ),
            Diagnostic::UnknownComponentType { owner, component } => write!(
                f,
                "{}: component '{}' has no schema, passed through untyped",
                owner, component
            ),
            Diagnostic::DuplicateSchema { name } => {
                write!(f, "schema '{}' is already registered", name)
            }
            Diagnostic::MalformedAttributeString {
                owner,
                attribute,
                input,
                reason,
            } => write!(
                f,
                "{}: attribute '{}' = '{}' is malformed ({}), ignored",
                owner, attribute, input, reason
            ),
            Diagnostic::UnknownProperty {
                owner,
                component,
                property,
            } => write!(
                f,
                "{}: '{}' is not a property of {}, dropped",
                owner, property, component
            ),
        }
    }
}

/// A collection of diagnostics with severity counts
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Diagnostics {
    pub items: Vec<Diagnostic>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, diagnostic: Diagnostic) {
        self.items.push(diagnostic);
    }

    pub fn extend(&mut self, diagnostics: impl IntoIterator<Item = Diagnostic>) {
        self.items.extend(diagnostics);
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Diagnostic> {
        self.items.iter()
    }

    /// True if nothing of error severity was recorded
    pub fn is_valid(&self) -> bool {
        self.error_count() == 0
    }

    fn count(&self, severity: Severity) -> usize {
        self.items
            .iter()
            .filter(|d| d.severity() == severity)
            .count()
    }

    pub fn error_count(&self) -> usize {
        self.count(Severity::Error)
    }

    pub fn warning_count(&self) -> usize {
        self.count(Severity::Warning)
    }

    pub fn info_count(&self) -> usize {
        self.count(Severity::Info)
    }

    /// Get a human-readable summary
    pub fn summary(&self) -> String {
        let total = self.items.len();
        if total == 0 {
            return "No diagnostics.".to_string();
        }

        format!(
            "{} diagnostic(s): {} error(s), {} warning(s), {} info",
            total,
            self.error_count(),
            self.warning_count(),
            self.info_count(),
        )
    }
}

impl FromIterator<Diagnostic> for Diagnostics {
    fn from_iter<I: IntoIterator<Item = Diagnostic>>(iter: I) -> Self {
        Self {
            items: iter.into_iter().collect(),
        }
    }
}
