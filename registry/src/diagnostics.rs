//! Recoverable problems found while loading, resolving or emitting.
//!
//! None of these stop the pipeline; they are collected next to the value they concern so callers
//! can inspect them instead of scraping log output.

use std::fmt;

use crate::error::SignatureError;
use crate::types::TypeDescriptor;
use crate::version::Version;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum SymbolKind {
    Enum,
    Command,
}

impl fmt::Display for SymbolKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Enum => f.write_str("enum"),
            Self::Command => f.write_str("command"),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Diagnostic {
    /// A `<proto>` could not be parsed; the whole command was dropped.
    UnparseableCommand { text: String, error: SignatureError },
    /// A `<param>` could not be parsed; its command was dropped.
    UnparseableParameter {
        command: String,
        text: String,
        error: SignatureError,
    },
    /// A `require` block names a symbol the registry does not define.
    SymbolNotFound {
        family: String,
        version: Version,
        kind: SymbolKind,
        name: String,
    },
    /// A `remove` block names a symbol that is not part of the package at that point.
    RemovedSymbolAbsent {
        family: String,
        version: Version,
        kind: SymbolKind,
        name: String,
    },
    /// A command uses a type the dialect cannot spell; the command was not emitted.
    UnsupportedType { command: String, ty: TypeDescriptor },
    /// An enum value that is not a literal the dialect accepts.
    UnsupportedEnumValue { name: String, value: String },
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnparseableCommand { text, error } => {
                write!(f, "unable to parse prototype {text:?}: {error}")
            }
            Self::UnparseableParameter {
                command,
                text,
                error,
            } => write!(
                f,
                "unable to parse parameter {text:?} of command {command}: {error}"
            ),
            Self::SymbolNotFound {
                family,
                version,
                kind,
                name,
            } => write!(f, "{family} {version}: required {kind} {name} not found"),
            Self::RemovedSymbolAbsent {
                family,
                version,
                kind,
                name,
            } => write!(f, "{family} {version}: removed {kind} {name} is not present"),
            Self::UnsupportedType { command, ty } => {
                write!(f, "command {command} skipped: no mapping for type `{ty}`")
            }
            Self::UnsupportedEnumValue { name, value } => {
                write!(f, "enum {name} skipped: value {value:?} is not a literal")
            }
        }
    }
}

/// Accumulates diagnostics, logging each one as it arrives.
#[derive(Clone, Debug, Default)]
pub struct Diagnostics(Vec<Diagnostic>);

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, diagnostic: Diagnostic) {
        tracing::warn!("{diagnostic}");
        self.0.push(diagnostic);
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Diagnostic> {
        self.0.iter()
    }

    pub fn into_vec(self) -> Vec<Diagnostic> {
        self.0
    }
}

impl Extend<Diagnostic> for Diagnostics {
    fn extend<T: IntoIterator<Item = Diagnostic>>(&mut self, iter: T) {
        for diagnostic in iter {
            self.push(diagnostic);
        }
    }
}

/// A value together with the recoverable problems met while producing it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Outcome<T> {
    pub value: T,
    pub diagnostics: Vec<Diagnostic>,
}

impl<T> Outcome<T> {
    pub fn new(value: T, diagnostics: Diagnostics) -> Self {
        Self {
            value,
            diagnostics: diagnostics.into_vec(),
        }
    }

    pub fn is_clean(&self) -> bool {
        self.diagnostics.is_empty()
    }
}
