//! Error types for Arbor Core

use crate::enums::{SomaType, Warning};
use thiserror::Error;

/// Result type alias using Arbor's Error
pub type Result<T> = std::result::Result<T, Error>;

/// Arbor error types
///
/// Structural errors always propagate. Warnings only show up here when the
/// active [`WarningHandler`](crate::warnings::WarningHandler) is configured to
/// raise them.
#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    RawData(#[from] RawDataError),

    #[error(transparent)]
    Soma(#[from] SomaError),

    #[error("Unknown file type: {0}")]
    UnknownFileType(String),

    #[error(transparent)]
    Writer(#[from] WriterError),

    #[error("Warning raised as error ({kind}): {message}")]
    Warning { kind: Warning, message: String },

    #[error("Section not found: {0}")]
    SectionNotFound(u32),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// The warning kind, when this error is an escalated warning
    pub fn warning_kind(&self) -> Option<Warning> {
        match self {
            Self::Warning { kind, .. } => Some(*kind),
            _ => None,
        }
    }
}

/// Parse and structure-level faults in the raw arrays
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RawDataError {
    #[error("Section {section} has parent id {parent}, which is not a known section")]
    IdSequence { section: u32, parent: i32 },

    #[error("Found {roots} disconnected trees and no soma to attach them to")]
    MultipleTrees { roots: usize },

    #[error("Section {section} references parent {parent}, which is not declared before it")]
    MissingParent { section: u32, parent: i32 },

    #[error("Section builder error: {0}")]
    SectionBuilder(String),

    #[error("Inconsistent raw data: {0}")]
    Inconsistent(String),
}

/// Soma geometry failures
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SomaError {
    #[error("{operation} is not implemented for soma type {soma_type}")]
    NotImplemented {
        operation: &'static str,
        soma_type: SomaType,
    },

    #[error("{operation} is not implemented for an undefined soma")]
    Undefined { operation: &'static str },

    #[error("{operation} needs at least one soma diameter")]
    Empty { operation: &'static str },
}

/// Export-side structural violations
#[derive(Error, Debug, Clone, PartialEq)]
pub enum WriterError {
    #[error("Perimeter data cannot be written to {format}")]
    PerimetersNotWritable { format: String },

    #[error("Soma type {soma_type} cannot be written to {format}")]
    UnsupportedSomaType { soma_type: SomaType, format: String },

    #[error("Section {section} is typed as soma and cannot be written as a neurite")]
    SomaTypedSection { section: u32 },
}
