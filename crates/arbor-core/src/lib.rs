//! Arbor Core - Data model and structural-integrity engine for neuron morphologies
//!
//! This crate provides the flat interchange representation of a morphology,
//! the validated immutable and editable views built on top of it, traversal,
//! soma geometry and the configurable warning policy.

pub mod enums;
pub mod error;
pub mod format;
pub mod mitochondria;
pub mod modifiers;
pub mod morphology;
pub mod mutable;
pub mod options;
pub mod point;
pub mod properties;
pub mod range;
pub mod soma;
pub mod traversal;
pub mod tree;
pub mod warnings;
pub mod writer;

pub use enums::{
    AnnotationType, CellFamily, IterType, LogLevel, SectionType, SomaType, VascularSectionType,
    Warning,
};
pub use error::{Error, RawDataError, Result, SomaError, WriterError};
pub use format::FileFormat;
pub use mitochondria::{MitoSection, Mitochondria};
pub use morphology::{Morphology, Section};
pub use mutable::{MutMorphology, MutSection, MutSoma};
pub use options::{BuildOptions, Modifier, Modifiers};
pub use point::{FloatType, Point};
pub use properties::{
    Annotation, CellLevel, FormatVersion, Marker, MitochondriaLevel, PointLevel,
    PostSynapticDensity, Properties, SectionLevel, SectionRecord, NO_PARENT,
};
pub use soma::Soma;
pub use traversal::{BreadthFirst, DepthFirst, Tree, Upstream};
pub use tree::SectionTree;
pub use warnings::{
    reset_warnings, set_ignored_warning, set_ignored_warnings, set_maximum_warnings,
    set_raise_warnings, Disposition, WarningHandler, WarningPolicy,
};
pub use writer::check_writable;

/// Version of this crate
pub fn version_string() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
