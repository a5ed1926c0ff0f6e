//! Flat interchange representation of a whole morphology
//!
//! [`Properties`] is what format readers produce and writers consume. Sections
//! are `(offset, parent)` records into one shared point-level store; the soma
//! occupies its own sub-range of that store, ahead of every section.

use crate::enums::{AnnotationType, CellFamily, SectionType, SomaType};
use crate::error::{RawDataError, Result};
use crate::point::{FloatType, Point};
use crate::range::{append_range, copy_span};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::Range;
use std::path::Path;

/// Parent id of a root section
pub const NO_PARENT: i32 = -1;

/// Store length as a 32-bit index, or an error once it no longer fits
pub(crate) fn checked_index(len: usize, what: &str) -> std::result::Result<u32, RawDataError> {
    u32::try_from(len).map_err(|_| {
        RawDataError::Inconsistent(format!("{} {} exceeds the 32-bit index range", what, len))
    })
}

/// One entry of the section-level store
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SectionRecord {
    /// Index of the section's first point in the point-level store
    pub offset: u32,
    /// Parent section id, or [`NO_PARENT`]
    pub parent: i32,
}

impl SectionRecord {
    pub fn new(offset: u32, parent: i32) -> Self {
        Self { offset, parent }
    }

    pub fn root(offset: u32) -> Self {
        Self::new(offset, NO_PARENT)
    }

    /// Parent id, `None` for the sentinel (and for any other negative value)
    pub fn parent_id(&self) -> Option<u32> {
        u32::try_from(self.parent).ok()
    }
}

/// Index-aligned points, diameters and optional perimeters
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PointLevel {
    pub points: Vec<Point>,
    pub diameters: Vec<FloatType>,
    /// Empty when not provided; never partially populated
    #[serde(default)]
    pub perimeters: Vec<FloatType>,
}

impl PointLevel {
    pub fn new(points: Vec<Point>, diameters: Vec<FloatType>) -> Self {
        Self {
            points,
            diameters,
            perimeters: Vec::new(),
        }
    }

    pub fn with_perimeters(mut self, perimeters: Vec<FloatType>) -> Self {
        self.perimeters = perimeters;
        self
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn has_perimeters(&self) -> bool {
        !self.perimeters.is_empty()
    }

    /// Independent copy of `[range.start, range.end)` of every array
    pub fn subrange(&self, range: Range<usize>) -> PointLevel {
        PointLevel {
            points: copy_span(&self.points, range.clone()),
            diameters: copy_span(&self.diameters, range.clone()),
            perimeters: copy_span(&self.perimeters, range),
        }
    }

    /// Append `other[offset..]` to every array
    pub fn append(&mut self, other: &PointLevel, offset: usize) {
        append_range(&mut self.points, &other.points, offset);
        append_range(&mut self.diameters, &other.diameters, offset);
        append_range(&mut self.perimeters, &other.perimeters, offset);
    }

    /// Keep only the points for which `keep(index)` holds, in every array
    pub fn retain_indices(&mut self, keep: impl Fn(usize) -> bool) {
        fn filter<T: Clone>(data: &mut Vec<T>, keep: &impl Fn(usize) -> bool) {
            let kept: Vec<T> = data
                .iter()
                .enumerate()
                .filter(|(i, _)| keep(*i))
                .map(|(_, v)| v.clone())
                .collect();
            *data = kept;
        }
        filter(&mut self.points, &keep);
        filter(&mut self.diameters, &keep);
        filter(&mut self.perimeters, &keep);
    }

    /// Check the index-alignment invariants
    pub fn validate(&self, what: &str) -> std::result::Result<(), RawDataError> {
        if self.points.len() != self.diameters.len() {
            return Err(RawDataError::Inconsistent(format!(
                "{} has {} points but {} diameters",
                what,
                self.points.len(),
                self.diameters.len()
            )));
        }
        if !self.perimeters.is_empty() && self.perimeters.len() != self.points.len() {
            return Err(RawDataError::Inconsistent(format!(
                "{} has {} points but {} perimeters",
                what,
                self.points.len(),
                self.perimeters.len()
            )));
        }
        if let Some(d) = self.diameters.iter().find(|d| !d.is_finite() || **d < 0.0) {
            return Err(RawDataError::Inconsistent(format!(
                "{} has an invalid diameter: {}",
                what, d
            )));
        }
        Ok(())
    }
}

/// Flat section tree: records plus one type per section
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SectionLevel {
    pub sections: Vec<SectionRecord>,
    pub section_types: Vec<SectionType>,
}

impl SectionLevel {
    pub fn len(&self) -> usize {
        self.sections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sections.is_empty()
    }
}

/// Format tag and version of the file a morphology came from
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormatVersion {
    pub format: String,
    pub major: u32,
    pub minor: u32,
}

impl FormatVersion {
    pub fn new(format: impl Into<String>, major: u32, minor: u32) -> Self {
        Self {
            format: format.into(),
            major,
            minor,
        }
    }
}

impl fmt::Display for FormatVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}.{}", self.format, self.major, self.minor)
    }
}

/// Cell-level fields
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CellLevel {
    #[serde(default)]
    pub family: CellFamily,
    #[serde(default)]
    pub soma_type: SomaType,
    #[serde(default)]
    pub version: FormatVersion,
}

/// A structural anomaly tied to a section and the points involved
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Annotation {
    pub kind: AnnotationType,
    pub section_id: u32,
    /// Line in the source file, when the reader knows it
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub line_number: Option<u32>,
    pub details: String,
    pub points: PointLevel,
}

/// Labeled auxiliary point set with no tree semantics
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Marker {
    pub label: String,
    pub section_id: i32,
    pub points: PointLevel,
}

/// Where a dendritic spine meets its parent neurite
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PostSynapticDensity {
    pub section_id: u32,
    pub segment_id: u32,
    /// Distance from the start of the segment
    pub offset: FloatType,
}

impl PostSynapticDensity {
    pub fn new(section_id: u32, segment_id: u32, offset: FloatType) -> Self {
        Self {
            section_id,
            segment_id,
            offset,
        }
    }
}

/// Mitochondria: a second tree whose points live along neurite sections
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MitochondriaLevel {
    pub sections: Vec<SectionRecord>,
    pub neurite_section_ids: Vec<u32>,
    /// Position along the neurite section, in `[0, 1]`
    pub relative_path_lengths: Vec<FloatType>,
    pub diameters: Vec<FloatType>,
}

impl MitochondriaLevel {
    pub fn is_empty(&self) -> bool {
        self.sections.is_empty()
    }

    pub fn point_count(&self) -> usize {
        self.neurite_section_ids.len()
    }

    pub fn validate(&self, neurite_sections: usize) -> std::result::Result<(), RawDataError> {
        let n = self.neurite_section_ids.len();
        if self.relative_path_lengths.len() != n || self.diameters.len() != n {
            return Err(RawDataError::Inconsistent(format!(
                "mitochondria have {} section ids, {} path lengths and {} diameters",
                n,
                self.relative_path_lengths.len(),
                self.diameters.len()
            )));
        }
        if let Some(id) = self
            .neurite_section_ids
            .iter()
            .find(|id| **id as usize >= neurite_sections)
        {
            return Err(RawDataError::Inconsistent(format!(
                "mitochondrion point references neurite section {}, but only {} exist",
                id, neurite_sections
            )));
        }
        if let Some(l) = self
            .relative_path_lengths
            .iter()
            .find(|l| !(0.0..=1.0).contains(*l))
        {
            return Err(RawDataError::Inconsistent(format!(
                "mitochondrion relative path length {} is outside [0, 1]",
                l
            )));
        }
        Ok(())
    }
}

/// The canonical aggregate exchanged with readers and writers
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Properties {
    #[serde(default)]
    pub cell: CellLevel,
    pub point_level: PointLevel,
    pub section_level: SectionLevel,
    #[serde(default)]
    pub soma_range: Range<usize>,
    #[serde(default)]
    pub annotations: Vec<Annotation>,
    #[serde(default)]
    pub markers: Vec<Marker>,
    #[serde(default)]
    pub mitochondria: MitochondriaLevel,
    /// Only meaningful for the spine family
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub post_synaptic_density: Vec<PostSynapticDensity>,
}

impl Properties {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn section_count(&self) -> usize {
        self.section_level.len()
    }

    pub fn has_soma(&self) -> bool {
        !self.soma_range.is_empty()
    }

    /// Replace the soma, keeping it at the front of the point store
    ///
    /// Section offsets are shifted by the change in soma size.
    pub fn set_soma(&mut self, soma_type: SomaType, soma: PointLevel) {
        let old = self.soma_range.clone();
        let mut level = soma;
        let keep_perimeters = self.point_level.has_perimeters() || level.has_perimeters();
        if keep_perimeters && !level.has_perimeters() {
            level.perimeters = vec![0.0; level.len()];
        }
        let mut rest = self.point_level.subrange(old.end..self.point_level.len());
        if keep_perimeters && !rest.has_perimeters() {
            rest.perimeters = vec![0.0; rest.len()];
        }
        let new_len = level.len();
        level.append(&rest, 0);
        self.point_level = level;

        let delta = new_len as i64 - old.len() as i64;
        for record in &mut self.section_level.sections {
            record.offset = (record.offset as i64 + delta).max(0) as u32;
        }
        self.soma_range = 0..new_len;
        self.cell.soma_type = soma_type;
    }

    /// Append a section's points to the store and record it
    ///
    /// The caller keeps perimeters consistent: either every section carries
    /// them or none does.
    pub fn push_section(
        &mut self,
        parent: i32,
        section_type: SectionType,
        points: &PointLevel,
    ) -> std::result::Result<u32, RawDataError> {
        let id = checked_index(self.section_level.len(), "section count")?;
        let offset = checked_index(self.point_level.len(), "point count")?;
        self.point_level.append(points, 0);
        self.section_level
            .sections
            .push(SectionRecord::new(offset, parent));
        self.section_level.section_types.push(section_type);
        Ok(id)
    }

    /// Copy of the soma's points
    pub fn soma_points(&self) -> PointLevel {
        self.point_level.subrange(self.soma_range.clone())
    }

    /// Check array-level invariants that do not need the tree
    pub fn validate(&self) -> std::result::Result<(), RawDataError> {
        self.point_level.validate("point store")?;
        if self.section_level.sections.len() != self.section_level.section_types.len() {
            return Err(RawDataError::Inconsistent(format!(
                "{} sections but {} section types",
                self.section_level.sections.len(),
                self.section_level.section_types.len()
            )));
        }
        if self.soma_range.start > self.soma_range.end || self.soma_range.end > self.point_level.len() {
            return Err(RawDataError::Inconsistent(format!(
                "soma range {:?} is outside the {} stored points",
                self.soma_range,
                self.point_level.len()
            )));
        }
        if let Some(first) = self.section_level.sections.first() {
            if self.soma_range.end > first.offset as usize && !self.soma_range.is_empty() {
                return Err(RawDataError::SectionBuilder(format!(
                    "soma range {:?} overlaps the first section, which starts at {}",
                    self.soma_range, first.offset
                )));
            }
        }
        if !self.mitochondria.is_empty() {
            self.mitochondria.validate(self.section_count())?;
        }
        self.validate_post_synaptic_density()?;
        Ok(())
    }

    fn validate_post_synaptic_density(&self) -> std::result::Result<(), RawDataError> {
        if self.post_synaptic_density.is_empty() {
            return Ok(());
        }
        if self.cell.family != CellFamily::Spine {
            return Err(RawDataError::Inconsistent(format!(
                "{} post-synaptic densities on a {:?} cell; only spines carry them",
                self.post_synaptic_density.len(),
                self.cell.family
            )));
        }
        for psd in &self.post_synaptic_density {
            if psd.section_id as usize >= self.section_count() {
                return Err(RawDataError::Inconsistent(format!(
                    "post-synaptic density references section {}, but only {} exist",
                    psd.section_id,
                    self.section_count()
                )));
            }
            if !psd.offset.is_finite() || psd.offset < 0.0 {
                return Err(RawDataError::Inconsistent(format!(
                    "post-synaptic density on section {} has an invalid offset: {}",
                    psd.section_id, psd.offset
                )));
            }
        }
        Ok(())
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        tracing::debug!("Loaded properties from {:?}", path.as_ref());
        Self::from_json(&content)
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        std::fs::write(path.as_ref(), self.to_json()?)?;
        Ok(())
    }
}
