//! Editable morphology
//!
//! Sections own their point buffers and are linked by id through parent and
//! children maps, so edits touch only the sections involved. Nothing here is
//! written back to a [`Properties`]: [`MutMorphology::to_properties`] flattens
//! the whole tree into a new one, renumbering sections in depth-first order.

use crate::enums::{SectionType, SomaType, Warning};
use crate::error::{Error, RawDataError, Result, SomaError};
use crate::morphology::{Morphology, Section};
use crate::options::BuildOptions;
use crate::point::{center_of_gravity, max_distance_to_center_of_gravity, FloatType, Point};
use crate::properties::{
    checked_index, Annotation, CellLevel, Marker, MitochondriaLevel, PointLevel,
    PostSynapticDensity, Properties, SectionRecord, NO_PARENT,
};
use crate::soma;
use crate::traversal::{DepthFirst, Tree};
use crate::warnings::WarningHandler;
use std::collections::{BTreeMap, HashMap};

/// Section with its own point data
#[derive(Debug, Clone, PartialEq)]
pub struct MutSection {
    id: u32,
    section_type: SectionType,
    pub(crate) points: PointLevel,
}

impl MutSection {
    pub fn id(&self) -> u32 {
        self.id
    }

    pub fn section_type(&self) -> SectionType {
        self.section_type
    }

    pub fn set_section_type(&mut self, section_type: SectionType) {
        self.section_type = section_type;
    }

    pub fn points(&self) -> &PointLevel {
        &self.points
    }

    /// Direct access to the buffers; the caller keeps them index-aligned
    pub fn points_mut(&mut self) -> &mut PointLevel {
        &mut self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    fn first_point(&self) -> Option<(Point, FloatType)> {
        Some((*self.points.points.first()?, *self.points.diameters.first()?))
    }

    fn last_point(&self) -> Option<(Point, FloatType)> {
        Some((*self.points.points.last()?, *self.points.diameters.last()?))
    }
}

/// Editable soma
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MutSoma {
    pub soma_type: SomaType,
    pub points: PointLevel,
}

impl MutSoma {
    pub fn new(soma_type: SomaType, points: PointLevel) -> Self {
        Self { soma_type, points }
    }

    pub fn center(&self) -> Point {
        center_of_gravity(&self.points.points)
    }

    pub fn surface(&self) -> std::result::Result<FloatType, SomaError> {
        soma::surface(self.soma_type, &self.points.points, &self.points.diameters)
    }

    pub fn volume(&self) -> std::result::Result<FloatType, SomaError> {
        soma::volume(self.soma_type, &self.points.diameters)
    }

    pub fn max_distance(&self) -> FloatType {
        max_distance_to_center_of_gravity(&self.points.points)
    }
}

/// Editable morphology
#[derive(Debug, Clone)]
pub struct MutMorphology {
    pub(crate) sections: BTreeMap<u32, MutSection>,
    pub(crate) parents: BTreeMap<u32, u32>,
    pub(crate) children: BTreeMap<u32, Vec<u32>>,
    pub(crate) roots: Vec<u32>,
    pub(crate) soma: MutSoma,
    cell: CellLevel,
    annotations: Vec<Annotation>,
    markers: Vec<Marker>,
    mitochondria: MitochondriaLevel,
    post_synaptic_density: Vec<PostSynapticDensity>,
    next_id: u32,
    handler: WarningHandler,
}

impl Default for MutMorphology {
    fn default() -> Self {
        Self::with_handler(WarningHandler::global())
    }
}

impl MutMorphology {
    /// Empty morphology reporting through the global warning handler
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_handler(handler: WarningHandler) -> Self {
        Self {
            sections: BTreeMap::new(),
            parents: BTreeMap::new(),
            children: BTreeMap::new(),
            roots: Vec::new(),
            soma: MutSoma::default(),
            cell: CellLevel::default(),
            annotations: Vec::new(),
            markers: Vec::new(),
            mitochondria: MitochondriaLevel::default(),
            post_synaptic_density: Vec::new(),
            next_id: 0,
            handler,
        }
    }

    /// Validate `properties` and copy them into an editable tree
    pub fn from_properties(properties: Properties, handler: WarningHandler) -> Result<Self> {
        let morphology = Morphology::with_options(properties, &BuildOptions::default(), &handler)?;
        Ok(Self::from_morphology_with(&morphology, handler))
    }

    pub fn from_morphology(morphology: &Morphology) -> Self {
        Self::from_morphology_with(morphology, WarningHandler::global())
    }

    /// Deep copy of every section; ids are preserved
    pub fn from_morphology_with(morphology: &Morphology, handler: WarningHandler) -> Self {
        let props = morphology.properties();
        let mut this = Self::with_handler(handler);

        for section in morphology.sections() {
            let id = section.id();
            this.sections.insert(
                id,
                MutSection {
                    id,
                    section_type: section.section_type(),
                    points: props.point_level.subrange(section.range()),
                },
            );
            if let Some(parent) = morphology.parent_of(id) {
                this.parents.insert(id, parent);
            }
            let children = morphology.children_of(id);
            if !children.is_empty() {
                this.children.insert(id, children.to_vec());
            }
        }
        this.roots = morphology.roots().to_vec();
        this.next_id = morphology.section_count() as u32;
        this.soma = MutSoma::new(props.cell.soma_type, props.soma_points());
        this.cell = props.cell.clone();
        this.annotations = props.annotations.clone();
        this.markers = props.markers.clone();
        this.mitochondria = props.mitochondria.clone();
        this.post_synaptic_density = props.post_synaptic_density.clone();
        this
    }

    pub fn handler(&self) -> &WarningHandler {
        &self.handler
    }

    pub fn cell(&self) -> &CellLevel {
        &self.cell
    }

    pub fn cell_mut(&mut self) -> &mut CellLevel {
        &mut self.cell
    }

    pub fn soma(&self) -> &MutSoma {
        &self.soma
    }

    pub fn soma_mut(&mut self) -> &mut MutSoma {
        &mut self.soma
    }

    pub fn annotations(&self) -> &[Annotation] {
        &self.annotations
    }

    pub fn markers(&self) -> &[Marker] {
        &self.markers
    }

    pub fn add_marker(&mut self, marker: Marker) {
        self.markers.push(marker);
    }

    pub fn post_synaptic_density(&self) -> &[PostSynapticDensity] {
        &self.post_synaptic_density
    }

    pub fn add_post_synaptic_density(&mut self, psd: PostSynapticDensity) {
        self.post_synaptic_density.push(psd);
    }

    pub fn mitochondria(&self) -> &MitochondriaLevel {
        &self.mitochondria
    }

    pub fn section_count(&self) -> usize {
        self.sections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sections.is_empty()
    }

    pub fn section(&self, id: u32) -> Result<&MutSection> {
        self.sections.get(&id).ok_or(Error::SectionNotFound(id))
    }

    pub fn section_mut(&mut self, id: u32) -> Result<&mut MutSection> {
        self.sections.get_mut(&id).ok_or(Error::SectionNotFound(id))
    }

    /// Sections in id order
    pub fn sections(&self) -> impl Iterator<Item = &MutSection> {
        self.sections.values()
    }

    pub fn root_sections(&self) -> Vec<&MutSection> {
        self.roots
            .iter()
            .filter_map(|id| self.sections.get(id))
            .collect()
    }

    pub fn parent(&self, id: u32) -> Result<Option<&MutSection>> {
        self.section(id)?;
        Ok(self.parents.get(&id).and_then(|p| self.sections.get(p)))
    }

    pub fn children(&self, id: u32) -> Result<Vec<&MutSection>> {
        self.section(id)?;
        Ok(self
            .children_of(id)
            .iter()
            .filter_map(|c| self.sections.get(c))
            .collect())
    }

    fn check_new_points(&self, points: &PointLevel) -> Result<()> {
        points
            .validate("appended section")
            .map_err(|e| RawDataError::SectionBuilder(e.to_string()))?;
        if points.is_empty() {
            self.handler.emit(
                Warning::AppendingEmptySection,
                "Appending a section with no points",
            )?;
        }
        Ok(())
    }

    fn insert(&mut self, section_type: SectionType, points: PointLevel) -> u32 {
        let id = self.next_id;
        self.next_id += 1;
        self.sections.insert(
            id,
            MutSection {
                id,
                section_type,
                points,
            },
        );
        id
    }

    /// Add a new root section
    pub fn append_root_section(&mut self, section_type: SectionType, points: PointLevel) -> Result<u32> {
        self.check_new_points(&points)?;
        let id = self.insert(section_type, points);
        self.roots.push(id);
        Ok(id)
    }

    /// Add a section as the last child of `parent`
    pub fn append_child_section(
        &mut self,
        parent: u32,
        section_type: SectionType,
        points: PointLevel,
    ) -> Result<u32> {
        let parent_section = self.section(parent)?;
        self.check_new_points(&points)?;

        if let (Some((last, last_diameter)), Some(first), Some(first_diameter)) = (
            parent_section.last_point(),
            points.points.first(),
            points.diameters.first(),
        ) {
            let last_perimeter = parent_section.points.perimeters.last();
            let first_perimeter = points.perimeters.first();
            if last != *first
                || last_diameter != *first_diameter
                || last_perimeter != first_perimeter
            {
                self.handler.emit(
                    Warning::WrongDuplicate,
                    format!(
                        "First point of the new child of section {} is {:?} (diameter {}), \
                         expected a duplicate of its last point {:?} (diameter {})",
                        parent, first, first_diameter, last, last_diameter
                    ),
                )?;
            }
        }

        let id = self.insert(section_type, points);
        self.parents.insert(id, parent);
        self.children.entry(parent).or_default().push(id);
        Ok(id)
    }

    /// Copy `section` (and its subtree when `recursive`) from an immutable morphology
    ///
    /// Returns the id of the copy of `section`.
    pub fn append_from_section(
        &mut self,
        parent: Option<u32>,
        section: Section<'_>,
        recursive: bool,
    ) -> Result<u32> {
        let points = PointLevel {
            points: section.points().to_vec(),
            diameters: section.diameters().to_vec(),
            perimeters: section.perimeters().to_vec(),
        };
        let id = match parent {
            Some(p) => self.append_child_section(p, section.section_type(), points)?,
            None => self.append_root_section(section.section_type(), points)?,
        };
        if recursive {
            for child in section.children() {
                self.append_from_section(Some(id), child, true)?;
            }
        }
        Ok(id)
    }

    fn check_no_mitochondria(&self, id: u32) -> Result<()> {
        if self.mitochondria.neurite_section_ids.contains(&id) {
            return Err(RawDataError::SectionBuilder(format!(
                "section {} carries mitochondria and cannot be removed",
                id
            ))
            .into());
        }
        Ok(())
    }

    /// Remove a section
    ///
    /// With `recursive`, its whole subtree goes too. Otherwise its children
    /// take its place under its parent (or among the roots).
    pub fn delete_section(&mut self, id: u32, recursive: bool) -> Result<()> {
        self.section(id)?;
        if recursive {
            let subtree: Vec<u32> = DepthFirst::new(&*self, id).collect();
            for sid in &subtree {
                self.check_no_mitochondria(*sid)?;
            }
            self.unlink(id);
            for sid in subtree {
                self.sections.remove(&sid);
                self.parents.remove(&sid);
                self.children.remove(&sid);
            }
            return Ok(());
        }

        self.check_no_mitochondria(id)?;
        let orphans = self.children.remove(&id).unwrap_or_default();
        let parent = self.parents.remove(&id);
        let siblings = match parent {
            Some(p) => self.children.entry(p).or_default(),
            None => &mut self.roots,
        };
        if let Some(position) = siblings.iter().position(|s| *s == id) {
            let tail = siblings.split_off(position + 1);
            siblings.pop();
            siblings.extend(orphans.iter().copied());
            siblings.extend(tail);
        }
        for orphan in orphans {
            match parent {
                Some(p) => self.parents.insert(orphan, p),
                None => self.parents.remove(&orphan),
            };
        }
        if let Some(p) = parent {
            if self.children.get(&p).is_some_and(Vec::is_empty) {
                self.children.remove(&p);
            }
        }
        self.sections.remove(&id);
        Ok(())
    }

    /// Remove `id` from its parent's children (or from the roots)
    fn unlink(&mut self, id: u32) {
        match self.parents.remove(&id) {
            Some(p) => {
                if let Some(siblings) = self.children.get_mut(&p) {
                    siblings.retain(|s| *s != id);
                    if siblings.is_empty() {
                        self.children.remove(&p);
                    }
                }
            }
            None => self.roots.retain(|r| *r != id),
        }
    }

    /// Cut the subtree at `id` loose and make it a new root
    pub fn detach_section(&mut self, id: u32) -> Result<()> {
        self.section(id)?;
        if self.is_root(id) {
            return Ok(());
        }
        self.unlink(id);
        self.roots.push(id);
        Ok(())
    }

    /// Fold the only child of `id` into it
    ///
    /// The child's points are appended to `id` (dropping its first point when
    /// it repeats the parent's last one) and its children are adopted.
    pub fn merge_with_only_child(&mut self, id: u32) -> Result<()> {
        self.section(id)?;
        let child = match self.children_of(id) {
            [child] => *child,
            other => {
                return Err(RawDataError::SectionBuilder(format!(
                    "section {} has {} children; merging needs exactly one",
                    id,
                    other.len()
                ))
                .into())
            }
        };
        self.check_no_mitochondria(child)?;

        let child_section = self.sections.remove(&child).ok_or(Error::SectionNotFound(child))?;
        let parent_section = self.section_mut(id)?;
        let skip = match (parent_section.last_point(), child_section.first_point()) {
            (Some((last, _)), Some((first, _))) if last == first => 1,
            _ => 0,
        };
        parent_section.points.append(&child_section.points, skip);

        self.parents.remove(&child);
        let grandchildren = self.children.remove(&child).unwrap_or_default();
        for g in &grandchildren {
            self.parents.insert(*g, id);
        }
        if grandchildren.is_empty() {
            self.children.remove(&id);
        } else {
            self.children.insert(id, grandchildren);
        }
        Ok(())
    }

    /// Merge every single-child chain into one section
    pub fn remove_unifurcations(&mut self) -> Result<()> {
        let order: Vec<u32> = DepthFirst::from_roots(&*self).collect();
        for id in order {
            if !self.sections.contains_key(&id) {
                continue;
            }
            while let [child] = self.children_of(id) {
                let child = *child;
                self.handler.emit(
                    Warning::OnlyChild,
                    format!("Section {} has a single child section {}; merging", id, child),
                )?;
                self.merge_with_only_child(id)?;
            }
        }
        Ok(())
    }

    /// Flatten into a new [`Properties`]
    ///
    /// Soma points come first. Sections are renumbered in depth-first order
    /// from the roots, in root order. Annotations, markers, mitochondria and
    /// post-synaptic densities follow the new ids; those on removed sections
    /// are dropped. Sections without points are left out and their children
    /// move up to the nearest written ancestor.
    pub fn to_properties(&self) -> Result<Properties> {
        let order: Vec<u32> = DepthFirst::from_roots(self).collect();
        let written = self.sections.values().filter(|s| !s.is_empty()).count();
        let with_perimeters = self.sections.values().filter(|s| s.points.has_perimeters()).count();
        if with_perimeters != 0 && with_perimeters != written {
            return Err(RawDataError::Inconsistent(format!(
                "{} of {} sections carry perimeters",
                with_perimeters, written
            ))
            .into());
        }

        let mut props = Properties::new();
        props.cell = self.cell.clone();
        props.cell.soma_type = self.soma.soma_type;

        let mut soma_points = self.soma.points.clone();
        if with_perimeters != 0 && !soma_points.has_perimeters() {
            soma_points.perimeters = vec![0.0; soma_points.len()];
        } else if with_perimeters == 0 && written > 0 {
            soma_points.perimeters.clear();
        }
        props.soma_range = 0..soma_points.len();
        props.point_level = soma_points;

        let mut id_map: HashMap<u32, u32> = HashMap::with_capacity(order.len());
        let mut skipped = 0usize;
        for old_id in &order {
            let section = self.section(*old_id)?;
            if section.is_empty() {
                skipped += 1;
                continue;
            }
            // empty ancestors are not written; attach to the nearest kept one
            let mut ancestor = self.parents.get(old_id).copied();
            let parent = loop {
                match ancestor {
                    Some(p) => match id_map.get(&p) {
                        Some(new_parent) => {
                            break i32::try_from(*new_parent).map_err(|_| {
                                RawDataError::Inconsistent(format!(
                                    "section id {} does not fit a parent field",
                                    new_parent
                                ))
                            })?
                        }
                        None => ancestor = self.parents.get(&p).copied(),
                    },
                    None => break NO_PARENT,
                }
            };
            let new_id = checked_index(props.section_level.len(), "section count")?;
            let offset = checked_index(props.point_level.len(), "point count")?;
            props.section_level.sections.push(SectionRecord::new(offset, parent));
            props.section_level.section_types.push(section.section_type);
            props.point_level.append(&section.points, 0);
            id_map.insert(*old_id, new_id);
        }
        if skipped > 0 {
            tracing::debug!("Skipped {} empty section(s) while flattening", skipped);
        }

        props.annotations = self
            .annotations
            .iter()
            .filter_map(|a| {
                let section_id = *id_map.get(&a.section_id)?;
                Some(Annotation {
                    section_id,
                    ..a.clone()
                })
            })
            .collect();
        props.markers = self
            .markers
            .iter()
            .filter_map(|m| {
                let section_id = match u32::try_from(m.section_id) {
                    Ok(id) => *id_map.get(&id)? as i32,
                    Err(_) => m.section_id,
                };
                Some(Marker {
                    section_id,
                    ..m.clone()
                })
            })
            .collect();
        props.post_synaptic_density = self
            .post_synaptic_density
            .iter()
            .filter_map(|psd| {
                let section_id = *id_map.get(&psd.section_id)?;
                Some(PostSynapticDensity { section_id, ..*psd })
            })
            .collect();
        props.mitochondria = self.mitochondria.clone();
        for nid in &mut props.mitochondria.neurite_section_ids {
            *nid = *id_map.get(nid).ok_or(Error::SectionNotFound(*nid))?;
        }

        tracing::debug!(
            "Flattened {} sections into {} points",
            props.section_count(),
            props.point_level.len()
        );
        Ok(props)
    }

    /// Flatten and validate into an immutable morphology
    pub fn build(&self) -> Result<Morphology> {
        Morphology::with_options(self.to_properties()?, &BuildOptions::default(), &self.handler)
    }
}

impl Tree for MutMorphology {
    fn node_count(&self) -> usize {
        self.sections.len()
    }

    fn roots(&self) -> &[u32] {
        &self.roots
    }

    fn parent_of(&self, id: u32) -> Option<u32> {
        self.parents.get(&id).copied()
    }

    fn children_of(&self, id: u32) -> &[u32] {
        self.children.get(&id).map(Vec::as_slice).unwrap_or(&[])
    }
}
