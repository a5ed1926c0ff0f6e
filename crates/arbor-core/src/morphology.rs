//! Immutable, array-backed morphology
//!
//! A [`Morphology`] shares its [`Properties`] behind an `Arc`; cloning it is
//! cheap. [`Section`] handles borrow the morphology they come from, so they
//! can never outlive the arrays they index into.

use crate::enums::{AnnotationType, CellFamily, IterType, SectionType, SomaType, Warning};
use crate::error::{Error, Result};
use crate::mitochondria::{self, Mitochondria};
use crate::mutable::MutMorphology;
use crate::options::BuildOptions;
use crate::point::{path_length, FloatType, Point};
use crate::properties::{Annotation, FormatVersion, Marker, PostSynapticDensity, Properties};
use crate::range::span;
use crate::soma::{self, Soma};
use crate::traversal::{self, BreadthFirst, DepthFirst, Tree, Upstream};
use crate::tree::{SectionTree, TreeBuilder};
use crate::warnings::{WarningHandler, WarningPolicy};
use std::ops::Range;
use std::sync::Arc;

/// Read-only morphology over validated flat arrays
#[derive(Debug, Clone)]
pub struct Morphology {
    properties: Arc<Properties>,
    tree: Arc<SectionTree>,
    mito_tree: Arc<SectionTree>,
}

impl Morphology {
    /// Build with default options, reporting through the global warning handler
    pub fn new(properties: Properties) -> Result<Self> {
        Self::with_options(properties, &BuildOptions::default(), &WarningHandler::global())
    }

    /// Build, apply any modifiers, and report through `handler`
    ///
    /// Modifiers are applied on a mutable copy, which is then flattened and
    /// validated again.
    pub fn with_options(
        properties: Properties,
        options: &BuildOptions,
        handler: &WarningHandler,
    ) -> Result<Self> {
        if options.modifiers.is_empty() {
            return Self::build(properties, options, handler);
        }

        let plain = BuildOptions {
            modifiers: Default::default(),
            ..options.clone()
        };
        let morphology = Self::build(properties, &plain, handler)?;
        let mut editable = MutMorphology::from_morphology_with(&morphology, handler.clone());
        editable.apply_modifiers(options.modifiers)?;
        let flattened = editable.to_properties()?;

        // Anomalies were already reported on the first pass.
        let quiet = WarningHandler::new(WarningPolicy::silent());
        Self::build(flattened, &plain, &quiet)
    }

    fn build(mut properties: Properties, options: &BuildOptions, handler: &WarningHandler) -> Result<Self> {
        properties.validate()?;

        let tree = TreeBuilder::new(options, handler)
            .anchored(properties.has_soma())
            .build(&properties.section_level.sections, properties.point_level.len())?;

        if properties.has_soma() {
            soma::check_conformity(properties.cell.soma_type, properties.soma_range.len(), handler)?;
        } else if !tree.is_empty() {
            handler.emit(Warning::NoSomaFound, "No soma found in the morphology")?;
        }

        let found = Self::check_sections(&properties, &tree, handler)?;
        for annotation in found {
            let known = properties
                .annotations
                .iter()
                .any(|a| a.kind == annotation.kind && a.section_id == annotation.section_id);
            if !known {
                properties.annotations.push(annotation);
            }
        }

        let mito_tree = mitochondria::build_tree(&properties.mitochondria, handler)?;

        tracing::debug!(
            "Built morphology: {} sections, {} soma points, {} mitochondrion sections",
            tree.len(),
            properties.soma_range.len(),
            mito_tree.len()
        );

        Ok(Self {
            properties: Arc::new(properties),
            tree: Arc::new(tree),
            mito_tree: Arc::new(mito_tree),
        })
    }

    /// Per-section anomalies: zero diameters and single children
    fn check_sections(
        properties: &Properties,
        tree: &SectionTree,
        handler: &WarningHandler,
    ) -> Result<Vec<Annotation>> {
        let mut annotations = Vec::new();
        for id in 0..tree.len() as u32 {
            let range = tree.range(id).unwrap_or(0..0);
            if span(&properties.point_level.diameters, range.clone())
                .iter()
                .any(|d| *d == 0.0)
            {
                handler.emit(
                    Warning::ZeroDiameter,
                    format!("Section {} has a point with zero diameter", id),
                )?;
            }

            if let [child] = tree.children_of(id) {
                let details = format!("Section {} has a single child section {}", id, child);
                handler.emit(Warning::OnlyChild, details.clone())?;
                annotations.push(Annotation {
                    kind: AnnotationType::SingleChild,
                    section_id: id,
                    line_number: None,
                    details,
                    points: properties.point_level.subrange(range),
                });
            }
        }
        Ok(annotations)
    }

    pub fn properties(&self) -> &Properties {
        &self.properties
    }

    pub fn tree(&self) -> &SectionTree {
        &self.tree
    }

    pub fn cell_family(&self) -> CellFamily {
        self.properties.cell.family
    }

    pub fn soma_type(&self) -> SomaType {
        self.properties.cell.soma_type
    }

    pub fn version(&self) -> &FormatVersion {
        &self.properties.cell.version
    }

    pub fn soma(&self) -> Soma<'_> {
        let level = &self.properties.point_level;
        let range = self.properties.soma_range.clone();
        Soma::new(
            self.soma_type(),
            span(&level.points, range.clone()),
            span(&level.diameters, range),
        )
    }

    fn neurite_range(&self) -> Range<usize> {
        match self.properties.section_level.sections.first() {
            Some(first) => first.offset as usize..self.properties.point_level.len(),
            None => 0..0,
        }
    }

    /// Points of every section, in section order
    pub fn points(&self) -> &[Point] {
        span(&self.properties.point_level.points, self.neurite_range())
    }

    pub fn diameters(&self) -> &[FloatType] {
        span(&self.properties.point_level.diameters, self.neurite_range())
    }

    /// Empty when the morphology has no perimeter data
    pub fn perimeters(&self) -> &[FloatType] {
        span(&self.properties.point_level.perimeters, self.neurite_range())
    }

    pub fn section_types(&self) -> &[SectionType] {
        &self.properties.section_level.section_types
    }

    pub fn annotations(&self) -> &[Annotation] {
        &self.properties.annotations
    }

    pub fn markers(&self) -> &[Marker] {
        &self.properties.markers
    }

    /// Post-synaptic densities of a spine morphology
    pub fn post_synaptic_density(&self) -> &[PostSynapticDensity] {
        &self.properties.post_synaptic_density
    }

    pub fn mitochondria(&self) -> Mitochondria<'_> {
        Mitochondria::new(&self.properties.mitochondria, &self.mito_tree)
    }

    pub fn section_count(&self) -> usize {
        self.tree.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tree.is_empty()
    }

    /// Bounds-checked section lookup
    pub fn section(&self, id: u32) -> Result<Section<'_>> {
        let range = self.tree.range(id).ok_or(Error::SectionNotFound(id))?;
        Ok(Section {
            id,
            start: range.start,
            end: range.end,
            morphology: self,
        })
    }

    fn handle(&self, id: u32) -> Section<'_> {
        let range = self.tree.range(id).unwrap_or(0..0);
        Section {
            id,
            start: range.start,
            end: range.end,
            morphology: self,
        }
    }

    /// Every section in id order
    pub fn sections(&self) -> impl Iterator<Item = Section<'_>> + '_ {
        (0..self.tree.len() as u32).map(move |id| self.handle(id))
    }

    pub fn root_sections(&self) -> Vec<Section<'_>> {
        self.tree.roots().iter().map(|id| self.handle(*id)).collect()
    }

    /// All sections, root by root, in preorder
    pub fn depth_first(&self) -> impl Iterator<Item = Section<'_>> + '_ {
        DepthFirst::from_roots(&*self.tree).map(move |id| self.handle(id))
    }

    /// All sections in level order, roots first
    pub fn breadth_first(&self) -> impl Iterator<Item = Section<'_>> + '_ {
        BreadthFirst::from_roots(&*self.tree).map(move |id| self.handle(id))
    }

    /// From section `id` up to its root
    pub fn upstream(&self, id: u32) -> Result<impl Iterator<Item = Section<'_>> + '_> {
        self.section(id)?;
        Ok(Upstream::new(&*self.tree, id).map(move |id| self.handle(id)))
    }

    /// Editable deep copy
    pub fn to_mutable(&self) -> MutMorphology {
        MutMorphology::from_morphology(self)
    }
}

impl Tree for Morphology {
    fn node_count(&self) -> usize {
        self.tree.node_count()
    }

    fn roots(&self) -> &[u32] {
        self.tree.roots()
    }

    fn parent_of(&self, id: u32) -> Option<u32> {
        self.tree.parent_of(id)
    }

    fn children_of(&self, id: u32) -> &[u32] {
        self.tree.children_of(id)
    }
}

/// Cheap handle on one section of a [`Morphology`]
#[derive(Debug, Clone, Copy)]
pub struct Section<'a> {
    id: u32,
    start: usize,
    end: usize,
    morphology: &'a Morphology,
}

impl PartialEq for Section<'_> {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
            && Arc::ptr_eq(&self.morphology.properties, &other.morphology.properties)
    }
}

impl<'a> Section<'a> {
    pub fn id(&self) -> u32 {
        self.id
    }

    pub fn section_type(&self) -> SectionType {
        self.morphology
            .section_types()
            .get(self.id as usize)
            .copied()
            .unwrap_or_default()
    }

    /// Point range in the morphology's store
    pub fn range(&self) -> Range<usize> {
        self.start..self.end
    }

    pub fn points(&self) -> &'a [Point] {
        span(&self.morphology.properties.point_level.points, self.range())
    }

    pub fn diameters(&self) -> &'a [FloatType] {
        span(&self.morphology.properties.point_level.diameters, self.range())
    }

    pub fn perimeters(&self) -> &'a [FloatType] {
        span(&self.morphology.properties.point_level.perimeters, self.range())
    }

    pub fn is_root(&self) -> bool {
        self.morphology.tree.is_root(self.id)
    }

    pub fn parent(&self) -> Option<Section<'a>> {
        let morphology = self.morphology;
        morphology
            .tree
            .parent_of(self.id)
            .map(|id| morphology.handle(id))
    }

    pub fn children(&self) -> Vec<Section<'a>> {
        let morphology = self.morphology;
        morphology
            .tree
            .children_of(self.id)
            .iter()
            .map(|id| morphology.handle(*id))
            .collect()
    }

    /// Path length along the section's points
    pub fn length(&self) -> FloatType {
        path_length(self.points())
    }

    /// Traverse from this section in the given order
    pub fn iter(&self, order: IterType) -> impl Iterator<Item = Section<'a>> + 'a {
        let morphology = self.morphology;
        traversal::iter(&*morphology.tree, self.id, order).map(move |id| morphology.handle(id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::RawDataError;
    use crate::properties::{PointLevel, NO_PARENT};

    fn quiet() -> WarningHandler {
        WarningHandler::new(WarningPolicy::silent())
    }

    fn segment(start: [FloatType; 3], n: usize, diameter: FloatType) -> PointLevel {
        PointLevel::new(
            (0..n)
                .map(|i| [start[0] + i as FloatType, start[1], start[2]])
                .collect(),
            vec![diameter; n],
        )
    }

    //        soma
    //       /    \
    //      0      3
    //     / \
    //    1   2
    fn neuron() -> Properties {
        let mut props = Properties::new();
        props.set_soma(
            SomaType::SinglePoint,
            PointLevel::new(vec![[0.0; 3]], vec![4.0]),
        );
        let a = props
            .push_section(NO_PARENT, SectionType::Axon, &segment([0.0; 3], 3, 1.0))
            .unwrap();
        props.push_section(a as i32, SectionType::Axon, &segment([2.0, 0.0, 0.0], 2, 1.0)).unwrap();
        props.push_section(a as i32, SectionType::Axon, &segment([2.0, 1.0, 0.0], 2, 1.0)).unwrap();
        props
            .push_section(
                NO_PARENT,
                SectionType::BasalDendrite,
                &segment([0.0, 5.0, 0.0], 2, 1.0),
            )
            .unwrap();
        props
    }

    #[test]
    fn test_build_and_navigate() {
        let handler = quiet();
        let m = Morphology::with_options(neuron(), &BuildOptions::default(), &handler).unwrap();
        assert_eq!(m.section_count(), 4);
        assert_eq!(handler.emitted(), 0);

        let roots: Vec<u32> = m.root_sections().iter().map(|s| s.id()).collect();
        assert_eq!(roots, vec![0, 3]);

        let s0 = m.section(0).unwrap();
        assert_eq!(s0.points().len(), 3);
        assert_eq!(s0.section_type(), SectionType::Axon);
        assert_eq!(s0.length(), 2.0);
        assert!(s0.is_root());
        assert_eq!(s0.children().iter().map(|s| s.id()).collect::<Vec<_>>(), vec![1, 2]);
        assert_eq!(m.section(2).unwrap().parent(), Some(s0));
        assert_eq!(m.section(3).unwrap().section_type(), SectionType::BasalDendrite);
        assert!(m.perimeters().is_empty());
        assert_eq!(m.points().len(), 9);
    }

    #[test]
    fn test_missing_section_is_reported() {
        let m = Morphology::with_options(neuron(), &BuildOptions::default(), &quiet()).unwrap();
        assert!(matches!(m.section(42), Err(Error::SectionNotFound(42))));
        assert!(m.upstream(42).is_err());
    }

    #[test]
    fn test_traversals() {
        let m = Morphology::with_options(neuron(), &BuildOptions::default(), &quiet()).unwrap();
        let dfs: Vec<u32> = m.depth_first().map(|s| s.id()).collect();
        assert_eq!(dfs, vec![0, 1, 2, 3]);
        let bfs: Vec<u32> = m.breadth_first().map(|s| s.id()).collect();
        assert_eq!(bfs, vec![0, 3, 1, 2]);
        let up: Vec<u32> = m.upstream(2).unwrap().map(|s| s.id()).collect();
        assert_eq!(up, vec![2, 0]);

        let s0 = m.section(0).unwrap();
        let sub: Vec<u32> = s0.iter(IterType::BreadthFirst).map(|s| s.id()).collect();
        assert_eq!(sub, vec![0, 1, 2]);
    }

    #[test]
    fn test_soma_view() {
        let m = Morphology::with_options(neuron(), &BuildOptions::default(), &quiet()).unwrap();
        let soma = m.soma();
        assert_eq!(soma.soma_type(), SomaType::SinglePoint);
        assert_eq!(soma.center(), [0.0; 3]);
        let surface = soma.surface().unwrap();
        assert!((surface - std::f64::consts::PI * 16.0).abs() < 1e-9);
        assert!(soma.volume().is_err());
    }

    #[test]
    fn test_single_child_is_annotated() {
        let mut props = Properties::new();
        props.set_soma(SomaType::SinglePoint, PointLevel::new(vec![[0.0; 3]], vec![2.0]));
        let a = props
            .push_section(NO_PARENT, SectionType::Axon, &segment([0.0; 3], 2, 1.0))
            .unwrap();
        props.push_section(a as i32, SectionType::Axon, &segment([1.0, 0.0, 0.0], 2, 1.0)).unwrap();

        let handler = quiet();
        let m = Morphology::with_options(props, &BuildOptions::default(), &handler).unwrap();
        assert_eq!(handler.emitted(), 1);
        assert_eq!(m.annotations().len(), 1);
        let annotation = &m.annotations()[0];
        assert_eq!(annotation.kind, AnnotationType::SingleChild);
        assert_eq!(annotation.section_id, 0);
        assert_eq!(annotation.points.len(), 2);

        // Rebuilding the same data does not duplicate the annotation
        let again =
            Morphology::with_options(m.properties().clone(), &BuildOptions::default(), &handler)
                .unwrap();
        assert_eq!(again.annotations().len(), 1);
    }

    #[test]
    fn test_missing_soma_and_zero_diameter_warn() {
        let mut props = Properties::new();
        props.push_section(NO_PARENT, SectionType::Axon, &segment([0.0; 3], 2, 0.0)).unwrap();

        let handler = quiet();
        Morphology::with_options(props.clone(), &BuildOptions::default(), &handler).unwrap();
        assert_eq!(handler.emitted(), 2);

        let strict = WarningHandler::new(WarningPolicy::raising());
        strict.set_ignored_warning(Warning::NoSomaFound, true);
        let err = Morphology::with_options(props, &BuildOptions::default(), &strict).unwrap_err();
        assert_eq!(err.warning_kind(), Some(Warning::ZeroDiameter));
    }

    #[test]
    fn test_disconnected_roots_without_soma() {
        let mut props = Properties::new();
        props.push_section(NO_PARENT, SectionType::Axon, &segment([0.0; 3], 2, 1.0)).unwrap();
        props
            .push_section(NO_PARENT, SectionType::Axon, &segment([5.0, 0.0, 0.0], 2, 1.0))
            .unwrap();

        let err = Morphology::with_options(props.clone(), &BuildOptions::default(), &quiet())
            .unwrap_err();
        assert!(matches!(err, Error::RawData(RawDataError::MultipleTrees { .. })));

        let m = Morphology::with_options(
            props,
            &BuildOptions::default().allow_multiple_trees(),
            &quiet(),
        )
        .unwrap();
        assert_eq!(m.root_sections().len(), 2);
    }

    #[test]
    fn test_inconsistent_arrays_are_rejected() {
        let mut props = neuron();
        props.point_level.diameters.pop();
        let err = Morphology::with_options(props, &BuildOptions::default(), &quiet()).unwrap_err();
        assert!(matches!(err, Error::RawData(RawDataError::Inconsistent(_))));
    }

    #[test]
    fn test_non_conforming_soma_warns() {
        let mut props = neuron();
        props.set_soma(
            SomaType::ThreePointCylinders,
            PointLevel::new(vec![[0.0; 3], [0.0, 1.0, 0.0]], vec![1.0, 1.0]),
        );
        let strict = WarningHandler::new(WarningPolicy::raising());
        let err = Morphology::with_options(props, &BuildOptions::default(), &strict).unwrap_err();
        assert_eq!(err.warning_kind(), Some(Warning::SomaNonConform));
    }

    #[test]
    fn test_clone_shares_storage() {
        let m = Morphology::with_options(neuron(), &BuildOptions::default(), &quiet()).unwrap();
        let copy = m.clone();
        assert!(std::ptr::eq(m.properties(), copy.properties()));
    }

    #[test]
    fn test_section_equality_follows_shared_storage() {
        let m = Morphology::with_options(neuron(), &BuildOptions::default(), &quiet()).unwrap();
        let copy = m.clone();
        assert_eq!(m.section(2).unwrap(), copy.section(2).unwrap());
        assert_ne!(m.section(1).unwrap(), copy.section(2).unwrap());

        let rebuilt = Morphology::with_options(neuron(), &BuildOptions::default(), &quiet()).unwrap();
        assert_ne!(m.section(2).unwrap(), rebuilt.section(2).unwrap());
    }

    #[test]
    fn test_post_synaptic_density_on_spines() {
        let mut props = neuron();
        props.cell.family = CellFamily::Spine;
        props.post_synaptic_density.push(PostSynapticDensity::new(3, 0, 0.5));
        let m = Morphology::with_options(props.clone(), &BuildOptions::default(), &quiet()).unwrap();
        assert_eq!(m.post_synaptic_density(), &[PostSynapticDensity::new(3, 0, 0.5)]);

        props.post_synaptic_density.push(PostSynapticDensity::new(9, 0, 0.5));
        let err = Morphology::with_options(props, &BuildOptions::default(), &quiet()).unwrap_err();
        assert!(matches!(err, Error::RawData(RawDataError::Inconsistent(_))));
    }
}
