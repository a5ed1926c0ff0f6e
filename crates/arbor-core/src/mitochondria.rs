//! Mitochondria attached to neurite sections
//!
//! Each mitochondrion is a small tree of sections. A mitochondrion point is
//! not a coordinate but a position along a neurite section: the section id
//! plus a relative path length in `[0, 1]`.

use crate::error::Result;
use crate::options::BuildOptions;
use crate::point::FloatType;
use crate::properties::MitochondriaLevel;
use crate::range::span;
use crate::traversal::{DepthFirst, Tree};
use crate::tree::{SectionTree, TreeBuilder};
use crate::warnings::WarningHandler;

/// Validate the mitochondria records and derive their tree
pub(crate) fn build_tree(level: &MitochondriaLevel, handler: &WarningHandler) -> Result<SectionTree> {
    if level.is_empty() {
        return Ok(SectionTree::default());
    }
    TreeBuilder::new(&BuildOptions::default(), handler)
        .anchored(true)
        .describing("mitochondrion section")
        .build(&level.sections, level.point_count())
}

/// Read-only view of a morphology's mitochondria
#[derive(Debug, Clone, Copy)]
pub struct Mitochondria<'a> {
    level: &'a MitochondriaLevel,
    tree: &'a SectionTree,
}

impl<'a> Mitochondria<'a> {
    pub(crate) fn new(level: &'a MitochondriaLevel, tree: &'a SectionTree) -> Self {
        Self { level, tree }
    }

    pub fn is_empty(&self) -> bool {
        self.tree.is_empty()
    }

    pub fn section_count(&self) -> usize {
        self.tree.len()
    }

    pub fn section(&self, id: u32) -> Option<MitoSection<'a>> {
        self.tree.contains(id).then(|| MitoSection {
            id,
            mitochondria: *self,
        })
    }

    /// First section of every mitochondrion
    pub fn root_sections(&self) -> Vec<MitoSection<'a>> {
        self.tree
            .roots()
            .iter()
            .map(|id| MitoSection {
                id: *id,
                mitochondria: *self,
            })
            .collect()
    }

    /// All sections, mitochondrion by mitochondrion, depth first
    pub fn depth_first(&self) -> impl Iterator<Item = MitoSection<'a>> + 'a {
        let this = *self;
        DepthFirst::from_roots(self.tree).map(move |id| MitoSection {
            id,
            mitochondria: this,
        })
    }
}

impl Tree for Mitochondria<'_> {
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

/// Handle on one mitochondrion section
#[derive(Debug, Clone, Copy)]
pub struct MitoSection<'a> {
    id: u32,
    mitochondria: Mitochondria<'a>,
}

impl<'a> MitoSection<'a> {
    pub fn id(&self) -> u32 {
        self.id
    }

    fn range(&self) -> std::ops::Range<usize> {
        self.mitochondria.tree.range(self.id).unwrap_or(0..0)
    }

    pub fn neurite_section_ids(&self) -> &'a [u32] {
        span(&self.mitochondria.level.neurite_section_ids, self.range())
    }

    pub fn relative_path_lengths(&self) -> &'a [FloatType] {
        span(&self.mitochondria.level.relative_path_lengths, self.range())
    }

    pub fn diameters(&self) -> &'a [FloatType] {
        span(&self.mitochondria.level.diameters, self.range())
    }

    pub fn parent(&self) -> Option<MitoSection<'a>> {
        self.mitochondria
            .tree
            .parent_of(self.id)
            .map(|id| MitoSection {
                id,
                mitochondria: self.mitochondria,
            })
    }

    pub fn children(&self) -> Vec<MitoSection<'a>> {
        self.mitochondria
            .tree
            .children_of(self.id)
            .iter()
            .map(|id| MitoSection {
                id: *id,
                mitochondria: self.mitochondria,
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::properties::SectionRecord;
    use crate::warnings::WarningPolicy;

    fn level() -> MitochondriaLevel {
        MitochondriaLevel {
            sections: vec![
                SectionRecord::root(0),
                SectionRecord::new(2, 0),
                SectionRecord::root(3),
            ],
            neurite_section_ids: vec![0, 0, 1, 2, 2],
            relative_path_lengths: vec![0.1, 0.5, 0.2, 0.3, 0.9],
            diameters: vec![1.0, 1.5, 1.0, 2.0, 2.0],
        }
    }

    #[test]
    fn test_mitochondria_view() {
        let level = level();
        let handler = WarningHandler::new(WarningPolicy::silent());
        let tree = build_tree(&level, &handler).unwrap();
        let mito = Mitochondria::new(&level, &tree);

        assert_eq!(mito.section_count(), 3);
        let roots = mito.root_sections();
        assert_eq!(roots.len(), 2);
        assert_eq!(roots[0].neurite_section_ids(), &[0, 0]);
        assert_eq!(roots[0].children()[0].relative_path_lengths(), &[0.2]);
        assert_eq!(roots[1].diameters(), &[2.0, 2.0]);
        assert_eq!(mito.section(1).unwrap().parent().unwrap().id(), 0);
        assert!(mito.section(7).is_none());

        let ids: Vec<u32> = mito.depth_first().map(|s| s.id()).collect();
        assert_eq!(ids, vec![0, 1, 2]);
    }

    #[test]
    fn test_empty_mitochondria() {
        let level = MitochondriaLevel::default();
        let handler = WarningHandler::new(WarningPolicy::silent());
        let tree = build_tree(&level, &handler).unwrap();
        assert!(Mitochondria::new(&level, &tree).is_empty());
    }
}
