//! Section tree derived from the flat `(offset, parent)` records
//!
//! The children map is computed once, here, and never edited afterwards.

use crate::enums::Warning;
use crate::error::{RawDataError, Result};
use crate::options::BuildOptions;
use crate::properties::SectionRecord;
use crate::traversal::Tree;
use crate::warnings::WarningHandler;
use std::ops::Range;

/// Validated section tree over a point-level store
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SectionTree {
    ranges: Vec<Range<usize>>,
    parents: Vec<Option<u32>>,
    children: Vec<Vec<u32>>,
    roots: Vec<u32>,
}

impl SectionTree {
    pub fn len(&self) -> usize {
        self.ranges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ranges.is_empty()
    }

    pub fn contains(&self, id: u32) -> bool {
        (id as usize) < self.ranges.len()
    }

    /// Point range of a section
    pub fn range(&self, id: u32) -> Option<Range<usize>> {
        self.ranges.get(id as usize).cloned()
    }
}

impl Tree for SectionTree {
    fn node_count(&self) -> usize {
        self.ranges.len()
    }

    fn roots(&self) -> &[u32] {
        &self.roots
    }

    fn parent_of(&self, id: u32) -> Option<u32> {
        self.parents.get(id as usize).copied().flatten()
    }

    fn children_of(&self, id: u32) -> &[u32] {
        self.children
            .get(id as usize)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }
}

/// Builds a [`SectionTree`], applying the validation policy
pub struct TreeBuilder<'a> {
    options: &'a BuildOptions,
    handler: &'a WarningHandler,
    anchored: bool,
    what: &'static str,
}

impl<'a> TreeBuilder<'a> {
    pub fn new(options: &'a BuildOptions, handler: &'a WarningHandler) -> Self {
        Self {
            options,
            handler,
            anchored: false,
            what: "section",
        }
    }

    /// Roots hang off a common body (the soma), so several roots are one tree
    pub fn anchored(mut self, anchored: bool) -> Self {
        self.anchored = anchored;
        self
    }

    /// Noun used in messages
    pub fn describing(mut self, what: &'static str) -> Self {
        self.what = what;
        self
    }

    /// Derive ranges and children from `records` over `point_count` points
    pub fn build(&self, records: &[SectionRecord], point_count: usize) -> Result<SectionTree> {
        let n = records.len();
        let mut tree = SectionTree {
            ranges: Vec::with_capacity(n),
            parents: Vec::with_capacity(n),
            children: vec![Vec::new(); n],
            roots: Vec::new(),
        };

        for (index, record) in records.iter().enumerate() {
            let id = index as u32;
            let parent = self.check_parent(id, record.parent, n)?;
            tree.ranges.push(self.section_range(records, index, point_count)?);
            tree.parents.push(parent);
            match parent {
                Some(p) => tree.children[p as usize].push(id),
                None => tree.roots.push(id),
            }
        }

        if tree.roots.len() > 1 && !self.anchored {
            if !self.options.allow_multiple_trees {
                return Err(RawDataError::MultipleTrees {
                    roots: tree.roots.len(),
                }
                .into());
            }
            for root in &tree.roots[1..] {
                self.handler.emit(
                    Warning::DisconnectedNeurite,
                    format!("{} {} starts a tree not connected to the first one", self.what, root),
                )?;
            }
        }

        for (id, range) in tree.ranges.iter().enumerate() {
            if range.len() < self.options.min_section_points {
                self.handler.emit(
                    Warning::ShortSection,
                    format!(
                        "{} {} has {} point(s), fewer than the required {}",
                        self.what,
                        id,
                        range.len(),
                        self.options.min_section_points
                    ),
                )?;
            }
        }

        tracing::debug!(
            "Built tree of {} {}s with {} root(s)",
            tree.len(),
            self.what,
            tree.roots.len()
        );
        Ok(tree)
    }

    fn check_parent(&self, id: u32, parent: i32, n: usize) -> Result<Option<u32>> {
        if parent == crate::properties::NO_PARENT {
            return Ok(None);
        }
        if parent < crate::properties::NO_PARENT || parent as usize >= n {
            return Err(RawDataError::IdSequence { section: id, parent }.into());
        }
        if parent as u32 >= id {
            return Err(RawDataError::MissingParent { section: id, parent }.into());
        }
        Ok(Some(parent as u32))
    }

    fn section_range(
        &self,
        records: &[SectionRecord],
        index: usize,
        point_count: usize,
    ) -> Result<Range<usize>> {
        let start = records[index].offset as usize;
        let end = records
            .get(index + 1)
            .map(|next| next.offset as usize)
            .unwrap_or(point_count);
        if start > point_count || end > point_count || end < start {
            return Err(RawDataError::SectionBuilder(format!(
                "{} {} spans points [{}, {}), outside the {} stored points or out of order",
                self.what, index, start, end, point_count
            ))
            .into());
        }
        if start == end {
            return Err(RawDataError::SectionBuilder(format!(
                "{} {} has no points",
                self.what, index
            ))
            .into());
        }
        Ok(start..end)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::warnings::WarningPolicy;

    fn records(layout: &[(u32, i32)]) -> Vec<SectionRecord> {
        layout.iter().map(|(o, p)| SectionRecord::new(*o, *p)).collect()
    }

    fn build(layout: &[(u32, i32)], points: usize) -> Result<SectionTree> {
        let options = BuildOptions::default();
        let handler = WarningHandler::new(WarningPolicy::silent());
        TreeBuilder::new(&options, &handler).build(&records(layout), points)
    }

    #[test]
    fn test_ranges_and_children() {
        let tree = build(&[(0, -1), (2, 0), (5, 0), (7, 1)], 9).unwrap();
        assert_eq!(tree.range(0), Some(0..2));
        assert_eq!(tree.range(1), Some(2..5));
        assert_eq!(tree.range(3), Some(7..9));
        assert_eq!(tree.children_of(0), &[1, 2]);
        assert_eq!(tree.children_of(1), &[3]);
        assert!(tree.children_of(3).is_empty());
        assert_eq!(tree.roots(), &[0]);
        assert_eq!(tree.parent_of(3), Some(1));
        assert_eq!(tree.parent_of(0), None);
    }

    #[test]
    fn test_every_non_root_in_exactly_one_children_list() {
        let layout = [(0, -1), (1, 0), (2, 0), (3, 1), (4, 1), (5, 2)];
        let tree = build(&layout, 7).unwrap();
        for id in 0..tree.len() as u32 {
            let holders: Vec<u32> = (0..tree.len() as u32)
                .filter(|p| tree.children_of(*p).contains(&id))
                .collect();
            match tree.parent_of(id) {
                Some(p) => assert_eq!(holders, vec![p]),
                None => assert!(holders.is_empty()),
            }
        }
    }

    #[test]
    fn test_children_keep_declaration_order() {
        let tree = build(&[(0, -1), (1, 0), (2, 0), (3, 0)], 4).unwrap();
        assert_eq!(tree.children_of(0), &[1, 2, 3]);
    }

    #[test]
    fn test_forward_reference_is_missing_parent() {
        let err = build(&[(0, 1), (1, -1)], 2).unwrap_err();
        assert!(matches!(
            err,
            Error::RawData(RawDataError::MissingParent { section: 0, parent: 1 })
        ));
    }

    #[test]
    fn test_cycle_is_rejected() {
        // 0 -> 2 -> 1 -> 0
        let err = build(&[(0, 2), (1, 0), (2, 1)], 3).unwrap_err();
        assert!(matches!(err, Error::RawData(RawDataError::MissingParent { .. })));
    }

    #[test]
    fn test_self_parent_is_rejected() {
        let err = build(&[(0, -1), (1, 1)], 2).unwrap_err();
        assert!(matches!(err, Error::RawData(RawDataError::MissingParent { .. })));
    }

    #[test]
    fn test_unknown_parent_is_id_sequence_error() {
        let err = build(&[(0, -1), (1, 9)], 2).unwrap_err();
        assert!(matches!(
            err,
            Error::RawData(RawDataError::IdSequence { section: 1, parent: 9 })
        ));
        let err = build(&[(0, -1), (1, -3)], 2).unwrap_err();
        assert!(matches!(err, Error::RawData(RawDataError::IdSequence { .. })));
    }

    #[test]
    fn test_empty_and_unordered_sections() {
        let err = build(&[(0, -1), (0, 0)], 2).unwrap_err();
        assert!(matches!(err, Error::RawData(RawDataError::SectionBuilder(_))));
        let err = build(&[(0, -1), (3, 0), (2, 1)], 4).unwrap_err();
        assert!(matches!(err, Error::RawData(RawDataError::SectionBuilder(_))));
        let err = build(&[(0, -1), (5, 0)], 4).unwrap_err();
        assert!(matches!(err, Error::RawData(RawDataError::SectionBuilder(_))));
    }

    #[test]
    fn test_multiple_trees() {
        let layout = records(&[(0, -1), (2, -1)]);
        let handler = WarningHandler::new(WarningPolicy::silent());

        let strict = BuildOptions::default();
        let err = TreeBuilder::new(&strict, &handler).build(&layout, 4).unwrap_err();
        assert!(matches!(
            err,
            Error::RawData(RawDataError::MultipleTrees { roots: 2 })
        ));

        let forest = BuildOptions::default().allow_multiple_trees();
        let tree = TreeBuilder::new(&forest, &handler).build(&layout, 4).unwrap();
        assert_eq!(tree.roots(), &[0, 1]);
        assert_eq!(handler.emitted(), 1);

        let anchored = TreeBuilder::new(&strict, &handler)
            .anchored(true)
            .build(&layout, 4)
            .unwrap();
        assert_eq!(anchored.roots().len(), 2);
    }

    #[test]
    fn test_short_sections_follow_policy() {
        let layout = records(&[(0, -1), (1, 0)]);
        let options = BuildOptions::default().with_min_section_points(2);

        let quiet = WarningHandler::new(WarningPolicy::silent());
        TreeBuilder::new(&options, &quiet).build(&layout, 3).unwrap();
        assert_eq!(quiet.emitted(), 1);

        let strict = WarningHandler::new(WarningPolicy::raising());
        let err = TreeBuilder::new(&options, &strict).build(&layout, 3).unwrap_err();
        assert_eq!(err.warning_kind(), Some(Warning::ShortSection));
    }

    #[test]
    fn test_empty_record_list() {
        let tree = build(&[], 0).unwrap();
        assert!(tree.is_empty());
        assert!(tree.roots().is_empty());
    }
}
