//! Load-time structural modifiers, applied on the mutable form

use crate::enums::SomaType;
use crate::error::Result;
use crate::mutable::MutMorphology;
use crate::options::Modifiers;
use crate::point::{euclidean_distance, FloatType};
use crate::properties::PointLevel;
use crate::traversal::{DepthFirst, Tree};

impl MutMorphology {
    /// Apply `modifiers` in a fixed order: soma sphere, two-point sections,
    /// duplicate removal, then NEURON root ordering
    pub fn apply_modifiers(&mut self, modifiers: Modifiers) -> Result<()> {
        if modifiers.soma_sphere {
            self.soma_to_sphere();
        }
        if modifiers.two_points_sections {
            self.two_points_sections();
        }
        if modifiers.no_duplicates {
            self.remove_duplicate_points();
        }
        if modifiers.nrn_order {
            self.nrn_order();
        }
        tracing::debug!("Applied modifiers {:?}", modifiers);
        Ok(())
    }

    /// Collapse the soma into one point at its center, keeping its mean radius
    pub fn soma_to_sphere(&mut self) {
        let level = &self.soma.points;
        if level.len() <= 1 {
            return;
        }
        let center = self.soma.center();
        let mean = level
            .points
            .iter()
            .map(|p| euclidean_distance(p, &center))
            .sum::<FloatType>()
            / level.len() as FloatType;

        let mut sphere = PointLevel::new(vec![center], vec![2.0 * mean]);
        if level.has_perimeters() {
            sphere.perimeters = vec![0.0];
        }
        self.soma.points = sphere;
        self.soma.soma_type = SomaType::SinglePoint;
    }

    /// Keep only the first and last point of each section
    pub fn two_points_sections(&mut self) {
        for section in self.sections.values_mut() {
            let last = section.points.len().saturating_sub(1);
            section.points.retain_indices(|i| i == 0 || i == last);
        }
    }

    /// Drop a child's first point when it repeats its parent's last point
    ///
    /// Single-point children are left alone so no section ends up empty.
    pub fn remove_duplicate_points(&mut self) {
        let order: Vec<u32> = DepthFirst::from_roots(&*self).collect();
        let mut removed = 0usize;
        for id in order {
            let Some(parent) = self.parent_of(id) else {
                continue;
            };
            let parent_last = self
                .sections
                .get(&parent)
                .and_then(|p| p.points.points.last().copied());
            if let (Some(last), Some(section)) = (parent_last, self.sections.get_mut(&id)) {
                if section.points.len() > 1 && section.points.points.first() == Some(&last) {
                    section.points.retain_indices(|i| i != 0);
                    removed += 1;
                }
            }
        }
        tracing::debug!("Removed {} duplicated point(s)", removed);
    }

    /// Stable-sort the roots by section type code
    pub fn nrn_order(&mut self) {
        let sections = &self.sections;
        self.roots.sort_by_key(|id| {
            sections
                .get(id)
                .map(|s| s.section_type().code())
                .unwrap_or_default()
        });
    }
}
