//! Construction options: tree validation policy and load-time modifiers

use serde::{Deserialize, Serialize};

/// Individual load-time modifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Modifier {
    NoModifier,
    /// Keep only the first and last point of every section
    TwoPointsSections,
    /// Replace the soma by a sphere
    SomaSphere,
    /// Drop a child's first point when it repeats its parent's last point
    NoDuplicates,
    /// Order root sections by section type, as NEURON does
    NrnOrder,
}

/// Set of modifiers applied while building a morphology
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Modifiers {
    #[serde(default)]
    pub two_points_sections: bool,
    #[serde(default)]
    pub soma_sphere: bool,
    #[serde(default)]
    pub no_duplicates: bool,
    #[serde(default)]
    pub nrn_order: bool,
}

impl Modifiers {
    pub fn none() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    pub fn with(mut self, modifier: Modifier) -> Self {
        match modifier {
            Modifier::NoModifier => {}
            Modifier::TwoPointsSections => self.two_points_sections = true,
            Modifier::SomaSphere => self.soma_sphere = true,
            Modifier::NoDuplicates => self.no_duplicates = true,
            Modifier::NrnOrder => self.nrn_order = true,
        }
        self
    }

    pub fn contains(&self, modifier: Modifier) -> bool {
        match modifier {
            Modifier::NoModifier => self.is_empty(),
            Modifier::TwoPointsSections => self.two_points_sections,
            Modifier::SomaSphere => self.soma_sphere,
            Modifier::NoDuplicates => self.no_duplicates,
            Modifier::NrnOrder => self.nrn_order,
        }
    }
}

impl FromIterator<Modifier> for Modifiers {
    fn from_iter<I: IntoIterator<Item = Modifier>>(iter: I) -> Self {
        iter.into_iter().fold(Modifiers::none(), Modifiers::with)
    }
}

/// Options for building a morphology from [`Properties`](crate::Properties)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildOptions {
    /// Accept several roots when no soma ties them together
    #[serde(default)]
    pub allow_multiple_trees: bool,

    /// Sections with fewer points are reported as short
    #[serde(default = "default_min_section_points")]
    pub min_section_points: usize,

    #[serde(default)]
    pub modifiers: Modifiers,
}

fn default_min_section_points() -> usize {
    1
}

impl Default for BuildOptions {
    fn default() -> Self {
        Self {
            allow_multiple_trees: false,
            min_section_points: default_min_section_points(),
            modifiers: Modifiers::none(),
        }
    }
}

impl BuildOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn allow_multiple_trees(mut self) -> Self {
        self.allow_multiple_trees = true;
        self
    }

    pub fn with_min_section_points(mut self, min: usize) -> Self {
        self.min_section_points = min;
        self
    }

    pub fn with_modifiers(mut self, modifiers: Modifiers) -> Self {
        self.modifiers = modifiers;
        self
    }
}
