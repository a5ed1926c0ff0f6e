//! CLI command implementations

pub mod check;
pub mod completions;
pub mod config;
pub mod normalize;
pub mod preflight;
pub mod stats;
pub mod traverse;

use clap::Args;

use crate::AppContext;
use arbor_core::BuildOptions;

/// Build flags shared by the commands that load a morphology
#[derive(Args, Debug, Clone, Default)]
pub struct BuildFlags {
    /// Accept several disconnected trees when there is no soma
    #[arg(long)]
    pub allow_multiple_trees: bool,

    /// Warn about sections with fewer points than this
    #[arg(long)]
    pub min_section_points: Option<usize>,

    /// Fail on the first warning
    #[arg(long)]
    pub strict: bool,
}

impl BuildFlags {
    /// Config-file options with these flags applied on top
    pub fn options(&self, ctx: &AppContext) -> BuildOptions {
        let mut options = ctx.build_options();
        if self.allow_multiple_trees {
            options.allow_multiple_trees = true;
        }
        if let Some(min) = self.min_section_points {
            options.min_section_points = min;
        }
        if self.strict {
            ctx.handler.set_raise_warnings(true);
        }
        options
    }
}
