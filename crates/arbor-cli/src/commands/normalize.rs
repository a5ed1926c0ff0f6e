//! Normalize command: apply modifiers and write the flattened properties

use std::path::PathBuf;

use anyhow::Context;
use clap::Args;

use super::BuildFlags;
use crate::{AppContext, Cli};
use arbor_core::{Modifier, Modifiers, MutMorphology};

#[derive(Args)]
pub struct NormalizeArgs {
    /// Morphology file (JSON properties)
    pub file: PathBuf,

    /// Output file (stdout if omitted)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Replace the soma by a single-point sphere
    #[arg(long)]
    pub soma_sphere: bool,

    /// Keep only the first and last point of every section
    #[arg(long)]
    pub two_points_sections: bool,

    /// Drop points a child repeats from its parent
    #[arg(long)]
    pub no_duplicates: bool,

    /// Order root sections by type
    #[arg(long)]
    pub nrn_order: bool,

    /// Merge sections that have a single child into it
    #[arg(long)]
    pub remove_unifurcations: bool,

    #[command(flatten)]
    pub build: BuildFlags,
}

impl NormalizeArgs {
    /// Modifiers from the flags, on top of those from the config file
    fn modifiers(&self, base: Modifiers) -> Modifiers {
        [
            (self.soma_sphere, Modifier::SomaSphere),
            (self.two_points_sections, Modifier::TwoPointsSections),
            (self.no_duplicates, Modifier::NoDuplicates),
            (self.nrn_order, Modifier::NrnOrder),
        ]
        .into_iter()
        .filter(|(on, _)| *on)
        .fold(base, |mods, (_, m)| mods.with(m))
    }
}

pub fn run(args: &NormalizeArgs, _cli: &Cli, ctx: &AppContext) -> anyhow::Result<()> {
    let mut options = args.build.options(ctx);
    options.modifiers = args.modifiers(options.modifiers);
    tracing::info!("Normalizing {:?} with {:?}", args.file, options.modifiers);

    let morphology = ctx.load(&args.file, &options)?;
    let properties = if args.remove_unifurcations {
        let mut editable = MutMorphology::from_morphology_with(&morphology, ctx.handler.clone());
        editable.remove_unifurcations()?;
        editable.to_properties()?
    } else {
        morphology.properties().clone()
    };

    match &args.output {
        Some(path) => {
            properties
                .save(path)
                .with_context(|| format!("Failed to write {}", path.display()))?;
            println!(
                "Wrote {} sections to {}",
                properties.section_count(),
                path.display()
            );
        }
        None => println!("{}", properties.to_json()?),
    }
    Ok(())
}
