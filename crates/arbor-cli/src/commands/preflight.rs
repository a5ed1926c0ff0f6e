//! Preflight command: can this morphology be written to the target file?

use std::path::PathBuf;

use clap::Args;
use serde::Serialize;

use super::BuildFlags;
use crate::output::{print_output, Report};
use crate::{AppContext, Cli};
use arbor_core::{check_writable, FileFormat};

#[derive(Args)]
pub struct PreflightArgs {
    /// Morphology file (JSON properties)
    pub file: PathBuf,

    /// Path the morphology would be written to; its extension picks the format
    #[arg(short, long)]
    pub target: PathBuf,

    #[command(flatten)]
    pub build: BuildFlags,
}

#[derive(Debug, Serialize)]
pub struct PreflightReport {
    pub target: String,
    pub format: FileFormat,
    pub writable: bool,
    pub warnings: usize,
}

impl Report for PreflightReport {
    fn table(&self) -> String {
        format!(
            "{} is writable as {} ({} warnings)",
            self.target, self.format, self.warnings
        )
    }
}

pub fn run(args: &PreflightArgs, cli: &Cli, ctx: &AppContext) -> anyhow::Result<()> {
    let format = FileFormat::from_path(&args.target)?;
    let options = args.build.options(ctx);
    let morphology = ctx.load(&args.file, &options)?;

    let before = ctx.handler.emitted();
    check_writable(morphology.properties(), format, &ctx.handler)?;

    let report = PreflightReport {
        target: args.target.display().to_string(),
        format,
        writable: true,
        warnings: ctx.handler.emitted() - before,
    };
    print_output(&report, cli.output_format());
    Ok(())
}
