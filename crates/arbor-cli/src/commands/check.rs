//! Check command: build a morphology and report what was found

use std::path::PathBuf;

use clap::Args;
use serde::Serialize;

use super::BuildFlags;
use crate::output::{key_values, print_output, Report};
use crate::{AppContext, Cli};
use arbor_core::{AnnotationType, Tree};

#[derive(Args)]
pub struct CheckArgs {
    /// Morphology file (JSON properties)
    pub file: PathBuf,

    #[command(flatten)]
    pub build: BuildFlags,
}

#[derive(Debug, Serialize)]
pub struct CheckReport {
    pub file: String,
    pub sections: usize,
    pub roots: usize,
    pub soma_type: String,
    pub soma_points: usize,
    pub warnings: usize,
    pub annotations: Vec<AnnotationSummary>,
}

#[derive(Debug, Serialize)]
pub struct AnnotationSummary {
    pub kind: AnnotationType,
    pub section_id: u32,
    pub details: String,
}

impl Report for CheckReport {
    fn table(&self) -> String {
        let mut out = format!(
            "OK: {} ({} sections, {} warnings)\n",
            self.file, self.sections, self.warnings
        );
        out.push_str(&key_values(&[
            ("Roots", self.roots.to_string()),
            ("Soma", format!("{} ({} points)", self.soma_type, self.soma_points)),
        ]));
        if !self.annotations.is_empty() {
            out.push_str("Annotations:\n");
            for a in &self.annotations {
                out.push_str(&format!("  section {}: {}\n", a.section_id, a.details));
            }
        }
        out
    }
}

pub fn run(args: &CheckArgs, cli: &Cli, ctx: &AppContext) -> anyhow::Result<()> {
    let options = args.build.options(ctx);
    let morphology = ctx.load(&args.file, &options)?;

    let report = CheckReport {
        file: args.file.display().to_string(),
        sections: morphology.section_count(),
        roots: morphology.roots().len(),
        soma_type: morphology.soma_type().to_string(),
        soma_points: morphology.soma().points().len(),
        warnings: ctx.handler.emitted(),
        annotations: morphology
            .annotations()
            .iter()
            .map(|a| AnnotationSummary {
                kind: a.kind,
                section_id: a.section_id,
                details: a.details.clone(),
            })
            .collect(),
    };
    tracing::info!(
        "Checked {}: {} warnings",
        report.file,
        report.warnings
    );

    print_output(&report, cli.output_format());
    Ok(())
}
