//! Stats command

use std::collections::BTreeMap;
use std::path::PathBuf;

use clap::Args;
use serde::Serialize;

use super::BuildFlags;
use crate::output::{key_values, print_output, Report};
use crate::{AppContext, Cli};
use arbor_core::{SomaError, Tree};

#[derive(Args)]
pub struct StatsArgs {
    /// Morphology file (JSON properties)
    pub file: PathBuf,

    #[command(flatten)]
    pub build: BuildFlags,
}

#[derive(Debug, Serialize)]
pub struct StatsReport {
    pub sections: usize,
    pub roots: usize,
    pub points: usize,
    pub total_length: f64,
    pub sections_by_type: BTreeMap<String, usize>,
    pub soma: SomaStats,
    pub markers: usize,
    pub mitochondrion_sections: usize,
}

#[derive(Debug, Serialize)]
pub struct SomaStats {
    pub soma_type: String,
    pub points: usize,
    pub center: [f64; 3],
    pub max_distance: f64,
    /// A number, or the reason it cannot be computed
    pub surface: Measure,
    pub volume: Measure,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum Measure {
    Value(f64),
    Unavailable(String),
}

impl From<Result<f64, SomaError>> for Measure {
    fn from(result: Result<f64, SomaError>) -> Self {
        match result {
            Ok(value) => Self::Value(value),
            Err(e) => Self::Unavailable(e.to_string()),
        }
    }
}

impl std::fmt::Display for Measure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Value(v) => write!(f, "{:.3}", v),
            Self::Unavailable(reason) => write!(f, "n/a ({})", reason),
        }
    }
}

impl Report for StatsReport {
    fn table(&self) -> String {
        let mut rows = vec![
            ("Sections", self.sections.to_string()),
            ("Roots", self.roots.to_string()),
            ("Points", self.points.to_string()),
            ("Total length", format!("{:.3}", self.total_length)),
            ("Soma type", self.soma.soma_type.clone()),
            ("Soma points", self.soma.points.to_string()),
            (
                "Soma center",
                format!(
                    "({:.3}, {:.3}, {:.3})",
                    self.soma.center[0], self.soma.center[1], self.soma.center[2]
                ),
            ),
            ("Soma surface", self.soma.surface.to_string()),
            ("Soma volume", self.soma.volume.to_string()),
            ("Markers", self.markers.to_string()),
            ("Mitochondrion sections", self.mitochondrion_sections.to_string()),
        ];
        for (ty, count) in &self.sections_by_type {
            rows.push((ty.as_str(), count.to_string()));
        }
        key_values(&rows)
    }
}

pub fn run(args: &StatsArgs, cli: &Cli, ctx: &AppContext) -> anyhow::Result<()> {
    let options = args.build.options(ctx);
    let morphology = ctx.load(&args.file, &options)?;

    let mut sections_by_type = BTreeMap::new();
    for ty in morphology.section_types() {
        *sections_by_type.entry(ty.to_string()).or_insert(0) += 1;
    }

    let soma = morphology.soma();
    let report = StatsReport {
        sections: morphology.section_count(),
        roots: morphology.roots().len(),
        points: morphology.points().len(),
        total_length: morphology.sections().map(|s| s.length()).sum(),
        sections_by_type,
        soma: SomaStats {
            soma_type: soma.soma_type().to_string(),
            points: soma.points().len(),
            center: soma.center(),
            max_distance: soma.max_distance(),
            surface: soma.surface().into(),
            volume: soma.volume().into(),
        },
        markers: morphology.markers().len(),
        mitochondrion_sections: morphology.mitochondria().section_count(),
    };

    print_output(&report, cli.output_format());
    Ok(())
}
