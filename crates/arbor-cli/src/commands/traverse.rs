//! Traverse command

use std::path::PathBuf;

use clap::{Args, ValueEnum};
use serde::Serialize;

use super::BuildFlags;
use crate::output::{print_output, Report};
use crate::{AppContext, Cli};
use arbor_core::{IterType, Section};

#[derive(Args)]
pub struct TraverseArgs {
    /// Morphology file (JSON properties)
    pub file: PathBuf,

    /// Traversal order
    #[arg(short, long, default_value = "depth-first")]
    pub order: Order,

    /// Start section (default: every root); required for upstream
    #[arg(long)]
    pub from: Option<u32>,

    #[command(flatten)]
    pub build: BuildFlags,
}

#[derive(Clone, Copy, ValueEnum)]
pub enum Order {
    DepthFirst,
    BreadthFirst,
    Upstream,
}

impl From<Order> for IterType {
    fn from(o: Order) -> Self {
        match o {
            Order::DepthFirst => IterType::DepthFirst,
            Order::BreadthFirst => IterType::BreadthFirst,
            Order::Upstream => IterType::Upstream,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct Visit {
    pub id: u32,
    pub section_type: String,
    pub parent: Option<u32>,
    pub points: usize,
    pub length: f64,
}

#[derive(Debug, Serialize)]
#[serde(transparent)]
pub struct TraversalReport {
    pub visits: Vec<Visit>,
}

impl Report for TraversalReport {
    fn table(&self) -> String {
        let mut out = format!(
            "{:>6}  {:<24} {:>6}  {:>6}  {:>10}\n",
            "ID", "TYPE", "PARENT", "POINTS", "LENGTH"
        );
        for v in &self.visits {
            let parent = v.parent.map(|p| p.to_string()).unwrap_or_else(|| "-".into());
            out.push_str(&format!(
                "{:>6}  {:<24} {:>6}  {:>6}  {:>10.3}\n",
                v.id, v.section_type, parent, v.points, v.length
            ));
        }
        out
    }
}

fn visit(section: Section<'_>) -> Visit {
    Visit {
        id: section.id(),
        section_type: section.section_type().to_string(),
        parent: section.parent().map(|p| p.id()),
        points: section.points().len(),
        length: section.length(),
    }
}

pub fn run(args: &TraverseArgs, cli: &Cli, ctx: &AppContext) -> anyhow::Result<()> {
    let options = args.build.options(ctx);
    let morphology = ctx.load(&args.file, &options)?;
    let order: IterType = args.order.into();

    let visits: Vec<Visit> = match (args.from, order) {
        (Some(id), order) => morphology.section(id)?.iter(order).map(visit).collect(),
        (None, IterType::DepthFirst) => morphology.depth_first().map(visit).collect(),
        (None, IterType::BreadthFirst) => morphology.breadth_first().map(visit).collect(),
        (None, IterType::Upstream) => {
            anyhow::bail!("Upstream traversal needs a start section; pass --from <id>")
        }
    };
    tracing::debug!("Visited {} sections", visits.len());

    print_output(&TraversalReport { visits }, cli.output_format());
    Ok(())
}
