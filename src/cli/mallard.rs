//! `blip-sweep mallard`: scan a Mallard documentation unit and render its
//! topic link graph.

use anyhow::Result;
use clap::Args;
use colored::Colorize;
use std::path::PathBuf;

use super::common::{CommandContext, CommandExecutor, print_json, print_ok, print_outcome_error};
use crate::doc::{MallardUnit, UnitReport};

#[derive(Args, Debug)]
pub struct MallardCommand {
    /// Directory holding the .page files (usually help/C)
    #[arg(value_name = "DIR")]
    pub dir: PathBuf,

    /// Document id; names the graph output directory
    #[arg(long, default_value = "help")]
    pub id: String,

    /// Package series revisions are matched against (e.g. 3.38)
    #[arg(long)]
    pub series: Option<String>,
}

impl CommandExecutor for MallardCommand {
    async fn execute(self, ctx: &CommandContext) -> Result<()> {
        let unit = MallardUnit::discover(&self.id, &self.dir, self.series.as_deref());
        if unit.pages.is_empty() {
            anyhow::bail!("No .page files found in {}", self.dir.display());
        }

        let mut run = ctx.open_run().await?;
        let outcome = run.sweep_mallard(&unit).await;
        run.finish()?;

        if ctx.is_json() {
            return print_json(&outcome);
        }
        if let Some(report) = outcome.value() {
            print_unit_report(report);
        }
        print_outcome_error(&unit.id, &outcome);
        Ok(())
    }
}

fn print_unit_report(report: &UnitReport) {
    let title = report.title.as_ref().and_then(|t| t.default_value()).cloned();
    print_ok(&format!("{} {}", report.id, title.map(|t| format!("({t})")).unwrap_or_default()));
    if let Some(status) = &report.status {
        println!("  status: {status}");
    }
    println!("  pages: {} ({} scanned)", report.pages, report.scanned);
    for (file, error) in &report.page_errors {
        println!("    {} {}: {}", "error:".red(), file.display(), error);
    }
    println!("  links: {}", report.edges.len());
    if report.rendered {
        println!("  graph: {}", report.graph.display());
    } else {
        println!("  graph: {} {}", report.graph.display(), "(unchanged)".dimmed());
    }
    for contributor in &report.contributors {
        let name = contributor.name.as_deref().unwrap_or(&contributor.identity);
        let email = contributor.email.as_deref().map(|e| format!(" <{e}>")).unwrap_or_default();
        println!("  {name}{email}");
    }
}
