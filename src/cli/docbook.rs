//! `blip-sweep docbook`: read the metadata of a DocBook document.

use anyhow::Result;
use clap::Args;
use std::path::PathBuf;

use super::common::{CommandContext, CommandExecutor, print_json, print_ok, print_outcome_error};

#[derive(Args, Debug)]
pub struct DocbookCommand {
    /// Main file of the document
    #[arg(value_name = "FILE")]
    pub file: PathBuf,

    /// Package series releaseinfo is matched against
    #[arg(long)]
    pub series: Option<String>,
}

impl CommandExecutor for DocbookCommand {
    async fn execute(self, ctx: &CommandContext) -> Result<()> {
        let mut run = ctx.open_run().await?;
        let outcome = run.sweep_docbook(&self.file, self.series.as_deref()).await;
        run.finish()?;

        if ctx.is_json() {
            return print_json(&outcome);
        }
        let label = self.file.display().to_string();
        if let Some(document) = outcome.value() {
            let title = document.title.as_ref().and_then(|t| t.default_value()).cloned();
            print_ok(&format!("{label} {}", title.map(|t| format!("({t})")).unwrap_or_default()));
            if let Some(desc) = document.desc.as_ref().and_then(|d| d.default_value()) {
                println!("  {desc}");
            }
            println!("  status: {}", document.status);
            for credit in &document.credits {
                let identity = credit.identity();
                let name = credit.name.as_deref().unwrap_or(&identity);
                let email = credit.email.as_deref().map(|e| format!(" <{e}>")).unwrap_or_default();
                println!("  {name}{email}");
            }
        }
        print_outcome_error(&label, &outcome);
        Ok(())
    }
}
