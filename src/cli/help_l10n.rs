//! `blip-sweep help-l10n`: sweep the translations of a documentation
//! directory.
//!
//! The document is described by its build variables, given as
//! `--var KEY=VALUE` (`DOC_ID` or `DOC_MODULE`, `DOC_PAGES`, `DOC_INCLUDES`,
//! `DOC_LINGUAS`).
//!
//! ```bash
//! blip-sweep help-l10n help --module gedit \
//!     --var DOC_ID=gedit --var "DOC_PAGES=index.page files.page" --var "DOC_LINGUAS=de fr"
//! ```

use anyhow::Result;
use clap::Args;
use std::path::PathBuf;

use super::common::{CommandContext, CommandExecutor, print_json, print_outcome_error};
use super::intltool::{module_name, print_domain_report};
use crate::core::BuildVars;
use crate::l10n::HelpDomain;

fn parse_var(text: &str) -> Result<(String, String), String> {
    BuildVars::parse_assignment(text).map_err(|e| e.to_string())
}

#[derive(Args, Debug)]
pub struct HelpL10nCommand {
    /// Documentation directory (holds C/ and one directory per language)
    #[arg(value_name = "HELP_DIR")]
    pub help_dir: PathBuf,

    /// Module name [default: name of the help directory's parent]
    #[arg(long)]
    pub module: Option<String>,

    /// Build variable, KEY=VALUE; repeatable
    #[arg(long = "var", value_name = "KEY=VALUE", value_parser = parse_var)]
    pub vars: Vec<(String, String)>,

    /// Version stamp of the module; the template is rebuilt when it changes
    #[arg(long, default_value = "0")]
    pub epoch: String,
}

impl CommandExecutor for HelpL10nCommand {
    async fn execute(self, ctx: &CommandContext) -> Result<()> {
        let module = self.module.clone().unwrap_or_else(|| module_name(&self.help_dir));
        let vars: BuildVars = self.vars.into_iter().collect();
        let domain = HelpDomain::from_build_vars(&self.help_dir, &module, &vars, &self.epoch)?;

        let mut run = ctx.open_run().await?;
        let outcome = run.sweep_help(&domain).await;
        run.finish()?;

        if ctx.is_json() {
            return print_json(&outcome);
        }
        if let Some(report) = outcome.value() {
            print_domain_report(report);
        }
        print_outcome_error(&domain.doc_id, &outcome);
        Ok(())
    }
}
