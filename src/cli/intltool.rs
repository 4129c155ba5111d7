//! `blip-sweep intltool`: sweep a gettext po directory.
//!
//! Rebuilds the template if the module epoch moved, merges every language in
//! `LINGUAS` against it, and prints per-language statistics.
//!
//! ```bash
//! blip-sweep intltool ~/src/gedit/po --module gedit --epoch 3.38.0
//! blip-sweep intltool po --package gedit --format json
//! ```

use anyhow::Result;
use clap::Args;
use colored::Colorize;
use std::path::{Path, PathBuf};

use super::common::{CommandContext, CommandExecutor, print_json, print_ok, print_outcome_error};
use crate::l10n::{DomainReport, IntltoolDomain, makefile_gettext_package, resolve_gettext_package};

#[derive(Args, Debug)]
pub struct IntltoolCommand {
    /// The po directory (holds LINGUAS and the catalogs)
    #[arg(value_name = "PO_DIR")]
    pub po_dir: PathBuf,

    /// Module name [default: name of the po directory's parent]
    #[arg(long)]
    pub module: Option<String>,

    /// GETTEXT_PACKAGE from configure, substituted into Makefile.in.in
    #[arg(long)]
    pub package: Option<String>,

    /// Version stamp of the module; the template is rebuilt when it changes
    #[arg(long, default_value = "0")]
    pub epoch: String,
}

impl IntltoolCommand {
    fn domain(&self) -> IntltoolDomain {
        let module = self.module.clone().unwrap_or_else(|| module_name(&self.po_dir));
        let makefile = std::fs::read_to_string(self.po_dir.join("Makefile.in.in")).ok();
        let gettext_package = resolve_gettext_package(
            makefile.as_deref().and_then(makefile_gettext_package).as_deref(),
            self.package.as_deref(),
        );

        IntltoolDomain {
            po_dir: self.po_dir.clone(),
            module,
            gettext_package,
            epoch: self.epoch.clone(),
        }
    }
}

impl CommandExecutor for IntltoolCommand {
    async fn execute(self, ctx: &CommandContext) -> Result<()> {
        let domain = self.domain();
        let mut run = ctx.open_run().await?;
        let outcome = run.sweep_intltool(&domain).await;
        run.finish()?;

        if ctx.is_json() {
            return print_json(&outcome);
        }
        if let Some(report) = outcome.value() {
            print_domain_report(report);
        }
        print_outcome_error(&domain.name(), &outcome);
        Ok(())
    }
}

/// Directory name of the parent of `dir`, the usual module name.
pub(crate) fn module_name(dir: &Path) -> String {
    let absolute = std::path::absolute(dir).unwrap_or_else(|_| dir.to_path_buf());
    absolute
        .parent()
        .and_then(Path::file_name)
        .map(|name| name.to_string_lossy().to_string())
        .unwrap_or_else(|| "unknown".to_string())
}

pub(crate) fn print_domain_report(report: &DomainReport) {
    print_ok(&format!("{} ({})", report.name, report.directory.display()));
    match &report.template {
        Some(template) => {
            println!(
                "  template: {} ({} messages)",
                template.path.display(),
                template.message_count
            );
            if !template.missing.is_empty() {
                println!("  {} {}", "missing:".yellow(), template.missing.join(" "));
            }
        }
        None => println!("  template: {}", "none".dimmed()),
    }

    for (lang, stats) in &report.languages {
        match stats.value() {
            Some(stats) => {
                let line = format!(
                    "  {lang}: {} translated, {} fuzzy, {} untranslated",
                    stats.messages.translated, stats.messages.fuzzy, stats.messages.untranslated
                );
                let line = if stats.images.total() > 0 {
                    format!("{line} ({}/{} images)", stats.images.translated, stats.images.total())
                } else {
                    line
                };
                println!("{line}");
            }
            None => println!("  {lang}: {}", "no statistics".dimmed()),
        }
        if let Some(error) = stats.error() {
            println!("    {} {}", "error:".red(), error);
        }
    }
}
