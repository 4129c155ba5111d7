//! `blip-sweep moduleset`: inspect jhbuild module sets.
//!
//! ```bash
//! # Packages of a metamodule, nested groups expanded
//! blip-sweep moduleset resolve gnome-apps-3.38.modules meta-gnome-core
//!
//! # Everything gedit depends on
//! blip-sweep moduleset deps gnome-apps-3.38.modules gedit --tree
//! ```

use anyhow::Result;
use clap::{Args, Subcommand};
use colored::Colorize;
use serde::Serialize;
use std::path::PathBuf;

use super::common::{CommandContext, CommandExecutor, print_json};
use crate::moduleset::{Dependency, ModuleSetCache, PackageGraph, resolve_all, resolve_default};

#[derive(Args, Debug)]
pub struct ModulesetCommand {
    #[command(subcommand)]
    command: ModulesetSubcommand,
}

#[derive(Subcommand, Debug)]
enum ModulesetSubcommand {
    /// List the packages an id stands for
    Resolve {
        /// Top-level module-set file
        #[arg(value_name = "FILE")]
        file: PathBuf,

        /// Package or metamodule ids [default: the file's own group]
        #[arg(value_name = "ID")]
        ids: Vec<String>,
    },

    /// List what a package depends on, directly and transitively
    Deps {
        /// Top-level module-set file
        #[arg(value_name = "FILE")]
        file: PathBuf,

        /// Package id
        #[arg(value_name = "PACKAGE")]
        package: String,

        /// Print a dependency tree instead of a flat list
        #[arg(long)]
        tree: bool,
    },
}

#[derive(Serialize)]
struct DepsReport<'a> {
    package: &'a str,
    dependencies: Vec<Dependency>,
    cycles: Vec<Vec<String>>,
}

impl CommandExecutor for ModulesetCommand {
    async fn execute(self, ctx: &CommandContext) -> Result<()> {
        let cache = ModuleSetCache::new();
        match self.command {
            ModulesetSubcommand::Resolve {
                file,
                ids,
            } => {
                let document = cache.get_or_load(&file)?;
                let resolution = if ids.is_empty() {
                    resolve_default(&document)
                } else {
                    resolve_all(&document, ids.iter().map(String::as_str))
                };

                if ctx.is_json() {
                    return print_json(&resolution);
                }
                for package in &resolution.packages {
                    println!("{package}");
                }
                for diagnostic in &resolution.diagnostics {
                    eprintln!("{} {}", "warning:".yellow(), diagnostic);
                }
                Ok(())
            }
            ModulesetSubcommand::Deps {
                file,
                package,
                tree,
            } => {
                let document = cache.get_or_load(&file)?;
                if !document.has_package(&package) {
                    anyhow::bail!("No package '{}' in {}", package, file.display());
                }
                let graph = PackageGraph::from_document(&document);

                if ctx.is_json() {
                    return print_json(&DepsReport {
                        package: &package,
                        dependencies: graph.dependency_closure(&package),
                        cycles: graph.cycles(),
                    });
                }
                if tree {
                    print!("{}", graph.to_tree_string(&package));
                } else {
                    for dep in graph.dependency_closure(&package) {
                        if dep.direct {
                            println!("{}", dep.id);
                        } else {
                            println!("{} {}", dep.id, "(indirect)".dimmed());
                        }
                    }
                }
                for cycle in graph.cycles() {
                    eprintln!("{} dependency cycle: {}", "warning:".yellow(), cycle.join(", "));
                }
                Ok(())
            }
        }
    }
}
