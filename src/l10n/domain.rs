//! Translation domains: a template plus one catalog per language.
//!
//! Two kinds of domain are swept:
//! - [`IntltoolDomain`]: a gettext `po/` directory listing its languages in
//!   `LINGUAS`, template built with `intltool-update`, catalogs `<lang>.po`
//! - [`HelpDomain`]: a documentation directory (`C/` sources) whose languages
//!   come from `DOC_LINGUAS`, template built with `xml2po`, catalogs
//!   `<lang>/<lang>.po`

use regex::Regex;
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use super::L10nState;
use super::catalog::CatalogStats;
use super::template::{TemplateArtifact, TemplateJob, TemplateSource};
use crate::core::{BuildVars, Outcome, SweepError};
use crate::stamps::StampStore;
use crate::tool::ToolSet;

/// A gettext domain driven by intltool.
#[derive(Debug, Clone)]
pub struct IntltoolDomain {
    /// The `po` directory (contains `LINGUAS` and `POTFILES.in`)
    pub po_dir: PathBuf,
    /// Module the domain belongs to
    pub module: String,
    /// `GETTEXT_PACKAGE` of the module, if known
    pub gettext_package: Option<String>,
    /// Coarse version stamp of the module
    pub epoch: String,
}

impl IntltoolDomain {
    /// Template name: the module for a plain `po` directory, else the
    /// directory name (`po-properties`, ...).
    pub fn template_name(&self) -> String {
        match self.po_dir.file_name().and_then(|n| n.to_str()) {
            Some("po") | None => self.module.clone(),
            Some(dir) => dir.to_string(),
        }
    }

    /// Display name of the domain.
    pub fn name(&self) -> String {
        self.gettext_package.clone().unwrap_or_else(|| self.template_name())
    }
}

/// Resolves the `GETTEXT_PACKAGE` of a po directory: the value from its
/// `Makefile.in.in` with `@GETTEXT_PACKAGE@` substituted by the configure
/// value, or the configure value alone.
pub fn resolve_gettext_package(
    makefile_value: Option<&str>,
    configure_value: Option<&str>,
) -> Option<String> {
    match (makefile_value, configure_value) {
        (Some(m), Some(c)) => Some(m.replace("@GETTEXT_PACKAGE@", c)),
        (Some(m), None) if !m.contains("@GETTEXT_PACKAGE@") => Some(m.to_string()),
        (_, c) => c.map(str::to_string),
    }
}

/// The `GETTEXT_PACKAGE = ...` assignment of a `Makefile.in.in`, if any.
pub fn makefile_gettext_package(text: &str) -> Option<String> {
    static ASSIGNMENT: OnceLock<Option<Regex>> = OnceLock::new();
    let re = ASSIGNMENT
        .get_or_init(|| Regex::new(r"(?m)^GETTEXT_PACKAGE\s*=\s*(\S+)\s*$").ok())
        .as_ref()?;
    re.captures(text).map(|caps| caps[1].to_string())
}

/// A documentation translation domain driven by xml2po.
#[derive(Debug, Clone)]
pub struct HelpDomain {
    /// Directory holding `C/` and the per-language directories
    pub help_dir: PathBuf,
    pub module: String,
    /// Document id; names the template `<id>.pot`
    pub doc_id: String,
    /// Source files relative to `help_dir` (`C/index.page`, ...)
    pub files: Vec<PathBuf>,
    pub languages: Vec<String>,
    pub epoch: String,
}

impl HelpDomain {
    /// Builds a domain from the documentation build variables.
    ///
    /// DocBook documents use `DOC_MODULE` with `<DOC_MODULE>.xml` as the main
    /// file; Mallard documents name themselves with `DOC_ID`. Files are
    /// `DOC_PAGES` then `DOC_INCLUDES` in both cases.
    pub fn from_build_vars(
        help_dir: &Path,
        module: &str,
        vars: &BuildVars,
        epoch: &str,
    ) -> Result<Self, SweepError> {
        let (doc_id, docbook) = if let Some(doc_module) = vars.get("DOC_MODULE") {
            (doc_module.to_string(), true)
        } else if let Some(id) = vars.get("DOC_ID") {
            (id.to_string(), false)
        } else {
            return Err(SweepError::ConfigError {
                message: format!(
                    "{}: build variables name neither DOC_MODULE nor DOC_ID",
                    help_dir.display()
                ),
            });
        };
        let mut files = vars.words("DOC_PAGES");
        files.extend(vars.words("DOC_INCLUDES"));
        if docbook {
            files.push(format!("{doc_id}.xml"));
        }

        Ok(Self {
            help_dir: help_dir.to_path_buf(),
            module: module.to_string(),
            doc_id,
            files: files.into_iter().map(|f| Path::new("C").join(f)).collect(),
            languages: vars.words("DOC_LINGUAS"),
            epoch: epoch.to_string(),
        })
    }
}

/// Languages listed in a `LINGUAS` file: words of every line that is neither
/// blank nor a comment.
pub fn parse_linguas(text: &str) -> Vec<String> {
    text.lines()
        .filter(|line| !line.starts_with('#') && !line.trim().is_empty())
        .flat_map(str::split_whitespace)
        .map(str::to_string)
        .collect()
}

/// Result of sweeping one domain.
#[derive(Debug, Clone, Serialize)]
pub struct DomainReport {
    pub name: String,
    pub directory: PathBuf,
    pub template: Option<TemplateArtifact>,
    /// Per-language statistics; a failed language keeps its last good value
    pub languages: BTreeMap<String, Outcome<CatalogStats>>,
}

impl L10nState {
    /// Sweeps an intltool domain.
    pub async fn sweep_intltool(
        &mut self,
        stamps: &mut StampStore,
        tools: &ToolSet,
        output_dir: &Path,
        domain: &IntltoolDomain,
    ) -> Outcome<DomainReport> {
        let languages = match self.intltool_languages(stamps, &domain.po_dir).await {
            Ok(languages) => languages,
            Err(error) => return Outcome::failed(error),
        };

        let name = domain.template_name();
        let job = TemplateJob {
            directory: domain.po_dir.clone(),
            source: TemplateSource::Intltool {
                package: name.clone(),
            },
            output: output_dir.join("l10n").join(&domain.module).join(format!("{name}.pot")),
            epoch: domain.epoch.clone(),
        };
        let catalogs = languages
            .into_iter()
            .map(|lang| {
                let catalog = domain.po_dir.join(format!("{lang}.po"));
                (lang, catalog)
            })
            .collect();

        self.sweep_domain(stamps, tools, domain.name(), &job, catalogs).await
    }

    /// Sweeps a documentation domain.
    pub async fn sweep_help(
        &mut self,
        stamps: &mut StampStore,
        tools: &ToolSet,
        output_dir: &Path,
        domain: &HelpDomain,
    ) -> Outcome<DomainReport> {
        let job = TemplateJob {
            directory: domain.help_dir.clone(),
            source: TemplateSource::Xml2po {
                files: domain.files.clone(),
            },
            output: output_dir
                .join("l10n")
                .join(&domain.module)
                .join("help")
                .join(format!("{}.pot", domain.doc_id)),
            epoch: domain.epoch.clone(),
        };
        let catalogs = domain
            .languages
            .iter()
            .map(|lang| (lang.clone(), domain.help_dir.join(lang).join(format!("{lang}.po"))))
            .collect();

        self.sweep_domain(stamps, tools, domain.doc_id.clone(), &job, catalogs).await
    }

    /// Reads `LINGUAS`, reusing the recorded list when the file is unchanged.
    async fn intltool_languages(
        &mut self,
        stamps: &mut StampStore,
        po_dir: &Path,
    ) -> Result<Vec<String>, SweepError> {
        let linguas = po_dir.join("LINGUAS");
        if !tokio::fs::try_exists(&linguas).await.unwrap_or(false) {
            return Err(SweepError::missing("LINGUAS file", linguas));
        }

        let stamp = stamps.check(&linguas).await?;
        if stamp.is_unchanged() {
            if let Some(languages) = self.languages.get(stamp.path()) {
                return Ok(languages.clone());
            }
        }

        let text = tokio::fs::read_to_string(&linguas).await?;
        let languages = parse_linguas(&text);
        tracing::debug!(target: "l10n", "{}: {}", linguas.display(), languages.join(" "));
        self.languages.insert(stamp.path().to_path_buf(), languages.clone());
        stamps.commit(stamp);
        Ok(languages)
    }

    async fn sweep_domain(
        &mut self,
        stamps: &mut StampStore,
        tools: &ToolSet,
        name: String,
        job: &TemplateJob,
        catalogs: Vec<(String, PathBuf)>,
    ) -> Outcome<DomainReport> {
        let mut report = DomainReport {
            name,
            directory: job.directory.clone(),
            template: None,
            languages: BTreeMap::new(),
        };

        let template = match self.templates.get_or_build(tools, job).await {
            Ok(template) => template,
            Err(error) => {
                // Keep whatever was computed before; no merges without a template
                for (lang, catalog) in catalogs {
                    let outcome = match self.merges.last_good(&catalog) {
                        Some(record) => Outcome::ok(record.stats),
                        None => Outcome::failed(error.clone()),
                    };
                    report.languages.insert(lang, outcome);
                }
                report.template = self.templates.record(&job.directory).cloned();
                return Outcome::partial(report, error);
            }
        };

        for (lang, catalog) in catalogs {
            let outcome = match self.merges.merge(stamps, tools, &catalog, &template).await {
                Ok(stats) => Outcome::ok(stats),
                Err(error) => {
                    tracing::warn!(target: "l10n", "{}/{}: {}", report.name, lang, error);
                    match self.merges.last_good(&catalog) {
                        Some(record) => Outcome::partial(record.stats, error),
                        None => Outcome::failed(error),
                    }
                }
            };
            report.languages.insert(lang, outcome);
        }

        report.template = Some(template);
        Outcome::ok(report)
    }
}
