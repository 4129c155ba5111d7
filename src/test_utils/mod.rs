//! Test utilities for blip-sweep
//!
//! Shared by the unit tests and, through the `test-utils` feature, by the
//! integration suite:
//!
//! - [`init_test_logging`] - Once-guarded tracing setup for tests
//! - [`FakeTools`] - `sh` scripts standing in for `intltool-update`, `xml2po`,
//!   `msgmerge` and `dot`, each appending its command line to a shared log
//! - [`SweepTree`] - a temporary source tree with state and output directories
//!
//! The fake tools need a POSIX `sh`.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Once;
use tempfile::TempDir;
use tracing::Level;
use tracing_subscriber::EnvFilter;

use crate::config::{SweepConfig, ToolsConfig};
use crate::tool::Tool;

/// Global flag to ensure logging is only initialized once in tests
static INIT_LOGGING: Once = Once::new();

/// Initialize logging for tests.
///
/// Uses `level` when given, else `RUST_LOG` when set, else stays silent.
///
/// ```bash
/// RUST_LOG=debug cargo test
/// ```
pub fn init_test_logging(level: Option<Level>) {
    INIT_LOGGING.call_once(|| {
        let filter = if let Some(level) = level {
            EnvFilter::new(level.to_string())
        } else if std::env::var("RUST_LOG").is_ok() {
            EnvFilter::from_default_env()
        } else {
            return;
        };

        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .with_target(true)
            .with_thread_ids(false)
            .try_init();
    });
}

/// A small template: header, then two messages.
pub const SAMPLE_TEMPLATE: &str = r#"# Template for the test module
msgid ""
msgstr ""
"Project-Id-Version: test\n"
"POT-Creation-Date: 2020-01-01 00:00+0000\n"

#: src/window.c:10
msgid "Open"
msgstr ""

#: src/window.c:11
msgid "Save"
msgstr ""
"#;

/// A catalog for [`SAMPLE_TEMPLATE`] with one translated and one fuzzy
/// message.
pub fn sample_catalog(lang: &str) -> String {
    format!(
        r#"msgid ""
msgstr ""
"Language: {lang}\n"

msgid "Open"
msgstr "Open ({lang})"

#, fuzzy
msgid "Save"
msgstr "Save ({lang})"
"#
    )
}

const INTLTOOL_SCRIPT: &str = r#"echo "intltool-update $*" >> "$FAKE_DIR/invocations.log"
if [ "$1" = "-m" ]; then
    [ -e "$FAKE_DIR/missing" ] && cp "$FAKE_DIR/missing" missing
    exit 0
fi
[ -e "$FAKE_DIR/fail-intltool-update" ] && { echo "template extraction failed" >&2; exit 1; }
cp "$FAKE_DIR/template.pot" "$3.pot"
"#;

const XML2PO_SCRIPT: &str = r#"echo "xml2po $*" >> "$FAKE_DIR/invocations.log"
[ -e "$FAKE_DIR/fail-xml2po" ] && { echo "xml2po failed" >&2; exit 1; }
cp "$FAKE_DIR/template.pot" "$3"
"#;

const MSGMERGE_SCRIPT: &str = r#"echo "msgmerge $*" >> "$FAKE_DIR/invocations.log"
[ -e "$FAKE_DIR/fail-msgmerge-$1" ] && { echo "msgmerge: $1: syntax error" >&2; exit 1; }
cat "$1"
"#;

const DOT_SCRIPT: &str = r#"echo "dot $*" >> "$FAKE_DIR/invocations.log"
[ -e "$FAKE_DIR/fail-dot" ] && { echo "dot failed" >&2; exit 1; }
cat > "$3"
"#;

/// Fake external tools recording every invocation.
pub struct FakeTools {
    dir: TempDir,
}

impl FakeTools {
    /// Writes the scripts and [`SAMPLE_TEMPLATE`] as the template every
    /// generator produces.
    pub fn new() -> Self {
        let dir = TempDir::new().expect("create fake tool directory");
        let tools = Self {
            dir,
        };
        for tool in Tool::ALL {
            let script = match tool {
                Tool::IntltoolUpdate => INTLTOOL_SCRIPT,
                Tool::Xml2po => XML2PO_SCRIPT,
                Tool::Msgmerge => MSGMERGE_SCRIPT,
                Tool::Dot => DOT_SCRIPT,
            };
            let body = format!("FAKE_DIR='{}'\n{script}", tools.dir.path().display());
            fs::write(tools.script(tool), body).expect("write fake tool script");
        }
        tools.set_template(SAMPLE_TEMPLATE);
        tools
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    fn script(&self, tool: Tool) -> PathBuf {
        self.dir.path().join(format!("{}.sh", tool.name()))
    }

    /// Command vectors running the scripts.
    pub fn config(&self) -> ToolsConfig {
        let mut config = ToolsConfig::default();
        for tool in Tool::ALL {
            config.set(tool, vec!["sh".to_string(), self.script(tool).display().to_string()]);
        }
        config
    }

    /// Replaces the template the generators produce from now on.
    pub fn set_template(&self, text: &str) {
        fs::write(self.dir.path().join("template.pot"), text).expect("write fake template");
    }

    /// Lines `intltool-update -m` leaves in the `missing` file.
    pub fn set_missing(&self, lines: &[&str]) {
        let text: String = lines.iter().map(|l| format!("{l}\n")).collect();
        fs::write(self.dir.path().join("missing"), text).expect("write fake missing file");
    }

    /// Makes `tool` exit non-zero. For `msgmerge`, `catalog` names the
    /// catalog file (`fr.po`) that fails; other catalogs still merge.
    pub fn fail(&self, tool: Tool, catalog: Option<&str>) {
        let marker = match catalog {
            Some(catalog) => format!("fail-{}-{catalog}", tool.name()),
            None => format!("fail-{}", tool.name()),
        };
        fs::write(self.dir.path().join(marker), "").expect("write failure marker");
    }

    /// Every recorded command line, oldest first.
    pub fn invocations(&self) -> Vec<String> {
        fs::read_to_string(self.dir.path().join("invocations.log"))
            .map(|log| log.lines().map(str::to_string).collect())
            .unwrap_or_default()
    }

    /// Recorded command lines of `tool`.
    pub fn invocations_of(&self, tool: Tool) -> Vec<String> {
        let prefix = format!("{} ", tool.name());
        self.invocations().into_iter().filter(|line| line.starts_with(&prefix)).collect()
    }

    pub fn clear_invocations(&self) {
        let _ = fs::remove_file(self.dir.path().join("invocations.log"));
    }
}

impl Default for FakeTools {
    fn default() -> Self {
        Self::new()
    }
}

/// A temporary source tree plus state and output directories.
pub struct SweepTree {
    dir: TempDir,
    pub tools: FakeTools,
}

impl SweepTree {
    pub fn new() -> Self {
        Self {
            dir: TempDir::new().expect("create sweep tree"),
            tools: FakeTools::new(),
        }
    }

    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    pub fn state_dir(&self) -> PathBuf {
        self.dir.path().join("state")
    }

    pub fn output_dir(&self) -> PathBuf {
        self.dir.path().join("output")
    }

    /// Writes `content` to `relative`, creating parents.
    pub fn write(&self, relative: &str, content: &str) -> PathBuf {
        let path = self.dir.path().join(relative);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("create parent directory");
        }
        fs::write(&path, content).expect("write tree file");
        path
    }

    /// Configuration pointing at this tree's directories and fake tools.
    pub fn config(&self) -> SweepConfig {
        SweepConfig {
            state_dir: Some(self.state_dir()),
            output_dir: Some(self.output_dir()),
            tools: self.tools.config(),
            ..SweepConfig::default()
        }
    }

    /// A `sweep.toml` with [`Self::config`] written into the tree.
    pub fn write_config(&self) -> PathBuf {
        let text = toml::to_string_pretty(&self.config()).expect("serialize sweep config");
        self.write("sweep.toml", &text)
    }
}

impl Default for SweepTree {
    fn default() -> Self {
        Self::new()
    }
}
