//! Sweep configuration file (`~/.blip/sweep.toml`).
//!
//! # Format
//!
//! ```toml
//! # Where fingerprints and cached artifacts metadata are kept
//! state_dir = "/var/lib/blip/state"
//! # Where templates and rendered graphs are written
//! output_dir = "/var/lib/blip/files"
//! # Treat every file as changed
//! force_rescan = false
//! # Per-invocation limit for external tools; 0 disables the limit
//! tool_timeout_secs = 300
//!
//! [tools]
//! intltool_update = ["intltool-update"]
//! xml2po = ["xml2po"]
//! msgmerge = ["msgmerge"]
//! dot = ["dot"]
//! ```
//!
//! Each tool entry is a command vector: the program followed by any leading
//! arguments. The pipeline appends its own arguments after them, so the
//! command shapes (`msgmerge <catalog> <template>`, `dot -Tsvg -o <out>`, ...)
//! are preserved.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::fs;

use crate::constants::DEFAULT_TOOL_TIMEOUT;
use crate::core::SweepError;
use crate::tool::Tool;

const fn default_tool_timeout_secs() -> u64 {
    DEFAULT_TOOL_TIMEOUT.as_secs()
}

fn is_default_tool_timeout_secs(secs: &u64) -> bool {
    *secs == default_tool_timeout_secs()
}

const fn is_false(value: &bool) -> bool {
    !*value
}

/// Top-level sweep configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SweepConfig {
    /// Directory holding the persisted sweep state and its lock
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state_dir: Option<PathBuf>,

    /// Directory receiving generated templates and rendered graphs
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output_dir: Option<PathBuf>,

    /// Report every file as changed regardless of stored fingerprints
    #[serde(default, skip_serializing_if = "is_false")]
    pub force_rescan: bool,

    /// Timeout for a single tool invocation in seconds (0 = no timeout)
    #[serde(
        default = "default_tool_timeout_secs",
        skip_serializing_if = "is_default_tool_timeout_secs"
    )]
    pub tool_timeout_secs: u64,

    /// Command vectors for the external tools
    #[serde(default, skip_serializing_if = "ToolsConfig::is_default")]
    pub tools: ToolsConfig,
}

impl Default for SweepConfig {
    fn default() -> Self {
        Self {
            state_dir: None,
            output_dir: None,
            force_rescan: false,
            tool_timeout_secs: default_tool_timeout_secs(),
            tools: ToolsConfig::default(),
        }
    }
}

/// Command vectors for each external tool.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolsConfig {
    pub intltool_update: Vec<String>,
    pub xml2po: Vec<String>,
    pub msgmerge: Vec<String>,
    pub dot: Vec<String>,
}

impl Default for ToolsConfig {
    fn default() -> Self {
        Self {
            intltool_update: vec!["intltool-update".to_string()],
            xml2po: vec!["xml2po".to_string()],
            msgmerge: vec!["msgmerge".to_string()],
            dot: vec!["dot".to_string()],
        }
    }
}

impl ToolsConfig {
    fn is_default(&self) -> bool {
        *self == Self::default()
    }

    /// Configured command vector for `tool`.
    pub fn command_line(&self, tool: Tool) -> &[String] {
        match tool {
            Tool::IntltoolUpdate => &self.intltool_update,
            Tool::Xml2po => &self.xml2po,
            Tool::Msgmerge => &self.msgmerge,
            Tool::Dot => &self.dot,
        }
    }

    /// Replaces the command vector for `tool`.
    pub fn set(&mut self, tool: Tool, command: Vec<String>) {
        match tool {
            Tool::IntltoolUpdate => self.intltool_update = command,
            Tool::Xml2po => self.xml2po = command,
            Tool::Msgmerge => self.msgmerge = command,
            Tool::Dot => self.dot = command,
        }
    }
}

impl SweepConfig {
    /// Loads from `path` if given, else from [`Self::default_path`]. A missing
    /// file yields the defaults.
    pub async fn load_with_optional(path: Option<PathBuf>) -> Result<Self> {
        let path = match path {
            Some(path) => path,
            None => Self::default_path()?,
        };
        if path.exists() {
            Self::load_from(&path).await
        } else {
            tracing::debug!("No sweep config at {}, using defaults", path.display());
            Ok(Self::default())
        }
    }

    pub async fn load_from(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read sweep config from {}", path.display()))?;

        let config: Self = toml::from_str(&content).map_err(SweepError::from).with_context(|| {
            format!("Failed to parse sweep config from {}", path.display())
        })?;
        config.validate()?;
        Ok(config)
    }

    pub async fn save_to(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self).context("Failed to serialize sweep config")?;
        crate::utils::atomic_write(path, content.as_bytes())
            .with_context(|| format!("Failed to write sweep config to {}", path.display()))
    }

    /// Rejects tool entries with no program.
    pub fn validate(&self) -> Result<(), SweepError> {
        for tool in Tool::ALL {
            if self.tools.command_line(tool).first().is_none_or(|p| p.trim().is_empty()) {
                return Err(SweepError::ConfigError {
                    message: format!("tools.{} must name a program", tool.config_key()),
                });
            }
        }
        Ok(())
    }

    /// `~/.blip/sweep.toml`
    pub fn default_path() -> Result<PathBuf> {
        Ok(Self::base_dir()?.join("sweep.toml"))
    }

    fn base_dir() -> Result<PathBuf> {
        Ok(dirs::home_dir()
            .ok_or_else(|| anyhow::anyhow!("Unable to determine home directory"))?
            .join(".blip"))
    }

    /// Configured state directory or `~/.blip/state`.
    pub fn state_dir(&self) -> Result<PathBuf> {
        match &self.state_dir {
            Some(dir) => Ok(dir.clone()),
            None => Ok(Self::base_dir()?.join("state")),
        }
    }

    /// Configured output directory or `~/.blip/files`.
    pub fn output_dir(&self) -> Result<PathBuf> {
        match &self.output_dir {
            Some(dir) => Ok(dir.clone()),
            None => Ok(Self::base_dir()?.join("files")),
        }
    }

    pub const fn tool_timeout(&self) -> Option<Duration> {
        if self.tool_timeout_secs == 0 {
            None
        } else {
            Some(Duration::from_secs(self.tool_timeout_secs))
        }
    }
}
