//! External tool invocation
//!
//! [`Tool`] names the four tools the pipeline depends on, [`ToolSet`] turns the
//! configured command vectors into ready-to-run [`ToolCommand`]s with the run's
//! timeout applied.

pub mod command_builder;

pub use command_builder::{ToolCommand, ToolOutput};

use std::fmt;
use std::time::Duration;

use crate::config::{SweepConfig, ToolsConfig};
use crate::core::SweepError;

/// External tools used by the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Tool {
    /// `intltool-update`: template generation for gettext domains
    IntltoolUpdate,
    /// `xml2po`: template generation for documentation
    Xml2po,
    /// `msgmerge`: catalog merging
    Msgmerge,
    /// `dot`: graph rendering
    Dot,
}

impl Tool {
    pub const ALL: [Self; 4] = [Self::IntltoolUpdate, Self::Xml2po, Self::Msgmerge, Self::Dot];

    /// Key of the tool in the `[tools]` configuration table.
    pub const fn config_key(self) -> &'static str {
        match self {
            Self::IntltoolUpdate => "intltool_update",
            Self::Xml2po => "xml2po",
            Self::Msgmerge => "msgmerge",
            Self::Dot => "dot",
        }
    }

    pub const fn name(self) -> &'static str {
        match self {
            Self::IntltoolUpdate => "intltool-update",
            Self::Xml2po => "xml2po",
            Self::Msgmerge => "msgmerge",
            Self::Dot => "dot",
        }
    }
}

impl fmt::Display for Tool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Configured tools plus the per-invocation timeout.
#[derive(Debug, Clone)]
pub struct ToolSet {
    tools: ToolsConfig,
    timeout: Option<Duration>,
}

impl ToolSet {
    pub const fn new(tools: ToolsConfig, timeout: Option<Duration>) -> Self {
        Self {
            tools,
            timeout,
        }
    }

    pub fn from_config(config: &SweepConfig) -> Self {
        Self::new(config.tools.clone(), config.tool_timeout())
    }

    /// A builder for `tool` with its configured leading arguments applied.
    pub fn command(&self, tool: Tool) -> Result<ToolCommand, SweepError> {
        Ok(ToolCommand::from_command_line(self.tools.command_line(tool))?
            .named(tool.name())
            .timeout(self.timeout))
    }
}

/// Recovers the [`SweepError`] behind a tool invocation failure; anything
/// else (IO around the invocation) is reported as a failure of `tool`.
pub fn into_tool_error(error: anyhow::Error, tool: Tool) -> SweepError {
    match error.downcast::<SweepError>() {
        Ok(sweep) => sweep,
        Err(other) => SweepError::GeneratorFailure {
            tool: tool.to_string(),
            message: format!("{other:#}"),
        },
    }
}

impl Default for ToolSet {
    fn default() -> Self {
        Self::from_config(&SweepConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_names() {
        assert_eq!(Tool::IntltoolUpdate.to_string(), "intltool-update");
        assert_eq!(Tool::Dot.config_key(), "dot");
    }

    #[test]
    fn test_empty_command_line_is_config_error() {
        let mut tools = ToolsConfig::default();
        tools.set(Tool::Dot, Vec::new());
        let set = ToolSet::new(tools, None);
        assert!(matches!(set.command(Tool::Dot), Err(SweepError::ConfigError { .. })));
        assert!(set.command(Tool::Msgmerge).is_ok());
    }
}
