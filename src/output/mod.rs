//! Result rendering
//!
//! Renders an installation report as a table for humans or as JSON/YAML for
//! tooling. Structured formats carry the full [`InstallationResult`] so that
//! summaries can be derived without re-running the install.

mod table;

pub use table::render_table;

use serde::{Deserialize, Serialize};
use std::fmt;
use std::io::Write;
use std::str::FromStr;

use crate::install::{InstallError, InstallationResult, Phase};

/// Output format selector
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Table,
    Json,
    Yaml,
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            OutputFormat::Table => "table",
            OutputFormat::Json => "json",
            OutputFormat::Yaml => "yaml",
        })
    }
}

#[derive(Debug, thiserror::Error)]
#[error("unknown output format '{0}' (expected table, json or yaml)")]
pub struct UnknownFormat(String);

impl FromStr for OutputFormat {
    type Err = UnknownFormat;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "table" => Ok(OutputFormat::Table),
            "json" => Ok(OutputFormat::Json),
            "yaml" | "yml" => Ok(OutputFormat::Yaml),
            _ => Err(UnknownFormat(s.to_string())),
        }
    }
}

/// Error details attached to a failed run's report
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorReport {
    pub kind: String,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phase: Option<Phase>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resource: Option<String>,
}

impl From<&InstallError> for ErrorReport {
    fn from(error: &InstallError) -> Self {
        Self {
            kind: error.kind().to_string(),
            message: error.to_string(),
            phase: error.phase(),
            resource: error.resource().map(str::to_string),
        }
    }
}

/// What the `install` command reports
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InstallReport {
    #[serde(flatten)]
    pub result: InstallationResult,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorReport>,
}

impl InstallReport {
    pub fn success(result: InstallationResult) -> Self {
        Self {
            result,
            error: None,
        }
    }

    pub fn failure(result: InstallationResult, error: &InstallError) -> Self {
        Self {
            result,
            error: Some(ErrorReport::from(error)),
        }
    }
}

/// Write a report in the requested format
pub fn write_report<W: Write>(
    out: &mut W,
    format: OutputFormat,
    report: &InstallReport,
    color: bool,
) -> anyhow::Result<()> {
    match format {
        OutputFormat::Table => {
            out.write_all(render_table(report, color).as_bytes())?;
        }
        OutputFormat::Json => {
            serde_json::to_writer_pretty(&mut *out, report)?;
            writeln!(out)?;
        }
        OutputFormat::Yaml => {
            serde_yaml::to_writer(&mut *out, report)?;
        }
    }
    out.flush()?;
    Ok(())
}
