//! Table rendering for install reports

use crossterm::style::Stylize;
use std::fmt::Write;

use super::InstallReport;
use crate::install::{Phase, PhaseSummary};

const COMPONENT_WIDTH: usize = 30;
const COUNT_WIDTH: usize = 11;

/// Label shown in the STATUS column for a phase
fn phase_label(report: &InstallReport, phase: Phase, summary: &PhaseSummary) -> &'static str {
    if summary.failed > 0 {
        return "Failed";
    }

    if let Some(error) = &report.error {
        if error.phase == Some(phase) {
            return if error.kind == "Timeout" {
                "Not ready"
            } else {
                "Incomplete"
            };
        }
        if report.result.phase(phase).is_empty() {
            return "Not attempted";
        }
    }

    if summary.installed > 0 {
        "Installed"
    } else if summary.already_present > 0 {
        "Up to date"
    } else {
        "No resources"
    }
}

fn paint(label: &str, color: bool) -> String {
    if !color {
        return label.to_string();
    }
    match label {
        "Installed" | "Up to date" => label.green().to_string(),
        "Failed" | "Not ready" | "Incomplete" => label.red().to_string(),
        "Not attempted" => label.yellow().to_string(),
        _ => label.to_string(),
    }
}

/// Render a report as a fixed-width table
///
/// Skipped phases are omitted. `color` adds ANSI styling to the status column
/// and the closing banner.
pub fn render_table(report: &InstallReport, color: bool) -> String {
    let mut out = String::new();

    let _ = writeln!(
        out,
        "{:<cw$}{:<nw$}{:<nw$}STATUS",
        "COMPONENT",
        "INSTALLED",
        "PRESENT",
        cw = COMPONENT_WIDTH,
        nw = COUNT_WIDTH
    );

    for phase in Phase::ALL {
        if report.result.is_skipped(phase) {
            continue;
        }
        let summary = report.result.summary(phase);
        let label = phase_label(report, phase, &summary);
        let _ = writeln!(
            out,
            "{:<cw$}{:<nw$}{:<nw$}{}",
            phase.display_name(),
            summary.installed,
            summary.already_present,
            paint(label, color),
            cw = COMPONENT_WIDTH,
            nw = COUNT_WIDTH
        );
    }

    let banner = match &report.error {
        None => "SiteWhere installed".to_string(),
        Some(error) => format!("SiteWhere installation failed: {}", error.message),
    };
    let banner = match (color, report.error.is_some()) {
        (false, _) => banner,
        (true, false) => banner.green().bold().to_string(),
        (true, true) => banner.red().bold().to_string(),
    };
    let _ = writeln!(out, "{}", banner);

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::install::{InstallError, InstallationResult, Status};
    use std::time::Duration;

    fn result() -> InstallationResult {
        let mut result = InstallationResult::new();
        result.resource_definitions.record("a", Status::Installed);
        result.resource_definitions.record("b", Status::AlreadyPresent);
        result.templates.record("t", Status::AlreadyPresent);
        result
    }

    #[test]
    fn test_skipped_phase_is_omitted() {
        let mut result = result();
        result.skip_operator = true;
        let table = render_table(&InstallReport::success(result), false);
        assert!(!table.contains("Operator"));
        assert!(table.contains("Infrastructure"));
    }

    #[test]
    fn test_labels_follow_outcomes() {
        let table = render_table(&InstallReport::success(result()), false);
        let lines: Vec<&str> = table.lines().collect();
        assert!(lines[1].starts_with("Custom Resource Definitions"));
        assert!(lines[1].ends_with("Installed"));
        assert!(lines[2].ends_with("Up to date"));
        assert!(lines[3].ends_with("No resources"));
    }

    #[test]
    fn test_timeout_marks_phase_not_ready() {
        let error = InstallError::Timeout {
            phase: Phase::Templates,
            timeout: Duration::from_secs(1),
            pending: vec!["t".to_string()],
        };
        let table = render_table(&InstallReport::failure(result(), &error), false);
        let lines: Vec<&str> = table.lines().collect();
        assert!(lines[2].ends_with("Not ready"));
        assert!(lines[3].ends_with("Not attempted"));
        assert!(lines[5].starts_with("SiteWhere installation failed"));
    }

    #[test]
    fn test_color_adds_ansi_codes() {
        let table = render_table(&InstallReport::success(result()), true);
        assert!(table.contains("\u{1b}["));
    }
}
