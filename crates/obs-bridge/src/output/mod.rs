//! Output formatting utilities for the CLI
//!
//! Tables for scenes and toggle results, the status summary, and colored
//! one-line status messages.

use std::io::Write;

use crossterm::style::{Color, Print, ResetColor, SetForegroundColor};
use tabled::{settings::Style, Table, Tabled};

use obs_core::{Scene, ToggleOutcome};

/// Everything `obs-remote status` reports
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusReport {
    pub address: String,
    pub connected: bool,
    pub error: Option<String>,
    pub obs_version: Option<String>,
    pub current_scene: Option<String>,
    pub recording: Option<bool>,
    pub streaming: Option<bool>,
}

/// Format scenes as a table, marking the current one
pub fn format_scenes(scenes: &[Scene], current: Option<&str>) -> String {
    if scenes.is_empty() {
        return "No scenes".to_string();
    }

    #[derive(Tabled)]
    struct SceneRow {
        #[tabled(rename = "")]
        marker: &'static str,
        #[tabled(rename = "SCENE")]
        name: String,
        #[tabled(rename = "INDEX")]
        index: i64,
    }

    let rows: Vec<SceneRow> = scenes
        .iter()
        .map(|s| SceneRow {
            marker: if Some(s.name.as_str()) == current { "*" } else { "" },
            name: s.name.clone(),
            index: s.index,
        })
        .collect();

    Table::new(rows).with(Style::rounded()).to_string()
}

/// Format a list of source names, one per line
pub fn format_sources(sources: &[String]) -> String {
    if sources.is_empty() {
        return "No matching sources".to_string();
    }
    sources.join("\n")
}

/// Format the per-scene results of a cross-scene toggle
pub fn format_toggle_outcome(outcome: &ToggleOutcome) -> String {
    #[derive(Tabled)]
    struct ResultRow {
        #[tabled(rename = "SCENE")]
        scene: String,
        #[tabled(rename = "RESULT")]
        result: String,
    }

    let rows: Vec<ResultRow> = outcome
        .results
        .iter()
        .map(|r| ResultRow {
            scene: r.scene.clone(),
            result: match &r.error {
                None => "ok".to_string(),
                Some(e) => e.clone(),
            },
        })
        .collect();

    format!(
        "{} {} in {}/{} scenes\n{}",
        outcome.source,
        if outcome.enabled { "shown" } else { "hidden" },
        outcome.succeeded,
        outcome.attempted,
        Table::new(rows).with(Style::rounded())
    )
}

/// Format the status summary
pub fn format_status(status: &StatusReport) -> String {
    let mut output = String::new();

    output.push_str(&format!("OBS: {}\n", status.address));
    output.push_str(&format!(
        "Connection: {}\n",
        if status.connected { "Connected" } else { "Disconnected" }
    ));
    if let Some(error) = &status.error {
        output.push_str(&format!("Error: {}\n", error));
    }
    if let Some(version) = &status.obs_version {
        output.push_str(&format!("Version: {}\n", version));
    }
    if status.connected {
        output.push_str(&format!(
            "Current Scene: {}\n",
            status.current_scene.as_deref().unwrap_or("-")
        ));
        output.push_str(&format!("Recording: {}\n", on_off(status.recording)));
        output.push_str(&format!("Streaming: {}\n", on_off(status.streaming)));
    }

    output
}

fn on_off(value: Option<bool>) -> &'static str {
    match value {
        Some(true) => "on",
        Some(false) => "off",
        None => "unknown",
    }
}

/// Print a success message in green with a checkmark prefix
pub fn print_success(msg: &str) {
    print_tagged(&mut std::io::stdout(), Color::Green, "✓", msg);
}

/// Print an error message in red to stderr
pub fn print_error(msg: &str) {
    print_tagged(&mut std::io::stderr(), Color::Red, "✗", msg);
}

/// Print a warning message in yellow to stderr
pub fn print_warning(msg: &str) {
    print_tagged(&mut std::io::stderr(), Color::Yellow, "⚠", msg);
}

pub fn print_info(msg: &str) {
    print_tagged(&mut std::io::stdout(), Color::Cyan, "ℹ", msg);
}

fn print_tagged(out: &mut impl Write, color: Color, tag: &str, msg: &str) {
    let _ = crossterm::execute!(
        out,
        SetForegroundColor(color),
        Print(tag),
        Print(" "),
        ResetColor,
        Print(msg),
        Print("\n")
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use obs_core::SceneApplyResult;

    #[test]
    fn test_format_scenes_marks_current() {
        let scenes = vec![Scene::new("Intro", 0), Scene::new("Main", 1)];
        let table = format_scenes(&scenes, Some("Main"));
        let main_line = table.lines().find(|l| l.contains("Main")).unwrap();
        assert!(main_line.contains('*'));
        let intro_line = table.lines().find(|l| l.contains("Intro")).unwrap();
        assert!(!intro_line.contains('*'));
        assert_eq!(format_scenes(&[], None), "No scenes");
    }

    #[test]
    fn test_format_toggle_outcome() {
        let outcome = ToggleOutcome {
            source: "Camera".to_string(),
            enabled: false,
            succeeded: 1,
            attempted: 2,
            results: vec![
                SceneApplyResult {
                    scene: "Intro".to_string(),
                    success: true,
                    error: None,
                },
                SceneApplyResult {
                    scene: "Main".to_string(),
                    success: false,
                    error: Some("locked".to_string()),
                },
            ],
        };
        let text = format_toggle_outcome(&outcome);
        assert!(text.starts_with("Camera hidden in 1/2 scenes"));
        assert!(text.contains("locked"));
    }

    #[test]
    fn test_format_status_disconnected() {
        let status = StatusReport {
            address: "ws://localhost:4455".to_string(),
            connected: false,
            error: Some("Connection timeout after 5s".to_string()),
            obs_version: None,
            current_scene: None,
            recording: None,
            streaming: None,
        };
        let text = format_status(&status);
        assert!(text.contains("Connection: Disconnected"));
        assert!(text.contains("Error: Connection timeout after 5s"));
        assert!(!text.contains("Recording"));
    }

    #[test]
    fn test_format_status_connected() {
        let status = StatusReport {
            address: "ws://localhost:4455".to_string(),
            connected: true,
            error: None,
            obs_version: Some("30.2.3".to_string()),
            current_scene: Some("Main".to_string()),
            recording: Some(true),
            streaming: None,
        };
        let text = format_status(&status);
        assert!(text.contains("Version: 30.2.3"));
        assert!(text.contains("Current Scene: Main"));
        assert!(text.contains("Recording: on"));
        assert!(text.contains("Streaming: unknown"));
    }
}
