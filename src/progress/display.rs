//! Terminal readout for a followed build

use super::state::{BuildStatus, ProgressState};
use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

/// Agents the orchestrator runs in parallel within each phase
pub const PHASES: &[&[&str]] = &[
    &["Planner"],
    &["Requirements Clarifier", "Stack Selector"],
    &[
        "Frontend Generation",
        "Backend Generation",
        "Database Agent",
        "API Integration",
        "Test Generation",
        "Image Generation",
    ],
    &[
        "Video Generation",
        "Security Checker",
        "Test Executor",
        "UX Auditor",
        "Performance Analyzer",
    ],
    &["Deployment Agent", "Error Recovery", "Memory Agent"],
    &[
        "PDF Export",
        "Excel Export",
        "Markdown Export",
        "Scraping Agent",
        "Automation Agent",
    ],
];

/// `phase` is 1-based as reported by the backend; 0 means not started
pub fn phase_label(phase: u32) -> String {
    match phase.checked_sub(1).and_then(|i| PHASES.get(i as usize)) {
        Some(agents) => format!("phase {}/{} ({})", phase, PHASES.len(), agents.join(", ")),
        None if phase == 0 => "starting".to_string(),
        None => format!("phase {phase}"),
    }
}

pub fn format_state(state: &ProgressState) -> String {
    let mut line = phase_label(state.phase);
    if !state.agent.is_empty() {
        line.push_str(&format!(" | {}", state.agent));
    }
    if state.tokens_used > 0 {
        line.push_str(&format!(" | {} tokens", state.tokens_used));
    }
    if state.stale {
        line.push_str(" | stale");
    }
    line
}

pub struct ProgressDisplay {
    bar: ProgressBar,
}

impl ProgressDisplay {
    pub fn new() -> Self {
        let bar = ProgressBar::new(100);
        bar.set_style(
            ProgressStyle::default_bar()
                .template(
                    "{spinner:.green} [{elapsed_precise}] {bar:40.cyan/blue} {pos:>3}% {msg}",
                )
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("##-"),
        );
        bar.enable_steady_tick(Duration::from_millis(120));
        Self { bar }
    }

    pub fn hidden() -> Self {
        Self {
            bar: ProgressBar::hidden(),
        }
    }

    pub fn update(&self, state: &ProgressState) {
        self.bar.set_position(u64::from(state.percent));
        self.bar.set_message(format_state(state));
    }

    pub fn finish(&self, state: &ProgressState) {
        self.update(state);
        let verdict = match state.status {
            BuildStatus::Completed => "build completed",
            BuildStatus::Failed => "build failed",
            _ if state.stale => "progress unavailable",
            _ => "stopped following",
        };
        self.bar
            .finish_with_message(format!("{verdict} | {}", format_state(state)));
    }
}

impl Default for ProgressDisplay {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_phase_labels() {
        assert_eq!(phase_label(0), "starting");
        assert_eq!(phase_label(1), "phase 1/6 (Planner)");
        assert!(phase_label(2).contains("Stack Selector"));
        assert_eq!(phase_label(9), "phase 9");
    }

    #[test]
    fn test_format_state_includes_stale_marker() {
        let state = ProgressState {
            phase: 3,
            agent: "Database Agent".to_string(),
            tokens_used: 1200,
            stale: true,
            ..ProgressState::default()
        };
        let line = format_state(&state);
        assert!(line.contains("Database Agent"));
        assert!(line.contains("1200 tokens"));
        assert!(line.ends_with("stale"));
    }

    #[test]
    fn test_hidden_display_tracks_percent() {
        let display = ProgressDisplay::hidden();
        let state = ProgressState {
            percent: 42,
            ..ProgressState::default()
        };
        display.update(&state);
        assert_eq!(display.bar.position(), 42);
    }
}
