//! Terminal output: colored status lines, a progress bar while resolving, and
//! the end-of-run summary table.

use comfy_table::{Attribute, Cell, Color, ContentArrangement, Table};
use indicatif::{ProgressBar, ProgressStyle};
use owo_colors::OwoColorize;
use std::io::IsTerminal;

use crate::models::{MatchOutcome, MatchVerdict};
use crate::report::{reason_sentence, ReportSummary};

/// Get the current terminal width.
pub fn terminal_width() -> usize {
    terminal_size::terminal_size()
        .map(|(w, _)| w.0 as usize)
        .unwrap_or(100)
}

/// Check if stderr is a terminal (progress output goes there).
pub fn is_terminal() -> bool {
    std::io::stderr().is_terminal()
}

/// Status types for colored output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Success,
    Error,
    Warning,
    Info,
}

/// Status icons for different outcomes.
pub fn status_icon(status: Status) -> &'static str {
    match status {
        Status::Success => "✓",
        Status::Error => "✗",
        Status::Warning => "⚠",
        Status::Info => "ℹ",
    }
}

/// How a verdict is shown in terminal output
pub fn verdict_status(verdict: &MatchVerdict) -> Status {
    if !verdict.is_found() {
        Status::Error
    } else if verdict.is_retracted() {
        Status::Warning
    } else {
        Status::Success
    }
}

/// Print a styled status message to stderr.
pub fn print_status(status: Status, msg: &str) {
    let icon = status_icon(status);
    match status {
        Status::Success => eprintln!("{} {}", icon.green().bold(), msg),
        Status::Error => eprintln!("{} {}", icon.red().bold(), msg),
        Status::Warning => eprintln!("{} {}", icon.yellow().bold(), msg),
        Status::Info => eprintln!("{} {}", icon.cyan().bold(), msg),
    }
}

/// Print a section header.
pub fn print_section(title: &str) {
    println!();
    println!("{}", format!("━━━ {} ━━━", title).bold().cyan());
}

/// Truncate text to at most `max_width` characters, ending in `...` when cut.
pub fn truncate_with_ellipsis(text: &str, max_width: usize) -> String {
    if max_width <= 3 {
        return "...".to_string();
    }
    if text.chars().count() <= max_width {
        return text.to_string();
    }
    let truncated: String = text.chars().take(max_width - 3).collect();
    format!("{}...", truncated.trim_end())
}

/// Progress bar over the reference list
pub struct ResolutionProgress {
    pb: ProgressBar,
}

impl ResolutionProgress {
    /// A bar of `total` references; hidden when `visible` is false
    pub fn new(total: usize, visible: bool) -> Self {
        let pb = if visible {
            ProgressBar::new(total as u64)
        } else {
            ProgressBar::hidden()
        };
        let style = ProgressStyle::with_template(
            "{spinner:.cyan} Resolving {bar:40.cyan/blue} {pos}/{len} {wide_msg}",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█▓▒░ ");
        pb.set_style(style);

        Self { pb }
    }

    /// Advance past one resolved reference
    pub fn advance(&self, verdict: &MatchVerdict) {
        let width = terminal_width().saturating_sub(70).max(20);
        self.pb.set_message(truncate_with_ellipsis(&verdict.input, width));
        self.pb.inc(1);
    }

    /// Clear the bar
    pub fn finish(&self) {
        self.pb.finish_and_clear();
    }
}

/// Per-reference summary table
pub fn summary_table(verdicts: &[MatchVerdict]) -> Table {
    let mut table = Table::new();
    table.load_preset(comfy_table::presets::UTF8_FULL);
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_width(terminal_width().min(160) as u16);
    table.set_header(vec!["#", "Status", "Method", "DOI / Reason", "Reference"]);

    for (index, verdict) in verdicts.iter().enumerate() {
        let (label, color) = match verdict_status(verdict) {
            Status::Success => ("ok", Color::Green),
            Status::Warning => ("retracted", Color::Yellow),
            _ => ("not found", Color::Red),
        };
        let detail = match &verdict.outcome {
            MatchOutcome::Found { doi, .. } => doi.clone().unwrap_or_else(|| "N/A".to_string()),
            MatchOutcome::NotFound { reason, method, .. } => reason_sentence(*method, *reason),
        };
        let method = verdict
            .method()
            .map(|m| m.label().to_string())
            .unwrap_or_default();

        table.add_row(vec![
            Cell::new(index + 1),
            Cell::new(label).fg(color).add_attribute(Attribute::Bold),
            Cell::new(method),
            Cell::new(detail),
            Cell::new(truncate_with_ellipsis(&verdict.input, 60)),
        ]);
    }
    table
}

/// One-line totals
pub fn summary_line(summary: &ReportSummary) -> String {
    format!(
        "{} references: {} ok, {} not found, {} retracted",
        summary.total, summary.ok, summary.not_found, summary.retracted
    )
}

/// Print the summary table and totals to stdout
pub fn print_summary(verdicts: &[MatchVerdict]) {
    let summary = ReportSummary::from_verdicts(verdicts);
    if !verdicts.is_empty() {
        print_section("Summary");
        println!("{}", summary_table(verdicts));
    }
    let status = if summary.problems() == 0 {
        Status::Success
    } else {
        Status::Warning
    };
    print_status(status, &summary_line(&summary));
}
