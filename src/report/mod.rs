//! Report rendering for resolved verdicts.
//!
//! Markdown comes in two shapes: problems only (not found or retracted) and a
//! full listing that also includes the references that resolved cleanly. JSON
//! export serializes the verdict list with a summary block.

use serde::Serialize;
use std::path::Path;

use crate::models::{DebugCandidate, MatchMethod, MatchOutcome, MatchVerdict, MissReason};

/// Output format for the written report
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum ReportFormat {
    #[default]
    Markdown,
    Json,
}

/// Counts over a verdict list
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ReportSummary {
    pub total: usize,
    pub ok: usize,
    pub not_found: usize,
    pub retracted: usize,
}

impl ReportSummary {
    pub fn from_verdicts(verdicts: &[MatchVerdict]) -> Self {
        let mut summary = Self {
            total: verdicts.len(),
            ..Default::default()
        };
        for verdict in verdicts {
            if !verdict.is_found() {
                summary.not_found += 1;
            } else if verdict.is_retracted() {
                summary.retracted += 1;
            } else {
                summary.ok += 1;
            }
        }
        summary
    }

    pub fn problems(&self) -> usize {
        self.not_found + self.retracted
    }
}

#[derive(Serialize)]
struct JsonReport<'a> {
    tool: &'static str,
    version: &'static str,
    summary: ReportSummary,
    verdicts: &'a [MatchVerdict],
}

/// Render `verdicts` in `format`; `include_ok` selects the full Markdown listing
pub fn render(
    verdicts: &[MatchVerdict],
    format: ReportFormat,
    include_ok: bool,
) -> Result<String, serde_json::Error> {
    match format {
        ReportFormat::Markdown if include_ok => Ok(markdown_full(verdicts)),
        ReportFormat::Markdown => Ok(markdown_problems_only(verdicts)),
        ReportFormat::Json => render_json(verdicts),
    }
}

/// Pretty-printed JSON with a summary block
pub fn render_json(verdicts: &[MatchVerdict]) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(&JsonReport {
        tool: env!("CARGO_PKG_NAME"),
        version: env!("CARGO_PKG_VERSION"),
        summary: ReportSummary::from_verdicts(verdicts),
        verdicts,
    })
}

/// Markdown listing only not-found and retracted references
pub fn markdown_problems_only(verdicts: &[MatchVerdict]) -> String {
    let mut lines = vec![
        "# Reference Audit Report".to_string(),
        String::new(),
        "Only references with problems (not found, or retracted and equivalent) are listed."
            .to_string(),
        String::new(),
    ];

    let problems: Vec<&MatchVerdict> = verdicts.iter().filter(|v| v.is_problem()).collect();
    if problems.is_empty() {
        lines.push("_No problematic references were found._".to_string());
    } else {
        for verdict in problems {
            lines.extend(problem_section(verdict));
        }
    }
    lines.join("\n")
}

/// Markdown listing every reference, problems first
pub fn markdown_full(verdicts: &[MatchVerdict]) -> String {
    let summary = ReportSummary::from_verdicts(verdicts);
    let mut lines = vec![
        "# Reference Audit Report (Full)".to_string(),
        String::new(),
        format!(
            "Total: {}, OK: {}, Problems: {}",
            summary.total,
            summary.ok,
            summary.problems()
        ),
        String::new(),
        "## Problems".to_string(),
        String::new(),
    ];

    let (problems, ok): (Vec<&MatchVerdict>, Vec<&MatchVerdict>) =
        verdicts.iter().partition(|v| v.is_problem());

    if problems.is_empty() {
        lines.push("_No problematic references were found._".to_string());
        lines.push(String::new());
    } else {
        for verdict in problems {
            lines.extend(problem_section(verdict));
        }
    }

    lines.push("## OK".to_string());
    lines.push(String::new());
    if ok.is_empty() {
        lines.push("_No references resolved cleanly._".to_string());
    } else {
        for verdict in ok {
            lines.push("### ✅ OK".to_string());
            lines.push(format!("- Input: `{}`", verdict.input));
            lines.push(format!("- Match: **{}**", display_title(verdict.title())));
            lines.push(format!("- DOI: `{}`", verdict.doi().unwrap_or("N/A")));
            if let Some(method) = verdict.method() {
                lines.push(format!("- Method: `{}`", method));
            }
            lines.push(String::new());
        }
    }
    lines.join("\n")
}

/// One-sentence explanation of a miss from the last method tried and the note
pub fn reason_sentence(method: Option<MatchMethod>, reason: MissReason) -> String {
    let mismatch = match reason {
        MissReason::NoMatch => None,
        MissReason::TitleMismatch => Some("title mismatch"),
        MissReason::YearMismatch => Some("year mismatch"),
        MissReason::AuthorMismatch => Some("author mismatch"),
    };

    match (method, mismatch) {
        (Some(MatchMethod::DirectDoi), None) => "DOI lookup `/works/{doi}` failed".to_string(),
        (Some(MatchMethod::DoiFallbackToBibliographic), None) => {
            "DOI lookup failed, and `query.bibliographic` found no candidate".to_string()
        }
        (Some(MatchMethod::Bibliographic), None) => {
            "`query.bibliographic` found no candidate".to_string()
        }
        (_, None) => "No candidate found".to_string(),
        (Some(MatchMethod::DoiFallbackToBibliographic), Some(what)) => format!(
            "DOI lookup failed, and the `query.bibliographic` candidate was rejected ({})",
            what
        ),
        (_, Some(what)) => format!("The `query.bibliographic` candidate was rejected ({})", what),
    }
}

fn display_title(title: Option<&str>) -> &str {
    match title {
        Some(t) if !t.trim().is_empty() => t,
        _ => "(no title)",
    }
}

fn candidate_line(candidate: &DebugCandidate) -> String {
    let mut line = format!(
        "  - `{}` {}",
        candidate.doi.as_deref().unwrap_or("N/A"),
        display_title(Some(&candidate.title))
    );
    if let Some(year) = candidate.year {
        line.push_str(&format!(" ({})", year));
    }
    if let Some(container) = &candidate.container_title {
        line.push_str(&format!(", {}", container));
    }
    if let Some(page) = &candidate.page {
        line.push_str(&format!(", p. {}", page));
    }
    line
}

fn problem_section(verdict: &MatchVerdict) -> Vec<String> {
    match &verdict.outcome {
        MatchOutcome::NotFound {
            reason,
            method,
            debug_candidates,
            suggestions,
        } => {
            let mut lines = vec![
                "## ❌ Not found".to_string(),
                String::new(),
                format!("- Input: `{}`", verdict.input),
                format!("- Reason: {}", reason_sentence(*method, *reason)),
            ];
            if !debug_candidates.is_empty() {
                lines.push("- Closest Crossref candidates:".to_string());
                lines.extend(debug_candidates.iter().map(candidate_line));
            }
            if !suggestions.is_empty() {
                lines.push("- Search manually:".to_string());
                lines.extend(suggestions.iter().map(|url| format!("  - <{}>", url)));
            }
            lines.push(String::new());
            lines
        }
        MatchOutcome::Found {
            doi,
            title,
            retraction_notices,
            ..
        } => {
            let mut lines = vec![
                "## 🚩 Retracted or equivalent (Crossref update notices)".to_string(),
                String::new(),
                format!("- Input: `{}`", verdict.input),
                format!("- Match: **{}**", display_title(Some(title))),
                format!("- DOI: `{}`", doi.as_deref().unwrap_or("N/A")),
                String::new(),
                "### Update notices".to_string(),
                String::new(),
            ];
            for notice in retraction_notices {
                let when = notice
                    .updated
                    .map(|d| d.to_rfc3339())
                    .unwrap_or_else(|| "N/A".to_string());
                lines.push(format!(
                    "- Type: **{}**, notice DOI: `{}`, source: `{}`, date: `{}`",
                    notice.update_type,
                    notice.notice_doi.as_deref().unwrap_or("N/A"),
                    notice.source.as_deref().unwrap_or("N/A"),
                    when
                ));
            }
            lines.push(String::new());
            lines
        }
    }
}

/// Write a rendered report, creating missing parent directories
pub fn write_report(path: &Path, contents: &str) -> std::io::Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, contents)
}
