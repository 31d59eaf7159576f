// src/report/text.rs

use std::fmt::Write;

use super::Report;

const SECTION_HEADER: &str = "Section";
const SCORE_HEADER: &str = "Score";

/// Plain-text rendering for the terminal: score table, then one block per section
/// that has a recommendation table.
pub fn render_text(report: &Report) -> String {
    let mut out = String::new();

    let _ = writeln!(out, "DevOps Maturity Scores by Section");
    let _ = writeln!(out, "Respondent: {}", report.respondent);
    if let Some(at) = report.completed_at {
        let _ = writeln!(out, "Completed:  {}", at.format("%Y-%m-%d %H:%M:%S"));
    }
    let _ = writeln!(out);

    if report.sections.is_empty() {
        let _ = writeln!(out, "No scored sections for this respondent.");
        return out;
    }

    let width = report
        .sections
        .iter()
        .map(|s| s.section.chars().count())
        .chain(std::iter::once(SECTION_HEADER.len()))
        .max()
        .unwrap_or(SECTION_HEADER.len());

    let _ = writeln!(out, "{:<width$} | {}", SECTION_HEADER, SCORE_HEADER);
    let _ = writeln!(out, "{}-+-{}", "-".repeat(width), "-".repeat(SCORE_HEADER.len() + 1));
    for s in &report.sections {
        let _ = writeln!(out, "{:<width$} | {:.2}", s.section, s.score);
    }

    let _ = writeln!(out);
    let _ = writeln!(out, "Recommendations by Section");
    for s in report.sections.iter().filter(|s| s.has_table) {
        let _ = writeln!(out);
        let _ = writeln!(out, "[{} - Level {} Recommendations]", s.section, s.level);
        if s.recommendations.is_empty() {
            let _ = writeln!(out, "  (none at this level)");
        }
        for rec in &s.recommendations {
            let _ = writeln!(out, "  Category:       {}", rec.category);
            let _ = writeln!(out, "  Recommendation: {}", rec.text);
        }
    }
    out
}
