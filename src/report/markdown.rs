// src/report/markdown.rs

use std::fmt::Write;

use super::{Report, BAR_CHART_FILE, RADAR_CHART_FILE};

fn escape_cell(s: &str) -> String {
    s.replace('|', "\\|")
}

/// Markdown report: score table, optional chart images, one collapsible panel per section.
pub fn render_markdown(report: &Report, with_charts: bool) -> String {
    let mut out = String::new();

    let _ = writeln!(out, "# DevOps Maturity Report\n");
    let _ = writeln!(out, "**Respondent**: {}  ", report.respondent);
    if let Some(at) = report.completed_at {
        let _ = writeln!(out, "**Completed**: {}  ", at.format("%Y-%m-%d %H:%M:%S"));
    }
    let _ = writeln!(out);

    let _ = writeln!(out, "## DevOps Maturity Scores by Section\n");
    if report.sections.is_empty() {
        let _ = writeln!(out, "_No scored sections for this respondent._");
        return out;
    }
    let _ = writeln!(out, "| Section | Score |");
    let _ = writeln!(out, "|---|---:|");
    for s in &report.sections {
        let _ = writeln!(out, "| {} | {:.2} |", escape_cell(&s.section), s.score);
    }
    let _ = writeln!(out);

    if with_charts {
        let _ = writeln!(out, "![Section-wise Maturity Scores]({})\n", BAR_CHART_FILE);
        let _ = writeln!(out, "![Radar Chart - Section Scores]({})\n", RADAR_CHART_FILE);
    }

    let _ = writeln!(out, "## Recommendations by Section\n");
    for s in report.sections.iter().filter(|s| s.has_table) {
        let _ = writeln!(out, "<details>");
        let _ = writeln!(
            out,
            "<summary>{} - Level {} Recommendations</summary>\n",
            s.section, s.level
        );
        if s.recommendations.is_empty() {
            let _ = writeln!(out, "_No recommendations at this level._\n");
        }
        for rec in &s.recommendations {
            let _ = writeln!(out, "**Category**: {}  ", rec.category);
            let _ = writeln!(out, "**Recommendation**: {}\n", rec.text);
        }
        let _ = writeln!(out, "</details>\n");
    }

    if !report.collisions.is_empty() {
        let _ = writeln!(out, "## Mapping notes\n");
        for c in &report.collisions {
            let _ = writeln!(
                out,
                "- Column \"{}\" was mapped to *{}* and then to *{}*; *{}* was used.",
                c.column, c.previous_section, c.section, c.section
            );
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matcher::Collision;
    use crate::recommend::{Recommendation, SectionRecommendations};

    fn report() -> Report {
        Report {
            respondent: "a@x.com".into(),
            completed_at: None,
            sections: vec![SectionRecommendations {
                section: "Build | Release".into(),
                score: 3.5,
                level: 4,
                has_table: true,
                recommendations: vec![Recommendation {
                    category: "Automation".into(),
                    text: "Deploy on merge".into(),
                }],
            }],
            collisions: vec![Collision {
                column: "Q".into(),
                previous_question: "Q?".into(),
                previous_section: "A".into(),
                question: "Q".into(),
                section: "B".into(),
            }],
            unmatched_questions: Vec::new(),
        }
    }

    #[test]
    fn panels_and_notes() {
        let md = render_markdown(&report(), true);
        assert!(md.contains("| Build \\| Release | 3.50 |"));
        assert!(md.contains("<summary>Build | Release - Level 4 Recommendations</summary>"));
        assert!(md.contains("**Category**: Automation"));
        assert!(md.contains(BAR_CHART_FILE));
        assert!(md.contains("## Mapping notes"));
    }

    #[test]
    fn charts_omitted_when_not_rendered() {
        let md = render_markdown(&report(), false);
        assert!(!md.contains(RADAR_CHART_FILE));
    }
}
