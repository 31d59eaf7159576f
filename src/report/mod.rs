// src/report/mod.rs

pub mod chart;
pub mod markdown;
pub mod text;

use anyhow::{anyhow, Context, Result};
use chrono::NaiveDateTime;
use serde::Serialize;
use std::{
    fs,
    path::{Path, PathBuf},
};
use tracing::{info, instrument, warn};

use crate::config::Config;
use crate::load::Datasets;
use crate::matcher::{mapping_entries, Collision, QuestionIndex};
use crate::recommend::{resolve, RecommendationBook, SectionRecommendations};
use crate::respondent::Roster;
use crate::score::score_sections;

pub const BAR_CHART_FILE: &str = "scores_bar.svg";
pub const RADAR_CHART_FILE: &str = "scores_radar.svg";
pub const MARKDOWN_FILE: &str = "report.md";
pub const JSON_FILE: &str = "report.json";

/// Everything derived from the inputs that does not depend on the selected respondent.
#[derive(Debug, Clone)]
pub struct Assessment {
    index: QuestionIndex,
    roster: Roster,
    book: RecommendationBook,
}

impl Assessment {
    /// Match questions, deduplicate respondents and read the recommendation tables.
    #[instrument(level = "info", skip_all)]
    pub fn prepare(datasets: &Datasets, config: &Config) -> Result<Self> {
        let columns = &config.columns;

        let entries = mapping_entries(&datasets.mapping, columns, &datasets.mapping_path)
            .context("reading mapping entries")?;
        let index = QuestionIndex::build(
            &entries,
            &datasets.responses.headers,
            config.match_threshold,
        );
        let roster = Roster::from_table(&datasets.responses, columns, &datasets.responses_path)
            .context("reading responses")?;
        let book = RecommendationBook::from_workbook(&datasets.recommendations, columns);

        Ok(Self::from_parts(index, roster, book))
    }

    pub fn from_parts(index: QuestionIndex, roster: Roster, book: RecommendationBook) -> Self {
        Self {
            index,
            roster,
            book,
        }
    }

    pub fn index(&self) -> &QuestionIndex {
        &self.index
    }

    pub fn roster(&self) -> &Roster {
        &self.roster
    }

    /// Score and recommend for one respondent. An unknown identity is an error.
    #[instrument(level = "info", skip(self))]
    pub fn report_for(&self, identity: &str) -> Result<Report> {
        let record = self.roster.resolve(identity).ok_or_else(|| {
            anyhow!(
                "no response found for `{}` ({} respondents available)",
                identity,
                self.roster.len()
            )
        })?;

        let scores = score_sections(record, &self.index);
        let sections = resolve(&scores, &self.book);
        info!(sections = sections.len(), "report ready");

        Ok(Report {
            respondent: record.identity.clone(),
            completed_at: record.completed_at,
            sections,
            collisions: self.index.collisions().to_vec(),
            unmatched_questions: self.index.unmatched().to_vec(),
        })
    }
}

/// Per-respondent result handed to the renderers.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Report {
    pub respondent: String,
    pub completed_at: Option<NaiveDateTime>,
    pub sections: Vec<SectionRecommendations>,
    pub collisions: Vec<Collision>,
    pub unmatched_questions: Vec<String>,
}

impl Report {
    /// (section, score) pairs in display order.
    pub fn scores(&self) -> Vec<(String, f64)> {
        self.sections
            .iter()
            .map(|s| (s.section.clone(), s.score))
            .collect()
    }
}

/// Write the Markdown and JSON reports, plus both charts when `charts` is set, into `out_dir`.
/// A chart that fails to render is logged and left out.
#[instrument(level = "info", skip(report), fields(out_dir = %out_dir.display()))]
pub fn write_outputs(report: &Report, out_dir: &Path, charts: bool) -> Result<Vec<PathBuf>> {
    fs::create_dir_all(out_dir)
        .with_context(|| format!("creating output directory {}", out_dir.display()))?;
    let mut written = Vec::new();

    let mut charts_written = false;
    if charts && !report.sections.is_empty() {
        let scores = report.scores();
        let bar = out_dir.join(BAR_CHART_FILE);
        let radar = out_dir.join(RADAR_CHART_FILE);

        let bar_ok = match chart::render_bar_chart(&scores, &bar) {
            Ok(()) => {
                written.push(bar);
                true
            }
            Err(e) => {
                warn!(error = %e, "bar chart not rendered");
                false
            }
        };
        let radar_ok = match chart::render_radar_chart(&scores, &radar) {
            Ok(()) => {
                written.push(radar);
                true
            }
            Err(e) => {
                warn!(error = %e, "radar chart not rendered");
                false
            }
        };
        charts_written = bar_ok && radar_ok;
    }

    let md_path = out_dir.join(MARKDOWN_FILE);
    fs::write(&md_path, markdown::render_markdown(report, charts_written))
        .with_context(|| format!("writing {}", md_path.display()))?;
    written.push(md_path);

    let json_path = out_dir.join(JSON_FILE);
    let json = serde_json::to_string_pretty(report).context("serializing report")?;
    fs::write(&json_path, json).with_context(|| format!("writing {}", json_path.display()))?;
    written.push(json_path);

    info!(files = written.len(), "outputs written");
    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matcher::MappingEntry;
    use crate::recommend::RecommendationTable;
    use crate::respondent::ResponseRecord;
    use crate::load::{Cell, Table, Workbook};
    use crate::config::ColumnNames;
    use std::collections::HashMap;
    use tempfile::tempdir;

    const CI_COLUMN: &str = "How mature is your CI/CD pipeline?";

    fn assessment() -> Assessment {
        let entries = vec![MappingEntry::new(
            "How mature is your CI pipeline?",
            "Continuous Integration",
        )];
        let index = QuestionIndex::build(&entries, &["Email", "Completion time", CI_COLUMN], 85.0);

        let roster = Roster::from_records(vec![ResponseRecord {
            identity: "a@x.com".into(),
            completed_at: None,
            answers: HashMap::from([(CI_COLUMN.to_string(), Cell::Text("3 - Defined".into()))]),
        }]);

        let text = |s: &str| Cell::Text(s.to_string());
        let workbook = Workbook {
            source: PathBuf::from("recs.xlsx"),
            tables: vec![Table::from_grid(
                "Continuous Integration",
                vec![
                    vec![
                        text("Maturity Levels"),
                        text("Supporting Categories"),
                        text("Recommendations"),
                    ],
                    vec![Cell::Number(3.0), text("Automation"), text("Adopt pipeline-as-code")],
                ],
            )],
        };
        let mut book = RecommendationBook::from_workbook(&workbook, &ColumnNames::default());
        book.insert("Empty Section", RecommendationTable::default());

        Assessment::from_parts(index, roster, book)
    }

    #[test]
    fn report_for_known_respondent() -> Result<()> {
        let report = assessment().report_for("a@x.com")?;
        assert_eq!(report.sections.len(), 1);
        let ci = &report.sections[0];
        assert_eq!(ci.section, "Continuous Integration");
        assert_eq!(ci.score, 3.0);
        assert_eq!(ci.level, 3);
        assert_eq!(ci.recommendations[0].category, "Automation");
        assert_eq!(ci.recommendations[0].text, "Adopt pipeline-as-code");
        Ok(())
    }

    #[test]
    fn unknown_respondent_is_an_error() {
        let err = assessment().report_for("nobody@x.com").unwrap_err();
        assert!(err.to_string().contains("nobody@x.com"));
    }

    #[test]
    fn outputs_land_in_out_dir() -> Result<()> {
        let dir = tempdir()?;
        let report = assessment().report_for("a@x.com")?;
        let written = write_outputs(&report, dir.path(), false)?;

        assert_eq!(
            written,
            vec![dir.path().join(MARKDOWN_FILE), dir.path().join(JSON_FILE)]
        );
        let json: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(dir.path().join(JSON_FILE))?)?;
        assert_eq!(json["respondent"], "a@x.com");
        assert_eq!(json["sections"][0]["level"], 3);
        Ok(())
    }
}
