// src/recommend.rs

use serde::Serialize;
use std::collections::HashMap;
use tracing::{debug, info, instrument, warn};

use crate::config::ColumnNames;
use crate::error::LoadError;
use crate::load::{Table, Workbook};
use crate::score::SectionScore;

/// Maturity level for an average score: nearest integer, halves rounded away from zero
/// (3.5 → 4, 2.5 → 3).
pub fn maturity_level(score: f64) -> i64 {
    score.round() as i64
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Recommendation {
    pub category: String,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq)]
struct RecommendationRow {
    /// `None` when the cell is not numeric.
    level: Option<f64>,
    category: Option<String>,
    text: Option<String>,
}

/// Recommendation rows of one section.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RecommendationTable {
    rows: Vec<RecommendationRow>,
}

impl RecommendationTable {
    /// Read a section sheet. Headers are matched trimmed and case-insensitively.
    pub fn from_table(
        table: &Table,
        columns: &ColumnNames,
        book: &Workbook,
    ) -> Result<Self, LoadError> {
        let level_idx = table.require_column(&columns.maturity_level, &book.source)?;
        let category_idx = table.require_column(&columns.category, &book.source)?;
        let text_idx = table.require_column(&columns.recommendation, &book.source)?;

        let rows = (0..table.rows.len())
            .map(|row| RecommendationRow {
                level: table.cell(row, level_idx).as_number(),
                category: table.cell(row, category_idx).as_text(),
                text: table.cell(row, text_idx).as_text(),
            })
            .collect();
        Ok(Self { rows })
    }

    /// Rows at exactly `level` with both category and text present.
    pub fn at_level(&self, level: i64) -> Vec<Recommendation> {
        self.rows
            .iter()
            .filter(|r| r.level == Some(level as f64))
            .filter_map(|r| match (&r.category, &r.text) {
                (Some(category), Some(text)) => Some(Recommendation {
                    category: category.clone(),
                    text: text.clone(),
                }),
                _ => None,
            })
            .collect()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// All section tables of the recommendation input, read once and keyed by table name.
#[derive(Debug, Clone, Default)]
pub struct RecommendationBook {
    tables: HashMap<String, RecommendationTable>,
}

impl RecommendationBook {
    /// Sheets lacking the required columns are skipped with a warning.
    #[instrument(level = "debug", skip_all, fields(source = %book.source.display()))]
    pub fn from_workbook(book: &Workbook, columns: &ColumnNames) -> Self {
        let mut tables = HashMap::new();
        for table in &book.tables {
            match RecommendationTable::from_table(table, columns, book) {
                Ok(parsed) => {
                    debug!(section = %table.name, rows = parsed.len(), "loaded recommendation table");
                    tables.insert(table.name.clone(), parsed);
                }
                Err(e) => warn!(sheet = %table.name, error = %e, "skipping recommendation sheet"),
            }
        }
        info!(sections = tables.len(), "recommendation tables ready");
        Self { tables }
    }

    pub fn insert(&mut self, section: impl Into<String>, table: RecommendationTable) {
        self.tables.insert(section.into(), table);
    }

    pub fn has_section(&self, section: &str) -> bool {
        self.tables.contains_key(section)
    }

    /// Recommendations for `section` at `level`; empty when there is no table or no row.
    pub fn lookup(&self, section: &str, level: i64) -> Vec<Recommendation> {
        self.tables
            .get(section)
            .map(|t| t.at_level(level))
            .unwrap_or_default()
    }
}

/// Score, level and recommendations of one section.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SectionRecommendations {
    pub section: String,
    pub score: f64,
    pub level: i64,
    /// Whether the recommendation input has a table for this section at all.
    pub has_table: bool,
    pub recommendations: Vec<Recommendation>,
}

pub fn resolve(scores: &[SectionScore], book: &RecommendationBook) -> Vec<SectionRecommendations> {
    scores
        .iter()
        .map(|s| {
            let level = maturity_level(s.score);
            let recommendations = book.lookup(&s.section, level);
            debug!(
                section = %s.section,
                level,
                found = recommendations.len(),
                "resolved recommendations"
            );
            SectionRecommendations {
                section: s.section.clone(),
                score: s.score,
                level,
                has_table: book.has_section(&s.section),
                recommendations,
            }
        })
        .collect()
}
