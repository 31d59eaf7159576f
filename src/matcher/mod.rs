// src/matcher/mod.rs

pub mod fuzz;

use serde::Serialize;
use std::path::Path;
use tracing::{debug, info, instrument, warn};

use crate::config::ColumnNames;
use crate::error::LoadError;
use crate::load::Table;

/// One row of the question → section mapping.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MappingEntry {
    pub question: String,
    pub section: String,
}

impl MappingEntry {
    pub fn new(question: impl Into<String>, section: impl Into<String>) -> Self {
        Self {
            question: question.into(),
            section: section.into(),
        }
    }
}

/// Read mapping entries from `table`. Rows missing either field are skipped.
pub fn mapping_entries(
    table: &Table,
    columns: &ColumnNames,
    source: &Path,
) -> Result<Vec<MappingEntry>, LoadError> {
    let q_idx = table.require_column(&columns.question, source)?;
    let s_idx = table.require_column(&columns.section, source)?;

    let entries: Vec<MappingEntry> = (0..table.rows.len())
        .filter_map(|row| {
            let question = table.cell(row, q_idx).as_text();
            let section = table.cell(row, s_idx).as_text();
            match (question, section) {
                (Some(q), Some(s)) => Some(MappingEntry::new(q.trim(), s.trim())),
                _ => {
                    debug!(row, "skipping mapping row without question or section");
                    None
                }
            }
        })
        .collect();
    Ok(entries)
}

/// A response column bound to a section by a confident fuzzy match.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Binding {
    pub column: String,
    pub section: String,
    pub question: String,
    pub similarity: f64,
}

/// A later mapping entry rebinding an already matched column to a different section.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Collision {
    pub column: String,
    pub previous_question: String,
    pub previous_section: String,
    pub question: String,
    pub section: String,
}

/// Matched column → section, in first-insertion order.
///
/// When two mapping entries resolve to the same column the later one wins but keeps
/// its first position; a rebinding to another section is recorded as a [`Collision`].
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct QuestionIndex {
    bindings: Vec<Binding>,
    collisions: Vec<Collision>,
    unmatched: Vec<String>,
}

impl QuestionIndex {
    #[instrument(level = "info", skip_all, fields(entries = entries.len(), columns = columns.len()))]
    pub fn build<S: AsRef<str>>(entries: &[MappingEntry], columns: &[S], threshold: f64) -> Self {
        let mut index = QuestionIndex::default();

        for entry in entries {
            match fuzz::extract_one(&entry.question, columns) {
                Some((col, score)) if score >= threshold => {
                    let column = columns[col].as_ref();
                    debug!(question = %entry.question, column, score, "matched");
                    index.bind(Binding {
                        column: column.to_string(),
                        section: entry.section.clone(),
                        question: entry.question.clone(),
                        similarity: score,
                    });
                }
                best => {
                    debug!(
                        question = %entry.question,
                        best_score = best.map(|(_, s)| s),
                        threshold,
                        "no confident match"
                    );
                    index.unmatched.push(entry.question.clone());
                }
            }
        }

        info!(
            matched = index.bindings.len(),
            unmatched = index.unmatched.len(),
            collisions = index.collisions.len(),
            "built question index"
        );
        index
    }

    fn bind(&mut self, binding: Binding) {
        let Some(pos) = self
            .bindings
            .iter()
            .position(|b| b.column == binding.column)
        else {
            self.bindings.push(binding);
            return;
        };
        let existing = &mut self.bindings[pos];

        if existing.section != binding.section {
            warn!(
                column = %binding.column,
                previous_section = %existing.section,
                section = %binding.section,
                "column matched by more than one mapping question; keeping the later one"
            );
            self.collisions.push(Collision {
                column: binding.column.clone(),
                previous_question: existing.question.clone(),
                previous_section: existing.section.clone(),
                question: binding.question.clone(),
                section: binding.section.clone(),
            });
        } else {
            debug!(column = %binding.column, "column rebound within the same section");
        }
        *existing = binding;
    }

    pub fn bindings(&self) -> &[Binding] {
        &self.bindings
    }

    pub fn collisions(&self) -> &[Collision] {
        &self.collisions
    }

    /// Mapping questions that found no column at or above the threshold.
    pub fn unmatched(&self) -> &[String] {
        &self.unmatched
    }

    pub fn section_for(&self, column: &str) -> Option<&str> {
        self.bindings
            .iter()
            .find(|b| b.column == column)
            .map(|b| b.section.as_str())
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DEFAULT_MATCH_THRESHOLD;
    use crate::load::Cell;

    const CI_COLUMN: &str = "How mature is your CI/CD pipeline?";

    fn columns() -> Vec<String> {
        vec![
            "Email".to_string(),
            "Completion time".to_string(),
            CI_COLUMN.to_string(),
            "Do you practice trunk-based development?".to_string(),
        ]
    }

    #[test]
    fn threshold_is_inclusive() {
        let entries = vec![MappingEntry::new(
            "How mature is your CI pipeline?",
            "Continuous Integration",
        )];

        let at = QuestionIndex::build(&entries, &columns(), 95.0);
        assert_eq!(at.section_for(CI_COLUMN), Some("Continuous Integration"));
        assert_eq!(at.bindings()[0].similarity, 95.0);

        let above = QuestionIndex::build(&entries, &columns(), 96.0);
        assert!(above.is_empty());
        assert_eq!(above.unmatched(), &["How mature is your CI pipeline?".to_string()]);
    }

    #[test]
    fn default_threshold_separates_near_misses() {
        let entries = vec![MappingEntry::new(
            "How often do you deploy to production?",
            "Continuous Delivery",
        )];

        // scores 83
        let near_miss = ["Email", "How often do you test in production"];
        let index = QuestionIndex::build(&entries, &near_miss, DEFAULT_MATCH_THRESHOLD);
        assert!(index.is_empty());
        assert_eq!(
            index.unmatched(),
            &["How often do you deploy to production?".to_string()]
        );

        // scores exactly 85
        let at_threshold = ["Email", "How often do you deploy to staging"];
        let index = QuestionIndex::build(&entries, &at_threshold, DEFAULT_MATCH_THRESHOLD);
        assert_eq!(
            index.section_for("How often do you deploy to staging"),
            Some("Continuous Delivery")
        );
        assert_eq!(index.bindings()[0].similarity, 85.0);

        let confident = ["Email", "Completion time", CI_COLUMN];
        let ci = vec![MappingEntry::new(
            "How mature is your CI pipeline?",
            "Continuous Integration",
        )];
        let index = QuestionIndex::build(&ci, &confident, DEFAULT_MATCH_THRESHOLD);
        assert_eq!(index.section_for(CI_COLUMN), Some("Continuous Integration"));
        assert!(index.unmatched().is_empty());
    }

    #[test]
    fn weak_matches_are_excluded() {
        let entries = vec![MappingEntry::new(
            "How often do you rotate secrets?",
            "Security",
        )];
        let index = QuestionIndex::build(&entries, &columns(), 85.0);
        assert!(index.is_empty());
        assert_eq!(index.unmatched().len(), 1);
    }

    #[test]
    fn no_columns_means_no_match() {
        let entries = vec![MappingEntry::new("Anything?", "Section")];
        let empty: Vec<String> = Vec::new();
        assert!(QuestionIndex::build(&entries, &empty, 85.0).is_empty());
    }

    #[test]
    fn later_entry_wins_and_collision_is_recorded() {
        let entries = vec![
            MappingEntry::new("How mature is your CI/CD pipeline?", "Continuous Integration"),
            MappingEntry::new("Do you practice trunk based development?", "Source Control"),
            MappingEntry::new("How mature is your CI/CD pipeline", "Continuous Delivery"),
        ];
        let index = QuestionIndex::build(&entries, &columns(), 85.0);

        assert_eq!(index.len(), 2);
        // position of the first binding is kept
        assert_eq!(index.bindings()[0].column, CI_COLUMN);
        assert_eq!(index.bindings()[0].section, "Continuous Delivery");

        assert_eq!(index.collisions().len(), 1);
        let collision = &index.collisions()[0];
        assert_eq!(collision.previous_section, "Continuous Integration");
        assert_eq!(collision.section, "Continuous Delivery");
    }

    #[test]
    fn same_section_rebinding_is_not_a_collision() {
        let entries = vec![
            MappingEntry::new("How mature is your CI/CD pipeline?", "Continuous Integration"),
            MappingEntry::new("How mature is your CI/CD pipeline", "Continuous Integration"),
        ];
        let index = QuestionIndex::build(&entries, &columns(), 85.0);
        assert_eq!(index.len(), 1);
        assert!(index.collisions().is_empty());
    }

    #[test]
    fn mapping_rows_need_both_fields() -> anyhow::Result<()> {
        let text = |s: &str| Cell::Text(s.to_string());
        let table = Table::from_grid(
            "Mapping",
            vec![
                vec![text("Question"), text("Section")],
                vec![text("Q1 "), text(" Build")],
                vec![text("Q2"), Cell::Empty],
                vec![Cell::Empty, text("Deploy")],
            ],
        );
        let entries = mapping_entries(&table, &ColumnNames::default(), Path::new("map.xlsx"))?;
        assert_eq!(entries, vec![MappingEntry::new("Q1", "Build")]);
        Ok(())
    }

    #[test]
    fn mapping_without_section_column_fails() {
        let table = Table::from_grid("Mapping", vec![vec![Cell::Text("Question".into())]]);
        let err = mapping_entries(&table, &ColumnNames::default(), Path::new("map.xlsx"))
            .unwrap_err();
        assert!(err.to_string().contains("Section"));
    }
}
