// src/score.rs

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use tracing::{debug, instrument};

use crate::matcher::QuestionIndex;
use crate::respondent::ResponseRecord;

/// An optionally signed integer at the start of the text, followed by the end of the
/// text, whitespace, or a separator. `"3.5 - Partially automated"` reads as 3.
static LEADING_INT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\s*([+-]?\d+)(?:$|[\s.\-:)/,])").expect("leading integer pattern is valid")
});

/// Leading integer of an answer, `None` when the answer does not start with one.
pub fn leading_integer(raw: &str) -> Option<i64> {
    LEADING_INT
        .captures(raw)
        .and_then(|c| c.get(1))
        .and_then(|m| m.as_str().parse::<i64>().ok())
}

/// Round to two decimals, half away from zero.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Arithmetic mean rounded to two decimals; `None` for no values.
pub fn mean_rounded(values: &[i64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    let sum: f64 = values.iter().map(|&v| v as f64).sum();
    Some(round2(sum / values.len() as f64))
}

/// Average score of one section for one respondent.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SectionScore {
    pub section: String,
    pub score: f64,
    /// Number of answers that contributed.
    pub answered: usize,
}

/// Per-section averages for `record`, sections in order of their first contributing column.
/// Missing and unreadable answers are skipped; sections with nothing left are absent.
#[instrument(level = "debug", skip_all, fields(identity = %record.identity))]
pub fn score_sections(record: &ResponseRecord, index: &QuestionIndex) -> Vec<SectionScore> {
    let mut grouped: Vec<(String, Vec<i64>)> = Vec::new();

    for binding in index.bindings() {
        let Some(raw) = record.answer(&binding.column).and_then(|c| c.as_text()) else {
            continue;
        };
        let Some(value) = leading_integer(&raw) else {
            debug!(column = %binding.column, answer = %raw, "answer has no leading integer");
            continue;
        };

        match grouped.iter_mut().find(|(s, _)| *s == binding.section) {
            Some((_, values)) => values.push(value),
            None => grouped.push((binding.section.clone(), vec![value])),
        }
    }

    grouped
        .into_iter()
        .filter_map(|(section, values)| {
            mean_rounded(&values).map(|score| SectionScore {
                section,
                score,
                answered: values.len(),
            })
        })
        .collect()
}
