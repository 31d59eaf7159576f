// src/respondent.rs

use chrono::NaiveDateTime;
use serde::Serialize;
use std::{collections::HashMap, path::Path};
use tracing::{debug, info, instrument};

use crate::config::ColumnNames;
use crate::error::LoadError;
use crate::load::{Cell, Table};

/// One survey submission.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResponseRecord {
    pub identity: String,
    /// `None` when the completion time could not be read; such records count as oldest.
    pub completed_at: Option<NaiveDateTime>,
    pub answers: HashMap<String, Cell>,
}

impl ResponseRecord {
    pub fn answer(&self, column: &str) -> Option<&Cell> {
        self.answers.get(column)
    }
}

/// Read every submission from the response table.
pub fn response_records(
    table: &Table,
    columns: &ColumnNames,
    source: &Path,
) -> Result<Vec<ResponseRecord>, LoadError> {
    let id_idx = table.require_column(&columns.identity, source)?;
    let ts_idx = table.require_column(&columns.completed_at, source)?;

    let mut records = Vec::with_capacity(table.rows.len());
    for row in 0..table.rows.len() {
        let Some(identity) = table.cell(row, id_idx).as_text() else {
            debug!(row, "skipping response without identity");
            continue;
        };
        let completed_at = table.cell(row, ts_idx).as_timestamp();
        if completed_at.is_none() {
            debug!(row, identity = %identity, "unreadable completion time");
        }

        let answers = table
            .headers
            .iter()
            .enumerate()
            .map(|(col, name)| (name.clone(), table.cell(row, col).clone()))
            .collect();

        records.push(ResponseRecord {
            identity: identity.trim().to_string(),
            completed_at,
            answers,
        });
    }
    Ok(records)
}

/// The latest submission per identity, ordered by completion time.
#[derive(Debug, Clone, Default)]
pub struct Roster {
    records: Vec<ResponseRecord>,
}

impl Roster {
    /// Stable sort by completion time, then keep the last record of each identity.
    #[instrument(level = "debug", skip_all, fields(records = records.len()))]
    pub fn from_records(mut records: Vec<ResponseRecord>) -> Self {
        records.sort_by_key(|r| r.completed_at);

        let mut last: HashMap<&str, usize> = HashMap::new();
        for (idx, r) in records.iter().enumerate() {
            last.insert(r.identity.as_str(), idx);
        }
        let keep: Vec<bool> = records
            .iter()
            .enumerate()
            .map(|(idx, r)| last.get(r.identity.as_str()) == Some(&idx))
            .collect();
        drop(last);

        let total = records.len();
        let records: Vec<ResponseRecord> = records
            .into_iter()
            .zip(keep)
            .filter_map(|(r, k)| k.then_some(r))
            .collect();

        info!(
            submissions = total,
            respondents = records.len(),
            "deduplicated responses"
        );
        Self { records }
    }

    pub fn from_table(
        table: &Table,
        columns: &ColumnNames,
        source: &Path,
    ) -> Result<Self, LoadError> {
        Ok(Self::from_records(response_records(table, columns, source)?))
    }

    /// Selectable identities, oldest latest-submission first.
    pub fn identities(&self) -> impl Iterator<Item = &str> {
        self.records.iter().map(|r| r.identity.as_str())
    }

    pub fn resolve(&self, identity: &str) -> Option<&ResponseRecord> {
        let identity = identity.trim();
        self.records.iter().find(|r| r.identity == identity)
    }

    pub fn records(&self) -> &[ResponseRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
