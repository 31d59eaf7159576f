// src/config.rs

use anyhow::{ensure, Context, Result};
use serde::{Deserialize, Serialize};
use std::{
    env, fs,
    path::{Path, PathBuf},
};

pub const DEFAULT_MAPPING_FILE: &str = "DevOps_Maturity_Mapping.xlsx";
pub const DEFAULT_RESPONSE_FILE: &str = "DevOps_Maturity_Assessment_Demo_Response.xlsx";
pub const DEFAULT_RECOMMENDATION_FILE: &str = "recommendations_v1.xlsx";
pub const DEFAULT_MATCH_THRESHOLD: f64 = 85.0;

/// Header names expected in the three inputs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ColumnNames {
    pub question: String,
    pub section: String,
    pub identity: String,
    pub completed_at: String,
    pub maturity_level: String,
    pub category: String,
    pub recommendation: String,
}

impl Default for ColumnNames {
    fn default() -> Self {
        Self {
            question: "Question".into(),
            section: "Section".into(),
            identity: "Email".into(),
            completed_at: "Completion time".into(),
            maturity_level: "Maturity Levels".into(),
            category: "Supporting Categories".into(),
            recommendation: "Recommendations".into(),
        }
    }
}

/// Run configuration. Every key is optional in YAML; missing keys keep their defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Directory relative file names resolve against; the executable's directory when unset.
    pub base_dir: Option<PathBuf>,
    pub mapping_file: PathBuf,
    pub response_file: PathBuf,
    /// A spreadsheet with one sheet per section, or a directory of `<section>.csv` files.
    pub recommendation_file: PathBuf,
    /// Minimum similarity (0-100) for a question to bind to a response column.
    pub match_threshold: f64,
    pub columns: ColumnNames,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            base_dir: None,
            mapping_file: DEFAULT_MAPPING_FILE.into(),
            response_file: DEFAULT_RESPONSE_FILE.into(),
            recommendation_file: DEFAULT_RECOMMENDATION_FILE.into(),
            match_threshold: DEFAULT_MATCH_THRESHOLD,
            columns: ColumnNames::default(),
        }
    }
}

impl Config {
    /// Read a YAML config file. A relative `base_dir` inside it is taken relative to the file.
    pub fn from_yaml_file(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("reading config file {}", path.display()))?;
        let mut config: Config = serde_yaml::from_str(&text)
            .with_context(|| format!("parsing config file {}", path.display()))?;

        if let Some(base) = config.base_dir.as_ref().filter(|b| b.is_relative()) {
            let parent = path.parent().unwrap_or_else(|| Path::new("."));
            config.base_dir = Some(parent.join(base));
        }
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        ensure!(
            (0.0..=100.0).contains(&self.match_threshold),
            "match_threshold must be within 0..=100, got {}",
            self.match_threshold
        );
        Ok(())
    }

    pub fn base_dir(&self) -> PathBuf {
        self.base_dir.clone().unwrap_or_else(program_dir)
    }

    /// Resolve `file` against the base directory unless it is already absolute.
    pub fn resolve(&self, file: &Path) -> PathBuf {
        if file.is_absolute() {
            file.to_path_buf()
        } else {
            self.base_dir().join(file)
        }
    }

    pub fn mapping_path(&self) -> PathBuf {
        self.resolve(&self.mapping_file)
    }

    pub fn response_path(&self) -> PathBuf {
        self.resolve(&self.response_file)
    }

    pub fn recommendation_path(&self) -> PathBuf {
        self.resolve(&self.recommendation_file)
    }
}

/// Directory holding the running executable, or the working directory if that is unknown.
pub fn program_dir() -> PathBuf {
    env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(Path::to_path_buf))
        .unwrap_or_else(|| PathBuf::from("."))
}
