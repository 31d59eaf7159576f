use anyhow::{bail, Context, Result};
use clap::Parser;
use maturity_dashboard::{
    load_datasets,
    report::{text::render_text, write_outputs},
    Assessment, Config,
};
use std::{
    io::{self, BufRead, Write},
    path::PathBuf,
};
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "DevOps maturity report: per-section scores, charts and recommendations for one respondent"
)]
struct Args {
    /// YAML config file; command-line flags override its values
    #[arg(long)]
    config: Option<PathBuf>,
    /// Directory relative input paths resolve against (defaults to the executable's directory)
    #[arg(long)]
    base_dir: Option<PathBuf>,
    /// Question → section mapping spreadsheet
    #[arg(long)]
    mapping: Option<PathBuf>,
    /// Assessment responses spreadsheet
    #[arg(long)]
    responses: Option<PathBuf>,
    /// Recommendation workbook, or a directory of `<section>.csv` files
    #[arg(long)]
    recommendations: Option<PathBuf>,
    /// Minimum question/column similarity, 0-100
    #[arg(long)]
    threshold: Option<f64>,
    /// Respondent to report on; prompts when omitted
    #[arg(short, long)]
    email: Option<String>,
    /// Print the selectable respondents and exit
    #[arg(long)]
    list: bool,
    /// Write report.md, report.json and the SVG charts here
    #[arg(long)]
    out_dir: Option<PathBuf>,
    /// Skip chart rendering
    #[arg(long)]
    no_charts: bool,
}

impl Args {
    fn into_config(self) -> Result<(Config, Selection)> {
        let mut config = match &self.config {
            Some(path) => Config::from_yaml_file(path)?,
            None => Config::default(),
        };
        if let Some(dir) = self.base_dir {
            config.base_dir = Some(dir);
        }
        if let Some(p) = self.mapping {
            config.mapping_file = p;
        }
        if let Some(p) = self.responses {
            config.response_file = p;
        }
        if let Some(p) = self.recommendations {
            config.recommendation_file = p;
        }
        if let Some(t) = self.threshold {
            config.match_threshold = t;
        }
        config.validate()?;

        let selection = Selection {
            email: self.email,
            list: self.list,
            out_dir: self.out_dir,
            charts: !self.no_charts,
        };
        Ok((config, selection))
    }
}

struct Selection {
    email: Option<String>,
    list: bool,
    out_dir: Option<PathBuf>,
    charts: bool,
}

/// List `identities` on `output` and read a choice (1-based number or exact identity) from `input`.
fn prompt_identity<R: BufRead, W: Write>(
    identities: &[&str],
    mut input: R,
    mut output: W,
) -> Result<String> {
    writeln!(output, "Select Email:")?;
    for (i, id) in identities.iter().enumerate() {
        writeln!(output, "  {:>3}) {}", i + 1, id)?;
    }
    write!(output, "> ")?;
    output.flush()?;

    let mut line = String::new();
    input.read_line(&mut line).context("reading selection")?;
    let choice = line.trim();
    if choice.is_empty() {
        bail!("no respondent selected");
    }

    if let Ok(n) = choice.parse::<usize>() {
        if let Some(id) = n.checked_sub(1).and_then(|i| identities.get(i)) {
            return Ok(id.to_string());
        }
        bail!("selection {} is out of range 1..={}", n, identities.len());
    }
    match identities.iter().find(|id| **id == choice) {
        Some(id) => Ok(id.to_string()),
        None => bail!("`{}` is not one of the listed respondents", choice),
    }
}

fn main() -> Result<()> {
    // ─── 1) init logging ─────────────────────────────────────────────
    let env = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt::Subscriber::builder()
        .with_env_filter(env)
        .with_writer(io::stderr)
        .init();

    // ─── 2) configuration ────────────────────────────────────────────
    let (config, selection) = Args::parse().into_config()?;
    info!(base_dir = %config.base_dir().display(), "startup");

    // ─── 3) load inputs & prepare ────────────────────────────────────
    let datasets = load_datasets(&config)?;
    let assessment = Assessment::prepare(&datasets, &config)?;

    let roster = assessment.roster();
    if roster.is_empty() {
        println!("No responses available - nothing to report.");
        return Ok(());
    }
    let identities: Vec<&str> = roster.identities().collect();

    if selection.list {
        for id in &identities {
            println!("{}", id);
        }
        return Ok(());
    }

    // ─── 4) select respondent ────────────────────────────────────────
    let identity = match selection.email {
        Some(email) => email,
        None => prompt_identity(&identities, io::stdin().lock(), io::stdout())?,
    };

    // ─── 5) score, recommend, render ─────────────────────────────────
    let report = assessment.report_for(&identity)?;
    print!("{}", render_text(&report));

    if let Some(out_dir) = selection.out_dir {
        for path in write_outputs(&report, &out_dir, selection.charts)? {
            println!("wrote {}", path.display());
        }
    }

    info!("all done");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    const IDS: [&str; 2] = ["a@x.com", "b@x.com"];

    #[test]
    fn prompt_accepts_number_or_identity() -> Result<()> {
        let mut shown = Vec::new();
        assert_eq!(prompt_identity(&IDS, Cursor::new("2\n"), &mut shown)?, "b@x.com");
        assert!(String::from_utf8(shown)?.contains("  1) a@x.com"));

        assert_eq!(prompt_identity(&IDS, Cursor::new(" a@x.com \n"), io::sink())?, "a@x.com");
        Ok(())
    }

    #[test]
    fn prompt_rejects_bad_choices() {
        assert!(prompt_identity(&IDS, Cursor::new("0\n"), io::sink()).is_err());
        assert!(prompt_identity(&IDS, Cursor::new("3\n"), io::sink()).is_err());
        assert!(prompt_identity(&IDS, Cursor::new("c@x.com\n"), io::sink()).is_err());
        assert!(prompt_identity(&IDS, Cursor::new(""), io::sink()).is_err());
    }

    #[test]
    fn flags_override_defaults() -> Result<()> {
        let args = Args::parse_from([
            "maturity-dashboard",
            "--base-dir",
            "/data",
            "--recommendations",
            "recs",
            "--threshold",
            "90",
            "--email",
            "a@x.com",
            "--no-charts",
        ]);
        let (config, selection) = args.into_config()?;
        assert_eq!(config.match_threshold, 90.0);
        assert_eq!(config.recommendation_path(), PathBuf::from("/data/recs"));
        assert_eq!(selection.email.as_deref(), Some("a@x.com"));
        assert!(!selection.charts);
        Ok(())
    }

    #[test]
    fn threshold_out_of_range_is_rejected() {
        let args = Args::parse_from(["maturity-dashboard", "--threshold", "120"]);
        assert!(args.into_config().is_err());
    }
}
