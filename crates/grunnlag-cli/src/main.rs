//! `grunnlag`: check the facts of a case from the command line.
//!
//! Reads a case document (JSON), runs the period validators or the snapshot
//! diff, and prints the result as JSON on stdout.
//!
//! # Usage
//!
//! ```
//! grunnlag validate case.json
//! grunnlag validate case.json --subject 01017012345 --today 2024-06-01
//! grunnlag diff case.json --category income
//! ```

mod case;

use std::path::PathBuf;

use anyhow::Context as _;
use case::{CaseFile, FileRepository};
use chrono::{NaiveDate, Utc};
use clap::{Parser, Subcommand};
use grunnlag_core::{Category, PersonIdent, registry::CasePersons};
use grunnlag_engine::{
  CaseContext, ChangeRecord, compare_with_active, validate_all,
};
use serde::{Deserialize, Serialize};
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

// ─── CLI args ─────────────────────────────────────────────────────────────────

#[derive(Parser)]
#[command(author, version, about = "Period consistency checks for case facts")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "grunnlag.toml")]
  config: PathBuf,

  /// The date treated as today (default: the current UTC date).
  #[arg(long, global = true)]
  today: Option<NaiveDate>,

  /// Overrides the case document's effective date.
  #[arg(long, global = true)]
  effective_date: Option<NaiveDate>,

  /// Pretty-print the JSON output.
  #[arg(long, global = true)]
  pretty: bool,

  #[command(subcommand)]
  command: Command,
}

#[derive(Subcommand)]
enum Command {
  /// Report gaps, overlaps and coverage findings.
  Validate {
    case: PathBuf,

    /// Only validate this person.
    #[arg(long)]
    subject: Option<PersonIdent>,
  },

  /// List what the newest snapshot changes relative to the active one.
  Diff {
    case: PathBuf,

    /// Only diff this category (default: every category with snapshots).
    #[arg(long)]
    category: Option<Category>,
  },
}

// ─── Settings ─────────────────────────────────────────────────────────────────

/// Values read from the config file and `GRUNNLAG_*` environment variables.
/// Command-line flags take precedence.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct Settings {
  /// Used when neither the flag nor the case document sets one.
  effective_date: Option<NaiveDate>,
  today:          Option<NaiveDate>,
  pretty:         bool,
}

// ─── Entry point ──────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  tracing_subscriber::fmt()
    .with_writer(std::io::stderr)
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .init();

  let cli = Cli::parse();

  let settings: Settings = config::Config::builder()
    .add_source(config::File::from(cli.config.clone()).required(false))
    .add_source(config::Environment::with_prefix("GRUNNLAG"))
    .build()
    .context("failed to read config file")?
    .try_deserialize()
    .context("failed to deserialise settings")?;

  let today = cli
    .today
    .or(settings.today)
    .unwrap_or_else(|| Utc::now().date_naive());
  let pretty = cli.pretty || settings.pretty;

  match cli.command {
    Command::Validate { case, subject } => {
      let case = CaseFile::load(&case)?;
      let effective_date =
        effective_date(cli.effective_date, &case, &settings)?;
      let persons = CasePersons::new(case.persons.clone());
      let children = case.children(&persons);
      let ctx = CaseContext {
        effective_date,
        today,
        children: &children,
        persons: &persons,
        roles: &persons,
      };

      let subjects = match subject {
        Some(subject) => vec![subject],
        None => case.subjects(&persons).into_iter().collect(),
      };
      let reports: Vec<_> = subjects
        .iter()
        .map(|subject| validate_all(subject, &case.records, &ctx))
        .collect();

      let findings: usize = reports.iter().map(|r| r.findings().count()).sum();
      tracing::info!(
        case_id = %case.case_id,
        subjects = reports.len(),
        findings,
        "validated case"
      );
      print_json(&reports, pretty)
    }

    Command::Diff { case, category } => {
      let case = CaseFile::load(&case)?;
      let effective_date =
        effective_date(cli.effective_date, &case, &settings)?;
      let persons = CasePersons::new(case.persons.clone());
      let children = case.children(&persons);
      let ctx = CaseContext {
        effective_date,
        today,
        children: &children,
        persons: &persons,
        roles: &persons,
      };

      let categories = match category {
        Some(category) => vec![category],
        None => case.snapshot_categories().into_iter().collect(),
      };
      let repo = FileRepository::new(&case.snapshots);
      let mut changes: Vec<ChangeRecord> = Vec::new();
      for category in categories {
        let found = compare_with_active(&repo, case.case_id, category, &ctx)
          .await
          .with_context(|| format!("comparing {category} snapshots"))?;
        changes.extend(found);
      }
      print_json(&changes, pretty)
    }
  }
}

fn effective_date(
  flag: Option<NaiveDate>,
  case: &CaseFile,
  settings: &Settings,
) -> anyhow::Result<NaiveDate> {
  flag
    .or(case.effective_date)
    .or(settings.effective_date)
    .context("no effective date in flags, case file or settings")
}

fn print_json<T: Serialize>(value: &T, pretty: bool) -> anyhow::Result<()> {
  let out = if pretty {
    serde_json::to_string_pretty(value)
  } else {
    serde_json::to_string(value)
  }
  .context("serialising output")?;
  println!("{out}");
  Ok(())
}
