//! Workpulse: workplace stress & productivity survey engine.
//!
//! Command-line entry point wrapping the core services: dataset import,
//! live submission scoring, productivity prediction, and dashboard
//! aggregates.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use tracing_subscriber::EnvFilter;

use workpulse::adapters::artifacts::PredictionArtifacts;
use workpulse::adapters::sqlite::SqliteStorage;
use workpulse::application::{
    AnalyticsService, DatasetImporter, ImportMapping, PredictionService, PredictionSet,
    SubmissionService, BENCHMARKS,
};
use workpulse::domain::{role_supplements, QuestionnaireSchema, RawAnswerSet};
use workpulse::ports::Storage;

#[derive(Parser, Debug)]
#[command(
    name = "workpulse",
    about = "Score workplace stress & productivity surveys and project productivity",
    version
)]
struct Cli {
    /// SQLite database path
    #[arg(long, global = true, default_value = "workpulse.db")]
    db: PathBuf,

    /// Directory holding the prediction artifacts
    #[arg(long, global = true, default_value = "models")]
    models: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Import an external survey dataset from CSV
    Import(ImportArgs),
    /// Score a questionnaire submission and project productivity
    Submit(SubmitArgs),
    /// Project productivity for a stress composite score
    Predict {
        /// Stress composite score on the 1-5 scale
        #[arg(long)]
        stress: f64,
    },
    /// Print the questionnaire, optionally with position-specific items
    Questions {
        #[arg(long)]
        position: Option<String>,
    },
    /// Show the most recent scored records
    Recent {
        #[arg(long, default_value_t = 10)]
        limit: usize,
    },
    /// Show dashboard aggregates
    Stats,
    /// Delete bulk-imported respondents and their records
    Cleanup,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum MappingVariant {
    /// One pre-aggregated column per construct
    Aggregated,
    /// Item-level columns with positively stated stress items
    ItemLevel,
}

impl MappingVariant {
    fn mapping(self) -> ImportMapping {
        match self {
            Self::Aggregated => ImportMapping::aggregated(),
            Self::ItemLevel => ImportMapping::item_level(),
        }
    }
}

#[derive(Args, Debug)]
struct ImportArgs {
    /// CSV file to import
    #[arg(long)]
    csv: PathBuf,

    /// Column layout of the dataset
    #[arg(long, value_enum, default_value = "item-level")]
    variant: MappingVariant,
}

#[derive(Args, Debug)]
struct SubmitArgs {
    #[arg(long)]
    username: String,

    /// Comma-separated answers for items q1..q15, each 1-5
    #[arg(long)]
    answers: String,

    /// Free-text problems field
    #[arg(long)]
    problems: Option<String>,

    #[arg(long)]
    gender: Option<String>,
    #[arg(long)]
    department: Option<String>,
    #[arg(long)]
    position: Option<String>,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let storage = Arc::new(SqliteStorage::new(&cli.db)?);

    match cli.command {
        Command::Import(args) => {
            let file = std::fs::File::open(&args.csv)
                .with_context(|| format!("cannot open {}", args.csv.display()))?;
            let importer = DatasetImporter::new(
                QuestionnaireSchema::standard(),
                args.variant.mapping(),
                storage,
            );
            let summary = importer.import_csv(file)?;
            println!(
                "Imported {} rows ({} already present, {} malformed skipped)",
                summary.inserted, summary.skipped_existing, summary.skipped_malformed
            );
        }

        Command::Submit(args) => {
            let values = args
                .answers
                .split(',')
                .map(|v| v.trim().parse::<u8>())
                .collect::<std::result::Result<Vec<_>, _>>()
                .context("answers must be comma-separated integers")?;
            let mut answers = RawAnswerSet::from_values(&values)?;
            if let Some(problems) = &args.problems {
                answers = answers.with_problems(problems.clone());
            }

            let artifacts = Arc::new(PredictionArtifacts::load(&cli.models));
            let service = SubmissionService::new(
                QuestionnaireSchema::standard(),
                storage,
                PredictionService::new(artifacts),
            );

            let respondent = service.ensure_respondent(
                &args.username,
                args.gender,
                args.department,
                args.position,
            )?;
            let outcome = service.submit(&respondent.id, answers)?;

            let record = &outcome.record;
            println!(
                "Stress composite:       {:.2} ({})",
                record.scores.stress.composite,
                record.stress_band()
            );
            println!(
                "Productivity composite: {:.2}",
                record.scores.productivity.composite
            );
            for construct in record
                .scores
                .stress
                .constructs
                .iter()
                .chain(record.scores.productivity.constructs.iter())
            {
                println!("  {:28} {:.2}", construct.name, construct.score);
            }
            println!("Projected productivity:");
            print_predictions(&outcome.predictions);
        }

        Command::Predict { stress } => {
            let artifacts = PredictionArtifacts::load(&cli.models);
            let threshold = artifacts.decision_threshold();
            let service = PredictionService::new(Arc::new(artifacts));
            println!("Projected productivity for stress composite {stress:.2}:");
            print_predictions(&service.predict(stress));
            println!("  (training decision threshold {threshold:.2}, reference only)");
        }

        Command::Questions { position } => {
            let schema = QuestionnaireSchema::standard();
            let mut ordinal = 1;
            for construct in schema.constructs() {
                println!("{} ({})", construct.name, construct.domain);
                for item in &construct.items {
                    println!("  q{ordinal}. {}", item.prompt);
                    ordinal += 1;
                }
            }
            if let Some(position) = position {
                let supplements = role_supplements(&position);
                if !supplements.is_empty() {
                    println!("Additional questions for {position} (not scored):");
                    for prompt in supplements {
                        println!("  q{ordinal}. {prompt}");
                        ordinal += 1;
                    }
                }
            }
        }

        Command::Recent { limit } => {
            let records = storage.recent_records(limit)?;
            if records.is_empty() {
                println!("No records.");
            }
            for record in records {
                println!(
                    "{}  {}  stress {:.2} ({})  productivity {:.2}",
                    record.submitted_at.format("%Y-%m-%d %H:%M"),
                    record.id,
                    record.scores.stress.composite,
                    record.stress_band(),
                    record.scores.productivity.composite,
                );
            }
        }

        Command::Stats => {
            let stats = AnalyticsService::new(storage).overview()?;
            println!(
                "{} respondents, {} records",
                stats.total_respondents, stats.total_records
            );

            println!("Stress bands: {} low / {} medium / {} high",
                stats.band_counts.low, stats.band_counts.medium, stats.band_counts.high);

            if !stats.department_productivity.is_empty() {
                println!("Mean productivity by department:");
                for (department, avg) in &stats.department_productivity {
                    println!("  {department:16} {avg:.2}");
                }
            }

            if !stats.stress_trend.is_empty() {
                println!("Stress vs productivity trend (0.5 buckets):");
                for bucket in &stats.stress_trend {
                    println!(
                        "  stress {:>4.1}+  productivity {:.2}",
                        bucket.stress_bucket, bucket.avg_productivity
                    );
                }
            }

            println!("Benchmark reference means:");
            for (name, value) in BENCHMARKS {
                println!("  {name:20} {value:.2}");
            }
        }

        Command::Cleanup => {
            let removed = storage.delete_imported()?;
            println!("Removed {removed} imported respondents and their records.");
        }
    }

    Ok(())
}

fn print_predictions(set: &PredictionSet) {
    let point = |value: Option<f64>| match value {
        Some(v) => format!("{v:.2}"),
        None => "unavailable".to_string(),
    };
    println!("  linear regression:  {}", point(set.linear));
    println!("  random forest:      {}", point(set.forest));
    println!("  gradient boosting:  {}", point(set.boosted));
    match set.label {
        Some(label) => println!("  classification:     {label}"),
        None => println!("  classification:     unavailable"),
    }
}
