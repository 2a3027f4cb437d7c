//! Application layer: Use cases and services.
//!
//! This module orchestrates domain logic with ports to implement
//! the core use cases of the application.

mod analytics;
mod import;
mod prediction;
mod submission;

pub use analytics::{AnalyticsService, BandCounts, OverviewStats, TrendBucket, BENCHMARKS};
pub use import::{DatasetImporter, FieldSource, ImportMapping, ImportSummary, NormalizeError};
pub use prediction::{PredictionService, PredictionSet, ProductivityLabel};
pub use submission::{SubmissionOutcome, SubmissionService};

/// Round to two decimals for presentation.
pub(crate) fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
