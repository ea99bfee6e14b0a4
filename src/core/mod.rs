mod engine;
mod table;
mod types;

pub use engine::{
    ColumnSpan, ScaledWindow, ScenarioWindow, aggregate_full, aggregate_recent, ceil_to_hundred,
    compute_full_distribution, compute_recent_distribution, ecdf_points, floor_to_hundred,
    percentile, probability_at_or_below, round_to_hundred, row_means, scale, select,
    suggested_range, summarize,
};
pub use table::{HistoricalTable, MONTHS_PER_YEAR, TableConfig};
pub use types::{
    CoreError, DistributionSummary, EcdfPoint, OutcomeSample, PlanParameters, SuggestedRange,
};
