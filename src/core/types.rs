use std::fmt;

use serde::Serialize;

/// Errors raised by the scenario pipeline. Every variant is local to a
/// single request; nothing is retried.
#[derive(Debug, Clone, PartialEq)]
pub enum CoreError {
    /// A constructor input violates its stated domain.
    InvalidParameter(String),
    /// The requested plan length leaves zero historical starting months.
    /// The inputs are individually in range; their combination has no data.
    EmptyWindow { years: u32, scenario_budget: u32 },
    /// A distribution query was asked over zero outcomes. Unreachable when
    /// EmptyWindow is enforced upstream, but it must fail loudly, not NaN.
    EmptySample,
    /// The table's row count disagrees with the row-budget configuration.
    ConfigMismatch {
        expected_rows: usize,
        actual_rows: usize,
    },
}

impl fmt::Display for CoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CoreError::InvalidParameter(msg) => write!(f, "invalid parameter: {msg}"),
            CoreError::EmptyWindow {
                years,
                scenario_budget,
            } => write!(
                f,
                "no historical scenario is long enough for a {years}-year plan \
                 (scenario budget {scenario_budget} rows)"
            ),
            CoreError::EmptySample => write!(f, "distribution query over an empty sample"),
            CoreError::ConfigMismatch {
                expected_rows,
                actual_rows,
            } => write!(
                f,
                "table config expects {expected_rows} rows but the table has {actual_rows}"
            ),
        }
    }
}

impl std::error::Error for CoreError {}

/// One query's worth of plan inputs, validated on construction and
/// immutable after. `max_years` is the column bound of the table in use.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlanParameters {
    pub years: u32,
    pub income_amount: f64,
    pub lookback_years: u32,
}

impl PlanParameters {
    pub fn new(
        years: u32,
        income_amount: f64,
        lookback_years: u32,
        max_years: u32,
    ) -> Result<Self, CoreError> {
        if years == 0 || years > max_years {
            return Err(CoreError::InvalidParameter(format!(
                "years must be between 1 and {max_years}, got {years}"
            )));
        }
        if !income_amount.is_finite() || income_amount <= 0.0 {
            return Err(CoreError::InvalidParameter(format!(
                "income_amount must be > 0, got {income_amount}"
            )));
        }
        if lookback_years == 0 || lookback_years > years {
            return Err(CoreError::InvalidParameter(format!(
                "lookback_years must be between 1 and years ({years}), got {lookback_years}"
            )));
        }
        Ok(Self {
            years,
            income_amount,
            lookback_years,
        })
    }
}

/// One outcome per historical starting month. Treated as an unordered
/// empirical sample; row identity carries no meaning downstream.
#[derive(Debug, Clone, PartialEq)]
pub struct OutcomeSample {
    values: Vec<f64>,
}

impl OutcomeSample {
    pub(crate) fn new(values: Vec<f64>) -> Self {
        Self { values }
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Read-only summary of an outcome sample. Median is the conventional
/// definition: mean of the two central order statistics for even n.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DistributionSummary {
    pub min: f64,
    pub max: f64,
    pub mean: f64,
    pub median: f64,
}

/// Round-number bounds for a user-facing selection slider:
/// `[floor(min), ceil(max)]` to the nearest 100, anchored at round(median).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SuggestedRange {
    pub low: i64,
    pub high: i64,
    pub default: i64,
}

/// One step of the empirical CDF: the fraction of outcomes `<= value`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EcdfPoint {
    pub value: f64,
    pub fraction: f64,
}
