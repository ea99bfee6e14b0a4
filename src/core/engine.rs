use super::table::{HistoricalTable, TableConfig};
use super::types::{
    CoreError, DistributionSummary, EcdfPoint, OutcomeSample, PlanParameters, SuggestedRange,
};

/// Borrowed view over the first `valid_rows` rows and first `years`
/// columns of the historical table. Nothing is copied until scaling.
#[derive(Debug, Clone, Copy)]
pub struct ScenarioWindow<'a> {
    table: &'a HistoricalTable,
    valid_rows: usize,
    years: usize,
}

impl ScenarioWindow<'_> {
    pub fn valid_rows(&self) -> usize {
        self.valid_rows
    }

    pub fn years(&self) -> usize {
        self.years
    }

    pub fn row(&self, r: usize) -> &[f64] {
        &self.table.row(r)[..self.years]
    }
}

/// Dollar-valued outcomes: the scenario window times the income amount.
#[derive(Debug, Clone, PartialEq)]
pub struct ScaledWindow {
    rows: usize,
    years: usize,
    values: Vec<f64>,
}

impl ScaledWindow {
    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn years(&self) -> usize {
        self.years
    }

    pub fn row(&self, r: usize) -> &[f64] {
        let start = r * self.years;
        &self.values[start..start + self.years]
    }
}

/// Which columns of a scaled window the row aggregation averages over.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnSpan {
    All,
    TrailingYears(u32),
}

/// Slices the table to the start months that still have `years` of data
/// ahead of them. The row budget comes from `config`; the result is
/// clamped to the table's physical rows. A budget of zero is signaled as
/// `EmptyWindow`, never returned as a degenerate matrix.
pub fn select<'a>(
    table: &'a HistoricalTable,
    config: TableConfig,
    years: u32,
) -> Result<ScenarioWindow<'a>, CoreError> {
    if years == 0 || years as usize > table.cols() {
        return Err(CoreError::InvalidParameter(format!(
            "years must be between 1 and {}, got {years}",
            table.cols()
        )));
    }

    let valid_rows = (config.valid_rows(years) as usize).min(table.rows());
    if valid_rows == 0 {
        return Err(CoreError::EmptyWindow {
            years,
            scenario_budget: config.scenario_budget(),
        });
    }

    Ok(ScenarioWindow {
        table,
        valid_rows,
        years: years as usize,
    })
}

/// Elementwise multiply by the withdrawal amount. Pure and deterministic.
pub fn scale(window: &ScenarioWindow<'_>, income_amount: f64) -> Result<ScaledWindow, CoreError> {
    if !income_amount.is_finite() || income_amount <= 0.0 {
        return Err(CoreError::InvalidParameter(format!(
            "income_amount must be > 0, got {income_amount}"
        )));
    }

    let mut values = Vec::with_capacity(window.valid_rows() * window.years());
    for r in 0..window.valid_rows() {
        for &factor in window.row(r) {
            values.push(factor * income_amount);
        }
    }

    Ok(ScaledWindow {
        rows: window.valid_rows(),
        years: window.years(),
        values,
    })
}

/// Reduces each row to its mean over the chosen columns.
/// `TrailingYears(k)` takes the `k` rightmost columns (the years closest
/// to the plan's end); a `k` beyond the window degrades to the full
/// window rather than failing, and a zero `k` is treated as one year.
pub fn row_means(scaled: &ScaledWindow, span: ColumnSpan) -> OutcomeSample {
    let cols = scaled.years();
    let take = match span {
        ColumnSpan::All => cols,
        ColumnSpan::TrailingYears(k) => (k.max(1) as usize).min(cols),
    };

    let mut means = Vec::with_capacity(scaled.rows());
    for r in 0..scaled.rows() {
        let row = scaled.row(r);
        let trailing = &row[cols - take..];
        means.push(trailing.iter().sum::<f64>() / take as f64);
    }
    OutcomeSample::new(means)
}

pub fn aggregate_full(scaled: &ScaledWindow) -> OutcomeSample {
    row_means(scaled, ColumnSpan::All)
}

pub fn aggregate_recent(scaled: &ScaledWindow, lookback_years: u32) -> OutcomeSample {
    row_means(scaled, ColumnSpan::TrailingYears(lookback_years))
}

/// The full select/scale/aggregate pipeline over all plan years.
pub fn compute_full_distribution(
    table: &HistoricalTable,
    config: TableConfig,
    params: &PlanParameters,
) -> Result<OutcomeSample, CoreError> {
    let window = select(table, config, params.years)?;
    let scaled = scale(&window, params.income_amount)?;
    Ok(row_means(&scaled, ColumnSpan::All))
}

/// Same pipeline, averaging only the trailing lookback years.
pub fn compute_recent_distribution(
    table: &HistoricalTable,
    config: TableConfig,
    params: &PlanParameters,
) -> Result<OutcomeSample, CoreError> {
    let window = select(table, config, params.years)?;
    let scaled = scale(&window, params.income_amount)?;
    Ok(row_means(
        &scaled,
        ColumnSpan::TrailingYears(params.lookback_years),
    ))
}

pub fn summarize(sample: &OutcomeSample) -> Result<DistributionSummary, CoreError> {
    if sample.is_empty() {
        return Err(CoreError::EmptySample);
    }

    let mut sorted = sample.values().to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));
    let n = sorted.len();
    let median = if n % 2 == 1 {
        sorted[n / 2]
    } else {
        (sorted[n / 2 - 1] + sorted[n / 2]) / 2.0
    };

    Ok(DistributionSummary {
        min: sorted[0],
        max: sorted[n - 1],
        mean: sorted.iter().sum::<f64>() / n as f64,
        median,
    })
}

/// The empirical CDF evaluated at a point: the fraction of outcomes at or
/// below `threshold`. The comparison is inclusive, matching the "at or
/// below" framing shown to the user.
pub fn probability_at_or_below(sample: &OutcomeSample, threshold: f64) -> Result<f64, CoreError> {
    if sample.is_empty() {
        return Err(CoreError::EmptySample);
    }
    if !threshold.is_finite() {
        return Err(CoreError::InvalidParameter(format!(
            "threshold must be finite, got {threshold}"
        )));
    }

    let count = sample.values().iter().filter(|&&v| v <= threshold).count();
    Ok(count as f64 / sample.len() as f64)
}

/// Linearly interpolated percentile over the sample, `p` in `[0, 100]`.
pub fn percentile(sample: &OutcomeSample, p: f64) -> Result<f64, CoreError> {
    if sample.is_empty() {
        return Err(CoreError::EmptySample);
    }
    if !(0.0..=100.0).contains(&p) {
        return Err(CoreError::InvalidParameter(format!(
            "percentile must be between 0 and 100, got {p}"
        )));
    }

    let mut sorted = sample.values().to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));
    let n = sorted.len();
    if n == 1 {
        return Ok(sorted[0]);
    }

    let rank = (p / 100.0) * (n as f64 - 1.0);
    let lower = rank.floor() as usize;
    let upper = rank.ceil() as usize;
    if lower == upper {
        Ok(sorted[lower])
    } else {
        let w = rank - lower as f64;
        Ok(sorted[lower] * (1.0 - w) + sorted[upper] * w)
    }
}

/// Sorted ECDF steps for chart rendering. Duplicate outcome values
/// collapse into one point carrying the highest fraction.
pub fn ecdf_points(sample: &OutcomeSample) -> Vec<EcdfPoint> {
    let mut sorted = sample.values().to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));
    let n = sorted.len();

    let mut points: Vec<EcdfPoint> = Vec::with_capacity(n);
    for (i, value) in sorted.into_iter().enumerate() {
        let fraction = (i + 1) as f64 / n as f64;
        match points.last_mut() {
            Some(last) if last.value == value => last.fraction = fraction,
            _ => points.push(EcdfPoint { value, fraction }),
        }
    }
    points
}

pub fn floor_to_hundred(x: f64) -> i64 {
    ((x / 100.0).floor() * 100.0) as i64
}

pub fn ceil_to_hundred(x: f64) -> i64 {
    ((x / 100.0).ceil() * 100.0) as i64
}

pub fn round_to_hundred(x: f64) -> i64 {
    ((x / 100.0).round() * 100.0) as i64
}

/// Round-number slider bounds: `[floor(min), ceil(max)]` to the nearest
/// 100, defaulting to the rounded median.
pub fn suggested_range(sample: &OutcomeSample) -> Result<SuggestedRange, CoreError> {
    let summary = summarize(sample)?;
    Ok(SuggestedRange {
        low: floor_to_hundred(summary.min),
        high: ceil_to_hundred(summary.max),
        default: round_to_hundred(summary.median),
    })
}
