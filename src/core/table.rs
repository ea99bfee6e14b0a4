use super::types::CoreError;

/// Immutable matrix of CPI-derived scaling factors. Rows are historical
/// start months, columns are elapsed years within a plan. Cell `(r, c)`
/// is the real value, in start-month dollars, of one nominal dollar of
/// income during year `c + 1` of a plan beginning at month `r`.
#[derive(Debug, Clone, PartialEq)]
pub struct HistoricalTable {
    rows: usize,
    cols: usize,
    cells: Vec<f64>,
}

impl HistoricalTable {
    /// Builds a table from row vectors, rejecting ragged input and any
    /// cell that is not a finite non-negative index ratio.
    pub fn from_rows(rows: Vec<Vec<f64>>) -> Result<Self, CoreError> {
        let Some(first) = rows.first() else {
            return Err(CoreError::InvalidParameter(
                "historical table must have at least one row".to_string(),
            ));
        };
        let cols = first.len();
        if cols == 0 {
            return Err(CoreError::InvalidParameter(
                "historical table must have at least one column".to_string(),
            ));
        }

        let mut cells = Vec::with_capacity(rows.len() * cols);
        for (r, row) in rows.iter().enumerate() {
            if row.len() != cols {
                return Err(CoreError::InvalidParameter(format!(
                    "table row {r} has {} cells, expected {cols}",
                    row.len()
                )));
            }
            for (c, &value) in row.iter().enumerate() {
                if !value.is_finite() || value < 0.0 {
                    return Err(CoreError::InvalidParameter(format!(
                        "table cell ({r}, {c}) is not a finite non-negative ratio: {value}"
                    )));
                }
                cells.push(value);
            }
        }

        Ok(Self {
            rows: rows.len(),
            cols,
            cells,
        })
    }

    /// Parses the headerless comma-separated on-disk representation.
    pub fn from_csv(text: &str) -> Result<Self, CoreError> {
        let mut rows = Vec::new();
        for (line_no, line) in text.lines().enumerate() {
            if line.trim().is_empty() {
                continue;
            }
            let row = line
                .split(',')
                .map(|field| {
                    field.trim().parse::<f64>().map_err(|_| {
                        CoreError::InvalidParameter(format!(
                            "table line {}: unparseable cell {field:?}",
                            line_no + 1
                        ))
                    })
                })
                .collect::<Result<Vec<f64>, CoreError>>()?;
            rows.push(row);
        }
        Self::from_rows(rows)
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn row(&self, r: usize) -> &[f64] {
        let start = r * self.cols;
        &self.cells[start..start + self.cols]
    }
}

pub const MONTHS_PER_YEAR: u32 = 12;

/// Row-budget configuration tied to a specific table, not universal
/// constants: `base_row_count` is the table's months of history minus one
/// year, `row_offset` the one-year buffer the data generation added. The
/// number of start months that still have a full plan of data ahead of
/// them is `base_row_count + row_offset - 12 * years`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TableConfig {
    pub base_row_count: u32,
    pub row_offset: u32,
}

/// Values for the shipped `cpi_end_val` table (1190 rows).
impl Default for TableConfig {
    fn default() -> Self {
        Self {
            base_row_count: 1166,
            row_offset: 24,
        }
    }
}

impl TableConfig {
    /// Derives the config from a table's actual dimensions, keeping the
    /// stated buffer. `validate` then holds by construction.
    pub fn for_table(table: &HistoricalTable, row_offset: u32) -> Result<Self, CoreError> {
        let rows = u32::try_from(table.rows()).map_err(|_| CoreError::ConfigMismatch {
            expected_rows: u32::MAX as usize,
            actual_rows: table.rows(),
        })?;
        if rows <= row_offset {
            return Err(CoreError::ConfigMismatch {
                expected_rows: row_offset as usize + 1,
                actual_rows: table.rows(),
            });
        }
        Ok(Self {
            base_row_count: rows - row_offset,
            row_offset,
        })
    }

    /// Load-time check that the row-count formula and the table agree.
    pub fn validate(&self, table: &HistoricalTable) -> Result<(), CoreError> {
        let expected_rows = (self.base_row_count + self.row_offset) as usize;
        if expected_rows != table.rows() {
            return Err(CoreError::ConfigMismatch {
                expected_rows,
                actual_rows: table.rows(),
            });
        }
        Ok(())
    }

    /// Start months the table has left for a plan of `years`, before
    /// clamping to the table's physical row count.
    pub fn scenario_budget(&self) -> u32 {
        self.base_row_count + self.row_offset
    }

    pub fn valid_rows(&self, years: u32) -> u32 {
        self.scenario_budget()
            .saturating_sub(MONTHS_PER_YEAR * years)
    }
}
