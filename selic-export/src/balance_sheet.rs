//! Month-by-month balance sheet of a projection.
//!
//! One row per month. The base projection contributes the gross balance
//! and every comparison scenario adds one balance column. Two writers share
//! the same rows:
//!
//! | Format | Layout |
//! |--------|--------|
//! | `.xlsx` | worksheet `Evolução Mensal`; balances are numbers with an `R$` currency format |
//! | `.csv`  | balances as plain numbers, plus a text column with the base balance as money |
//!
//! ```text
//! Month,Gross Balance,Gross Balance (R$),Scenario 1 (10%)
//! 1,1110.05,"R$1,110.05",1107.97
//! ...
//! ```

use std::fs::File;
use std::io::Write;
use std::path::Path;

use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use rust_xlsxwriter::{Format, Workbook, XlsxError};
use selic_core::ProjectionResult;
use selic_core::calculations::common::{format_money, round_half_up};
use thiserror::Error;
use tracing::{debug, info};

/// Name of the worksheet holding the balances.
pub const SHEET_NAME: &str = "Evolução Mensal";

/// Excel number format applied to every balance cell.
const MONEY_FORMAT: &str = "\"R$\" #,##0.00";

/// Errors that can occur while exporting a balance sheet.
#[derive(Debug, Error)]
pub enum ExportError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("XLSX error: {0}")]
    Xlsx(#[from] XlsxError),

    #[error(
        "scenario {scenario} covers {scenario_months} months but the base projection covers {base_months}"
    )]
    MonthAxisMismatch {
        scenario: usize,
        base_months: usize,
        scenario_months: usize,
    },
}

/// File format chosen from the export path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Xlsx,
    Csv,
}

impl ExportFormat {
    /// `.csv` (any case) selects CSV; every other path gets a workbook.
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("csv") => ExportFormat::Csv,
            _ => ExportFormat::Xlsx,
        }
    }
}

/// A single month of the sheet, with balances rounded to cents.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SheetRow {
    pub month: u32,
    pub balance: Decimal,
    pub balance_display: String,
    pub scenario_balances: Vec<Decimal>,
}

/// Balance sheet over a base projection and its comparison scenarios.
#[derive(Debug, Clone, Copy)]
pub struct BalanceSheet<'a> {
    base: &'a ProjectionResult,
    scenarios: &'a [ProjectionResult],
}

impl<'a> BalanceSheet<'a> {
    pub fn new(base: &'a ProjectionResult) -> Self {
        Self {
            base,
            scenarios: &[],
        }
    }

    /// Adds one column per scenario, in the given order.
    pub fn with_scenarios(
        self,
        scenarios: &'a [ProjectionResult],
    ) -> Self {
        Self { scenarios, ..self }
    }

    fn scenario_headers(&self) -> impl Iterator<Item = String> + '_ {
        self.scenarios.iter().enumerate().map(|(i, scenario)| {
            format!(
                "Scenario {} ({}%)",
                i + 1,
                scenario.input.annual_rate.normalize()
            )
        })
    }

    /// Column titles of the CSV layout.
    pub fn csv_headers(&self) -> Vec<String> {
        let mut headers = vec![
            "Month".to_string(),
            "Gross Balance".to_string(),
            "Gross Balance (R$)".to_string(),
        ];
        headers.extend(self.scenario_headers());
        headers
    }

    /// Column titles of the workbook layout.
    pub fn xlsx_headers(&self) -> Vec<String> {
        let mut headers = vec!["Month".to_string(), "Gross Balance (R$)".to_string()];
        headers.extend(self.scenario_headers());
        headers
    }

    /// Builds the rows of the sheet.
    ///
    /// # Errors
    ///
    /// Returns [`ExportError::MonthAxisMismatch`] if a scenario does not
    /// cover exactly the base projection's months.
    pub fn rows(&self) -> Result<Vec<SheetRow>, ExportError> {
        self.check_month_axis()?;

        Ok(self
            .base
            .monthly_balances
            .iter()
            .enumerate()
            .map(|(i, entry)| SheetRow {
                month: entry.month,
                balance: round_half_up(entry.balance),
                balance_display: format_money(entry.balance),
                scenario_balances: self
                    .scenarios
                    .iter()
                    .map(|s| round_half_up(s.monthly_balances[i].balance))
                    .collect(),
            })
            .collect())
    }

    /// Writes the header and every row as CSV to `writer`.
    pub fn write_csv<W: Write>(
        &self,
        writer: W,
    ) -> Result<(), ExportError> {
        let rows = self.rows()?;
        let mut wtr = csv::Writer::from_writer(writer);

        wtr.write_record(self.csv_headers())?;
        for row in &rows {
            let mut record = vec![
                row.month.to_string(),
                format!("{:.2}", row.balance),
                row.balance_display.clone(),
            ];
            record.extend(row.scenario_balances.iter().map(|b| format!("{b:.2}")));
            wtr.write_record(&record)?;
        }
        wtr.flush()?;

        debug!(
            rows = rows.len(),
            scenarios = self.scenarios.len(),
            "csv balance sheet written"
        );
        Ok(())
    }

    /// Renders the sheet as an `.xlsx` workbook.
    pub fn to_xlsx_bytes(&self) -> Result<Vec<u8>, ExportError> {
        let rows = self.rows()?;
        let header = Format::new().set_bold();
        let money = Format::new().set_num_format(MONEY_FORMAT);

        let mut workbook = Workbook::new();
        let worksheet = workbook.add_worksheet();
        worksheet.set_name(SHEET_NAME)?;

        for (col, title) in (0u16..).zip(self.xlsx_headers()) {
            worksheet.write_string_with_format(0, col, title, &header)?;
            worksheet.set_column_width(col, if col == 0 { 8.0 } else { 20.0 })?;
        }
        worksheet.set_freeze_panes(1, 0)?;

        for (row_index, row) in (1u32..).zip(&rows) {
            worksheet.write_number(row_index, 0, row.month)?;
            worksheet.write_number_with_format(row_index, 1, to_cell(row.balance), &money)?;
            for (col, balance) in (2u16..).zip(&row.scenario_balances) {
                worksheet.write_number_with_format(row_index, col, to_cell(*balance), &money)?;
            }
        }

        let bytes = workbook.save_to_buffer()?;
        debug!(
            rows = rows.len(),
            scenarios = self.scenarios.len(),
            "xlsx balance sheet rendered"
        );
        Ok(bytes)
    }

    /// Creates (or truncates) the file at `path` and writes the sheet in the
    /// format its extension selects.
    pub fn write_to_path(
        &self,
        path: &Path,
    ) -> Result<(), ExportError> {
        let format = ExportFormat::from_path(path);
        match format {
            ExportFormat::Csv => self.write_csv(File::create(path)?)?,
            ExportFormat::Xlsx => {
                let bytes = self.to_xlsx_bytes()?;
                std::fs::write(path, bytes)?;
            }
        }
        info!(path = %path.display(), ?format, "balance sheet exported");
        Ok(())
    }

    fn check_month_axis(&self) -> Result<(), ExportError> {
        let base_months = self.base.monthly_balances.len();

        for (i, scenario) in self.scenarios.iter().enumerate() {
            let same_axis = scenario.monthly_balances.len() == base_months
                && scenario
                    .months()
                    .zip(self.base.months())
                    .all(|(a, b)| a == b);

            if !same_axis {
                return Err(ExportError::MonthAxisMismatch {
                    scenario: i + 1,
                    base_months,
                    scenario_months: scenario.monthly_balances.len(),
                });
            }
        }
        Ok(())
    }
}

/// Spreadsheet cells hold `f64`; balances are already rounded to cents.
fn to_cell(value: Decimal) -> f64 {
    value.to_f64().unwrap_or(0.0)
}
