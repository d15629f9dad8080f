pub mod balance_sheet;

pub use balance_sheet::{BalanceSheet, ExportError, ExportFormat, SHEET_NAME, SheetRow};
pub use selic_core::calculations::common::format_money;
