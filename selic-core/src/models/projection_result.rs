use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::ProjectionInput;

/// Gross balance at the end of a given month (1-based).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonthlyBalance {
    pub month: u32,
    pub balance: Decimal,
}

/// Outcome of projecting one [`ProjectionInput`].
///
/// Amounts keep full precision; round with
/// [`round_half_up`](crate::calculations::common::round_half_up) when
/// presenting them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectionResult {
    /// Parameters the projection was computed from.
    pub input: ProjectionInput,

    /// One entry per month, months `1..=term_months` in order.
    pub monthly_balances: Vec<MonthlyBalance>,

    /// Balance at the last month, before tax.
    pub gross_final_balance: Decimal,

    /// `term_months * 30`, the approximation the withholding schedule is keyed on.
    pub elapsed_days: u64,

    /// Withholding rate as a fraction (e.g. `0.225`).
    pub tax_rate_applied: Decimal,

    /// Gross balance minus returned capital. May be negative in principle;
    /// tax is never computed on a negative gain.
    pub taxable_gain: Decimal,

    /// Tax withheld on the gain.
    pub tax_amount: Decimal,

    /// `gross_final_balance - tax_amount`.
    pub net_final_balance: Decimal,
}

impl ProjectionResult {
    /// Month axis shared by every projection with the same term.
    pub fn months(&self) -> impl Iterator<Item = u32> + '_ {
        self.monthly_balances.iter().map(|b| b.month)
    }
}
