//! Investment projection engine.
//!
//! Projects a fixed-income investment indexed to an annual benchmark rate
//! month by month, then withholds tax on the gain.
//!
//! # Steps
//!
//! | Step | Description |
//! |------|-------------|
//! | 1    | Monthly rate: `(1 + annual_rate / 100)^(1/12) - 1` |
//! | 2    | Month `m` balance: `balance[m-1] * (1 + monthly_rate) + contribution` |
//! | 3    | Elapsed days: `term_months * 30` |
//! | 4    | Withholding rate from the regressive schedule |
//! | 5    | Gain: gross balance - principal - contribution × term_months |
//! | 6    | Tax: max(gain, 0) × rate; net = gross - tax |
//!
//! The monthly rate is the geometric equivalent of the annual rate, so twelve
//! months at the monthly rate grow exactly as much as one year at the annual
//! rate. Contributions are added at the end of each month, after that month's
//! growth.
//!
//! # Example
//!
//! ```
//! use rust_decimal_macros::dec;
//! use selic_core::project;
//!
//! let result = project(dec!(1000.00), dec!(0.00), dec!(12.75), 12).unwrap();
//!
//! assert_eq!(result.monthly_balances.len(), 12);
//! assert!((result.gross_final_balance - dec!(1127.50)).abs() < dec!(0.000001));
//! assert_eq!(result.tax_rate_applied, dec!(0.20));
//! ```

use rust_decimal::Decimal;
use rust_decimal::prelude::{FromPrimitive, ToPrimitive};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

use super::common::max;
use super::withholding::{WithholdingSchedule, WithholdingScheduleError, elapsed_days};
use crate::{InvalidInput, MonthlyBalance, ProjectionInput, ProjectionResult};

/// Most alternative rates a single comparison may carry.
pub const MAX_SCENARIOS: usize = 5;

/// Errors that can occur while projecting an investment.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ProjectionError {
    /// Parameters rejected before computation.
    #[error("invalid input: {0}")]
    InvalidInput(#[from] InvalidInput),

    /// The annual rate has no finite monthly equivalent in decimal range.
    #[error("annual rate {0}% cannot be converted to a monthly rate")]
    RateConversion(Decimal),

    /// A balance exceeded the decimal range.
    #[error("balance overflowed at month {month}")]
    Overflow { month: u32 },

    /// The engine was configured with a malformed schedule.
    #[error("invalid withholding schedule: {0}")]
    Schedule(#[from] WithholdingScheduleError),
}

/// Converts an annual percentage rate to its geometric monthly equivalent,
/// as a fraction.
///
/// # Errors
///
/// Returns [`ProjectionError::RateConversion`] when the rate cannot be
/// represented as `f64` or the result is not a finite decimal.
///
/// # Example
///
/// ```
/// use rust_decimal_macros::dec;
/// use selic_core::calculations::monthly_rate;
///
/// let rate = monthly_rate(dec!(12.75)).unwrap();
///
/// assert!((rate - dec!(0.0100504021)).abs() < dec!(0.0000000001));
/// ```
pub fn monthly_rate(annual_rate: Decimal) -> Result<Decimal, ProjectionError> {
    if annual_rate.is_zero() {
        return Ok(Decimal::ZERO);
    }

    let annual = annual_rate
        .to_f64()
        .ok_or(ProjectionError::RateConversion(annual_rate))?;
    let monthly = (1.0 + annual / 100.0).powf(1.0 / 12.0) - 1.0;
    if !monthly.is_finite() {
        return Err(ProjectionError::RateConversion(annual_rate));
    }

    Decimal::from_f64(monthly).ok_or(ProjectionError::RateConversion(annual_rate))
}

/// A base projection and the projections it is compared against.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Simulation {
    pub base: ProjectionResult,
    pub scenarios: Vec<ProjectionResult>,
}

/// Projects investments against a withholding schedule.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProjectionEngine {
    schedule: WithholdingSchedule,
}

impl ProjectionEngine {
    /// Creates an engine that withholds tax according to `schedule`.
    pub fn new(schedule: WithholdingSchedule) -> Self {
        Self { schedule }
    }

    pub fn schedule(&self) -> &WithholdingSchedule {
        &self.schedule
    }

    /// Projects a single investment.
    ///
    /// # Errors
    ///
    /// Returns [`ProjectionError`] if:
    /// - the input is invalid (no partial result is produced)
    /// - the schedule is malformed
    /// - the rate conversion or a balance leaves the decimal range
    pub fn project_input(
        &self,
        input: &ProjectionInput,
    ) -> Result<ProjectionResult, ProjectionError> {
        input.validate()?;
        self.schedule.validate()?;

        let monthly_rate = monthly_rate(input.annual_rate)?;
        let monthly_balances = self.trajectory(input, monthly_rate)?;
        let gross_final_balance = monthly_balances
            .last()
            .map_or(input.principal, |b| b.balance);

        let elapsed_days = elapsed_days(input.term_months);
        let tax_rate_applied = self.schedule.rate_for_days(elapsed_days)?;

        let taxable_gain = self.taxable_gain(input, gross_final_balance)?;
        let tax_amount = self.tax_amount(taxable_gain, tax_rate_applied);
        let net_final_balance = gross_final_balance - tax_amount;

        debug!(
            principal = %input.principal,
            monthly_contribution = %input.monthly_contribution,
            annual_rate = %input.annual_rate,
            term_months = input.term_months,
            monthly_rate = %monthly_rate,
            gross = %gross_final_balance,
            tax = %tax_amount,
            "projection computed"
        );

        Ok(ProjectionResult {
            input: *input,
            monthly_balances,
            gross_final_balance,
            elapsed_days,
            tax_rate_applied,
            taxable_gain,
            tax_amount,
            net_final_balance,
        })
    }

    /// Projects a single investment from its individual parameters.
    pub fn project(
        &self,
        principal: Decimal,
        monthly_contribution: Decimal,
        annual_rate: Decimal,
        term_months: u32,
    ) -> Result<ProjectionResult, ProjectionError> {
        self.project_input(&ProjectionInput::new(
            principal,
            monthly_contribution,
            annual_rate,
            term_months,
        ))
    }

    /// Projects the same principal, contribution and term under each of
    /// `annual_rates`, independently and in the given order.
    ///
    /// # Errors
    ///
    /// Returns [`InvalidInput::ScenarioCount`] unless there are between one
    /// and [`MAX_SCENARIOS`] rates, and any error a single projection would.
    pub fn project_scenarios(
        &self,
        principal: Decimal,
        monthly_contribution: Decimal,
        term_months: u32,
        annual_rates: &[Decimal],
    ) -> Result<Vec<ProjectionResult>, ProjectionError> {
        if annual_rates.is_empty() || annual_rates.len() > MAX_SCENARIOS {
            return Err(InvalidInput::ScenarioCount {
                count: annual_rates.len(),
                max: MAX_SCENARIOS,
            }
            .into());
        }

        let base = ProjectionInput::new(principal, monthly_contribution, Decimal::ZERO, term_months);
        annual_rates
            .iter()
            .map(|rate| self.project_input(&base.with_rate(*rate)))
            .collect()
    }

    /// Projects `base` and, when comparison rates are given, the same
    /// investment under each of them.
    pub fn simulate(
        &self,
        base: &ProjectionInput,
        comparison_rates: Option<&[Decimal]>,
    ) -> Result<Simulation, ProjectionError> {
        let base_result = self.project_input(base)?;
        let scenarios = match comparison_rates {
            Some(rates) => self.project_scenarios(
                base.principal,
                base.monthly_contribution,
                base.term_months,
                rates,
            )?,
            None => Vec::new(),
        };

        Ok(Simulation {
            base: base_result,
            scenarios,
        })
    }

    /// Month-by-month balances, months `1..=term_months`.
    fn trajectory(
        &self,
        input: &ProjectionInput,
        monthly_rate: Decimal,
    ) -> Result<Vec<MonthlyBalance>, ProjectionError> {
        let growth = Decimal::ONE + monthly_rate;
        let mut balance = input.principal;

        (1..=input.term_months)
            .map(|month| {
                balance = balance
                    .checked_mul(growth)
                    .and_then(|grown| grown.checked_add(input.monthly_contribution))
                    .ok_or(ProjectionError::Overflow { month })?;
                Ok(MonthlyBalance { month, balance })
            })
            .collect()
    }

    /// Gross balance minus returned capital (principal and every
    /// contribution, including the last one).
    fn taxable_gain(
        &self,
        input: &ProjectionInput,
        gross_final_balance: Decimal,
    ) -> Result<Decimal, ProjectionError> {
        let overflow = || ProjectionError::Overflow {
            month: input.term_months,
        };
        let contributed = input
            .monthly_contribution
            .checked_mul(Decimal::from(input.term_months))
            .ok_or_else(overflow)?;

        gross_final_balance
            .checked_sub(input.principal)
            .and_then(|g| g.checked_sub(contributed))
            .ok_or_else(overflow)
    }

    /// Tax on the gain; a negative gain is not refunded.
    fn tax_amount(
        &self,
        taxable_gain: Decimal,
        tax_rate: Decimal,
    ) -> Decimal {
        if taxable_gain < Decimal::ZERO {
            warn!(
                taxable_gain = %taxable_gain,
                "gain is negative; no tax withheld"
            );
        }
        max(taxable_gain, Decimal::ZERO) * tax_rate
    }
}

/// Projects a single investment under the regressive schedule.
pub fn project(
    principal: Decimal,
    monthly_contribution: Decimal,
    annual_rate: Decimal,
    term_months: u32,
) -> Result<ProjectionResult, ProjectionError> {
    ProjectionEngine::default().project(principal, monthly_contribution, annual_rate, term_months)
}

/// Projects one investment per annual rate under the regressive schedule.
pub fn project_scenarios(
    principal: Decimal,
    monthly_contribution: Decimal,
    term_months: u32,
    annual_rates: &[Decimal],
) -> Result<Vec<ProjectionResult>, ProjectionError> {
    ProjectionEngine::default().project_scenarios(
        principal,
        monthly_contribution,
        term_months,
        annual_rates,
    )
}
