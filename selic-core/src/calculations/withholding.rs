//! Regressive withholding-tax schedule.
//!
//! The rate withheld on investment gains falls the longer the money stays
//! invested:
//!
//! | Elapsed days (inclusive) | Rate  |
//! |--------------------------|-------|
//! | up to 180                | 22.5% |
//! | 181 to 360               | 20.0% |
//! | 361 to 720               | 17.5% |
//! | over 720                 | 15.0% |
//!
//! Elapsed days are approximated as `term_months * 30`. This is the
//! convention the schedule is applied with, not a calendar computation.
//!
//! # Example
//!
//! ```
//! use rust_decimal_macros::dec;
//! use selic_core::calculations::{WithholdingSchedule, elapsed_days};
//!
//! let schedule = WithholdingSchedule::regressive();
//!
//! assert_eq!(schedule.rate_for_days(elapsed_days(6)), Ok(dec!(0.225)));
//! assert_eq!(schedule.rate_for_days(elapsed_days(7)), Ok(dec!(0.20)));
//! assert_eq!(schedule.rate_for_days(elapsed_days(25)), Ok(dec!(0.15)));
//! ```

use rust_decimal::Decimal;
use thiserror::Error;

use crate::WithholdingBracket;

/// Days counted per month of holding.
pub const DAYS_PER_MONTH: u64 = 30;

/// Errors raised by a malformed [`WithholdingSchedule`].
#[derive(Debug, Error, PartialEq, Eq)]
pub enum WithholdingScheduleError {
    #[error("withholding schedule has no brackets")]
    Empty,

    #[error("bracket bounds must be strictly ascending, got {previous} then {next}")]
    UnorderedBounds { previous: u64, next: u64 },

    #[error("only the last bracket may be open-ended")]
    OpenBracketNotLast,

    #[error("last bracket must be open-ended")]
    MissingOpenBracket,

    #[error("withholding rate must be between 0 and 1, got {0}")]
    RateOutOfRange(Decimal),

    #[error("no withholding bracket covers {0} days")]
    NoMatchingBracket(u64),
}

/// Converts a term in months to the elapsed days the schedule is keyed on.
pub fn elapsed_days(term_months: u32) -> u64 {
    u64::from(term_months) * DAYS_PER_MONTH
}

/// Ordered step function from holding period to withholding rate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WithholdingSchedule {
    brackets: Vec<WithholdingBracket>,
}

impl WithholdingSchedule {
    /// Builds a schedule from brackets sorted by `max_days`.
    ///
    /// The brackets are not checked here; call [`validate`](Self::validate)
    /// before relying on them.
    pub fn new(brackets: Vec<WithholdingBracket>) -> Self {
        Self { brackets }
    }

    /// The four-step regressive schedule for fixed-income gains.
    pub fn regressive() -> Self {
        Self::new(vec![
            WithholdingBracket {
                max_days: Some(180),
                rate: Decimal::new(225, 3),
            },
            WithholdingBracket {
                max_days: Some(360),
                rate: Decimal::new(200, 3),
            },
            WithholdingBracket {
                max_days: Some(720),
                rate: Decimal::new(175, 3),
            },
            WithholdingBracket {
                max_days: None,
                rate: Decimal::new(150, 3),
            },
        ])
    }

    pub fn brackets(&self) -> &[WithholdingBracket] {
        &self.brackets
    }

    /// Checks that the brackets form a total step function.
    ///
    /// # Errors
    ///
    /// Returns [`WithholdingScheduleError`] if:
    /// - there are no brackets
    /// - a rate is outside [0, 1]
    /// - bounds are not strictly ascending
    /// - an open-ended bracket is not last, or the last one is bounded
    pub fn validate(&self) -> Result<(), WithholdingScheduleError> {
        let Some(last) = self.brackets.last() else {
            return Err(WithholdingScheduleError::Empty);
        };
        let last_index = self.brackets.len() - 1;

        let mut previous: Option<u64> = None;
        for (index, bracket) in self.brackets.iter().enumerate() {
            if bracket.rate < Decimal::ZERO || bracket.rate > Decimal::ONE {
                return Err(WithholdingScheduleError::RateOutOfRange(bracket.rate));
            }
            match (previous, bracket.max_days) {
                (Some(prev), Some(next)) if next <= prev => {
                    return Err(WithholdingScheduleError::UnorderedBounds {
                        previous: prev,
                        next,
                    });
                }
                (_, Some(next)) => previous = Some(next),
                (_, None) if index != last_index => {
                    return Err(WithholdingScheduleError::OpenBracketNotLast);
                }
                (_, None) => {}
            }
        }

        if last.max_days.is_some() {
            return Err(WithholdingScheduleError::MissingOpenBracket);
        }

        Ok(())
    }

    /// Selects the rate for a holding period. Upper bounds are inclusive.
    ///
    /// # Errors
    ///
    /// Returns [`WithholdingScheduleError::NoMatchingBracket`] when no bracket
    /// covers `days`, which only happens on a schedule that fails
    /// [`validate`](Self::validate).
    pub fn rate_for_days(
        &self,
        days: u64,
    ) -> Result<Decimal, WithholdingScheduleError> {
        self.brackets
            .iter()
            .find(|b| b.max_days.is_none_or(|max| days <= max))
            .map(|b| b.rate)
            .ok_or(WithholdingScheduleError::NoMatchingBracket(days))
    }
}

impl Default for WithholdingSchedule {
    fn default() -> Self {
        Self::regressive()
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;

    use super::*;

    fn bracket(
        max_days: Option<u64>,
        rate: Decimal,
    ) -> WithholdingBracket {
        WithholdingBracket { max_days, rate }
    }

    // =========================================================================
    // elapsed_days tests
    // =========================================================================

    #[test]
    fn elapsed_days_uses_thirty_day_months() {
        assert_eq!(elapsed_days(1), 30);
        assert_eq!(elapsed_days(12), 360);
        assert_eq!(elapsed_days(360), 10_800);
    }

    #[test]
    fn elapsed_days_does_not_overflow_for_max_term() {
        assert_eq!(elapsed_days(u32::MAX), u64::from(u32::MAX) * 30);
    }

    // =========================================================================
    // rate_for_days tests
    // =========================================================================

    #[test]
    fn regressive_schedule_bracket_boundaries() {
        let schedule = WithholdingSchedule::regressive();

        assert_eq!(schedule.rate_for_days(elapsed_days(6)), Ok(dec!(0.225)));
        assert_eq!(schedule.rate_for_days(elapsed_days(7)), Ok(dec!(0.200)));
        assert_eq!(schedule.rate_for_days(elapsed_days(12)), Ok(dec!(0.200)));
        assert_eq!(schedule.rate_for_days(elapsed_days(13)), Ok(dec!(0.175)));
        assert_eq!(schedule.rate_for_days(elapsed_days(24)), Ok(dec!(0.175)));
        assert_eq!(schedule.rate_for_days(elapsed_days(25)), Ok(dec!(0.150)));
    }

    #[test]
    fn regressive_schedule_upper_bounds_are_inclusive() {
        let schedule = WithholdingSchedule::regressive();

        assert_eq!(schedule.rate_for_days(180), Ok(dec!(0.225)));
        assert_eq!(schedule.rate_for_days(181), Ok(dec!(0.200)));
        assert_eq!(schedule.rate_for_days(360), Ok(dec!(0.200)));
        assert_eq!(schedule.rate_for_days(361), Ok(dec!(0.175)));
        assert_eq!(schedule.rate_for_days(720), Ok(dec!(0.175)));
        assert_eq!(schedule.rate_for_days(721), Ok(dec!(0.150)));
    }

    #[test]
    fn regressive_schedule_has_exactly_four_rates() {
        let rates: Vec<Decimal> = WithholdingSchedule::regressive()
            .brackets()
            .iter()
            .map(|b| b.rate)
            .collect();

        assert_eq!(rates, vec![dec!(0.225), dec!(0.20), dec!(0.175), dec!(0.15)]);
    }

    #[test]
    fn rate_for_days_without_open_bracket_reports_gap() {
        let schedule = WithholdingSchedule::new(vec![bracket(Some(180), dec!(0.225))]);

        assert_eq!(
            schedule.rate_for_days(181),
            Err(WithholdingScheduleError::NoMatchingBracket(181))
        );
    }

    // =========================================================================
    // validate tests
    // =========================================================================

    #[test]
    fn validate_accepts_regressive_schedule() {
        assert_eq!(WithholdingSchedule::regressive().validate(), Ok(()));
    }

    #[test]
    fn validate_accepts_single_open_bracket() {
        let schedule = WithholdingSchedule::new(vec![bracket(None, dec!(0.15))]);

        assert_eq!(schedule.validate(), Ok(()));
    }

    #[test]
    fn validate_rejects_empty_schedule() {
        let schedule = WithholdingSchedule::new(Vec::new());

        assert_eq!(schedule.validate(), Err(WithholdingScheduleError::Empty));
    }

    #[test]
    fn validate_rejects_unordered_bounds() {
        let schedule = WithholdingSchedule::new(vec![
            bracket(Some(360), dec!(0.20)),
            bracket(Some(180), dec!(0.225)),
            bracket(None, dec!(0.15)),
        ]);

        assert_eq!(
            schedule.validate(),
            Err(WithholdingScheduleError::UnorderedBounds {
                previous: 360,
                next: 180
            })
        );
    }

    #[test]
    fn validate_rejects_duplicate_bounds() {
        let schedule = WithholdingSchedule::new(vec![
            bracket(Some(180), dec!(0.225)),
            bracket(Some(180), dec!(0.20)),
            bracket(None, dec!(0.15)),
        ]);

        assert_eq!(
            schedule.validate(),
            Err(WithholdingScheduleError::UnorderedBounds {
                previous: 180,
                next: 180
            })
        );
    }

    #[test]
    fn validate_rejects_open_bracket_before_last() {
        let schedule = WithholdingSchedule::new(vec![
            bracket(None, dec!(0.225)),
            bracket(None, dec!(0.15)),
        ]);

        assert_eq!(
            schedule.validate(),
            Err(WithholdingScheduleError::OpenBracketNotLast)
        );
    }

    #[test]
    fn validate_rejects_bounded_last_bracket() {
        let schedule = WithholdingSchedule::new(vec![
            bracket(Some(180), dec!(0.225)),
            bracket(Some(360), dec!(0.20)),
        ]);

        assert_eq!(
            schedule.validate(),
            Err(WithholdingScheduleError::MissingOpenBracket)
        );
    }

    #[test]
    fn validate_rejects_rate_above_one() {
        let schedule = WithholdingSchedule::new(vec![bracket(None, dec!(1.5))]);

        assert_eq!(
            schedule.validate(),
            Err(WithholdingScheduleError::RateOutOfRange(dec!(1.5)))
        );
    }

    #[test]
    fn validate_rejects_negative_rate() {
        let schedule = WithholdingSchedule::new(vec![bracket(None, dec!(-0.1))]);

        assert_eq!(
            schedule.validate(),
            Err(WithholdingScheduleError::RateOutOfRange(dec!(-0.1)))
        );
    }
}
