use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Reasons a set of projection parameters is rejected before any
/// computation takes place.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum InvalidInput {
    #[error("principal must be non-negative, got {0}")]
    NegativePrincipal(Decimal),

    #[error("monthly contribution must be non-negative, got {0}")]
    NegativeContribution(Decimal),

    #[error("annual rate must be non-negative, got {0}")]
    NegativeRate(Decimal),

    #[error("term must be at least one month")]
    ZeroTerm,

    #[error("between 1 and {max} comparison rates are allowed, got {count}")]
    ScenarioCount { count: usize, max: usize },
}

/// Parameters of a single simulation request.
///
/// `annual_rate` is a percentage: `12.75` means 12.75% a year.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectionInput {
    pub principal: Decimal,
    pub monthly_contribution: Decimal,
    pub annual_rate: Decimal,
    pub term_months: u32,
}

impl ProjectionInput {
    pub fn new(
        principal: Decimal,
        monthly_contribution: Decimal,
        annual_rate: Decimal,
        term_months: u32,
    ) -> Self {
        Self {
            principal,
            monthly_contribution,
            annual_rate,
            term_months,
        }
    }

    /// Same principal, contribution and term under a different annual rate.
    pub fn with_rate(
        &self,
        annual_rate: Decimal,
    ) -> Self {
        Self {
            annual_rate,
            ..*self
        }
    }

    /// Checks every field against its domain.
    ///
    /// Fields are checked in declaration order and the first violation is
    /// returned.
    pub fn validate(&self) -> Result<(), InvalidInput> {
        if self.principal < Decimal::ZERO {
            return Err(InvalidInput::NegativePrincipal(self.principal));
        }
        if self.monthly_contribution < Decimal::ZERO {
            return Err(InvalidInput::NegativeContribution(
                self.monthly_contribution,
            ));
        }
        if self.annual_rate < Decimal::ZERO {
            return Err(InvalidInput::NegativeRate(self.annual_rate));
        }
        if self.term_months == 0 {
            return Err(InvalidInput::ZeroTerm);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;

    use super::*;

    fn valid_input() -> ProjectionInput {
        ProjectionInput::new(dec!(1000.00), dec!(100.00), dec!(12.75), 12)
    }

    #[test]
    fn validate_accepts_valid_input() {
        assert_eq!(valid_input().validate(), Ok(()));
    }

    #[test]
    fn validate_accepts_all_zero_amounts() {
        let input = ProjectionInput::new(dec!(0), dec!(0), dec!(0), 1);

        assert_eq!(input.validate(), Ok(()));
    }

    #[test]
    fn validate_rejects_negative_principal() {
        let input = ProjectionInput {
            principal: dec!(-0.01),
            ..valid_input()
        };

        assert_eq!(
            input.validate(),
            Err(InvalidInput::NegativePrincipal(dec!(-0.01)))
        );
    }

    #[test]
    fn validate_rejects_negative_contribution() {
        let input = ProjectionInput {
            monthly_contribution: dec!(-50),
            ..valid_input()
        };

        assert_eq!(
            input.validate(),
            Err(InvalidInput::NegativeContribution(dec!(-50)))
        );
    }

    #[test]
    fn validate_rejects_negative_rate() {
        let input = ProjectionInput {
            annual_rate: dec!(-1.5),
            ..valid_input()
        };

        assert_eq!(input.validate(), Err(InvalidInput::NegativeRate(dec!(-1.5))));
    }

    #[test]
    fn validate_rejects_zero_term() {
        let input = ProjectionInput {
            term_months: 0,
            ..valid_input()
        };

        assert_eq!(input.validate(), Err(InvalidInput::ZeroTerm));
    }

    #[test]
    fn validate_reports_first_violation() {
        let input = ProjectionInput::new(dec!(-1), dec!(-1), dec!(-1), 0);

        assert_eq!(input.validate(), Err(InvalidInput::NegativePrincipal(dec!(-1))));
    }

    #[test]
    fn with_rate_keeps_other_fields() {
        let input = valid_input().with_rate(dec!(10.00));

        assert_eq!(input.annual_rate, dec!(10.00));
        assert_eq!(input.principal, dec!(1000.00));
        assert_eq!(input.monthly_contribution, dec!(100.00));
        assert_eq!(input.term_months, 12);
    }
}
