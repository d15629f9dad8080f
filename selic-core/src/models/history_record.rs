use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::{ProjectionInput, ProjectionResult};

/// A persisted simulation outcome.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryRecord {
    pub id: i64,
    pub created_at: DateTime<Utc>,

    pub principal: Decimal,
    pub monthly_contribution: Decimal,
    pub annual_rate: Decimal,
    pub term_months: u32,

    pub gross_final_balance: Decimal,
    pub tax_amount: Decimal,
    pub net_final_balance: Decimal,
}

impl HistoryRecord {
    pub fn input(&self) -> ProjectionInput {
        ProjectionInput::new(
            self.principal,
            self.monthly_contribution,
            self.annual_rate,
            self.term_months,
        )
    }
}

/// For appending new records (no id; the store assigns it)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewHistoryRecord {
    pub created_at: DateTime<Utc>,
    pub principal: Decimal,
    pub monthly_contribution: Decimal,
    pub annual_rate: Decimal,
    pub term_months: u32,
    pub gross_final_balance: Decimal,
    pub tax_amount: Decimal,
    pub net_final_balance: Decimal,
}

impl NewHistoryRecord {
    /// Captures `result` as a record stamped with `created_at`.
    ///
    /// The timestamp is supplied by the caller so the engine stays free of
    /// clock reads.
    pub fn from_result(
        result: &ProjectionResult,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            created_at,
            principal: result.input.principal,
            monthly_contribution: result.input.monthly_contribution,
            annual_rate: result.input.annual_rate,
            term_months: result.input.term_months,
            gross_final_balance: result.gross_final_balance,
            tax_amount: result.tax_amount,
            net_final_balance: result.net_final_balance,
        }
    }
}
