use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// One step of a withholding schedule.
///
/// Applies to holding periods up to and including `max_days`; `None` marks
/// the open-ended last step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WithholdingBracket {
    pub max_days: Option<u64>,
    pub rate: Decimal,
}
