mod history_record;
mod projection_input;
mod projection_result;
mod withholding_bracket;

pub use history_record::{HistoryRecord, NewHistoryRecord};
pub use projection_input::{InvalidInput, ProjectionInput};
pub use projection_result::{MonthlyBalance, ProjectionResult};
pub use withholding_bracket::WithholdingBracket;
