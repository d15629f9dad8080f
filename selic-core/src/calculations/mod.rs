//! Projection and withholding-tax calculations.
//!
//! Everything in this module is a pure function of its inputs: no I/O, no
//! clock reads, no shared state.

pub mod common;
pub mod projection;
pub mod withholding;

pub use projection::{
    MAX_SCENARIOS, ProjectionEngine, ProjectionError, Simulation, monthly_rate, project,
    project_scenarios,
};
pub use withholding::{DAYS_PER_MONTH, WithholdingSchedule, WithholdingScheduleError, elapsed_days};
