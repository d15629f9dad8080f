//! Request orchestration between the engine and its collaborators.
//!
//! The projection is the primary result of a request. Saving and exporting
//! are best-effort: when either fails the caller gets a [`Notice`] next to
//! the result instead of an error.

use std::fmt;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use selic_core::calculations::Simulation;
use selic_core::db::{DbConfig, RepositoryRegistry};
use selic_core::{
    HistoryRecord, NewHistoryRecord, ProjectionEngine, ProjectionError, ProjectionInput,
    ProjectionResult, RecordId, RepositoryError,
};
use selic_db_sqlite::SqliteRepositoryFactory;
use thiserror::Error;
use tracing::{info, warn};

/// Registry with every storage backend compiled into the binary.
pub fn build_registry() -> RepositoryRegistry {
    let mut registry = RepositoryRegistry::new();
    registry.register(Box::new(SqliteRepositoryFactory));
    registry
}

/// A failed side effect that did not stop the request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    PersistenceUnavailable(String),
    ExportUnavailable(String),
}

impl fmt::Display for Notice {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        match self {
            Notice::PersistenceUnavailable(reason) => {
                write!(f, "history unavailable, simulation not saved: {reason}")
            }
            Notice::ExportUnavailable(reason) => write!(f, "export unavailable: {reason}"),
        }
    }
}

/// Why a requested export was not written.
#[derive(Debug, Error)]
pub enum ExportFailure {
    #[cfg(feature = "export")]
    #[error(transparent)]
    Export(#[from] selic_export::ExportError),

    #[error("spreadsheet export is not available in this build")]
    NotCompiled,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum AppError {
    #[error(transparent)]
    Projection(#[from] ProjectionError),

    #[error("term of {term_months} months exceeds the configured maximum of {max} months")]
    TermTooLong { term_months: u32, max: u32 },
}

/// Everything one `simulate` invocation asks for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SimulationRequest {
    pub input: ProjectionInput,
    pub comparison_rates: Option<Vec<Decimal>>,
    pub save: bool,
    pub export_path: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SimulationOutcome {
    pub simulation: Simulation,
    pub saved_id: Option<RecordId>,
    pub exported_to: Option<PathBuf>,
    pub notices: Vec<Notice>,
}

/// Storage and limits a request runs against.
pub struct Context<'a> {
    pub engine: &'a ProjectionEngine,
    pub registry: &'a RepositoryRegistry,
    pub db: &'a DbConfig,
    pub max_term_months: u32,
}

/// Projects the request, then saves and exports it when asked.
///
/// # Errors
///
/// Only the projection itself can fail the request. Save and export
/// failures are reported in [`SimulationOutcome::notices`].
pub async fn run_simulation(
    ctx: &Context<'_>,
    request: &SimulationRequest,
    now: DateTime<Utc>,
) -> Result<SimulationOutcome, AppError> {
    if request.input.term_months > ctx.max_term_months {
        return Err(AppError::TermTooLong {
            term_months: request.input.term_months,
            max: ctx.max_term_months,
        });
    }

    let simulation = ctx
        .engine
        .simulate(&request.input, request.comparison_rates.as_deref())?;
    let mut notices = Vec::new();

    let saved_id = if request.save {
        match save_result(ctx.registry, ctx.db, &simulation.base, now).await {
            Ok(id) => Some(id),
            Err(e) => {
                warn!(error = %e, "could not save simulation");
                notices.push(Notice::PersistenceUnavailable(e.to_string()));
                None
            }
        }
    } else {
        None
    };

    let exported_to = match &request.export_path {
        Some(path) => match export_sheet(&simulation, path) {
            Ok(()) => Some(path.clone()),
            Err(e) => {
                warn!(error = %e, path = %path.display(), "could not export simulation");
                notices.push(Notice::ExportUnavailable(e.to_string()));
                None
            }
        },
        None => None,
    };

    Ok(SimulationOutcome {
        simulation,
        saved_id,
        exported_to,
        notices,
    })
}

/// Appends `result` to the history through a repository acquired for this
/// call only.
pub async fn save_result(
    registry: &RepositoryRegistry,
    db: &DbConfig,
    result: &ProjectionResult,
    created_at: DateTime<Utc>,
) -> Result<RecordId, RepositoryError> {
    let record = NewHistoryRecord::from_result(result, created_at);
    let id = registry
        .with_repository(db, async move |repo| repo.append(record).await)
        .await?;
    info!(id, "simulation saved");
    Ok(id)
}

/// Every saved simulation, oldest first.
pub async fn list_history(
    registry: &RepositoryRegistry,
    db: &DbConfig,
) -> Result<Vec<HistoryRecord>, RepositoryError> {
    registry
        .with_repository(db, async |repo| repo.list_all().await)
        .await
}

/// Writes the balance sheet to `path`, as `.xlsx` unless the path ends in
/// `.csv`.
#[cfg(feature = "export")]
pub fn export_sheet(
    simulation: &Simulation,
    path: &Path,
) -> Result<(), ExportFailure> {
    selic_export::BalanceSheet::new(&simulation.base)
        .with_scenarios(&simulation.scenarios)
        .write_to_path(path)?;
    Ok(())
}

#[cfg(not(feature = "export"))]
pub fn export_sheet(
    _simulation: &Simulation,
    _path: &Path,
) -> Result<(), ExportFailure> {
    Err(ExportFailure::NotCompiled)
}
