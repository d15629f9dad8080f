use std::str::FromStr;

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use selic_core::{HistoryRecord, HistoryRepository, NewHistoryRecord, RecordId, RepositoryError};
use sqlx::Row;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions, SqliteRow};
use tracing::debug;

use crate::decimal::{decimal_to_f64, get_decimal};

const SELECT_COLUMNS: &str = "SELECT id, created_at, principal, monthly_contribution, annual_rate,
        term_months, gross_final_balance, tax_amount, net_final_balance
 FROM history";

pub struct SqliteRepository {
    pool: SqlitePool,
}

impl SqliteRepository {
    /// Opens the database named by `connection_string`.
    ///
    /// Accepts a bare file path (created if missing), a `sqlite:` URL, or
    /// `:memory:`. An in-memory database is private to its connection, so
    /// the pool is limited to one connection in that case.
    pub async fn new(connection_string: &str) -> Result<Self> {
        let options = SqliteConnectOptions::from_str(connection_string)
            .with_context(|| format!("Invalid SQLite connection string: {}", connection_string))?
            .create_if_missing(true);

        let max_connections = if connection_string.contains(":memory:") {
            1
        } else {
            4
        };

        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .connect_with(options)
            .await
            .with_context(|| format!("Failed to connect to database: {}", connection_string))?;

        debug!(connection_string, "opened history database");
        Ok(Self { pool })
    }

    pub async fn run_migrations(&self) -> Result<()> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .context("Failed to run database migrations")?;
        Ok(())
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

fn row_to_history_record(row: &SqliteRow) -> Result<HistoryRecord, RepositoryError> {
    let term_months: i64 = row
        .try_get("term_months")
        .map_err(|e| RepositoryError::Database(e.to_string()))?;

    Ok(HistoryRecord {
        id: row
            .try_get("id")
            .map_err(|e| RepositoryError::Database(e.to_string()))?,
        created_at: row
            .try_get::<DateTime<Utc>, _>("created_at")
            .map_err(|e| RepositoryError::Database(format!("Failed to get created_at: {}", e)))?,
        principal: get_decimal(row, "principal")?,
        monthly_contribution: get_decimal(row, "monthly_contribution")?,
        annual_rate: get_decimal(row, "annual_rate")?,
        term_months: u32::try_from(term_months).map_err(|_| {
            RepositoryError::Database(format!("Invalid term_months: {}", term_months))
        })?,
        gross_final_balance: get_decimal(row, "gross_final_balance")?,
        tax_amount: get_decimal(row, "tax_amount")?,
        net_final_balance: get_decimal(row, "net_final_balance")?,
    })
}

#[async_trait]
impl HistoryRepository for SqliteRepository {
    async fn append(
        &self,
        record: NewHistoryRecord,
    ) -> Result<RecordId, RepositoryError> {
        let result = sqlx::query(
            "INSERT INTO history (
                created_at, principal, monthly_contribution, annual_rate, term_months,
                gross_final_balance, tax_amount, net_final_balance
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(record.created_at)
        .bind(decimal_to_f64(record.principal))
        .bind(decimal_to_f64(record.monthly_contribution))
        .bind(decimal_to_f64(record.annual_rate))
        .bind(i64::from(record.term_months))
        .bind(decimal_to_f64(record.gross_final_balance))
        .bind(decimal_to_f64(record.tax_amount))
        .bind(decimal_to_f64(record.net_final_balance))
        .execute(&self.pool)
        .await
        .map_err(|e| RepositoryError::Database(e.to_string()))?;

        let id = result.last_insert_rowid();
        debug!(id, "appended history record");
        Ok(id)
    }

    async fn get(
        &self,
        id: RecordId,
    ) -> Result<HistoryRecord, RepositoryError> {
        let row = sqlx::query(&format!("{SELECT_COLUMNS} WHERE id = ?"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| RepositoryError::Database(e.to_string()))?
            .ok_or(RepositoryError::NotFound)?;

        row_to_history_record(&row)
    }

    async fn list_all(&self) -> Result<Vec<HistoryRecord>, RepositoryError> {
        let rows = sqlx::query(&format!("{SELECT_COLUMNS} ORDER BY id"))
            .fetch_all(&self.pool)
            .await
            .map_err(|e| RepositoryError::Database(e.to_string()))?;

        rows.iter().map(row_to_history_record).collect()
    }

    async fn close(&self) {
        self.pool.close().await;
    }
}
