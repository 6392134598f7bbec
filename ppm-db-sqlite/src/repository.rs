use std::str::FromStr;

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use ppm_core::{NewPpmRecord, PpmRecord, PpmRepository, PpmSize, RepositoryError};
use rust_decimal::Decimal;
use sqlx::Row;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool};
use tracing::debug;

use crate::decimal::get_optional_decimal;

const PPM_COLUMNS: &str = "id, move_id, size, weight_estimate, planned_move_date,
    pickup_zip, destination_zip, estimated_incentive, created_at, updated_at";

pub struct SqliteRepository {
    pool: SqlitePool,
}

impl SqliteRepository {
    /// Connects to `database_url`, creating the database file if needed.
    ///
    /// Accepts a bare path (`moves.db`), a sqlx URL (`sqlite:moves.db`) or
    /// `:memory:`.
    pub async fn new(database_url: &str) -> Result<Self> {
        let options = SqliteConnectOptions::from_str(database_url)
            .with_context(|| format!("Invalid database url: {}", database_url))?
            .create_if_missing(true);
        let pool = SqlitePool::connect_with(options)
            .await
            .with_context(|| format!("Failed to connect to database: {}", database_url))?;
        Ok(Self { pool })
    }

    pub async fn new_with_pool(pool: SqlitePool) -> Self {
        Self { pool }
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

fn row_to_ppm(row: &sqlx::sqlite::SqliteRow) -> Result<PpmRecord, RepositoryError> {
    let size = row
        .try_get::<Option<String>, _>("size")
        .map_err(|e| RepositoryError::Database(e.to_string()))?
        .map(|code| {
            PpmSize::parse(&code)
                .ok_or_else(|| RepositoryError::Database(format!("Invalid PPM size: {}", code)))
        })
        .transpose()?;

    Ok(PpmRecord {
        id: row
            .try_get("id")
            .map_err(|e| RepositoryError::Database(e.to_string()))?,
        move_id: row
            .try_get("move_id")
            .map_err(|e| RepositoryError::Database(e.to_string()))?,
        size,
        weight_estimate: row
            .try_get("weight_estimate")
            .map_err(|e| RepositoryError::Database(e.to_string()))?,
        planned_move_date: row
            .try_get::<Option<NaiveDate>, _>("planned_move_date")
            .map_err(|e| {
                RepositoryError::Database(format!("Failed to get planned_move_date: {}", e))
            })?,
        pickup_zip: row
            .try_get("pickup_zip")
            .map_err(|e| RepositoryError::Database(e.to_string()))?,
        destination_zip: row
            .try_get("destination_zip")
            .map_err(|e| RepositoryError::Database(e.to_string()))?,
        estimated_incentive: get_optional_decimal(row, "estimated_incentive")?,
        created_at: row
            .try_get::<DateTime<Utc>, _>("created_at")
            .map_err(|e| RepositoryError::Database(format!("Failed to get created_at: {}", e)))?,
        updated_at: row
            .try_get::<DateTime<Utc>, _>("updated_at")
            .map_err(|e| RepositoryError::Database(format!("Failed to get updated_at: {}", e)))?,
    })
}

#[async_trait]
impl PpmRepository for SqliteRepository {
    async fn get_ppm(
        &self,
        id: i64,
    ) -> Result<PpmRecord, RepositoryError> {
        let row = sqlx::query(&format!(
            "SELECT {PPM_COLUMNS} FROM personally_procured_moves WHERE id = ?"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| RepositoryError::Database(e.to_string()))?
        .ok_or(RepositoryError::NotFound)?;

        row_to_ppm(&row)
    }

    async fn get_ppm_for_move(
        &self,
        move_id: &str,
    ) -> Result<PpmRecord, RepositoryError> {
        let row = sqlx::query(&format!(
            "SELECT {PPM_COLUMNS} FROM personally_procured_moves
             WHERE move_id = ?
             ORDER BY created_at DESC, id DESC
             LIMIT 1"
        ))
        .bind(move_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| RepositoryError::Database(e.to_string()))?
        .ok_or(RepositoryError::NotFound)?;

        row_to_ppm(&row)
    }

    async fn list_ppms(&self) -> Result<Vec<PpmRecord>, RepositoryError> {
        let rows = sqlx::query(&format!(
            "SELECT {PPM_COLUMNS} FROM personally_procured_moves ORDER BY id"
        ))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| RepositoryError::Database(e.to_string()))?;

        rows.iter().map(row_to_ppm).collect()
    }

    async fn create_ppm(
        &self,
        ppm: NewPpmRecord,
    ) -> Result<PpmRecord, RepositoryError> {
        let now = Utc::now();

        let result = sqlx::query(
            "INSERT INTO personally_procured_moves (
                move_id, size, weight_estimate, planned_move_date,
                pickup_zip, destination_zip, estimated_incentive,
                created_at, updated_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&ppm.move_id)
        .bind(ppm.size.map(|s| s.as_str()))
        .bind(ppm.weight_estimate)
        .bind(ppm.planned_move_date)
        .bind(&ppm.pickup_zip)
        .bind(&ppm.destination_zip)
        .bind(ppm.estimated_incentive.map(|d| d.to_string()))
        .bind(now)
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(|e| RepositoryError::Database(e.to_string()))?;

        let id = result.last_insert_rowid();
        debug!(id, move_id = %ppm.move_id, "created ppm");
        self.get_ppm(id).await
    }

    async fn save_weight_estimate(
        &self,
        id: i64,
        weight_estimate: i64,
        estimated_incentive: Option<Decimal>,
    ) -> Result<PpmRecord, RepositoryError> {
        let result = sqlx::query(
            "UPDATE personally_procured_moves
             SET weight_estimate = ?, estimated_incentive = ?, updated_at = ?
             WHERE id = ?",
        )
        .bind(weight_estimate)
        .bind(estimated_incentive.map(|d| d.to_string()))
        .bind(Utc::now())
        .bind(id)
        .execute(&self.pool)
        .await
        .map_err(|e| RepositoryError::Database(e.to_string()))?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        debug!(id, weight_estimate, "saved weight estimate");
        self.get_ppm(id).await
    }

    async fn delete_ppm(
        &self,
        id: i64,
    ) -> Result<(), RepositoryError> {
        let result = sqlx::query("DELETE FROM personally_procured_moves WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| RepositoryError::Database(e.to_string()))?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        Ok(())
    }
}
