//! SQLite-backed expense store
//!
//! Schema is created lazily on first use. `tip_id` carries a UNIQUE
//! constraint, so duplicate goals are rejected by the database itself.

use super::ExpenseStore;
use crate::error::BudgetError;
use crate::models::{Expense, GoalStatus, StoredExpense, TrackedGoal};
use crate::Result;
use chrono::{DateTime, Utc};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions, SqliteRow};
use sqlx::{Row, SqlitePool};
use std::str::FromStr;
use std::sync::Arc;
use tokio::sync::OnceCell;
use tracing::{info, warn};

pub struct SqliteExpenseStore {
    pool: SqlitePool,
    schema_ready: Arc<OnceCell<()>>,
}

impl SqliteExpenseStore {
    /// Open (creating if missing) the database at `url`, e.g.
    /// `sqlite://budget_buddy.db`. Connections are made on first use.
    pub fn connect_lazy(url: &str) -> Result<Self> {
        let options = SqliteConnectOptions::from_str(url)
            .map_err(|e| BudgetError::ConfigError(format!("Invalid SQLite URL {}: {}", url, e)))?
            .create_if_missing(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_lazy_with(options);

        info!("Expense store backend: sqlite ({})", url);

        Ok(Self::from_pool(pool))
    }

    /// Private in-process database, gone when the store is dropped
    pub fn in_memory() -> Result<Self> {
        let options = SqliteConnectOptions::from_str("sqlite::memory:")
            .map_err(|e| BudgetError::ConfigError(e.to_string()))?;

        // Every connection to :memory: is a separate database, so pin one
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_lazy_with(options);

        Ok(Self::from_pool(pool))
    }

    pub fn from_pool(pool: SqlitePool) -> Self {
        Self {
            pool,
            schema_ready: Arc::new(OnceCell::new()),
        }
    }

    async fn ensure_schema(&self) -> Result<()> {
        self.schema_ready
            .get_or_try_init(|| async {
                sqlx::query(
                    r#"
                    CREATE TABLE IF NOT EXISTS expenses (
                      id INTEGER PRIMARY KEY AUTOINCREMENT,
                      category TEXT NOT NULL,
                      amount REAL NOT NULL,
                      date TEXT NOT NULL
                    );
                    "#,
                )
                .execute(&self.pool)
                .await?;

                sqlx::query(
                    r#"
                    CREATE TABLE IF NOT EXISTS tracked_savings_goals (
                      id INTEGER PRIMARY KEY AUTOINCREMENT,
                      tip_id TEXT UNIQUE NOT NULL,
                      tip_text TEXT NOT NULL,
                      status TEXT NOT NULL DEFAULT 'tracking',
                      created_at TEXT NOT NULL
                    );
                    "#,
                )
                .execute(&self.pool)
                .await?;

                Ok::<(), sqlx::Error>(())
            })
            .await
            .map_err(|e| {
                BudgetError::StorageError(format!("Failed to initialize expense schema: {}", e))
            })?;

        Ok(())
    }
}

fn goal_from_row(row: &SqliteRow) -> Result<TrackedGoal> {
    let status: String = row.try_get("status")?;
    let created_at: DateTime<Utc> = row.try_get("created_at")?;

    Ok(TrackedGoal {
        tip_id: row.try_get("tip_id")?,
        tip_text: row.try_get("tip_text")?,
        status: GoalStatus::parse(&status).ok_or_else(|| {
            BudgetError::StorageError(format!("Unknown goal status in database: {}", status))
        })?,
        created_at,
    })
}

#[async_trait::async_trait]
impl ExpenseStore for SqliteExpenseStore {
    async fn insert_expense(&self, expense: &Expense) -> Result<i64> {
        self.ensure_schema().await?;

        let result = sqlx::query("INSERT INTO expenses (category, amount, date) VALUES (?, ?, ?)")
            .bind(&expense.category)
            .bind(expense.amount)
            .bind(&expense.date)
            .execute(&self.pool)
            .await
            .map_err(|e| BudgetError::StorageError(format!("Failed to insert expense: {}", e)))?;

        Ok(result.last_insert_rowid())
    }

    async fn list_expenses(&self) -> Result<Vec<StoredExpense>> {
        self.ensure_schema().await?;

        let rows = sqlx::query(
            "SELECT id, category, amount, date FROM expenses ORDER BY date DESC, id ASC",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| BudgetError::StorageError(format!("Failed to load expenses: {}", e)))?;

        rows.iter()
            .map(|row| -> Result<StoredExpense> {
                Ok(StoredExpense {
                    id: row.try_get("id")?,
                    category: row.try_get("category")?,
                    amount: row.try_get("amount")?,
                    date: row.try_get("date")?,
                })
            })
            .collect()
    }

    async fn insert_tracked_goal(&self, tip_id: &str, tip_text: &str) -> Result<bool> {
        self.ensure_schema().await?;

        let goal = TrackedGoal::new(tip_id, tip_text);

        let inserted = sqlx::query(
            "INSERT INTO tracked_savings_goals (tip_id, tip_text, status, created_at) VALUES (?, ?, ?, ?)",
        )
        .bind(&goal.tip_id)
        .bind(&goal.tip_text)
        .bind(goal.status.as_str())
        .bind(goal.created_at)
        .execute(&self.pool)
        .await;

        match inserted {
            Ok(_) => Ok(true),
            Err(sqlx::Error::Database(db_error)) if db_error.is_unique_violation() => {
                warn!(tip_id, "Goal already tracked");
                Ok(false)
            }
            Err(e) => Err(BudgetError::StorageError(format!(
                "Failed to insert tracked goal {}: {}",
                tip_id, e
            ))),
        }
    }

    async fn list_tracked_goals(&self) -> Result<Vec<TrackedGoal>> {
        self.ensure_schema().await?;

        let rows = sqlx::query(
            "SELECT tip_id, tip_text, status, created_at FROM tracked_savings_goals ORDER BY created_at DESC, id DESC",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| BudgetError::StorageError(format!("Failed to load tracked goals: {}", e)))?;

        rows.iter().map(goal_from_row).collect()
    }

    async fn update_goal_status(&self, tip_id: &str, status: GoalStatus) -> Result<bool> {
        self.ensure_schema().await?;

        let result = sqlx::query("UPDATE tracked_savings_goals SET status = ? WHERE tip_id = ?")
            .bind(status.as_str())
            .bind(tip_id)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                BudgetError::StorageError(format!("Failed to update goal {}: {}", tip_id, e))
            })?;

        Ok(result.rows_affected() > 0)
    }
}
