//! State persistence layer
//!
//! Expenses and tracked goals. Inserts are append-only; reads return the
//! whole table. In-memory for development and tests, SQLite otherwise.

use crate::models::{Expense, GoalStatus, StoredExpense, TrackedGoal};
use crate::Result;
use std::sync::Arc;
use tokio::sync::RwLock;

pub mod sqlite;
pub use sqlite::SqliteExpenseStore;

/// Trait for expense and goal persistence
#[async_trait::async_trait]
pub trait ExpenseStore: Send + Sync {
    /// Append an expense, returning its row id
    async fn insert_expense(&self, expense: &Expense) -> Result<i64>;

    /// All expenses, newest date first
    async fn list_expenses(&self) -> Result<Vec<StoredExpense>>;

    /// Insert a goal in `tracking` status. `Ok(false)` when the tip id is
    /// already tracked; the existing row is left untouched.
    async fn insert_tracked_goal(&self, tip_id: &str, tip_text: &str) -> Result<bool>;

    /// All tracked goals, newest first
    async fn list_tracked_goals(&self) -> Result<Vec<TrackedGoal>>;

    /// `Ok(false)` when no goal has this tip id
    async fn update_goal_status(&self, tip_id: &str, status: GoalStatus) -> Result<bool>;
}

/// In-memory store for development
pub struct InMemoryExpenseStore {
    expenses: Arc<RwLock<Vec<StoredExpense>>>,
    goals: Arc<RwLock<Vec<TrackedGoal>>>,
}

impl InMemoryExpenseStore {
    pub fn new() -> Self {
        Self {
            expenses: Arc::new(RwLock::new(Vec::new())),
            goals: Arc::new(RwLock::new(Vec::new())),
        }
    }
}

impl Default for InMemoryExpenseStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl ExpenseStore for InMemoryExpenseStore {
    async fn insert_expense(&self, expense: &Expense) -> Result<i64> {
        let mut expenses = self.expenses.write().await;
        let id = expenses.len() as i64 + 1;

        expenses.push(StoredExpense {
            id,
            category: expense.category.clone(),
            amount: expense.amount,
            date: expense.date.clone(),
        });

        Ok(id)
    }

    async fn list_expenses(&self) -> Result<Vec<StoredExpense>> {
        let expenses = self.expenses.read().await;

        let mut listed = expenses.clone();
        // Stable sort keeps insertion order within a date
        listed.sort_by(|a, b| b.date.cmp(&a.date));

        Ok(listed)
    }

    async fn insert_tracked_goal(&self, tip_id: &str, tip_text: &str) -> Result<bool> {
        let mut goals = self.goals.write().await;

        if goals.iter().any(|goal| goal.tip_id == tip_id) {
            return Ok(false);
        }

        goals.push(TrackedGoal::new(tip_id, tip_text));
        Ok(true)
    }

    async fn list_tracked_goals(&self) -> Result<Vec<TrackedGoal>> {
        let goals = self.goals.read().await;
        Ok(goals.iter().rev().cloned().collect())
    }

    async fn update_goal_status(&self, tip_id: &str, status: GoalStatus) -> Result<bool> {
        let mut goals = self.goals.write().await;

        match goals.iter_mut().find(|goal| goal.tip_id == tip_id) {
            Some(goal) => {
                goal.status = status;
                Ok(true)
            }
            None => Ok(false),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn expense(category: &str, amount: f64, date: &str) -> Expense {
        Expense {
            category: category.to_string(),
            amount,
            date: date.to_string(),
        }
    }

    #[tokio::test]
    async fn test_expenses_listed_newest_first() {
        let store = InMemoryExpenseStore::new();
        store.insert_expense(&expense("rent", 1200.0, "2025-01-01")).await.unwrap();
        store.insert_expense(&expense("coffee", 4.5, "2025-01-03")).await.unwrap();
        store.insert_expense(&expense("groceries", 62.1, "2025-01-02")).await.unwrap();

        let listed = store.list_expenses().await.unwrap();
        let dates: Vec<&str> = listed.iter().map(|e| e.date.as_str()).collect();

        assert_eq!(dates, vec!["2025-01-03", "2025-01-02", "2025-01-01"]);
        assert_eq!(listed[0].amount, 4.5);
    }

    #[tokio::test]
    async fn test_duplicate_goal_rejected_not_overwritten() {
        let store = InMemoryExpenseStore::new();

        assert!(store.insert_tracked_goal("st_1", "save on coffee").await.unwrap());
        assert!(!store.insert_tracked_goal("st_1", "different text").await.unwrap());

        let goals = store.list_tracked_goals().await.unwrap();
        assert_eq!(goals.len(), 1);
        assert_eq!(goals[0].tip_text, "save on coffee");
    }

    #[tokio::test]
    async fn test_update_goal_status() {
        let store = InMemoryExpenseStore::new();
        store.insert_tracked_goal("st_1", "save on coffee").await.unwrap();

        assert!(store.update_goal_status("st_1", GoalStatus::Achieved).await.unwrap());
        assert!(!store.update_goal_status("st_404", GoalStatus::Achieved).await.unwrap());

        let goals = store.list_tracked_goals().await.unwrap();
        assert_eq!(goals[0].status, GoalStatus::Achieved);
    }
}
