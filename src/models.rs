//! Core data models for the budget agents

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

//
// ================= Expense =================
//

/// An expense as submitted by the caller. Stored verbatim.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Expense {
    pub category: String,
    pub amount: f64,
    /// Calendar date, `YYYY-MM-DD` by convention
    pub date: String,
}

/// An expense row as read back from storage
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StoredExpense {
    pub id: i64,
    pub category: String,
    pub amount: f64,
    pub date: String,
}

impl StoredExpense {
    pub fn matches(&self, expense: &Expense) -> bool {
        self.category == expense.category
            && self.amount == expense.amount
            && self.date == expense.date
    }
}

//
// ================= Cost of Living =================
//

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CostOfLiving {
    pub city: String,
    /// 100 = average
    #[serde(alias = "groceryIndex")]
    pub grocery_index: f64,
}

//
// ================= Agent Results =================
//

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct RecommendationResult {
    pub recommendations: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SavingsTip {
    pub id: String,
    pub text: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SavingsTipsResult {
    pub savings_tips: Vec<SavingsTip>,
}

/// Budget and savings output merged for the caller
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CombinedRecommendation {
    pub recommendations: Vec<String>,
    pub savings_tips: Vec<SavingsTip>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ProcessExpenseResponse {
    pub message: String,
    pub recommendation: CombinedRecommendation,
}

//
// ================= Tracked Goals =================
//

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum GoalStatus {
    Tracking,
    Achieved,
    Cancelled,
}

impl GoalStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            GoalStatus::Tracking => "tracking",
            GoalStatus::Achieved => "achieved",
            GoalStatus::Cancelled => "cancelled",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "tracking" => Some(GoalStatus::Tracking),
            "achieved" => Some(GoalStatus::Achieved),
            "cancelled" | "canceled" => Some(GoalStatus::Cancelled),
            _ => None,
        }
    }
}

impl fmt::Display for GoalStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A savings tip the user has committed to act on
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TrackedGoal {
    pub tip_id: String,
    pub tip_text: String,
    pub status: GoalStatus,
    pub created_at: DateTime<Utc>,
}

impl TrackedGoal {
    pub fn new(tip_id: impl Into<String>, tip_text: impl Into<String>) -> Self {
        Self {
            tip_id: tip_id.into(),
            tip_text: tip_text.into(),
            status: GoalStatus::Tracking,
            created_at: Utc::now(),
        }
    }
}
