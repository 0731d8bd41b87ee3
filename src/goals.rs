//! Tracked savings goals
//!
//! A goal is created when the user commits to a savings tip. Storage
//! failures and duplicate tip ids both surface as `false`.

use crate::models::{GoalStatus, TrackedGoal};
use crate::state::ExpenseStore;
use crate::Result;
use tracing::{info, warn};

/// Start tracking a tip. `false` when already tracked or storage failed.
pub async fn track_goal(store: &dyn ExpenseStore, tip_id: &str, tip_text: &str) -> bool {
    match store.insert_tracked_goal(tip_id, tip_text).await {
        Ok(true) => {
            info!(tip_id, "Tracking savings goal");
            true
        }
        Ok(false) => {
            warn!(tip_id, "Savings goal already tracked");
            false
        }
        Err(e) => {
            warn!(tip_id, error = %e, "Failed to store savings goal");
            false
        }
    }
}

pub async fn list_goals(store: &dyn ExpenseStore) -> Result<Vec<TrackedGoal>> {
    store.list_tracked_goals().await
}

/// `Ok(false)` when no goal has this tip id
pub async fn set_goal_status(
    store: &dyn ExpenseStore,
    tip_id: &str,
    status: GoalStatus,
) -> Result<bool> {
    let updated = store.update_goal_status(tip_id, status).await?;

    if updated {
        info!(tip_id, status = %status, "Savings goal status updated");
    }

    Ok(updated)
}
