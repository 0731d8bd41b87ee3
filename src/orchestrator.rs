//! Expense orchestrator
//!
//! STORE → TOTAL → BUDGET AGENT → COST OF LIVING → SAVINGS AGENT → MERGE
//!
//! Strictly sequential. Only the initial store write is fatal; a failed
//! agent call contributes an empty list instead.

use crate::agents::budget::ExpenseSummary;
use crate::agents::savings::SavingsContext;
use crate::agents::{AgentChannel, AgentKind};
use crate::cost_of_living::{grocery_index_or_average, CostOfLivingProvider};
use crate::models::{
    CombinedRecommendation, Expense, ProcessExpenseResponse, RecommendationResult,
    SavingsTipsResult,
};
use crate::rpc::RpcResponse;
use crate::state::ExpenseStore;
use crate::Result;
use serde::de::DeserializeOwned;
use serde_json::json;
use std::sync::Arc;
use tracing::{error, info, info_span, warn, Instrument};
use uuid::Uuid;

/// City used for every run. Callers cannot choose it yet.
pub const PLACEHOLDER_CITY: &str = "Seattle";

pub const PROCESSED_MESSAGE: &str = "Expense processed";

const BUDGET_REQUEST_ID: i64 = 1;
const SAVINGS_REQUEST_ID: i64 = 2;

pub struct ExpenseOrchestrator {
    store: Arc<dyn ExpenseStore>,
    agents: Arc<dyn AgentChannel>,
    cost_of_living: Arc<dyn CostOfLivingProvider>,
}

impl ExpenseOrchestrator {
    pub fn new(
        store: Arc<dyn ExpenseStore>,
        agents: Arc<dyn AgentChannel>,
        cost_of_living: Arc<dyn CostOfLivingProvider>,
    ) -> Self {
        Self {
            store,
            agents,
            cost_of_living,
        }
    }

    /// Record the expense and gather budget and savings advice for it
    pub async fn process(&self, expense: Expense) -> Result<ProcessExpenseResponse> {
        let span = info_span!(
            "process_expense",
            run_id = %Uuid::new_v4(),
            category = %expense.category
        );

        self.run(expense).instrument(span).await
    }

    async fn run(&self, expense: Expense) -> Result<ProcessExpenseResponse> {
        // === STORE ===
        self.store.insert_expense(&expense).await.map_err(|e| {
            error!(error = %e, "Failed to store expense");
            e
        })?;

        // === TOTAL ===
        let running_total: f64 = self
            .store
            .list_expenses()
            .await?
            .iter()
            .map(|stored| stored.amount)
            .sum();

        info!(amount = expense.amount, running_total, "Expense stored");

        // === BUDGET AGENT ===
        let summary = ExpenseSummary {
            category: expense.category.clone(),
            current_expense_amount: expense.amount,
            running_total,
            city: PLACEHOLDER_CITY.to_string(),
        };

        let response = self
            .agents
            .call(
                AgentKind::Budget,
                json!({ "summary": summary }),
                BUDGET_REQUEST_ID,
            )
            .await;
        let budget: RecommendationResult = absorb(AgentKind::Budget, response);

        // === COST OF LIVING ===
        let grocery_index =
            grocery_index_or_average(self.cost_of_living.as_ref(), PLACEHOLDER_CITY).await;

        // === SAVINGS AGENT ===
        let context = SavingsContext {
            category: expense.category,
            current_expense_amount: expense.amount,
            city: PLACEHOLDER_CITY.to_string(),
            grocery_index,
        };

        let response = self
            .agents
            .call(
                AgentKind::Savings,
                json!({
                    "summary": context,
                    "recommendations": budget.recommendations,
                }),
                SAVINGS_REQUEST_ID,
            )
            .await;
        let savings: SavingsTipsResult = absorb(AgentKind::Savings, response);

        // === MERGE ===
        info!(
            recommendations = budget.recommendations.len(),
            savings_tips = savings.savings_tips.len(),
            "Expense processed"
        );

        Ok(ProcessExpenseResponse {
            message: PROCESSED_MESSAGE.to_string(),
            recommendation: CombinedRecommendation {
                recommendations: budget.recommendations,
                savings_tips: savings.savings_tips,
            },
        })
    }
}

/// Take an agent's result, or an empty default if the call failed
fn absorb<T>(agent: AgentKind, response: RpcResponse) -> T
where
    T: DeserializeOwned + Default,
{
    match response.into_outcome() {
        Ok(result) => serde_json::from_value(result).unwrap_or_else(|e| {
            warn!(
                agent = ?agent,
                error = %e,
                "Agent result has unexpected shape, continuing without it"
            );
            T::default()
        }),
        Err(rpc_error) => {
            warn!(
                agent = ?agent,
                code = rpc_error.code,
                message = %rpc_error.message,
                "Agent call failed, continuing without its output"
            );
            T::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agents::{BudgetAgent, LocalAgentChannel, SavingsAgent};
    use crate::cost_of_living::StaticCostOfLiving;
    use crate::error::BudgetError;
    use crate::llm::ScriptedGenerator;
    use crate::models::{GoalStatus, StoredExpense, TrackedGoal};
    use crate::rpc::{codes, RpcError, RpcOutcome};
    use crate::state::InMemoryExpenseStore;
    use async_trait::async_trait;
    use serde_json::Value;
    use std::sync::Mutex;

    /// Answers each agent with a fixed outcome and records what it was sent
    struct ScriptedChannel {
        budget: RpcOutcome,
        savings: RpcOutcome,
        calls: Mutex<Vec<(AgentKind, Value, i64)>>,
    }

    impl ScriptedChannel {
        fn new(budget: RpcOutcome, savings: RpcOutcome) -> Self {
            Self {
                budget,
                savings,
                calls: Mutex::new(Vec::new()),
            }
        }

        fn calls(&self) -> Vec<(AgentKind, Value, i64)> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl AgentChannel for ScriptedChannel {
        async fn call(&self, agent: AgentKind, params: Value, request_id: i64) -> RpcResponse {
            self.calls.lock().unwrap().push((agent, params, request_id));
            let outcome = match agent {
                AgentKind::Budget => self.budget.clone(),
                AgentKind::Savings => self.savings.clone(),
            };
            RpcResponse::from_outcome(request_id, outcome)
        }
    }

    struct BrokenStore;

    #[async_trait]
    impl ExpenseStore for BrokenStore {
        async fn insert_expense(&self, _expense: &Expense) -> Result<i64> {
            Err(BudgetError::StorageError("disk full".to_string()))
        }
        async fn list_expenses(&self) -> Result<Vec<StoredExpense>> {
            Ok(vec![])
        }
        async fn insert_tracked_goal(&self, _tip_id: &str, _tip_text: &str) -> Result<bool> {
            Ok(false)
        }
        async fn list_tracked_goals(&self) -> Result<Vec<TrackedGoal>> {
            Ok(vec![])
        }
        async fn update_goal_status(&self, _tip_id: &str, _status: GoalStatus) -> Result<bool> {
            Ok(false)
        }
    }

    /// Accepts writes, fails every read of the expense list
    struct UnlistableStore {
        inner: InMemoryExpenseStore,
    }

    #[async_trait]
    impl ExpenseStore for UnlistableStore {
        async fn insert_expense(&self, expense: &Expense) -> Result<i64> {
            self.inner.insert_expense(expense).await
        }
        async fn list_expenses(&self) -> Result<Vec<StoredExpense>> {
            Err(BudgetError::StorageError("read timed out".to_string()))
        }
        async fn insert_tracked_goal(&self, tip_id: &str, tip_text: &str) -> Result<bool> {
            self.inner.insert_tracked_goal(tip_id, tip_text).await
        }
        async fn list_tracked_goals(&self) -> Result<Vec<TrackedGoal>> {
            self.inner.list_tracked_goals().await
        }
        async fn update_goal_status(&self, tip_id: &str, status: GoalStatus) -> Result<bool> {
            self.inner.update_goal_status(tip_id, status).await
        }
    }

    fn expense(category: &str, amount: f64) -> Expense {
        Expense {
            category: category.to_string(),
            amount,
            date: "2025-04-02".to_string(),
        }
    }

    fn ok_budget() -> RpcOutcome {
        Ok(json!({"recommendations": ["Set a weekly grocery cap"]}))
    }

    fn ok_savings() -> RpcOutcome {
        Ok(json!({"savingsTips": [{"id": "st_cap", "text": "Use a $80 weekly cap"}]}))
    }

    fn orchestrator(
        store: Arc<dyn ExpenseStore>,
        channel: Arc<dyn AgentChannel>,
    ) -> ExpenseOrchestrator {
        ExpenseOrchestrator::new(store, channel, Arc::new(StaticCostOfLiving::new()))
    }

    #[tokio::test]
    async fn test_expense_stored_exactly_once() {
        let store = Arc::new(InMemoryExpenseStore::new());
        store.insert_expense(&expense("rent", 1000.0)).await.unwrap();
        let channel = Arc::new(ScriptedChannel::new(ok_budget(), ok_savings()));

        let new_expense = expense("groceries", 54.25);
        orchestrator(store.clone(), channel)
            .process(new_expense.clone())
            .await
            .unwrap();

        let stored = store.list_expenses().await.unwrap();
        assert_eq!(stored.len(), 2);
        assert!(stored.iter().any(|s| s.matches(&new_expense)));
    }

    #[tokio::test]
    async fn test_running_total_includes_new_expense() {
        let store = Arc::new(InMemoryExpenseStore::new());
        store.insert_expense(&expense("rent", 1000.0)).await.unwrap();
        store.insert_expense(&expense("transit", 45.5)).await.unwrap();
        let channel = Arc::new(ScriptedChannel::new(ok_budget(), ok_savings()));

        orchestrator(store, channel.clone())
            .process(expense("groceries", 54.5))
            .await
            .unwrap();

        let calls = channel.calls();
        let (agent, params, request_id) = &calls[0];
        assert_eq!(*agent, AgentKind::Budget);
        assert_eq!(*request_id, BUDGET_REQUEST_ID);
        assert_eq!(params["summary"]["runningTotal"], 1100.0);
        assert_eq!(params["summary"]["currentExpenseAmount"], 54.5);
        assert_eq!(params["summary"]["category"], "groceries");
        assert_eq!(params["summary"]["city"], PLACEHOLDER_CITY);
    }

    #[tokio::test]
    async fn test_savings_receives_budget_output_and_index() {
        let store = Arc::new(InMemoryExpenseStore::new());
        let channel = Arc::new(ScriptedChannel::new(ok_budget(), ok_savings()));
        let orchestrator = ExpenseOrchestrator::new(
            store,
            channel.clone(),
            Arc::new(StaticCostOfLiving::new().with_city(PLACEHOLDER_CITY, 121.0)),
        );

        let response = orchestrator.process(expense("dining", 30.0)).await.unwrap();

        let calls = channel.calls();
        assert_eq!(calls.len(), 2);
        let (agent, params, request_id) = &calls[1];
        assert_eq!(*agent, AgentKind::Savings);
        assert_eq!(*request_id, SAVINGS_REQUEST_ID);
        assert_eq!(params["recommendations"], json!(["Set a weekly grocery cap"]));
        assert_eq!(params["summary"]["groceryIndex"], 121.0);

        assert_eq!(response.message, PROCESSED_MESSAGE);
        assert_eq!(response.recommendation.recommendations.len(), 1);
        assert_eq!(response.recommendation.savings_tips[0].id, "st_cap");
    }

    #[tokio::test]
    async fn test_budget_failure_degrades_to_empty_list() {
        let store = Arc::new(InMemoryExpenseStore::new());
        let channel = Arc::new(ScriptedChannel::new(
            Err(RpcError::transport("connection refused")),
            ok_savings(),
        ));

        let response = orchestrator(store, channel.clone())
            .process(expense("groceries", 10.0))
            .await
            .unwrap();

        assert!(response.recommendation.recommendations.is_empty());
        assert_eq!(response.recommendation.savings_tips.len(), 1);
        assert_eq!(channel.calls()[1].1["recommendations"], json!([]));
    }

    #[tokio::test]
    async fn test_savings_failure_degrades_to_empty_list() {
        let store = Arc::new(InMemoryExpenseStore::new());
        let channel = Arc::new(ScriptedChannel::new(
            ok_budget(),
            Err(RpcError::new(codes::GENERATION_FAILED, "bad reply")),
        ));

        let response = orchestrator(store, channel)
            .process(expense("groceries", 10.0))
            .await
            .unwrap();

        assert_eq!(response.recommendation.recommendations.len(), 1);
        assert!(response.recommendation.savings_tips.is_empty());
    }

    #[tokio::test]
    async fn test_unexpected_result_shape_is_absorbed() {
        let store = Arc::new(InMemoryExpenseStore::new());
        let channel = Arc::new(ScriptedChannel::new(
            Ok(json!({"recommendations": "not a list"})),
            ok_savings(),
        ));

        let response = orchestrator(store, channel)
            .process(expense("groceries", 10.0))
            .await
            .unwrap();

        assert!(response.recommendation.recommendations.is_empty());
    }

    #[tokio::test]
    async fn test_storage_failure_is_fatal() {
        let channel = Arc::new(ScriptedChannel::new(ok_budget(), ok_savings()));

        let result = orchestrator(Arc::new(BrokenStore), channel.clone())
            .process(expense("groceries", 10.0))
            .await;

        assert!(matches!(result, Err(BudgetError::StorageError(_))));
        assert!(channel.calls().is_empty());
    }

    #[tokio::test]
    async fn test_listing_failure_after_store_is_fatal() {
        let store = Arc::new(UnlistableStore {
            inner: InMemoryExpenseStore::new(),
        });
        let channel = Arc::new(ScriptedChannel::new(ok_budget(), ok_savings()));

        let result = orchestrator(store.clone(), channel.clone())
            .process(expense("groceries", 10.0))
            .await;

        assert!(matches!(result, Err(BudgetError::StorageError(_))));
        assert!(channel.calls().is_empty());
        assert_eq!(store.inner.list_expenses().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_local_agents_end_to_end() {
        let generator = Arc::new(
            ScriptedGenerator::new()
                .then_reply(r#"{"recommendations": ["Plan meals weekly"]}"#)
                .then_reply(r#"{"savingsTips": [{"id": "st_plan", "text": "Plan on Sunday"}]}"#),
        );
        let cost_of_living = Arc::new(StaticCostOfLiving::new());
        let channel = Arc::new(LocalAgentChannel::new(
            Arc::new(BudgetAgent::new(generator.clone(), cost_of_living.clone())),
            Arc::new(SavingsAgent::new(generator.clone())),
        ));
        let orchestrator = ExpenseOrchestrator::new(
            Arc::new(InMemoryExpenseStore::new()),
            channel,
            cost_of_living,
        );

        let response = orchestrator.process(expense("groceries", 20.0)).await.unwrap();

        assert_eq!(response.recommendation.recommendations, vec!["Plan meals weekly"]);
        assert_eq!(response.recommendation.savings_tips[0].text, "Plan on Sunday");
        assert!(generator.prompts()[1].contains("- Plan meals weekly"));
    }
}
