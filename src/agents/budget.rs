//! Budget recommendation agent
//!
//! `generate_recommendation`: expense context + local grocery index in,
//! `{"recommendations": [string]}` out.

use super::{ask, param_or_default, parse_reply, Agent, DEFAULT_CITY};
use crate::cost_of_living::{grocery_index_or_average, CostOfLivingProvider};
use crate::llm::TextGenerator;
use crate::rpc::{RpcError, RpcOutcome};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::debug;

pub const METHOD: &str = "generate_recommendation";

/// `params.summary` of a recommendation request
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct ExpenseSummary {
    pub category: String,
    pub current_expense_amount: f64,
    pub running_total: f64,
    pub city: String,
}

impl Default for ExpenseSummary {
    fn default() -> Self {
        Self {
            category: "unknown".to_string(),
            current_expense_amount: 0.0,
            running_total: 0.0,
            city: DEFAULT_CITY.to_string(),
        }
    }
}

pub struct BudgetAgent {
    generator: Arc<dyn TextGenerator>,
    cost_of_living: Arc<dyn CostOfLivingProvider>,
}

impl BudgetAgent {
    pub fn new(
        generator: Arc<dyn TextGenerator>,
        cost_of_living: Arc<dyn CostOfLivingProvider>,
    ) -> Self {
        Self {
            generator,
            cost_of_living,
        }
    }
}

#[async_trait]
impl Agent for BudgetAgent {
    fn method(&self) -> &'static str {
        METHOD
    }

    async fn run(&self, params: &Value) -> RpcOutcome {
        let summary: ExpenseSummary = param_or_default(params, "summary")?;

        let grocery_index =
            grocery_index_or_average(self.cost_of_living.as_ref(), &summary.city).await;

        debug!(
            category = %summary.category,
            running_total = summary.running_total,
            city = %summary.city,
            grocery_index,
            "Building budget prompt"
        );

        let prompt = build_prompt(&summary, grocery_index);
        let reply = ask(self.generator.as_ref(), &prompt).await?;
        let recommendations = validate_reply(&reply)?;

        Ok(json!({ "recommendations": recommendations }))
    }
}

fn build_prompt(summary: &ExpenseSummary, grocery_index: f64) -> String {
    format!(
        r#"You are a budget advisor. A user just spent ${:.2} on {}, bringing the running total of all their recorded expenses to ${:.2}. They live in {}, where the grocery cost index is {:.1} (100 = average).

Provide 1-2 concise budget recommendations to optimize their spending, considering the local cost of living.

Respond with ONLY a JSON object of exactly this shape, with no markdown fences and no text before or after it:
{{"recommendations": ["<recommendation>", "<recommendation>"]}}"#,
        summary.current_expense_amount,
        summary.category,
        summary.running_total,
        summary.city,
        grocery_index,
    )
}

/// Accept only `{"recommendations": [string, ...]}`
fn validate_reply(reply: &str) -> Result<Vec<String>, RpcError> {
    let object = parse_reply(reply)?;

    let list = object
        .get("recommendations")
        .ok_or_else(|| RpcError::generation("Model reply has no \"recommendations\" key"))?
        .as_array()
        .ok_or_else(|| RpcError::generation("\"recommendations\" is not a list"))?;

    list.iter()
        .enumerate()
        .map(|(i, item)| {
            item.as_str().map(str::to_string).ok_or_else(|| {
                RpcError::generation(format!("recommendations[{}] is not a string: {}", i, item))
            })
        })
        .collect()
}
