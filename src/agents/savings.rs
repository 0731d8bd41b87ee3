//! Savings tips agent
//!
//! `generate_savings_tips`: expense context plus the budget agent's
//! recommendations in, `{"savingsTips": [{"id", "text"}]}` out.

use super::{ask, param_or_default, parse_reply, Agent, DEFAULT_CITY};
use crate::cost_of_living::AVERAGE_GROCERY_INDEX;
use crate::llm::TextGenerator;
use crate::models::SavingsTip;
use crate::rpc::{RpcError, RpcOutcome};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::sync::Arc;

pub const METHOD: &str = "generate_savings_tips";

/// `params.summary` of a savings request
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct SavingsContext {
    pub category: String,
    pub current_expense_amount: f64,
    pub city: String,
    pub grocery_index: f64,
}

impl Default for SavingsContext {
    fn default() -> Self {
        Self {
            category: "unknown".to_string(),
            current_expense_amount: 0.0,
            city: DEFAULT_CITY.to_string(),
            grocery_index: AVERAGE_GROCERY_INDEX,
        }
    }
}

pub struct SavingsAgent {
    generator: Arc<dyn TextGenerator>,
}

impl SavingsAgent {
    pub fn new(generator: Arc<dyn TextGenerator>) -> Self {
        Self { generator }
    }
}

#[async_trait]
impl Agent for SavingsAgent {
    fn method(&self) -> &'static str {
        METHOD
    }

    async fn run(&self, params: &Value) -> RpcOutcome {
        let context: SavingsContext = param_or_default(params, "summary")?;
        let recommendations: Vec<String> = param_or_default(params, "recommendations")?;

        let prompt = build_prompt(&context, &recommendations);
        let reply = ask(self.generator.as_ref(), &prompt).await?;
        let tips = validate_reply(&reply)?;

        Ok(json!({ "savingsTips": tips }))
    }
}

fn build_prompt(context: &SavingsContext, recommendations: &[String]) -> String {
    let advice = if recommendations.is_empty() {
        "No budget recommendations are available.".to_string()
    } else {
        recommendations
            .iter()
            .map(|r| format!("- {}", r))
            .collect::<Vec<_>>()
            .join("\n")
    };

    format!(
        r#"You are a savings coach. A user spent ${:.2} on {} in {}, where the grocery cost index is {:.1} (100 = average).

Their budget advisor recommended:
{}

Suggest 2-3 specific, actionable savings tips that build on this advice. Give each tip a short, descriptive id that is unique within your answer, for example "st_meal_prep_sundays".

Respond with ONLY a JSON object of exactly this shape, with no markdown fences and no text before or after it:
{{"savingsTips": [{{"id": "<tip id>", "text": "<tip>"}}]}}"#,
        context.current_expense_amount,
        context.category,
        context.city,
        context.grocery_index,
        advice,
    )
}

/// Accept only `{"savingsTips": [{"id": string, "text": string}, ...]}`
fn validate_reply(reply: &str) -> Result<Vec<SavingsTip>, RpcError> {
    let object = parse_reply(reply)?;

    let list = object
        .get("savingsTips")
        .ok_or_else(|| RpcError::generation("Model reply has no \"savingsTips\" key"))?
        .as_array()
        .ok_or_else(|| RpcError::generation("\"savingsTips\" is not a list"))?;

    list.iter()
        .enumerate()
        .map(|(i, item)| -> Result<SavingsTip, RpcError> {
            let field = |name: &str| {
                item.get(name)
                    .and_then(Value::as_str)
                    .map(str::to_string)
                    .ok_or_else(|| {
                        RpcError::generation(format!(
                            "savingsTips[{}] needs a string \"{}\": {}",
                            i, name, item
                        ))
                    })
            };

            Ok(SavingsTip {
                id: field("id")?,
                text: field("text")?,
            })
        })
        .collect()
}
