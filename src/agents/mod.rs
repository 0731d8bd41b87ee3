//! Budget and savings agents
//!
//! An agent accepts exactly one RPC method, builds a prompt from the request
//! params, asks the text generator, and validates the JSON it gets back.
//! Whatever happens, the caller receives a well-formed response envelope.

use crate::error::BudgetError;
use crate::llm::TextGenerator;
use crate::rpc::{RpcError, RpcOutcome, RpcRequest, RpcResponse};
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use tracing::{info, warn};

pub mod budget;
pub mod channel;
pub mod savings;

pub use budget::BudgetAgent;
pub use channel::{AgentChannel, AgentKind, HttpAgentChannel, LocalAgentChannel};
pub use savings::SavingsAgent;

/// City assumed when a request carries none
pub const DEFAULT_CITY: &str = "Seattle";

#[async_trait]
pub trait Agent: Send + Sync {
    /// The single RPC method this agent answers
    fn method(&self) -> &'static str;

    /// Produce the result payload for already-routed params
    async fn run(&self, params: &Value) -> RpcOutcome;

    async fn generate(&self, request: &RpcRequest) -> RpcResponse {
        if request.method != self.method() {
            warn!(
                expected = self.method(),
                received = %request.method,
                request_id = request.id,
                "Rejecting request for unknown method"
            );
            return RpcResponse::failure(request.id, RpcError::method_not_found(&request.method));
        }

        info!(method = self.method(), request_id = request.id, "Agent request received");

        let outcome = self.run(&request.params).await;
        if let Err(error) = &outcome {
            warn!(
                method = self.method(),
                request_id = request.id,
                code = error.code,
                message = %error.message,
                "Agent answered with error"
            );
        }

        RpcResponse::from_outcome(request.id, outcome)
    }
}

/// Decode `params[key]` into `T`, using `T::default()` when absent or null
pub(crate) fn param_or_default<T>(params: &Value, key: &str) -> Result<T, RpcError>
where
    T: DeserializeOwned + Default,
{
    match params.get(key) {
        None | Some(Value::Null) => Ok(T::default()),
        Some(value) => serde_json::from_value(value.clone())
            .map_err(|e| RpcError::generation(format!("Invalid params.{}: {}", key, e))),
    }
}

/// Send the prompt, mapping every generator failure to a generation error
pub(crate) async fn ask(generator: &dyn TextGenerator, prompt: &str) -> Result<String, RpcError> {
    generator.complete(prompt).await.map_err(|e| match e {
        BudgetError::NoContent(reason) => {
            RpcError::generation(format!("Text generation returned no usable content: {}", reason))
        }
        other => RpcError::generation(format!("Text generation failed: {}", other)),
    })
}

/// Trim the reply and drop a surrounding markdown code fence
pub(crate) fn strip_reply(raw: &str) -> &str {
    let trimmed = raw.trim();

    match trimmed.strip_prefix("```") {
        Some(rest) if trimmed.len() >= 6 && trimmed.ends_with("```") => {
            let inner = &rest[..rest.len() - 3];
            inner.strip_prefix("json").unwrap_or(inner).trim()
        }
        _ => trimmed,
    }
}

/// Parse the model reply as a JSON object
pub(crate) fn parse_reply(raw: &str) -> Result<Map<String, Value>, RpcError> {
    let value: Value = serde_json::from_str(strip_reply(raw)).map_err(|e| {
        RpcError::generation(format!(
            "Model reply is not valid JSON: {} | raw={}",
            e, raw
        ))
    })?;

    match value {
        Value::Object(object) => Ok(object),
        other => Err(RpcError::generation(format!(
            "Model reply is not a JSON object: {}",
            other
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_reply_fences() {
        assert_eq!(strip_reply("  {\"a\": 1}\n"), "{\"a\": 1}");
        assert_eq!(strip_reply("```json\n{\"a\": 1}\n```"), "{\"a\": 1}");
        assert_eq!(strip_reply("```\n{\"a\": 1}\n```"), "{\"a\": 1}");
        assert_eq!(strip_reply("```"), "```");
    }

    #[test]
    fn test_parse_reply_rejects_non_objects() {
        let error = parse_reply("[\"a\", \"b\"]").unwrap_err();
        assert_eq!(error.code, crate::rpc::codes::GENERATION_FAILED);

        let error = parse_reply("not json").unwrap_err();
        assert!(error.message.contains("raw=not json"));
    }

    #[test]
    fn test_param_or_default() {
        let params = serde_json::json!({"tags": ["a"], "empty": null});

        let tags: Vec<String> = param_or_default(&params, "tags").unwrap();
        let empty: Vec<String> = param_or_default(&params, "empty").unwrap();
        let missing: Vec<String> = param_or_default(&params, "missing").unwrap();

        assert_eq!(tags, vec!["a"]);
        assert!(empty.is_empty());
        assert!(missing.is_empty());

        let bad = serde_json::json!({"tags": "a"});
        assert!(param_or_default::<Vec<String>>(&bad, "tags").is_err());
    }
}
