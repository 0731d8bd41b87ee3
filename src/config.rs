//! Environment configuration
//!
//! Read once at startup, after `dotenv` has loaded any `.env` file.

use crate::error::BudgetError;
use crate::llm::gemini::DEFAULT_GEMINI_MODEL;
use crate::rpc::client::DEFAULT_RPC_TIMEOUT;
use crate::Result;
use std::collections::HashMap;
use std::time::Duration;

pub const DEFAULT_PORT: u16 = 8000;

/// How the orchestrator reaches the agents
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AgentTransport {
    /// POST to the agent routes over HTTP (this process by default)
    Http,
    /// Call the agent structs directly
    Local,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub port: u16,
    pub gemini_api_key: String,
    pub gemini_model: String,
    /// `sqlite:` URL; `None` keeps everything in memory
    pub database_url: Option<String>,
    pub agent_transport: AgentTransport,
    pub agent_base_url: String,
    pub rpc_timeout: Duration,
    pub cost_of_living_url: Option<String>,
}

impl AppConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_vars(std::env::vars().collect())
    }

    pub fn from_vars(vars: HashMap<String, String>) -> Result<Self> {
        let get = |key: &str| {
            vars.get(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let port = match get("PORT").or_else(|| get("API_PORT")) {
            Some(raw) => raw
                .parse()
                .map_err(|e| BudgetError::ConfigError(format!("Invalid PORT {:?}: {}", raw, e)))?,
            None => DEFAULT_PORT,
        };

        let agent_transport = match get("AGENT_TRANSPORT").map(|t| t.to_lowercase()).as_deref() {
            None | Some("http") => AgentTransport::Http,
            Some("local") => AgentTransport::Local,
            Some(other) => {
                return Err(BudgetError::ConfigError(format!(
                    "AGENT_TRANSPORT must be \"http\" or \"local\", got {:?}",
                    other
                )))
            }
        };

        let rpc_timeout = match get("RPC_TIMEOUT_SECS") {
            Some(raw) => Duration::from_secs(raw.parse().map_err(|e| {
                BudgetError::ConfigError(format!("Invalid RPC_TIMEOUT_SECS {:?}: {}", raw, e))
            })?),
            None => DEFAULT_RPC_TIMEOUT,
        };

        Ok(Self {
            port,
            gemini_api_key: get("GEMINI_API_KEY").unwrap_or_default(),
            gemini_model: get("GEMINI_MODEL").unwrap_or_else(|| DEFAULT_GEMINI_MODEL.to_string()),
            database_url: get("DATABASE_URL"),
            agent_transport,
            agent_base_url: get("AGENT_BASE_URL")
                .unwrap_or_else(|| format!("http://127.0.0.1:{}", port)),
            rpc_timeout,
            cost_of_living_url: get("COST_OF_LIVING_API_URL"),
        })
    }
}
