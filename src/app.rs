//! Component wiring shared by both binaries

use crate::agents::{AgentChannel, BudgetAgent, HttpAgentChannel, LocalAgentChannel, SavingsAgent};
use crate::api::ApiState;
use crate::config::{AgentTransport, AppConfig};
use crate::cost_of_living::{CostOfLivingProvider, HttpCostOfLiving, StaticCostOfLiving};
use crate::llm::{GeminiClient, TextGenerator};
use crate::orchestrator::ExpenseOrchestrator;
use crate::rpc::RpcClient;
use crate::state::{ExpenseStore, InMemoryExpenseStore, SqliteExpenseStore};
use crate::Result;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

/// Log to stdout, filtered by `RUST_LOG` (default `info`)
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    // A second init (tests, embedding) is harmless
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}

/// Build the full state from configuration
pub fn build_state(config: &AppConfig) -> Result<ApiState> {
    let store: Arc<dyn ExpenseStore> = match &config.database_url {
        Some(url) if url.contains(":memory:") => Arc::new(SqliteExpenseStore::in_memory()?),
        Some(url) => Arc::new(SqliteExpenseStore::connect_lazy(url)?),
        None => {
            warn!("DATABASE_URL not set, expenses are kept in memory");
            Arc::new(InMemoryExpenseStore::new())
        }
    };

    if config.gemini_api_key.is_empty() {
        warn!("GEMINI_API_KEY not set, agent calls will fail");
    }
    let generator: Arc<dyn TextGenerator> = Arc::new(GeminiClient::new(
        config.gemini_api_key.clone(),
        &config.gemini_model,
    )?);

    let cost_of_living: Arc<dyn CostOfLivingProvider> = match &config.cost_of_living_url {
        Some(url) => Arc::new(HttpCostOfLiving::new(url)?),
        None => Arc::new(StaticCostOfLiving::new()),
    };

    assemble(
        store,
        generator,
        cost_of_living,
        config.agent_transport,
        &config.agent_base_url,
        config.rpc_timeout,
    )
}

/// Wire agents, channel and orchestrator around the given backends
pub fn assemble(
    store: Arc<dyn ExpenseStore>,
    generator: Arc<dyn TextGenerator>,
    cost_of_living: Arc<dyn CostOfLivingProvider>,
    transport: AgentTransport,
    agent_base_url: &str,
    rpc_timeout: Duration,
) -> Result<ApiState> {
    let budget_agent = Arc::new(BudgetAgent::new(generator.clone(), cost_of_living.clone()));
    let savings_agent = Arc::new(SavingsAgent::new(generator));

    let channel: Arc<dyn AgentChannel> = match transport {
        AgentTransport::Http => {
            info!(base_url = agent_base_url, "Agents reached over HTTP");
            Arc::new(HttpAgentChannel::new(RpcClient::new(rpc_timeout)?, agent_base_url))
        }
        AgentTransport::Local => {
            info!("Agents called in-process");
            Arc::new(LocalAgentChannel::new(budget_agent.clone(), savings_agent.clone()))
        }
    };

    let orchestrator = Arc::new(ExpenseOrchestrator::new(
        store.clone(),
        channel,
        cost_of_living.clone(),
    ));

    Ok(ApiState {
        orchestrator,
        budget_agent,
        savings_agent,
        store,
        cost_of_living,
    })
}
