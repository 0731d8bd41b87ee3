//! How the orchestrator reaches the agents
//!
//! `HttpAgentChannel` posts envelopes to the agent endpoints of a running
//! server (usually this same process). `LocalAgentChannel` hands the same
//! envelopes straight to the agent structs.

use super::{budget, savings, Agent, BudgetAgent, SavingsAgent};
use crate::rpc::{RpcClient, RpcRequest, RpcResponse};
use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AgentKind {
    Budget,
    Savings,
}

impl AgentKind {
    pub fn method(&self) -> &'static str {
        match self {
            AgentKind::Budget => budget::METHOD,
            AgentKind::Savings => savings::METHOD,
        }
    }

    /// Route the agent is served on
    pub fn path(&self) -> &'static str {
        match self {
            AgentKind::Budget => "/agent/recommendation/generate",
            AgentKind::Savings => "/agent/savings/generate",
        }
    }
}

#[async_trait]
pub trait AgentChannel: Send + Sync {
    async fn call(&self, agent: AgentKind, params: Value, request_id: i64) -> RpcResponse;
}

pub struct HttpAgentChannel {
    client: RpcClient,
    base_url: String,
}

impl HttpAgentChannel {
    pub fn new(client: RpcClient, base_url: &str) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn url_for(&self, agent: AgentKind) -> String {
        format!("{}{}", self.base_url, agent.path())
    }
}

#[async_trait]
impl AgentChannel for HttpAgentChannel {
    async fn call(&self, agent: AgentKind, params: Value, request_id: i64) -> RpcResponse {
        self.client
            .call(&self.url_for(agent), agent.method(), params, request_id)
            .await
    }
}

pub struct LocalAgentChannel {
    budget: Arc<BudgetAgent>,
    savings: Arc<SavingsAgent>,
}

impl LocalAgentChannel {
    pub fn new(budget: Arc<BudgetAgent>, savings: Arc<SavingsAgent>) -> Self {
        Self { budget, savings }
    }
}

#[async_trait]
impl AgentChannel for LocalAgentChannel {
    async fn call(&self, agent: AgentKind, params: Value, request_id: i64) -> RpcResponse {
        let request = RpcRequest::new(agent.method(), params, request_id);

        match agent {
            AgentKind::Budget => self.budget.generate(&request).await,
            AgentKind::Savings => self.savings.generate(&request).await,
        }
    }
}
