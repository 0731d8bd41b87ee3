//! Budget Buddy agents
//!
//! Records an expense, then asks two LLM-backed agents for advice:
//! - the budget agent turns spending and local prices into recommendations
//! - the savings agent turns those recommendations into concrete tips
//!
//! Agents speak JSON-RPC 2.0 over HTTP (or in-process), and every agent
//! failure degrades to empty advice rather than failing the expense.
//!
//! FLOW:
//! EXPENSE → STORE → BUDGET AGENT → COST OF LIVING → SAVINGS AGENT → MERGE

pub mod agents;
pub mod api;
pub mod app;
pub mod config;
pub mod cost_of_living;
pub mod error;
pub mod goals;
pub mod llm;
pub mod models;
pub mod orchestrator;
pub mod rpc;
pub mod state;

pub use error::Result;

// Re-export common types
pub use models::*;
pub use orchestrator::ExpenseOrchestrator;
