//! REST API server for the budget agents
//!
//! One route table: the two agent endpoints, the orchestrating expense
//! endpoint, goal tracking, and the MCP-style tool endpoints the dashboard
//! reads from.

use axum::{
    body::Bytes,
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, patch, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{error, info};

use crate::agents::{Agent, AgentKind, BudgetAgent, SavingsAgent};
use crate::cost_of_living::CostOfLivingProvider;
use crate::goals;
use crate::models::{Expense, GoalStatus, ProcessExpenseResponse, TrackedGoal};
use crate::orchestrator::ExpenseOrchestrator;
use crate::rpc::{codes, RpcError, RpcRequest, RpcResponse, JSONRPC_VERSION};
use crate::state::ExpenseStore;

/// =============================
/// Request Models
/// =============================

#[derive(Debug, Deserialize)]
pub struct TrackGoalRequest {
    #[serde(rename = "tipId", alias = "tip_id")]
    pub tip_id: String,
    #[serde(rename = "tipText", alias = "tip_text")]
    pub tip_text: String,
}

#[derive(Debug, Deserialize)]
pub struct UpdateGoalRequest {
    pub status: String,
}

#[derive(Debug, Deserialize)]
pub struct CityQuery {
    pub city: String,
}

/// =============================
/// Response Wrappers
/// =============================

#[derive(Debug, Serialize, Deserialize)]
pub struct ApiResponse {
    pub success: bool,
    pub data: Option<serde_json::Value>,
    pub error: Option<String>,
    pub timestamp: String,
}

impl ApiResponse {
    pub fn success<T: Serialize>(data: T) -> Self {
        Self {
            success: true,
            data: serde_json::to_value(data).ok(),
            error: None,
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }

    pub fn error(message: String) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message),
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }
}

/// Tool-endpoint body: `{result, error}`
#[derive(Debug, Serialize, Deserialize)]
pub struct McpResponse {
    pub result: Value,
    pub error: Option<String>,
}

impl McpResponse {
    fn ok(result: Value) -> Self {
        Self {
            result,
            error: None,
        }
    }

    fn failed(message: String) -> Self {
        Self {
            result: json!({}),
            error: Some(message),
        }
    }
}

#[derive(Debug)]
pub enum ApiError {
    BadRequest(String),
    NotFound(String),
    Internal(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            ApiError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
        };

        (status, Json(ApiResponse::error(message))).into_response()
    }
}

impl From<crate::error::BudgetError> for ApiError {
    fn from(err: crate::error::BudgetError) -> Self {
        ApiError::Internal(err.to_string())
    }
}

/// =============================
/// API State
/// =============================

#[derive(Clone)]
pub struct ApiState {
    pub orchestrator: Arc<ExpenseOrchestrator>,
    pub budget_agent: Arc<BudgetAgent>,
    pub savings_agent: Arc<SavingsAgent>,
    pub store: Arc<dyn ExpenseStore>,
    pub cost_of_living: Arc<dyn CostOfLivingProvider>,
}

/// =============================
/// Health Endpoint
/// =============================

async fn health() -> Json<serde_json::Value> {
    Json(json!({
        "status": "healthy",
        "timestamp": chrono::Utc::now().to_rfc3339()
    }))
}

/// =============================
/// Agent Endpoints
/// =============================

/// Decode a raw body into a request envelope and let the agent answer it.
/// Always produces an envelope, never an HTTP error.
async fn serve_agent(agent: &dyn Agent, body: &[u8]) -> RpcResponse {
    let value: Value = match serde_json::from_slice(body) {
        Ok(value) => value,
        Err(e) => {
            return RpcResponse::failure(
                0,
                RpcError::new(codes::PARSE_ERROR, format!("Parse error: {}", e)),
            );
        }
    };

    let id = value.get("id").and_then(Value::as_i64).unwrap_or(0);

    let request = match serde_json::from_value::<RpcRequest>(value) {
        Ok(request) => request,
        Err(e) => {
            return RpcResponse::failure(
                id,
                RpcError::new(codes::INVALID_REQUEST, format!("Invalid request: {}", e)),
            );
        }
    };

    if request.jsonrpc != JSONRPC_VERSION {
        return RpcResponse::failure(
            request.id,
            RpcError::new(
                codes::INVALID_REQUEST,
                format!("Unsupported protocol version {:?}", request.jsonrpc),
            ),
        );
    }

    agent.generate(&request).await
}

async fn recommendation_agent(State(state): State<ApiState>, body: Bytes) -> Json<RpcResponse> {
    Json(serve_agent(state.budget_agent.as_ref(), &body).await)
}

async fn savings_agent(State(state): State<ApiState>, body: Bytes) -> Json<RpcResponse> {
    Json(serve_agent(state.savings_agent.as_ref(), &body).await)
}

/// =============================
/// Main Orchestration Endpoint
/// =============================

async fn process_expense(
    State(state): State<ApiState>,
    Json(expense): Json<Expense>,
) -> Result<Json<ProcessExpenseResponse>, ApiError> {
    info!(
        category = %expense.category,
        amount = expense.amount,
        "Received expense"
    );

    match state.orchestrator.process(expense).await {
        Ok(response) => Ok(Json(response)),
        Err(e) => {
            error!(error = %e, "Expense processing failed");
            Err(ApiError::Internal(format!("Failed to process expense: {}", e)))
        }
    }
}

/// =============================
/// Goal Endpoints
/// =============================

async fn track_goal(
    State(state): State<ApiState>,
    Json(req): Json<TrackGoalRequest>,
) -> (StatusCode, Json<ApiResponse>) {
    if req.tip_id.trim().is_empty() {
        return (
            StatusCode::BAD_REQUEST,
            Json(ApiResponse::error("tipId must not be empty".into())),
        );
    }

    if goals::track_goal(state.store.as_ref(), &req.tip_id, &req.tip_text).await {
        (
            StatusCode::CREATED,
            Json(ApiResponse::success(json!({
                "message": "Goal tracking started",
                "tipId": req.tip_id,
            }))),
        )
    } else {
        (
            StatusCode::CONFLICT,
            Json(ApiResponse::error(format!(
                "Goal {} is already tracked or could not be saved",
                req.tip_id
            ))),
        )
    }
}

async fn list_goals(State(state): State<ApiState>) -> Result<Json<Vec<TrackedGoal>>, ApiError> {
    Ok(Json(goals::list_goals(state.store.as_ref()).await?))
}

async fn update_goal(
    State(state): State<ApiState>,
    Path(tip_id): Path<String>,
    Json(req): Json<UpdateGoalRequest>,
) -> Result<Json<ApiResponse>, ApiError> {
    let status = GoalStatus::parse(&req.status).ok_or_else(|| {
        ApiError::BadRequest(format!(
            "status must be tracking, achieved or cancelled, got {:?}",
            req.status
        ))
    })?;

    if goals::set_goal_status(state.store.as_ref(), &tip_id, status).await? {
        Ok(Json(ApiResponse::success(json!({
            "tipId": tip_id,
            "status": status,
        }))))
    } else {
        Err(ApiError::NotFound(format!("No tracked goal {}", tip_id)))
    }
}

/// =============================
/// MCP Tool Endpoints
/// =============================

async fn mcp_add_expense(
    State(state): State<ApiState>,
    Json(expense): Json<Expense>,
) -> Json<McpResponse> {
    match state.store.insert_expense(&expense).await {
        Ok(_) => Json(McpResponse::ok(json!({ "message": "Expense added" }))),
        Err(e) => Json(McpResponse::failed(e.to_string())),
    }
}

async fn mcp_get_expenses(State(state): State<ApiState>) -> Json<McpResponse> {
    match state.store.list_expenses().await {
        Ok(expenses) => Json(McpResponse::ok(json!({ "expenses": expenses }))),
        Err(e) => Json(McpResponse::failed(e.to_string())),
    }
}

async fn mcp_fetch_cost_of_living(
    State(state): State<ApiState>,
    Query(query): Query<CityQuery>,
) -> Json<McpResponse> {
    match state.cost_of_living.lookup(&query.city).await {
        Ok(Some(cost)) => Json(McpResponse::ok(json!(cost))),
        Ok(None) => Json(McpResponse::failed(format!(
            "No cost of living data for {}",
            query.city
        ))),
        Err(e) => Json(McpResponse::failed(e.to_string())),
    }
}

/// =============================
/// Router
/// =============================

pub fn create_router(state: ApiState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route(AgentKind::Budget.path(), post(recommendation_agent))
        .route(AgentKind::Savings.path(), post(savings_agent))
        .route("/agent/expense/process", post(process_expense))
        .route("/api/track_goal", post(track_goal))
        .route("/api/tracked_goals", get(list_goals))
        .route("/api/tracked_goals/:tip_id", patch(update_goal))
        .route("/mcp/add_expense", post(mcp_add_expense))
        .route("/mcp/get_expenses", get(mcp_get_expenses))
        .route("/mcp/fetch_cost_of_living", get(mcp_fetch_cost_of_living))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}

/// =============================
/// Server Startup
/// =============================

pub async fn start_server(state: ApiState, port: u16) -> crate::Result<()> {
    let router = create_router(state);

    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{}", port)).await?;

    info!("API Server listening on http://0.0.0.0:{}", port);
    info!("Local: http://127.0.0.1:{}", port);

    axum::serve(listener, router).await?;

    Ok(())
}
