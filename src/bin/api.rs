use budget_buddy_agents::{
    api::start_server,
    app::{build_state, init_tracing},
    config::AppConfig,
};
use tracing::info;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load environment variables
    dotenv::dotenv().ok();

    init_tracing();

    let config = AppConfig::from_env()?;

    if config.gemini_api_key.is_empty() {
        eprintln!("⚠️  GEMINI_API_KEY not set in .env");
        eprintln!("📌 See .env.example for setup instructions");
    }

    info!("🚀 Budget Buddy Agents - API Server");
    info!("📍 Port: {}", config.port);
    info!("🔌 Agent transport: {:?}", config.agent_transport);

    let state = build_state(&config)?;

    info!("✅ Agents and orchestrator initialized");
    info!("📡 Starting API server...");

    start_server(state, config.port).await?;

    Ok(())
}
