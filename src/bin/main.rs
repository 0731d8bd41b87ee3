use budget_buddy_agents::{
    app::{build_state, init_tracing},
    config::{AgentTransport, AppConfig},
    models::Expense,
};
use tracing::info;

const USAGE: &str = "usage: orchestrator <category> <amount> [date]";

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenv::dotenv().ok();

    init_tracing();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let (category, amount) = match args.as_slice() {
        [category, amount, ..] => (category.clone(), amount.parse::<f64>()?),
        _ => {
            eprintln!("{}", USAGE);
            std::process::exit(2);
        }
    };
    let date = args
        .get(2)
        .cloned()
        .unwrap_or_else(|| chrono::Utc::now().format("%Y-%m-%d").to_string());

    // No server is running, so the agents are called in-process
    let mut config = AppConfig::from_env()?;
    config.agent_transport = AgentTransport::Local;

    let state = build_state(&config)?;

    let expense = Expense {
        category,
        amount,
        date,
    };

    info!(
        category = %expense.category,
        amount = expense.amount,
        date = %expense.date,
        "Running orchestrator"
    );

    match state.orchestrator.process(expense).await {
        Ok(response) => {
            info!("Orchestration successful");
            println!("{}", serde_json::to_string_pretty(&response)?);
            Ok(())
        }
        Err(e) => {
            eprintln!("Orchestration failed: {}", e);
            Err(Box::new(e) as Box<dyn std::error::Error>)
        }
    }
}
