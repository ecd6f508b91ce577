use clap::Parser;
use std::sync::Arc;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use research_agent::{config::Config, execute_research_pipeline, utils::TracingSink};

/// Decompose a research query into tasks, run them against mock tools and
/// print the resulting report.
#[derive(Debug, Parser)]
#[command(name = "research-agent", version, about)]
struct Cli {
    /// Research query (defaults to RESEARCH_QUERY or a built-in example)
    query: Option<String>,

    /// Print the full result envelope as JSON instead of the report text
    #[arg(long)]
    json: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Configuration first so its log filter can seed the subscriber
    let config_result = Config::from_env();
    let config = config_result.as_ref().cloned().unwrap_or_default();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| config.logging.filter.clone().into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    if let Err(e) = &config_result {
        warn!(error = %e, "Invalid configuration, falling back to defaults");
    }
    info!("Configuration loaded: {:?}", config.retry);

    let query = cli
        .query
        .unwrap_or_else(|| config.agent.default_query.clone());

    let (outcome, status) =
        match execute_research_pipeline(&query, &config, Arc::new(TracingSink)).await {
            Ok(result) => result,
            Err(e) => {
                error!(error = %e, "Research could not start");
                return Ok(());
            }
        };

    info!(
        completed = status.completed,
        tasks_completed = status.tasks_completed,
        tasks_failed = status.tasks_failed,
        "Agent status"
    );

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&outcome)?);
    } else {
        println!("\nFinal Report:\n{}", outcome.render());
    }

    Ok(())
}
