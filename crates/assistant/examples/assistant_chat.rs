//! Send one message through the full pipeline against live services.
//!
//! Requires `OPENROUTER_API_KEY` and `SERPAPI_KEY` (a `.env` file works).
//!
//! Usage:
//!   cargo run --example assistant_chat -- "I feel anxious about exams"

use assistant::{Assistant, AssistantConfig};
use completion::CompletionClient;
use database::Database;
use websearch::SearchClient;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let message = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "I have trouble sleeping before exams.".to_string());

    let database = Database::connect("sqlite:assistant_chat.db?mode=rwc").await?;
    database.migrate().await?;

    let assistant = Assistant::new(
        CompletionClient::from_env()?,
        SearchClient::from_env()?,
        database,
        AssistantConfig::from_env(),
    );

    let answer = assistant.handle_message("example-user", &message).await?;
    println!("{answer}");

    // Give the detached memory write a moment to land before exit.
    tokio::time::sleep(std::time::Duration::from_secs(2)).await;

    Ok(())
}
