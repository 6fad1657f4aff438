//! Asks every model in the current provider's catalog the same question.

use std::time::Instant;

use switchboard_core::provider::anthropic::AnthropicProvider;
use switchboard_core::{Agent, Provider, ProviderRegistry, SendOptions};

#[tokio::main]
async fn main() {
    dotenv::dotenv().ok();

    if std::env::var("ANTHROPIC_API_KEY").is_err() {
        eprintln!("Set ANTHROPIC_API_KEY to run this example");
        return;
    }

    let provider = AnthropicProvider::new();
    let models = provider.models();
    for model in &models {
        println!(
            "  - {}: {} - {}",
            model.id,
            model.name,
            model.description.as_deref().unwrap_or_default()
        );
    }

    let mut registry = ProviderRegistry::new();
    registry.register("anthropic", Box::new(provider));
    let mut agent = Agent::new(registry);

    let question = "In one sentence, what is artificial intelligence used for?";
    println!("\nQuestion: {}\n{}", question, "=".repeat(60));

    for model in models {
        // Each model answers from a clean slate
        agent.clear_history();
        let options = SendOptions::new().model(&model.id).max_tokens(200);

        let started = Instant::now();
        match agent.chat(question, Some(&options)).await {
            Ok(reply) => {
                println!("\n{} ({} ms)", model.id, started.elapsed().as_millis());
                println!("{}", reply);
            }
            Err(e) => println!("\n{} failed: {}", model.id, e),
        }
        println!("{}", "-".repeat(60));
    }
}
