//! Talks to any OpenAI-compatible endpoint by overriding the base URL.
//!
//! ```sh
//! COMPAT_API_KEY=... COMPAT_BASE_URL=https://api.deepseek.com COMPAT_MODEL=deepseek-chat \
//!     cargo run --example compatible_api
//! ```

use std::env;
use std::io::Write;

use futures::StreamExt;
use switchboard_core::provider::openai::{OpenAIConfig, OpenAIProvider};
use switchboard_core::{Agent, AgentOptions, ModelInfo, ProviderRegistry, Secret};

#[tokio::main]
async fn main() -> switchboard_core::Result<()> {
    dotenv::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let Ok(api_key) = env::var("COMPAT_API_KEY") else {
        eprintln!("Set COMPAT_API_KEY (and optionally COMPAT_BASE_URL, COMPAT_MODEL)");
        return Ok(());
    };
    let model = env::var("COMPAT_MODEL").unwrap_or_else(|_| "deepseek-chat".to_string());

    let provider = OpenAIProvider::with_config(OpenAIConfig {
        api_key: Secret::new(api_key),
        base_url: env::var("COMPAT_BASE_URL")
            .unwrap_or_else(|_| "https://api.deepseek.com".to_string()),
        organization: None,
        default_model: model.clone(),
        id: "compat".to_string(),
        name: "Compatible endpoint".to_string(),
        models: Some(vec![ModelInfo::new(&model, &model)]),
    });
    println!("Endpoint: {}", provider.base_url());

    let mut registry = ProviderRegistry::new();
    registry.register("compat", Box::new(provider));
    let mut agent = Agent::with_options(
        registry,
        AgentOptions {
            system_prompt: "You are a concise assistant.".to_string(),
            ..Default::default()
        },
    );

    let mut stream = agent.chat_stream("Introduce yourself in one sentence.", None);
    while let Some(fragment) = stream.next().await {
        print!("{}", fragment?);
        let _ = std::io::stdout().flush();
    }
    drop(stream);
    println!();

    println!("History holds {} messages", agent.history_len());
    Ok(())
}
