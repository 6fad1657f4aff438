use std::io::{self, Write};
use std::time::Instant;

use anyhow::{Context, Result, bail};
use clap::Parser;
use clap::builder::RangedU64ValueParser;
use console::style;
use futures::StreamExt;
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;
use switchboard_core::{Agent, AgentOptions, DEFAULT_MAX_TURNS, DEFAULT_SYSTEM_PROMPT, Error};
use switchboard_runtime::bootstrap;
use switchboard_runtime::shell::{self, Input, Outcome};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

/// Interactive chat against any configured LLM provider
#[derive(Parser, Debug)]
#[command(name = "switchboard", version, about)]
struct Args {
    /// Provider to start with (defaults to the first configured one)
    #[arg(short, long, env = "SWITCHBOARD_PROVIDER")]
    provider: Option<String>,

    /// Model to start with on that provider
    #[arg(short, long, env = "SWITCHBOARD_MODEL")]
    model: Option<String>,

    /// System prompt sent with every request
    #[arg(long, default_value = DEFAULT_SYSTEM_PROMPT)]
    system: String,

    /// Conversation turns kept in history
    #[arg(
        long,
        default_value_t = DEFAULT_MAX_TURNS,
        value_parser = RangedU64ValueParser::<usize>::new().range(1..)
    )]
    max_turns: usize,

    /// Wait for complete replies instead of streaming them
    #[arg(long)]
    no_stream: bool,
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    bootstrap::load_dotenv();
    init_tracing();
    let args = Args::parse();
    debug!("Arguments: {:?}", args);

    let mut registry = bootstrap::registry_from_process_env();
    println!("{}", shell::render_banner());

    if registry.is_empty() {
        println!("  {}", style("No provider API key is configured!").red().bold());
        println!(
            "  {}\n",
            style("Set at least one key (e.g. OPENAI_API_KEY) in the environment or a .env file").dim()
        );
        std::process::exit(1);
    }

    if let Some(id) = &args.provider {
        if !registry.set_current(id) {
            let known: Vec<String> = registry.list().into_iter().map(|p| p.id).collect();
            bail!("Unknown provider '{}'. Configured: {}", id, known.join(", "));
        }
    }

    let mut agent = Agent::with_options(
        registry,
        AgentOptions {
            system_prompt: args.system.clone(),
            max_turns: args.max_turns,
        },
    );
    if let Some(model) = &args.model {
        agent.switch_model(model.as_str());
    }

    print!("{}", shell::render_providers(&agent));
    println!("{}", shell::render_status(&agent));
    info!("Starting shell");

    run_shell(&mut agent, !args.no_stream).await
}

/// Records `line` in the editor history. Failures are only logged.
fn remember(editor: &mut DefaultEditor, line: &str) {
    if let Err(e) = editor.add_history_entry(line) {
        debug!("Could not add line to editor history: {}", e);
    }
}

async fn run_shell(agent: &mut Agent, stream: bool) -> Result<()> {
    let mut editor = DefaultEditor::new().context("Failed to initialize line editor")?;

    loop {
        let prompt = format!(
            "You ({}/{}) › ",
            agent.registry().current_id(),
            agent.current_model().unwrap_or("-")
        );

        let line = match editor.readline(&prompt) {
            Ok(line) => line,
            Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => {
                print!("{}", shell::render_goodbye());
                break;
            }
            Err(e) => return Err(e.into()),
        };

        match Input::parse(&line) {
            Input::Empty => continue,
            Input::Command(command) => {
                remember(&mut editor, &line);
                match shell::run_command(agent, command) {
                    Outcome::Continue(text) => println!("{}", text),
                    Outcome::Exit(text) => {
                        print!("{}", text);
                        break;
                    }
                }
            }
            Input::Message(message) => {
                remember(&mut editor, &line);
                let result = if stream {
                    stream_reply(agent, message).await
                } else {
                    full_reply(agent, message).await
                };
                if let Err(e) = result {
                    report(&e);
                }
            }
        }
    }

    Ok(())
}

async fn stream_reply(agent: &mut Agent, message: String) -> std::result::Result<(), Error> {
    print!("\n{} › ", style("AI").green().bold());
    flush();

    let started = Instant::now();
    let mut replies = agent.chat_stream(message, None);
    while let Some(fragment) = replies.next().await {
        print!("{}", fragment?);
        flush();
    }

    println!(
        "\n     {}\n",
        style(format!("[{:.1}s]", started.elapsed().as_secs_f32())).dim()
    );
    Ok(())
}

async fn full_reply(agent: &mut Agent, message: String) -> std::result::Result<(), Error> {
    let started = Instant::now();
    let reply = agent.chat(message, None).await?;
    println!(
        "\n{} › {}\n     {}\n",
        style("AI").green().bold(),
        reply,
        style(format!("[{:.1}s]", started.elapsed().as_secs_f32())).dim()
    );
    Ok(())
}

fn report(error: &Error) {
    println!("\n  {}", style(format!("✗ Error: {}", error)).red());
    if let Some(hint) = shell::error_hint(error) {
        println!("  {}", style(hint).dim());
    }
    println!();
}

fn flush() {
    let _ = io::stdout().flush();
}
