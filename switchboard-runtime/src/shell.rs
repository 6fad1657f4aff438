//! Slash commands and text rendering for the interactive shell

use console::style;
use switchboard_core::{Agent, Error, Role};

/// One line of user input, classified
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Input {
    Empty,
    Message(String),
    Command(Command),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Help,
    Providers,
    Switch(Option<String>),
    Models,
    Model(Option<String>),
    System(Option<String>),
    Clear,
    Info,
    History,
    Exit,
    Unknown(String),
}

/// What the shell should do after a command ran
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Continue(String),
    Exit(String),
}

impl Input {
    pub fn parse(line: &str) -> Self {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            Input::Empty
        } else if trimmed.starts_with('/') {
            Input::Command(Command::parse(trimmed))
        } else {
            Input::Message(trimmed.to_string())
        }
    }
}

impl Command {
    /// Parses `/name [argument...]`. Everything after the name, with runs of
    /// whitespace collapsed, is the argument.
    pub fn parse(line: &str) -> Self {
        let mut parts = line.split_whitespace();
        let name = parts.next().unwrap_or_default();
        let rest = parts.collect::<Vec<_>>().join(" ");
        let arg = (!rest.is_empty()).then_some(rest);

        match name {
            "/help" => Command::Help,
            "/providers" | "/p" => Command::Providers,
            "/switch" | "/s" => Command::Switch(arg),
            "/models" | "/m" => Command::Models,
            "/model" | "/md" => Command::Model(arg),
            "/system" => Command::System(arg),
            "/clear" | "/c" => Command::Clear,
            "/info" | "/i" => Command::Info,
            "/history" | "/h" => Command::History,
            "/exit" | "/quit" | "/q" => Command::Exit,
            other => Command::Unknown(other.to_string()),
        }
    }
}

/// Applies `command` to the agent and returns the text to show
pub fn run_command(agent: &mut Agent, command: Command) -> Outcome {
    let text = match command {
        Command::Help => render_help(),
        Command::Providers => render_providers(agent),
        Command::Switch(None) => usage("/switch <provider id>", "/providers"),
        Command::Switch(Some(id)) => {
            if agent.switch_provider(&id) {
                format!(
                    "  {} {} {}\n",
                    style("✓ Switched to").green(),
                    style(agent.current_provider_name().unwrap_or_default()).green().bold(),
                    style(format!("({})", agent.current_model().unwrap_or_default())).dim()
                )
            } else {
                format!(
                    "  {}\n  {}\n",
                    style(format!("✗ Unknown provider: {}", id)).red(),
                    style("Type /providers to see what is available").dim()
                )
            }
        }
        Command::Models => render_models(agent),
        Command::Model(None) => usage("/model <model id>", "/models"),
        Command::Model(Some(model)) => {
            if agent.current_model().is_none() {
                no_provider()
            } else {
                agent.switch_model(model.as_str());
                format!("  {} {}\n", style("✓ Model set to").green(), style(model).green().bold())
            }
        }
        Command::System(None) => format!(
            "  {}\n  {}\n",
            style("Current system prompt:").cyan(),
            style(agent.system_prompt()).dim()
        ),
        Command::System(Some(prompt)) => {
            agent.set_system_prompt(prompt);
            format!("  {}\n", style("✓ System prompt updated").green())
        }
        Command::Clear => {
            agent.clear_history();
            format!("  {}\n", style("✓ Conversation history cleared").green())
        }
        Command::Info => render_info(agent),
        Command::History => render_history(agent),
        Command::Exit => return Outcome::Exit(render_goodbye()),
        Command::Unknown(name) => format!(
            "  {}\n  {}\n",
            style(format!("Unknown command: {}", name)).yellow(),
            style("Type /help for a list of commands").dim()
        ),
    };
    Outcome::Continue(text)
}

pub fn render_banner() -> String {
    format!(
        "\n  {} {}\n  {}\n",
        style("Switchboard").cyan().bold(),
        style(concat!("v", env!("CARGO_PKG_VERSION"))).dim(),
        style("Chat with any configured LLM provider").dim()
    )
}

pub fn render_goodbye() -> String {
    format!("\n  {}\n", style("Goodbye!").cyan())
}

pub fn render_help() -> String {
    let rows = [
        ("/providers", "(/p)", "List configured providers"),
        ("/switch <id>", "(/s)", "Switch provider (clears history)"),
        ("/models", "(/m)", "List models of the current provider"),
        ("/model <id>", "(/md)", "Switch model"),
        ("/system [prompt]", "", "Show or set the system prompt"),
        ("/clear", "(/c)", "Clear conversation history"),
        ("/info", "(/i)", "Show current configuration"),
        ("/history", "(/h)", "Show conversation history"),
        ("/exit", "(/quit, /q)", "Quit"),
    ];

    let mut out = format!("\n  {}\n", style("Commands").cyan().bold());
    for (command, alias, help) in rows {
        out.push_str(&format!(
            "  {:<18} {:<12} {}\n",
            style(command).yellow(),
            style(alias).dim(),
            help
        ));
    }
    out
}

pub fn render_providers(agent: &Agent) -> String {
    let providers = agent.registry().list();
    if providers.is_empty() {
        return format!("  {}\n", style("✗ No providers configured").red());
    }

    let mut out = format!("  {}\n", style("Providers:").bold());
    for summary in providers {
        let model = agent
            .registry()
            .get(&summary.id)
            .map(|p| p.default_model().to_string())
            .unwrap_or_default();
        let line = if summary.is_current {
            format!(
                "  {} {} {} {}\n",
                style("▶").green(),
                style(&summary.name).green().bold(),
                style(format!("({})", summary.id)).dim(),
                style(format!("· {}", model)).dim()
            )
        } else {
            format!(
                "    {} {} {}\n",
                summary.name,
                style(format!("({})", summary.id)).dim(),
                style(format!("· {}", model)).dim()
            )
        };
        out.push_str(&line);
    }
    out
}

pub fn render_models(agent: &Agent) -> String {
    let Some(provider) = agent.registry().current() else {
        return no_provider();
    };

    let current = provider.default_model();
    let mut out = format!(
        "\n  {}\n",
        style(format!("{} models", provider.name())).cyan().bold()
    );
    for model in provider.models() {
        let about = model.description.as_deref().unwrap_or(&model.name);
        if model.id == current {
            out.push_str(&format!(
                "  {} {} {}\n",
                style("▶").green(),
                style(&model.id).green().bold(),
                style(format!("· {}", about)).dim()
            ));
        } else {
            out.push_str(&format!("    {} {}\n", model.id, style(format!("· {}", about)).dim()));
        }
    }
    out
}

/// One-line summary shown under the banner
pub fn render_status(agent: &Agent) -> String {
    format!(
        "  {} {} / {}\n  {}\n",
        style("Current:").dim(),
        style(agent.current_provider_name().unwrap_or("-")).cyan(),
        style(agent.current_model().unwrap_or("-")).yellow(),
        style("Type /help for a list of commands").dim()
    )
}

pub fn render_info(agent: &Agent) -> String {
    format!(
        "\n  {}\n  {:<10} {}\n  {:<10} {}\n  {:<10} {}\n  {:<10} {}\n",
        style("Configuration").cyan().bold(),
        "Provider:",
        style(agent.current_provider_name().unwrap_or("-")).cyan(),
        "Model:",
        style(agent.current_model().unwrap_or("-")).yellow(),
        "Turns:",
        agent.history_len() / 2,
        "System:",
        truncate(agent.system_prompt(), 60)
    )
}

pub fn render_history(agent: &Agent) -> String {
    let history = agent.history();
    if history.is_empty() {
        return format!("  {}\n", style("No conversation history yet").dim());
    }

    let mut out = format!(
        "\n  {}\n",
        style(format!("History ({} turns)", history.len() / 2)).cyan().bold()
    );
    for message in &history {
        let label = match message.role {
            Role::User => style("You").blue().bold(),
            Role::Assistant => style("AI").green().bold(),
            Role::System => style("System").magenta().bold(),
        };
        out.push_str(&format!(
            "  {} › {}\n",
            label,
            truncate(&message.content, 100)
        ));
    }
    out
}

/// A hint for failures the user can act on
pub fn error_hint(error: &Error) -> Option<&'static str> {
    match error {
        Error::Authentication(_) => Some("Check that the API key is configured correctly"),
        Error::RateLimit(_) => Some("Too many requests, wait a moment and try again"),
        Error::Request(e) if e.is_connect() || e.is_timeout() => {
            Some("Network connection failed, check your network settings")
        }
        Error::NoProvider => Some("Configure at least one provider API key in .env"),
        _ => None,
    }
}

fn usage(syntax: &str, listing: &str) -> String {
    format!(
        "  {}\n  {}\n",
        style(format!("Usage: {}", syntax)).yellow(),
        style(format!("Type {} to see the options", listing)).dim()
    )
}

fn no_provider() -> String {
    format!("  {}\n", style("✗ No current provider").red())
}

fn truncate(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((end, _)) => format!("{}...", &text[..end]),
        None => text.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use parameterized::*;
    use switchboard_core::{
        ChatMessage, ModelInfo, Provider, ProviderIdentity, ProviderRegistry, Result, SendOptions,
        TextStream,
    };

    struct Fixed {
        identity: ProviderIdentity,
        model: String,
    }

    #[async_trait]
    impl Provider for Fixed {
        fn identity(&self) -> &ProviderIdentity {
            &self.identity
        }

        async fn send_message(
            &self,
            _messages: &[ChatMessage],
            _system_prompt: Option<&str>,
            _options: Option<&SendOptions>,
        ) -> Result<String> {
            Ok("fixed".to_string())
        }

        async fn stream_message(
            &self,
            _messages: &[ChatMessage],
            _system_prompt: Option<&str>,
            _options: Option<&SendOptions>,
        ) -> Result<TextStream> {
            Ok(Box::pin(futures::stream::iter(vec![Ok("fixed".to_string())])))
        }

        fn models(&self) -> Vec<ModelInfo> {
            vec![
                ModelInfo::new("small", "Small").with_description("Fast and cheap"),
                ModelInfo::new("large", "Large"),
            ]
        }

        fn default_model(&self) -> &str {
            &self.model
        }

        fn set_default_model(&mut self, model: String) {
            self.model = model;
        }
    }

    fn agent() -> Agent {
        let mut registry = ProviderRegistry::new();
        for (id, name) in [("one", "First"), ("two", "Second")] {
            registry.register(
                id,
                Box::new(Fixed {
                    identity: ProviderIdentity::new(name, id),
                    model: "small".to_string(),
                }),
            );
        }
        Agent::new(registry)
    }

    fn plain(outcome: Outcome) -> String {
        match outcome {
            Outcome::Continue(text) | Outcome::Exit(text) => {
                console::strip_ansi_codes(&text).into_owned()
            }
        }
    }

    #[parameterized(
        line = {
            "/help", "/p", "/providers", "/s two", "/switch", "/m", "/models",
            "/md  big   model", "/model", "/system be   terse", "/system", "/c", "/clear",
            "/i", "/info", "/h", "/history", "/q", "/quit", "/exit", "/nope"
        },
        expected = {
            Command::Help, Command::Providers, Command::Providers,
            Command::Switch(Some("two".into())), Command::Switch(None),
            Command::Models, Command::Models,
            Command::Model(Some("big model".into())), Command::Model(None),
            Command::System(Some("be terse".into())), Command::System(None),
            Command::Clear, Command::Clear, Command::Info, Command::Info,
            Command::History, Command::History,
            Command::Exit, Command::Exit, Command::Exit,
            Command::Unknown("/nope".into())
        }
    )]
    fn test_command_aliases(line: &str, expected: Command) {
        assert_eq!(Command::parse(line), expected);
    }

    #[test]
    fn test_input_classification() {
        assert_eq!(Input::parse("   "), Input::Empty);
        assert_eq!(Input::parse("  hello there "), Input::Message("hello there".into()));
        assert_eq!(Input::parse(" /c"), Input::Command(Command::Clear));
    }

    #[test]
    fn test_switch_and_models() {
        let mut agent = agent();

        let text = plain(run_command(&mut agent, Command::Switch(Some("two".into()))));
        assert!(text.contains("Switched to Second (small)"));

        let text = plain(run_command(&mut agent, Command::Switch(Some("zzz".into()))));
        assert!(text.contains("Unknown provider: zzz"));

        let text = plain(run_command(&mut agent, Command::Model(Some("large".into()))));
        assert!(text.contains("Model set to large"));
        let text = plain(run_command(&mut agent, Command::Models));
        assert!(text.contains("▶ large"));
        assert!(text.contains("small · Fast and cheap"));

        let text = plain(run_command(&mut agent, Command::Providers));
        assert!(text.contains("▶ Second (two) · large"));
        assert!(text.contains("First (one) · small"));
    }

    #[tokio::test]
    async fn test_history_info_and_clear() {
        let mut agent = agent();
        agent.set_system_prompt("x".repeat(80));
        agent.chat("hello", None).await.unwrap();

        let text = plain(run_command(&mut agent, Command::History));
        assert!(text.contains("History (1 turns)"));
        assert!(text.contains("You › hello"));
        assert!(text.contains("AI › fixed"));

        let text = plain(run_command(&mut agent, Command::Info));
        assert!(text.contains(&format!("{}...", "x".repeat(60))));

        run_command(&mut agent, Command::Clear);
        assert_eq!(agent.history_len(), 0);
        let text = plain(run_command(&mut agent, Command::History));
        assert!(text.contains("No conversation history yet"));
    }

    #[test]
    fn test_exit_and_unknown() {
        let mut agent = agent();
        assert!(matches!(run_command(&mut agent, Command::Exit), Outcome::Exit(_)));
        let text = plain(run_command(&mut agent, Command::Unknown("/x".into())));
        assert!(text.contains("Unknown command: /x"));
    }

    #[test]
    fn test_model_without_provider() {
        let mut agent = Agent::new(ProviderRegistry::new());
        let text = plain(run_command(&mut agent, Command::Model(Some("m".into()))));
        assert!(text.contains("No current provider"));
        let text = plain(run_command(&mut agent, Command::Models));
        assert!(text.contains("No current provider"));
    }

    #[test]
    fn test_truncate_counts_chars() {
        assert_eq!(truncate("héllo", 3), "hél...");
        assert_eq!(truncate("abc", 3), "abc");
    }

    #[test]
    fn test_error_hints() {
        assert!(error_hint(&Error::Authentication("bad key".into())).is_some());
        assert!(error_hint(&Error::RateLimit("slow".into())).is_some());
        assert!(error_hint(&Error::Other("?".into())).is_none());
    }
}
