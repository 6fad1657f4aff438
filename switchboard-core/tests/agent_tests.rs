use futures::StreamExt;
use switchboard_core::{
    Agent, AgentOptions, ChatMessage, DEFAULT_SYSTEM_PROMPT, Error, Provider, ProviderRegistry,
    Result, SendOptions,
};
use tokio_test::{assert_err, assert_ok};
use tracing::{Level, info};

mod test_providers;

use test_providers::{Behavior, StubProvider};
use test_utils::setup_tracing;

fn agent_with(providers: Vec<StubProvider>, max_turns: usize) -> Agent {
    let mut registry = ProviderRegistry::new();
    for provider in providers {
        let id = provider.id().to_string();
        registry.register(id, provider.boxed());
    }
    Agent::with_options(
        registry,
        AgentOptions {
            max_turns,
            ..Default::default()
        },
    )
}

fn script(fragments: &[&str], error: Option<&str>) -> Behavior {
    Behavior::Script {
        fragments: fragments.iter().map(|f| f.to_string()).collect(),
        error: error.map(str::to_string),
    }
}

async fn drain(agent: &mut Agent, message: &str) -> Vec<Result<String>> {
    agent.chat_stream(message, None).collect().await
}

#[tokio::test]
async fn test_chat_appends_both_turns_and_sends_full_history() {
    setup_tracing(Level::DEBUG);
    let stub = StubProvider::new("echo", Behavior::Echo);
    let calls = stub.calls();
    let mut agent = agent_with(vec![stub], 50);

    assert_eq!(assert_ok!(agent.chat("hello", None).await), "hello");
    assert_eq!(assert_ok!(agent.chat("again", None).await), "again");

    assert_eq!(
        agent.history(),
        vec![
            ChatMessage::user("hello"),
            ChatMessage::assistant("hello"),
            ChatMessage::user("again"),
            ChatMessage::assistant("again"),
        ]
    );

    let calls = calls.lock().unwrap();
    assert_eq!(calls.len(), 2);
    assert_eq!(calls[0], vec![ChatMessage::user("hello")]);
    assert_eq!(calls[1].len(), 3);
    assert_eq!(calls[1].last(), Some(&ChatMessage::user("again")));
}

#[tokio::test]
async fn test_single_turn_window_keeps_latest_pair() {
    let mut agent = agent_with(vec![StubProvider::new("upper", Behavior::Uppercase)], 1);

    assert_ok!(agent.chat("a", None).await);
    assert_ok!(agent.chat("b", None).await);

    assert_eq!(
        agent.history(),
        vec![ChatMessage::user("b"), ChatMessage::assistant("B")]
    );
    assert_eq!(agent.history_len(), 2);
}

#[tokio::test]
async fn test_chat_failure_discards_history() {
    let mut registry = ProviderRegistry::new();
    registry.register("ok", StubProvider::new("ok", Behavior::Echo).boxed());
    registry.register("bad", StubProvider::new("bad", Behavior::Fail).boxed());
    let mut agent = Agent::new(registry);

    assert_ok!(agent.chat("first", None).await);
    assert_eq!(agent.history_len(), 2);

    // Move to the failing provider without going through switch_provider
    assert!(agent.registry_mut().set_current("bad"));
    assert_eq!(agent.history_len(), 2);

    let err = assert_err!(agent.chat("second", None).await);
    assert!(matches!(err, Error::Api { status: 500, .. }));
    assert_eq!(agent.history_len(), 0);
}

#[tokio::test]
async fn test_chat_without_provider() {
    let mut agent = Agent::new(ProviderRegistry::new());

    let err = assert_err!(agent.chat("hi", None).await);
    assert!(matches!(err, Error::NoProvider));
    assert_eq!(agent.history_len(), 0);
    assert_eq!(agent.current_provider_name(), None);
    assert_eq!(agent.current_model(), None);
}

#[tokio::test]
async fn test_stream_commits_concatenated_reply() {
    setup_tracing(Level::DEBUG);
    let mut agent = agent_with(
        vec![StubProvider::new("s", script(&["Hel", "lo", "!"], None))],
        50,
    );

    let items = drain(&mut agent, "greet me").await;
    let fragments: Vec<String> = items.into_iter().map(|i| i.unwrap()).collect();
    info!("Received fragments: {:?}", fragments);

    assert_eq!(fragments, vec!["Hel", "lo", "!"]);
    assert_eq!(
        agent.history(),
        vec![
            ChatMessage::user("greet me"),
            ChatMessage::assistant("Hello!")
        ]
    );
}

#[tokio::test]
async fn test_stream_failure_keeps_partial_reply() {
    let mut agent = agent_with(
        vec![StubProvider::new("s", script(&["par", "tial"], Some("connection reset")))],
        50,
    );

    let items = drain(&mut agent, "q").await;
    assert_eq!(items.len(), 3);
    assert_eq!(items[0].as_deref().unwrap(), "par");
    assert_eq!(items[1].as_deref().unwrap(), "tial");
    assert!(matches!(&items[2], Err(Error::Stream(m)) if m == "connection reset"));

    assert_eq!(
        agent.history(),
        vec![ChatMessage::user("q"), ChatMessage::assistant("partial")]
    );
}

#[tokio::test]
async fn test_stream_failure_before_any_text_keeps_user_message() {
    let mut agent = agent_with(vec![StubProvider::new("s", script(&[], Some("nope")))], 50);

    let items = drain(&mut agent, "q").await;
    assert_eq!(items.len(), 1);
    assert!(items[0].is_err());
    assert_eq!(agent.history(), vec![ChatMessage::user("q")]);
}

#[tokio::test]
async fn test_stream_open_failure_is_yielded() {
    let mut agent = agent_with(vec![StubProvider::new("s", Behavior::Fail)], 50);

    let items = drain(&mut agent, "q").await;
    assert_eq!(items.len(), 1);
    assert!(matches!(items[0], Err(Error::Api { status: 500, .. })));
    assert_eq!(agent.history(), vec![ChatMessage::user("q")]);
}

#[tokio::test]
async fn test_stream_without_provider_yields_single_error() {
    let mut agent = Agent::new(ProviderRegistry::new());

    let items = drain(&mut agent, "q").await;
    assert_eq!(items.len(), 1);
    assert!(matches!(items[0], Err(Error::NoProvider)));
    assert_eq!(agent.history_len(), 0);
}

#[tokio::test]
async fn test_dropped_stream_leaves_user_message() {
    let mut agent = agent_with(
        vec![StubProvider::new("s", script(&["a", "b", "c"], None))],
        50,
    );

    {
        let mut stream = agent.chat_stream("q", None);
        assert_eq!(stream.next().await.unwrap().unwrap(), "a");
    }

    assert_eq!(agent.history(), vec![ChatMessage::user("q")]);
}

#[tokio::test]
async fn test_switch_provider_clears_history() {
    let mut agent = agent_with(
        vec![
            StubProvider::new("one", Behavior::Echo),
            StubProvider::new("two", Behavior::Uppercase),
        ],
        50,
    );

    assert_eq!(agent.current_provider_name(), Some("Stub one"));
    assert_ok!(agent.chat("x", None).await);

    assert!(!agent.switch_provider("three"));
    assert_eq!(agent.history_len(), 2);
    assert_eq!(agent.current_provider_name(), Some("Stub one"));

    assert!(agent.switch_provider("two"));
    assert_eq!(agent.history_len(), 0);
    assert_eq!(agent.current_provider_name(), Some("Stub two"));
    assert_eq!(assert_ok!(agent.chat("x", None).await), "X");
}

#[test]
fn test_switch_model_targets_current_provider() {
    let mut agent = agent_with(
        vec![
            StubProvider::new("one", Behavior::Echo),
            StubProvider::new("two", Behavior::Echo),
        ],
        50,
    );

    agent.switch_model("bigger");
    assert_eq!(agent.current_model(), Some("bigger"));
    assert_eq!(agent.registry().get("two").unwrap().default_model(), "two-model");

    let mut empty = Agent::new(ProviderRegistry::new());
    empty.switch_model("anything");
    assert_eq!(empty.current_model(), None);
}

#[test]
fn test_system_prompt_reaches_provider() {
    let stub = StubProvider::new("echo", Behavior::Echo);
    let prompts = stub.system_prompts();
    let mut agent = agent_with(vec![stub], 50);
    assert_eq!(agent.system_prompt(), DEFAULT_SYSTEM_PROMPT);

    agent.set_system_prompt("Answer in French.");
    let options = SendOptions::new().temperature(0.2);
    assert_ok!(tokio_test::block_on(agent.chat("hi", Some(&options))));

    assert_eq!(
        prompts.lock().unwrap().as_slice(),
        &[Some("Answer in French.".to_string())]
    );
}

#[tokio::test]
async fn test_clear_history() {
    let mut agent = agent_with(vec![StubProvider::new("echo", Behavior::Echo)], 50);
    assert_ok!(agent.chat("hi", None).await);
    agent.clear_history();
    assert_eq!(agent.history_len(), 0);
    assert!(agent.history().is_empty());
}
