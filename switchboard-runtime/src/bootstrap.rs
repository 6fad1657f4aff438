//! Builds a [`ProviderRegistry`] from environment variables.
//!
//! Every provider is registered only when its credential is present, in the
//! order below, so the first configured one becomes current:
//!
//! | id            | credential             | wire format       |
//! |---------------|------------------------|-------------------|
//! | `openai`      | `OPENAI_API_KEY`       | Chat Completions  |
//! | `anthropic`   | `ANTHROPIC_API_KEY`    | Messages          |
//! | `dashscope`   | `DASHSCOPE_API_KEY`    | Chat Completions  |
//! | `deepseek`    | `DEEPSEEK_API_KEY`     | Chat Completions  |
//! | `moonshot`    | `MOONSHOT_API_KEY`     | Chat Completions  |
//! | `zhipu`       | `ZHIPU_API_KEY`        | Chat Completions  |
//! | `siliconflow` | `SILICONFLOW_API_KEY`  | Chat Completions  |
//! | `openrouter`  | `OPENROUTER_API_KEY`   | Chat Completions  |
//! | `ollama`      | `OLLAMA_ENABLED=true`  | Chat Completions  |

use switchboard_core::provider::anthropic::{self, AnthropicConfig, AnthropicProvider};
use switchboard_core::provider::openai::{self, OpenAIConfig, OpenAIProvider};
use switchboard_core::{ModelInfo, ProviderRegistry, Secret};
use tracing::{debug, info};

/// An OpenAI-compatible service with a fixed endpoint
#[derive(Debug, Clone, Copy)]
pub struct Preset {
    pub id: &'static str,
    pub name: &'static str,
    /// `<PREFIX>_API_KEY` and `<PREFIX>_MODEL` are read
    pub env_prefix: &'static str,
    pub base_url: &'static str,
    pub default_model: &'static str,
    /// `(id, name, description)`
    pub models: &'static [(&'static str, &'static str, &'static str)],
}

impl Preset {
    pub fn catalog(&self) -> Vec<ModelInfo> {
        catalog(self.models)
    }
}

fn catalog(models: &[(&str, &str, &str)]) -> Vec<ModelInfo> {
    models
        .iter()
        .map(|(id, name, description)| ModelInfo::new(*id, *name).with_description(*description))
        .collect()
}

pub const PRESETS: &[Preset] = &[
    Preset {
        id: "dashscope",
        name: "Alibaba DashScope",
        env_prefix: "DASHSCOPE",
        base_url: "https://dashscope.aliyuncs.com/compatible-mode/v1",
        default_model: "qwen-plus",
        models: &[
            ("qwen-plus", "Qwen Plus", "Balanced Qwen model"),
            ("qwen-max", "Qwen Max", "Flagship Qwen model"),
            ("qwen-turbo", "Qwen Turbo", "Fast Qwen model"),
            ("qwen-long", "Qwen Long", "Long-context Qwen model"),
            ("deepseek-v3", "DeepSeek V3", "DeepSeek V3 hosted on DashScope"),
            ("deepseek-r1", "DeepSeek R1", "DeepSeek R1 reasoning model"),
        ],
    },
    Preset {
        id: "deepseek",
        name: "DeepSeek",
        env_prefix: "DEEPSEEK",
        base_url: "https://api.deepseek.com",
        default_model: "deepseek-chat",
        models: &[
            ("deepseek-chat", "DeepSeek Chat", "DeepSeek chat model (V3)"),
            ("deepseek-reasoner", "DeepSeek Reasoner", "DeepSeek R1 reasoning model"),
        ],
    },
    Preset {
        id: "moonshot",
        name: "Moonshot Kimi",
        env_prefix: "MOONSHOT",
        base_url: "https://api.moonshot.cn/v1",
        default_model: "moonshot-v1-8k",
        models: &[
            ("moonshot-v1-8k", "Moonshot V1 8K", "8K context window"),
            ("moonshot-v1-32k", "Moonshot V1 32K", "32K context window"),
            ("moonshot-v1-128k", "Moonshot V1 128K", "128K context window"),
        ],
    },
    Preset {
        id: "zhipu",
        name: "Zhipu AI",
        env_prefix: "ZHIPU",
        base_url: "https://open.bigmodel.cn/api/paas/v4",
        default_model: "glm-4-plus",
        models: &[
            ("glm-4-plus", "GLM-4 Plus", "Flagship GLM model"),
            ("glm-4-air", "GLM-4 Air", "Cost-efficient GLM model"),
            ("glm-4-flash", "GLM-4 Flash", "Free fast GLM model"),
            ("glm-4-long", "GLM-4 Long", "Long-context GLM model"),
        ],
    },
    Preset {
        id: "siliconflow",
        name: "SiliconFlow",
        env_prefix: "SILICONFLOW",
        base_url: "https://api.siliconflow.cn/v1",
        default_model: "deepseek-ai/DeepSeek-V3",
        models: &[
            ("deepseek-ai/DeepSeek-V3", "DeepSeek V3", "DeepSeek V3"),
            ("deepseek-ai/DeepSeek-R1", "DeepSeek R1", "Reasoning model"),
            ("Qwen/Qwen2.5-72B-Instruct", "Qwen 2.5 72B", "Qwen 2.5 72B instruct"),
        ],
    },
    Preset {
        id: "openrouter",
        name: "OpenRouter",
        env_prefix: "OPENROUTER",
        base_url: "https://openrouter.ai/api/v1",
        default_model: "openai/gpt-4o",
        models: &[
            ("openai/gpt-4o", "GPT-4o", "OpenAI GPT-4o"),
            ("openai/gpt-4o-mini", "GPT-4o Mini", "OpenAI GPT-4o Mini"),
            ("anthropic/claude-sonnet-4", "Claude Sonnet 4", "Anthropic Claude Sonnet 4"),
            ("anthropic/claude-3.5-sonnet", "Claude 3.5 Sonnet", "Anthropic Claude 3.5 Sonnet"),
            ("google/gemini-2.5-pro-preview", "Gemini 2.5 Pro", "Google Gemini 2.5 Pro"),
            ("google/gemini-2.5-flash-preview", "Gemini 2.5 Flash", "Google Gemini 2.5 Flash"),
            ("deepseek/deepseek-chat-v3-0324", "DeepSeek V3", "DeepSeek Chat V3"),
            ("deepseek/deepseek-r1", "DeepSeek R1", "DeepSeek R1 reasoning model"),
            ("meta-llama/llama-4-maverick", "Llama 4 Maverick", "Meta Llama 4 Maverick"),
            ("mistralai/mistral-large-2411", "Mistral Large", "Mistral Large"),
            ("qwen/qwen-2.5-72b-instruct", "Qwen 2.5 72B", "Qwen 2.5 72B instruct"),
        ],
    },
];

const OLLAMA_DEFAULT_BASE_URL: &str = "http://localhost:11434/v1";

const OLLAMA_MODELS: &[(&str, &str, &str)] = &[
    ("llama3", "Llama 3", "Meta Llama 3"),
    ("qwen2.5", "Qwen 2.5", "Qwen 2.5"),
    ("deepseek-r1", "DeepSeek R1", "DeepSeek R1"),
    ("mistral", "Mistral", "Mistral AI"),
];

/// Loads `.env` from the working directory or its parents, if there is one
pub fn load_dotenv() {
    match dotenvy::dotenv() {
        Ok(path) => debug!("Loaded environment from {}", path.display()),
        Err(e) => debug!("No .env loaded: {}", e),
    }
}

pub fn registry_from_process_env() -> ProviderRegistry {
    registry_from_env(|key| std::env::var(key).ok())
}

/// Registers every provider whose credential `lookup` can find. Empty values
/// count as missing.
pub fn registry_from_env<F>(lookup: F) -> ProviderRegistry
where
    F: Fn(&str) -> Option<String>,
{
    let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
    let mut registry = ProviderRegistry::new();

    if let Some(api_key) = var("OPENAI_API_KEY") {
        let config = OpenAIConfig {
            api_key: Secret::new(api_key),
            base_url: var("OPENAI_BASE_URL").unwrap_or_else(|| openai::DEFAULT_BASE_URL.to_string()),
            organization: var("OPENAI_ORGANIZATION"),
            default_model: var("OPENAI_MODEL").unwrap_or_else(|| openai::DEFAULT_MODEL.to_string()),
            id: "openai".to_string(),
            name: "OpenAI".to_string(),
            models: None,
        };
        registry.register("openai", Box::new(OpenAIProvider::with_config(config)));
    }

    if let Some(api_key) = var("ANTHROPIC_API_KEY") {
        let config = AnthropicConfig {
            api_key: Secret::new(api_key),
            base_url: var("ANTHROPIC_BASE_URL")
                .unwrap_or_else(|| anthropic::DEFAULT_BASE_URL.to_string()),
            api_version: anthropic::API_VERSION.to_string(),
            default_model: var("ANTHROPIC_MODEL")
                .unwrap_or_else(|| anthropic::DEFAULT_MODEL.to_string()),
        };
        registry.register("anthropic", Box::new(AnthropicProvider::with_config(config)));
    }

    for preset in PRESETS {
        let Some(api_key) = var(&format!("{}_API_KEY", preset.env_prefix)) else {
            debug!("Skipping {}: no credential", preset.id);
            continue;
        };
        let config = OpenAIConfig {
            api_key: Secret::new(api_key),
            base_url: preset.base_url.to_string(),
            organization: None,
            default_model: var(&format!("{}_MODEL", preset.env_prefix))
                .unwrap_or_else(|| preset.default_model.to_string()),
            id: preset.id.to_string(),
            name: preset.name.to_string(),
            models: Some(preset.catalog()),
        };
        registry.register(preset.id, Box::new(OpenAIProvider::with_config(config)));
    }

    if var("OLLAMA_ENABLED").as_deref() == Some("true") {
        let config = OpenAIConfig {
            api_key: Secret::new("ollama".to_string()),
            base_url: var("OLLAMA_BASE_URL").unwrap_or_else(|| OLLAMA_DEFAULT_BASE_URL.to_string()),
            organization: None,
            default_model: var("OLLAMA_MODEL").unwrap_or_else(|| "llama3".to_string()),
            id: "ollama".to_string(),
            name: "Ollama (local)".to_string(),
            models: Some(catalog(OLLAMA_MODELS)),
        };
        registry.register("ollama", Box::new(OpenAIProvider::with_config(config)));
    }

    info!("Registered {} provider(s)", registry.len());
    registry
}
