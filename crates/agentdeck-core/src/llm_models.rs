// Static model catalog
//
// Models known to be served by LLM7.io. Used to validate agent models and as
// the listing fallback when the provider's /models endpoint is unreachable.

use serde::Serialize;

#[cfg(feature = "openapi")]
use utoipa::ToSchema;

/// Provider label reported for every catalog entry
pub const PROVIDER: &str = "llm7.io";

/// Default model for new agents
pub const DEFAULT_MODEL: &str = "gpt-4o-mini-2024-07-18";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModelInfo {
    pub id: &'static str,
    pub name: &'static str,
    pub max_tokens: u32,
}

impl ModelInfo {
    const fn new(id: &'static str, name: &'static str, max_tokens: u32) -> Self {
        Self {
            id,
            name,
            max_tokens,
        }
    }

    pub fn description(&self) -> &'static str {
        match self.id {
            "gpt-4o-mini-2024-07-18" => "Small, fast GPT-4o model for general use",
            "deepseek-r1-0528" => "DeepSeek R1 for advanced reasoning",
            "deepseek-v3-0324" => "DeepSeek V3 for a wide range of tasks",
            "mistral-large-2411" => "Large Mistral model for complex tasks",
            "mistral-small-2503" => "Small Mistral model for simple tasks",
            "codestral-2501" => "Specialised model for writing code",
            "llama-4-scout-17b-16e-instruct" => "Llama 4 Scout for instruction following",
            "open-mixtral-8x22b" => "Large Mixtral mixture-of-experts model",
            "open-mixtral-8x7b" => "Medium Mixtral mixture-of-experts model",
            "qwen2.5-coder-32b-instruct" => "Qwen model specialised for coding",
            "pixtral-large-2411" => "Multimodal model for text and images",
            "phi-4-multilmodal-instruct" => "Small multimodal model from Microsoft",
            "grok-3-mini-high" => "Grok Mini with high quality output",
            "openai-reasoning" => "Specialised model for logical reasoning",
            _ => "Capable general-purpose model",
        }
    }

    pub fn categories(&self) -> Vec<ModelCategory> {
        ModelCategory::ALL
            .into_iter()
            .filter(|c| c.includes(self.id))
            .collect()
    }
}

pub static MODEL_CATALOG: &[ModelInfo] = &[
    ModelInfo::new("bidara", "Bidara", 4096),
    ModelInfo::new("codestral-2405", "Codestral 2405", 32768),
    ModelInfo::new("codestral-2501", "Codestral 2501", 32768),
    ModelInfo::new("deepseek-r1-0528", "DeepSeek R1", 8192),
    ModelInfo::new("deepseek-v3-0324", "DeepSeek V3", 8192),
    ModelInfo::new("gpt-4.1-nano-2025-04-14", "GPT-4.1 Nano", 8192),
    ModelInfo::new("gpt-4o-mini-2024-07-18", "GPT-4o Mini", 128000),
    ModelInfo::new("grok-3-mini-high", "Grok 3 Mini High", 8192),
    ModelInfo::new("llama-4-scout-17b-16e-instruct", "Llama 4 Scout 17B", 8192),
    ModelInfo::new("llama-fast-roblox", "Llama Fast Roblox", 4096),
    ModelInfo::new("ministral-3b-2410", "Ministral 3B", 32768),
    ModelInfo::new("ministral-8b-2410", "Ministral 8B", 32768),
    ModelInfo::new("mirexa", "Mirexa", 4096),
    ModelInfo::new("mistral-large-2402", "Mistral Large 2402", 32768),
    ModelInfo::new("mistral-large-2407", "Mistral Large 2407", 32768),
    ModelInfo::new("mistral-large-2411", "Mistral Large 2411", 32768),
    ModelInfo::new("mistral-medium", "Mistral Medium", 32768),
    ModelInfo::new("mistral-saba-2502", "Mistral Saba 2502", 32768),
    ModelInfo::new("mistral-small-2402", "Mistral Small 2402", 32768),
    ModelInfo::new("mistral-small-2409", "Mistral Small 2409", 32768),
    ModelInfo::new("mistral-small-2501", "Mistral Small 2501", 32768),
    ModelInfo::new("mistral-small-2503", "Mistral Small 2503", 32768),
    ModelInfo::new(
        "mistral-small-3.1-24b-instruct-2503",
        "Mistral Small 3.1 24B",
        32768,
    ),
    ModelInfo::new("open-mistral-7b", "Open Mistral 7B", 32768),
    ModelInfo::new("open-mistral-nemo", "Open Mistral Nemo", 32768),
    ModelInfo::new("open-mixtral-8x22b", "Open Mixtral 8x22B", 65536),
    ModelInfo::new("open-mixtral-8x7b", "Open Mixtral 8x7B", 32768),
    ModelInfo::new("openai-reasoning", "OpenAI Reasoning", 8192),
    ModelInfo::new("phi-4-multilmodal-instruct", "Phi-4 Multimodal", 8192),
    ModelInfo::new("pixtral-12b-2409", "Pixtral 12B", 32768),
    ModelInfo::new("pixtral-large-2411", "Pixtral Large", 32768),
    ModelInfo::new("qwen2.5-coder-32b-instruct", "Qwen2.5 Coder 32B", 32768),
    ModelInfo::new("rtist", "Rtist", 4096),
];

/// Look up a catalog model by id
pub fn find_model(id: &str) -> Option<&'static ModelInfo> {
    MODEL_CATALOG.iter().find(|m| m.id == id)
}

pub fn is_known_model(id: &str) -> bool {
    find_model(id).is_some()
}

/// Use-case groupings of the catalog, matched on id substrings.
/// A model may fall into several categories.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
#[serde(rename_all = "lowercase")]
pub enum ModelCategory {
    General,
    Coding,
    Reasoning,
    Multimodal,
    Efficient,
}

impl ModelCategory {
    pub const ALL: [ModelCategory; 5] = [
        ModelCategory::General,
        ModelCategory::Coding,
        ModelCategory::Reasoning,
        ModelCategory::Multimodal,
        ModelCategory::Efficient,
    ];

    pub fn key(&self) -> &'static str {
        match self {
            ModelCategory::General => "general",
            ModelCategory::Coding => "coding",
            ModelCategory::Reasoning => "reasoning",
            ModelCategory::Multimodal => "multimodal",
            ModelCategory::Efficient => "efficient",
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            ModelCategory::General => "General",
            ModelCategory::Coding => "Coding",
            ModelCategory::Reasoning => "Reasoning",
            ModelCategory::Multimodal => "Multimodal",
            ModelCategory::Efficient => "Efficient",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            ModelCategory::General => "General-purpose models for a variety of tasks",
            ModelCategory::Coding => "Models specialised for programming",
            ModelCategory::Reasoning => "Models specialised for logical reasoning",
            ModelCategory::Multimodal => "Models that process text and images",
            ModelCategory::Efficient => "Small and fast models",
        }
    }

    fn markers(&self) -> &'static [&'static str] {
        match self {
            ModelCategory::General => &["gpt", "deepseek", "mistral-large", "llama"],
            ModelCategory::Coding => &["codestral", "coder", "qwen"],
            ModelCategory::Reasoning => &["reasoning", "grok", "deepseek-r1"],
            ModelCategory::Multimodal => &["pixtral", "phi-4-multilmodal"],
            ModelCategory::Efficient => &["mini", "small", "3b", "8b"],
        }
    }

    pub fn includes(&self, model_id: &str) -> bool {
        self.markers().iter().any(|m| model_id.contains(m))
    }

    /// Catalog models in this category, in catalog order
    pub fn models(&self) -> Vec<&'static ModelInfo> {
        MODEL_CATALOG.iter().filter(|m| self.includes(m.id)).collect()
    }
}
