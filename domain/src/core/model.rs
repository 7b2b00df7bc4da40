//! Model identifier value objects.
//!
//! Council members are addressed by their provider-registry id (for example
//! `gpt-5.2` or `z-ai/glm-4.5-air:free`). The id is an opaque key: which
//! provider serves it is decided once at configuration time by the routing
//! table, never inferred from the string at call time.

use serde::{Deserialize, Serialize};

/// Identifier of an LLM that can sit on the council (Value Object)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ModelId(String);

impl ModelId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Short display name: the last path segment without a `:variant` suffix.
    ///
    /// E.g. `"z-ai/glm-4.5-air:free"` -> `"glm-4.5-air"`.
    pub fn short_name(&self) -> &str {
        let tail = self.0.rsplit('/').next().unwrap_or(&self.0);
        tail.split(':').next().unwrap_or(tail)
    }
}

impl std::fmt::Display for ModelId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for ModelId {
    fn from(s: &str) -> Self {
        ModelId::new(s)
    }
}

impl From<String> for ModelId {
    fn from(s: String) -> Self {
        ModelId::new(s)
    }
}

/// Roster entry describing an available model.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelInfo {
    pub id: ModelId,
    /// Human-friendly name (short form of the id)
    pub name: String,
    /// Provider serving this model (e.g. "openai", "openrouter")
    pub provider: String,
    /// Whether this model is the configured chairman
    pub is_chairman: bool,
}

impl ModelInfo {
    pub fn new(id: impl Into<ModelId>, provider: impl Into<String>) -> Self {
        let id = id.into();
        let name = id.short_name().to_string();
        Self {
            id,
            name,
            provider: provider.into(),
            is_chairman: false,
        }
    }

    pub fn as_chairman(mut self) -> Self {
        self.is_chairman = true;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_name_plain() {
        let model = ModelId::new("gpt-5.2");
        assert_eq!(model.short_name(), "gpt-5.2");
    }

    #[test]
    fn test_short_name_registry_path() {
        let model = ModelId::new("z-ai/glm-4.5-air:free");
        assert_eq!(model.short_name(), "glm-4.5-air");
    }

    #[test]
    fn test_serde_transparent() {
        let model = ModelId::new("deepseek/deepseek-r1-0528:free");
        let json = serde_json::to_string(&model).unwrap();
        assert_eq!(json, "\"deepseek/deepseek-r1-0528:free\"");
        let back: ModelId = serde_json::from_str(&json).unwrap();
        assert_eq!(back, model);
    }

    #[test]
    fn test_model_info_chairman_flag() {
        let info = ModelInfo::new("gpt-5.2", "openai").as_chairman();
        assert!(info.is_chairman);
        assert_eq!(info.name, "gpt-5.2");
    }
}
