//! OpenAI model definitions.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// OpenAI chat models the agent is known to work with.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash, Display, EnumString)]
pub enum OpenAiModel {
    #[strum(serialize = "gpt-4o")]
    Gpt4o,
    #[strum(serialize = "gpt-4o-mini")]
    Gpt4oMini,
    #[strum(serialize = "gpt-4-turbo")]
    Gpt4Turbo,
    #[strum(serialize = "gpt-4.1")]
    Gpt41,
    #[strum(serialize = "gpt-4.1-mini")]
    Gpt41Mini,
    #[strum(serialize = "o3-mini")]
    O3Mini,
    #[strum(serialize = "o4-mini")]
    O4Mini,
    /// Custom/unknown OpenAI model by ID.
    #[strum(default)]
    Custom(String),
}

impl OpenAiModel {
    /// Get the API model identifier.
    pub fn as_str(&self) -> &str {
        match self {
            Self::Gpt4o => "gpt-4o",
            Self::Gpt4oMini => "gpt-4o-mini",
            Self::Gpt4Turbo => "gpt-4-turbo",
            Self::Gpt41 => "gpt-4.1",
            Self::Gpt41Mini => "gpt-4.1-mini",
            Self::O3Mini => "o3-mini",
            Self::O4Mini => "o4-mini",
            Self::Custom(s) => s,
        }
    }

    /// Whether this is a reasoning model.
    pub fn is_reasoning(&self) -> bool {
        matches!(self, Self::O3Mini | Self::O4Mini)
    }

    /// Reasoning models reject sampling parameters such as `temperature`.
    pub fn supports_temperature(&self) -> bool {
        !self.is_reasoning()
    }
}

impl Default for OpenAiModel {
    fn default() -> Self {
        Self::Gpt4o
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_known_and_custom_ids() {
        assert_eq!("gpt-4o".parse::<OpenAiModel>().unwrap(), OpenAiModel::Gpt4o);
        let custom: OpenAiModel = "my-deployment".parse().unwrap();
        assert_eq!(custom, OpenAiModel::Custom("my-deployment".into()));
        assert_eq!(custom.as_str(), "my-deployment");
    }

    #[test]
    fn reasoning_models_drop_temperature() {
        assert!(OpenAiModel::Gpt4o.supports_temperature());
        assert!(!OpenAiModel::O4Mini.supports_temperature());
    }
}
