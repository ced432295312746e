//! Session configuration.

use serde::{Deserialize, Serialize};

/// UUID flavour used for new group and filter ids.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IdScheme {
    /// Random.
    #[default]
    V4,
    /// Time-ordered.
    V7,
}

/// Options for a [`RuleBuilder`](crate::RuleBuilder) session.
///
/// Parsed from the JSON the editor passes at startup; every field is optional.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BuilderConfig {
    pub id_scheme: IdScheme,
    /// Queue a reveal event after every successful create.
    pub reveal_on_create: bool,
}

impl Default for BuilderConfig {
    fn default() -> Self {
        Self {
            id_scheme: IdScheme::V4,
            reveal_on_create: true,
        }
    }
}

impl BuilderConfig {
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}
