use serde::{Deserialize, Serialize};

pub const DEFAULT_TOP_K: usize = 3;
pub const MAX_TOP_K: usize = 10;

/// Coarse price bracket used as a catalog pre-filter, independent of scoring.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PriceTier {
    Low,
    Medium,
    High,
}

impl PriceTier {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "low" | "baja" => Some(Self::Low),
            "medium" | "media" => Some(Self::Medium),
            "high" | "alta" => Some(Self::High),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Preferences {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub brand: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub os: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub portability: Option<bool>,
}

/// A recommendation request. `use_case` drives the requirement-table and
/// weight-profile lookup; unrecognized tags score as unconstrained.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Query {
    pub use_case: String,
    pub budget: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tier: Option<PriceTier>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preferences: Option<Preferences>,
    #[serde(default = "default_top_k")]
    pub top_k: usize,
}

fn default_top_k() -> usize {
    DEFAULT_TOP_K
}

impl Query {
    pub fn new(use_case: impl Into<String>, budget: f64) -> Self {
        Self {
            use_case: use_case.into(),
            budget,
            tier: None,
            preferences: None,
            top_k: DEFAULT_TOP_K,
        }
    }

    pub fn with_tier(mut self, tier: PriceTier) -> Self {
        self.tier = Some(tier);
        self
    }

    pub fn with_preferences(mut self, preferences: Preferences) -> Self {
        self.preferences = Some(preferences);
        self
    }

    pub fn with_top_k(mut self, top_k: usize) -> Self {
        self.top_k = top_k;
        self
    }

    /// Result count bounded to [1, 10] regardless of what the caller asked for.
    pub fn bounded_top_k(&self) -> usize {
        self.top_k.clamp(1, MAX_TOP_K)
    }

    pub fn preferred_brand(&self) -> Option<&str> {
        self.preferences
            .as_ref()
            .and_then(|p| p.brand.as_deref())
            .filter(|brand| !brand.is_empty())
    }
}
