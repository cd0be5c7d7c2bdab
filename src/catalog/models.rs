use serde::{Deserialize, Serialize};

/// Envelope returned by the catalog endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BrewingMethodsResponse {
    pub brewing_methods: Vec<BrewingMethod>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct BrewingMethod {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub max_cups: u32,
    pub coffee_grams_per_cup: u32,
    pub water_ml_per_cup: u32,
    #[serde(default)]
    pub grind_size: Option<String>,
    #[serde(default)]
    pub image_url: Option<String>,
    pub steps: Vec<BrewStep>,
    #[serde(default)]
    pub flavor_profiles: Vec<String>,
}

impl BrewingMethod {
    /// Steps in brewing order. The endpoint does not guarantee ordering, and
    /// equal `order` values keep their payload position.
    pub fn sorted_steps(&self) -> Vec<BrewStep> {
        let mut steps = self.steps.clone();
        steps.sort_by_key(|step| step.order);
        steps
    }

    pub fn clamp_cups(&self, cups: u32) -> u32 {
        cups.clamp(1, self.max_cups.max(1))
    }

    pub fn coffee_grams(&self, cups: u32) -> u32 {
        self.coffee_grams_per_cup.saturating_mul(cups)
    }

    pub fn water_ml(&self, cups: u32) -> u32 {
        self.water_ml_per_cup.saturating_mul(cups)
    }

    pub fn has_flavor(&self, flavor: &str) -> bool {
        self.flavor_profiles.iter().any(|tag| tag == flavor)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct BrewStep {
    pub order: i32,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    /// Zero means the step is untimed.
    #[serde(default)]
    pub time_seconds: u32,
    /// Water for a single cup; scaled by the session's cup count.
    #[serde(default)]
    pub water_ml: Option<u32>,
    #[serde(default)]
    pub image_url: Option<String>,
}

impl BrewStep {
    pub fn has_timer(&self) -> bool {
        self.time_seconds > 0
    }
}
