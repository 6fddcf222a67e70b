//! Per-use-case scoring weights and the online feedback update rule.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::rules::{DEFAULT_BRAND_WEIGHT, DEFAULT_BUDGET_WEIGHT, DEFAULT_USE_CASE_WEIGHT};

pub const DEFAULT_LEARNING_RATE: f64 = 0.05;
pub const WEIGHT_FLOOR: f64 = 0.05;
pub const WEIGHT_CEILING: f64 = 2.5;

/// Sentinel use-case whose profile always exists.
pub const DEFAULT_USE_CASE: &str = "default";

/// Relative influence of the three scoring terms for one use-case.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct WeightProfile {
    pub budget: f64,
    pub use_case_fit: f64,
    pub brand_preference: f64,
}

impl Default for WeightProfile {
    fn default() -> Self {
        Self {
            budget: DEFAULT_BUDGET_WEIGHT,
            use_case_fit: DEFAULT_USE_CASE_WEIGHT,
            brand_preference: DEFAULT_BRAND_WEIGHT,
        }
    }
}

impl WeightProfile {
    /// Round every weight to 3 decimals, the persisted precision.
    pub fn rounded(mut self) -> Self {
        self.budget = round3(self.budget);
        self.use_case_fit = round3(self.use_case_fit);
        self.brand_preference = round3(self.brand_preference);
        self
    }
}

/// Use-case keyed weight profiles. The `"default"` profile is created lazily
/// on first read so one always exists.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct WeightStore {
    profiles: BTreeMap<String, WeightProfile>,
}

impl WeightStore {
    pub fn new() -> Self {
        let mut store = Self { profiles: BTreeMap::new() };
        store.ensure_default();
        store
    }

    pub fn from_profiles(profiles: BTreeMap<String, WeightProfile>) -> Self {
        let mut store = Self { profiles };
        store.ensure_default();
        store
    }

    fn ensure_default(&mut self) {
        self.profiles.entry(DEFAULT_USE_CASE.to_string()).or_default();
    }

    /// Profile used to score a query for `use_case`; missing profiles resolve
    /// to the defaults without being created.
    pub fn resolve(&self, use_case: &str) -> WeightProfile {
        self.profiles.get(use_case).copied().unwrap_or_default()
    }

    pub fn get(&self, use_case: &str) -> Option<&WeightProfile> {
        self.profiles.get(use_case)
    }

    pub fn insert(&mut self, use_case: impl Into<String>, profile: WeightProfile) {
        self.profiles.insert(use_case.into(), profile);
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &WeightProfile)> {
        self.profiles.iter()
    }

    pub fn len(&self) -> usize {
        self.profiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.profiles.is_empty()
    }
}

/// Bounded gradient-free online update from one feedback rating.
///
/// `adjust` maps the [0, 1] rating onto [-1, 1]; every weight of the rated
/// use-case moves by `lr * adjust`, clamped to [0.05, 2.5] and rounded to
/// 3 decimals. A rating of exactly 0.5 leaves the profile untouched.
pub fn update_weights_from_feedback(
    weights: &mut WeightStore,
    use_case: &str,
    rating: f64,
    learning_rate: f64,
) -> WeightProfile {
    let mut profile = weights.resolve(use_case);
    let adjust = (rating - 0.5) * 2.0;

    profile.budget = nudge(profile.budget, learning_rate, adjust);
    profile.use_case_fit = nudge(profile.use_case_fit, learning_rate, adjust);
    profile.brand_preference = nudge(profile.brand_preference, learning_rate, adjust);

    weights.insert(use_case.to_string(), profile);
    profile
}

fn nudge(weight: f64, learning_rate: f64, adjust: f64) -> f64 {
    round3((weight + learning_rate * adjust).clamp(WEIGHT_FLOOR, WEIGHT_CEILING))
}

pub(crate) fn round3(value: f64) -> f64 {
    (value * 1000.0).round() / 1000.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn store_always_contains_the_default_profile() {
        let store = WeightStore::new();
        assert!(store.get(DEFAULT_USE_CASE).is_some());

        let store = WeightStore::from_profiles(BTreeMap::new());
        assert_eq!(store.resolve(DEFAULT_USE_CASE), WeightProfile::default());
    }

    #[test]
    fn positive_feedback_moves_all_three_weights_up() {
        let mut store = WeightStore::new();
        let updated = update_weights_from_feedback(&mut store, "gaming", 1.0, 0.05);

        assert_eq!(updated.budget, 1.05);
        assert_eq!(updated.use_case_fit, 1.05);
        assert_eq!(updated.brand_preference, 0.35);
    }

    #[test]
    fn negative_feedback_moves_all_three_weights_down() {
        let mut store = WeightStore::new();
        let updated = update_weights_from_feedback(&mut store, "gaming", 0.0, 0.05);

        assert_eq!(updated.budget, 0.95);
        assert_eq!(updated.use_case_fit, 0.95);
        assert_eq!(updated.brand_preference, 0.25);
    }

    #[test]
    fn neutral_rating_leaves_weights_unchanged() {
        let mut store = WeightStore::new();
        let updated = update_weights_from_feedback(&mut store, "oficina", 0.5, 0.05);
        assert_eq!(updated, WeightProfile::default());
    }

    #[test]
    fn weights_are_bounded_by_floor_and_ceiling() {
        let mut store = WeightStore::new();
        store.insert(
            "gaming",
            WeightProfile { budget: 2.49, use_case_fit: 2.5, brand_preference: 0.06 },
        );

        let up = update_weights_from_feedback(&mut store, "gaming", 1.0, 0.05);
        assert_eq!(up.budget, WEIGHT_CEILING);
        assert_eq!(up.use_case_fit, WEIGHT_CEILING);

        let down = update_weights_from_feedback(&mut store, "gaming", 0.0, 0.5);
        assert_eq!(down.brand_preference, WEIGHT_FLOOR);
    }

    #[test]
    fn rounding_is_stable_after_one_pass() {
        let profile =
            WeightProfile { budget: 1.23456, use_case_fit: 0.99999, brand_preference: 0.3004 };
        let once = profile.rounded();
        assert_eq!(once, once.rounded());
        assert_eq!(once.budget, 1.235);
        assert_eq!(once.use_case_fit, 1.0);
        assert_eq!(once.brand_preference, 0.3);
    }
}
