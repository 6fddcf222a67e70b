//! Hybrid inference: live collaborator results preferred, local engine as the
//! fallback, with deterministic auto-adjustment of under-provisioned requests.

use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::feedback::HistoryRecord;
use crate::domain::product::Product;
use crate::domain::query::{Preferences, PriceTier, Query};
use crate::domain::recommendation::Recommendation;
use crate::learning::WeightStore;
use crate::ranking::infer;

/// Externally sourced candidate search. Implementations must return an empty
/// vector on any failure (missing credential, timeout, malformed response) so
/// the local fallback engages silently.
#[async_trait]
pub trait LiveSearch: Send + Sync {
    async fn search(
        &self,
        use_case: &str,
        budget: f64,
        preferences: Option<&Preferences>,
    ) -> Vec<(Product, Option<String>)>;
}

/// Short natural-language justification writer. On failure implementations
/// return a degraded-but-valid string instead of raising.
#[async_trait]
pub trait ExplanationWriter: Send + Sync {
    async fn summarize(&self, name: &str, reasons: &[String], use_case: &str) -> String;
}

#[async_trait]
impl<T: LiveSearch + ?Sized> LiveSearch for std::sync::Arc<T> {
    async fn search(
        &self,
        use_case: &str,
        budget: f64,
        preferences: Option<&Preferences>,
    ) -> Vec<(Product, Option<String>)> {
        (**self).search(use_case, budget, preferences).await
    }
}

#[async_trait]
impl<T: ExplanationWriter + ?Sized> ExplanationWriter for std::sync::Arc<T> {
    async fn summarize(&self, name: &str, reasons: &[String], use_case: &str) -> String {
        (**self).summarize(name, reasons, use_case).await
    }
}

/// Auto-adjustment floors per keyword group. The listed order is the
/// tie-break for overlapping keyword sets.
const ADJUSTMENT_RULES: &[AdjustmentRule] = &[
    AdjustmentRule {
        keywords: &["gaming", "game", "juego"],
        trigger_below: 500.0,
        floor: 700.0,
        tier: TierNudge::MediumIfUnsetOrLow,
    },
    AdjustmentRule {
        keywords: &[
            "edicion", "editing", "edit", "diseno", "diseño", "design", "render", "arquitectura",
            "architecture",
        ],
        trigger_below: 400.0,
        floor: 600.0,
        tier: TierNudge::MediumIfUnsetOrLow,
    },
    AdjustmentRule {
        keywords: &["program", "dev", "codigo", "code"],
        trigger_below: 350.0,
        floor: 500.0,
        tier: TierNudge::MediumIfUnsetOrLow,
    },
    AdjustmentRule {
        keywords: &["oficina", "office", "trabajo", "work", "estudio", "study", "universidad"],
        trigger_below: 250.0,
        floor: 400.0,
        tier: TierNudge::LowIfUnset,
    },
];

/// Baseline floor applied when no keyword group matches.
const FALLBACK_RULE: AdjustmentRule = AdjustmentRule {
    keywords: &[],
    trigger_below: 180.0,
    floor: 250.0,
    tier: TierNudge::LowIfUnset,
};

struct AdjustmentRule {
    keywords: &'static [&'static str],
    trigger_below: f64,
    floor: f64,
    tier: TierNudge,
}

#[derive(Clone, Copy)]
enum TierNudge {
    MediumIfUnsetOrLow,
    LowIfUnset,
}

/// Record of what the auto-adjustment changed, for the informational card.
#[derive(Clone, Debug, PartialEq)]
pub struct AutoAdjustment {
    pub budget_before: f64,
    pub budget_after: f64,
    pub tier_before: Option<PriceTier>,
    pub tier_after: Option<PriceTier>,
}

impl AutoAdjustment {
    /// Raise the query's budget and tier to the functional floors for its
    /// use-case. First keyword group to match wins. Returns `None` when
    /// nothing changed.
    pub fn apply(query: &mut Query) -> Option<Self> {
        let use_case = query.use_case.to_lowercase();
        let rule = ADJUSTMENT_RULES
            .iter()
            .find(|rule| rule.keywords.iter().any(|kw| use_case.contains(kw)))
            .unwrap_or(&FALLBACK_RULE);

        if query.budget >= rule.trigger_below {
            return None;
        }

        let budget_before = query.budget;
        let tier_before = query.tier;
        query.budget = rule.floor;
        query.tier = match (rule.tier, tier_before) {
            (TierNudge::MediumIfUnsetOrLow, None | Some(PriceTier::Low)) => Some(PriceTier::Medium),
            (TierNudge::LowIfUnset, None) => Some(PriceTier::Low),
            (_, tier) => tier,
        };

        Some(Self {
            budget_before,
            budget_after: query.budget,
            tier_before,
            tier_after: query.tier,
        })
    }

    pub fn note(&self) -> String {
        let mut changes = vec![format!(
            "budget from ${:.0} to ${:.0}",
            self.budget_before, self.budget_after
        )];
        if self.tier_after != self.tier_before {
            changes.push(format!(
                "tier from '{}' to '{}'",
                self.tier_before.map(|t| t.as_str()).unwrap_or("unspecified"),
                self.tier_after.map(|t| t.as_str()).unwrap_or("unspecified"),
            ));
        }
        format!("Automatic adjustment applied: {}.", changes.join(" and "))
    }
}

/// Serves `infer_hybrid`: live collaborator first, local ranking otherwise.
pub struct HybridEngine<S, W> {
    live_search: S,
    explanation: W,
}

impl<S: LiveSearch, W: ExplanationWriter> HybridEngine<S, W> {
    pub fn new(live_search: S, explanation: W) -> Self {
        Self { live_search, explanation }
    }

    /// Hybrid inference. Applies the auto-adjustment floors, prefers live
    /// candidates, and falls back to the local engine when the collaborator
    /// returns nothing. When a floor was applied, one informational
    /// pseudo-result precedes the product results.
    pub async fn infer_hybrid(
        &self,
        query: &Query,
        catalog: &[Product],
        weights: &WeightStore,
        history: &[HistoryRecord],
    ) -> Vec<Recommendation> {
        let mut adjusted = query.clone();
        let adjustment = AutoAdjustment::apply(&mut adjusted);

        let live = self
            .live_search
            .search(&adjusted.use_case, adjusted.budget, adjusted.preferences.as_ref())
            .await;

        if live.is_empty() {
            let mut results = infer(&adjusted, catalog, weights, history);
            if let Some(adjustment) = adjustment {
                let session_id = results
                    .first()
                    .map(|r| r.session_id.clone())
                    .unwrap_or_else(|| Uuid::new_v4().to_string());
                results.insert(0, Recommendation::info_card(&session_id, adjustment.note()));
            }
            return results;
        }

        let session_id = Uuid::new_v4().to_string();
        let mut results = Vec::new();
        if let Some(adjustment) = &adjustment {
            results.push(Recommendation::info_card(&session_id, adjustment.note()));
        }

        for (product, description) in live.into_iter().take(adjusted.bounded_top_k()) {
            let raw_reasons = vec![description
                .unwrap_or_else(|| "Recommendation sourced from live search.".to_string())];
            let explanation = self
                .explanation
                .summarize(&product.name, &raw_reasons, &adjusted.use_case)
                .await;
            results.push(Recommendation {
                product,
                score: 1.0,
                reasons: vec![explanation],
                session_id: session_id.clone(),
            });
        }

        results
    }
}
