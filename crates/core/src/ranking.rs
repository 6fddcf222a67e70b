//! Local ranking engine: filter, score, blend, sort, truncate.

use uuid::Uuid;

use crate::cbr::calculate_similarity;
use crate::domain::feedback::HistoryRecord;
use crate::domain::product::Product;
use crate::domain::query::Query;
use crate::domain::recommendation::Recommendation;
use crate::learning::WeightStore;
use crate::rules::price_range_for_tier;
use crate::scoring::score_candidate;

/// Share of the composite coming from the rule-based scorer; the remainder is
/// the CBR similarity signal.
const SCORE_BLEND: f64 = 0.8;
const CBR_BLEND: f64 = 0.2;

/// Rank the catalog for a query. Pure: all inputs are fetched by the caller.
///
/// Tier pre-filter falls back to the unfiltered catalog when the bucket is
/// empty, so a recognized tier never yields an empty result by itself. Sorting
/// is stable descending by blended score; ties keep catalog order. All results
/// carry one freshly generated session id.
pub fn infer(
    query: &Query,
    catalog: &[Product],
    weights: &WeightStore,
    history: &[HistoryRecord],
) -> Vec<Recommendation> {
    let (low, high) = price_range_for_tier(query.tier);
    let mut candidates: Vec<&Product> =
        catalog.iter().filter(|p| p.price >= low && p.price <= high).collect();
    if candidates.is_empty() {
        candidates = catalog.iter().collect();
    }

    let profile = weights.resolve(&query.use_case);
    let cbr_similarity = calculate_similarity(query, history);
    let session_id = Uuid::new_v4().to_string();

    let mut scored: Vec<Recommendation> = candidates
        .into_iter()
        .map(|product| {
            let (score, mut reasons) = score_candidate(product, query, &profile);
            let total = SCORE_BLEND * score + CBR_BLEND * cbr_similarity;
            reasons.push(format!(
                "CBR adjustment (+{}% similarity to previous cases)",
                (cbr_similarity * 100.0).round() as i64
            ));
            Recommendation {
                product: product.clone(),
                score: round4(total),
                reasons,
                session_id: session_id.clone(),
            }
        })
        .collect();

    // sort_by is stable, so equal scores preserve catalog order.
    scored.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
    scored.truncate(query.bounded_top_k());
    scored
}

fn round4(value: f64) -> f64 {
    (value * 10_000.0).round() / 10_000.0
}
