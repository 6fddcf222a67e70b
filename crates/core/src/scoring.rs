//! Composite match scoring for one product against one query.

use crate::domain::product::Product;
use crate::domain::query::Query;
use crate::learning::WeightProfile;
use crate::rules::{requirements_for, soft_threshold};

const BRAND_MATCH_FACTOR: f64 = 1.05;
const BRAND_NO_MATCH_FACTOR: f64 = 1.0;

/// Composite score plus the ordered reasons that explain it.
///
/// Three terms enter a weighted average: a budget term ([0, 1], linear penalty
/// that exhausts once the overage reaches 25% of the budget), a use-case fit
/// term ([0, 1], soft-threshold average over the requirement table), and a
/// brand term. The brand term is a 1.0/1.05 multiplier treated as a score, so
/// the composite can marginally exceed 1.0; that asymmetry is intentional.
pub fn score_candidate(
    product: &Product,
    query: &Query,
    weights: &WeightProfile,
) -> (f64, Vec<String>) {
    let mut reasons = Vec::new();

    // Budget term.
    let budget_score = if product.price <= query.budget {
        reasons.push(format!(
            "price within budget (${:.0} <= ${:.0})",
            product.price, query.budget
        ));
        1.0
    } else {
        let over = product.price - query.budget;
        reasons.push(format!("price over budget (+${over:.0})"));
        (1.0 - over / (0.25 * query.budget).max(1.0)).max(0.0)
    };

    // Use-case fit: average soft-threshold satisfaction over the attributes
    // the requirement table names, not over every product attribute.
    let requirements = requirements_for(&query.use_case);
    let mut fit_acc = 0.0;
    for (attribute, minimum) in requirements {
        let value = product.attribute(attribute);
        let satisfaction = soft_threshold(value, *minimum);
        fit_acc += satisfaction;

        if satisfaction >= 1.0 {
            reasons.push(format!("{attribute} meets requirement (value={value} >= min={minimum})"));
        } else if satisfaction == 0.0 {
            reasons.push(format!(
                "{attribute} insufficient (value={value} < 0.8*min={})",
                (0.8 * minimum) as i64
            ));
        } else {
            reasons.push(format!("{attribute} near minimum (value={value}, min={minimum})"));
        }
    }
    let use_case_score =
        if requirements.is_empty() { 1.0 } else { fit_acc / requirements.len() as f64 };

    // Brand preference.
    let brand_matches = query
        .preferred_brand()
        .is_some_and(|preferred| product.brand.eq_ignore_ascii_case(preferred));
    if brand_matches {
        if let Some(preferred) = query.preferred_brand() {
            reasons.push(format!("preferred brand ({preferred})"));
        }
    }
    let brand_factor = if brand_matches { BRAND_MATCH_FACTOR } else { BRAND_NO_MATCH_FACTOR };

    let composite = (weights.budget * budget_score
        + weights.use_case_fit * use_case_score
        + weights.brand_preference * brand_factor)
        / (weights.budget + weights.use_case_fit + weights.brand_preference);

    (composite, reasons)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::product::ProductId;
    use crate::domain::query::Preferences;

    fn product(price: f64) -> Product {
        Product {
            id: ProductId("lp-test".to_string()),
            name: "Vostro 15".to_string(),
            brand: "Dell".to_string(),
            category: "Laptop".to_string(),
            cpu: String::new(),
            gpu: String::new(),
            ram: String::new(),
            storage: String::new(),
            os: String::new(),
            price,
            url: String::new(),
            cpu_score: Some(50.0),
            gpu_score: None,
            ram_gb: Some(8.0),
            storage_gb: None,
        }
    }

    #[test]
    fn price_within_budget_scores_full_budget_term() {
        let query = Query::new("unknown-tag", 1000.0);
        let (score, reasons) = score_candidate(&product(900.0), &query, &WeightProfile::default());

        // Unknown use-case means fit 1.0; no brand preference means factor 1.0
        // weighted 0.3, so composite = (1 + 1 + 0.3) / 2.3 = 1.0.
        assert!((score - 1.0).abs() < 1e-9);
        assert!(reasons[0].contains("within budget"));
    }

    #[test]
    fn budget_penalty_reaches_zero_at_quarter_overage() {
        // price 1000 against budget 800: over = 200 = 0.25 * 800, so the
        // budget term bottoms out at exactly 0.
        let query = Query::new("unknown-tag", 800.0);
        // Only the budget weight active, so the composite equals the term.
        let weights = WeightProfile { budget: 1.0, use_case_fit: 0.0, brand_preference: 0.0 };
        let (score, reasons) = score_candidate(&product(1000.0), &query, &weights);

        assert!(score.abs() < 1e-9);
        assert!(reasons.iter().any(|r| r.contains("+$200")));
    }

    #[test]
    fn zero_budget_is_taken_literally() {
        let query = Query::new("unknown-tag", 0.0);
        let (_, reasons) = score_candidate(&product(100.0), &query, &WeightProfile::default());
        // max(1, 0.25*0) guard keeps the division finite.
        assert!(reasons.iter().any(|r| r.contains("over budget")));
    }

    #[test]
    fn office_requirements_fully_met_scores_unit_fit() {
        // cpu_score 50 >= 45 and ram_gb 8 >= 8: both terms 1.0.
        let query = Query::new("oficina", 1000.0);
        let (score, reasons) = score_candidate(&product(500.0), &query, &WeightProfile::default());

        assert!((score - 1.0).abs() < 1e-9);
        assert!(reasons.iter().any(|r| r.contains("cpu_score meets requirement")));
        assert!(reasons.iter().any(|r| r.contains("ram_gb meets requirement")));
    }

    #[test]
    fn missing_attribute_emits_insufficient_with_the_soft_floor() {
        // gaming requires gpu_score 60; the product has none, which reads 0.
        let query = Query::new("gaming", 2000.0);
        let (_, reasons) = score_candidate(&product(900.0), &query, &WeightProfile::default());

        assert!(reasons.iter().any(|r| r.contains("gpu_score insufficient") && r.contains("48")));
    }

    #[test]
    fn matching_brand_lifts_the_composite_above_the_neutral_score() {
        let query_plain = Query::new("oficina", 1000.0);
        let query_brand = Query::new("oficina", 1000.0).with_preferences(Preferences {
            brand: Some("dell".to_string()),
            ..Default::default()
        });

        let weights = WeightProfile::default();
        let (plain, _) = score_candidate(&product(500.0), &query_plain, &weights);
        let (boosted, reasons) = score_candidate(&product(500.0), &query_brand, &weights);

        assert!(boosted > plain);
        assert!(reasons.iter().any(|r| r.contains("preferred brand")));
        // Known quirk: the multiplier-as-score pushes the composite past 1.0.
        assert!(boosted > 1.0);
    }
}
