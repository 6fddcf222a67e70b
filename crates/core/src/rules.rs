//! Static per-use-case minimum requirements and scoring rule primitives.

use crate::domain::query::PriceTier;

/// Minimum numeric requirements per use-case tag. Attribute names match
/// [`crate::domain::product::Product::attribute`]. Not every attribute applies
/// to every use-case; tags absent from this table score as unconstrained.
pub const USE_CASE_MIN_REQ: &[(&str, &[(&str, f64)])] = &[
    ("gaming", &[("gpu_score", 60.0), ("ram_gb", 16.0), ("cpu_score", 65.0)]),
    ("edicion", &[("cpu_score", 70.0), ("ram_gb", 16.0), ("storage_gb", 512.0)]),
    ("oficina", &[("cpu_score", 45.0), ("ram_gb", 8.0)]),
    ("programacion", &[("cpu_score", 60.0), ("ram_gb", 16.0)]),
    ("movilidad", &[("ram_gb", 8.0)]),
    ("diseno", &[("gpu_score", 60.0), ("ram_gb", 16.0), ("cpu_score", 70.0)]),
];

pub const DEFAULT_BUDGET_WEIGHT: f64 = 1.0;
pub const DEFAULT_USE_CASE_WEIGHT: f64 = 1.0;
pub const DEFAULT_BRAND_WEIGHT: f64 = 0.3;

/// Requirement mapping for a use-case; empty for unknown tags.
pub fn requirements_for(use_case: &str) -> &'static [(&'static str, f64)] {
    USE_CASE_MIN_REQ
        .iter()
        .find(|(tag, _)| *tag == use_case)
        .map(|(_, reqs)| *reqs)
        .unwrap_or(&[])
}

/// Graded satisfaction of `value` against `min_required`.
///
/// A soft margin below the minimum avoids a hard cliff: anything at or above
/// the minimum is fully satisfied, anything below 80% of it fails outright,
/// and the band in between interpolates linearly.
pub fn soft_threshold(value: f64, min_required: f64) -> f64 {
    if min_required <= 0.0 {
        return 1.0;
    }
    if value < 0.8 * min_required {
        return 0.0;
    }
    if value >= min_required {
        return 1.0;
    }
    (value - 0.8 * min_required) / (0.2 * min_required)
}

/// Price bracket for a tier. Used only as a pre-filter, never a scoring term.
pub fn price_range_for_tier(tier: Option<PriceTier>) -> (f64, f64) {
    match tier {
        Some(PriceTier::Low) => (300.0, 700.0),
        Some(PriceTier::Medium) => (700.0, 1200.0),
        Some(PriceTier::High) => (1200.0, 3000.0),
        None => (0.0, f64::INFINITY),
    }
}
