use serde::{Deserialize, Serialize};

use super::product::Product;

/// A scored candidate returned from a ranking pass. Ephemeral: produced per
/// call and only cached as a read-through convenience by the serving layer.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Recommendation {
    pub product: Product,
    /// Composite score, nominally in [0, 1]. The brand-preference term is a
    /// 1.0/1.05 multiplier mixed into the weighted average, so the value can
    /// slightly exceed what pure [0, 1] terms would produce.
    pub score: f64,
    pub reasons: Vec<String>,
    pub session_id: String,
}

impl Recommendation {
    /// Informational pseudo-result emitted ahead of real results when the
    /// hybrid engine adjusted the request. Zero price, sentinel id.
    pub fn info_card(session_id: &str, note: String) -> Self {
        let mut product = Product::placeholder("auto-adjust-info");
        product.name = "Automatic Adjustment".to_string();
        product.brand = "advisor".to_string();
        product.category = "Information".to_string();
        Self { product, score: 1.0, reasons: vec![note], session_id: session_id.to_string() }
    }

    pub fn is_info_card(&self) -> bool {
        self.product.id.as_str() == "auto-adjust-info"
    }
}
