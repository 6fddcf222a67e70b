pub mod cbr;
pub mod config;
pub mod domain;
pub mod errors;
pub mod hybrid;
pub mod learning;
pub mod normalize;
pub mod ranking;
pub mod rules;
pub mod scoring;

pub use cbr::calculate_similarity;
pub use domain::feedback::{FeedbackRecord, HistoryRecord};
pub use domain::product::{Product, ProductId, UpsertOutcome};
pub use domain::query::{Preferences, PriceTier, Query};
pub use domain::recommendation::Recommendation;
pub use errors::{ApplicationError, DomainError};
pub use hybrid::{AutoAdjustment, ExplanationWriter, HybridEngine, LiveSearch};
pub use learning::{update_weights_from_feedback, WeightProfile, WeightStore};
pub use normalize::normalize_product;
pub use ranking::infer;
pub use scoring::score_candidate;
