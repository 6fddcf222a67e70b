use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One append-only feedback row. Every record references a session, which the
/// persistence layer creates if absent.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FeedbackRecord {
    pub session_id: String,
    pub product_id: String,
    pub use_case: String,
    /// User rating in [0, 1]; >= 0.8 counts as "liked".
    pub rating: f64,
    pub created_at: DateTime<Utc>,
}

/// The slice of feedback history the CBR estimator consumes: the rating plus
/// the budget recorded on the session at feedback time.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct HistoryRecord {
    pub use_case: String,
    pub rating: f64,
    pub budget: f64,
}

impl HistoryRecord {
    pub fn new(use_case: impl Into<String>, rating: f64, budget: f64) -> Self {
        Self { use_case: use_case.into(), rating, budget }
    }
}
