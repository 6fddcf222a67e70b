//! Case-based-reasoning similarity against previously well-rated sessions.

use crate::domain::feedback::HistoryRecord;
use crate::domain::query::Query;
use crate::learning::round3;

/// Rating at or above which a past session counts as "liked".
pub const LIKED_RATING: f64 = 0.8;

/// How closely the query resembles previously liked sessions of the same
/// use-case, in [0, 1].
///
/// For each liked record sharing the query's use-case, budget locality is
/// `clamp(1 - |b_new - b_old| / b_old, 0, 1)` (both budgets must be positive).
/// The result is the mean over qualifying records, rounded to 3 decimals, or
/// 0.0 when nothing qualifies. A retrieval heuristic, not a learned model.
pub fn calculate_similarity(query: &Query, history: &[HistoryRecord]) -> f64 {
    let mut similarities = Vec::new();

    for record in history {
        if record.use_case != query.use_case || record.rating < LIKED_RATING {
            continue;
        }
        if record.budget > 0.0 && query.budget > 0.0 {
            let similarity = 1.0 - (query.budget - record.budget).abs() / record.budget;
            similarities.push(similarity.clamp(0.0, 1.0));
        }
    }

    if similarities.is_empty() {
        return 0.0;
    }
    round3(similarities.iter().sum::<f64>() / similarities.len() as f64)
}
