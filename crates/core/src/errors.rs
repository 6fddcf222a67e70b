use thiserror::Error;

/// Violations of core invariants. The engine prefers neutral results over
/// errors wherever the condition is "no data"; these cover the cases where the
/// operation is truly impossible.
#[derive(Clone, Debug, Error, PartialEq)]
pub enum DomainError {
    #[error("rating {0} outside [0, 1]")]
    RatingOutOfRange(f64),
    #[error("domain invariant violation: {0}")]
    InvariantViolation(String),
}

#[derive(Clone, Debug, Error, PartialEq)]
pub enum ApplicationError {
    #[error(transparent)]
    Domain(#[from] DomainError),
    #[error("persistence failure: {0}")]
    Persistence(String),
    #[error("integration failure: {0}")]
    Integration(String),
    #[error("configuration failure: {0}")]
    Configuration(String),
}

impl ApplicationError {
    /// Whether the serving layer should answer with a client error instead of
    /// a 5xx-equivalent.
    pub fn is_client_fault(&self) -> bool {
        matches!(self, Self::Domain(_))
    }
}

/// Validate a feedback rating. Ratings drive both weight adaptation and the
/// liked-record CBR pool, so out-of-range values are rejected at the boundary.
pub fn validate_rating(rating: f64) -> Result<f64, DomainError> {
    if (0.0..=1.0).contains(&rating) {
        Ok(rating)
    } else {
        Err(DomainError::RatingOutOfRange(rating))
    }
}
