use async_trait::async_trait;
use thiserror::Error;

use advisor_core::domain::feedback::HistoryRecord;
use advisor_core::domain::product::{Product, UpsertOutcome};
use advisor_core::learning::WeightStore;

pub mod catalog;
pub mod feedback;
pub mod memory;
pub mod weights;

pub use catalog::SqlCatalogRepository;
pub use feedback::SqlFeedbackRepository;
pub use memory::{InMemoryCatalogRepository, InMemoryFeedbackRepository, InMemoryWeightRepository};
pub use weights::SqlWeightRepository;

#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("decode error: {0}")]
    Decode(String),
}

/// The product catalog. `upsert` merges rather than overwrites: blanks and
/// placeholder identities fill in, known-good data stays.
#[async_trait]
pub trait CatalogRepository: Send + Sync {
    async fn load_all(&self) -> Result<Vec<Product>, RepositoryError>;
    async fn find_by_id(&self, id: &str) -> Result<Option<Product>, RepositoryError>;
    async fn find_by_name_brand(
        &self,
        name: &str,
        brand: &str,
    ) -> Result<Option<Product>, RepositoryError>;
    async fn upsert(&self, product: Product) -> Result<UpsertOutcome, RepositoryError>;
}

/// Learned weight profiles keyed by use-case. Last-writer-wins per row.
#[async_trait]
pub trait WeightRepository: Send + Sync {
    async fn load_all(&self) -> Result<WeightStore, RepositoryError>;
    async fn save_all(&self, weights: &WeightStore) -> Result<(), RepositoryError>;
}

/// Sessions, the append-only feedback log, and favorites.
#[async_trait]
pub trait FeedbackRepository: Send + Sync {
    /// Create or refresh a session row.
    async fn upsert_session(
        &self,
        session_id: &str,
        use_case: &str,
        budget: f64,
    ) -> Result<(), RepositoryError>;

    /// Append a feedback row, creating the referenced session if absent.
    async fn add_feedback(
        &self,
        session_id: &str,
        product_id: &str,
        use_case: &str,
        rating: f64,
    ) -> Result<(), RepositoryError>;

    /// Feedback history joined with the budget recorded on each session,
    /// newest first. This is the CBR retrieval pool.
    async fn load_history(&self) -> Result<Vec<HistoryRecord>, RepositoryError>;

    /// Mark a product as a user favorite. Returns false when it already was.
    async fn add_favorite(&self, user_id: i64, product_id: &str)
        -> Result<bool, RepositoryError>;
}
