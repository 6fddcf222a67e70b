//! In-memory repositories for tests and collaborator-free wiring.

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use async_trait::async_trait;

use advisor_core::domain::feedback::HistoryRecord;
use advisor_core::domain::product::{Product, UpsertOutcome};
use advisor_core::learning::WeightStore;

use super::{CatalogRepository, FeedbackRepository, RepositoryError, WeightRepository};

#[derive(Default)]
pub struct InMemoryCatalogRepository {
    products: Mutex<Vec<Product>>,
}

impl InMemoryCatalogRepository {
    pub fn with_products(products: Vec<Product>) -> Self {
        Self { products: Mutex::new(products) }
    }
}

#[async_trait]
impl CatalogRepository for InMemoryCatalogRepository {
    async fn load_all(&self) -> Result<Vec<Product>, RepositoryError> {
        Ok(self.products.lock().expect("catalog lock").clone())
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<Product>, RepositoryError> {
        let products = self.products.lock().expect("catalog lock");
        Ok(products.iter().find(|p| p.id.as_str() == id).cloned())
    }

    async fn find_by_name_brand(
        &self,
        name: &str,
        brand: &str,
    ) -> Result<Option<Product>, RepositoryError> {
        let products = self.products.lock().expect("catalog lock");
        Ok(products
            .iter()
            .find(|p| p.name.eq_ignore_ascii_case(name) && p.brand.eq_ignore_ascii_case(brand))
            .cloned())
    }

    async fn upsert(&self, product: Product) -> Result<UpsertOutcome, RepositoryError> {
        let mut products = self.products.lock().expect("catalog lock");
        let existing = products.iter_mut().find(|p| {
            p.id == product.id
                || (p.name.eq_ignore_ascii_case(&product.name)
                    && p.brand.eq_ignore_ascii_case(&product.brand))
        });

        match existing {
            None => {
                products.push(product);
                Ok(UpsertOutcome::Created)
            }
            Some(found) => {
                if found.merge_missing(&product) {
                    Ok(UpsertOutcome::Merged)
                } else {
                    Ok(UpsertOutcome::Found)
                }
            }
        }
    }
}

#[derive(Default)]
pub struct InMemoryWeightRepository {
    store: Mutex<WeightStore>,
}

#[async_trait]
impl WeightRepository for InMemoryWeightRepository {
    async fn load_all(&self) -> Result<WeightStore, RepositoryError> {
        Ok(self.store.lock().expect("weights lock").clone())
    }

    async fn save_all(&self, weights: &WeightStore) -> Result<(), RepositoryError> {
        *self.store.lock().expect("weights lock") = weights.clone();
        Ok(())
    }
}

#[derive(Default)]
struct FeedbackState {
    sessions: HashMap<String, (String, f64)>,
    history: Vec<HistoryRecord>,
    favorites: HashSet<(i64, String)>,
}

#[derive(Default)]
pub struct InMemoryFeedbackRepository {
    state: Mutex<FeedbackState>,
}

#[async_trait]
impl FeedbackRepository for InMemoryFeedbackRepository {
    async fn upsert_session(
        &self,
        session_id: &str,
        use_case: &str,
        budget: f64,
    ) -> Result<(), RepositoryError> {
        let mut state = self.state.lock().expect("feedback lock");
        state.sessions.insert(session_id.to_string(), (use_case.to_string(), budget));
        Ok(())
    }

    async fn add_feedback(
        &self,
        session_id: &str,
        _product_id: &str,
        use_case: &str,
        rating: f64,
    ) -> Result<(), RepositoryError> {
        let mut state = self.state.lock().expect("feedback lock");
        let budget = match state.sessions.get(session_id) {
            Some((_, budget)) => *budget,
            None => {
                state
                    .sessions
                    .insert(session_id.to_string(), (use_case.to_string(), 0.0));
                0.0
            }
        };
        state.history.insert(0, HistoryRecord::new(use_case, rating, budget));
        Ok(())
    }

    async fn load_history(&self) -> Result<Vec<HistoryRecord>, RepositoryError> {
        Ok(self.state.lock().expect("feedback lock").history.clone())
    }

    async fn add_favorite(
        &self,
        user_id: i64,
        product_id: &str,
    ) -> Result<bool, RepositoryError> {
        let mut state = self.state.lock().expect("feedback lock");
        Ok(state.favorites.insert((user_id, product_id.to_string())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn in_memory_upsert_mirrors_the_sql_outcomes() {
        let repo = InMemoryCatalogRepository::default();
        let mut product = Product::placeholder("lp-1");
        product.name = "Zephyrus G14".to_string();
        product.brand = "Asus".to_string();

        assert_eq!(repo.upsert(product.clone()).await.unwrap(), UpsertOutcome::Created);
        assert_eq!(repo.upsert(product.clone()).await.unwrap(), UpsertOutcome::Found);

        product.cpu = "Ryzen 9".to_string();
        assert_eq!(repo.upsert(product).await.unwrap(), UpsertOutcome::Merged);
    }

    #[tokio::test]
    async fn implicit_sessions_record_zero_budget() {
        let repo = InMemoryFeedbackRepository::default();
        repo.add_feedback("sess-x", "lp-1", "gaming", 0.9).await.unwrap();

        let history = repo.load_history().await.unwrap();
        assert_eq!(history, vec![HistoryRecord::new("gaming", 0.9, 0.0)]);
    }
}
