use sqlx::Row;

use advisor_core::domain::feedback::HistoryRecord;

use super::{FeedbackRepository, RepositoryError};
use crate::DbPool;

pub struct SqlFeedbackRepository {
    pool: DbPool,
}

impl SqlFeedbackRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    async fn ensure_session(&self, session_id: &str, use_case: &str) -> Result<(), RepositoryError> {
        // Budget 0 on implicitly created sessions: the CBR estimator skips
        // non-positive budgets, so these rows never pollute the pool.
        sqlx::query(
            "INSERT INTO sessions (session_id, use_case, budget)
             VALUES (?, ?, 0)
             ON CONFLICT(session_id) DO NOTHING",
        )
        .bind(session_id)
        .bind(use_case)
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}

#[async_trait::async_trait]
impl FeedbackRepository for SqlFeedbackRepository {
    async fn upsert_session(
        &self,
        session_id: &str,
        use_case: &str,
        budget: f64,
    ) -> Result<(), RepositoryError> {
        sqlx::query(
            "INSERT INTO sessions (session_id, use_case, budget)
             VALUES (?, ?, ?)
             ON CONFLICT(session_id) DO UPDATE SET
                use_case = excluded.use_case,
                budget = excluded.budget",
        )
        .bind(session_id)
        .bind(use_case)
        .bind(budget)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn add_feedback(
        &self,
        session_id: &str,
        product_id: &str,
        use_case: &str,
        rating: f64,
    ) -> Result<(), RepositoryError> {
        self.ensure_session(session_id, use_case).await?;
        sqlx::query(
            "INSERT INTO feedback (session_id, product_id, use_case, rating)
             VALUES (?, ?, ?, ?)",
        )
        .bind(session_id)
        .bind(product_id)
        .bind(use_case)
        .bind(rating)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn load_history(&self) -> Result<Vec<HistoryRecord>, RepositoryError> {
        let rows = sqlx::query(
            "SELECT f.use_case, f.rating, COALESCE(s.budget, 0) AS budget
             FROM feedback f
             LEFT JOIN sessions s ON s.session_id = f.session_id
             ORDER BY f.id DESC",
        )
        .fetch_all(&self.pool)
        .await?;

        rows.iter()
            .map(|row| {
                let decode = |e: sqlx::Error| RepositoryError::Decode(e.to_string());
                Ok(HistoryRecord {
                    use_case: row.try_get("use_case").map_err(decode)?,
                    rating: row.try_get("rating").map_err(decode)?,
                    budget: row.try_get("budget").map_err(decode)?,
                })
            })
            .collect()
    }

    async fn add_favorite(
        &self,
        user_id: i64,
        product_id: &str,
    ) -> Result<bool, RepositoryError> {
        let result = sqlx::query(
            "INSERT INTO favorites (user_id, product_id)
             VALUES (?, ?)
             ON CONFLICT(user_id, product_id) DO NOTHING",
        )
        .bind(user_id)
        .bind(product_id)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }
}

#[cfg(test)]
mod tests {
    use advisor_core::domain::product::Product;

    use super::*;
    use crate::repositories::{CatalogRepository, SqlCatalogRepository};
    use crate::{connect_with_settings, migrations, DbPool};

    async fn pool() -> DbPool {
        let pool = connect_with_settings("sqlite::memory:", 1, 30).await.expect("connect");
        migrations::run_pending(&pool).await.expect("migrate");
        pool
    }

    async fn seed_product(pool: &DbPool, id: &str) {
        let mut product = Product::placeholder(id);
        product.name = format!("Laptop {id}");
        product.brand = "Acme".to_string();
        SqlCatalogRepository::new(pool.clone()).upsert(product).await.expect("seed product");
    }

    #[tokio::test]
    async fn feedback_creates_the_session_when_absent() {
        let pool = pool().await;
        seed_product(&pool, "lp-1").await;
        let repo = SqlFeedbackRepository::new(pool.clone());

        repo.add_feedback("sess-implicit", "lp-1", "gaming", 0.9).await.expect("add feedback");

        let history = repo.load_history().await.expect("history");
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].use_case, "gaming");
        assert_eq!(history[0].budget, 0.0);
    }

    #[tokio::test]
    async fn history_carries_the_budget_recorded_on_the_session() {
        let pool = pool().await;
        seed_product(&pool, "lp-2").await;
        let repo = SqlFeedbackRepository::new(pool);

        repo.upsert_session("sess-1", "oficina", 650.0).await.expect("session");
        repo.add_feedback("sess-1", "lp-2", "oficina", 1.0).await.expect("feedback");

        let history = repo.load_history().await.expect("history");
        assert_eq!(history, vec![HistoryRecord::new("oficina", 1.0, 650.0)]);
    }

    #[tokio::test]
    async fn newest_feedback_comes_first() {
        let pool = pool().await;
        seed_product(&pool, "lp-3").await;
        let repo = SqlFeedbackRepository::new(pool);

        repo.upsert_session("sess-old", "gaming", 700.0).await.expect("session");
        repo.add_feedback("sess-old", "lp-3", "gaming", 0.4).await.expect("old");
        repo.upsert_session("sess-new", "gaming", 900.0).await.expect("session");
        repo.add_feedback("sess-new", "lp-3", "gaming", 0.9).await.expect("new");

        let history = repo.load_history().await.expect("history");
        assert_eq!(history[0].budget, 900.0);
    }

    #[tokio::test]
    async fn duplicate_favorites_are_skipped() {
        let pool = pool().await;
        seed_product(&pool, "lp-4").await;
        let repo = SqlFeedbackRepository::new(pool);

        assert!(repo.add_favorite(7, "lp-4").await.expect("first"));
        assert!(!repo.add_favorite(7, "lp-4").await.expect("duplicate"));
        assert!(repo.add_favorite(8, "lp-4").await.expect("other user"));
    }
}
