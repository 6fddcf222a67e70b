use std::collections::BTreeMap;

use sqlx::Row;

use advisor_core::learning::{WeightProfile, WeightStore};

use super::{RepositoryError, WeightRepository};
use crate::DbPool;

pub struct SqlWeightRepository {
    pool: DbPool,
}

impl SqlWeightRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait::async_trait]
impl WeightRepository for SqlWeightRepository {
    async fn load_all(&self) -> Result<WeightStore, RepositoryError> {
        let rows = sqlx::query(
            "SELECT use_case, w_budget, w_use_case, w_brand_preference FROM weights",
        )
        .fetch_all(&self.pool)
        .await?;

        let mut profiles = BTreeMap::new();
        for row in rows {
            let decode = |e: sqlx::Error| RepositoryError::Decode(e.to_string());
            let use_case: String = row.try_get("use_case").map_err(decode)?;
            profiles.insert(
                use_case,
                WeightProfile {
                    budget: row.try_get("w_budget").map_err(decode)?,
                    use_case_fit: row.try_get("w_use_case").map_err(decode)?,
                    brand_preference: row.try_get("w_brand_preference").map_err(decode)?,
                },
            );
        }

        // from_profiles guarantees the "default" profile exists.
        Ok(WeightStore::from_profiles(profiles))
    }

    async fn save_all(&self, weights: &WeightStore) -> Result<(), RepositoryError> {
        for (use_case, profile) in weights.iter() {
            let rounded = profile.rounded();
            sqlx::query(
                "INSERT INTO weights (use_case, w_budget, w_use_case, w_brand_preference)
                 VALUES (?, ?, ?, ?)
                 ON CONFLICT(use_case) DO UPDATE SET
                    w_budget = excluded.w_budget,
                    w_use_case = excluded.w_use_case,
                    w_brand_preference = excluded.w_brand_preference",
            )
            .bind(use_case)
            .bind(rounded.budget)
            .bind(rounded.use_case_fit)
            .bind(rounded.brand_preference)
            .execute(&self.pool)
            .await?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use advisor_core::learning::update_weights_from_feedback;

    use super::*;
    use crate::{connect_with_settings, migrations};

    async fn repository() -> SqlWeightRepository {
        let pool = connect_with_settings("sqlite::memory:", 1, 30).await.expect("connect");
        migrations::run_pending(&pool).await.expect("migrate");
        SqlWeightRepository::new(pool)
    }

    #[tokio::test]
    async fn empty_table_loads_as_the_default_store() {
        let repo = repository().await;
        let store = repo.load_all().await.expect("load");
        assert_eq!(store.resolve("default"), WeightProfile::default());
    }

    #[tokio::test]
    async fn save_then_load_round_trips_to_three_decimals() {
        let repo = repository().await;
        let mut store = WeightStore::new();
        update_weights_from_feedback(&mut store, "gaming", 0.9, 0.05);
        repo.save_all(&store).await.expect("save");

        let loaded = repo.load_all().await.expect("load");
        assert_eq!(loaded.resolve("gaming"), store.resolve("gaming"));

        // Idempotent once rounding has been applied.
        repo.save_all(&loaded).await.expect("save again");
        assert_eq!(repo.load_all().await.expect("reload"), loaded);
    }

    #[tokio::test]
    async fn rows_are_last_writer_wins() {
        let repo = repository().await;
        let mut store = WeightStore::new();
        store.insert(
            "oficina",
            WeightProfile { budget: 1.2, use_case_fit: 0.8, brand_preference: 0.4 },
        );
        repo.save_all(&store).await.expect("first write");

        store.insert(
            "oficina",
            WeightProfile { budget: 0.7, use_case_fit: 1.1, brand_preference: 0.2 },
        );
        repo.save_all(&store).await.expect("second write");

        let loaded = repo.load_all().await.expect("load");
        assert_eq!(loaded.resolve("oficina").budget, 0.7);
    }
}
