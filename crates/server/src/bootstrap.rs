use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use thiserror::Error;
use tracing::info;

use advisor_agent::{GroqClient, GroqExplanationWriter, GroqLiveSearch};
use advisor_core::config::{AppConfig, ConfigError, LoadOptions};
use advisor_core::domain::product::Product;
use advisor_core::domain::query::Preferences;
use advisor_core::hybrid::{ExplanationWriter, HybridEngine, LiveSearch};
use advisor_db::repositories::{
    SqlCatalogRepository, SqlFeedbackRepository, SqlWeightRepository,
};
use advisor_db::{connect_with_settings, migrations, DbPool};

use crate::api::{AppState, Engine};
use crate::cache::ProductCache;

/// Products the read-through cache keeps from the latest inference. Inference
/// returns at most ten results plus one informational card, so this never
/// evicts mid-request.
const PRODUCT_CACHE_CAPACITY: usize = 16;

pub struct Application {
    pub config: AppConfig,
    pub db_pool: DbPool,
}

#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("database connection failed: {0}")]
    DatabaseConnect(#[source] sqlx::Error),
    #[error("database migration failed: {0}")]
    Migration(#[source] sqlx::migrate::MigrateError),
    #[error("llm client initialization failed: {0}")]
    Llm(#[source] anyhow::Error),
}

pub async fn bootstrap(options: LoadOptions) -> Result<Application, BootstrapError> {
    let config = AppConfig::load(options)?;
    bootstrap_with_config(config).await
}

pub async fn bootstrap_with_config(config: AppConfig) -> Result<Application, BootstrapError> {
    info!(event_name = "system.bootstrap.start", "starting application bootstrap");

    let db_pool = connect_with_settings(
        &config.database.url,
        config.database.max_connections,
        config.database.timeout_secs,
    )
    .await
    .map_err(BootstrapError::DatabaseConnect)?;
    info!(
        event_name = "system.bootstrap.database_connected",
        "database connection established"
    );

    migrations::run_pending(&db_pool).await.map_err(BootstrapError::Migration)?;
    info!(
        event_name = "system.bootstrap.migrations_applied",
        "database migrations applied"
    );

    Ok(Application { config, db_pool })
}

pub fn build_state(app: &Application) -> Result<AppState, BootstrapError> {
    Ok(AppState {
        catalog: Arc::new(SqlCatalogRepository::new(app.db_pool.clone())),
        weights: Arc::new(SqlWeightRepository::new(app.db_pool.clone())),
        feedback: Arc::new(SqlFeedbackRepository::new(app.db_pool.clone())),
        engine: build_engine(&app.config)?,
        cache: Arc::new(Mutex::new(ProductCache::new(PRODUCT_CACHE_CAPACITY))),
    })
}

fn build_engine(config: &AppConfig) -> Result<Arc<Engine>, BootstrapError> {
    if config.llm_enabled() {
        let search_client = GroqClient::new(config.llm.clone()).map_err(BootstrapError::Llm)?;
        let explain_client = GroqClient::new(config.llm.clone()).map_err(BootstrapError::Llm)?;
        let live: Arc<dyn LiveSearch> =
            Arc::new(GroqLiveSearch::new(search_client, config.llm.max_live_results));
        let writer: Arc<dyn ExplanationWriter> =
            Arc::new(GroqExplanationWriter::new(explain_client));
        return Ok(Arc::new(HybridEngine::new(live, writer)));
    }

    info!(
        event_name = "system.bootstrap.llm_disabled",
        "no llm api key configured, serving from the local catalog only"
    );
    let live: Arc<dyn LiveSearch> = Arc::new(DisabledLiveSearch);
    let writer: Arc<dyn ExplanationWriter> = Arc::new(LocalExplanation);
    Ok(Arc::new(HybridEngine::new(live, writer)))
}

/// Stand-in collaborator when no api key is configured. Always empty, so the
/// hybrid engine serves every request from the local catalog.
struct DisabledLiveSearch;

#[async_trait]
impl LiveSearch for DisabledLiveSearch {
    async fn search(
        &self,
        _use_case: &str,
        _budget: f64,
        _preferences: Option<&Preferences>,
    ) -> Vec<(Product, Option<String>)> {
        Vec::new()
    }
}

struct LocalExplanation;

#[async_trait]
impl ExplanationWriter for LocalExplanation {
    async fn summarize(&self, name: &str, reasons: &[String], _use_case: &str) -> String {
        format!("{name}: {}", reasons.join("; "))
    }
}

#[cfg(test)]
mod tests {
    use advisor_core::config::{ConfigOverrides, LoadOptions};

    use super::*;

    fn memory_options(database_url: &str) -> LoadOptions {
        LoadOptions {
            overrides: ConfigOverrides {
                database_url: Some(database_url.to_string()),
                ..ConfigOverrides::default()
            },
            ..LoadOptions::default()
        }
    }

    #[tokio::test]
    async fn bootstrap_applies_migrations_and_exposes_the_baseline_tables() {
        let app = bootstrap(memory_options("sqlite::memory:?cache=shared"))
            .await
            .expect("bootstrap should succeed with an in-memory database");

        let (table_count,): (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM sqlite_master \
             WHERE type = 'table' \
             AND name IN ('products', 'sessions', 'feedback', 'weights', 'favorites')",
        )
        .fetch_one(&app.db_pool)
        .await
        .expect("baseline tables should be queryable after bootstrap");
        assert_eq!(table_count, 5);

        app.db_pool.close().await;
    }

    #[tokio::test]
    async fn build_state_without_an_api_key_uses_the_local_only_engine() {
        let app = bootstrap(memory_options("sqlite::memory:?cache=shared"))
            .await
            .expect("bootstrap");
        assert!(!app.config.llm_enabled());

        let state = build_state(&app).expect("state should build without an api key");
        assert!(state.cache.lock().expect("cache lock").is_empty());

        app.db_pool.close().await;
    }

    #[tokio::test]
    async fn disabled_live_search_always_returns_nothing() {
        let results = DisabledLiveSearch.search("gaming", 900.0, None).await;
        assert!(results.is_empty());
    }
}
