//! JSON API: recommendation inference and the feedback/learning loop.

use std::sync::{Arc, Mutex};

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{info, warn};
use uuid::Uuid;

use advisor_core::cbr::LIKED_RATING;
use advisor_core::domain::product::{Product, UpsertOutcome, PLACEHOLDER_BRAND};
use advisor_core::domain::query::Query;
use advisor_core::domain::recommendation::Recommendation;
use advisor_core::errors::validate_rating;
use advisor_core::hybrid::{ExplanationWriter, HybridEngine, LiveSearch};
use advisor_core::learning::{
    update_weights_from_feedback, WeightProfile, DEFAULT_LEARNING_RATE, DEFAULT_USE_CASE,
};
use advisor_db::repositories::{
    CatalogRepository, FeedbackRepository, RepositoryError, WeightRepository,
};

use crate::cache::ProductCache;

pub type Engine = HybridEngine<Arc<dyn LiveSearch>, Arc<dyn ExplanationWriter>>;

#[derive(Clone)]
pub struct AppState {
    pub catalog: Arc<dyn CatalogRepository>,
    pub weights: Arc<dyn WeightRepository>,
    pub feedback: Arc<dyn FeedbackRepository>,
    pub engine: Arc<Engine>,
    pub cache: Arc<Mutex<ProductCache>>,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/infer", post(infer))
        .route("/feedback", post(feedback))
        .route("/version", get(version))
        .with_state(state)
}

pub enum ApiError {
    BadRequest(String),
    Internal(String),
}

impl From<RepositoryError> for ApiError {
    fn from(error: RepositoryError) -> Self {
        Self::Internal(error.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            Self::BadRequest(message) => (StatusCode::BAD_REQUEST, message),
            Self::Internal(message) => {
                warn!(event_name = "api.request.failed", error = %message, "request failed");
                (StatusCode::INTERNAL_SERVER_ERROR, message)
            }
        };
        (status, Json(json!({ "error": message }))).into_response()
    }
}

/// Run one recommendation pass, record the session, and refresh the
/// read-through product cache with the returned candidates.
pub async fn infer(
    State(state): State<AppState>,
    Json(query): Json<Query>,
) -> Result<Json<Vec<Recommendation>>, ApiError> {
    let catalog = state.catalog.load_all().await?;
    let weights = state.weights.load_all().await?;
    let history = state.feedback.load_history().await?;

    let mut results = state.engine.infer_hybrid(&query, &catalog, &weights, &history).await;

    if let Some(first) = results.first() {
        state.feedback.upsert_session(&first.session_id, &query.use_case, query.budget).await?;
    }

    {
        let mut cache = state.cache.lock().expect("product cache lock");
        cache.clear();
        for result in results.iter().filter(|r| !r.is_info_card()) {
            cache.insert(result.product.clone());
        }
    }

    for result in results.iter_mut().filter(|r| !r.is_info_card()) {
        result.reasons.push(spec_sheet_line(&result.product, &query.use_case));
    }

    info!(
        event_name = "api.infer.completed",
        use_case = %query.use_case,
        budget = query.budget,
        results = results.len(),
        "inference pass served"
    );
    Ok(Json(results))
}

#[derive(Debug, Deserialize)]
pub struct FeedbackRequest {
    pub session_id: String,
    pub product_name: String,
    #[serde(default)]
    pub brand: Option<String>,
    #[serde(default)]
    pub cpu: Option<String>,
    #[serde(default)]
    pub gpu: Option<String>,
    #[serde(default)]
    pub ram: Option<String>,
    #[serde(default)]
    pub storage: Option<String>,
    #[serde(default)]
    pub os: Option<String>,
    #[serde(default)]
    pub price: Option<f64>,
    /// Rating in [0, 1]. 0.5 is neutral and leaves weights unchanged.
    pub rating: f64,
    /// Free text; doubles as the use-case tag for the weight update.
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub user_id: Option<i64>,
}

#[derive(Debug, Serialize)]
pub struct FeedbackResponse {
    pub ok: bool,
    pub product_id: String,
    pub outcome: &'static str,
    pub use_case: String,
    pub favorited: bool,
    pub weights: WeightProfile,
}

/// Record one rating: upsert the rated product into the catalog, append the
/// feedback row, optionally favorite, then apply the bounded weight update.
pub async fn feedback(
    State(state): State<AppState>,
    Json(request): Json<FeedbackRequest>,
) -> Result<Json<FeedbackResponse>, ApiError> {
    let rating =
        validate_rating(request.rating).map_err(|error| ApiError::BadRequest(error.to_string()))?;

    let use_case = request
        .notes
        .as_deref()
        .map(str::trim)
        .filter(|notes| !notes.is_empty())
        .unwrap_or(DEFAULT_USE_CASE)
        .to_string();

    let candidate = product_from_request(&request);
    let outcome = state.catalog.upsert(candidate.clone()).await?;
    // The upsert may have merged into a row with a different id.
    let product_id = match state
        .catalog
        .find_by_name_brand(&candidate.name, &candidate.brand)
        .await?
    {
        Some(stored) => stored.id,
        None => candidate.id,
    };

    state
        .feedback
        .add_feedback(&request.session_id, product_id.as_str(), &use_case, rating)
        .await?;

    let mut favorited = false;
    if rating >= LIKED_RATING {
        if let Some(user_id) = request.user_id {
            favorited = state.feedback.add_favorite(user_id, product_id.as_str()).await?;
        }
    }

    let mut weights = state.weights.load_all().await?;
    let updated = update_weights_from_feedback(&mut weights, &use_case, rating, DEFAULT_LEARNING_RATE);
    state.weights.save_all(&weights).await?;

    info!(
        event_name = "api.feedback.recorded",
        session_id = %request.session_id,
        product_id = %product_id,
        use_case = %use_case,
        rating,
        outcome = outcome_label(outcome),
        "feedback recorded and weights updated"
    );

    Ok(Json(FeedbackResponse {
        ok: true,
        product_id: product_id.as_str().to_string(),
        outcome: outcome_label(outcome),
        use_case,
        favorited,
        weights: updated,
    }))
}

pub async fn version() -> Json<serde_json::Value> {
    Json(json!({
        "name": env!("CARGO_PKG_NAME"),
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

fn outcome_label(outcome: UpsertOutcome) -> &'static str {
    match outcome {
        UpsertOutcome::Found => "found",
        UpsertOutcome::Created => "created",
        UpsertOutcome::Merged => "merged",
    }
}

fn product_from_request(request: &FeedbackRequest) -> Product {
    let brand =
        request.brand.clone().filter(|b| !b.trim().is_empty()).unwrap_or_else(|| {
            PLACEHOLDER_BRAND.to_string()
        });
    let mut product = Product::placeholder(&generated_id(&request.product_name, &brand));
    product.name = request.product_name.clone();
    product.brand = brand;
    product.cpu = request.cpu.clone().unwrap_or_default();
    product.gpu = request.gpu.clone().unwrap_or_default();
    product.ram = request.ram.clone().unwrap_or_default();
    product.storage = request.storage.clone().unwrap_or_default();
    product.os = request.os.clone().unwrap_or_default();
    product.price = request.price.unwrap_or(0.0);
    product
}

fn generated_id(name: &str, brand: &str) -> String {
    let slug = |text: &str, max: usize| {
        text.chars()
            .filter(|c| c.is_ascii_alphanumeric())
            .take(max)
            .collect::<String>()
            .to_ascii_lowercase()
    };
    let brand = slug(brand, 4);
    let name = slug(name, 8);
    if brand.is_empty() && name.is_empty() {
        let suffix: String = Uuid::new_v4().simple().to_string().chars().take(6).collect();
        format!("auto-{suffix}")
    } else {
        format!("auto-{brand}-{name}")
    }
}

fn or_na(value: &str) -> &str {
    if value.trim().is_empty() {
        "N/A"
    } else {
        value
    }
}

/// Compact spec-sheet line appended to each product's reasons so clients can
/// render a one-line summary without a second lookup.
fn spec_sheet_line(product: &Product, use_case: &str) -> String {
    format!(
        "{} {} | CPU: {} | RAM: {} | Storage: {} | GPU: {} | OS: {} | Price: ${:.2}. Suited for {}.",
        or_na(&product.brand),
        or_na(&product.name),
        or_na(&product.cpu),
        or_na(&product.ram),
        or_na(&product.storage),
        or_na(&product.gpu),
        or_na(&product.os),
        product.price,
        use_case,
    )
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;
    use axum::body::{to_bytes, Body};
    use axum::http::{header, Request, StatusCode};
    use tower::ServiceExt;

    use advisor_core::domain::query::Preferences;
    use advisor_db::repositories::{
        InMemoryCatalogRepository, InMemoryFeedbackRepository, InMemoryWeightRepository,
    };

    use super::*;

    struct NoLiveSearch;

    #[async_trait]
    impl LiveSearch for NoLiveSearch {
        async fn search(
            &self,
            _use_case: &str,
            _budget: f64,
            _preferences: Option<&Preferences>,
        ) -> Vec<(Product, Option<String>)> {
            Vec::new()
        }
    }

    struct PlainWriter;

    #[async_trait]
    impl ExplanationWriter for PlainWriter {
        async fn summarize(&self, name: &str, reasons: &[String], _use_case: &str) -> String {
            format!("{name}: {}", reasons.join("; "))
        }
    }

    fn laptop(id: &str, name: &str, brand: &str, price: f64) -> Product {
        let mut product = Product::placeholder(id);
        product.name = name.to_string();
        product.brand = brand.to_string();
        product.cpu = "Ryzen 5 5600H".to_string();
        product.price = price;
        product
    }

    fn test_state() -> AppState {
        let catalog = InMemoryCatalogRepository::with_products(vec![
            laptop("lp-1", "Nitro 5", "Acer", 849.0),
            laptop("lp-2", "Aspire 3", "Acer", 449.0),
            laptop("lp-3", "Legion 5", "Lenovo", 1099.0),
        ]);
        let engine: Arc<Engine> = Arc::new(HybridEngine::new(
            Arc::new(NoLiveSearch) as Arc<dyn LiveSearch>,
            Arc::new(PlainWriter) as Arc<dyn ExplanationWriter>,
        ));
        AppState {
            catalog: Arc::new(catalog),
            weights: Arc::new(InMemoryWeightRepository::default()),
            feedback: Arc::new(InMemoryFeedbackRepository::default()),
            engine,
            cache: Arc::new(Mutex::new(ProductCache::new(16))),
        }
    }

    async fn post_json(state: AppState, uri: &str, body: serde_json::Value) -> (StatusCode, serde_json::Value) {
        let response = router(state)
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri(uri)
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(body.to_string()))
                    .expect("request"),
            )
            .await
            .expect("response");

        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.expect("body");
        let value = serde_json::from_slice(&bytes).unwrap_or(serde_json::Value::Null);
        (status, value)
    }

    #[tokio::test]
    async fn infer_returns_ranked_results_and_fills_the_cache() {
        let state = test_state();
        let cache = state.cache.clone();

        let (status, body) = post_json(
            state,
            "/infer",
            json!({ "use_case": "gaming", "budget": 1200.0, "top_k": 2 }),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        let results = body.as_array().expect("array");
        assert_eq!(results.len(), 2);

        let first_session = results[0]["session_id"].as_str().expect("session id");
        assert!(results.iter().all(|r| r["session_id"] == first_session));
        assert!(results[0]["score"].as_f64().expect("score") >= results[1]["score"].as_f64().expect("score"));

        // Every product result carries the appended spec-sheet line.
        for result in results {
            let reasons = result["reasons"].as_array().expect("reasons");
            assert!(reasons.iter().any(|r| r.as_str().is_some_and(|s| s.contains("| CPU:"))));
        }

        assert_eq!(cache.lock().expect("cache lock").len(), 2);
    }

    #[tokio::test]
    async fn infer_with_a_low_gaming_budget_leads_with_the_info_card() {
        let state = test_state();
        let (status, body) = post_json(
            state,
            "/infer",
            json!({ "use_case": "gaming", "budget": 450.0 }),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        let results = body.as_array().expect("array");
        assert_eq!(results[0]["product"]["id"], "auto-adjust-info");
        // The info card is informational, never a spec-sheet product.
        let reasons = results[0]["reasons"].as_array().expect("reasons");
        assert_eq!(reasons.len(), 1);
        assert!(reasons[0].as_str().expect("note").starts_with("Automatic adjustment applied"));
    }

    #[tokio::test]
    async fn feedback_rejects_an_out_of_range_rating() {
        let (status, body) = post_json(
            test_state(),
            "/feedback",
            json!({ "session_id": "s-1", "product_name": "Nitro 5", "rating": 1.5 }),
        )
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].as_str().expect("error").contains("rating"));
    }

    #[tokio::test]
    async fn positive_feedback_updates_weights_and_merges_the_product() {
        let state = test_state();
        let catalog = state.catalog.clone();

        let (status, body) = post_json(
            state,
            "/feedback",
            json!({
                "session_id": "s-1",
                "product_name": "Nitro 5",
                "brand": "Acer",
                "rating": 1.0,
                "notes": "gaming",
                "user_id": 7
            }),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["ok"], true);
        assert_eq!(body["use_case"], "gaming");
        assert_eq!(body["product_id"], "lp-1");
        assert_ne!(body["outcome"], "created");
        assert_eq!(body["favorited"], true);
        assert_eq!(body["weights"]["budget"].as_f64().expect("budget"), 1.05);
        assert_eq!(body["weights"]["brand_preference"].as_f64().expect("brand"), 0.35);

        // No duplicate row was created for the already-known laptop.
        assert_eq!(catalog.load_all().await.expect("load").len(), 3);
    }

    #[tokio::test]
    async fn feedback_for_an_unknown_product_creates_a_catalog_row() {
        let state = test_state();
        let catalog = state.catalog.clone();

        let (status, body) = post_json(
            state,
            "/feedback",
            json!({
                "session_id": "s-2",
                "product_name": "TUF A15",
                "brand": "Asus",
                "price": 899.0,
                "rating": 0.2
            }),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["outcome"], "created");
        assert_eq!(body["use_case"], "default");
        assert_eq!(body["favorited"], false);
        assert_eq!(body["product_id"], "auto-asus-tufa15");
        assert_eq!(catalog.load_all().await.expect("load").len(), 4);
    }
}
