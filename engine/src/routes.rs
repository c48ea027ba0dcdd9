use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use metrics_exporter_prometheus::PrometheusHandle;
use serde_json::Value;
use std::{sync::Arc, time::Instant};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;

use crate::{
    engine::Predictor,
    error::ApiError,
    types::{PredictionInput, PredictionResponse, Record},
};

#[derive(Clone)]
pub struct AppState {
    pub predictor: Arc<Predictor>,
    // set when the server installed a Prometheus recorder
    pub metrics: Option<PrometheusHandle>,
}

impl AppState {
    pub fn new(predictor: Predictor) -> Self {
        Self {
            predictor: Arc::new(predictor),
            metrics: None,
        }
    }

    pub fn with_metrics(mut self, handle: PrometheusHandle) -> Self {
        self.metrics = Some(handle);
        self
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/predict", post(predict))
        .route("/health", get(health_check))
        .route("/metrics", get(metrics))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

pub async fn predict(
    State(state): State<AppState>,
    payload: Result<Json<PredictionInput>, JsonRejection>,
) -> Result<Json<PredictionResponse>, ApiError> {
    let start = Instant::now();
    metrics::counter!("predict_requests_total").increment(1);

    let result = payload
        .map_err(ApiError::from)
        .and_then(|Json(input)| {
            let record = Record::from(input);
            state.predictor.predict(&record).map_err(ApiError::from)
        });

    let prediction = match result {
        Ok(prediction) => prediction,
        Err(err) => {
            metrics::counter!("predict_errors_total").increment(1);
            return Err(err);
        }
    };

    let latency = start.elapsed().as_secs_f64() * 1000.0;
    metrics::histogram!("predict_duration_ms").record(latency);

    let response = PredictionResponse::from_prediction(&prediction);
    info!(
        "Prediction {} ({}) p={:.3} in {:.2}ms",
        response.prediction, response.addiction_status, response.probability, latency
    );
    Ok(Json(response))
}

pub async fn health_check(State(state): State<AppState>) -> Json<Value> {
    let run = state.predictor.run();
    Json(serde_json::json!({
        "status": "healthy",
        "timestamp": chrono::Utc::now().to_rfc3339(),
        "version": env!("CARGO_PKG_VERSION"),
        "run_id": run.run_id,
        "model_created_at": run.created_at.to_rfc3339(),
        "n_features": state.predictor.n_features(),
    }))
}

pub async fn metrics(State(state): State<AppState>) -> Response {
    match &state.metrics {
        Some(handle) => handle.render().into_response(),
        None => (StatusCode::OK, String::new()).into_response(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::fixture_predictor;
    use axum::body::{to_bytes, Body};
    use axum::http::{header, Method, Request};
    use serde_json::json;
    use tower::ServiceExt;

    fn app() -> Router {
        router(AppState::new(fixture_predictor()))
    }

    fn reference_payload() -> Value {
        json!({
            "age": 21,
            "gender": "Female",
            "academic_level": "University",
            "avg_daily_usage_hours": 5.5,
            "most_used_platform": "Instagram",
            "sleep_hours_per_night": 6,
            "mental_health_score": 65,
            "conflicts_over_social_media": 3,
            "affects_academic_performance": "Yes",
            "relationship_status": "Single"
        })
    }

    async fn post_json(app: Router, body: String) -> (StatusCode, Value) {
        let request = Request::builder()
            .method(Method::POST)
            .uri("/predict")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body))
            .unwrap();
        let response = app.oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap_or(Value::Null))
    }

    #[tokio::test]
    async fn test_predict_reference_scenario() {
        let (status, body) = post_json(app(), reference_payload().to_string()).await;
        assert_eq!(status, StatusCode::OK);

        let prediction = body["prediction"].as_u64().unwrap();
        let probability = body["probability"].as_f64().unwrap();
        assert!(prediction <= 1);
        assert!((0.0..=1.0).contains(&probability));
        let expected = if prediction == 1 { "Addicted" } else { "Not Addicted" };
        assert_eq!(body["addiction_status"], expected);
    }

    #[tokio::test]
    async fn test_predict_rejects_missing_field() {
        let mut payload = reference_payload();
        payload.as_object_mut().unwrap().remove("gender");
        let (status, body) = post_json(app(), payload.to_string()).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert!(body["detail"].as_str().unwrap().contains("gender"));
    }

    #[tokio::test]
    async fn test_predict_rejects_wrong_type() {
        let mut payload = reference_payload();
        payload["age"] = json!("twenty-one");
        let (status, body) = post_json(app(), payload.to_string()).await;
        assert!(status.is_client_error());
        assert!(body.get("detail").is_some());
    }

    #[tokio::test]
    async fn test_predict_rejects_extra_field() {
        let mut payload = reference_payload();
        payload["country"] = json!("India");
        let (status, _) = post_json(app(), payload.to_string()).await;
        assert!(status.is_client_error());
    }

    #[tokio::test]
    async fn test_transform_failure_maps_to_bad_request_detail() {
        let err = crate::error::AppError::dimension_mismatch("scaler", 12, 11);
        let response = ApiError::from(err).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body: Value = serde_json::from_slice(&bytes).unwrap();
        assert!(body["detail"].as_str().unwrap().contains("expected 12"));
        assert!(body.get("trace").is_none());
    }

    #[tokio::test]
    async fn test_unknown_platform_still_predicts() {
        let mut payload = reference_payload();
        payload["most_used_platform"] = json!("UnknownPlatformXYZ");
        let (status, body) = post_json(app(), payload.to_string()).await;
        assert_eq!(status, StatusCode::OK);
        assert!(body["probability"].is_number());
    }

    #[tokio::test]
    async fn test_health_reports_run() {
        let predictor = fixture_predictor();
        let run_id = predictor.run().run_id.to_string();
        let response = router(AppState::new(predictor))
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body: Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["status"], "healthy");
        assert_eq!(body["run_id"], run_id);
    }

    #[tokio::test]
    async fn test_metrics_without_recorder_is_empty() {
        let response = app()
            .oneshot(Request::get("/metrics").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }
}
