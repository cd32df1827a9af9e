//! HTTP API for querying customers while a run is in progress.
//!
//! Read-only. Experiment labels contain `/`, so clients percent-encode them
//! in the path (`onboarding%2Fs1%2Fp30`).

use std::future::Future;
use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    routing::get,
};
use serde::{Deserialize, Serialize};
use tokio::net::TcpListener;

use crate::actors::{CustomerId, CustomerSnapshot, JourneyStatus};
use crate::registry::CustomerRegistry;

/// API server state.
#[derive(Clone)]
pub struct ApiState {
    registry: Arc<CustomerRegistry>,
}

impl ApiState {
    #[must_use]
    pub const fn new(registry: Arc<CustomerRegistry>) -> Self {
        Self { registry }
    }
}

/// Experiment list response.
#[derive(Debug, Serialize, Deserialize)]
pub struct ExperimentsResponse {
    pub experiments: Vec<String>,
}

/// Customer view.
#[derive(Debug, PartialEq, Serialize, Deserialize)]
pub struct CustomerResponse {
    pub id: CustomerId,
    pub state: String,
    pub steps: u64,
    pub cost: f64,
    pub finished: bool,
}

impl From<CustomerSnapshot> for CustomerResponse {
    fn from(snapshot: CustomerSnapshot) -> Self {
        Self {
            id: snapshot.id,
            state: snapshot.state,
            steps: snapshot.steps,
            cost: snapshot.cost,
            finished: snapshot.status == JourneyStatus::Finished,
        }
    }
}

/// Error response.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Error message.
    pub error: String,
}

type ApiError = (StatusCode, Json<ErrorResponse>);

fn api_error(status: StatusCode, error: String) -> ApiError {
    (status, Json(ErrorResponse { error }))
}

/// GET /api/experiments
pub async fn list_experiments(State(state): State<ApiState>) -> Json<ExperimentsResponse> {
    Json(ExperimentsResponse {
        experiments: state.registry.experiments(),
    })
}

/// GET /api/experiments/{label}/customers/{id}
pub async fn get_customer(
    State(state): State<ApiState>,
    Path((label, id)): Path<(String, CustomerId)>,
) -> Result<Json<CustomerResponse>, ApiError> {
    match state.registry.lookup(&label, id).await {
        Ok(Some(snapshot)) => Ok(Json(snapshot.into())),
        Ok(None) => Err(api_error(
            StatusCode::NOT_FOUND,
            format!("customer {id} not found in experiment '{label}'"),
        )),
        Err(e) => {
            tracing::error!(experiment = %label, customer_id = id, error = %e, "Customer lookup failed");
            Err(api_error(
                StatusCode::SERVICE_UNAVAILABLE,
                format!("customer {id} did not answer: {e}"),
            ))
        }
    }
}

/// Routes of the query surface.
pub fn router(registry: Arc<CustomerRegistry>) -> Router {
    Router::new()
        .route("/api/experiments", get(list_experiments))
        .route(
            "/api/experiments/{label}/customers/{id}",
            get(get_customer),
        )
        .route("/health", get(|| async { "OK" }))
        .with_state(ApiState::new(registry))
}

/// Serve the query surface on `listener` until `shutdown` resolves.
///
/// # Errors
///
/// Returns the I/O error that stopped the server.
pub async fn serve(
    listener: TcpListener,
    registry: Arc<CustomerRegistry>,
    shutdown: impl Future<Output = ()> + Send + 'static,
) -> std::io::Result<()> {
    if let Ok(addr) = listener.local_addr() {
        tracing::info!("Query API listening on http://{}", addr);
    }
    axum::serve(listener, router(registry))
        .with_graceful_shutdown(shutdown)
        .await
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;
    use axum::body::{Body, to_bytes};
    use axum::http::Request;
    use tower::ServiceExt;

    fn registry_with_customer() -> Arc<CustomerRegistry> {
        let registry = Arc::new(CustomerRegistry::new());
        registry.record_finished(
            "onboarding/s1/p30",
            CustomerSnapshot {
                id: 3,
                state: "end".to_string(),
                steps: 2,
                cost: 4.5,
                status: JourneyStatus::Finished,
            },
        );
        registry
    }

    async fn get_json<T: serde::de::DeserializeOwned>(
        app: Router,
        uri: &str,
    ) -> (StatusCode, T) {
        let request = Request::builder().uri(uri).body(Body::empty()).unwrap();
        let response = app.oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn test_list_experiments() {
        let (status, body): (_, ExperimentsResponse) =
            get_json(router(registry_with_customer()), "/api/experiments").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body.experiments, vec!["onboarding/s1/p30".to_string()]);
    }

    #[tokio::test]
    async fn test_get_customer_with_encoded_label() {
        let (status, body): (_, CustomerResponse) = get_json(
            router(registry_with_customer()),
            "/api/experiments/onboarding%2Fs1%2Fp30/customers/3",
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            body,
            CustomerResponse {
                id: 3,
                state: "end".to_string(),
                steps: 2,
                cost: 4.5,
                finished: true,
            }
        );
    }

    #[tokio::test]
    async fn test_get_unknown_customer_is_not_found() {
        let (status, body): (_, ErrorResponse) = get_json(
            router(registry_with_customer()),
            "/api/experiments/onboarding%2Fs1%2Fp30/customers/99",
        )
        .await;

        assert_eq!(status, StatusCode::NOT_FOUND);
        assert!(body.error.contains("99"));
    }

    #[tokio::test]
    async fn test_get_customer_in_unknown_experiment_is_not_found() {
        let app = router(registry_with_customer());
        let request = Request::builder()
            .uri("/api/experiments/nope/customers/3")
            .body(Body::empty())
            .unwrap();
        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
