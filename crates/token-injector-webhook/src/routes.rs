// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! HTTP handlers and router construction.

use std::sync::Arc;

use axum::{
	body::Bytes,
	extract::State,
	http::{header, StatusCode},
	response::IntoResponse,
	routing::{get, post},
	Json, Router,
};

use crate::admission::AdmissionHandler;
use crate::metrics::WebhookMetrics;

#[derive(Clone)]
pub struct AppState {
	pub admission: Arc<AdmissionHandler>,
	pub metrics: Arc<WebhookMetrics>,
}

/// Webhook router. `/metrics` is mounted only when `serve_metrics` is set;
/// otherwise it lives on the telemetry listener.
pub fn create_router(state: AppState, serve_metrics: bool) -> Router {
	let router = Router::new()
		.route("/pods", post(mutate_pods))
		.route("/healthz", get(healthz));

	let router = if serve_metrics {
		router.route("/metrics", get(prometheus_metrics))
	} else {
		router
	};

	router.with_state(state)
}

/// Router for the dedicated telemetry listener.
pub fn create_telemetry_router(state: AppState) -> Router {
	Router::new()
		.route("/metrics", get(prometheus_metrics))
		.route("/healthz", get(healthz))
		.with_state(state)
}

/// POST /pods - Mutating admission review for Pods.
pub async fn mutate_pods(State(state): State<AppState>, body: Bytes) -> impl IntoResponse {
	Json(state.admission.review_body(&body).await)
}

/// GET /healthz - Liveness probe.
pub async fn healthz() -> StatusCode {
	StatusCode::OK
}

/// GET /metrics - Prometheus metrics export endpoint.
pub async fn prometheus_metrics(State(state): State<AppState>) -> impl IntoResponse {
	match state.metrics.encode() {
		Ok(metrics) => (
			StatusCode::OK,
			[(header::CONTENT_TYPE, "text/plain; version=0.0.4; charset=utf-8")],
			metrics,
		)
			.into_response(),
		Err(e) => {
			tracing::error!(error = %e, "prometheus_metrics: failed to encode metrics");
			(
				StatusCode::INTERNAL_SERVER_ERROR,
				format!("Failed to encode metrics: {e}"),
			)
				.into_response()
		}
	}
}

#[cfg(test)]
mod tests {
	use axum::body::Body;
	use axum::http::Request;
	use token_injector_config::InjectorConfig;
	use token_injector_k8s::MockK8sClient;
	use tower::ServiceExt;

	use super::*;
	use crate::mutator::PodMutator;

	fn state() -> AppState {
		let metrics = Arc::new(WebhookMetrics::new().unwrap());
		let mutator = PodMutator::new(
			Arc::new(MockK8sClient::new()),
			InjectorConfig::with_image("img"),
		);
		AppState {
			admission: Arc::new(AdmissionHandler::new(Arc::new(mutator), metrics.clone())),
			metrics,
		}
	}

	async fn get_status(router: Router, uri: &str) -> StatusCode {
		router
			.oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
			.await
			.unwrap()
			.status()
	}

	#[tokio::test]
	async fn test_healthz() {
		assert_eq!(
			get_status(create_router(state(), true), "/healthz").await,
			StatusCode::OK
		);
	}

	#[tokio::test]
	async fn test_metrics_mounted_when_requested() {
		assert_eq!(
			get_status(create_router(state(), true), "/metrics").await,
			StatusCode::OK
		);
		assert_eq!(
			get_status(create_router(state(), false), "/metrics").await,
			StatusCode::NOT_FOUND
		);
	}

	#[tokio::test]
	async fn test_telemetry_router_serves_metrics_only() {
		let router = create_telemetry_router(state());
		assert_eq!(get_status(router.clone(), "/metrics").await, StatusCode::OK);
		assert_eq!(get_status(router, "/pods").await, StatusCode::NOT_FOUND);
	}

	#[tokio::test]
	async fn test_pods_requires_post() {
		assert_eq!(
			get_status(create_router(state(), true), "/pods").await,
			StatusCode::METHOD_NOT_ALLOWED
		);
	}
}
