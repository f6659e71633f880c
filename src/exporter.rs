//! HTTP surface: resolves a named record, runs the probe and serves metrics.

use std::sync::Arc;

use axum::extract::{Query, State};
use axum::http::{header, StatusCode};
use axum::response::{Html, IntoResponse, Response};
use axum::routing::get;
use axum::Router;
use serde::Deserialize;
use tokio::time::Instant;
use tracing::{debug, error};

use crate::metrics::{ProbeMetrics, CONTENT_TYPE};
use crate::probe::{effective_timeout, probe};
use crate::store::ConfigStore;

/// Shared state handed to every request
#[derive(Clone)]
pub struct AppState {
	pub store: Arc<ConfigStore>,
	pub metrics: ProbeMetrics,
	pub metrics_path: Arc<str>,
}

/// Query parameters of a probe request
#[derive(Debug, Deserialize)]
pub struct ProbeParams {
	#[serde(default)]
	pub record: String,
	#[serde(default)]
	pub dns_server: Option<String>,
}

/// Build the router serving probes on the metrics path and a landing page on "/".
pub fn router(state: AppState) -> Router {
	let metrics_path = state.metrics_path.to_string();
	let mut router = Router::new().route(&metrics_path, get(probe_handler));
	if metrics_path != "/" {
		router = router.route("/", get(landing_page));
	}
	router.with_state(state)
}

async fn probe_handler(
	State(state): State<AppState>,
	Query(params): Query<ProbeParams>,
) -> Response {
	let Some(config) = state.store.snapshot() else {
		return (StatusCode::SERVICE_UNAVAILABLE, "configuration not loaded").into_response();
	};
	let Some(definition) = config.records.get(&params.record) else {
		return (StatusCode::BAD_REQUEST, format!("Unknown record {:?}", params.record)).into_response();
	};

	// The configured server wins over the URL parameter
	let server = definition.dns_server.clone()
		.filter(|s| !s.is_empty())
		.or(params.dns_server)
		.filter(|s| !s.is_empty());
	let Some(server) = server else {
		let message = "'dns_server' parameter is missing. You should define it in config file or URL";
		error!("{}", message);
		return (StatusCode::BAD_REQUEST, message).into_response();
	};

	let deadline = Instant::now() + effective_timeout(definition.timeout);
	let outcome = probe(deadline, &server, definition).await;
	debug!(
		record = %params.record,
		success = outcome.success,
		elapsed_ms = outcome.elapsed.as_millis() as u64,
		"Probe finished"
	);

	match state.metrics.render(&definition.record_name, &outcome) {
		Ok(body) => ([(header::CONTENT_TYPE, CONTENT_TYPE)], body).into_response(),
		Err(e) => {
			error!(err = %e, "Failed to encode metrics");
			StatusCode::INTERNAL_SERVER_ERROR.into_response()
		}
	}
}

async fn landing_page(State(state): State<AppState>) -> Html<String> {
	Html(format!(
		"<html>\n\
		<head><title>DNS Probe Exporter</title></head>\n\
		<body>\n\
		<h1>DNS Probe Exporter</h1>\n\
		<p><a href=\"{}\">Metrics</a></p>\n\
		</body>\n\
		</html>\n",
		state.metrics_path,
	))
}
