mod cli;
mod config;
mod dns;
mod error;
mod exporter;
mod metrics;
mod probe;
mod resolver;
mod store;
#[cfg(test)]
mod testing;
mod transport;
mod validate;

use std::sync::Arc;

use anyhow::{anyhow, Context};
use clap::Parser;
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

use crate::cli::{bindable_address, Cli};
use crate::exporter::AppState;
use crate::metrics::ProbeMetrics;
use crate::store::ConfigStore;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
	let cli = Cli::parse();
	init_logging(&cli.log_level);

	info!(version = env!("CARGO_PKG_VERSION"), "Starting dns-probe-exporter");

	let store = Arc::new(ConfigStore::new());
	let config = store.load_file(&cli.config_file)
		.with_context(|| format!("error loading config '{}'", cli.config_file))?;
	info!(records = config.records.len(), "Loaded config file");

	// Values from the config file take precedence over flags
	let metrics_path = config.metrics_path.clone()
		.filter(|p| !p.is_empty())
		.unwrap_or_else(|| cli.metrics_path.clone());
	if !metrics_path.starts_with('/') {
		return Err(anyhow!("metrics path '{}' must start with '/'", metrics_path));
	}
	let listen_address = config.listen_address.clone()
		.filter(|a| !a.is_empty())
		.unwrap_or_else(|| cli.listen_address.clone());
	let metrics = ProbeMetrics::new(&config.histogram_buckets_or_default());
	info!(path = %metrics_path, "Metrics path");

	#[cfg(unix)]
	tokio::spawn(reload_on_hangup(Arc::clone(&store), cli.config_file.clone()));

	let app = exporter::router(AppState {
		store,
		metrics,
		metrics_path: Arc::from(metrics_path.as_str()),
	});

	let bind_address = bindable_address(&listen_address);
	let listener = TcpListener::bind(&bind_address).await
		.with_context(|| format!("failed to listen on '{}'", bind_address))?;
	info!(address = %bind_address, "Listening");

	axum::serve(listener, app).await?;
	Ok(())
}

/// Install the fmt subscriber; RUST_LOG takes precedence over the flag.
fn init_logging(level: &str) {
	let env_filter = EnvFilter::try_from_default_env()
		.unwrap_or_else(|_| EnvFilter::new(level));

	tracing_subscriber::registry()
		.with(env_filter)
		.with(tracing_subscriber::fmt::layer())
		.init();
}

/// Re-read the config file on every SIGHUP.
///
/// Only record definitions change; listen address, metrics path and
/// histogram buckets stay as they were at startup.
#[cfg(unix)]
async fn reload_on_hangup(store: Arc<ConfigStore>, path: String) {
	use tokio::signal::unix::{signal, SignalKind};
	use tracing::{error, warn};

	let mut hangups = match signal(SignalKind::hangup()) {
		Ok(stream) => stream,
		Err(e) => {
			warn!(err = %e, "Could not install SIGHUP handler, config reload disabled");
			return;
		}
	};

	while hangups.recv().await.is_some() {
		match store.load_file(&path) {
			Ok(config) => info!(records = config.records.len(), "Reloaded config file"),
			Err(e) => error!(err = %e, "Error reloading config, keeping previous configuration"),
		}
	}
}
