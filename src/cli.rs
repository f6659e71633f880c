use clap::Parser;

/// DNS probe exporter
#[derive(Parser, Debug)]
#[command(name = "dns-probe-exporter")]
#[command(version, about = "Run on-demand DNS health probes and expose the results as Prometheus metrics")]
pub struct Cli {
	/// Address on which to expose metrics and web interface
	#[arg(long = "web.listen-address", default_value = ":9701")]
	pub listen_address: String,

	/// Path under which to expose probe metrics
	#[arg(long = "web.telemetry-path", default_value = "/metrics")]
	pub metrics_path: String,

	/// Exporter configuration file
	#[arg(long = "config.file", default_value = "dns-test.yml")]
	pub config_file: String,

	/// Log level filter, overridden by RUST_LOG (e.g. info or dns_probe_exporter=debug)
	#[arg(long = "log.level", default_value = "info")]
	pub log_level: String,
}

/// Turn a Go-style ":port" listen address into one that can be bound.
pub fn bindable_address(address: &str) -> String {
	if address.starts_with(':') {
		format!("0.0.0.0{}", address)
	} else {
		address.to_string()
	}
}
