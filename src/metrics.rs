//! Prometheus rendering of probe outcomes.
//!
//! Each probe request gets a fresh registry holding the success and duration
//! gauges; the duration histogram is shared across requests so it accumulates
//! per record name.

use std::fmt;
use std::sync::atomic::AtomicU64;
use std::sync::Arc;

use prometheus_client::encoding::text::encode;
use prometheus_client::encoding::EncodeLabelSet;
use prometheus_client::metrics::family::{Family, MetricConstructor};
use prometheus_client::metrics::gauge::Gauge;
use prometheus_client::metrics::histogram::Histogram;
use prometheus_client::registry::Registry;

use crate::transport::ProbeOutcome;

/// Content type of the text exposition produced by `render`
pub const CONTENT_TYPE: &str = "application/openmetrics-text; version=1.0.0; charset=utf-8";

#[derive(Clone, Debug, Hash, PartialEq, Eq, EncodeLabelSet)]
struct RecordLabels {
	record_name: String,
}

/// Creates histograms with the configured bucket boundaries.
#[derive(Clone, Debug)]
struct BucketConstructor {
	buckets: Arc<[f64]>,
}

impl MetricConstructor<Histogram> for BucketConstructor {
	fn new_metric(&self) -> Histogram {
		Histogram::new(self.buckets.iter().copied())
	}
}

/// Metrics shared by all probe requests.
#[derive(Clone, Debug)]
pub struct ProbeMetrics {
	duration_histogram: Family<RecordLabels, Histogram, BucketConstructor>,
}

impl ProbeMetrics {
	pub fn new(buckets: &[f64]) -> Self {
		let constructor = BucketConstructor { buckets: Arc::from(buckets) };
		Self {
			duration_histogram: Family::new_with_constructor(constructor),
		}
	}

	/// Record an outcome and render the metrics for one probe request.
	pub fn render(&self, record_name: &str, outcome: &ProbeOutcome) -> Result<String, fmt::Error> {
		let mut registry = Registry::default();

		let success = Gauge::<f64, AtomicU64>::default();
		let duration = Gauge::<f64, AtomicU64>::default();
		registry.register(
			"dns_test_success",
			"Displays whether or not the dns test was a success",
			success.clone(),
		);
		registry.register(
			"dns_test_dns_query_duration_seconds",
			"How long the dns test took to complete in seconds",
			duration.clone(),
		);
		registry.register(
			"dns_test_dns_query_duration_seconds_histogram",
			"How long the dns test took to complete in seconds",
			self.duration_histogram.clone(),
		);

		success.set(if outcome.success { 1.0 } else { 0.0 });
		duration.set(outcome.elapsed_seconds());
		self.duration_histogram
			.get_or_create(&RecordLabels { record_name: record_name.to_string() })
			.observe(outcome.elapsed_seconds());

		let mut body = String::new();
		encode(&mut body, &registry)?;
		Ok(body)
	}
}
