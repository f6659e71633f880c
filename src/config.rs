use std::collections::HashMap;
use std::time::Duration;

use serde::{Deserialize, Deserializer};

use crate::error::ConfigError;

/// Histogram buckets used when the config file does not define any
pub const DEFAULT_HISTOGRAM_BUCKETS: [f64; 5] = [0.005, 0.01, 0.015, 0.02, 0.025];

/// Top-level exporter configuration
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
	#[serde(default)]
	pub listen_address: Option<String>,
	#[serde(default)]
	pub metrics_path: Option<String>,
	#[serde(default)]
	pub histogram_buckets: Vec<f64>,
	#[serde(default)]
	pub records: HashMap<String, ProbeDefinition>,
}

/// One named DNS check
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ProbeDefinition {
	/// Per-record timeout; only ever tightens the default deadline
	#[serde(default, deserialize_with = "deserialize_timeout")]
	pub timeout: Option<Duration>,
	#[serde(default)]
	pub dns_server: Option<String>,
	/// "udp" or "tcp", empty means udp
	#[serde(default)]
	pub transport_protocol: String,
	#[serde(default)]
	pub record_name: String,
	/// Record type name, empty means ANY
	#[serde(default)]
	pub record_type: String,
	/// Acceptable rcode names, empty means NOERROR only
	#[serde(default)]
	pub verify_rcodes: Vec<String>,
	#[serde(default, rename = "verify_answer_rrs")]
	pub verify_answer: Ruleset,
}

/// Regex allow/deny lists applied to answer records
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Ruleset {
	#[serde(default)]
	pub fail_if_matches_regexp: Vec<String>,
	#[serde(default)]
	pub fail_if_not_matches_regexp: Vec<String>,
}

impl Config {
	/// Parse a YAML config document and check that every record has a name.
	pub fn from_yaml(document: &str) -> Result<Self, ConfigError> {
		let config: Config = serde_yaml::from_str(document)?;
		config.validate()?;
		Ok(config)
	}

	/// Read and parse a config file from disk.
	pub fn from_file(path: &str) -> Result<Self, ConfigError> {
		let content = std::fs::read_to_string(path)
			.map_err(|source| ConfigError::Read { path: path.to_string(), source })?;
		Self::from_yaml(&content)
	}

	fn validate(&self) -> Result<(), ConfigError> {
		for (name, record) in &self.records {
			if record.record_name.trim().is_empty() {
				return Err(ConfigError::MissingRecordName(name.clone()));
			}
		}
		Ok(())
	}

	/// Configured histogram buckets, or the defaults when none are set.
	pub fn histogram_buckets_or_default(&self) -> Vec<f64> {
		if self.histogram_buckets.is_empty() {
			DEFAULT_HISTOGRAM_BUCKETS.to_vec()
		} else {
			self.histogram_buckets.clone()
		}
	}
}

/// Parse durations like "2s" or "750ms".
///
/// A negative value is accepted and stored as zero, which the probe
/// deadline logic ignores.
fn deserialize_timeout<'de, D>(deserializer: D) -> Result<Option<Duration>, D::Error>
where
	D: Deserializer<'de>,
{
	let raw: Option<String> = Option::deserialize(deserializer)?;
	let Some(raw) = raw else {
		return Ok(None);
	};
	let trimmed = raw.trim();
	if let Some(magnitude) = trimmed.strip_prefix('-') {
		humantime::parse_duration(magnitude.trim()).map_err(serde::de::Error::custom)?;
		return Ok(Some(Duration::ZERO));
	}
	humantime::parse_duration(trimmed)
		.map(Some)
		.map_err(serde::de::Error::custom)
}

#[cfg(test)]
mod tests {
	use super::*;

	const FULL_CONFIG: &str = r#"
listen_address: "127.0.0.1:9701"
metrics_path: /probe
histogram_buckets: [0.01, 0.05, 0.1]
records:
  example:
    timeout: 2s
    dns_server: 8.8.8.8
    transport_protocol: tcp
    record_name: example.com
    record_type: A
    verify_rcodes: [NOERROR, NXDOMAIN]
    verify_answer_rrs:
      fail_if_matches_regexp: ["10\\.0\\."]
      fail_if_not_matches_regexp: ["93\\.184\\."]
  minimal:
    record_name: example.org
"#;

	#[test]
	fn test_parse_full_config() {
		let config = Config::from_yaml(FULL_CONFIG).unwrap();
		assert_eq!(config.listen_address.as_deref(), Some("127.0.0.1:9701"));
		assert_eq!(config.metrics_path.as_deref(), Some("/probe"));
		assert_eq!(config.histogram_buckets, vec![0.01, 0.05, 0.1]);
		assert_eq!(config.records.len(), 2);

		let example = &config.records["example"];
		assert_eq!(example.timeout, Some(Duration::from_secs(2)));
		assert_eq!(example.dns_server.as_deref(), Some("8.8.8.8"));
		assert_eq!(example.transport_protocol, "tcp");
		assert_eq!(example.record_name, "example.com");
		assert_eq!(example.record_type, "A");
		assert_eq!(example.verify_rcodes, vec!["NOERROR", "NXDOMAIN"]);
		assert_eq!(example.verify_answer.fail_if_matches_regexp, vec!["10\\.0\\."]);
		assert_eq!(example.verify_answer.fail_if_not_matches_regexp, vec!["93\\.184\\."]);
	}

	#[test]
	fn test_minimal_record_defaults() {
		let config = Config::from_yaml(FULL_CONFIG).unwrap();
		let minimal = &config.records["minimal"];
		assert_eq!(minimal.timeout, None);
		assert_eq!(minimal.dns_server, None);
		assert!(minimal.transport_protocol.is_empty());
		assert!(minimal.record_type.is_empty());
		assert!(minimal.verify_rcodes.is_empty());
		assert!(minimal.verify_answer.fail_if_matches_regexp.is_empty());
		assert!(minimal.verify_answer.fail_if_not_matches_regexp.is_empty());
	}

	#[test]
	fn test_missing_record_name_rejected() {
		let doc = "records:\n  broken:\n    record_type: A\n";
		let result = Config::from_yaml(doc);
		match result {
			Err(ConfigError::MissingRecordName(name)) => assert_eq!(name, "broken"),
			other => panic!("expected MissingRecordName, got {:?}", other),
		}
	}

	#[test]
	fn test_empty_record_name_rejected() {
		let doc = "records:\n  broken:\n    record_name: \"\"\n";
		assert!(matches!(
			Config::from_yaml(doc),
			Err(ConfigError::MissingRecordName(_))
		));
	}

	#[test]
	fn test_unknown_top_level_field_rejected() {
		let doc = "listen_adress: \":9701\"\nrecords: {}\n";
		assert!(matches!(Config::from_yaml(doc), Err(ConfigError::Parse(_))));
	}

	#[test]
	fn test_unknown_record_field_rejected() {
		let doc = "records:\n  a:\n    record_name: example.com\n    retries: 3\n";
		assert!(matches!(Config::from_yaml(doc), Err(ConfigError::Parse(_))));
	}

	#[test]
	fn test_unknown_ruleset_field_rejected() {
		let doc = "records:\n  a:\n    record_name: example.com\n    verify_answer_rrs:\n      fail_if_none_matches_regexp: [x]\n";
		assert!(matches!(Config::from_yaml(doc), Err(ConfigError::Parse(_))));
	}

	#[test]
	fn test_timeout_formats() {
		let doc = "records:\n  a:\n    record_name: a.example\n    timeout: 750ms\n  b:\n    record_name: b.example\n    timeout: 0s\n  c:\n    record_name: c.example\n    timeout: -1s\n";
		let config = Config::from_yaml(doc).unwrap();
		assert_eq!(config.records["a"].timeout, Some(Duration::from_millis(750)));
		assert_eq!(config.records["b"].timeout, Some(Duration::ZERO));
		assert_eq!(config.records["c"].timeout, Some(Duration::ZERO));
	}

	#[test]
	fn test_invalid_timeout_rejected() {
		let doc = "records:\n  a:\n    record_name: a.example\n    timeout: soon\n";
		assert!(matches!(Config::from_yaml(doc), Err(ConfigError::Parse(_))));
	}

	#[test]
	fn test_default_buckets() {
		let config = Config::from_yaml("records: {}\n").unwrap();
		assert_eq!(config.histogram_buckets_or_default(), DEFAULT_HISTOGRAM_BUCKETS.to_vec());
	}

	#[test]
	fn test_missing_file() {
		let result = Config::from_file("/nonexistent/dns-test.yml");
		assert!(matches!(result, Err(ConfigError::Read { .. })));
	}
}
