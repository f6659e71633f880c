//! Error types for configuration loading and probe execution.

use std::time::Duration;

use thiserror::Error;

/// Errors raised while loading or validating the configuration document.
///
/// These are the only errors that propagate to the caller; the store is left
/// untouched when one is returned.
#[derive(Debug, Error)]
pub enum ConfigError {
	/// The config file could not be read
	#[error("failed to read config file '{path}': {source}")]
	Read {
		path: String,
		#[source]
		source: std::io::Error,
	},

	/// The document is not valid YAML or does not match the schema
	#[error("error parsing config file: {0}")]
	Parse(#[from] serde_yaml::Error),

	/// A record definition has no query name
	#[error("record '{0}': query name must be set")]
	MissingRecordName(String),
}

/// Errors raised while executing a single probe.
///
/// None of these leave the probe engine: each one is logged and turned into a
/// failed outcome.
#[derive(Debug, Error)]
pub enum ProbeError {
	/// Record type name not found in the DNS type table
	#[error("invalid record type '{0}'")]
	InvalidRecordType(String),

	/// Transport protocol other than udp or tcp
	#[error("expected transport protocol 'udp' or 'tcp', got '{0}'")]
	InvalidTransport(String),

	/// Record name cannot be encoded as a DNS name
	#[error("invalid record name '{name}': {reason}")]
	InvalidRecordName { name: String, reason: String },

	/// Query message could not be serialized
	#[error("failed to serialize DNS query: {0}")]
	Encode(String),

	/// Server address did not resolve to any socket address
	#[error("could not resolve DNS server address '{0}'")]
	UnresolvedServer(String),

	/// Network error while talking to the server
	#[error("IO error: {0}")]
	Io(#[from] std::io::Error),

	/// No response before the deadline
	#[error("DNS query timed out after {0:?}")]
	Timeout(Duration),

	/// Response could not be parsed or does not answer our query
	#[error("malformed DNS response: {0}")]
	Malformed(String),
}
