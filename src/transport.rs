use std::fmt;
use std::time::Duration;

use crate::error::ProbeError;

/// Transport used to send a probe query
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transport {
	Udp,
	Tcp,
}

impl Transport {
	/// Resolve a configured protocol name; an empty name means UDP.
	pub fn from_config(name: &str) -> Result<Self, ProbeError> {
		match name {
			"" | "udp" => Ok(Transport::Udp),
			"tcp" => Ok(Transport::Tcp),
			other => Err(ProbeError::InvalidTransport(other.to_string())),
		}
	}
}

impl fmt::Display for Transport {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Transport::Udp => f.write_str("udp"),
			Transport::Tcp => f.write_str("tcp"),
		}
	}
}

/// Result of a single probe
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProbeOutcome {
	pub success: bool,
	/// Time spent on the query itself, zero if no query was sent
	pub elapsed: Duration,
}

impl ProbeOutcome {
	/// Outcome for a probe rejected before any query was sent.
	pub fn rejected() -> Self {
		Self { success: false, elapsed: Duration::ZERO }
	}

	pub fn elapsed_seconds(&self) -> f64 {
		self.elapsed.as_secs_f64()
	}
}
