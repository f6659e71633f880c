use std::net::{IpAddr, SocketAddr};

use tokio::net::lookup_host;

use crate::error::ProbeError;

/// Port used when a server address does not name one
pub const DEFAULT_DNS_PORT: u16 = 53;

/// Append the default DNS port to a server address that lacks one.
///
/// Supports formats:
///   "1.1.1.1"              -- IPv4, default port 53
///   "1.1.1.1:5353"         -- IPv4 with explicit port
///   "2606:4700::1111"      -- bare IPv6, default port 53
///   "[2606:4700::1111]"    -- bracketed IPv6, default port 53
///   "[2606:4700::1111]:53" -- bracketed IPv6 with port
///   "dns.example"          -- hostname, default port 53
///   "dns.example:5353"     -- hostname with port
pub fn normalize_server(input: &str) -> String {
	let trimmed = input.trim();

	if trimmed.parse::<SocketAddr>().is_ok() {
		return trimmed.to_string();
	}
	// Bare IPv4 or IPv6 literal
	if let Ok(ip) = trimmed.parse::<IpAddr>() {
		return SocketAddr::new(ip, DEFAULT_DNS_PORT).to_string();
	}
	if let Some(inner) = trimmed.strip_prefix('[').and_then(|s| s.strip_suffix(']')) {
		return format!("[{}]:{}", inner, DEFAULT_DNS_PORT);
	}
	// Hostname that already carries a port
	if let Some((host, port)) = trimmed.rsplit_once(':') {
		if !host.is_empty() && !host.contains(':') && port.parse::<u16>().is_ok() {
			return trimmed.to_string();
		}
	}
	format!("{}:{}", trimmed, DEFAULT_DNS_PORT)
}

/// Resolve a normalized "host:port" string to the first socket address.
pub async fn resolve_server(server: &str) -> Result<SocketAddr, ProbeError> {
	lookup_host(server).await?
		.next()
		.ok_or_else(|| ProbeError::UnresolvedServer(server.to_string()))
}
