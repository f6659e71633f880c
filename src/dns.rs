use std::time::Duration;

use hickory_proto::op::{Message, MessageType, Query};
use hickory_proto::rr::{Name, RecordType};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpStream, UdpSocket};
use tracing::debug;

use crate::error::ProbeError;
use crate::resolver::resolve_server;
use crate::transport::Transport;

/// Receive buffer for UDP responses, large enough for EDNS payloads
const UDP_BUFFER_SIZE: usize = 4096;

/// Append the root label if the name is not already fully qualified.
pub fn fqdn(name: &str) -> String {
	if name.ends_with('.') {
		name.to_string()
	} else {
		format!("{}.", name)
	}
}

/// Build a DNS query message for the given name and record type.
///
/// Recursion is requested. Returns the serialized query bytes.
pub fn build_query(
	record_name: &str,
	record_type: RecordType,
	txid: u16,
) -> Result<Vec<u8>, ProbeError> {
	let qualified = fqdn(record_name);
	let name = Name::from_ascii(&qualified)
		.map_err(|e| ProbeError::InvalidRecordName {
			name: record_name.to_string(),
			reason: e.to_string(),
		})?;

	let mut message = Message::new();
	message.set_id(txid);
	message.set_recursion_desired(true);
	message.add_query(Query::query(name, record_type));

	message.to_vec()
		.map_err(|e| ProbeError::Encode(e.to_string()))
}

/// Parse a DNS response and check that it answers the query with `expected_txid`.
pub fn parse_response(bytes: &[u8], expected_txid: u16) -> Result<Message, ProbeError> {
	let message = Message::from_vec(bytes)
		.map_err(|e| ProbeError::Malformed(e.to_string()))?;

	if message.id() != expected_txid {
		return Err(ProbeError::Malformed(format!(
			"txid mismatch: expected {}, got {}",
			expected_txid, message.id()
		)));
	}

	// Verify this is a response, not a query
	if message.message_type() != MessageType::Response {
		return Err(ProbeError::Malformed("received a query instead of a response".to_string()));
	}

	Ok(message)
}

/// Send one query and wait for its response, bounded by `timeout`.
///
/// Name resolution of the server, connection setup and the exchange itself
/// all count against the timeout.
pub async fn exchange(
	transport: Transport,
	server: &str,
	query_bytes: &[u8],
	txid: u16,
	timeout: Duration,
) -> Result<Message, ProbeError> {
	// Deadline already passed
	if timeout.is_zero() {
		return Err(ProbeError::Timeout(timeout));
	}
	let attempt = async {
		match transport {
			Transport::Udp => exchange_udp(server, query_bytes, txid).await,
			Transport::Tcp => exchange_tcp(server, query_bytes, txid).await,
		}
	};
	match tokio::time::timeout(timeout, attempt).await {
		Ok(result) => result,
		Err(_) => Err(ProbeError::Timeout(timeout)),
	}
}

/// Send a query over UDP from a dedicated socket.
///
/// Datagrams that do not parse as a response to our txid are skipped; the
/// caller's timeout ends the wait.
async fn exchange_udp(server: &str, query_bytes: &[u8], txid: u16) -> Result<Message, ProbeError> {
	let addr = resolve_server(server).await?;

	// Bind a dedicated socket for this query
	let bind_addr = if addr.is_ipv4() {
		"0.0.0.0:0"
	} else {
		"[::]:0"
	};
	let socket = UdpSocket::bind(bind_addr).await?;
	socket.connect(addr).await?;
	socket.send(query_bytes).await?;

	let mut buf = vec![0u8; UDP_BUFFER_SIZE];
	loop {
		let len = socket.recv(&mut buf).await?;
		match parse_response(&buf[..len], txid) {
			Ok(message) => return Ok(message),
			Err(e) => {
				debug!(server = %addr, err = %e, "Ignoring unexpected datagram");
			}
		}
	}
}

/// Send a query over TCP using two-byte length framing.
async fn exchange_tcp(server: &str, query_bytes: &[u8], txid: u16) -> Result<Message, ProbeError> {
	let addr = resolve_server(server).await?;
	let mut stream = TcpStream::connect(addr).await?;

	let len = u16::try_from(query_bytes.len())
		.map_err(|_| ProbeError::Encode(format!("query of {} bytes is too large", query_bytes.len())))?;
	let mut framed = Vec::with_capacity(query_bytes.len() + 2);
	framed.extend_from_slice(&len.to_be_bytes());
	framed.extend_from_slice(query_bytes);
	stream.write_all(&framed).await?;

	let mut len_buf = [0u8; 2];
	stream.read_exact(&mut len_buf).await?;
	let mut buf = vec![0u8; u16::from_be_bytes(len_buf) as usize];
	stream.read_exact(&mut buf).await?;

	parse_response(&buf, txid)
}
