use std::time::Duration;

use hickory_proto::rr::RecordType;
use tokio::time::Instant;
use tracing::{debug, error};

use crate::config::ProbeDefinition;
use crate::dns::{build_query, exchange};
use crate::error::ProbeError;
use crate::resolver::normalize_server;
use crate::transport::{ProbeOutcome, Transport};
use crate::validate::{validate_answers, validate_rcode};

/// Upper bound on how long a single probe may run
pub const DEFAULT_PROBE_TIMEOUT: Duration = Duration::from_secs(5);

/// Timeout for a probe given the definition's own timeout.
///
/// The configured value only applies when it is positive and below the
/// default ceiling; zero or oversized values fall back to the ceiling.
pub fn effective_timeout(configured: Option<Duration>) -> Duration {
	match configured {
		Some(timeout) if !timeout.is_zero() && timeout < DEFAULT_PROBE_TIMEOUT => timeout,
		_ => DEFAULT_PROBE_TIMEOUT,
	}
}

/// Record type names and their numeric values.
///
/// Names are matched exactly, so "mx" and "*" are not record types.
pub const RECORD_TYPE_NAMES: &[(&str, u16)] = &[
	("None", 0),
	("A", 1),
	("NS", 2),
	("MD", 3),
	("MF", 4),
	("CNAME", 5),
	("SOA", 6),
	("MB", 7),
	("MG", 8),
	("MR", 9),
	("NULL", 10),
	("WKS", 11),
	("PTR", 12),
	("HINFO", 13),
	("MINFO", 14),
	("MX", 15),
	("TXT", 16),
	("RP", 17),
	("AFSDB", 18),
	("X25", 19),
	("ISDN", 20),
	("RT", 21),
	("NSAP-PTR", 23),
	("SIG", 24),
	("KEY", 25),
	("PX", 26),
	("GPOS", 27),
	("AAAA", 28),
	("LOC", 29),
	("NXT", 30),
	("EID", 31),
	("NIMLOC", 32),
	("SRV", 33),
	("ATMA", 34),
	("NAPTR", 35),
	("KX", 36),
	("CERT", 37),
	("DNAME", 39),
	("OPT", 41),
	("APL", 42),
	("DS", 43),
	("SSHFP", 44),
	("IPSECKEY", 45),
	("RRSIG", 46),
	("NSEC", 47),
	("DNSKEY", 48),
	("DHCID", 49),
	("NSEC3", 50),
	("NSEC3PARAM", 51),
	("TLSA", 52),
	("SMIMEA", 53),
	("HIP", 55),
	("NINFO", 56),
	("RKEY", 57),
	("TALINK", 58),
	("CDS", 59),
	("CDNSKEY", 60),
	("OPENPGPKEY", 61),
	("CSYNC", 62),
	("ZONEMD", 63),
	("SVCB", 64),
	("HTTPS", 65),
	("SPF", 99),
	("UINFO", 100),
	("UID", 101),
	("GID", 102),
	("UNSPEC", 103),
	("NID", 104),
	("L32", 105),
	("L64", 106),
	("LP", 107),
	("EUI48", 108),
	("EUI64", 109),
	("TKEY", 249),
	("TSIG", 250),
	("IXFR", 251),
	("AXFR", 252),
	("MAILB", 253),
	("MAILA", 254),
	("ANY", 255),
	("URI", 256),
	("CAA", 257),
	("AVC", 258),
	("AMTRELAY", 260),
	("TA", 32768),
	("DLV", 32769),
	("Reserved", 65535),
];

/// Resolve a configured record type name; an empty name means ANY.
pub fn resolve_record_type(name: &str) -> Result<RecordType, ProbeError> {
	if name.is_empty() {
		return Ok(RecordType::ANY);
	}
	RECORD_TYPE_NAMES.iter()
		.find(|(known, _)| *known == name)
		.map(|(_, code)| RecordType::from(*code))
		.ok_or_else(|| ProbeError::InvalidRecordType(name.to_string()))
}

/// Run one DNS probe against `server` and validate the response.
///
/// Never fails: configuration problems, transport errors and validation
/// failures all produce an unsuccessful outcome. The elapsed time covers the
/// query exchange only and is reported whether or not the probe succeeded.
pub async fn probe(deadline: Instant, server: &str, definition: &ProbeDefinition) -> ProbeOutcome {
	let record_type = match resolve_record_type(&definition.record_type) {
		Ok(record_type) => record_type,
		Err(e) => {
			error!(err = %e, "Invalid record type");
			return ProbeOutcome::rejected();
		}
	};

	let transport = match Transport::from_config(&definition.transport_protocol) {
		Ok(transport) => transport,
		Err(e) => {
			error!(err = %e, "Configuration error");
			return ProbeOutcome::rejected();
		}
	};

	let server = normalize_server(server);
	let txid: u16 = rand::random();
	let query_bytes = match build_query(&definition.record_name, record_type, txid) {
		Ok(bytes) => bytes,
		Err(e) => {
			error!(err = %e, "Could not build DNS query");
			return ProbeOutcome::rejected();
		}
	};

	// A deadline in the past leaves a zero timeout and the exchange fails immediately
	let timeout = deadline.saturating_duration_since(Instant::now());
	debug!(
		server = %server,
		protocol = %transport,
		record = %definition.record_name,
		record_type = %record_type,
		timeout_ms = timeout.as_millis() as u64,
		"Making DNS query"
	);

	let start = Instant::now();
	let result = exchange(transport, &server, &query_bytes, txid, timeout).await;
	let elapsed = start.elapsed();

	let response = match result {
		Ok(response) => response,
		Err(e) => {
			error!(server = %server, err = %e, "Error while sending a DNS query");
			return ProbeOutcome { success: false, elapsed };
		}
	};
	debug!(response = ?response, "Got response");

	debug!("Validating response codes");
	if !validate_rcode(u16::from(response.response_code()), &definition.verify_rcodes) {
		return ProbeOutcome { success: false, elapsed };
	}

	debug!("Validating Answer RRs");
	let success = validate_answers(response.answers(), &definition.verify_answer);
	ProbeOutcome { success, elapsed }
}
