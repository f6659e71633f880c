use hickory_proto::rr::Record;
use regex::Regex;
use tracing::{debug, error};

use crate::config::Ruleset;

/// Response code names and their numeric values.
///
/// BADSIG and BADVERS share code 16. NOTIMPL is accepted as an alias of
/// NOTIMP.
pub const RCODE_NAMES: &[(&str, u16)] = &[
	("NOERROR", 0),
	("FORMERR", 1),
	("SERVFAIL", 2),
	("NXDOMAIN", 3),
	("NOTIMP", 4),
	("NOTIMPL", 4),
	("REFUSED", 5),
	("YXDOMAIN", 6),
	("YXRRSET", 7),
	("NXRRSET", 8),
	("NOTAUTH", 9),
	("NOTZONE", 10),
	("BADSIG", 16),
	("BADVERS", 16),
	("BADKEY", 17),
	("BADTIME", 18),
	("BADMODE", 19),
	("BADNAME", 20),
	("BADALG", 21),
	("BADTRUNC", 22),
	("BADCOOKIE", 23),
];

/// Look up the numeric value of an rcode name.
pub fn rcode_from_name(name: &str) -> Option<u16> {
	RCODE_NAMES.iter()
		.find(|(known, _)| *known == name)
		.map(|(_, code)| *code)
}

/// Look up the first name registered for a numeric rcode.
pub fn rcode_name(code: u16) -> Option<&'static str> {
	RCODE_NAMES.iter()
		.find(|(_, known)| *known == code)
		.map(|(name, _)| *name)
}

/// Check an observed rcode against a list of acceptable rcode names.
///
/// An empty list accepts only NOERROR. Any unknown name in the list fails
/// the check outright, whatever the observed code.
pub fn validate_rcode(code: u16, allowed: &[String]) -> bool {
	let mut allowed_codes = Vec::with_capacity(allowed.len().max(1));
	if allowed.is_empty() {
		allowed_codes.push(0);
	} else {
		for name in allowed {
			match rcode_from_name(name) {
				Some(value) => allowed_codes.push(value),
				None => {
					let known: Vec<&str> = RCODE_NAMES.iter().map(|(n, _)| *n).collect();
					error!(rcode = %name, known_rcodes = ?known, "Invalid rcode");
					return false;
				}
			}
		}
	}

	if allowed_codes.contains(&code) {
		debug!(rcode = code, name = rcode_name(code).unwrap_or("UNKNOWN"), "Rcode is valid");
		return true;
	}
	error!(
		rcode = code,
		name = rcode_name(code).unwrap_or("UNKNOWN"),
		valid_rcodes = ?allowed_codes,
		"Rcode is not one of the valid rcodes"
	);
	false
}

/// Check answer records against a ruleset.
///
/// Every record is rendered in presentation form and must match none of
/// `fail_if_matches_regexp` and all of `fail_if_not_matches_regexp`. A
/// pattern that does not compile fails the check.
pub fn validate_answers(records: &[Record], ruleset: &Ruleset) -> bool {
	if records.is_empty() && !ruleset.fail_if_not_matches_regexp.is_empty() {
		error!("'fail_if_not_matches_regexp' specified but no RRs returned");
		return false;
	}

	for record in records {
		let text = record.to_string();
		debug!(rr = %text, "Validating RR");

		for pattern in &ruleset.fail_if_matches_regexp {
			match is_match(pattern, &text) {
				Some(false) => {}
				Some(true) => {
					error!(regexp = %pattern, rr = %text, "RR matched regexp");
					return false;
				}
				None => return false,
			}
		}

		for pattern in &ruleset.fail_if_not_matches_regexp {
			match is_match(pattern, &text) {
				Some(true) => {}
				Some(false) => {
					error!(regexp = %pattern, rr = %text, "RR did not match regexp");
					return false;
				}
				None => return false,
			}
		}
	}

	true
}

/// Unanchored regex search; None when the pattern does not compile.
fn is_match(pattern: &str, text: &str) -> Option<bool> {
	match Regex::new(pattern) {
		Ok(re) => Some(re.is_match(text)),
		Err(e) => {
			error!(regexp = %pattern, err = %e, "Error matching regexp");
			None
		}
	}
}
