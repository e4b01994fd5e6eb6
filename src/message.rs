use crate::{
	errors::ServiceParseError,
	service::{Headers, Service},
	SSDP_PORT, SSDP_V4_IP,
};
use once_cell::sync::OnceCell;
use std::net::SocketAddr;

const CRLF: &str = "\r\n";
const STATUS_LINE: &str = "HTTP/1.1 200 OK";

/// Builds an M-SEARCH query for the given search target.
///
/// `mx_secs` is the protocol's advisory "how long responders may wait before
/// replying" hint; it is embedded in the message and nothing more.
pub(crate) fn build_search(search_target: &str, mx_secs: u32) -> Vec<u8> {
	let mut msg = String::new();
	msg.push_str("M-SEARCH * HTTP/1.1");
	msg.push_str(CRLF);
	msg.push_str(&format!("HOST: {SSDP_V4_IP}:{SSDP_PORT}"));
	msg.push_str(CRLF);
	msg.push_str("MAN: \"ssdp:discover\"");
	msg.push_str(CRLF);
	msg.push_str(&format!("MX: {mx_secs}"));
	msg.push_str(CRLF);
	msg.push_str(&format!("ST: {search_target}"));
	msg.push_str(CRLF);
	msg.push_str(CRLF);
	msg.into_bytes()
}

/// Parses a received datagram into a [`Service`] record.
///
/// SSDP traffic on the group is loosely typed: the first line may be a
/// NOTIFY request line, an M-SEARCH query line or a proper status line, and
/// several real devices omit the trailing blank line. The first line is
/// substituted with a synthetic status line and the terminator is appended
/// when missing, so that everything after line one can be read uniformly as
/// a header block.
pub(crate) fn parse_service(origin: SocketAddr, data: &[u8]) -> Result<Service, ServiceParseError> {
	let text = String::from_utf8_lossy(data);

	let mut lines: Vec<&str> = if text.is_empty() { Vec::new() } else { text.split(CRLF).collect() };
	if let Some(first) = lines.first_mut() {
		*first = STATUS_LINE;
	}

	let mut data = lines.join(CRLF);

	if !data.starts_with("HTTP") {
		return Err(ServiceParseError::MissingHttpPreamble);
	}

	// Complement the terminator on the tail of the header block for buggy
	// SSDP responders.
	if !data.ends_with("\r\n\r\n") {
		data.push_str(CRLF);
		data.push_str(CRLF);
	}

	let mut headers = Headers::default();
	for line in data.split(CRLF).skip(1) {
		if line.is_empty() {
			break;
		}

		let (name, value) = line
			.split_once(':')
			.ok_or_else(|| ServiceParseError::MalformedHeaderLine(line.to_string()))?;

		headers.push(name.trim().to_string(), value.trim().to_string());
	}

	let header = |name: &str| headers.get(name).unwrap_or("").to_string();

	Ok(Service {
		origin,
		service_type: match headers.get("NT") {
			Some(nt) => nt.to_string(),
			None => header("ST"),
		},
		unique_id: header("USN"),
		location: header("LOCATION"),
		server: header("SERVER"),
		headers,
		max_age: OnceCell::new(),
	})
}
