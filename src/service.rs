//! Discovered service records

use once_cell::sync::{Lazy, OnceCell};
use regex::Regex;
use std::net::SocketAddr;

/// The header fields of an SSDP message, in the order they appeared on the wire.
///
/// Lookups are case-insensitive, returning the first matching field.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Headers(Vec<(String, String)>);
impl Headers {
	pub(crate) fn push(&mut self, name: String, value: String) {
		self.0.push((name, value));
	}

	/// Returns the value of the first header with the given name (case-insensitive).
	pub fn get(&self, name: &str) -> Option<&str> {
		self.0
			.iter()
			.find(|(key, _)| key.eq_ignore_ascii_case(name))
			.map(|(_, value)| value.as_str())
	}

	/// Iterates over all `(name, value)` pairs.
	pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
		self.0.iter().map(|(key, value)| (key.as_str(), value.as_str()))
	}

	pub fn len(&self) -> usize {
		self.0.len()
	}

	pub fn is_empty(&self) -> bool {
		self.0.is_empty()
	}
}

/// One observed SSDP advertisement or search response.
///
/// Records are keyed by [`unique_id`](Service::unique_id) in the discovery
/// registry; a newer observation for the same id replaces the older one
/// wholesale.
#[derive(Clone, Debug)]
pub struct Service {
	/// The address the datagram arrived from.
	pub origin: SocketAddr,

	/// The advertised service type (`NT`, or `ST` for search responses).
	pub service_type: String,

	/// The advertised Unique Service Name (`USN`), the identity key.
	pub unique_id: String,

	/// The URL where the service's description can be fetched (`LOCATION`).
	pub location: String,

	/// Free-text software identification (`SERVER`).
	pub server: String,

	pub(crate) headers: Headers,
	pub(crate) max_age: OnceCell<i32>,
}
impl Service {
	/// The full header set of the message this record was parsed from.
	pub fn headers(&self) -> &Headers {
		&self.headers
	}

	/// The `max-age` value of the `CACHE-CONTROL` header, in seconds, or `-1`
	/// if the message carried no parseable value.
	///
	/// Computed on first access and memoized for the life of the record.
	pub fn max_age(&self) -> i32 {
		*self
			.max_age
			.get_or_init(|| extract_max_age(self.headers.get("CACHE-CONTROL").unwrap_or(""), -1))
	}
}

static RX_MAX_AGE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)\bmax-age\s*=\s*(\d+)\b").unwrap());

/// Extracts the first `max-age=<seconds>` token from a free-text header
/// value, falling back to `default` when absent or out of `i32` range.
pub(crate) fn extract_max_age(value: &str, default: i32) -> i32 {
	RX_MAX_AGE
		.captures(value)
		.and_then(|captures| captures[1].parse::<i32>().ok())
		.unwrap_or(default)
}
