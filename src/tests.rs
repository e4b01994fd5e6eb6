use crate::{
	discovery::Discovery,
	errors::ServiceParseError,
	message::{build_search, parse_service},
	registry::Registry,
	service::{extract_max_age, Headers, Service},
};
use once_cell::sync::OnceCell;
use std::net::SocketAddr;

fn origin() -> SocketAddr {
	"10.0.0.5:1900".parse().unwrap()
}

const NOTIFY: &[u8] = b"NOTIFY * HTTP/1.1\r\n\
	NT: urn:test:service:1\r\n\
	USN: uuid:abc123::urn:test:service:1\r\n\
	LOCATION: http://10.0.0.5:80/desc.xml\r\n\
	SERVER: test/1.0\r\n\
	CACHE-CONTROL: max-age=1800\r\n\
	\r\n";

#[test]
fn test_extract_max_age() {
	assert_eq!(extract_max_age("max-age=1800", -1), 1800);
	assert_eq!(extract_max_age("no-cache, MAX-AGE = 60", -1), 60);
	assert_eq!(extract_max_age("max-age=0", -1), 0);
	assert_eq!(extract_max_age("max-age=10, max-age=20", -1), 10);

	// No parseable token: the default wins
	assert_eq!(extract_max_age("", -1), -1);
	assert_eq!(extract_max_age("no-cache", 7), 7);
	assert_eq!(extract_max_age("maxage=5", -1), -1);
	assert_eq!(extract_max_age("xmax-age=5", -1), -1);
	assert_eq!(extract_max_age("max-age=", -1), -1);

	// Too big for an i32
	assert_eq!(extract_max_age("max-age=99999999999", -1), -1);
}

#[test]
fn test_max_age_memoized() {
	let mut headers = Headers::default();
	headers.push("CACHE-CONTROL".to_string(), "max-age=100".to_string());

	let mut service = Service {
		origin: origin(),
		service_type: "urn:test:service:1".to_string(),
		unique_id: "uuid:memo".to_string(),
		location: String::new(),
		server: String::new(),
		headers,
		max_age: OnceCell::new(),
	};

	assert_eq!(service.max_age(), 100);

	// Swapping the headers out from under the record must not recompute
	let mut headers = Headers::default();
	headers.push("CACHE-CONTROL".to_string(), "max-age=999".to_string());
	service.headers = headers;

	assert_eq!(service.max_age(), 100);
}

#[test]
fn test_max_age_defaults_to_sentinel() {
	let service = Service {
		origin: origin(),
		service_type: "urn:test:service:1".to_string(),
		unique_id: "uuid:nocache".to_string(),
		location: String::new(),
		server: String::new(),
		headers: Headers::default(),
		max_age: OnceCell::new(),
	};

	assert_eq!(service.max_age(), -1);
	assert_eq!(service.max_age(), -1);
}

#[test]
fn test_parse_well_formed() {
	let service = parse_service(origin(), NOTIFY).unwrap();

	assert_eq!(service.origin, origin());
	assert_eq!(service.service_type, "urn:test:service:1");
	assert_eq!(service.unique_id, "uuid:abc123::urn:test:service:1");
	assert_eq!(service.location, "http://10.0.0.5:80/desc.xml");
	assert_eq!(service.server, "test/1.0");
	assert_eq!(service.headers().len(), 5);
	assert_eq!(service.headers().get("cache-control"), Some("max-age=1800"));
}

#[test]
fn test_parse_missing_terminator() {
	// Several real devices omit the trailing blank line
	let truncated = &NOTIFY[..NOTIFY.len() - 4];
	assert!(!truncated.ends_with(b"\r\n\r\n"));

	let with = parse_service(origin(), NOTIFY).unwrap();
	let without = parse_service(origin(), truncated).unwrap();

	assert_eq!(with.service_type, without.service_type);
	assert_eq!(with.unique_id, without.unique_id);
	assert_eq!(with.location, without.location);
	assert_eq!(with.server, without.server);
	assert_eq!(with.headers(), without.headers());
}

#[test]
fn test_parse_search_response_uses_st() {
	// M-SEARCH responses carry ST instead of NT
	let response = b"HTTP/1.1 200 OK\r\n\
		ST: upnp:rootdevice\r\n\
		USN: uuid:def456::upnp:rootdevice\r\n\
		LOCATION: http://10.0.0.6:80/desc.xml\r\n\
		SERVER: test/2.0\r\n\
		\r\n";

	let service = parse_service(origin(), response).unwrap();
	assert_eq!(service.service_type, "upnp:rootdevice");
	assert_eq!(service.unique_id, "uuid:def456::upnp:rootdevice");
}

#[test]
fn test_parse_missing_preamble() {
	assert!(matches!(parse_service(origin(), b""), Err(ServiceParseError::MissingHttpPreamble)));

	// A failure must not poison later parses
	assert!(parse_service(origin(), NOTIFY).is_ok());
}

#[test]
fn test_parse_malformed_header_line() {
	let garbled = b"NOTIFY * HTTP/1.1\r\nthis line has no separator\r\n\r\n";

	match parse_service(origin(), garbled) {
		Err(ServiceParseError::MalformedHeaderLine(line)) => assert_eq!(line, "this line has no separator"),
		other => panic!("expected MalformedHeaderLine, got {other:?}"),
	}
}

#[test]
fn test_registry_upsert_idempotent() {
	let registry = Registry::new();

	for _ in 0..3 {
		registry.upsert(parse_service(origin(), NOTIFY).unwrap());
	}

	assert_eq!(registry.len(), 1);

	let snapshot = registry.snapshot();
	assert_eq!(snapshot.len(), 1);
	assert_eq!(snapshot[0].unique_id, "uuid:abc123::urn:test:service:1");
	assert_eq!(snapshot[0].location, "http://10.0.0.5:80/desc.xml");
}

#[test]
fn test_registry_upsert_replaces() {
	let registry = Registry::new();
	registry.upsert(parse_service(origin(), NOTIFY).unwrap());

	let moved = b"NOTIFY * HTTP/1.1\r\n\
		NT: urn:test:service:1\r\n\
		USN: uuid:abc123::urn:test:service:1\r\n\
		LOCATION: http://10.0.0.9:80/desc.xml\r\n\
		SERVER: test/1.1\r\n\
		\r\n";
	registry.upsert(parse_service("10.0.0.9:1900".parse().unwrap(), moved).unwrap());

	let snapshot = registry.snapshot();
	assert_eq!(snapshot.len(), 1);
	assert_eq!(snapshot[0].location, "http://10.0.0.9:80/desc.xml");
	assert_eq!(snapshot[0].server, "test/1.1");
	assert_eq!(snapshot[0].origin, "10.0.0.9:1900".parse::<SocketAddr>().unwrap());
}

#[test]
fn test_synthetic_notify_end_to_end() {
	let registry = Registry::new();

	let service = parse_service(origin(), NOTIFY).unwrap();
	assert!(!service.service_type.is_empty());
	registry.upsert(service);

	let snapshot = registry.snapshot();
	assert_eq!(snapshot.len(), 1);

	let service = &snapshot[0];
	assert_eq!(service.unique_id, "uuid:abc123::urn:test:service:1");
	assert_eq!(service.service_type, "urn:test:service:1");
	assert_eq!(service.location, "http://10.0.0.5:80/desc.xml");
	assert_eq!(service.server, "test/1.0");
	assert_eq!(service.max_age(), 1800);
}

#[test]
fn test_listener_ignores_bare_queries() {
	let registry = Registry::new();

	// A peer's M-SEARCH heard on the group parses with a non-empty service
	// type (from ST) but no USN; it must never reach the registry.
	let query = build_search("ssdp:all", 3);
	let parsed = parse_service(origin(), &query).unwrap();
	assert!(!parsed.service_type.is_empty());
	assert!(parsed.unique_id.is_empty());

	Discovery::recv_multicast(&registry, origin(), &query);
	assert_eq!(registry.len(), 0);

	// Real advertisements still land
	Discovery::recv_multicast(&registry, origin(), NOTIFY);
	assert_eq!(registry.len(), 1);
	assert_eq!(registry.snapshot()[0].unique_id, "uuid:abc123::urn:test:service:1");
}

#[test]
fn test_build_search_wire_format() {
	let query = build_search("ssdp:all", 5);

	assert_eq!(
		query,
		b"M-SEARCH * HTTP/1.1\r\n\
			HOST: 239.255.255.250:1900\r\n\
			MAN: \"ssdp:discover\"\r\n\
			MX: 5\r\n\
			ST: ssdp:all\r\n\
			\r\n"
	);

	// Our own queries must survive a round trip through the parser,
	// since the listener hears them on the group too
	let parsed = parse_service(origin(), &query).unwrap();
	assert_eq!(parsed.service_type, "ssdp:all");
	assert_eq!(parsed.unique_id, "");
}
