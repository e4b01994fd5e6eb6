#[derive(Debug, Error)]
/// A received datagram could not be interpreted as an SSDP message.
pub enum ServiceParseError {
	#[error("datagram does not begin with an HTTP preamble")]
	/// After status-line substitution, the payload still does not start with `HTTP`.
	MissingHttpPreamble,

	#[error("malformed header line: {0:?}")]
	/// A header line contained no `:` separator.
	MalformedHeaderLine(String),
}
