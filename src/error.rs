//! Crate-level error types shared by the provider, the credential cache, and the signer.

// self
use crate::_prelude::*;

/// Crate-wide result type alias returning [`Error`] by default.
pub type Result<T, E = Error> = std::result::Result<T, E>;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Canonical error exposed by public APIs.
#[derive(Debug, ThisError)]
pub enum Error {
	/// Local configuration problem.
	#[error(transparent)]
	Config(#[from] ConfigError),
	/// Token endpoint was unreachable or rejected the exchange.
	#[error("Failed to load credentials: {0}")]
	Endpoint(#[from] EndpointError),
	/// Token endpoint answered with a body that could not be decoded.
	#[error("Failed to load credentials: {0}")]
	Decode(#[from] DecodeError),
}
impl Error {
	/// Returns `true` for [`Error::Endpoint`].
	pub fn is_endpoint(&self) -> bool {
		matches!(self, Self::Endpoint(_))
	}

	/// Returns `true` for [`Error::Decode`].
	pub fn is_decode(&self) -> bool {
		matches!(self, Self::Decode(_))
	}
}

/// Configuration and validation failures.
#[derive(Debug, ThisError)]
pub enum ConfigError {
	/// HTTP client could not be constructed.
	#[error("HTTP client could not be constructed.")]
	HttpClientBuild {
		/// Underlying transport builder failure.
		#[source]
		source: BoxError,
	},
	/// HTTP request construction failed.
	#[error(transparent)]
	HttpRequest(#[from] oauth2::http::Error),
	/// Custom IAM endpoint does not form a valid token URL.
	#[error("IAM endpoint `{endpoint}` is not a valid URL.")]
	InvalidEndpoint {
		/// Token URL that failed to parse.
		endpoint: String,
		/// Underlying parsing failure.
		#[source]
		source: url::ParseError,
	},
	/// Credential material cannot be carried in an HTTP header.
	#[error("Credential cannot be encoded into the `{header}` header.")]
	InvalidHeaderValue {
		/// Header that rejected the value.
		header: &'static str,
		/// Underlying header validation failure.
		#[source]
		source: oauth2::http::header::InvalidHeaderValue,
	},
}
impl ConfigError {
	/// Wraps a transport's builder failure inside [`ConfigError`].
	pub fn http_client_build(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::HttpClientBuild { source: Box::new(src) }
	}
}
#[cfg(feature = "reqwest")]
impl From<ReqwestError> for ConfigError {
	fn from(e: ReqwestError) -> Self {
		Self::http_client_build(e)
	}
}

/// Token endpoint failures (non-success status or transport).
#[derive(Debug, ThisError)]
pub enum EndpointError {
	/// Token endpoint responded with something other than `200 OK`.
	#[error("Server returned status {status} instead of 200.")]
	Status {
		/// HTTP status code returned by the endpoint.
		status: u16,
		/// Bounded preview of the response body, when one was sent.
		body_preview: Option<String>,
	},
	/// Underlying HTTP client reported a network or IO failure.
	#[error("Network error occurred while calling the token endpoint.")]
	Transport {
		/// Transport-specific failure.
		#[source]
		source: BoxError,
	},
}
impl EndpointError {
	const BODY_PREVIEW_LIMIT: usize = 256;

	/// Wraps a transport-specific failure.
	pub fn transport(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::Transport { source: Box::new(src) }
	}

	/// Builds a [`EndpointError::Status`] from a status code and the raw response body.
	pub fn status(status: u16, body: &[u8]) -> Self {
		Self::Status { status, body_preview: body_preview(body, Self::BODY_PREVIEW_LIMIT) }
	}

	/// HTTP status code, when the endpoint answered at all.
	pub fn http_status(&self) -> Option<u16> {
		match self {
			Self::Status { status, .. } => Some(*status),
			Self::Transport { .. } => None,
		}
	}
}

/// Token response decoding failures.
#[derive(Debug, ThisError)]
pub enum DecodeError {
	/// Body is not the expected JSON document.
	#[error("Token endpoint returned malformed JSON.")]
	Json {
		/// Structured parsing failure including the offending path.
		#[source]
		source: serde_path_to_error::Error<serde_json::Error>,
	},
	/// The `expiration` timestamp cannot be represented.
	#[error("Token expiration {expiration} is outside the supported range.")]
	ExpirationOutOfRange {
		/// Raw unix timestamp from the response.
		expiration: i64,
	},
}

fn body_preview(body: &[u8], limit: usize) -> Option<String> {
	if body.is_empty() {
		return None;
	}

	let text = String::from_utf8_lossy(body);

	if text.chars().count() <= limit {
		return Some(text.into_owned());
	}

	let mut preview = text.chars().take(limit).collect::<String>();

	preview.push('…');

	Some(preview)
}
