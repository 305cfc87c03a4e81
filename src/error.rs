//! Courier-level error types shared across the signer, limiter, dispatcher, and transports.

// self
use crate::_prelude::*;

/// Courier-wide result type alias returning [`Error`] by default.
pub type Result<T, E = Error> = std::result::Result<T, E>;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Canonical courier error exposed by public APIs.
#[derive(Debug, ThisError)]
pub enum Error {
	/// Local configuration problem.
	#[error(transparent)]
	Config(#[from] ConfigError),
	/// Every budgeted attempt failed.
	#[error("Request to {url} failed after {attempts} attempts: {last}")]
	RetriesExhausted {
		/// Fully resolved target URL.
		url: Url,
		/// Number of HTTP calls issued, rate-limited ones included.
		attempts: u32,
		/// Failure observed on the final attempt.
		#[source]
		last: AttemptError,
	},
	/// Response body could not be decoded into the requested type.
	#[error("Response body from {url} could not be decoded.")]
	Decode {
		/// URL that produced the body.
		url: Url,
		/// Structured parsing failure.
		#[source]
		source: serde_path_to_error::Error<serde_json::Error>,
	},
}

/// Configuration and validation failures raised by the courier.
#[derive(Debug, ThisError)]
pub enum ConfigError {
	/// HTTP client could not be constructed.
	#[error("HTTP client could not be constructed.")]
	HttpClientBuild {
		/// Underlying transport builder failure.
		#[source]
		source: BoxError,
	},
	/// Shared secret is empty.
	#[error("Shared secret must not be empty.")]
	EmptySecret,
	/// Shared secret cannot key the HMAC.
	#[error("Shared secret cannot be used as an HMAC-SHA256 key.")]
	InvalidSigningKey,
	/// Rate ceiling is zero.
	#[error("Maximum requests per window must be at least 1.")]
	ZeroRateLimit,
	/// Target base URL cannot be parsed.
	#[error("Target URL `{value}` is invalid.")]
	InvalidTargetUrl {
		/// Raw value supplied by the caller.
		value: String,
		/// Underlying parsing failure.
		#[source]
		source: url::ParseError,
	},
	/// Request path cannot be resolved against the target base URL.
	#[error("Request path `{path}` cannot be resolved against the target URL.")]
	InvalidRequestPath {
		/// Path supplied by the caller.
		path: String,
		/// Underlying parsing failure.
		#[source]
		source: url::ParseError,
	},
	/// Authorization header value contains invalid bytes.
	#[error("Authorization header value is invalid.")]
	InvalidHeader(#[from] http::header::InvalidHeaderValue),
	/// Request payload could not be serialized.
	#[error("Request payload could not be serialized.")]
	Payload(#[from] serde_json::Error),
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

/// Failure of a single outbound attempt, classified for retry handling.
#[derive(Debug, ThisError)]
pub enum AttemptError {
	/// Remote rejected the request token.
	#[error("Remote rejected the request with HTTP 401.")]
	Unauthorized,
	/// Remote answered with a non-success status other than 401 or 429.
	#[error("Remote answered with HTTP {status}.")]
	Status {
		/// HTTP status code.
		status: u16,
		/// Leading portion of the response body, for diagnostics.
		body_preview: Option<String>,
	},
	/// Call never produced a response.
	#[error(transparent)]
	Transport(#[from] TransportError),
}
impl AttemptError {
	const BODY_PREVIEW_LIMIT: usize = 256;

	/// Builds a status failure, keeping a bounded preview of the body.
	pub fn status(status: u16, body: &[u8]) -> Self {
		let body_preview = if body.is_empty() {
			None
		} else {
			Some(truncate_preview(&String::from_utf8_lossy(body)))
		};

		Self::Status { status, body_preview }
	}

	/// Returns the HTTP status associated with the failure, if any.
	pub fn http_status(&self) -> Option<u16> {
		match self {
			Self::Unauthorized => Some(401),
			Self::Status { status, .. } => Some(*status),
			Self::Transport(_) => None,
		}
	}
}

/// Transport-level failures (network, timeout).
#[derive(Debug, ThisError)]
pub enum TransportError {
	/// Call exceeded the per-call timeout.
	#[error("Request timed out.")]
	Timeout,
	/// Underlying HTTP client reported a network failure.
	#[error("Network error occurred while calling the remote service.")]
	Network {
		/// Transport-specific network error.
		#[source]
		source: BoxError,
	},
}
impl TransportError {
	/// Wraps a transport-specific network error.
	pub fn network(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::Network { source: Box::new(src) }
	}
}
#[cfg(feature = "reqwest")]
impl From<ReqwestError> for TransportError {
	fn from(e: ReqwestError) -> Self {
		if e.is_timeout() { Self::Timeout } else { Self::network(e) }
	}
}

fn truncate_preview(body: &str) -> String {
	if body.chars().count() <= AttemptError::BODY_PREVIEW_LIMIT {
		return body.to_owned();
	}

	let mut buf = String::new();

	for (idx, ch) in body.chars().enumerate() {
		if idx >= AttemptError::BODY_PREVIEW_LIMIT {
			buf.push('…');

			break;
		}
		buf.push(ch);
	}

	buf
}
