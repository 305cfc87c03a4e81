//! Inbound request gate that checks `Authorization: Bearer <token>` headers.
//!
//! [`AuthVerifier::authenticate`] is evaluated once per inbound call, before any protected
//! handler runs. Framework adapters turn a [`VerificationResult::Rejected`] into the 401
//! response described by [`AuthRejection`].

// crates.io
use http::{
	HeaderMap, HeaderValue, Request, Response, StatusCode,
	header::{AUTHORIZATION, CONTENT_TYPE},
};
// self
use crate::{
	_prelude::*,
	auth::{SharedSecret, TokenSigner},
	config::Config,
	error::ConfigError,
	obs,
};

const BEARER_PREFIX: &str = "Bearer ";

/// Outcome of checking an inbound request token.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum VerificationResult {
	/// Token is well-formed, fresh, and correctly signed.
	Authenticated,
	/// Token was rejected for the contained reason.
	Rejected(RejectionReason),
}
impl VerificationResult {
	/// Returns `true` for [`VerificationResult::Authenticated`].
	pub const fn is_authenticated(self) -> bool {
		matches!(self, Self::Authenticated)
	}

	/// Returns the rejection reason, if any.
	pub const fn rejection(self) -> Option<RejectionReason> {
		match self {
			Self::Authenticated => None,
			Self::Rejected(reason) => Some(reason),
		}
	}
}

/// Machine-readable rejection codes carried in the 401 body.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RejectionReason {
	/// No usable `Authorization: Bearer` header.
	MissingAuth,
	/// Token is older than the skew window.
	TokenExpired,
	/// Token signature does not match.
	InvalidSignature,
	/// Token could not be parsed.
	AuthError,
}
impl RejectionReason {
	/// Returns the wire code.
	pub const fn as_str(self) -> &'static str {
		match self {
			Self::MissingAuth => "MISSING_AUTH",
			Self::TokenExpired => "TOKEN_EXPIRED",
			Self::InvalidSignature => "INVALID_SIGNATURE",
			Self::AuthError => "AUTH_ERROR",
		}
	}

	/// Returns the human-readable message sent alongside the code.
	pub const fn message(self) -> &'static str {
		match self {
			Self::MissingAuth => "Authorization header with a Bearer token is required.",
			Self::TokenExpired => "Authentication token has expired.",
			Self::InvalidSignature => "Authentication token signature is invalid.",
			Self::AuthError => "Authentication token could not be processed.",
		}
	}
}
impl Display for RejectionReason {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// JSON body returned with HTTP 401 when authentication fails.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthRejection {
	/// Always `false`.
	pub success: bool,
	/// Human-readable explanation.
	pub message: String,
	/// Machine-readable reason code.
	pub error: RejectionReason,
}
impl AuthRejection {
	/// Builds the body for `reason` with its default message.
	pub fn new(reason: RejectionReason) -> Self {
		Self { success: false, message: reason.message().into(), error: reason }
	}

	/// Status code the HTTP layer must answer with.
	pub const fn status(&self) -> StatusCode {
		StatusCode::UNAUTHORIZED
	}

	/// Renders the JSON body.
	pub fn body(&self) -> serde_json::Value {
		serde_json::json!({
			"success": self.success,
			"message": self.message,
			"error": self.error.as_str(),
		})
	}

	/// Renders a complete `401 application/json` response.
	pub fn into_response(self) -> Response<String> {
		let mut response = Response::new(self.body().to_string());

		*response.status_mut() = self.status();
		response.headers_mut().insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

		response
	}
}
impl From<RejectionReason> for AuthRejection {
	fn from(reason: RejectionReason) -> Self {
		Self::new(reason)
	}
}
impl Display for AuthRejection {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		write!(f, "{}: {}", self.error, self.message)
	}
}
impl StdError for AuthRejection {}

/// Server-side gate validating request tokens minted by a peer's [`TokenSigner`].
#[derive(Clone, Debug)]
pub struct AuthVerifier {
	signer: TokenSigner,
	max_skew: Duration,
}
impl AuthVerifier {
	/// Creates a verifier for `secret` accepting tokens up to `max_skew` old.
	pub fn new(secret: &SharedSecret, max_skew: Duration) -> Result<Self, ConfigError> {
		Ok(Self { signer: TokenSigner::new(secret)?, max_skew })
	}

	/// Creates a verifier from the shared secret and skew window in `config`.
	pub fn from_config(config: &Config) -> Result<Self, ConfigError> {
		Self::new(&config.shared_secret, config.max_skew())
	}

	/// Maximum accepted token age.
	pub fn max_skew(&self) -> Duration {
		self.max_skew
	}

	/// Checks the `Authorization` header in `headers`.
	pub fn authenticate(&self, headers: &HeaderMap) -> VerificationResult {
		let result = match bearer_token(headers) {
			Some(token) => self.signer.verify(token, self.max_skew),
			None => VerificationResult::Rejected(RejectionReason::MissingAuth),
		};

		obs::record_verification(result.rejection());

		result
	}

	/// Checks the headers of a full inbound request.
	pub fn authenticate_request<B>(&self, request: &Request<B>) -> VerificationResult {
		self.authenticate(request.headers())
	}

	/// Like [`AuthVerifier::authenticate`] but yields the 401 body on rejection.
	pub fn require(&self, headers: &HeaderMap) -> Result<(), AuthRejection> {
		match self.authenticate(headers) {
			VerificationResult::Authenticated => Ok(()),
			VerificationResult::Rejected(reason) => Err(AuthRejection::new(reason)),
		}
	}
}

fn bearer_token(headers: &HeaderMap) -> Option<&str> {
	let value = headers.get(AUTHORIZATION)?.to_str().ok()?;
	let token = value.strip_prefix(BEARER_PREFIX)?.trim();

	if token.is_empty() { None } else { Some(token) }
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	fn verifier() -> AuthVerifier {
		AuthVerifier::new(&SharedSecret::from("inbound-secret"), Duration::from_secs(300))
			.expect("Verifier should accept a non-empty secret.")
	}

	fn headers(value: &str) -> HeaderMap {
		let mut headers = HeaderMap::new();

		headers.insert(
			AUTHORIZATION,
			HeaderValue::from_str(value).expect("Test header value should be valid."),
		);

		headers
	}

	#[test]
	fn fresh_token_from_same_secret_authenticates() {
		let signer = TokenSigner::new(&SharedSecret::from("inbound-secret"))
			.expect("Signer should accept a non-empty secret.");
		let headers = headers(&signer.generate().bearer());

		assert_eq!(verifier().authenticate(&headers), VerificationResult::Authenticated);
		assert!(verifier().require(&headers).is_ok());
	}

	#[test]
	fn missing_or_malformed_header_is_missing_auth() {
		let verifier = verifier();
		let missing = VerificationResult::Rejected(RejectionReason::MissingAuth);

		assert_eq!(verifier.authenticate(&HeaderMap::new()), missing);
		assert_eq!(verifier.authenticate(&headers("Basic dXNlcjpwYXNz")), missing);
		assert_eq!(verifier.authenticate(&headers("Bearer ")), missing);
		assert_eq!(verifier.authenticate(&headers("bearer 1.ab")), missing);
	}

	#[test]
	fn token_failures_are_delegated_to_signer() {
		let verifier = verifier();

		assert_eq!(
			verifier.authenticate(&headers("Bearer not-a-token")),
			VerificationResult::Rejected(RejectionReason::AuthError)
		);
		assert_eq!(
			verifier.authenticate(&headers("Bearer 1000.deadbeef")),
			VerificationResult::Rejected(RejectionReason::TokenExpired)
		);
	}

	#[test]
	fn rejection_renders_structured_401() {
		let rejection = verifier()
			.require(&HeaderMap::new())
			.expect_err("Missing header should be rejected.");

		assert_eq!(rejection.status(), StatusCode::UNAUTHORIZED);
		assert_eq!(
			rejection.body(),
			serde_json::json!({
				"success": false,
				"message": "Authorization header with a Bearer token is required.",
				"error": "MISSING_AUTH",
			})
		);

		let response = rejection.into_response();

		assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
		assert_eq!(
			response.headers().get(CONTENT_TYPE).and_then(|value| value.to_str().ok()),
			Some("application/json")
		);

		let decoded: AuthRejection =
			serde_json::from_str(response.body()).expect("Rejection body should decode.");

		assert_eq!(decoded, AuthRejection::new(RejectionReason::MissingAuth));
	}

	#[test]
	fn authenticate_request_reads_request_headers() {
		let signer = TokenSigner::new(&SharedSecret::from("inbound-secret"))
			.expect("Signer should accept a non-empty secret.");
		let request = Request::builder()
			.uri("/api/topics/search")
			.header(AUTHORIZATION, signer.generate().bearer())
			.body(())
			.expect("Test request should build.");

		assert!(verifier().authenticate_request(&request).is_authenticated());
	}
}
