// std
use std::time::Duration;
// crates.io
use http::{HeaderMap, HeaderValue, Request, StatusCode, header::AUTHORIZATION};
use serde_json::json;
// self
use service_courier::{
	auth::{AuthRejection, AuthVerifier, RejectionReason, SharedSecret, TokenSigner},
	config::Config,
	error::ConfigError,
};

const SECRET: &str = "verifier-it-secret";

fn config() -> Config {
	Config::parse(SECRET, "https://topics.internal/").expect("Test target URL should parse.")
}

fn headers_with(value: &str) -> HeaderMap {
	let mut headers = HeaderMap::new();

	headers.insert(
		AUTHORIZATION,
		HeaderValue::from_str(value).expect("Test header value should be valid."),
	);

	headers
}

#[test]
fn freshly_signed_requests_pass_the_gate() {
	let config = config();
	let signer = TokenSigner::new(&config.shared_secret).expect("Signer should build.");
	let verifier = AuthVerifier::from_config(&config).expect("Verifier should build.");
	let request = Request::builder()
		.uri("/api/topics")
		.header(AUTHORIZATION, signer.generate().bearer())
		.body(())
		.expect("Test request should build.");

	assert!(verifier.authenticate_request(&request).is_authenticated());
	assert!(verifier.require(request.headers()).is_ok());
}

#[test]
fn missing_or_malformed_headers_are_rejected_as_missing_auth() {
	let verifier = AuthVerifier::from_config(&config()).expect("Verifier should build.");

	for headers in [
		HeaderMap::new(),
		headers_with("Basic dXNlcjpwYXNz"),
		headers_with("bearer 1.00"),
		headers_with("Bearer "),
	] {
		let rejection =
			verifier.require(&headers).expect_err("Header without a bearer token should fail.");

		assert_eq!(rejection.status(), StatusCode::UNAUTHORIZED);
		assert_eq!(
			rejection.body(),
			json!({
				"success": false,
				"message": "Authorization header with a Bearer token is required.",
				"error": "MISSING_AUTH"
			})
		);
	}
}

#[test]
fn stale_foreign_and_garbled_tokens_map_to_distinct_codes() {
	let config = config();
	let verifier = AuthVerifier::from_config(&config).expect("Verifier should build.");
	let signer = TokenSigner::new(&config.shared_secret).expect("Signer should build.");
	let foreign =
		TokenSigner::new(&SharedSecret::from("someone-else")).expect("Signer should build.");
	let now = signer.generate().issued_at();
	let cases = [
		(signer.generate_at(now - 301).bearer(), RejectionReason::TokenExpired),
		(foreign.generate().bearer(), RejectionReason::InvalidSignature),
		("Bearer not-a-token".to_owned(), RejectionReason::AuthError),
		("Bearer 12.34.56".to_owned(), RejectionReason::AuthError),
	];

	for (header, expected) in cases {
		let rejection = verifier
			.require(&headers_with(&header))
			.expect_err("Invalid token should be rejected.");

		assert_eq!(rejection.error, expected);
		assert!(!rejection.success);
		assert_eq!(rejection.message, expected.message());
	}
}

#[test]
fn rejection_renders_a_json_401_response() {
	let response = AuthRejection::from(RejectionReason::TokenExpired).into_response();

	assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
	assert_eq!(
		response.headers().get("content-type").and_then(|value| value.to_str().ok()),
		Some("application/json")
	);

	let body: serde_json::Value =
		serde_json::from_str(response.body()).expect("Rejection body should be valid JSON.");

	assert_eq!(
		body,
		json!({
			"success": false,
			"message": "Authentication token has expired.",
			"error": "TOKEN_EXPIRED"
		})
	);
}

#[test]
fn skew_window_is_taken_from_config() {
	let config = config().with_auth_token_max_skew_secs(10);
	let verifier = AuthVerifier::from_config(&config).expect("Verifier should build.");
	let signer = TokenSigner::new(&config.shared_secret).expect("Signer should build.");
	let now = signer.generate().issued_at();

	assert_eq!(verifier.max_skew(), Duration::from_secs(10));
	assert!(verifier.require(&headers_with(&signer.generate_at(now - 5).bearer())).is_ok());
	assert_eq!(
		verifier
			.require(&headers_with(&signer.generate_at(now - 60).bearer()))
			.expect_err("Token older than the window should be rejected.")
			.error,
		RejectionReason::TokenExpired
	);
}

#[test]
fn empty_secret_cannot_build_a_verifier() {
	let err = AuthVerifier::new(&SharedSecret::from(""), Duration::from_secs(300))
		.expect_err("Empty secret should be rejected.");

	assert!(matches!(err, ConfigError::EmptySecret));
}
