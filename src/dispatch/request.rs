//! Request and response values exchanged with [`Dispatcher`](crate::dispatch::Dispatcher).

// crates.io
use http::{HeaderMap, Method};
use serde::de::DeserializeOwned;
// self
use crate::{_prelude::*, error::ConfigError, http::TransportResponse};

/// One logical outbound request, before signing and retry handling.
///
/// Values left unset fall back to the dispatcher's configured defaults.
#[derive(Clone, Debug)]
pub struct DispatchRequest {
	/// HTTP method.
	pub method: Method,
	/// Absolute URL, or a path resolved against the configured target URL.
	pub target: String,
	/// JSON payload sent as the request body.
	pub payload: Option<serde_json::Value>,
	/// Retry budget override.
	pub max_retries: Option<u32>,
	/// Fixed retry delay override.
	pub retry_delay: Option<Duration>,
}
impl DispatchRequest {
	/// Creates a request without a payload.
	pub fn new(method: Method, target: impl Into<String>) -> Self {
		Self { method, target: target.into(), payload: None, max_retries: None, retry_delay: None }
	}

	/// Attaches an already-built JSON payload.
	pub fn with_payload(mut self, payload: serde_json::Value) -> Self {
		self.payload = Some(payload);

		self
	}

	/// Serializes `payload` into the request body.
	pub fn json<P>(self, payload: &P) -> Result<Self, ConfigError>
	where
		P: ?Sized + Serialize,
	{
		Ok(self.with_payload(serde_json::to_value(payload)?))
	}

	/// Overrides the retry budget.
	pub fn max_retries(mut self, max_retries: u32) -> Self {
		self.max_retries = Some(max_retries);

		self
	}

	/// Overrides the fixed delay between retries.
	pub fn retry_delay(mut self, retry_delay: Duration) -> Self {
		self.retry_delay = Some(retry_delay);

		self
	}
}

/// Successful (2xx) response returned by a dispatch.
#[derive(Clone, Debug)]
pub struct DispatchResponse {
	/// URL the response came from.
	pub url: Url,
	/// HTTP status code.
	pub status: u16,
	/// Response headers.
	pub headers: HeaderMap,
	/// Raw response body.
	pub body: Vec<u8>,
}
impl DispatchResponse {
	pub(crate) fn new(url: Url, response: TransportResponse) -> Self {
		let TransportResponse { status, headers, body } = response;

		Self { url, status, headers, body }
	}

	/// Decodes the body as JSON, reporting the failing path on mismatch.
	pub fn json<T>(&self) -> Result<T>
	where
		T: DeserializeOwned,
	{
		let mut de = serde_json::Deserializer::from_slice(&self.body);

		serde_path_to_error::deserialize(&mut de)
			.map_err(|source| Error::Decode { url: self.url.clone(), source })
	}

	/// Returns the body as text, replacing invalid UTF-8.
	pub fn text(&self) -> String {
		String::from_utf8_lossy(&self.body).into_owned()
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[derive(Debug, Deserialize)]
	struct Topics {
		results: Vec<Topic>,
	}

	#[derive(Debug, Deserialize)]
	struct Topic {
		#[allow(dead_code)]
		id: u32,
	}

	fn response(body: &str) -> DispatchResponse {
		DispatchResponse::new(
			Url::parse("https://topics.internal/search").expect("Test URL should parse."),
			TransportResponse::new(200, body),
		)
	}

	#[test]
	fn json_decodes_body() {
		let topics: Topics = response(r#"{"results":[{"id":1},{"id":2}]}"#)
			.json()
			.expect("Well-formed body should decode.");

		assert_eq!(topics.results.len(), 2);
	}

	#[test]
	fn json_reports_failing_path() {
		let err = response(r#"{"results":[{"id":"one"}]}"#)
			.json::<Topics>()
			.expect_err("Mistyped body should fail to decode.");

		match err {
			Error::Decode { source, .. } => assert_eq!(source.path().to_string(), "results[0].id"),
			other => panic!("Unexpected error variant: {other:?}."),
		}
	}

	#[test]
	fn builder_overrides_defaults() {
		#[derive(Serialize)]
		struct Query<'a> {
			q: &'a str,
		}

		let request = DispatchRequest::new(Method::POST, "/search")
			.json(&Query { q: "rust" })
			.expect("Payload should serialize.")
			.max_retries(1)
			.retry_delay(Duration::from_millis(5));

		assert_eq!(request.payload, Some(serde_json::json!({ "q": "rust" })));
		assert_eq!(request.max_retries, Some(1));
		assert_eq!(request.retry_delay, Some(Duration::from_millis(5)));
		assert_eq!(response("plain").text(), "plain");
	}
}
