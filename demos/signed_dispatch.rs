//! Demonstrates a signed dispatch against a mock topic service, then checks a freshly minted
//! token the way the receiving service would.

// std
use std::{sync::Arc, time::Duration};
// crates.io
use color_eyre::Result;
use http::{HeaderMap, HeaderValue, Method as HttpMethod, header::AUTHORIZATION};
use httpmock::prelude::*;
use serde_json::json;
// self
use service_courier::{
	auth::{AuthVerifier, TokenSigner},
	config::Config,
	dispatch::ReqwestDispatcher,
	http::ReqwestTransport,
	rate_limit::RateLimiter,
	reqwest::Client,
};

#[tokio::main]
async fn main() -> Result<()> {
	color_eyre::install()?;

	let server = MockServer::start_async().await;
	let search_mock = server
		.mock_async(|when, then| {
			when.method(POST).path("/api/topics/search").header_exists("authorization");
			then.status(200)
				.header("content-type", "application/json")
				.json_body(json!({ "results": [{ "id": 1, "title": "Pattern matching" }] }));
		})
		.await;
	let config = Config::parse("demo-shared-secret", &server.url("/api/"))?
		.with_max_requests_per_second(2)
		.with_retry_delay_ms(200);
	// httpmock serves a self-signed certificate.
	let transport = ReqwestTransport::with_client(
		Client::builder()
			.danger_accept_invalid_certs(true)
			.danger_accept_invalid_hostnames(true)
			.timeout(config.timeout())
			.build()?,
	);
	let limiter = Arc::new(RateLimiter::from_config(&config)?);
	let dispatcher = ReqwestDispatcher::with_transport(&config, limiter, transport)?;
	let response = dispatcher
		.dispatch(
			HttpMethod::POST,
			"topics/search",
			Some(json!({ "q": "pattern" })),
			2,
			Duration::from_millis(200),
		)
		.await?;

	println!("status: {}", response.status);
	println!("body: {}", response.text());
	println!("calls issued: {}", dispatcher.metrics.calls());

	search_mock.assert_calls_async(1).await;

	let token = TokenSigner::new(&config.shared_secret)?.generate();
	let verifier = AuthVerifier::from_config(&config)?;
	let mut headers = HeaderMap::new();

	headers.insert(AUTHORIZATION, HeaderValue::try_from(token.bearer())?);

	println!("token: {token}");
	println!("verification: {:?}", verifier.authenticate(&headers));

	Ok(())
}
