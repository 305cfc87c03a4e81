//! HMAC-SHA256 request tokens bound to their issue timestamp.
//!
//! A token is the decimal issue time in whole Unix seconds followed by a dot and the lowercase
//! hex HMAC-SHA256 of that decimal string, keyed with the [`SharedSecret`]. Tokens are minted per
//! attempt and only ever checked against the skew window; there is no seen-token cache, so a
//! captured token can be replayed until it ages out.

// crates.io
use hmac::{Hmac, Mac};
use sha2::Sha256;
// self
use crate::{
	_prelude::*,
	auth::{RejectionReason, SharedSecret, VerificationResult},
	error::ConfigError,
};

type HmacSha256 = Hmac<Sha256>;

/// Signed, timestamp-bound request token.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AuthToken {
	issued_at: i64,
	signature: String,
}
impl AuthToken {
	/// Unix seconds at which the token was minted.
	pub fn issued_at(&self) -> i64 {
		self.issued_at
	}

	/// Hex-encoded HMAC signature.
	pub fn signature(&self) -> &str {
		&self.signature
	}

	/// Renders the `Authorization` header value carrying this token.
	pub fn bearer(&self) -> String {
		format!("Bearer {self}")
	}
}
impl Display for AuthToken {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		write!(f, "{}.{}", self.issued_at, self.signature)
	}
}
impl FromStr for AuthToken {
	type Err = TokenFormatError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		let (timestamp, signature) = split_token(s)?;

		Ok(Self { issued_at: parse_timestamp(timestamp)?, signature: signature.to_owned() })
	}
}

/// Reasons a token string cannot be parsed.
#[derive(Clone, Debug, PartialEq, Eq, ThisError)]
pub enum TokenFormatError {
	/// Token does not consist of exactly two dot-separated parts.
	#[error("Token must contain exactly two dot-separated parts, found {found}.")]
	SegmentCount {
		/// Number of parts observed.
		found: usize,
	},
	/// Timestamp part is not a decimal integer.
	#[error("Token timestamp is not a decimal integer.")]
	NonNumericTimestamp,
}

/// Mints and checks [`AuthToken`]s with a pre-keyed HMAC.
#[derive(Clone)]
pub struct TokenSigner {
	mac: HmacSha256,
}
impl TokenSigner {
	/// Keys a signer with the provided secret.
	pub fn new(secret: &SharedSecret) -> Result<Self, ConfigError> {
		if secret.is_empty() {
			return Err(ConfigError::EmptySecret);
		}

		let mac = <HmacSha256 as Mac>::new_from_slice(secret.expose())
			.map_err(|_| ConfigError::InvalidSigningKey)?;

		Ok(Self { mac })
	}

	/// Mints a token stamped with the current wall-clock time.
	pub fn generate(&self) -> AuthToken {
		self.generate_at(now_unix())
	}

	/// Mints a token stamped with `issued_at` Unix seconds.
	pub fn generate_at(&self, issued_at: i64) -> AuthToken {
		let signature = hex::encode(self.digest(&issued_at.to_string()));

		AuthToken { issued_at, signature }
	}

	/// Verifies a serialized token against the current wall-clock time.
	pub fn verify(&self, token: &str, max_skew: Duration) -> VerificationResult {
		self.verify_at(token, max_skew, now_unix())
	}

	/// Verifies a serialized token as if the current time were `now` Unix seconds.
	///
	/// Only tokens older than `max_skew` are rejected as expired; a token stamped in the future
	/// passes the window check and is judged on its signature alone.
	pub fn verify_at(&self, token: &str, max_skew: Duration, now: i64) -> VerificationResult {
		let Ok((timestamp, signature)) = split_token(token) else {
			return VerificationResult::Rejected(RejectionReason::AuthError);
		};
		let Ok(issued_at) = parse_timestamp(timestamp) else {
			return VerificationResult::Rejected(RejectionReason::AuthError);
		};
		let max_skew = i64::try_from(max_skew.as_secs()).unwrap_or(i64::MAX);

		if now.saturating_sub(issued_at) > max_skew {
			return VerificationResult::Rejected(RejectionReason::TokenExpired);
		}

		// Only the lowercase hex rendering matches.
		if !signature.bytes().all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f')) {
			return VerificationResult::Rejected(RejectionReason::InvalidSignature);
		}

		let Ok(provided) = hex::decode(signature) else {
			return VerificationResult::Rejected(RejectionReason::InvalidSignature);
		};
		let mut mac = self.mac.clone();

		mac.update(timestamp.as_bytes());

		// `verify_slice` compares in constant time.
		match mac.verify_slice(&provided) {
			Ok(()) => VerificationResult::Authenticated,
			Err(_) => VerificationResult::Rejected(RejectionReason::InvalidSignature),
		}
	}

	fn digest(&self, message: &str) -> Vec<u8> {
		let mut mac = self.mac.clone();

		mac.update(message.as_bytes());

		mac.finalize().into_bytes().to_vec()
	}
}
impl Debug for TokenSigner {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str("TokenSigner(..)")
	}
}

pub(crate) fn now_unix() -> i64 {
	OffsetDateTime::now_utc().unix_timestamp()
}

fn split_token(token: &str) -> Result<(&str, &str), TokenFormatError> {
	let mut parts = token.split('.');

	match (parts.next(), parts.next(), parts.next()) {
		(Some(timestamp), Some(signature), None) => Ok((timestamp, signature)),
		(_, None, _) => Err(TokenFormatError::SegmentCount { found: 1 }),
		_ => Err(TokenFormatError::SegmentCount { found: token.split('.').count() }),
	}
}

fn parse_timestamp(raw: &str) -> Result<i64, TokenFormatError> {
	if raw.is_empty() || !raw.bytes().all(|b| b.is_ascii_digit()) {
		return Err(TokenFormatError::NonNumericTimestamp);
	}

	raw.parse().map_err(|_| TokenFormatError::NonNumericTimestamp)
}
