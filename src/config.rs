//! IAM provider configuration and token endpoint resolution.

// self
use crate::{_prelude::*, auth::TokenSecret, error::ConfigError};

/// Token endpoint used when no custom IAM endpoint is configured.
pub const DEFAULT_IAM_ENDPOINT: &str = "https://iam.bluemix.net/oidc/token";
/// Path appended to custom IAM endpoints.
pub const TOKEN_PATH: &str = "/oidc/token";

/// Settings consumed by [`IbmIamProvider`](crate::provider::IbmIamProvider).
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IamConfig {
	/// API key exchanged for bearer tokens.
	pub api_key: TokenSecret,
	/// Service-instance id attached to bucket-level operations.
	#[serde(default)]
	pub service_instance_id: String,
	/// Base URL of a custom IAM deployment; empty or absent selects [`DEFAULT_IAM_ENDPOINT`].
	#[serde(default)]
	pub iam_endpoint: Option<String>,
	/// Lead time before token expiry at which credentials are treated as expired.
	#[serde(default, with = "whole_seconds")]
	pub expiry_window: Duration,
}
impl IamConfig {
	/// Creates a configuration for `api_key` with every other setting at its default.
	pub fn new(api_key: impl Into<TokenSecret>) -> Self {
		Self {
			api_key: api_key.into(),
			service_instance_id: String::new(),
			iam_endpoint: None,
			expiry_window: Duration::ZERO,
		}
	}

	/// Returns a builder that validates the endpoint on [`IamConfigBuilder::build`].
	pub fn builder(api_key: impl Into<TokenSecret>) -> IamConfigBuilder {
		IamConfigBuilder(Self::new(api_key))
	}

	/// Resolves the token URL: `{iam_endpoint}/oidc/token`, or the default endpoint.
	pub fn token_url(&self) -> Result<Url, ConfigError> {
		let raw = match self.iam_endpoint.as_deref().filter(|endpoint| !endpoint.is_empty()) {
			Some(endpoint) =>
				format!("{}{TOKEN_PATH}", endpoint.strip_suffix('/').unwrap_or(endpoint)),
			None => DEFAULT_IAM_ENDPOINT.to_owned(),
		};

		Url::parse(&raw).map_err(|source| ConfigError::InvalidEndpoint { endpoint: raw, source })
	}
}
impl Debug for IamConfig {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("IamConfig")
			.field("api_key", &self.api_key)
			.field("service_instance_id", &self.service_instance_id)
			.field("iam_endpoint", &self.iam_endpoint)
			.field("expiry_window", &self.expiry_window)
			.finish()
	}
}

/// Builder for [`IamConfig`] values.
#[derive(Debug)]
pub struct IamConfigBuilder(IamConfig);
impl IamConfigBuilder {
	/// Sets the service-instance id.
	pub fn service_instance_id(mut self, id: impl Into<String>) -> Self {
		self.0.service_instance_id = id.into();

		self
	}

	/// Sets a custom IAM endpoint base URL.
	pub fn iam_endpoint(mut self, endpoint: impl Into<String>) -> Self {
		self.0.iam_endpoint = Some(endpoint.into());

		self
	}

	/// Sets the expiry window; negative values are clamped to zero.
	pub fn expiry_window(mut self, window: Duration) -> Self {
		self.0.expiry_window = if window.is_negative() { Duration::ZERO } else { window };

		self
	}

	/// Consumes the builder and validates the resulting configuration.
	pub fn build(self) -> Result<IamConfig, ConfigError> {
		self.0.token_url()?;

		Ok(self.0)
	}
}

mod whole_seconds {
	// crates.io
	use serde::{Deserialize, Deserializer, Serializer};
	use time::Duration;

	pub fn serialize<S>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error>
	where
		S: Serializer,
	{
		serializer.serialize_i64(value.whole_seconds())
	}

	pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
	where
		D: Deserializer<'de>,
	{
		i64::deserialize(deserializer).map(Duration::seconds)
	}
}
