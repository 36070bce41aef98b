//! IBM IAM credential provider: exchanges an API key for a bearer token.
//!
//! Each [`IbmIamProvider::fetch_credential`] issues exactly one form-encoded POST to the
//! token endpoint with the fixed API-key grant parameters. Nothing is retried; callers (or
//! the [`Credentials`] cache in front of the provider) decide when to try again.

// crates.io
use oauth2::{
	AsyncHttpClient, HttpRequest,
	http::{
		Method, StatusCode,
		header::{ACCEPT, CONTENT_TYPE},
	},
};
// self
use crate::{
	_prelude::*,
	auth::{Credential, Expiry},
	config::IamConfig,
	credentials::{CredentialFuture, CredentialProvider, Credentials},
	error::{ConfigError, DecodeError, EndpointError},
	http::{self, TokenHttpClient},
	obs::{self, OperationKind, OperationSpan, Outcome},
};
#[cfg(feature = "reqwest")] use crate::{auth::TokenSecret, http::ReqwestHttpClient};

/// Name stamped on every [`Credential`] produced by [`IbmIamProvider`].
pub const PROVIDER_NAME: &str = "IBMIAMProvider";
/// Kind label used by [`IbmIamProvider::credentials`].
pub const CREDENTIALS_KIND: &str = "ibm-iam";
/// Grant type sent to the token endpoint.
pub const GRANT_TYPE: &str = "urn:ibm:params:oauth:grant-type:apikey";
/// Response type sent to the token endpoint.
pub const RESPONSE_TYPE: &str = "cloud_iam";

#[cfg(feature = "reqwest")]
/// Provider specialized for the crate's default reqwest transport.
pub type ReqwestIbmIamProvider = IbmIamProvider<ReqwestHttpClient>;

/// Successful token endpoint payload; unknown fields are ignored.
#[derive(Clone, Deserialize)]
pub(crate) struct TokenResponse {
	pub(crate) access_token: String,
	pub(crate) expiration: i64,
}
impl TokenResponse {
	pub(crate) fn from_slice(body: &[u8]) -> Result<Self, DecodeError> {
		let mut deserializer = serde_json::Deserializer::from_slice(body);

		serde_path_to_error::deserialize(&mut deserializer)
			.map_err(|source| DecodeError::Json { source })
	}

	pub(crate) fn expires_at(&self) -> Result<OffsetDateTime, DecodeError> {
		OffsetDateTime::from_unix_timestamp(self.expiration)
			.map_err(|_| DecodeError::ExpirationOutOfRange { expiration: self.expiration })
	}
}

/// Credential provider backed by the IBM IAM token endpoint.
pub struct IbmIamProvider<C>
where
	C: TokenHttpClient,
{
	config: IamConfig,
	token_url: Url,
	http_client: Arc<C>,
	expiry: RwLock<Expiry>,
}
impl<C> IbmIamProvider<C>
where
	C: TokenHttpClient,
{
	/// Creates a provider that reuses the caller-provided transport.
	pub fn with_http_client(config: IamConfig, http_client: impl Into<Arc<C>>) -> Result<Self> {
		let token_url = config.token_url()?;

		Ok(Self { config, token_url, http_client: http_client.into(), expiry: Default::default() })
	}

	/// Configuration the provider was built from.
	pub fn config(&self) -> &IamConfig {
		&self.config
	}

	/// Resolved token endpoint URL.
	pub fn token_url(&self) -> &Url {
		&self.token_url
	}

	/// Instant from which [`CredentialProvider::is_expired`] reports `true`, once retrieved.
	pub fn expires_at(&self) -> Option<OffsetDateTime> {
		self.expiry.read().expires_at()
	}

	/// Returns `true` if nothing was retrieved yet or `instant` reached the recorded
	/// expiration minus the expiry window.
	pub fn is_expired_at(&self, instant: OffsetDateTime) -> bool {
		self.expiry.read().is_expired_at(instant)
	}

	/// Exchanges the API key for a bearer token and records its expiry.
	///
	/// A failed exchange leaves the previously recorded expiry untouched.
	pub async fn fetch_credential(&self) -> Result<Credential> {
		const KIND: OperationKind = OperationKind::Retrieve;

		let span = OperationSpan::new(KIND, "fetch_credential");

		obs::record_outcome(KIND, Outcome::Attempt);

		let result = span
			.instrument(async move {
				let response = self.request_token().await?;
				let expires_at = response.expires_at()?;

				self.expiry.write().set_expiration(expires_at, self.config.expiry_window);

				Ok(Credential {
					session_token: response.access_token.into(),
					service_instance_id: self.config.service_instance_id.clone(),
					provider_name: PROVIDER_NAME.into(),
					expires_at,
					expiry_window: self.config.expiry_window,
				})
			})
			.await;

		let outcome = Outcome::of(&result);

		span.record_outcome(outcome);
		obs::record_outcome(KIND, outcome);

		result
	}

	async fn request_token(&self) -> Result<TokenResponse> {
		let request = self.token_request()?;
		let handle = self.http_client.handle();
		let response = handle.call(request).await.map_err(http::map_transport_error)?;

		if response.status() != StatusCode::OK {
			return Err(EndpointError::status(response.status().as_u16(), response.body()).into());
		}

		Ok(TokenResponse::from_slice(response.body())?)
	}

	fn token_request(&self) -> Result<HttpRequest> {
		let body = url::form_urlencoded::Serializer::new(String::new())
			.append_pair("grant_type", GRANT_TYPE)
			.append_pair("response_type", RESPONSE_TYPE)
			.append_pair("apikey", self.config.api_key.expose())
			.finish();
		let request = oauth2::http::Request::builder()
			.method(Method::POST)
			.uri(self.token_url.as_str())
			.header(CONTENT_TYPE, "application/x-www-form-urlencoded")
			.header(ACCEPT, "application/json")
			.body(body.into_bytes())
			.map_err(ConfigError::from)?;

		Ok(request)
	}
}
#[cfg(feature = "reqwest")]
impl IbmIamProvider<ReqwestHttpClient> {
	/// Creates a provider with its own reqwest transport.
	///
	/// An empty `iam_endpoint` selects [`DEFAULT_IAM_ENDPOINT`](crate::config::DEFAULT_IAM_ENDPOINT);
	/// otherwise `/oidc/token` is appended to it.
	pub fn new(
		api_key: impl Into<String>,
		service_instance_id: impl Into<String>,
		iam_endpoint: impl Into<String>,
	) -> Result<Self> {
		let iam_endpoint = iam_endpoint.into();
		let config = IamConfig {
			service_instance_id: service_instance_id.into(),
			iam_endpoint: (!iam_endpoint.is_empty()).then_some(iam_endpoint),
			..IamConfig::new(TokenSecret::new(api_key))
		};

		Self::with_http_client(config, ReqwestHttpClient::default())
	}

	/// Creates a provider and wraps it in a [`Credentials`] cache labeled `ibm-iam`.
	pub fn credentials(
		api_key: impl Into<String>,
		service_instance_id: impl Into<String>,
		iam_endpoint: impl Into<String>,
	) -> Result<Credentials> {
		Self::new(api_key, service_instance_id, iam_endpoint).map(Self::into_credentials)
	}
}
impl<C> IbmIamProvider<C>
where
	C: TokenHttpClient,
{
	/// Wraps the provider in a [`Credentials`] cache labeled `ibm-iam`.
	pub fn into_credentials(self) -> Credentials {
		Credentials::typed(self, CREDENTIALS_KIND)
	}
}
impl<C> CredentialProvider for IbmIamProvider<C>
where
	C: TokenHttpClient,
{
	fn retrieve(&self) -> CredentialFuture<'_> {
		Box::pin(self.fetch_credential())
	}

	fn is_expired(&self) -> bool {
		self.expiry.read().is_expired()
	}
}
impl<C> Debug for IbmIamProvider<C>
where
	C: TokenHttpClient,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("IbmIamProvider")
			.field("config", &self.config)
			.field("token_url", &self.token_url.as_str())
			.field("expiry", &*self.expiry.read())
			.finish()
	}
}
