//! IBM IAM request signer and the named pipeline handler built on it.

// crates.io
use oauth2::http::{
	HeaderName, HeaderValue,
	header::{AUTHORIZATION, HeaderMap},
};
// self
use crate::{
	_prelude::*,
	auth::Credential,
	credentials::Credentials,
	error::ConfigError,
	ext::{Operation, RequestSignerExt, SignableRequest},
	obs::{self, OperationKind, OperationSpan, Outcome},
};

/// Header carrying the service-instance id on bucket-level operations.
pub const SERVICE_INSTANCE_ID_HEADER: &str = "ibm-service-instance-id";

/// Applies IBM IAM bearer authentication to outgoing requests.
#[derive(Clone, Debug)]
pub struct IbmIamSigner {
	/// Credentials the requests are signed with.
	pub credentials: Arc<Credentials>,
}
impl IbmIamSigner {
	/// Creates a signer reading from `credentials`.
	pub fn new(credentials: Arc<Credentials>) -> Self {
		Self { credentials }
	}

	/// Signs `request` for `operation`.
	///
	/// Adds `Authorization: Bearer <token>`, plus the service-instance id header for
	/// `ListBuckets` and `CreateBucket`. Credential retrieval failures are returned as-is and
	/// leave the request unsigned.
	pub async fn sign<R>(&self, request: &mut R, operation: &Operation) -> Result<()>
	where
		R: ?Sized + SignableRequest + Send,
	{
		const KIND: OperationKind = OperationKind::Sign;

		let span = OperationSpan::new(KIND, "sign");

		obs::record_outcome(KIND, Outcome::Attempt);

		let result = span
			.instrument(async move {
				let credential = self.credentials.get().await?;

				self.attach_credential(request, operation, &credential)?;

				Ok(())
			})
			.await;

		let outcome = Outcome::of(&result);

		span.record_outcome(outcome);
		obs::record_outcome(KIND, outcome);

		result
	}
}
impl<R> RequestSignerExt<R> for IbmIamSigner
where
	R: ?Sized + SignableRequest,
{
	fn attach_credential(
		&self,
		request: &mut R,
		operation: &Operation,
		credential: &Credential,
	) -> Result<(), ConfigError> {
		let mut bearer =
			HeaderValue::try_from(format!("Bearer {}", credential.session_token.expose()))
				.map_err(|source| ConfigError::InvalidHeaderValue {
					header: "authorization",
					source,
				})?;

		bearer.set_sensitive(true);

		let instance_id = if operation.requires_service_instance_id() {
			let value = HeaderValue::try_from(credential.service_instance_id.as_str()).map_err(
				|source| ConfigError::InvalidHeaderValue {
					header: SERVICE_INSTANCE_ID_HEADER,
					source,
				},
			)?;

			Some(value)
		} else {
			None
		};
		let headers: &mut HeaderMap = request.headers_mut();

		headers.append(AUTHORIZATION, bearer);

		if let Some(value) = instance_id {
			headers.append(HeaderName::from_static(SERVICE_INSTANCE_ID_HEADER), value);
		}

		Ok(())
	}
}

/// Outgoing request as seen by the signing step of a request pipeline.
#[derive(Debug)]
pub struct SdkRequest<B> {
	/// HTTP request being built.
	pub http_request: oauth2::http::Request<B>,
	/// Operation the request performs.
	pub operation: Operation,
	/// Credentials configured for the client issuing the request.
	pub credentials: Arc<Credentials>,
	/// First failure recorded by a pipeline handler; the request must not be sent when set.
	pub error: Option<Error>,
}
impl<B> SdkRequest<B> {
	/// Creates a pipeline request with no recorded error.
	pub fn new(
		http_request: oauth2::http::Request<B>,
		operation: Operation,
		credentials: Arc<Credentials>,
	) -> Self {
		Self { http_request, operation, credentials, error: None }
	}
}

/// Named pipeline handler that signs requests with [`IbmIamSigner`].
#[derive(Clone, Copy, Debug, Default)]
pub struct SignRequestHandler;
impl SignRequestHandler {
	/// Handler name registered with the request pipeline.
	pub const NAME: &'static str = "ibm.SignRequestHandler";

	/// Signs `request` with its configured credentials, recording any failure in
	/// [`SdkRequest::error`] instead of returning it.
	pub async fn handle<B>(&self, request: &mut SdkRequest<B>)
	where
		B: Send,
	{
		let signer = IbmIamSigner::new(request.credentials.clone());

		if let Err(e) = signer.sign(&mut request.http_request, &request.operation).await {
			request.error = Some(e);
		}
	}
}
