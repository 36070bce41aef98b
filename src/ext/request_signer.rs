//! Request signing contracts that let callers attach credentials to arbitrary HTTP clients.

// crates.io
use oauth2::http::HeaderMap;
// self
use crate::{_prelude::*, auth::Credential, error::ConfigError};

/// Minimal view of an outgoing HTTP request required for signing.
pub trait SignableRequest {
	/// Returns the request headers for mutation.
	fn headers_mut(&mut self) -> &mut HeaderMap;
}
impl<B> SignableRequest for oauth2::http::Request<B> {
	fn headers_mut(&mut self) -> &mut HeaderMap {
		oauth2::http::Request::headers_mut(self)
	}
}
#[cfg(feature = "reqwest")]
impl SignableRequest for reqwest::Request {
	fn headers_mut(&mut self) -> &mut HeaderMap {
		reqwest::Request::headers_mut(self)
	}
}

/// Named API operation a request belongs to.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Operation {
	/// Operation name as used by the storage API (e.g. `GetObject`).
	pub name: Cow<'static, str>,
}
impl Operation {
	/// Bucket listing operation.
	pub const LIST_BUCKETS: &'static str = "ListBuckets";
	/// Bucket creation operation.
	pub const CREATE_BUCKET: &'static str = "CreateBucket";

	/// Creates an operation descriptor.
	pub fn new(name: impl Into<Cow<'static, str>>) -> Self {
		Self { name: name.into() }
	}

	/// Returns `true` for operations that must carry the service-instance id.
	pub fn requires_service_instance_id(&self) -> bool {
		matches!(&*self.name, Self::LIST_BUCKETS | Self::CREATE_BUCKET)
	}
}
impl Display for Operation {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(&self.name)
	}
}

/// Describes how to attach a [`Credential`] to an outbound request without constraining
/// the HTTP client type.
pub trait RequestSignerExt<Request>
where
	Self: Send + Sync,
	Request: ?Sized + SignableRequest,
{
	/// Injects authorization state derived from `credential` into `request`.
	///
	/// Implementations must leave `request` untouched when they return an error.
	fn attach_credential(
		&self,
		request: &mut Request,
		operation: &Operation,
		credential: &Credential,
	) -> Result<(), ConfigError>;
}
