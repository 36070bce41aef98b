//! Credential provider contract and the caching wrapper signers read from.
//!
//! [`CredentialProvider`] is the extension point a credential source implements;
//! [`Credentials`] sits in front of it and only calls [`CredentialProvider::retrieve`] when
//! the provider reports expiry or the cache was expired by hand. No lock is held while a
//! retrieval is in flight, so two callers racing on an expired cache may both retrieve.
//! Either result is a valid credential, and the last one to finish stays cached.

// self
use crate::{_prelude::*, auth::Credential};

/// Boxed future returned by [`CredentialProvider::retrieve`].
pub type CredentialFuture<'a> = Pin<Box<dyn Future<Output = Result<Credential>> + 'a + Send>>;

/// Source of [`Credential`] values with self-tracked expiry.
pub trait CredentialProvider
where
	Self: Send + Sync,
{
	/// Fetches a fresh credential and records its expiry.
	fn retrieve(&self) -> CredentialFuture<'_>;

	/// Returns `true` when the last retrieved credential must no longer be used, or when
	/// nothing was retrieved yet.
	fn is_expired(&self) -> bool;
}
impl<P> CredentialProvider for Arc<P>
where
	P: ?Sized + CredentialProvider,
{
	fn retrieve(&self) -> CredentialFuture<'_> {
		P::retrieve(self)
	}

	fn is_expired(&self) -> bool {
		P::is_expired(self)
	}
}

#[derive(Debug, Default)]
struct CacheState {
	value: Option<Credential>,
	force_refresh: bool,
	// Bumped by every `expire`; a retrieval only clears `force_refresh` if none happened meanwhile.
	expirations: u64,
}

/// Caching credential wrapper consulted on every signed request.
pub struct Credentials {
	provider: Arc<dyn CredentialProvider>,
	kind: Option<Cow<'static, str>>,
	state: RwLock<CacheState>,
}
impl Credentials {
	/// Wraps `provider` without a credential kind label.
	pub fn new(provider: impl 'static + CredentialProvider) -> Self {
		Self::from_arc(Arc::new(provider), None)
	}

	/// Wraps `provider` and labels the credentials with `kind` (e.g. `ibm-iam`).
	pub fn typed(
		provider: impl 'static + CredentialProvider,
		kind: impl Into<Cow<'static, str>>,
	) -> Self {
		Self::from_arc(Arc::new(provider), Some(kind.into()))
	}

	/// Wraps an already shared provider.
	pub fn from_arc(
		provider: Arc<dyn CredentialProvider>,
		kind: Option<Cow<'static, str>>,
	) -> Self {
		Self { provider, kind, state: Default::default() }
	}

	/// Credential kind label, if one was assigned.
	pub fn kind(&self) -> Option<&str> {
		self.kind.as_deref()
	}

	/// Returns the cached credential, retrieving a new one when it is missing or expired.
	///
	/// Retrieval failures propagate unchanged and clear the cache. A [`Credentials::expire`]
	/// issued while the retrieval is in flight still forces the following call to retrieve.
	pub async fn get(&self) -> Result<Credential> {
		let expirations = match self.cached() {
			(Some(cached), _) => return Ok(cached),
			(None, expirations) => expirations,
		};
		let result = self.provider.retrieve().await;

		self.store(&result, expirations);

		result
	}

	/// Forces the next [`Credentials::get`] to retrieve from the provider.
	pub fn expire(&self) {
		let mut state = self.state.write();

		state.force_refresh = true;
		state.expirations = state.expirations.wrapping_add(1);
	}

	/// Returns `true` when the next [`Credentials::get`] would retrieve.
	pub fn is_expired(&self) -> bool {
		let state = self.state.read();

		state.force_refresh || state.value.is_none() || self.provider.is_expired()
	}

	fn cached(&self) -> (Option<Credential>, u64) {
		let state = self.state.read();

		if state.force_refresh || self.provider.is_expired() {
			return (None, state.expirations);
		}

		(state.value.clone(), state.expirations)
	}

	fn store(&self, result: &Result<Credential>, expirations: u64) {
		let mut state = self.state.write();

		match result {
			Ok(credential) => {
				state.value = Some(credential.clone());

				if state.expirations == expirations {
					state.force_refresh = false;
				}
			},
			Err(_) => state.value = None,
		}
	}
}
impl Debug for Credentials {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		let state = self.state.read();

		f.debug_struct("Credentials")
			.field("kind", &self.kind)
			.field("cached", &state.value.is_some())
			.field("force_refresh", &state.force_refresh)
			.finish()
	}
}

#[cfg(test)]
mod tests {
	// std
	use std::sync::{
		OnceLock, Weak,
		atomic::{AtomicBool, AtomicUsize, Ordering},
	};
	// self
	use super::*;
	use crate::{
		auth::TokenSecret,
		error::{EndpointError, Error},
	};

	#[derive(Default)]
	struct CountingProvider {
		calls: AtomicUsize,
		expired: AtomicBool,
		fail: AtomicBool,
		expire_during_retrieve: OnceLock<Weak<Credentials>>,
	}
	impl CredentialProvider for CountingProvider {
		fn retrieve(&self) -> CredentialFuture<'_> {
			Box::pin(async move {
				let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;

				if let Some(credentials) =
					self.expire_during_retrieve.get().and_then(Weak::upgrade)
				{
					credentials.expire();
				}

				if self.fail.load(Ordering::SeqCst) {
					return Err(EndpointError::status(500, b"").into());
				}

				self.expired.store(false, Ordering::SeqCst);

				Ok(Credential {
					session_token: TokenSecret::new(format!("token-{call}")),
					service_instance_id: "instance".into(),
					provider_name: "counting".into(),
					expires_at: OffsetDateTime::now_utc() + Duration::hours(1),
					expiry_window: Duration::ZERO,
				})
			})
		}

		fn is_expired(&self) -> bool {
			self.calls.load(Ordering::SeqCst) == 0 || self.expired.load(Ordering::SeqCst)
		}
	}

	#[tokio::test]
	async fn get_reuses_cached_credential_until_expired() {
		let provider = Arc::new(CountingProvider::default());
		let credentials = Credentials::from_arc(provider.clone(), None);

		assert!(credentials.is_expired());

		let first = credentials.get().await.expect("First retrieval should succeed.");
		let second = credentials.get().await.expect("Cached retrieval should succeed.");

		assert_eq!(first.session_token.expose(), "token-1");
		assert_eq!(second.session_token.expose(), "token-1");
		assert_eq!(provider.calls.load(Ordering::SeqCst), 1);
		assert!(!credentials.is_expired());

		provider.expired.store(true, Ordering::SeqCst);

		let third = credentials.get().await.expect("Expired provider should trigger retrieval.");

		assert_eq!(third.session_token.expose(), "token-2");
		assert_eq!(provider.calls.load(Ordering::SeqCst), 2);
	}

	#[tokio::test]
	async fn expire_forces_retrieval() {
		let provider = Arc::new(CountingProvider::default());
		let credentials = Credentials::from_arc(provider.clone(), Some("counting".into()));
		let _ = credentials.get().await.expect("First retrieval should succeed.");

		credentials.expire();

		assert!(credentials.is_expired());

		let refreshed = credentials.get().await.expect("Forced retrieval should succeed.");

		assert_eq!(refreshed.session_token.expose(), "token-2");
		assert!(!credentials.is_expired());
		assert_eq!(credentials.kind(), Some("counting"));
	}

	#[tokio::test]
	async fn failed_retrieval_clears_cache() {
		let provider = Arc::new(CountingProvider::default());
		let credentials = Credentials::from_arc(provider.clone(), None);
		let _ = credentials.get().await.expect("First retrieval should succeed.");

		provider.fail.store(true, Ordering::SeqCst);
		provider.expired.store(true, Ordering::SeqCst);

		let err = credentials.get().await.expect_err("Failing provider should surface an error.");

		assert!(matches!(err, Error::Endpoint(EndpointError::Status { status: 500, .. })));
		assert!(credentials.is_expired());
		assert!(format!("{credentials:?}").contains("cached: false"));
	}

	#[tokio::test]
	async fn expire_during_retrieval_is_not_lost() {
		let provider = Arc::new(CountingProvider::default());
		let credentials = Arc::new(Credentials::from_arc(provider.clone(), None));

		provider
			.expire_during_retrieve
			.set(Arc::downgrade(&credentials))
			.expect("Hook should only be installed once.");

		let first = credentials.get().await.expect("First retrieval should succeed.");

		assert_eq!(first.session_token.expose(), "token-1");
		assert!(credentials.is_expired());

		let second = credentials.get().await.expect("Forced retrieval should succeed.");

		assert_eq!(second.session_token.expose(), "token-2");
		assert_eq!(provider.calls.load(Ordering::SeqCst), 2);
	}
}
