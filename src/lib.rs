//! IBM IAM authentication for object-storage clients: an API-key credential provider with
//! expiry-aware caching and a bearer-token request signer.

#![deny(clippy::all, missing_docs, unused_crate_dependencies)]

pub mod auth;
pub mod config;
pub mod credentials;
pub mod error;
pub mod ext;
pub mod http;
pub mod obs;
pub mod provider;
pub mod signer;
#[cfg(all(any(test, feature = "test"), feature = "reqwest"))]
pub mod _preludet {
	//! Convenience re-exports and helpers for integration tests; enabled via `cfg(test)` or the
	//! `test` crate feature.

	pub use crate::_prelude::*;

	// self
	use crate::{config::IamConfig, http::ReqwestHttpClient, provider::IbmIamProvider};

	/// Provider type alias used by reqwest-backed integration tests.
	pub type ReqwestTestProvider = IbmIamProvider<ReqwestHttpClient>;

	/// Builds a reqwest HTTP client that accepts the self-signed certificates produced by
	/// `httpmock` during tests.
	pub fn test_reqwest_http_client() -> ReqwestHttpClient {
		let client = ReqwestClient::builder()
			.danger_accept_invalid_certs(true)
			.danger_accept_invalid_hostnames(true)
			.build()
			.expect("Failed to build insecure Reqwest client for tests.");

		ReqwestHttpClient::with_client(client)
	}

	/// Constructs an [`IbmIamProvider`] pointed at `endpoint` (typically an `httpmock` base URL)
	/// with the reqwest transport used across integration tests.
	pub fn build_reqwest_test_provider(
		endpoint: &str,
		api_key: &str,
		service_instance_id: &str,
		expiry_window: Duration,
	) -> Arc<ReqwestTestProvider> {
		let config = IamConfig::builder(api_key)
			.service_instance_id(service_instance_id)
			.iam_endpoint(endpoint)
			.expiry_window(expiry_window)
			.build()
			.expect("Test IAM configuration should be valid.");

		Arc::new(
			IbmIamProvider::with_http_client(config, test_reqwest_http_client())
				.expect("Test provider should build from a valid configuration."),
		)
	}
}

mod _prelude {
	pub use std::{
		borrow::Cow,
		error::Error as StdError,
		fmt::{Debug, Display, Formatter, Result as FmtResult},
		future::Future,
		pin::Pin,
		sync::Arc,
	};

	pub use parking_lot::RwLock;
	#[cfg(feature = "reqwest")]
	pub use reqwest::{Client as ReqwestClient, Error as ReqwestError};
	pub use serde::{Deserialize, Serialize};
	pub use thiserror::Error as ThisError;
	pub use time::{Duration, OffsetDateTime};
	pub use url::Url;

	pub use crate::error::{Error, Result};
}

pub use oauth2;
#[cfg(feature = "reqwest")] pub use reqwest;
pub use url;
#[cfg(all(test, feature = "reqwest"))] use {color_eyre as _, httpmock as _};
