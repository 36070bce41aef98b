//! Credential snapshot handed from providers to signers.

// self
use crate::{_prelude::*, auth::TokenSecret};

/// Snapshot of a retrieved credential.
///
/// Providers own the authoritative expiry state; signers receive clones of this value on
/// every request and only read it.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential {
	/// Bearer token attached to signed requests; callers must avoid logging it.
	pub session_token: TokenSecret,
	/// Tenant identifier sent with bucket-level operations.
	pub service_instance_id: String,
	/// Name of the provider that produced the credential.
	pub provider_name: String,
	/// Instant the token endpoint reported for token expiry.
	pub expires_at: OffsetDateTime,
	/// Lead time before `expires_at` at which the credential is treated as expired.
	pub expiry_window: Duration,
}
impl Credential {
	/// Instant from which the credential must be refreshed.
	pub fn refresh_at(&self) -> OffsetDateTime {
		if self.expiry_window.is_positive() {
			self.expires_at.checked_sub(self.expiry_window).unwrap_or(self.expires_at)
		} else {
			self.expires_at
		}
	}

	/// Returns `true` while `instant < expires_at - expiry_window`.
	pub fn is_valid_at(&self, instant: OffsetDateTime) -> bool {
		instant < self.refresh_at()
	}

	/// Checks validity against the current UTC instant.
	pub fn is_valid(&self) -> bool {
		self.is_valid_at(OffsetDateTime::now_utc())
	}
}
impl Debug for Credential {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("Credential")
			.field("session_token", &"<redacted>")
			.field("service_instance_id", &self.service_instance_id)
			.field("provider_name", &self.provider_name)
			.field("expires_at", &self.expires_at)
			.field("expiry_window", &self.expiry_window)
			.finish()
	}
}
