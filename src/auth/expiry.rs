//! Expiry bookkeeping shared by credential providers.

// self
use crate::_prelude::*;

/// Tracks when a retrieved credential stops being usable.
///
/// The recorded instant already has the expiry window subtracted, so a credential is
/// usable while `now < expiration - window` and expired from that instant on. An empty
/// [`Expiry`] (nothing retrieved yet) always reports expired.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Expiry {
	expiration: Option<OffsetDateTime>,
}
impl Expiry {
	/// Records a new expiration, refreshing `window` ahead of it.
	///
	/// A window of zero or less is ignored.
	pub fn set_expiration(&mut self, expiration: OffsetDateTime, window: Duration) {
		let refresh_at = if window.is_positive() {
			expiration.checked_sub(window).unwrap_or(expiration)
		} else {
			expiration
		};

		self.expiration = Some(refresh_at);
	}

	/// Instant from which [`Expiry::is_expired_at`] returns `true`, if anything was recorded.
	pub fn expires_at(&self) -> Option<OffsetDateTime> {
		self.expiration
	}

	/// Returns `true` if nothing was recorded or the recorded instant has been reached.
	pub fn is_expired_at(&self, instant: OffsetDateTime) -> bool {
		match self.expiration {
			Some(expiration) => instant >= expiration,
			None => true,
		}
	}

	/// Checks expiry against the current UTC instant.
	pub fn is_expired(&self) -> bool {
		self.is_expired_at(OffsetDateTime::now_utc())
	}

	/// Forgets the recorded expiration.
	pub fn clear(&mut self) {
		self.expiration = None;
	}
}
