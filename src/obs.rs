//! Observability hooks for credential retrieval and request signing.
//!
//! Retrieval and signing each open an [`OperationSpan`] (feature `tracing`, span name
//! `ibm_iam.operation`) and bump `ibm_iam_operation_total` (feature `metrics`). Failures carry a
//! [`FailureReason`] so dashboards can tell an unreachable IAM endpoint from a malformed token
//! response or a broken configuration.

mod metrics;
mod tracing;

pub use metrics::*;
pub use tracing::*;

// self
use crate::_prelude::*;

/// Operations observed by the crate.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum OperationKind {
	/// API key exchange against the IAM token endpoint.
	Retrieve,
	/// Header attachment on an outgoing request.
	Sign,
}
impl OperationKind {
	/// Label used for the `operation` span field and metric label.
	pub const fn as_str(self) -> &'static str {
		match self {
			OperationKind::Retrieve => "retrieve",
			OperationKind::Sign => "sign",
		}
	}
}
impl Display for OperationKind {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Error class behind a failed operation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FailureReason {
	/// Invalid endpoint, request construction, or header value.
	Config,
	/// Token endpoint unreachable or answered with a non-200 status.
	Endpoint,
	/// Token response body could not be decoded.
	Decode,
}
impl FailureReason {
	/// Classifies a crate error.
	pub fn of(err: &Error) -> Self {
		match err {
			Error::Config(_) => FailureReason::Config,
			Error::Endpoint(_) => FailureReason::Endpoint,
			Error::Decode(_) => FailureReason::Decode,
		}
	}

	/// Label used for the `reason` metric label.
	pub const fn as_str(self) -> &'static str {
		match self {
			FailureReason::Config => "config",
			FailureReason::Endpoint => "endpoint",
			FailureReason::Decode => "decode",
		}
	}
}

/// Outcome recorded for each operation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Outcome {
	/// Entry to an instrumented operation.
	Attempt,
	/// Successful completion.
	Success,
	/// Failure propagated back to the caller.
	Failure(FailureReason),
}
impl Outcome {
	/// Label used for the `outcome` span field and metric label.
	pub const fn as_str(self) -> &'static str {
		match self {
			Outcome::Attempt => "attempt",
			Outcome::Success => "success",
			Outcome::Failure(_) => "failure",
		}
	}

	/// Label used for the `reason` metric label; `none` unless the operation failed.
	pub const fn reason(self) -> &'static str {
		match self {
			Outcome::Failure(reason) => reason.as_str(),
			Outcome::Attempt | Outcome::Success => "none",
		}
	}

	/// Maps a result into its terminal outcome.
	pub fn of<T>(result: &Result<T>) -> Self {
		match result {
			Ok(_) => Outcome::Success,
			Err(e) => Outcome::Failure(FailureReason::of(e)),
		}
	}
}
impl Display for Outcome {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}
