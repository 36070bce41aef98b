// self
use crate::obs::{OperationKind, Outcome};

/// Increments `ibm_iam_operation_total{operation, outcome, reason}` when `metrics` is enabled.
pub fn record_outcome(kind: OperationKind, outcome: Outcome) {
	#[cfg(feature = "metrics")]
	{
		metrics::counter!(
			"ibm_iam_operation_total",
			"operation" => kind.as_str(),
			"outcome" => outcome.as_str(),
			"reason" => outcome.reason()
		)
		.increment(1);
	}

	#[cfg(not(feature = "metrics"))]
	{
		let _ = (kind, outcome);
	}
}
