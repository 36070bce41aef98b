// self
use crate::{
	_prelude::*,
	obs::{OperationKind, Outcome},
};

/// Future returned by [`OperationSpan::instrument`]; instrumented only with `tracing` enabled.
#[cfg(feature = "tracing")]
pub type InstrumentedOperation<F> = tracing::instrument::Instrumented<F>;
/// Future returned by [`OperationSpan::instrument`]; instrumented only with `tracing` enabled.
#[cfg(not(feature = "tracing"))]
pub type InstrumentedOperation<F> = F;

/// `ibm_iam.operation` span around one retrieval or signing call.
///
/// The span carries `operation`, `stage`, and an `outcome` field filled in by
/// [`OperationSpan::record_outcome`] once the call settles.
#[derive(Clone, Debug)]
pub struct OperationSpan {
	#[cfg(feature = "tracing")]
	span: tracing::Span,
}
impl OperationSpan {
	/// Opens the span for `kind` at call site `stage`.
	pub fn new(kind: OperationKind, stage: &'static str) -> Self {
		#[cfg(feature = "tracing")]
		{
			let span = tracing::info_span!(
				"ibm_iam.operation",
				operation = kind.as_str(),
				stage,
				outcome = tracing::field::Empty
			);

			Self { span }
		}
		#[cfg(not(feature = "tracing"))]
		{
			let _ = (kind, stage);

			Self {}
		}
	}

	/// Runs `fut` inside the span; no guard is held across `.await` points.
	pub fn instrument<Fut>(&self, fut: Fut) -> InstrumentedOperation<Fut>
	where
		Fut: Future,
	{
		#[cfg(feature = "tracing")]
		{
			use tracing::Instrument;

			fut.instrument(self.span.clone())
		}
		#[cfg(not(feature = "tracing"))]
		{
			fut
		}
	}

	/// Stores the terminal outcome on the span.
	pub fn record_outcome(&self, outcome: Outcome) {
		#[cfg(feature = "tracing")]
		{
			self.span.record("outcome", outcome.as_str());
		}
		#[cfg(not(feature = "tracing"))]
		{
			let _ = outcome;
		}
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[tokio::test]
	async fn span_wraps_retrieval_future() {
		let span = OperationSpan::new(OperationKind::Retrieve, "fetch_credential");
		let result: Result<u8> = span.instrument(async { Ok(42) }).await;

		span.record_outcome(Outcome::of(&result));

		assert!(matches!(result, Ok(42)));
	}
}
