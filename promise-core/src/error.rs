//! Error taxonomy for fallible promise operations.

/// Errors surfaced by [`Promise`](crate::promise::Promise) operations that can fail at runtime.
///
/// Protocol violations that indicate a caller bug rather than a recoverable runtime
/// condition (a self-link, a chain built past the depth limit) panic instead of
/// returning this type; see the individual method docs.
#[derive(Debug, thiserror::Error)]
pub enum PromiseError {
	/// [`update`](crate::promise::Promise::update) was called on a promise that had
	/// already settled.
	#[error("promise already has a result")]
	ImmutableResult,

	/// [`link`](crate::promise::Promise::become_) attempted to merge two already-settled
	/// promises whose results disagree.
	#[error("cannot link two done promises with conflicting results")]
	ConflictingLink,

	/// [`get`](crate::promise::Promise::get) did not observe a result within the
	/// requested timeout.
	#[error("timed out waiting for promise result")]
	Timeout,
}

/// Wraps a caught panic payload from an unmonitored `transform` closure into an
/// [`std::error::Error`] so it can travel as a [`Try::Throw`](crate::outcome::Try::Throw).
#[derive(Debug, thiserror::Error)]
#[error("transform callback panicked: {message}")]
pub struct PanicError {
	message: String,
}

impl PanicError {
	pub(crate) fn from_payload(payload: Box<dyn std::any::Any + Send>) -> Self {
		let message = payload
			.downcast_ref::<&str>()
			.map(|s| (*s).to_string())
			.or_else(|| payload.downcast_ref::<String>().cloned())
			.unwrap_or_else(|| "non-string panic payload".to_string());
		Self { message }
	}
}
