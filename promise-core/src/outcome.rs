//! The result type a promise ultimately settles with.

use std::{fmt, sync::Arc};

/// A type-erased, cloneable failure value.
///
/// Boxed behind an [`Arc`] so that a single failure can be replayed to every
/// continuation registered on a promise without cloning the underlying error.
pub type Error = Arc<dyn std::error::Error + Send + Sync + 'static>;

/// The outcome a promise settles with: either a value or a failure.
///
/// Mirrors the two-variant `Try` used throughout the scheduling and dispatch
/// machinery; cloning is cheap (`A: Clone` aside) because the failure side is
/// already reference-counted.
#[derive(Clone)]
pub enum Try<A> {
	/// The promise completed successfully with `A`.
	Return(A),
	/// The promise completed with a failure.
	Throw(Error),
}

impl<A> Try<A> {
	/// Builds a [`Try::Throw`] from any owned error type.
	pub fn failed(error: impl std::error::Error + Send + Sync + 'static) -> Self {
		Try::Throw(Arc::new(error))
	}

	/// Returns the value if this is a [`Try::Return`].
	pub fn ok(self) -> Option<A> {
		match self {
			Try::Return(a) => Some(a),
			Try::Throw(_) => None,
		}
	}

	/// Returns the failure if this is a [`Try::Throw`].
	pub fn err(&self) -> Option<&Error> {
		match self {
			Try::Return(_) => None,
			Try::Throw(e) => Some(e),
		}
	}

	/// Maps the success value, leaving a failure untouched.
	pub fn map<B>(self, f: impl FnOnce(A) -> B) -> Try<B> {
		match self {
			Try::Return(a) => Try::Return(f(a)),
			Try::Throw(e) => Try::Throw(e),
		}
	}
}

impl<A: fmt::Debug> fmt::Debug for Try<A> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Try::Return(a) => f.debug_tuple("Return").field(a).finish(),
			Try::Throw(e) => f.debug_tuple("Throw").field(e).finish(),
		}
	}
}

impl<A: PartialEq> PartialEq for Try<A> {
	/// Failures compare by pointer identity of the type-erased error, matching the
	/// `A: PartialEq`-only bound `link` relies on: two independently constructed
	/// errors are never considered equal, only the same recorded failure is.
	fn eq(&self, other: &Self) -> bool {
		match (self, other) {
			(Try::Return(a), Try::Return(b)) => a == b,
			(Try::Throw(a), Try::Throw(b)) => Arc::ptr_eq(a, b),
			_ => false,
		}
	}
}
