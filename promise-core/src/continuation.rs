//! Continuation records and the depth tag used to order dispatch.

use std::sync::Arc;

use parking_lot::Mutex;

use crate::outcome::{Error, Try};

/// Ordering tag attached to every continuation, used only at a single dispatch
/// event to keep chained callbacks causally ordered relative to their parent.
///
/// Not a scheduling priority: it is consulted exactly once, when the promise
/// that owns the continuation settles.
pub type Depth = u16;

/// A chain of [`respond`](crate::promise::Promise::respond)/[`transform`](crate::promise::Promise::transform)
/// calls longer than this panics at construction rather than silently wrapping.
pub const MAX_DEPTH: Depth = 32_766;

/// An opaque tag recorded by the [`TraceRecorder`](crate::runtime::TraceRecorder)
/// when a continuation runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TraceTag(pub &'static str);

/// A handler for an out-of-band interrupt signal.
///
/// Conceptually a partial function: a handler that has nothing to say about a
/// given signal should simply not act on it rather than panicking. `Arc`-boxed so a
/// handler can be carried forward cheaply across compare-and-swap retries.
pub type InterruptHandler = Arc<dyn Fn(&Error) + Send + Sync>;

type Body<A> = Box<dyn FnOnce(&Try<A>) + Send>;

/// A callback plus everything needed to invoke it faithfully once its promise settles.
///
/// `Clone`able so that building the next candidate state during a compare-and-swap
/// retry can cheaply carry forward continuations already accepted by a prior,
/// losing attempt; the callback body itself is taken out of its `Mutex` and run
/// exactly once, by whichever attempt is the one actually installed and dispatched.
pub struct Continuation<A, Ctx> {
	pub(crate) saved: Ctx,
	pub(crate) trace: TraceTag,
	pub(crate) depth: Depth,
	pub(crate) monitored: bool,
	body: Arc<Mutex<Option<Body<A>>>>,
}

impl<A, Ctx: Clone> Clone for Continuation<A, Ctx> {
	fn clone(&self) -> Self {
		Self {
			saved: self.saved.clone(),
			trace: self.trace,
			depth: self.depth,
			monitored: self.monitored,
			body: Arc::clone(&self.body),
		}
	}
}

impl<A, Ctx> Continuation<A, Ctx> {
	pub(crate) fn new(
		saved: Ctx,
		trace: TraceTag,
		depth: Depth,
		monitored: bool,
		body: impl FnOnce(&Try<A>) + Send + 'static,
	) -> Self {
		if depth > MAX_DEPTH {
			panic!("chained future depth {depth} exceeds the maximum of {MAX_DEPTH}");
		}
		Self {
			saved,
			trace,
			depth,
			monitored,
			body: Arc::new(Mutex::new(Some(Box::new(body)))),
		}
	}

	/// Takes the callback body, if it has not already been taken by a concurrent
	/// duplicate of this continuation. Returns `None` on a second call.
	pub(crate) fn take_body(&self) -> Option<Body<A>> {
		self.body.lock().take()
	}
}
