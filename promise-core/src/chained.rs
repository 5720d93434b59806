//! The chained future handle returned by [`respond`](crate::promise::Promise::respond)
//! and [`transform`](crate::promise::Promise::transform), plus the `interrupts`
//! aggregation helper.

use std::{
	future::Future,
	pin::Pin,
	sync::Arc,
	task::{Context as TaskContext, Poll, Waker},
	time::Duration,
};

use parking_lot::Mutex;

use crate::{
	continuation::{Continuation, Depth, TraceTag},
	error::PromiseError,
	outcome::{Error, Try},
	promise::Promise,
	runtime::Runtime,
};

enum PollState<A> {
	NotPolled,
	Registered,
	Ready(Try<A>),
}

/// The future-at-depth-N handle produced by [`Promise::respond`](crate::promise::Promise::respond).
///
/// Its own query operations (`poll_result`, `get`, `is_interrupted`, `raise`) forward
/// to the root promise. Calling [`respond`](Self::respond) again registers a further
/// continuation at `depth + 1`, so a chain of calls dispatches in the order it was
/// written even though later links are registered after earlier ones may have run.
///
/// Also implements [`std::future::Future`]: the first time it is polled and still
/// pending, it lazily registers a one-shot continuation that wakes the polling task.
pub struct ChainedFuture<A, RT: Runtime> {
	root: Arc<Promise<A, RT>>,
	depth: Depth,
	poll_state: Arc<Mutex<PollState<A>>>,
}

impl<A: Send + 'static, RT: Runtime> ChainedFuture<A, RT> {
	pub(crate) fn new(root: Arc<Promise<A, RT>>, depth: Depth) -> Self {
		Self {
			root,
			depth,
			poll_state: Arc::new(Mutex::new(PollState::NotPolled)),
		}
	}

	/// Registers `f` at this handle's depth and returns the next handle, one chain
	/// link further along.
	pub fn respond(
		&self,
		trace: TraceTag,
		f: impl FnOnce(&Try<A>) + Send + 'static,
	) -> ChainedFuture<A, RT> {
		self.root.respond_at(trace, self.depth, true, f)
	}

	/// Forwards to the root promise's [`is_interrupted`](Promise::is_interrupted).
	pub fn is_interrupted(&self) -> Option<Error> {
		self.root.is_interrupted()
	}

	/// Forwards to the root promise's [`raise`](Promise::raise).
	pub fn raise(&self, signal: Error) {
		self.root.raise(signal)
	}
}

impl<A: Clone + Send + 'static, RT: Runtime> ChainedFuture<A, RT> {
	/// Forwards to the root promise's [`poll_result`](Promise::poll_result).
	pub fn poll_result(&self) -> Option<Try<A>> {
		self.root.poll_result()
	}

	/// Forwards to the root promise's [`get`](Promise::get).
	pub fn get(&self, timeout: Duration) -> Result<Try<A>, PromiseError> {
		self.root.get(timeout)
	}
}

impl<A: Clone + Send + 'static, RT: Runtime> Future for ChainedFuture<A, RT> {
	type Output = Try<A>;

	fn poll(self: Pin<&mut Self>, cx: &mut TaskContext<'_>) -> Poll<Try<A>> {
		let this = self.get_mut();
		let mut guard = this.poll_state.lock();
		match &*guard {
			PollState::Ready(_) => {
				let ready = std::mem::replace(&mut *guard, PollState::Registered);
				match ready {
					PollState::Ready(result) => Poll::Ready(result),
					_ => unreachable!(),
				}
			}
			PollState::Registered => Poll::Pending,
			PollState::NotPolled => {
				*guard = PollState::Registered;
				drop(guard);
				let waker = cx.waker().clone();
				let poll_state = Arc::clone(&this.poll_state);
				let k = Continuation::new(
					this.root.runtime.save(),
					TraceTag("await"),
					this.depth,
					false,
					move |result: &Try<A>| {
						*poll_state.lock() = PollState::Ready(result.clone());
						waker.wake();
					},
				);
				this.root.push_continuation(k);
				Poll::Pending
			}
		}
	}
}

/// A future that can be interrupted out-of-band; implemented for every
/// [`Promise`] so [`interrupts`] can forward a signal to a heterogeneous set of targets.
pub trait Interruptible: Send + Sync {
	/// Delivers `signal` to this future without settling it.
	fn raise(&self, signal: Error);
}

impl<A: Send + 'static, RT: Runtime> Interruptible for Arc<Promise<A, RT>> {
	fn raise(&self, signal: Error) {
		Promise::raise(self, signal)
	}
}

/// Builds an empty promise whose interrupt handler forwards any raised signal to
/// every future in `targets`.
pub fn interrupts<A, RT>(targets: Vec<Box<dyn Interruptible>>) -> Arc<Promise<A, RT>>
where
	A: Send + 'static,
	RT: Runtime + Default,
{
	let p = Arc::new(Promise::new());
	p.set_interrupt_handler(Arc::new(move |signal: &Error| {
		for target in &targets {
			target.raise(Arc::clone(signal));
		}
	}));
	p
}
