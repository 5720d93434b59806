//! The write-once promise cell: lock-free state transitions, callback dispatch,
//! interrupts, and the `become`/`link`/`compress` merge protocol.

use std::{
	sync::Arc,
	time::{Duration, Instant},
};

use arc_swap::ArcSwap;
use parking_lot::{Condvar, Mutex};

use crate::{
	continuation::{Continuation, Depth, InterruptHandler, TraceTag},
	error::{PanicError, PromiseError},
	outcome::{Error, Try},
	runtime::{default::DefaultRuntime, Runtime},
	state::State,
};

/// A write-once cell. All observable behavior is determined by the current
/// [`State`], which is read and replaced entirely through a single atomically-swapped
/// field — there is no lock anywhere in this type.
///
/// Generic over the [`Runtime`] bundle (scheduler, local context, monitor, trace
/// recorder) it defers to; [`DefaultRuntime`] is used unless otherwise specified.
pub struct Promise<A, RT: Runtime = DefaultRuntime> {
	pub(crate) state: ArcSwap<State<A, RT>>,
	pub(crate) runtime: RT,
}

impl<A, RT: Runtime + Default> Promise<A, RT> {
	/// A fresh, unsettled promise with no continuations registered.
	pub fn new() -> Self {
		Self::with_runtime(RT::default())
	}

	/// A promise pre-seeded with a result; equivalent to `new()` followed by `set`.
	pub fn done(result: Try<A>) -> Self {
		Self::done_with_runtime(result, RT::default())
	}

	/// A promise pre-seeded with an interrupt handler and no result yet.
	pub fn interruptible(handler: InterruptHandler) -> Self {
		Self::interruptible_with_runtime(handler, RT::default())
	}
}

impl<A, RT: Runtime + Default> Default for Promise<A, RT> {
	fn default() -> Self {
		Self::new()
	}
}

impl<A, RT: Runtime> Promise<A, RT> {
	/// A fresh, unsettled promise using an explicit runtime instance.
	pub fn with_runtime(runtime: RT) -> Self {
		Self {
			state: ArcSwap::new(Arc::new(State::waiting())),
			runtime,
		}
	}

	/// A promise pre-seeded with a result, using an explicit runtime instance.
	pub fn done_with_runtime(result: Try<A>, runtime: RT) -> Self {
		Self {
			state: ArcSwap::new(Arc::new(State::Done(result))),
			runtime,
		}
	}

	/// A promise pre-seeded with an interrupt handler, using an explicit runtime instance.
	pub fn interruptible_with_runtime(handler: InterruptHandler, runtime: RT) -> Self {
		Self {
			state: ArcSwap::new(Arc::new(State::Interruptible {
				waitq: Vec::new(),
				handler,
			})),
			runtime,
		}
	}

	/// Follows any `Linked` chain to the terminal, currently-installed state.
	pub(crate) fn current(&self) -> Arc<State<A, RT>> {
		let snapshot = self.state.load_full();
		if let State::Linked(target) = &*snapshot {
			target.current()
		} else {
			snapshot
		}
	}

	fn try_swap(&self, current: &Arc<State<A, RT>>, next: Arc<State<A, RT>>) -> bool {
		let previous = self.state.compare_and_swap(current, next);
		Arc::ptr_eq(&previous, current)
	}

	/// Whether an interrupt signal has been recorded (and not yet superseded by
	/// completion).
	pub fn is_interrupted(&self) -> Option<Error> {
		match &*self.current() {
			State::Interrupted { signal, .. } => Some(Arc::clone(signal)),
			_ => None,
		}
	}

	/// §4.2: registers `k` to run once this promise settles, forwarding through any
	/// link chain and dispatching immediately (via the scheduler) if already `Done`.
	pub(crate) fn push_continuation(&self, k: Continuation<A, RT::Snapshot>) {
		loop {
			let current = self.state.load_full();
			match &*current {
				State::Done(_) => {
					self.submit_dispatch(Arc::clone(&current), order_continuations(None, vec![k]));
					return;
				}
				State::Linked(target) => {
					let target = Arc::clone(target);
					return target.push_continuation(k);
				}
				State::Waiting { first, rest } => {
					let next = if first.is_none() {
						Arc::new(State::Waiting {
							first: Some(k.clone()),
							rest: rest.clone(),
						})
					} else {
						let mut rest = rest.clone();
						rest.push(k.clone());
						Arc::new(State::Waiting {
							first: first.clone(),
							rest,
						})
					};
					if self.try_swap(&current, next) {
						return;
					}
				}
				State::Interruptible { waitq, handler } => {
					let mut waitq = waitq.clone();
					waitq.push(k.clone());
					let next = Arc::new(State::Interruptible {
						waitq,
						handler: Arc::clone(handler),
					});
					if self.try_swap(&current, next) {
						return;
					}
				}
				State::Interrupted { waitq, signal } => {
					let mut waitq = waitq.clone();
					waitq.push(k.clone());
					let next = Arc::new(State::Interrupted {
						waitq,
						signal: Arc::clone(signal),
					});
					if self.try_swap(&current, next) {
						return;
					}
				}
			}
		}
	}

	/// §4.3: completes the promise with `result` unless it is already settled.
	/// Returns whether this call was the one that completed it.
	pub fn update_if_empty(&self, result: Try<A>) -> bool {
		let done = Arc::new(State::Done(result));
		self.complete_with(done)
	}

	fn complete_with(&self, done: Arc<State<A, RT>>) -> bool {
		loop {
			let current = self.state.load_full();
			let ordered = match &*current {
				State::Done(_) => return false,
				State::Linked(target) => {
					let target = Arc::clone(target);
					return target.complete_with(done);
				}
				State::Waiting { first, rest } => order_continuations(first.clone(), rest.clone()),
				State::Interruptible { waitq, .. } => order_continuations(None, waitq.clone()),
				State::Interrupted { waitq, .. } => order_continuations(None, waitq.clone()),
			};
			if self.try_swap(&current, Arc::clone(&done)) {
				self.submit_dispatch(done, ordered);
				return true;
			}
		}
	}

	/// §4.3: like [`update_if_empty`](Self::update_if_empty), but fails loudly via
	/// [`PromiseError::ImmutableResult`] if the promise had already settled.
	pub fn update(&self, result: Try<A>) -> Result<(), PromiseError> {
		if self.update_if_empty(result) {
			Ok(())
		} else {
			Err(PromiseError::ImmutableResult)
		}
	}

	/// `update(Try::Return(a))`.
	pub fn set_value(&self, value: A) -> Result<(), PromiseError> {
		self.update(Try::Return(value))
	}

	/// `update(Try::Throw(e))`.
	pub fn set_exception(&self, error: Error) -> Result<(), PromiseError> {
		self.update(Try::Throw(error))
	}

	/// §4.5: installs (or replaces) the interrupt handler. If an interrupt has
	/// already been recorded, `handler` runs synchronously on this call instead of
	/// being stored, matching the "installed after signal arrived" race.
	pub fn set_interrupt_handler(&self, handler: InterruptHandler) {
		loop {
			let current = self.state.load_full();
			match &*current {
				State::Done(_) => return,
				State::Linked(target) => {
					let target = Arc::clone(target);
					return target.set_interrupt_handler(handler);
				}
				State::Waiting { first, rest } => {
					let waitq = State::<A, RT>::take_all(first.clone(), rest.clone());
					let next = Arc::new(State::Interruptible {
						waitq,
						handler: Arc::clone(&handler),
					});
					if self.try_swap(&current, next) {
						return;
					}
				}
				State::Interruptible { waitq, .. } => {
					let next = Arc::new(State::Interruptible {
						waitq: waitq.clone(),
						handler: Arc::clone(&handler),
					});
					if self.try_swap(&current, next) {
						return;
					}
				}
				State::Interrupted { signal, .. } => {
					handler(signal);
					return;
				}
			}
		}
	}

	/// §4.5: delivers an out-of-band signal. Does not settle the promise. Runs the
	/// installed handler synchronously, on this call, only the first time a given
	/// promise transitions into `Interrupted`; later signals are recorded but do not
	/// re-invoke the handler.
	pub fn raise(&self, signal: Error) {
		loop {
			let current = self.state.load_full();
			match &*current {
				State::Done(_) => return,
				State::Linked(target) => {
					let target = Arc::clone(target);
					return target.raise(signal);
				}
				State::Waiting { first, rest } => {
					let waitq = State::<A, RT>::take_all(first.clone(), rest.clone());
					let next = Arc::new(State::Interrupted {
						waitq,
						signal: Arc::clone(&signal),
					});
					if self.try_swap(&current, next) {
						return;
					}
				}
				State::Interruptible { waitq, handler } => {
					let handler = Arc::clone(handler);
					let next = Arc::new(State::Interrupted {
						waitq: waitq.clone(),
						signal: Arc::clone(&signal),
					});
					if self.try_swap(&current, next) {
						handler(&signal);
						return;
					}
				}
				State::Interrupted { waitq, .. } => {
					let next = Arc::new(State::Interrupted {
						waitq: waitq.clone(),
						signal: Arc::clone(&signal),
					});
					if self.try_swap(&current, next) {
						return;
					}
				}
			}
		}
	}

	/// §6: wires `self` so any signal raised on it is forwarded on to `other`,
	/// without otherwise affecting `self`. `other` need not share `self`'s payload
	/// type, since forwarding only ever moves the signal, never a result.
	///
	/// [`transform`](Self::transform) calls this on its returned promise so that an
	/// interrupt raised downstream still reaches the original, upstream promise.
	pub fn forward_interrupts_to<OA: Send + 'static>(self: &Arc<Self>, other: &Arc<Promise<OA, RT>>) {
		let other = Arc::clone(other);
		self.set_interrupt_handler(Arc::new(move |signal: &Error| {
			other.raise(Arc::clone(signal));
		}));
	}

	fn submit_dispatch(&self, done: Arc<State<A, RT>>, ordered: Vec<Continuation<A, RT::Snapshot>>) {
		if ordered.is_empty() {
			return;
		}
		let runtime = self.runtime.clone();
		self.runtime.submit(Box::new(move || {
			let result = match &*done {
				State::Done(result) => result,
				_ => unreachable!("dispatch always holds a Done state"),
			};
			for continuation in ordered {
				run_continuation(&runtime, continuation, result);
			}
		}));
	}
}

/// §4.4: three-pass depth ordering. `first` (the fast slot) runs before anything
/// else; then every depth-0 entry, then every depth-1 entry; only entries with
/// `depth > 1` — rare in practice — pay for a sort.
fn order_continuations<A, Ctx>(
	first: Option<Continuation<A, Ctx>>,
	rest: Vec<Continuation<A, Ctx>>,
) -> Vec<Continuation<A, Ctx>> {
	let mut depth0 = Vec::new();
	let mut depth1 = Vec::new();
	let mut higher = Vec::new();
	for continuation in rest {
		match continuation.depth {
			0 => depth0.push(continuation),
			1 => depth1.push(continuation),
			_ => higher.push(continuation),
		}
	}
	higher.sort_by_key(|c| c.depth);

	let mut ordered = Vec::with_capacity(1 + depth0.len() + depth1.len() + higher.len());
	ordered.extend(first);
	ordered.extend(depth0);
	ordered.extend(depth1);
	ordered.extend(higher);
	ordered
}

fn run_continuation<A, RT: Runtime>(
	runtime: &RT,
	continuation: Continuation<A, RT::Snapshot>,
	result: &Try<A>,
) {
	let Some(body) = continuation.take_body() else {
		return;
	};
	runtime.record(continuation.trace);
	let monitored = continuation.monitored;
	let _guard = runtime.restore(continuation.saved);
	if monitored {
		match std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| body(result))) {
			Ok(()) => {}
			Err(payload) => runtime.caught(payload),
		}
	} else {
		body(result);
	}
}

impl<A: Clone + Send + 'static, RT: Runtime> Promise<A, RT> {
	/// §4.8: the current result, if this promise (or whatever it is linked to) has settled.
	pub fn poll_result(&self) -> Option<Try<A>> {
		match &*self.current() {
			State::Done(result) => Some(result.clone()),
			_ => None,
		}
	}

	/// §4.8: blocks the caller for up to `timeout` waiting for a result, flushing the
	/// runtime's scheduler first so a single-threaded caller does not deadlock on its
	/// own submission.
	pub fn get(&self, timeout: Duration) -> Result<Try<A>, PromiseError> {
		if let Some(result) = self.poll_result() {
			return Ok(result);
		}

		let latch = Arc::new((Mutex::new(None::<Try<A>>), Condvar::new()));
		{
			let latch = Arc::clone(&latch);
			let k = Continuation::new(
				self.runtime.save(),
				TraceTag("get"),
				0,
				false,
				move |result: &Try<A>| {
					let mut slot = latch.0.lock();
					*slot = Some(result.clone());
					latch.1.notify_all();
				},
			);
			self.push_continuation(k);
		}

		self.runtime.flush();

		let deadline = Instant::now() + timeout;
		let mut slot = latch.0.lock();
		while slot.is_none() {
			let now = Instant::now();
			if now >= deadline {
				return Err(PromiseError::Timeout);
			}
			let timed_out = latch.1.wait_for(&mut slot, deadline - now).timed_out();
			if timed_out && slot.is_none() {
				return Err(PromiseError::Timeout);
			}
		}
		Ok(slot.take().expect("loop only exits once a result is set"))
	}
}

impl<A: PartialEq + Clone + Send + 'static, RT: Runtime> Promise<A, RT> {
	/// §4.6: declares `self` and `other` observationally equivalent. `self` (after
	/// path-compression) becomes canonical; `other` is forwarded into it, replaying
	/// any continuations, handler, or recorded interrupt `other` had already
	/// accumulated.
	///
	/// The caller must ensure `self` is not already settled and that no concurrent
	/// setter races with this call; racing is documented as undefined, not guarded
	/// against.
	pub fn become_(self: &Arc<Self>, other: &Arc<Self>) -> Result<(), PromiseError> {
		let root = self.compress();
		other.link(&root)
	}

	/// §4.6: walks the `Linked` chain to its terminal target, rewriting intermediate
	/// pointers along the way. Tolerates a failed rewrite CAS: another thread may
	/// have compressed concurrently, and any reachable target is a valid one.
	fn compress(self: &Arc<Self>) -> Arc<Self> {
		let current = self.state.load_full();
		match &*current {
			State::Linked(target) => {
				let root = target.compress();
				if !Arc::ptr_eq(target, &root) {
					let next = Arc::new(State::Linked(Arc::clone(&root)));
					let _ = self.try_swap(&current, next);
				}
				root
			}
			_ => Arc::clone(self),
		}
	}

	/// §4.6: merges `self` into `target`. `self` becomes `Linked(target)`; whatever
	/// `self` had accumulated (queued continuations, a handler, a recorded signal, or
	/// a result) is replayed onto `target`.
	fn link(self: &Arc<Self>, target: &Arc<Self>) -> Result<(), PromiseError> {
		if Arc::ptr_eq(self, target) {
			return Ok(());
		}
		loop {
			let current = self.state.load_full();
			match &*current {
				State::Linked(next_hop) => {
					let next_hop = Arc::clone(next_hop);
					let next = Arc::new(State::Linked(Arc::clone(target)));
					if self.try_swap(&current, next) {
						return next_hop.link(target);
					}
				}
				State::Done(result) => {
					if target.update_if_empty(result.clone()) {
						return Ok(());
					}
					return match &*target.current() {
						State::Done(other) if other == result => Ok(()),
						State::Done(_) => Err(PromiseError::ConflictingLink),
						_ => unreachable!("update_if_empty returned false but target is not settled"),
					};
				}
				State::Waiting { first, rest } => {
					let queued = State::<A, RT>::take_all(first.clone(), rest.clone());
					let next = Arc::new(State::Linked(Arc::clone(target)));
					if self.try_swap(&current, next) {
						for k in queued {
							target.push_continuation(k);
						}
						return Ok(());
					}
				}
				State::Interruptible { waitq, handler } => {
					let waitq = waitq.clone();
					let handler = Arc::clone(handler);
					let next = Arc::new(State::Linked(Arc::clone(target)));
					if self.try_swap(&current, next) {
						for k in waitq {
							target.push_continuation(k);
						}
						target.set_interrupt_handler(handler);
						return Ok(());
					}
				}
				State::Interrupted { waitq, signal } => {
					let waitq = waitq.clone();
					let signal = Arc::clone(signal);
					let next = Arc::new(State::Linked(Arc::clone(target)));
					if self.try_swap(&current, next) {
						for k in waitq {
							target.push_continuation(k);
						}
						target.raise(signal);
						return Ok(());
					}
				}
			}
		}
	}
}

impl<A: Send + 'static, RT: Runtime> Promise<A, RT> {
	/// §4.7: registers a monitored continuation and returns a handle for the future
	/// observed "one chain link later" — its own `respond` calls register at
	/// `depth + 1`, preserving causal dispatch order through arbitrarily long chains.
	pub fn respond(
		self: &Arc<Self>,
		trace: TraceTag,
		f: impl FnOnce(&Try<A>) + Send + 'static,
	) -> crate::chained::ChainedFuture<A, RT> {
		self.respond_at(trace, 0, true, f)
	}

	pub(crate) fn respond_at(
		self: &Arc<Self>,
		trace: TraceTag,
		depth: Depth,
		monitored: bool,
		f: impl FnOnce(&Try<A>) + Send + 'static,
	) -> crate::chained::ChainedFuture<A, RT> {
		let k = Continuation::new(self.runtime.save(), trace, depth, monitored, f);
		self.push_continuation(k);
		crate::chained::ChainedFuture::new(Arc::clone(self), depth + 1)
	}

	/// §4.6/§4.7: creates a fresh promise that forwards interrupts back to `self`,
	/// and completes it with `f`'s result once `self` settles. A synchronous panic
	/// in `f` is folded into the returned promise's result rather than reaching the
	/// ambient monitor.
	pub fn transform<B: Send + 'static>(
		self: &Arc<Self>,
		trace: TraceTag,
		f: impl FnOnce(&Try<A>) -> Try<B> + Send + 'static,
	) -> Arc<Promise<B, RT>> {
		let p = Arc::new(Promise::with_runtime(self.runtime.clone()));
		let upstream = Arc::clone(self);
		let downstream = Arc::clone(&p);
		let k = Continuation::new(self.runtime.save(), trace, 0, false, move |r: &Try<A>| {
			let outcome = match std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| f(r))) {
				Ok(outcome) => outcome,
				Err(payload) => Try::Throw(Arc::new(PanicError::from_payload(payload))),
			};
			let _ = downstream.update_if_empty(outcome);
		});
		self.push_continuation(k);
		p.forward_interrupts_to(&upstream);
		p
	}
}
