//! The five-variant state a promise's single atomically-swapped field can hold.

use std::sync::Arc;

use crate::{
	continuation::{Continuation, InterruptHandler},
	outcome::{Error, Try},
	promise::Promise,
	runtime::Runtime,
};

/// The tagged union backing [`Promise`]'s single CAS-mediated field.
///
/// Every transition replaces the whole value; nothing here is ever mutated in
/// place. See the module docs on [`Promise`] for the legal transitions between
/// these five cases.
pub(crate) enum State<A, RT: Runtime> {
	/// No result yet, no interrupt handler installed. `first` is a fast slot for the
	/// common case of a promise with exactly one registered continuation.
	Waiting {
		first: Option<Continuation<A, RT::Snapshot>>,
		rest: Vec<Continuation<A, RT::Snapshot>>,
	},
	/// No result yet, a handler is installed and no signal has arrived.
	Interruptible {
		waitq: Vec<Continuation<A, RT::Snapshot>>,
		handler: InterruptHandler,
	},
	/// No result yet; a signal has been delivered and recorded.
	Interrupted {
		waitq: Vec<Continuation<A, RT::Snapshot>>,
		signal: Error,
	},
	/// Terminal: the result is immutable from here on.
	Done(Try<A>),
	/// Terminal for this node except for path-compression rewrites: every operation
	/// forwards to `target`.
	Linked(Arc<Promise<A, RT>>),
}

impl<A, RT: Runtime> State<A, RT> {
	pub(crate) fn waiting() -> Self {
		State::Waiting {
			first: None,
			rest: Vec::new(),
		}
	}

	/// Collapses `first`/`rest` into a single queue, used when leaving `Waiting`.
	pub(crate) fn take_all(first: Option<Continuation<A, RT::Snapshot>>, rest: Vec<Continuation<A, RT::Snapshot>>) -> Vec<Continuation<A, RT::Snapshot>> {
		let mut all = Vec::with_capacity(rest.len() + first.is_some() as usize);
		all.extend(first);
		all.extend(rest);
		all
	}
}
