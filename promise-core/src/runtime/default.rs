//! [`DefaultRuntime`]: a functional bundle of all four collaborators, usable out of
//! the box. Backed by [`WorkerPool`](super::scheduler::WorkerPool) for scheduling and
//! `tracing` for the monitor and trace recorder.

use std::{
	any::Any,
	cell::RefCell,
	collections::BTreeMap,
	panic::Location,
	sync::{Arc, OnceLock},
};

use crate::continuation::TraceTag;

use super::{
	scheduler::{Config as SchedulerConfig, WorkerPool},
	LocalContext, Monitor, Scheduler, TraceRecorder,
};

struct ContextInner {
	slots: BTreeMap<&'static str, Arc<dyn Any + Send + Sync>>,
}

/// An opaque, cheaply cloneable, ordered map of typed slots.
///
/// This is the default [`LocalContext::Snapshot`]: a small functional map, cloned by
/// reference count, built up with [`Context::with`] and read back with [`Context::get`].
#[derive(Clone)]
pub struct Context(Arc<ContextInner>);

impl Context {
	/// An empty context.
	pub fn new() -> Self {
		Self(Arc::new(ContextInner {
			slots: BTreeMap::new(),
		}))
	}

	/// Returns a new context with `key` bound to `value`, leaving `self` unchanged.
	pub fn with<T: Send + Sync + 'static>(&self, key: &'static str, value: T) -> Self {
		let mut slots = self.0.slots.clone();
		slots.insert(key, Arc::new(value));
		Self(Arc::new(ContextInner { slots }))
	}

	/// Looks up a previously bound slot.
	pub fn get<T: Send + Sync + 'static>(&self, key: &'static str) -> Option<Arc<T>> {
		self.0.slots.get(key)?.clone().downcast::<T>().ok()
	}
}

impl Default for Context {
	fn default() -> Self {
		Self::new()
	}
}

thread_local! {
	static CONTEXT_STACK: RefCell<Vec<Context>> = RefCell::new(vec![Context::new()]);
}

fn pop_context(_: ()) {
	CONTEXT_STACK.with(|stack| {
		stack.borrow_mut().pop();
	});
}

/// Restores the context that was active before [`LocalContext::restore`] was called,
/// on drop, including while unwinding.
pub type ContextGuard = scopeguard::ScopeGuard<(), fn(())>;

fn global_pool() -> &'static WorkerPool {
	static POOL: OnceLock<WorkerPool> = OnceLock::new();
	POOL.get_or_init(|| WorkerPool::new(SchedulerConfig::default()))
}

/// The default [`Runtime`](super::Runtime): a global worker pool, a thread-local
/// context stack, and `tracing`-backed monitor/trace hooks.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DefaultRuntime;

impl Scheduler for DefaultRuntime {
	fn submit(&self, work: Box<dyn FnOnce() + Send>) {
		global_pool().submit(work);
	}

	fn flush(&self) {
		global_pool().flush();
	}
}

impl LocalContext for DefaultRuntime {
	type Snapshot = Context;
	type Guard = ContextGuard;

	fn save(&self) -> Context {
		CONTEXT_STACK.with(|stack| {
			stack
				.borrow()
				.last()
				.cloned()
				.unwrap_or_default()
		})
	}

	fn restore(&self, snapshot: Context) -> ContextGuard {
		CONTEXT_STACK.with(|stack| stack.borrow_mut().push(snapshot));
		scopeguard::guard((), pop_context)
	}
}

impl Monitor for DefaultRuntime {
	#[track_caller]
	fn caught(&self, payload: Box<dyn Any + Send>) {
		let message = payload
			.downcast_ref::<&str>()
			.map(|s| (*s).to_string())
			.or_else(|| payload.downcast_ref::<String>().cloned())
			.unwrap_or_else(|| "non-string panic payload".to_string());
		tracing::error!(panic = %message, location = %Location::caller(), "monitored callback panicked");
	}
}

impl TraceRecorder for DefaultRuntime {
	fn record(&self, tag: TraceTag) {
		tracing::trace!(tag = tag.0, "continuation invoked");
	}
}
