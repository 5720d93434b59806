//! The narrow external collaborators a [`Promise`](crate::promise::Promise) defers to,
//! plus [`DefaultRuntime`], a functional bundle of all four.
//!
//! The core state machine has no opinion of its own about how work gets run, how
//! per-task context is propagated, where an uncaught callback panic ends up, or how
//! tracing happens. It depends on four single-purpose traits instead, bundled behind
//! one [`Runtime`] marker so that [`Promise`](crate::promise::Promise) only needs a
//! single generic parameter.

use std::any::Any;

use crate::continuation::TraceTag;

pub mod default;
pub mod scheduler;

/// Submits work for later execution and drains already-submitted work on demand.
///
/// `submit` must return promptly; it does not run `work` inline. `flush` exists so
/// that a thread blocked in [`Promise::get`](crate::promise::Promise::get) can make
/// progress on its own submissions instead of deadlocking on itself.
pub trait Scheduler {
	/// Enqueues `work` for execution, without blocking the caller.
	fn submit(&self, work: Box<dyn FnOnce() + Send>);

	/// Drains work already submitted to this scheduler, on the calling thread.
	fn flush(&self);
}

/// Captures and restores the ambient per-task context around a continuation's
/// invocation, so that a callback observes the context of whoever registered it
/// rather than the context of whoever completed the promise.
pub trait LocalContext {
	/// An opaque, cheaply cloneable snapshot of the ambient context.
	type Snapshot: Clone + Send + 'static;

	/// An RAII guard restoring the previous context when dropped, including when
	/// dropped while unwinding.
	type Guard;

	/// Captures the current context.
	fn save(&self) -> Self::Snapshot;

	/// Installs `snapshot` as the current context until the returned guard drops,
	/// at which point the previous context is restored. Restoration must happen on
	/// every exit path, including a panic unwinding through the guarded region.
	fn restore(&self, snapshot: Self::Snapshot) -> Self::Guard;
}

/// Observes panics raised by monitored callbacks without letting them escape dispatch.
pub trait Monitor {
	/// Called with the panic payload of a monitored callback that panicked.
	///
	/// Unmonitored callbacks never reach this method; their panics propagate to
	/// whichever scheduler worker ran them.
	fn caught(&self, payload: Box<dyn Any + Send>);
}

/// Records a trace tag at the point a continuation is about to be invoked.
pub trait TraceRecorder {
	/// Records `tag`, before the continuation's callback body runs.
	fn record(&self, tag: TraceTag);
}

/// Bundles the four collaborators a [`Promise`](crate::promise::Promise) is generic over.
///
/// Implement this (typically by delegating to the four traits above on the same
/// type) to plug in an alternative scheduler, context mechanism, monitor, or trace
/// sink. [`DefaultRuntime`](default::DefaultRuntime) is a ready-to-use implementation.
pub trait Runtime:
	Scheduler + LocalContext + Monitor + TraceRecorder + Clone + Send + Sync + 'static
{
}

impl<T> Runtime for T where
	T: Scheduler + LocalContext + Monitor + TraceRecorder + Clone + Send + Sync + 'static
{
}
