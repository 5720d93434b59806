#![warn(clippy::pedantic)]
#![warn(missing_docs)]
#![warn(unreachable_pub)]
#![doc = include_str!("../README.md")]
//!
//! # Threading notes
//!
//! None of the functions in this library block except
//! [`Promise::get`](promise::Promise::get), which waits on a condition variable.
//! Every other state transition is lock-free: a single compare-and-swap against the
//! promise's one shared field, retried on contention.

pub mod chained;
pub mod continuation;
pub mod error;
pub mod outcome;
pub mod promise;
pub mod runtime;
mod state;

pub use chained::{interrupts, ChainedFuture, Interruptible};
pub use continuation::TraceTag;
pub use error::PromiseError;
pub use outcome::{Error, Try};
pub use promise::Promise;
pub use runtime::Runtime;

#[doc = include_str!("../README.md")]
mod readme {}
