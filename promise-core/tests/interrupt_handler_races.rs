use std::sync::{
	atomic::{AtomicBool, Ordering},
	Arc,
};

use promise_core::Promise;

mod _err;
use _err::TestError;

#[test]
fn handler_installed_before_raise_runs_synchronously_on_raise() {
	let p: Arc<Promise<i32>> = Arc::new(Promise::new());
	let called = Arc::new(AtomicBool::new(false));

	let called2 = Arc::clone(&called);
	p.set_interrupt_handler(Arc::new(move |_signal| {
		called2.store(true, Ordering::SeqCst);
	}));

	assert!(!called.load(Ordering::SeqCst));
	p.raise(Arc::new(TestError("cancel")));
	assert!(called.load(Ordering::SeqCst));
	assert!(p.is_interrupted().is_some());
}

#[test]
fn raise_before_handler_is_recorded_and_delivered_on_install() {
	let p: Arc<Promise<i32>> = Arc::new(Promise::new());
	let called = Arc::new(AtomicBool::new(false));

	p.raise(Arc::new(TestError("cancel")));
	assert!(p.is_interrupted().is_some());

	let called2 = Arc::clone(&called);
	p.set_interrupt_handler(Arc::new(move |_signal| {
		called2.store(true, Ordering::SeqCst);
	}));

	assert!(called.load(Ordering::SeqCst));
}

#[test]
fn second_raise_does_not_reinvoke_handler() {
	let p: Arc<Promise<i32>> = Arc::new(Promise::new());
	let count = Arc::new(std::sync::atomic::AtomicUsize::new(0));

	let count2 = Arc::clone(&count);
	p.set_interrupt_handler(Arc::new(move |_signal| {
		count2.fetch_add(1, Ordering::SeqCst);
	}));

	p.raise(Arc::new(TestError("first")));
	p.raise(Arc::new(TestError("second")));

	assert_eq!(count.load(Ordering::SeqCst), 1);
}
