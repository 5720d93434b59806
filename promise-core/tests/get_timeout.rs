use std::time::Duration;

use promise_core::{Promise, PromiseError, Try};

#[test]
fn get_times_out_on_an_unsettled_promise() {
	let p: Promise<i32> = Promise::new();
	let result = p.get(Duration::from_millis(50));
	assert!(matches!(result, Err(PromiseError::Timeout)));
}

#[test]
fn get_returns_immediately_once_already_done() {
	let p: Promise<i32> = Promise::done(Try::Return(7));
	let result = p.get(Duration::from_millis(50)).unwrap();
	assert!(matches!(result, Try::Return(7)));
}
