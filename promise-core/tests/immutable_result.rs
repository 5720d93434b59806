use promise_core::{Promise, PromiseError};

#[test]
fn setting_a_result_twice_is_rejected() {
	let p: Promise<i32> = Promise::new();

	assert!(p.set_value(1).is_ok());
	assert!(matches!(p.set_value(2), Err(PromiseError::ImmutableResult)));

	assert!(matches!(p.poll_result(), Some(promise_core::Try::Return(1))));
}

#[test]
fn update_if_empty_reports_whether_it_won() {
	let p: Promise<i32> = Promise::new();

	assert!(p.update_if_empty(promise_core::Try::Return(1)));
	assert!(!p.update_if_empty(promise_core::Try::Return(2)));
}
