use std::sync::Arc;

use promise_core::{Promise, TraceTag, Try};

#[test]
fn panic_inside_transform_folds_into_downstream_throw() {
	let p: Arc<Promise<i32>> = Arc::new(Promise::new());
	let q = p.transform(TraceTag("boom"), |_result| -> Try<i32> {
		panic!("transform exploded");
	});

	p.set_value(1).unwrap();

	let result = q.get(std::time::Duration::from_secs(1)).unwrap();
	match result {
		Try::Throw(e) => assert!(e.to_string().contains("transform exploded")),
		Try::Return(_) => panic!("expected a throw from the panicking transform"),
	}
}

#[test]
fn transform_maps_successful_result() {
	let p: Arc<Promise<i32>> = Arc::new(Promise::new());
	let q = p.transform(TraceTag("double"), |result| match result {
		Try::Return(n) => Try::Return(n * 2),
		Try::Throw(e) => Try::Throw(Arc::clone(e)),
	});

	p.set_value(21).unwrap();

	let result = q.get(std::time::Duration::from_secs(1)).unwrap();
	assert!(matches!(result, Try::Return(42)));
}
