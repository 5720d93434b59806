mod _validator;

use std::{sync::mpsc, sync::Arc, time::Duration};

use promise_core::{Promise, TraceTag, Try};

use _validator::Validator;

#[test]
fn become_merges_wait_queues_and_forwards_completion() {
	let v = Arc::new(Validator::<&'static str>::new());
	let a: Arc<Promise<i32>> = Arc::new(Promise::new());
	let b: Arc<Promise<i32>> = Arc::new(Promise::new());
	let (tx, rx) = mpsc::channel();

	let v2 = Arc::clone(&v);
	b.respond(TraceTag("b"), move |_| {
		v2.push("b");
		let _ = tx.send(());
	});

	a.become_(&b).unwrap();
	b.set_value(42).unwrap();
	rx.recv_timeout(Duration::from_secs(1)).unwrap();

	v.expect(["b"]);
	assert!(matches!(a.poll_result(), Some(Try::Return(42))));
	assert!(matches!(b.poll_result(), Some(Try::Return(42))));
}
