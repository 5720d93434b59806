mod _validator;

use std::{sync::mpsc, sync::Arc, time::Duration};

use promise_core::{Promise, TraceTag, Try};

use _validator::Validator;

#[test]
fn single_callback_runs_once() {
	let v = Arc::new(Validator::<&'static str>::new());
	let p: Arc<Promise<i32>> = Arc::new(Promise::new());
	let (tx, rx) = mpsc::channel();

	let v2 = Arc::clone(&v);
	p.respond(TraceTag("single_callback"), move |_result| {
		v2.push("a");
		let _ = tx.send(());
	});

	p.set_value(1).unwrap();
	rx.recv_timeout(Duration::from_secs(1)).unwrap();

	v.expect(["a"]);
	assert!(matches!(p.poll_result(), Some(Try::Return(1))));
}
