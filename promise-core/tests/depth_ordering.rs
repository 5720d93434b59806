mod _validator;

use std::{sync::mpsc, sync::Arc, time::Duration};

use promise_core::{Promise, TraceTag};

use _validator::Validator;

#[test]
fn chained_respond_calls_dispatch_in_depth_order() {
	let v = Arc::new(Validator::<&'static str>::new());
	let p: Arc<Promise<()>> = Arc::new(Promise::new());
	let (tx, rx) = mpsc::channel();

	let v0 = Arc::clone(&v);
	let q = p.respond(TraceTag("r0"), move |_| v0.push("r0"));

	let v1 = Arc::clone(&v);
	let r = q.respond(TraceTag("r1"), move |_| v1.push("r1"));

	let v2 = Arc::clone(&v);
	r.respond(TraceTag("r2"), move |_| {
		v2.push("r2");
		let _ = tx.send(());
	});

	p.set_value(()).unwrap();
	rx.recv_timeout(Duration::from_secs(1)).unwrap();

	v.expect(["r0", "r1", "r2"]);
}
