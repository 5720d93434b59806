use std::sync::Arc;

use promise_core::{Promise, TraceTag};

#[test]
#[should_panic(expected = "exceeds the maximum")]
fn chaining_past_the_depth_limit_panics_at_construction() {
	let p: Arc<Promise<()>> = Arc::new(Promise::new());
	let mut next = p.respond(TraceTag("d0"), |_| {});

	for _ in 0..u16::MAX {
		next = next.respond(TraceTag("chain"), |_| {});
	}
}
