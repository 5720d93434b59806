//! A small fixed-size worker pool, the default [`Scheduler`](super::Scheduler).

use std::{
	collections::VecDeque,
	sync::{Arc, Condvar, Mutex},
	thread,
};

type Job = Box<dyn FnOnce() + Send>;

struct Shared {
	queue: Mutex<VecDeque<Job>>,
	ready: Condvar,
}

/// A fixed-size pool of worker threads draining a shared FIFO queue.
///
/// This is a convenience default, not part of the contract [`Scheduler`](super::Scheduler)
/// describes: any implementation of that trait may be substituted.
#[derive(Clone)]
pub struct WorkerPool {
	shared: Arc<Shared>,
}

/// Tuning knobs for [`WorkerPool`]. `Default` spins up a small fixed pool sized to
/// the visible parallelism, with a floor of one worker.
pub struct Config {
	/// Number of worker threads kept running for the lifetime of the pool.
	pub worker_threads: usize,
}

impl Default for Config {
	fn default() -> Self {
		Self {
			worker_threads: thread::available_parallelism()
				.map(|n| n.get())
				.unwrap_or(1)
				.max(1),
		}
	}
}

impl WorkerPool {
	/// Spins up a pool per `config`, leaking its worker threads for the life of the process.
	pub fn new(config: Config) -> Self {
		let shared = Arc::new(Shared {
			queue: Mutex::new(VecDeque::new()),
			ready: Condvar::new(),
		});
		for _ in 0..config.worker_threads.max(1) {
			let shared = Arc::clone(&shared);
			thread::Builder::new()
				.name("promise-core-worker".into())
				.spawn(move || worker_loop(&shared))
				.expect("failed to spawn promise-core worker thread");
		}
		Self { shared }
	}

	/// Enqueues `work`; one of the pool's worker threads will run it.
	pub fn submit(&self, work: Job) {
		self.shared.queue.lock().unwrap().push_back(work);
		self.shared.ready.notify_one();
	}

	/// Drains work already queued, running it on the calling thread.
	///
	/// Used by [`Promise::get`](crate::promise::Promise::get) so a thread that is
	/// itself the only available worker does not deadlock waiting on its own submission.
	pub fn flush(&self) {
		loop {
			let job = self.shared.queue.lock().unwrap().pop_front();
			match job {
				Some(job) => job(),
				None => break,
			}
		}
	}
}

impl Default for WorkerPool {
	fn default() -> Self {
		Self::new(Config::default())
	}
}

fn worker_loop(shared: &Shared) {
	loop {
		let job = {
			let mut queue = shared.queue.lock().unwrap();
			loop {
				if let Some(job) = queue.pop_front() {
					break job;
				}
				queue = shared.ready.wait(queue).unwrap();
			}
		};
		job();
	}
}
