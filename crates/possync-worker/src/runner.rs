//! Worker runner: main loop that ticks the worker on a fixed interval.

use std::time::Duration;

use tokio::sync::watch;
use tokio::time;

use crate::worker::Worker;

/// Drives a [`Worker`] until cancelled.
#[derive(Debug)]
pub struct WorkerRunner {
    /// The worker being driven
    worker: Worker,
    /// Pause between the end of one tick and the start of the next
    poll_interval: Duration,
}

impl WorkerRunner {
    /// Create a new worker runner
    pub fn new(worker: Worker, poll_interval: Duration) -> Self {
        Self {
            worker,
            poll_interval,
        }
    }

    /// Run ticks until the cancel signal turns `true`.
    ///
    /// A tick in progress always runs to completion; cancellation is only
    /// observed between ticks. Returns the worker for inspection.
    pub async fn run(mut self, mut cancel: watch::Receiver<bool>) -> Worker {
        self.worker.load_state().await;

        tracing::info!(
            "Worker started with poll_interval={}s",
            self.poll_interval.as_secs_f64()
        );

        let mut ticks: u64 = 0;
        loop {
            if *cancel.borrow() {
                break;
            }

            self.worker.tick().await;
            ticks += 1;

            tokio::select! {
                changed = cancel.changed() => {
                    // A dropped sender also stops the loop.
                    if changed.is_err() || *cancel.borrow() {
                        break;
                    }
                }
                _ = time::sleep(self.poll_interval) => {}
            }
        }

        tracing::info!("Worker shut down after {} tick(s)", ticks);
        self.worker
    }
}
