//! Runs blocking API calls off the UI loop.
//!
//! Every screen owns one [`Requests`]. A call is executed on a short-lived
//! worker thread and its result is queued until the screen drains it with
//! [`Requests::poll`] on the next tick. Dropping the screen cancels its
//! `Requests`: calls that have not started are skipped and finished calls
//! are never delivered.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, Sender, TryRecvError};
use std::io;
use std::sync::Arc;
use std::thread;
#[cfg(test)]
use std::time::{Duration, Instant};

pub struct Requests<M> {
    tx: Sender<M>,
    rx: Receiver<M>,
    alive: Arc<AtomicBool>,
    in_flight: usize,
    stack_size: Option<usize>,
}

impl<M: Send + 'static> Requests<M> {
    pub fn new() -> Self {
        let (tx, rx) = mpsc::channel();
        Self {
            tx,
            rx,
            alive: Arc::new(AtomicBool::new(true)),
            in_flight: 0,
            stack_size: None,
        }
    }

    /// Worker threads ask for a stack no system can map, so every spawn fails.
    #[cfg(test)]
    pub fn unspawnable() -> Self {
        let mut requests = Self::new();
        requests.stack_size = Some(1 << 60);
        requests
    }

    /// Starts `job` on a worker thread. Its return value comes back via `poll`.
    ///
    /// If the thread cannot be started the job is dropped, nothing is counted
    /// as in flight and the caller gets the OS error.
    pub fn spawn<F>(&mut self, name: &str, job: F) -> io::Result<()>
    where
        F: FnOnce() -> M + Send + 'static,
    {
        let tx = self.tx.clone();
        let alive = Arc::clone(&self.alive);
        let mut builder = thread::Builder::new().name(format!("api-{name}"));
        if let Some(size) = self.stack_size {
            builder = builder.stack_size(size);
        }
        let spawned = builder.spawn(move || {
            if !alive.load(Ordering::Acquire) {
                return;
            }
            let message = job();
            if alive.load(Ordering::Acquire) {
                // The receiver only disappears together with the view.
                let _ = tx.send(message);
            }
        });

        match spawned {
            Ok(_) => {
                self.in_flight += 1;
                Ok(())
            }
            Err(e) => {
                tracing::error!("Failed to start request worker '{}': {}", name, e);
                Err(e)
            }
        }
    }

    /// True while a spawned call has not been delivered yet.
    pub fn is_busy(&self) -> bool {
        self.in_flight > 0
    }

    /// Results that arrived since the last poll, oldest first.
    pub fn poll(&mut self) -> Vec<M> {
        let mut delivered = Vec::new();
        if !self.alive.load(Ordering::Acquire) {
            return delivered;
        }
        loop {
            match self.rx.try_recv() {
                Ok(message) => {
                    self.in_flight = self.in_flight.saturating_sub(1);
                    delivered.push(message);
                }
                Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => break,
            }
        }
        delivered
    }

    /// Blocks until nothing is in flight or `timeout` passes.
    #[cfg(test)]
    pub fn wait_idle(&mut self, timeout: Duration) -> Vec<M> {
        let deadline = Instant::now() + timeout;
        let mut delivered = Vec::new();
        while self.is_busy() && Instant::now() < deadline {
            delivered.extend(self.poll());
            if self.is_busy() {
                thread::sleep(Duration::from_millis(2));
            }
        }
        delivered
    }
}

impl<M> Requests<M> {
    /// Stops delivery of every outstanding and future result.
    pub fn cancel(&mut self) {
        self.alive.store(false, Ordering::Release);
    }
}

impl<M: Send + 'static> Default for Requests<M> {
    fn default() -> Self {
        Self::new()
    }
}

impl<M> Drop for Requests<M> {
    fn drop(&mut self) {
        self.cancel();
    }
}
