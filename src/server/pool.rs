//! Fixed-size pool of worker threads fed over a bounded channel.

use std::fmt;
use std::io;
use std::panic::{self, AssertUnwindSafe};
use std::sync::mpsc::{self, Receiver, SyncSender, TrySendError};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use log::error;
use parking_lot::Mutex;

/// An item the pool could not take, handed back to the caller.
#[derive(Debug, PartialEq, Eq)]
pub enum Rejected<T> {
    /// Every worker is busy and the queue is full
    Full(T),
    /// The workers are gone
    Closed(T),
}

impl<T> Rejected<T> {
    pub fn into_inner(self) -> T {
        match self {
            Rejected::Full(item) | Rejected::Closed(item) => item,
        }
    }
}

impl<T> fmt::Display for Rejected<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Rejected::Full(_) => write!(f, "worker queue is full"),
            Rejected::Closed(_) => write!(f, "worker pool is shut down"),
        }
    }
}

/// Runs one handler over submitted items on `size` threads. At most
/// `capacity` items wait in the queue; beyond that [`WorkerPool::submit`]
/// refuses them.
pub struct WorkerPool<T> {
    sender: Option<SyncSender<T>>,
    workers: Vec<JoinHandle<()>>,
    capacity: usize,
}

impl<T: Send + 'static> WorkerPool<T> {
    /// Spawn `size` workers (at least one) sharing `handler`.
    pub fn new<H>(size: usize, capacity: usize, handler: H) -> io::Result<Self>
    where
        H: Fn(T) + Send + Sync + 'static,
    {
        let (sender, receiver) = mpsc::sync_channel::<T>(capacity);
        let receiver = Arc::new(Mutex::new(receiver));
        let handler = Arc::new(handler);
        let workers = (0..size.max(1))
            .map(|id| {
                let receiver = Arc::clone(&receiver);
                let handler = Arc::clone(&handler);
                thread::Builder::new()
                    .name(format!("worker-{id}"))
                    .spawn(move || work(&receiver, &*handler))
            })
            .collect::<io::Result<Vec<_>>>()?;
        Ok(WorkerPool {
            sender: Some(sender),
            workers,
            capacity,
        })
    }

    #[must_use]
    pub fn size(&self) -> usize {
        self.workers.len()
    }

    #[must_use]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Queue an item for the next idle worker without blocking.
    pub fn submit(&self, item: T) -> Result<(), Rejected<T>> {
        let Some(sender) = &self.sender else {
            return Err(Rejected::Closed(item));
        };
        sender.try_send(item).map_err(|e| match e {
            TrySendError::Full(item) => Rejected::Full(item),
            TrySendError::Disconnected(item) => Rejected::Closed(item),
        })
    }
}

fn work<T, H: Fn(T)>(receiver: &Mutex<Receiver<T>>, handler: &H) {
    loop {
        // The guard is released before the handler runs
        let item = receiver.lock().recv();
        let Ok(item) = item else {
            break;
        };
        if panic::catch_unwind(AssertUnwindSafe(|| handler(item))).is_err() {
            error!(
                "job panicked on {}",
                thread::current().name().unwrap_or("worker")
            );
        }
    }
}

impl<T> Drop for WorkerPool<T> {
    /// Close the queue, let queued items finish and join every worker.
    fn drop(&mut self) {
        drop(self.sender.take());
        for worker in self.workers.drain(..) {
            let _ = worker.join();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn test_runs_every_item() {
        let counter = Arc::new(AtomicUsize::new(0));
        {
            let seen = Arc::clone(&counter);
            let pool = WorkerPool::new(4, 128, move |n: usize| {
                seen.fetch_add(n, Ordering::Relaxed);
            })
            .unwrap();
            for _ in 0..100 {
                pool.submit(1).unwrap();
            }
        }
        assert_eq!(counter.load(Ordering::Relaxed), 100);
    }

    #[test]
    fn test_at_least_one_worker() {
        let pool = WorkerPool::new(0, 1, |_: ()| {}).unwrap();
        assert_eq!(pool.size(), 1);
        assert_eq!(pool.capacity(), 1);
    }

    #[test]
    fn test_survives_panicking_job() {
        let counter = Arc::new(AtomicUsize::new(0));
        {
            let seen = Arc::clone(&counter);
            let pool = WorkerPool::new(1, 4, move |fail: bool| {
                assert!(!fail, "boom");
                seen.fetch_add(1, Ordering::Relaxed);
            })
            .unwrap();
            pool.submit(true).unwrap();
            pool.submit(false).unwrap();
        }
        assert_eq!(counter.load(Ordering::Relaxed), 1);
    }

    #[test]
    fn test_full_queue_hands_item_back() {
        let (started_tx, started_rx) = mpsc::channel();
        let (gate_tx, gate_rx) = mpsc::channel::<()>();
        let started_tx = Mutex::new(started_tx);
        let gate_rx = Mutex::new(gate_rx);
        let pool = WorkerPool::new(1, 1, move |item: usize| {
            let _ = started_tx.lock().send(item);
            let _ = gate_rx.lock().recv();
        })
        .unwrap();

        pool.submit(1).unwrap();
        // The only worker is now busy
        assert_eq!(started_rx.recv().unwrap(), 1);
        pool.submit(2).unwrap();
        let rejected = pool.submit(3).unwrap_err();
        assert_eq!(rejected, Rejected::Full(3));
        assert_eq!(rejected.to_string(), "worker queue is full");
        assert_eq!(rejected.into_inner(), 3);

        gate_tx.send(()).unwrap();
        gate_tx.send(()).unwrap();
        assert_eq!(started_rx.recv().unwrap(), 2);
        drop(pool);
    }
}
