//! Task queue bound to the thread that owns engine state
//!
//! Background threads never touch the history directly. They post closures through
//! an [`OwnerHandle`]; the owning thread runs them in posting order from its
//! [`OwnerQueue`].

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::time::Duration;

pub type OwnerTask<T> = Box<dyn FnOnce(&mut T) + Send>;

pub struct OwnerHandle<T> {
    tx: Sender<OwnerTask<T>>,
    pending: Arc<AtomicUsize>,
}

impl<T> Clone for OwnerHandle<T> {
    fn clone(&self) -> Self {
        Self {
            tx: self.tx.clone(),
            pending: Arc::clone(&self.pending),
        }
    }
}

impl<T> OwnerHandle<T> {
    /// Queues `task` for the owning thread. Returns `false` once the queue is gone.
    pub fn post(&self, task: impl FnOnce(&mut T) + Send + 'static) -> bool {
        self.pending.fetch_add(1, Ordering::SeqCst);
        if self.tx.send(Box::new(task)).is_err() {
            self.pending.fetch_sub(1, Ordering::SeqCst);
            return false;
        }
        true
    }
}

pub struct OwnerQueue<T> {
    rx: Receiver<OwnerTask<T>>,
    handle: OwnerHandle<T>,
}

impl<T> OwnerQueue<T> {
    pub fn new() -> Self {
        let (tx, rx) = mpsc::channel();
        Self {
            rx,
            handle: OwnerHandle {
                tx,
                pending: Arc::new(AtomicUsize::new(0)),
            },
        }
    }

    pub fn handle(&self) -> OwnerHandle<T> {
        self.handle.clone()
    }

    /// Tasks posted but not yet taken off the queue.
    pub fn pending(&self) -> usize {
        self.handle.pending.load(Ordering::SeqCst)
    }

    /// Takes the next task without blocking.
    pub fn try_next(&self) -> Option<OwnerTask<T>> {
        let task = self.rx.try_recv().ok()?;
        self.handle.pending.fetch_sub(1, Ordering::SeqCst);
        Some(task)
    }

    /// Waits up to `timeout` for the next task.
    pub fn next_timeout(&self, timeout: Duration) -> Option<OwnerTask<T>> {
        match self.rx.recv_timeout(timeout) {
            Ok(task) => {
                self.handle.pending.fetch_sub(1, Ordering::SeqCst);
                Some(task)
            }
            Err(RecvTimeoutError::Timeout | RecvTimeoutError::Disconnected) => None,
        }
    }
}

impl<T> Default for OwnerQueue<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn tasks_run_in_posting_order_on_the_owner() {
        let queue: OwnerQueue<Vec<u32>> = OwnerQueue::new();
        let handle = queue.handle();

        thread::spawn(move || {
            for i in 0..5 {
                handle.post(move |log: &mut Vec<u32>| log.push(i));
            }
        })
        .join()
        .unwrap();

        assert_eq!(queue.pending(), 5);
        let mut log = Vec::new();
        while let Some(task) = queue.try_next() {
            task(&mut log);
        }
        assert_eq!(log, vec![0, 1, 2, 3, 4]);
        assert_eq!(queue.pending(), 0);
    }

    #[test]
    fn next_timeout_returns_none_when_idle() {
        let queue: OwnerQueue<()> = OwnerQueue::new();
        assert!(queue.next_timeout(Duration::from_millis(5)).is_none());
    }
}
