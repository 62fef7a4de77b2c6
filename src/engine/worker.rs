use std::sync::mpsc::{self, Sender};
use std::thread::{self, JoinHandle};

use tracing::{debug, error};

type Job = Box<dyn FnOnce() + Send>;

/// One long-lived thread that runs submitted jobs in order.
pub struct BackgroundWorker {
    tx: Option<Sender<Job>>,
    handle: Option<JoinHandle<()>>,
}

impl BackgroundWorker {
    pub fn spawn(name: &str) -> Self {
        let (tx, rx) = mpsc::channel::<Job>();
        let spawned = thread::Builder::new().name(name.to_string()).spawn(move || {
            for job in rx {
                job();
            }
            debug!("Background worker stopped");
        });

        match spawned {
            Ok(handle) => Self {
                tx: Some(tx),
                handle: Some(handle),
            },
            Err(e) => {
                error!(error = %e, worker = name, "Failed to spawn background worker");
                Self {
                    tx: None,
                    handle: None,
                }
            }
        }
    }

    /// Queues `job`. Returns `false` if the worker thread is not running; the job is
    /// dropped in that case.
    pub fn submit(&self, job: impl FnOnce() + Send + 'static) -> bool {
        self.tx
            .as_ref()
            .is_some_and(|tx| tx.send(Box::new(job)).is_ok())
    }
}

impl Drop for BackgroundWorker {
    fn drop(&mut self) {
        self.tx.take();
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::mpsc;

    #[test]
    fn jobs_run_off_thread_in_order() {
        let worker = BackgroundWorker::spawn("test-worker");
        let (tx, rx) = mpsc::channel();
        let caller = thread::current().id();

        for i in 0..3 {
            let tx = tx.clone();
            assert!(worker.submit(move || {
                tx.send((i, thread::current().id())).unwrap();
            }));
        }
        drop(worker);

        let seen: Vec<_> = rx.try_iter().collect();
        assert_eq!(seen.iter().map(|(i, _)| *i).collect::<Vec<_>>(), vec![0, 1, 2]);
        assert!(seen.iter().all(|(_, id)| *id != caller));
    }
}
