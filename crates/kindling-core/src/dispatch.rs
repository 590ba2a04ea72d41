//! Marshaling of background work onto the UI thread.
//!
//! All widget and renderer state is owned by a single logical UI thread.
//! Background sources (data bindings, timers, network callbacks) must not
//! touch that state directly; instead they submit closures through a
//! [`DispatchHandle`] and the UI thread executes them at a well-defined point
//! in its frame loop via [`MainDispatcher::drain`].

use std::sync::mpsc::{Receiver, Sender, channel};

type Job = Box<dyn FnOnce() + Send + 'static>;

/// Owner side of the main-thread queue. Lives on the UI thread.
pub struct MainDispatcher {
    tx: Sender<Job>,
    rx: Receiver<Job>,
}

/// Clonable, `Send` submission point handed to background work.
#[derive(Clone)]
pub struct DispatchHandle {
    tx: Sender<Job>,
}

impl MainDispatcher {
    pub fn new() -> Self {
        let (tx, rx) = channel();
        Self { tx, rx }
    }

    /// Create a handle that can submit work from any thread.
    pub fn handle(&self) -> DispatchHandle {
        DispatchHandle {
            tx: self.tx.clone(),
        }
    }

    /// Execute all queued jobs in submission order. Returns how many ran.
    pub fn drain(&self) -> usize {
        let mut ran = 0;
        while let Ok(job) = self.rx.try_recv() {
            job();
            ran += 1;
        }
        ran
    }
}

impl Default for MainDispatcher {
    fn default() -> Self {
        Self::new()
    }
}

impl DispatchHandle {
    /// Queue `f` to run on the UI thread. Returns false if the dispatcher
    /// has been dropped, in which case the job is discarded.
    pub fn run_on_main(&self, f: impl FnOnce() + Send + 'static) -> bool {
        let accepted = self.tx.send(Box::new(f)).is_ok();
        if !accepted {
            tracing::debug!("dispatch target gone, dropping queued work");
        }
        accepted
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    #[test]
    fn test_drain_runs_in_submission_order() {
        let dispatcher = MainDispatcher::new();
        let handle = dispatcher.handle();
        let seen = Arc::new(Mutex::new(Vec::new()));

        for i in 0..4 {
            let seen = Arc::clone(&seen);
            handle.run_on_main(move || seen.lock().unwrap().push(i));
        }

        assert_eq!(dispatcher.drain(), 4);
        assert_eq!(*seen.lock().unwrap(), vec![0, 1, 2, 3]);
        assert_eq!(dispatcher.drain(), 0);
    }

    #[test]
    fn test_submission_from_other_thread() {
        let dispatcher = MainDispatcher::new();
        let handle = dispatcher.handle();
        let seen = Arc::new(Mutex::new(Vec::new()));

        let worker = {
            let seen = Arc::clone(&seen);
            std::thread::spawn(move || {
                handle.run_on_main(move || seen.lock().unwrap().push("bg"));
            })
        };
        worker.join().unwrap();

        assert_eq!(dispatcher.drain(), 1);
        assert_eq!(*seen.lock().unwrap(), vec!["bg"]);
    }

    #[test]
    fn test_run_on_main_after_dispatcher_dropped() {
        let dispatcher = MainDispatcher::new();
        let handle = dispatcher.handle();
        drop(dispatcher);
        assert!(!handle.run_on_main(|| {}));
    }
}
