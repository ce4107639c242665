//! Periodic flush requests.
//!
//! The scheduler thread never touches the database: it only raises a flag
//! that the owner checks in `Connection::execute_auto_flush`.

use super::DbResult;
use log::{debug, warn};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, RecvTimeoutError, Sender};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

const THREAD_NAME: &str = "fieldstore-flush";

/// Shared "a flush is due" flag.
#[derive(Debug, Clone, Default)]
pub(crate) struct FlushSignal(Arc<AtomicBool>);

impl FlushSignal {
    pub(crate) fn request(&self) {
        self.0.store(true, Ordering::Release);
    }

    pub(crate) fn is_pending(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }

    pub(crate) fn clear(&self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Background thread raising a [`FlushSignal`] every interval.
///
/// Dropping the scheduler stops the thread and waits for it to exit.
#[derive(Debug)]
pub(crate) struct FlushScheduler {
    stop: Option<Sender<()>>,
    worker: Option<JoinHandle<()>>,
}

impl FlushScheduler {
    pub(crate) fn start(interval: Duration, signal: FlushSignal) -> DbResult<Self> {
        let (stop, stopped) = mpsc::channel::<()>();
        let worker = thread::Builder::new()
            .name(THREAD_NAME.to_string())
            .spawn(move || loop {
                match stopped.recv_timeout(interval) {
                    Err(RecvTimeoutError::Timeout) => {
                        signal.request();
                        debug!("event=flush_request module=db status=ok");
                    }
                    Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
                }
            })?;

        debug!(
            "event=flush_scheduler_start module=db status=ok interval_ms={}",
            interval.as_millis()
        );
        Ok(Self {
            stop: Some(stop),
            worker: Some(worker),
        })
    }

    pub(crate) fn stop(mut self) {
        self.shutdown();
    }

    fn shutdown(&mut self) {
        // Disconnecting the channel wakes the worker immediately.
        self.stop.take();
        if let Some(worker) = self.worker.take() {
            if worker.join().is_err() {
                warn!("event=flush_scheduler_stop module=db status=error error_code=worker_panicked");
                return;
            }
            debug!("event=flush_scheduler_stop module=db status=ok");
        }
    }
}

impl Drop for FlushScheduler {
    fn drop(&mut self) {
        self.shutdown();
    }
}

#[cfg(test)]
mod tests {
    use super::{FlushScheduler, FlushSignal};
    use std::thread;
    use std::time::{Duration, Instant};

    #[test]
    fn signal_clear_resets_flag() {
        let signal = FlushSignal::default();
        assert!(!signal.is_pending());
        signal.request();
        assert!(signal.clone().is_pending());
        signal.clear();
        assert!(!signal.is_pending());
    }

    #[test]
    fn scheduler_raises_flag_and_stops_promptly() {
        let signal = FlushSignal::default();
        let scheduler = FlushScheduler::start(Duration::from_millis(10), signal.clone()).unwrap();

        let deadline = Instant::now() + Duration::from_secs(5);
        while !signal.is_pending() && Instant::now() < deadline {
            thread::sleep(Duration::from_millis(5));
        }
        assert!(signal.is_pending());

        let started = Instant::now();
        scheduler.stop();
        assert!(started.elapsed() < Duration::from_secs(1));
    }

    #[test]
    fn long_interval_scheduler_does_not_block_shutdown() {
        let signal = FlushSignal::default();
        let scheduler = FlushScheduler::start(Duration::from_secs(3600), signal.clone()).unwrap();
        let started = Instant::now();
        drop(scheduler);
        assert!(started.elapsed() < Duration::from_secs(1));
        assert!(!signal.is_pending());
    }
}
