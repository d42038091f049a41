//! Background search with a single in-flight slot.
//!
//! A UI event loop hands a [`SearchRequest`] to [`SearchWorker::submit`],
//! keeps processing events, and polls [`SearchWorker::try_recv`] for the
//! finished [`SearchOutcome`]. Only one search runs at a time; submitting
//! while one is in flight fails with [`SkinportError::Busy`] so two searches
//! never interleave writes to the baseline. A search that panics is reported
//! on the channel as [`SkinportError::Panicked`].

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use crate::error::{Result, SkinportError};
use crate::{SearchOutcome, SearchRequest, SkinportClient};

/// Clears the in-flight flag when dropped, including on panic.
struct InFlight(Arc<AtomicBool>);

impl Drop for InFlight {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

pub struct SearchWorker {
    client: Arc<SkinportClient>,
    in_flight: Arc<AtomicBool>,
    tx: Sender<Result<SearchOutcome>>,
    rx: Receiver<Result<SearchOutcome>>,
}

impl SearchWorker {
    pub fn new(client: Arc<SkinportClient>) -> Self {
        let (tx, rx) = mpsc::channel();
        Self {
            client,
            in_flight: Arc::new(AtomicBool::new(false)),
            tx,
            rx,
        }
    }

    /// True while a submitted search has not finished.
    pub fn is_busy(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }

    /// Start `request` on a background thread.
    pub fn submit(&self, request: SearchRequest) -> Result<()> {
        if self
            .in_flight
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            tracing::debug!("search rejected, another one is in flight");
            return Err(SkinportError::Busy);
        }

        let guard = InFlight(self.in_flight.clone());
        let client = self.client.clone();
        let tx = self.tx.clone();

        // If spawning fails the closure is dropped and the guard resets the flag.
        thread::Builder::new()
            .name("skinport-search".into())
            .spawn(move || {
                let outcome = panic::catch_unwind(AssertUnwindSafe(|| client.search(&request)))
                    .unwrap_or_else(|payload| {
                        let message = panic_message(payload.as_ref());
                        tracing::error!(%message, "search panicked");
                        Err(SkinportError::Panicked(message))
                    });
                // Free the slot before the result becomes visible.
                drop(guard);
                if tx.send(outcome).is_err() {
                    tracing::warn!("search finished but the worker was dropped");
                }
            })?;
        Ok(())
    }

    /// A finished result, if one is waiting.
    pub fn try_recv(&self) -> Option<Result<SearchOutcome>> {
        self.rx.try_recv().ok()
    }

    /// Block up to `timeout` for a finished result.
    pub fn recv_timeout(&self, timeout: Duration) -> Option<Result<SearchOutcome>> {
        match self.rx.recv_timeout(timeout) {
            Ok(outcome) => Some(outcome),
            Err(RecvTimeoutError::Timeout) | Err(RecvTimeoutError::Disconnected) => None,
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic payload".to_string()
    }
}
