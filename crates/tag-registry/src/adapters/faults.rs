//! Fault injection for the in-memory adapters.
//!
//! Queued faults fire one per call, in order, before the adapter does any
//! work. Used to exercise timeouts and the transient retry path.

use parking_lot::Mutex;
use std::collections::VecDeque;
use std::time::Duration;
use tracing::debug;

use crate::domain::CollaboratorError;

/// A single injected failure.
#[derive(Clone, Debug)]
pub enum Fault {
    /// Fail with [`CollaboratorError::Unavailable`].
    Unavailable,
    /// Stall before answering. Longer than the call timeout means a timeout.
    Delay(Duration),
    /// Fail with this exact error.
    Error(CollaboratorError),
}

/// FIFO queue of pending faults.
#[derive(Debug, Default)]
pub struct FaultInjector {
    pending: Mutex<VecDeque<Fault>>,
}

impl FaultInjector {
    /// Create an empty injector.
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a fault for the next call.
    pub fn push(&self, fault: Fault) {
        self.pending.lock().push_back(fault);
    }

    /// Queue `count` copies of `fault`.
    pub fn push_n(&self, fault: Fault, count: usize) {
        let mut pending = self.pending.lock();
        for _ in 0..count {
            pending.push_back(fault.clone());
        }
    }

    /// Faults not yet fired.
    pub fn pending(&self) -> usize {
        self.pending.lock().len()
    }

    /// Fire the next fault, if any.
    pub async fn check(&self, operation: &str) -> Result<(), CollaboratorError> {
        let next = self.pending.lock().pop_front();
        match next {
            None => Ok(()),
            Some(Fault::Unavailable) => {
                debug!("[tags] Injected unavailability in {}", operation);
                Err(CollaboratorError::Unavailable(format!(
                    "{} injected failure",
                    operation
                )))
            }
            Some(Fault::Delay(delay)) => {
                debug!("[tags] Injected {:?} delay in {}", delay, operation);
                tokio::time::sleep(delay).await;
                Ok(())
            }
            Some(Fault::Error(err)) => Err(err),
        }
    }
}
