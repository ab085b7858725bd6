//! Collaborator call policy: bounded timeout, one retry on transient errors.

use std::future::Future;
use std::time::Duration;
use tag_telemetry::COLLABORATOR_RETRIES;
use tracing::{debug, warn};

use crate::domain::{CollaboratorError, RegistryError};

/// Wraps every outbound port call made by the services.
#[derive(Clone, Copy, Debug)]
pub struct CallPolicy {
    timeout: Duration,
}

impl CallPolicy {
    /// Policy with the given per-attempt timeout.
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }

    /// Per-attempt timeout.
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Run `call`, retrying exactly once if the first attempt times out or
    /// the collaborator is unavailable. Other errors are returned as is.
    pub async fn run<T, F, Fut>(&self, operation: &'static str, call: F) -> Result<T, CollaboratorError>
    where
        F: Fn() -> Fut,
        Fut: Future<Output = Result<T, CollaboratorError>>,
    {
        match self.attempt(operation, &call).await {
            Err(err) if err.is_transient() => {
                warn!("[tags] {} failed ({}), retrying once", operation, err);
                COLLABORATOR_RETRIES.with_label_values(&[operation]).inc();
                self.attempt(operation, &call).await
            }
            result => result,
        }
    }

    async fn attempt<T, F, Fut>(&self, operation: &'static str, call: &F) -> Result<T, CollaboratorError>
    where
        F: Fn() -> Fut,
        Fut: Future<Output = Result<T, CollaboratorError>>,
    {
        debug!("[tags] -> {}", operation);
        match tokio::time::timeout(self.timeout, call()).await {
            Ok(result) => result,
            Err(_) => Err(CollaboratorError::Timeout {
                operation: operation.to_string(),
            }),
        }
    }
}

/// Wrap a collaborator failure that the caller does not handle itself.
pub(crate) fn unavailable(operation: &'static str) -> impl FnOnce(CollaboratorError) -> RegistryError {
    move |source| RegistryError::CollaboratorUnavailable {
        operation: operation.to_string(),
        source,
    }
}
