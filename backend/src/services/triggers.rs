//! Change notifications for purchase orders and length adjustments
//!
//! Mutation services publish a [`ChangeEvent`] after every committed write.
//! Listeners (the inventory engine) subscribe explicitly to the notifier.
//! Retries happen here, never inside the listener.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;
use shared::types::MaterialScope;
use tokio::sync::RwLock;
use tracing::{error, info, warn};

use crate::error::InventoryError;

/// Which collection changed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeSource {
    PurchaseOrder,
    LengthAdjustment,
}

/// What kind of write happened
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeOperation {
    Created,
    Updated,
    BulkUpdated,
    Deleted,
    BulkDeleted,
}

/// A committed write to orders or adjustments
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChangeEvent {
    pub source: ChangeSource,
    pub operation: ChangeOperation,
    /// Materials whose inventory may have changed
    pub scope: MaterialScope,
}

impl ChangeEvent {
    pub fn new(source: ChangeSource, operation: ChangeOperation, scope: MaterialScope) -> Self {
        Self {
            source,
            operation,
            scope,
        }
    }
}

/// Receives change events
#[async_trait]
pub trait ChangeListener: Send + Sync {
    fn name(&self) -> &str;

    async fn on_change(&self, event: &ChangeEvent) -> Result<(), InventoryError>;
}

/// A listener that still failed after every attempt
#[derive(Debug, Clone, Serialize)]
pub struct ListenerFailure {
    pub listener: String,
    pub attempts: u32,
    pub error: String,
}

/// Outcome of delivering one event
#[derive(Debug, Clone, Default, Serialize)]
pub struct NotifyReport {
    pub delivered: usize,
    pub failures: Vec<ListenerFailure>,
}

impl NotifyReport {
    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Delivers change events to subscribed listeners
pub struct ChangeNotifier {
    listeners: RwLock<Vec<Arc<dyn ChangeListener>>>,
    max_attempts: u32,
    retry_delay: Duration,
}

impl ChangeNotifier {
    pub fn new(max_attempts: u32, retry_delay: Duration) -> Self {
        Self {
            listeners: RwLock::new(Vec::new()),
            max_attempts: max_attempts.max(1),
            retry_delay,
        }
    }

    /// Register a listener
    pub async fn subscribe(&self, listener: Arc<dyn ChangeListener>) {
        info!(listener = %listener.name(), "Registered change listener");
        self.listeners.write().await.push(listener);
    }

    pub async fn listener_count(&self) -> usize {
        self.listeners.read().await.len()
    }

    /// Deliver `event` to every listener.
    ///
    /// A listener that keeps failing is logged and reported; the write that
    /// produced the event stays committed.
    pub async fn notify(&self, event: ChangeEvent) -> NotifyReport {
        let mut report = NotifyReport::default();
        if event.scope.is_empty() {
            return report;
        }

        // Collect listeners under read lock, then release before async calls
        let listeners: Vec<_> = self.listeners.read().await.iter().cloned().collect();

        for listener in listeners {
            match self.deliver(listener.as_ref(), &event).await {
                Ok(()) => report.delivered += 1,
                Err(failure) => report.failures.push(failure),
            }
        }

        report
    }

    async fn deliver(
        &self,
        listener: &dyn ChangeListener,
        event: &ChangeEvent,
    ) -> Result<(), ListenerFailure> {
        let mut attempt = 1;
        loop {
            match listener.on_change(event).await {
                Ok(()) => return Ok(()),
                Err(e) if attempt < self.max_attempts => {
                    warn!(
                        listener = %listener.name(),
                        source = ?event.source,
                        operation = ?event.operation,
                        attempt,
                        error = %e,
                        "Change listener failed, retrying"
                    );
                    attempt += 1;
                    tokio::time::sleep(self.retry_delay).await;
                }
                Err(e) => {
                    error!(
                        listener = %listener.name(),
                        source = ?event.source,
                        operation = ?event.operation,
                        scope = ?event.scope,
                        attempts = attempt,
                        error = %e,
                        "Change listener failed, giving up"
                    );
                    return Err(ListenerFailure {
                        listener: listener.name().to_string(),
                        attempts: attempt,
                        error: e.to_string(),
                    });
                }
            }
        }
    }
}

impl Default for ChangeNotifier {
    fn default() -> Self {
        Self::new(3, Duration::from_millis(250))
    }
}
