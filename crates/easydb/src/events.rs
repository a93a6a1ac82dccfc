//! Error channel for execution failures.
//!
//! When at least one handler is subscribed, execution errors are published here
//! instead of being returned, and the failed read or write yields an empty
//! result. With no subscribers they propagate as `Err`.

use crate::command::Command;
use crate::connection::ConnectionInfo;
use crate::error::{DbError, Phase};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, PoisonError, RwLock};

/// One execution failure.
#[derive(Debug)]
pub struct ErrorEvent {
    pub error: DbError,
    pub phase: Phase,
    pub connection: ConnectionInfo,
    /// Command being run, when the failure happened at statement level.
    pub command: Option<Command>,
}

/// Receives [`ErrorEvent`]s.
pub trait ErrorHandler: Send + Sync {
    fn on_error(&self, event: &ErrorEvent);
}

impl<F> ErrorHandler for F
where
    F: Fn(&ErrorEvent) + Send + Sync,
{
    fn on_error(&self, event: &ErrorEvent) {
        self(event)
    }
}

/// Token returned by [`ErrorChannel::subscribe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct HandlerId(u64);

#[derive(Default)]
pub struct ErrorChannel {
    next_id: AtomicU64,
    handlers: RwLock<Vec<(HandlerId, Arc<dyn ErrorHandler>)>>,
}

impl std::fmt::Debug for ErrorChannel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ErrorChannel")
            .field("handlers", &self.len())
            .finish()
    }
}

impl ErrorChannel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe<H: ErrorHandler + 'static>(&self, handler: H) -> HandlerId {
        self.subscribe_arc(Arc::new(handler))
    }

    pub fn subscribe_arc(&self, handler: Arc<dyn ErrorHandler>) -> HandlerId {
        let id = HandlerId(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.handlers
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push((id, handler));
        id
    }

    /// Remove a handler. Returns `false` if it was not subscribed.
    pub fn unsubscribe(&self, id: HandlerId) -> bool {
        let mut handlers = self.handlers.write().unwrap_or_else(PoisonError::into_inner);
        let before = handlers.len();
        handlers.retain(|(h, _)| *h != id);
        handlers.len() != before
    }

    pub fn len(&self) -> usize {
        self.handlers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn has_subscribers(&self) -> bool {
        self.len() > 0
    }

    /// Deliver `event` to every handler in subscription order.
    ///
    /// Returns the event back when nobody is subscribed.
    pub fn publish(&self, event: ErrorEvent) -> Result<(), ErrorEvent> {
        let handlers: Vec<Arc<dyn ErrorHandler>> = self
            .handlers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .map(|(_, h)| Arc::clone(h))
            .collect();
        if handlers.is_empty() {
            return Err(event);
        }
        for handler in handlers {
            handler.on_error(&event);
        }
        Ok(())
    }
}
