//! Leveled message bus and typed lifecycle signals.
//!
//! Every component of the import pipeline reports through the types in this
//! module: informational/warning/error messages go through [`MessageBus`],
//! while structured lifecycle notifications (files discovered, move started,
//! move succeeded, move failed, job completed) each get their own
//! [`Signal`] with a strongly-typed payload.
//!
//! Publication is synchronous: every current subscriber runs in subscription
//! order on the publishing thread. Subscribers attached to a concurrent job
//! must therefore be thread-safe and should return quickly: a blocking
//! subscriber stalls the worker that published the event.

use std::path::PathBuf;
use std::sync::{Arc, Mutex};

/// Severity of a plain message published on the [`MessageBus`].
///
/// The numeric values (1 through 3) are the levels accepted by
/// [`MessageBus::subscribe`] and [`MessageBus::unsubscribe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level {
    /// Routine progress information.
    Info = 1,
    /// Something unexpected that did not stop the task.
    Warning = 2,
    /// A task-level or job-level failure.
    Error = 3,
}

impl Level {
    /// Converts a numeric level (1..=3) into a `Level`.
    pub fn from_number(level: usize) -> Option<Level> {
        match level {
            1 => Some(Level::Info),
            2 => Some(Level::Warning),
            3 => Some(Level::Error),
            _ => None,
        }
    }

    /// The numeric value of this level, as accepted by subscribe/unsubscribe.
    pub fn number(self) -> usize {
        self as usize
    }
}

/// Errors raised by the event bus API.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventError {
    /// A subscribe/unsubscribe call named a level outside 1..=3.
    InvalidLevel(usize),
}

impl std::fmt::Display for EventError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EventError::InvalidLevel(level) => {
                write!(f, "there is no message level {} (valid levels are 1..=3)", level)
            }
        }
    }
}

impl std::error::Error for EventError {}

/// Token returned by a subscribe call, used to unsubscribe later.
pub type SubscriberId = usize;

type Handler<T> = Arc<dyn Fn(&T) + Send + Sync>;

/// An observer list for one kind of typed notification.
///
/// Handlers are invoked synchronously, in subscription order, on the thread
/// that calls [`Signal::emit`]. The handler list is snapshotted before
/// dispatch, so a handler may subscribe or unsubscribe without deadlocking.
pub struct Signal<T> {
    inner: Mutex<SignalInner<T>>,
}

struct SignalInner<T> {
    next_id: SubscriberId,
    handlers: Vec<(SubscriberId, Handler<T>)>,
}

impl<T> Signal<T> {
    /// Creates a signal with no subscribers.
    pub fn new() -> Self {
        Signal {
            inner: Mutex::new(SignalInner {
                next_id: 0,
                handlers: Vec::new(),
            }),
        }
    }

    /// Registers a handler and returns a token for later removal.
    pub fn subscribe<F>(&self, handler: F) -> SubscriberId
    where
        F: Fn(&T) + Send + Sync + 'static,
    {
        let mut inner = self.lock();
        let id = inner.next_id;
        inner.next_id += 1;
        inner.handlers.push((id, Arc::new(handler)));
        id
    }

    /// Removes a previously registered handler.
    ///
    /// Returns `true` if the token matched a live subscription.
    pub fn unsubscribe(&self, id: SubscriberId) -> bool {
        let mut inner = self.lock();
        let before = inner.handlers.len();
        inner.handlers.retain(|(handler_id, _)| *handler_id != id);
        inner.handlers.len() != before
    }

    /// Invokes every current subscriber with `payload`, in subscription order.
    pub fn emit(&self, payload: &T) {
        let handlers: Vec<Handler<T>> = self
            .lock()
            .handlers
            .iter()
            .map(|(_, handler)| Arc::clone(handler))
            .collect();
        for handler in handlers {
            handler(payload);
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, SignalInner<T>> {
        self.inner
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl<T> Default for Signal<T> {
    fn default() -> Self {
        Signal::new()
    }
}

/// A three-level message channel (Info=1, Warning=2, Error=3).
///
/// Subscriptions are per level; publishing to one level never reaches
/// subscribers of another.
#[derive(Default)]
pub struct MessageBus {
    levels: [Signal<String>; 3],
}

impl MessageBus {
    /// Creates a bus with no subscribers on any level.
    pub fn new() -> Self {
        MessageBus::default()
    }

    /// Registers a handler on a numeric level.
    ///
    /// # Errors
    ///
    /// Returns [`EventError::InvalidLevel`] if `level` is outside 1..=3.
    pub fn subscribe<F>(&self, level: usize, handler: F) -> Result<SubscriberId, EventError>
    where
        F: Fn(&String) + Send + Sync + 'static,
    {
        let level = Level::from_number(level).ok_or(EventError::InvalidLevel(level))?;
        Ok(self.channel(level).subscribe(handler))
    }

    /// Removes a handler from a numeric level.
    ///
    /// # Errors
    ///
    /// Returns [`EventError::InvalidLevel`] if `level` is outside 1..=3.
    pub fn unsubscribe(&self, level: usize, id: SubscriberId) -> Result<bool, EventError> {
        let level = Level::from_number(level).ok_or(EventError::InvalidLevel(level))?;
        Ok(self.channel(level).unsubscribe(id))
    }

    /// Publishes a message to every subscriber of `level`.
    pub fn publish(&self, level: Level, message: impl Into<String>) {
        self.channel(level).emit(&message.into());
    }

    /// Publishes an Info-level message.
    pub fn info(&self, message: impl Into<String>) {
        self.publish(Level::Info, message);
    }

    /// Publishes a Warning-level message.
    pub fn warning(&self, message: impl Into<String>) {
        self.publish(Level::Warning, message);
    }

    /// Publishes an Error-level message.
    pub fn error(&self, message: impl Into<String>) {
        self.publish(Level::Error, message);
    }

    fn channel(&self, level: Level) -> &Signal<String> {
        &self.levels[level.number() - 1]
    }
}

/// Payload of the Discovered lifecycle signal.
#[derive(Debug, Clone)]
pub struct FilesDiscovered {
    /// Every file the collector found, in walk order.
    pub files: Vec<PathBuf>,
}

/// Payload of the MoveStarted lifecycle signal, emitted before the move is
/// attempted.
#[derive(Debug, Clone)]
pub struct MoveStarted {
    pub source: PathBuf,
    pub destination: PathBuf,
}

/// Payload of the MoveSucceeded lifecycle signal.
#[derive(Debug, Clone)]
pub struct MoveSucceeded {
    pub source: PathBuf,
    pub destination: PathBuf,
}

/// Payload of the MoveFailed lifecycle signal.
#[derive(Debug, Clone)]
pub struct MoveFailed {
    pub destination: PathBuf,
    pub reason: String,
}

/// The bundle of channels every pipeline component publishes through.
///
/// One `ImportEvents` is shared (via `Arc`) between the importer, its
/// workers, and any listeners. Lifecycle signals carry typed payloads; the
/// message bus carries leveled free-form text. No ordering is guaranteed
/// between events published from different workers, only the per-file
/// sequence (started before succeeded/failed) holds.
#[derive(Default)]
pub struct ImportEvents {
    pub messages: MessageBus,
    pub discovered: Signal<FilesDiscovered>,
    pub move_started: Signal<MoveStarted>,
    pub move_succeeded: Signal<MoveSucceeded>,
    pub move_failed: Signal<MoveFailed>,
    pub completed: Signal<()>,
}

impl ImportEvents {
    /// Creates an event bundle with no subscribers.
    pub fn new() -> Self {
        ImportEvents::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn test_subscribe_invalid_level_fails() {
        let bus = MessageBus::new();
        assert_eq!(bus.subscribe(0, |_| {}), Err(EventError::InvalidLevel(0)));
        assert_eq!(bus.subscribe(4, |_| {}), Err(EventError::InvalidLevel(4)));
        assert_eq!(bus.unsubscribe(7, 0), Err(EventError::InvalidLevel(7)));
    }

    #[test]
    fn test_publish_reaches_only_matching_level() {
        let bus = MessageBus::new();
        let info_hits = Arc::new(AtomicUsize::new(0));
        let error_hits = Arc::new(AtomicUsize::new(0));

        let info_clone = Arc::clone(&info_hits);
        bus.subscribe(1, move |_| {
            info_clone.fetch_add(1, Ordering::SeqCst);
        })
        .expect("level 1 is valid");
        let error_clone = Arc::clone(&error_hits);
        bus.subscribe(3, move |_| {
            error_clone.fetch_add(1, Ordering::SeqCst);
        })
        .expect("level 3 is valid");

        bus.info("hello");
        bus.info("again");
        bus.error("boom");

        assert_eq!(info_hits.load(Ordering::SeqCst), 2);
        assert_eq!(error_hits.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_subscribers_run_in_subscription_order() {
        let signal: Signal<()> = Signal::new();
        let order = Arc::new(Mutex::new(Vec::new()));

        for tag in ["first", "second", "third"] {
            let order = Arc::clone(&order);
            signal.subscribe(move |_| order.lock().unwrap().push(tag));
        }
        signal.emit(&());

        assert_eq!(*order.lock().unwrap(), vec!["first", "second", "third"]);
    }

    #[test]
    fn test_unsubscribe_removes_handler() {
        let signal: Signal<u32> = Signal::new();
        let hits = Arc::new(AtomicUsize::new(0));

        let hits_clone = Arc::clone(&hits);
        let id = signal.subscribe(move |_| {
            hits_clone.fetch_add(1, Ordering::SeqCst);
        });

        signal.emit(&1);
        assert!(signal.unsubscribe(id));
        signal.emit(&2);

        assert_eq!(hits.load(Ordering::SeqCst), 1);
        assert!(!signal.unsubscribe(id), "second unsubscribe is a no-op");
    }

    #[test]
    fn test_signal_carries_typed_payload() {
        let signal: Signal<MoveFailed> = Signal::new();
        let seen = Arc::new(Mutex::new(Vec::new()));

        let seen_clone = Arc::clone(&seen);
        signal.subscribe(move |event: &MoveFailed| {
            seen_clone.lock().unwrap().push(event.reason.clone());
        });
        signal.emit(&MoveFailed {
            destination: PathBuf::from("/tmp/out"),
            reason: "directory not found".to_string(),
        });

        assert_eq!(*seen.lock().unwrap(), vec!["directory not found"]);
    }
}
