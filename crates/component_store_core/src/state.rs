//! Replaying state streams.
//!
//! A [`StateStream`] multicasts state snapshots to listeners and remembers
//! the most recent one. New listeners receive that snapshot synchronously
//! when they subscribe, then every later snapshot as it is emitted.
//!
//! # Dispatch
//!
//! Listeners run without the stream's lock held, so a listener may emit,
//! subscribe or unsubscribe. Signals emitted while a dispatch is in
//! progress are queued and delivered in order once the current signal has
//! reached every listener.
//!
//! A panicking listener is deregistered and the panic propagates to the
//! emitter. Other listeners stay registered, and the ones the interrupted
//! signal had not reached receive it at the start of the next dispatch.
//!
//! # Termination
//!
//! [`fail`](StateStream::fail) and [`complete`](StateStream::complete) end
//! the stream. Every listener is notified and released, later emissions are
//! ignored, and late subscribers get the last snapshot followed by the
//! terminal event.

use core::sync::atomic::{AtomicBool, Ordering};
use std::collections::VecDeque;
use std::sync::Arc;

use parking_lot::Mutex;

/// Failure delivered on a stream's error channel.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct StreamError {
    message: Arc<str>,
}

impl StreamError {
    /// Creates a stream error with the given message.
    #[must_use]
    pub fn new(message: impl Into<Arc<str>>) -> Self {
        Self {
            message: message.into(),
        }
    }

    /// Returns the error message.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }
}

/// A notification delivered to a listener.
#[derive(Debug)]
pub enum StreamEvent<'a, S> {
    /// A new state snapshot.
    Next(&'a S),
    /// The stream failed. No further events follow.
    Error(&'a StreamError),
    /// The stream completed. No further events follow.
    Complete,
}

/// What a listener wants after handling an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Listen {
    /// Keep receiving events.
    Continue,
    /// Deregister now.
    Stop,
}

type Listener<S> = Box<dyn FnMut(StreamEvent<'_, S>) -> Listen + Send>;

struct Slot<S> {
    active: Arc<AtomicBool>,
    listener: Listener<S>,
}

impl<S> Slot<S> {
    /// Delivers `signal`, returning whether the listener stays registered.
    fn deliver(&mut self, signal: &Signal<S>) -> bool {
        if !self.active.load(Ordering::Acquire) {
            return false;
        }

        let flow = match signal {
            Signal::Next(value) => (self.listener)(StreamEvent::Next(value)),
            Signal::Error(error) => (self.listener)(StreamEvent::Error(error)),
            Signal::Complete => (self.listener)(StreamEvent::Complete),
        };

        let keep = flow == Listen::Continue && !signal.is_terminal();
        if !keep {
            self.active.store(false, Ordering::Release);
        }
        keep
    }
}

enum Signal<S> {
    Next(Arc<S>),
    Error(StreamError),
    Complete,
}

impl<S> Signal<S> {
    fn is_terminal(&self) -> bool {
        !matches!(self, Signal::Next(_))
    }
}

impl<S> Clone for Signal<S> {
    fn clone(&self) -> Self {
        match self {
            Signal::Next(value) => Signal::Next(Arc::clone(value)),
            Signal::Error(error) => Signal::Error(error.clone()),
            Signal::Complete => Signal::Complete,
        }
    }
}

struct Inner<S> {
    /// Last snapshot that has been dispatched.
    latest: Option<Arc<S>>,
    /// Terminal signal that has been dispatched.
    terminal: Option<Signal<S>>,
    /// Set as soon as a terminal signal is queued.
    closed: bool,
    /// Bumped every time a signal starts dispatching.
    version: u64,
    dispatching: bool,
    pending: VecDeque<Signal<S>>,
    listeners: Vec<Slot<S>>,
    /// Signal cut short by a panicking listener, with the listeners it had
    /// not reached yet. Delivered before anything in `pending`.
    interrupted: Option<(Signal<S>, Vec<Slot<S>>)>,
}

impl<S> Inner<S> {
    fn has_undelivered(&self) -> bool {
        self.interrupted.is_some() || !self.pending.is_empty()
    }
}

/// Owns the listeners taken out for the signal being dispatched.
///
/// If a listener panics, the panicking listener is dropped, listeners that
/// already saw the signal go back to the stream, and the rest are parked in
/// `Inner::interrupted` until the next dispatch.
struct DispatchGuard<'a, S> {
    inner: &'a Mutex<Inner<S>>,
    signal: Option<Signal<S>>,
    listeners: Vec<Slot<S>>,
    /// Index of the next listener to deliver to.
    cursor: usize,
}

impl<S> DispatchGuard<'_, S> {
    fn begin(&mut self, signal: Signal<S>, listeners: Vec<Slot<S>>) {
        self.signal = Some(signal);
        self.listeners = listeners;
        self.cursor = 0;
    }

    fn deliver(&mut self) {
        let Some(signal) = &self.signal else {
            return;
        };
        while self.cursor < self.listeners.len() {
            if self.listeners[self.cursor].deliver(signal) {
                self.cursor += 1;
            } else {
                self.listeners.remove(self.cursor);
            }
        }
    }

    fn finish(&mut self) -> Option<(Signal<S>, Vec<Slot<S>>)> {
        self.cursor = 0;
        let signal = self.signal.take()?;
        Some((signal, core::mem::take(&mut self.listeners)))
    }
}

impl<S> Drop for DispatchGuard<'_, S> {
    fn drop(&mut self) {
        if !std::thread::panicking() {
            return;
        }

        let mut unreached = self.listeners.split_off(self.cursor.min(self.listeners.len()));
        // Released after the lock, its captures may touch the stream.
        let _panicked = (!unreached.is_empty()).then(|| unreached.remove(0));
        let mut reached = core::mem::take(&mut self.listeners);

        let mut inner = self.inner.lock();
        inner.dispatching = false;
        reached.append(&mut inner.listeners);
        inner.listeners = reached;
        if let Some(signal) = self.signal.take()
            && !unreached.is_empty()
        {
            inner.interrupted = Some((signal, unreached));
        }
    }
}

/// A multicast stream of state snapshots that replays the latest one.
///
/// Cloning a `StateStream` yields another handle to the same stream.
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use parking_lot::Mutex;
/// use component_store_core::{Listen, StateStream, StreamEvent};
///
/// let stream = StateStream::new();
/// stream.emit(1);
///
/// let seen = Arc::new(Mutex::new(Vec::new()));
/// let sink = Arc::clone(&seen);
/// stream.subscribe(move |event| {
///     if let StreamEvent::Next(value) = event {
///         sink.lock().push(*value);
///     }
///     Listen::Continue
/// });
///
/// stream.emit(2);
/// assert_eq!(*seen.lock(), vec![1, 2]);
/// ```
pub struct StateStream<S> {
    inner: Arc<Mutex<Inner<S>>>,
}

impl<S> Clone for StateStream<S> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<S: Send + Sync + 'static> Default for StateStream<S> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S: Send + Sync + 'static> StateStream<S> {
    /// Creates a stream that has not produced a snapshot yet.
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(Inner {
                latest: None,
                terminal: None,
                closed: false,
                version: 0,
                dispatching: false,
                pending: VecDeque::new(),
                listeners: Vec::new(),
                interrupted: None,
            })),
        }
    }

    /// Creates a stream whose first snapshot is `value`.
    #[must_use]
    pub fn with_value(value: S) -> Self {
        let stream = Self::new();
        stream.emit(value);
        stream
    }

    /// Returns the latest dispatched snapshot.
    #[must_use]
    pub fn latest(&self) -> Option<Arc<S>> {
        self.inner.lock().latest.clone()
    }

    /// Returns `true` once the stream has failed or completed.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.inner.lock().closed
    }

    /// Returns the number of registered, still active listeners.
    #[must_use]
    pub fn listener_count(&self) -> usize {
        let inner = self.inner.lock();
        let unreached = inner.interrupted.iter().flat_map(|(_, slots)| slots);
        inner
            .listeners
            .iter()
            .chain(unreached)
            .filter(|slot| slot.active.load(Ordering::Acquire))
            .count()
    }

    /// Emits a new snapshot to every listener.
    ///
    /// Ignored once the stream is closed.
    pub fn emit(&self, value: S) {
        self.push(Signal::Next(Arc::new(value)));
    }

    /// Fails the stream, notifying and releasing every listener.
    pub fn fail(&self, error: StreamError) {
        self.push(Signal::Error(error));
    }

    /// Completes the stream, notifying and releasing every listener.
    pub fn complete(&self) {
        self.push(Signal::Complete);
    }

    /// Registers `listener`.
    ///
    /// The latest snapshot (and terminal event, if any) is replayed
    /// synchronously before this returns. The listener stays registered
    /// until it returns [`Listen::Stop`], the stream terminates, or the
    /// returned [`Subscription`] is unsubscribed. Dropping the subscription
    /// does not unsubscribe.
    pub fn subscribe(
        &self,
        listener: impl FnMut(StreamEvent<'_, S>) -> Listen + Send + 'static,
    ) -> Subscription {
        let active = Arc::new(AtomicBool::new(true));
        let mut slot = Slot {
            active: Arc::clone(&active),
            listener: Box::new(listener),
        };

        let mut replayed = None;
        loop {
            let mut inner = self.inner.lock();
            let nothing_to_replay = inner.latest.is_none() && inner.terminal.is_none();
            if nothing_to_replay || replayed == Some(inner.version) {
                inner.listeners.retain(|s| s.active.load(Ordering::Acquire));
                inner.listeners.push(slot);
                break;
            }

            // A dispatch may run while we replay; loop until we have seen
            // the latest version with the lock held.
            replayed = Some(inner.version);
            let latest = inner.latest.clone();
            let terminal = inner.terminal.clone();
            drop(inner);

            if let Some(value) = latest
                && !slot.deliver(&Signal::Next(value))
            {
                break;
            }
            if let Some(terminal) = terminal {
                slot.deliver(&terminal);
                break;
            }
        }

        Subscription { active }
    }

    /// Takes the first snapshot the stream produces, then deregisters.
    ///
    /// `on_value` runs synchronously if a snapshot is already available.
    /// `on_error` runs if the stream fails before producing one. If the
    /// stream completes first, neither runs.
    pub fn first(
        &self,
        on_value: impl FnOnce(&S) + Send + 'static,
        on_error: impl FnOnce(&StreamError) + Send + 'static,
    ) -> Subscription {
        let mut on_value = Some(on_value);
        let mut on_error = Some(on_error);
        self.subscribe(move |event| {
            match event {
                StreamEvent::Next(value) => {
                    if let Some(callback) = on_value.take() {
                        callback(value);
                    }
                }
                StreamEvent::Error(error) => {
                    if let Some(callback) = on_error.take() {
                        callback(error);
                    }
                }
                StreamEvent::Complete => {}
            }
            Listen::Stop
        })
    }

    fn push(&self, signal: Signal<S>) {
        let mut inner = self.inner.lock();
        if inner.closed {
            tracing::trace!("ignoring signal on closed state stream");
            // Still flush what a panicking listener left behind.
            if inner.dispatching || !inner.has_undelivered() {
                return;
            }
        } else {
            if signal.is_terminal() {
                inner.closed = true;
            }
            inner.pending.push_back(signal);
        }

        if inner.dispatching {
            return;
        }
        inner.dispatching = true;
        drop(inner);

        self.drain();
    }

    fn drain(&self) {
        let mut guard = DispatchGuard {
            inner: &self.inner,
            signal: None,
            listeners: Vec::new(),
            cursor: 0,
        };

        loop {
            {
                let mut inner = self.inner.lock();
                if let Some((signal, unreached)) = inner.interrupted.take() {
                    tracing::trace!(listeners = unreached.len(), "resuming interrupted signal");
                    guard.begin(signal, unreached);
                } else {
                    let Some(signal) = inner.pending.pop_front() else {
                        inner.dispatching = false;
                        return;
                    };

                    match &signal {
                        Signal::Next(value) => inner.latest = Some(Arc::clone(value)),
                        Signal::Error(_) | Signal::Complete => {
                            inner.terminal = Some(signal.clone());
                        }
                    }
                    inner.version += 1;

                    let listeners = core::mem::take(&mut inner.listeners);
                    tracing::trace!(listeners = listeners.len(), "dispatching state signal");
                    guard.begin(signal, listeners);
                }
            }

            guard.deliver();
            let Some((signal, mut listeners)) = guard.finish() else {
                continue;
            };

            let mut inner = self.inner.lock();
            // Listeners added during dispatch already had this signal replayed.
            listeners.append(&mut inner.listeners);
            let released = if signal.is_terminal() {
                core::mem::take(&mut listeners)
            } else {
                Vec::new()
            };
            inner.listeners = listeners;
            drop(inner);
            drop(released);
        }
    }
}

/// Handle to a registered listener.
#[derive(Debug, Clone)]
pub struct Subscription {
    active: Arc<AtomicBool>,
}

impl Subscription {
    /// Stops delivery to the listener.
    ///
    /// The listener is released at the next dispatch or subscription.
    pub fn unsubscribe(&self) {
        self.active.store(false, Ordering::Release);
    }

    /// Returns `true` while the listener can still receive events.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::Acquire)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn recorder(stream: &StateStream<i32>) -> (Arc<Mutex<Vec<i32>>>, Subscription) {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let subscription = stream.subscribe(move |event| {
            if let StreamEvent::Next(value) = event {
                sink.lock().push(*value);
            }
            Listen::Continue
        });
        (seen, subscription)
    }

    #[test]
    fn replays_latest_on_subscribe() {
        let stream = StateStream::with_value(1);
        stream.emit(2);

        let (seen, _sub) = recorder(&stream);
        assert_eq!(*seen.lock(), vec![2]);
    }

    #[test]
    fn empty_stream_replays_nothing() {
        let stream = StateStream::<i32>::new();
        let (seen, sub) = recorder(&stream);

        assert!(seen.lock().is_empty());
        assert!(sub.is_active());
        assert_eq!(stream.listener_count(), 1);
    }

    #[test]
    fn first_takes_one_value_and_deregisters() {
        let stream = StateStream::new();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);

        let sub = stream.first(move |value: &i32| sink.lock().push(*value), |_| {});
        assert!(sub.is_active());

        stream.emit(10);
        stream.emit(20);

        assert_eq!(*seen.lock(), vec![10]);
        assert!(!sub.is_active());
        assert_eq!(stream.listener_count(), 0);
    }

    #[test]
    fn first_on_initialized_stream_runs_synchronously() {
        let stream = StateStream::with_value(5);
        let seen = Arc::new(Mutex::new(None));
        let sink = Arc::clone(&seen);

        let sub = stream.first(move |value: &i32| *sink.lock() = Some(*value), |_| {});

        assert_eq!(*seen.lock(), Some(5));
        assert!(!sub.is_active());
        assert_eq!(stream.listener_count(), 0);
    }

    #[test]
    fn unsubscribe_stops_delivery() {
        let stream = StateStream::new();
        let (seen, sub) = recorder(&stream);

        stream.emit(1);
        sub.unsubscribe();
        stream.emit(2);

        assert_eq!(*seen.lock(), vec![1]);
        assert_eq!(stream.listener_count(), 0);
    }

    #[test]
    fn failure_reaches_error_channel() {
        let stream = StateStream::<i32>::new();
        let failure = Arc::new(Mutex::new(None));
        let sink = Arc::clone(&failure);

        stream.first(|_| {}, move |error| *sink.lock() = Some(error.clone()));
        stream.fail(StreamError::new("boom"));

        assert_eq!(failure.lock().as_ref().map(StreamError::message), Some("boom"));
        assert!(stream.is_closed());
    }

    #[test]
    fn emissions_after_close_are_ignored() {
        let stream = StateStream::with_value(1);
        stream.complete();
        stream.emit(2);

        assert_eq!(stream.latest().as_deref(), Some(&1));
        assert_eq!(stream.listener_count(), 0);
    }

    #[test]
    fn late_subscriber_sees_terminal_event() {
        let stream = StateStream::with_value(1);
        stream.complete();

        let completed = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&completed);
        let sub = stream.subscribe(move |event| {
            if matches!(event, StreamEvent::Complete) {
                flag.store(true, Ordering::SeqCst);
            }
            Listen::Continue
        });

        assert!(completed.load(Ordering::SeqCst));
        assert!(!sub.is_active());
    }

    #[test]
    fn reentrant_emit_is_queued_in_order() {
        let stream = StateStream::new();
        let echo = stream.clone();
        stream.subscribe(move |event| {
            if let StreamEvent::Next(&value) = event
                && value < 3
            {
                echo.emit(value + 1);
            }
            Listen::Continue
        });

        let (seen, _sub) = recorder(&stream);
        stream.emit(1);

        assert_eq!(*seen.lock(), vec![1, 2, 3]);
        assert_eq!(stream.latest().as_deref(), Some(&3));
    }

    #[test]
    fn panicking_listener_spares_the_others() {
        let stream = StateStream::new();
        let (before, _before_sub) = recorder(&stream);
        stream.first(|_: &i32| panic!("listener failed"), |_| {});
        let (after, _after_sub) = recorder(&stream);

        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| stream.emit(1)));

        assert!(result.is_err());
        assert_eq!(stream.listener_count(), 2);
        assert_eq!(*before.lock(), vec![1]);
        assert!(after.lock().is_empty());

        stream.emit(2);

        assert_eq!(*before.lock(), vec![1, 2]);
        assert_eq!(*after.lock(), vec![1, 2]);
        assert_eq!(stream.latest().as_deref(), Some(&2));
    }

    #[test]
    fn panic_keeps_queued_signals() {
        let stream = StateStream::new();
        let echo = stream.clone();
        stream.first(
            move |_: &i32| {
                echo.emit(2);
                panic!("listener failed");
            },
            |_| {},
        );
        let (seen, _sub) = recorder(&stream);

        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| stream.emit(1)));
        assert!(result.is_err());

        stream.complete();

        assert_eq!(*seen.lock(), vec![1, 2]);
        assert!(stream.is_closed());
        assert_eq!(stream.listener_count(), 0);
    }

    #[test]
    fn subscribing_from_a_listener_does_not_duplicate() {
        let stream = StateStream::new();
        let inner_stream = stream.clone();
        let late = Arc::new(Mutex::new(Vec::new()));
        let late_sink = Arc::clone(&late);

        stream.first(
            move |_: &i32| {
                let sink = Arc::clone(&late_sink);
                inner_stream.subscribe(move |event| {
                    if let StreamEvent::Next(value) = event {
                        sink.lock().push(*value);
                    }
                    Listen::Continue
                });
            },
            |_| {},
        );

        stream.emit(1);
        stream.emit(2);

        assert_eq!(*late.lock(), vec![1, 2]);
    }
}
