//! Controller notifications.
//!
//! Producers call [`EventBroadcaster::notify`], which only enqueues. A single
//! dispatch thread owns delivery, so observers never run on the worker thread
//! and never race with further producer mutations. Events are delivered in
//! the order they were produced.

use crossbeam_channel::{bounded, unbounded, Receiver, Sender};
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, PoisonError, RwLock};
use std::thread::{self, JoinHandle};
use tracing::{debug, warn};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ControllerEvent {
    /// Result store contents changed.
    ModelChanged,
    /// A job started or stopped.
    StateChanged,
    /// Progress tracker was updated.
    ProgressChanged,
    /// Presentation-only hint with an opaque payload.
    ViewChanged(String),
}

pub trait Observer: Send + Sync {
    fn on_event(&self, event: &ControllerEvent);
}

impl<F> Observer for F
where
    F: Fn(&ControllerEvent) + Send + Sync,
{
    fn on_event(&self, event: &ControllerEvent) {
        self(event)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ObserverId(u64);

enum Envelope {
    Event(ControllerEvent),
    Flush(Sender<()>),
}

type ObserverList = Arc<RwLock<Vec<(ObserverId, Arc<dyn Observer>)>>>;

pub struct EventBroadcaster {
    observers: ObserverList,
    next_id: AtomicU64,
    sender: Option<Sender<Envelope>>,
    dispatcher: Option<JoinHandle<()>>,
}

impl EventBroadcaster {
    pub fn new() -> Self {
        let observers: ObserverList = Arc::new(RwLock::new(Vec::new()));
        let (tx, rx) = unbounded();

        let list = observers.clone();
        let dispatcher = thread::Builder::new()
            .name("trialctl-events".into())
            .spawn(move || dispatch_loop(rx, list))
            .ok();

        if dispatcher.is_none() {
            warn!("Could not spawn event dispatch thread; notifications are disabled");
        }

        Self {
            observers,
            next_id: AtomicU64::new(1),
            sender: dispatcher.as_ref().map(|_| tx),
            dispatcher,
        }
    }

    pub fn subscribe(&self, observer: Arc<dyn Observer>) -> ObserverId {
        let id = ObserverId(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.observers
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push((id, observer));
        id
    }

    /// Returns `true` if the observer was registered.
    pub fn unsubscribe(&self, id: ObserverId) -> bool {
        let mut list = self.observers.write().unwrap_or_else(PoisonError::into_inner);
        let before = list.len();
        list.retain(|(oid, _)| *oid != id);
        list.len() != before
    }

    pub fn observer_count(&self) -> usize {
        self.observers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Enqueues an event and returns without waiting for observers.
    /// The queue is unbounded; observers that fall behind should coalesce
    /// progress events themselves.
    pub fn notify(&self, event: ControllerEvent) {
        if let Some(tx) = &self.sender {
            if tx.send(Envelope::Event(event)).is_err() {
                debug!("Event dispatcher has stopped; dropping notification");
            }
        }
    }

    /// Blocks until every event enqueued before this call has been delivered.
    /// Returns immediately when called from an observer callback.
    pub fn flush(&self) {
        if self.on_dispatch_thread() {
            return;
        }
        let Some(tx) = &self.sender else {
            return;
        };
        let (ack_tx, ack_rx) = bounded(1);
        if tx.send(Envelope::Flush(ack_tx)).is_ok() {
            let _ = ack_rx.recv();
        }
    }

    fn on_dispatch_thread(&self) -> bool {
        self.dispatcher
            .as_ref()
            .is_some_and(|h| h.thread().id() == thread::current().id())
    }
}

impl Default for EventBroadcaster {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for EventBroadcaster {
    fn drop(&mut self) {
        // Closing the channel lets the dispatcher drain what is queued and exit.
        self.sender.take();
        if let Some(handle) = self.dispatcher.take() {
            if handle.thread().id() != thread::current().id() {
                let _ = handle.join();
            }
        }
    }
}

fn dispatch_loop(rx: Receiver<Envelope>, observers: ObserverList) {
    for envelope in rx.iter() {
        match envelope {
            Envelope::Event(event) => {
                // Snapshot so callbacks may (un)subscribe without deadlocking.
                let snapshot: Vec<Arc<dyn Observer>> = observers
                    .read()
                    .unwrap_or_else(PoisonError::into_inner)
                    .iter()
                    .map(|(_, o)| o.clone())
                    .collect();

                for observer in snapshot {
                    let delivered =
                        panic::catch_unwind(AssertUnwindSafe(|| observer.on_event(&event)));
                    if delivered.is_err() {
                        warn!("Observer panicked while handling {:?}", event);
                    }
                }
            }
            Envelope::Flush(ack) => {
                let _ = ack.send(());
            }
        }
    }
}
