use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use trialctl::builtin::{BuiltinAlgorithms, BuiltinProblems};
use trialctl::events::{ControllerEvent, EventBroadcaster, Observer, ObserverId};
use trialctl::runner::LoggingFailureHandler;
use trialctl::Controller;

#[test]
fn observer_added_from_a_callback_sees_later_events() {
    let events = Arc::new(EventBroadcaster::new());
    let late_hits = Arc::new(AtomicUsize::new(0));
    let registered = Arc::new(Mutex::new(false));

    let (bus, hits, once) = (
        Arc::downgrade(&events),
        late_hits.clone(),
        registered.clone(),
    );
    events.subscribe(Arc::new(move |_: &ControllerEvent| {
        let mut done = once.lock().unwrap();
        if *done {
            return;
        }
        *done = true;
        if let Some(bus) = bus.upgrade() {
            let hits = hits.clone();
            bus.subscribe(Arc::new(move |_: &ControllerEvent| {
                hits.fetch_add(1, Ordering::SeqCst);
            }));
        }
    }));

    events.notify(ControllerEvent::ModelChanged);
    events.flush();
    // Registered during delivery of the first event, so it missed that one.
    assert_eq!(late_hits.load(Ordering::SeqCst), 0);
    assert_eq!(events.observer_count(), 2);

    events.notify(ControllerEvent::StateChanged);
    events.notify(ControllerEvent::ProgressChanged);
    events.flush();
    assert_eq!(late_hits.load(Ordering::SeqCst), 2);
}

struct SelfRemoving {
    bus: std::sync::Weak<EventBroadcaster>,
    id: Mutex<Option<ObserverId>>,
    calls: AtomicUsize,
}

impl Observer for SelfRemoving {
    fn on_event(&self, _: &ControllerEvent) {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let (Some(bus), Some(id)) = (self.bus.upgrade(), *self.id.lock().unwrap()) {
            bus.unsubscribe(id);
        }
    }
}

#[test]
fn observer_may_unsubscribe_itself() {
    let events = Arc::new(EventBroadcaster::new());
    let observer = Arc::new(SelfRemoving {
        bus: Arc::downgrade(&events),
        id: Mutex::new(None),
        calls: AtomicUsize::new(0),
    });
    let id = events.subscribe(observer.clone());
    *observer.id.lock().unwrap() = Some(id);

    events.notify(ControllerEvent::ModelChanged);
    events.notify(ControllerEvent::ModelChanged);
    events.flush();

    assert_eq!(observer.calls.load(Ordering::SeqCst), 1);
    assert_eq!(events.observer_count(), 0);
}

#[test]
fn view_changes_carry_their_payload() {
    let controller = Controller::new(
        Arc::new(BuiltinProblems),
        Arc::new(BuiltinAlgorithms),
        Arc::new(LoggingFailureHandler::new()),
    );
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = seen.clone();
    controller.subscribe(Arc::new(move |e: &ControllerEvent| {
        sink.lock().unwrap().push(e.clone());
    }));

    controller.fire_view_changed("statistics");
    controller.events().flush();

    assert_eq!(
        *seen.lock().unwrap(),
        vec![ControllerEvent::ViewChanged("statistics".into())]
    );
}

#[test]
fn slow_observer_still_receives_every_progress_event() {
    let events = EventBroadcaster::new();
    let hits = Arc::new(AtomicUsize::new(0));
    let counter = hits.clone();
    events.subscribe(Arc::new(move |_: &ControllerEvent| {
        std::thread::sleep(std::time::Duration::from_micros(200));
        counter.fetch_add(1, Ordering::SeqCst);
    }));

    // notify never blocks on the observer, so the burst queues up.
    for _ in 0..500 {
        events.notify(ControllerEvent::ProgressChanged);
    }
    events.flush();
    assert_eq!(hits.load(Ordering::SeqCst), 500);
}
