//! Named multicast events.

use std::any::Any;
use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

/// A callback invoked with an opaque payload. Handlers downcast the payload
/// to whatever the event's publisher documents (`()` when there is none).
pub type EventCallback = Rc<dyn Fn(&dyn Any)>;

/// A shared, ordered list of callbacks.
#[derive(Clone, Default)]
pub struct Event {
    callbacks: Rc<RefCell<Vec<EventCallback>>>,
}

impl Event {
    /// An event with no callbacks.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a callback.
    pub fn subscribe(&self, callback: EventCallback) {
        self.callbacks.borrow_mut().push(callback);
    }

    /// Run every callback in subscription order. Callbacks added while the
    /// event is firing run from the next invocation on.
    pub fn invoke(&self, payload: &dyn Any) {
        let callbacks: Vec<EventCallback> = self.callbacks.borrow().clone();
        for callback in &callbacks {
            callback(payload);
        }
    }

    /// Number of callbacks.
    pub fn len(&self) -> usize {
        self.callbacks.borrow().len()
    }

    /// Whether nothing is subscribed.
    pub fn is_empty(&self) -> bool {
        self.callbacks.borrow().is_empty()
    }
}

impl fmt::Debug for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Event({} callbacks)", self.len())
    }
}

/// Name → event map.
#[derive(Debug, Default)]
pub struct EventRegistry {
    events: HashMap<String, Event>,
}

impl EventRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `callback` to the event called `name`, creating it if needed.
    pub fn add(&mut self, name: &str, callback: impl Fn(&dyn Any) + 'static) -> Event {
        self.add_shared(name, Rc::new(callback))
    }

    /// Like [`add`](Self::add) for an already shared callback. Adding the
    /// same callback twice makes it fire twice.
    pub fn add_shared(&mut self, name: &str, callback: EventCallback) -> Event {
        let event = self.events.entry(name.to_string()).or_default();
        event.subscribe(callback);
        event.clone()
    }

    /// Fire `name`. Unknown names are ignored.
    pub fn invoke(&self, name: &str, payload: &dyn Any) {
        match self.events.get(name) {
            Some(event) => event.invoke(payload),
            None => log::trace!("event {name} has no subscribers"),
        }
    }

    /// Whether `name` exists.
    pub fn has(&self, name: &str) -> bool {
        self.events.contains_key(name)
    }

    /// A shared handle to `name`.
    pub fn get(&self, name: &str) -> Option<Event> {
        self.events.get(name).cloned()
    }

    /// Drop the event and all of its callbacks.
    pub fn remove(&mut self, name: &str) -> Option<Event> {
        self.events.remove(name)
    }

    /// Event names, sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.events.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Number of events.
    pub fn len(&self) -> usize {
        self.events.len()
    }

    /// Whether there are no events.
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn counter() -> (Rc<RefCell<Vec<String>>>, impl Fn(&str) -> EventCallback) {
        let log = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&log);
        let make = move |tag: &str| -> EventCallback {
            let sink = Rc::clone(&sink);
            let tag = tag.to_string();
            Rc::new(move |_: &dyn Any| sink.borrow_mut().push(tag.clone()))
        };
        (log, make)
    }

    #[test]
    fn duplicate_name_accumulates() {
        let (log, make) = counter();
        let mut events = EventRegistry::new();
        events.add_shared("Select", make("a"));
        events.add_shared("Select", make("b"));

        events.invoke("Select", &());
        assert_eq!(*log.borrow(), vec!["a", "b"]);
        assert_eq!(events.len(), 1);
    }

    #[test]
    fn same_callback_twice_fires_twice() {
        let (log, make) = counter();
        let mut events = EventRegistry::new();
        let callback = make("x");
        events.add_shared("Bark", Rc::clone(&callback));
        events.add_shared("Bark", callback);

        events.invoke("Bark", &());
        assert_eq!(log.borrow().len(), 2);
    }

    #[test]
    fn unknown_event_is_noop() {
        let events = EventRegistry::new();
        events.invoke("Nothing", &());
        assert!(!events.has("Nothing"));
    }

    #[test]
    fn remove_drops_every_callback() {
        let (log, make) = counter();
        let mut events = EventRegistry::new();
        events.add_shared("Select", make("a"));
        events.add_shared("Select", make("b"));

        let removed = events.remove("Select").unwrap();
        assert_eq!(removed.len(), 2);
        events.invoke("Select", &());
        assert!(log.borrow().is_empty());
    }

    #[test]
    fn payload_is_downcast_by_handler() {
        let got = Rc::new(RefCell::new(None));
        let sink = Rc::clone(&got);
        let mut events = EventRegistry::new();
        events.add("Damage", move |payload| {
            *sink.borrow_mut() = payload.downcast_ref::<i32>().copied();
        });

        events.invoke("Damage", &12_i32);
        assert_eq!(*got.borrow(), Some(12));
    }

    #[test]
    fn handle_sees_later_subscriptions() {
        let (log, make) = counter();
        let mut events = EventRegistry::new();
        let handle = events.add_shared("Tick", make("a"));
        events.add_shared("Tick", make("b"));

        handle.invoke(&());
        assert_eq!(*log.borrow(), vec!["a", "b"]);
    }
}
