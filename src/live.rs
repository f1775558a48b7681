//! Fan-out for realtime "players updated" pushes.
//!
//! The host page owns the socket; it forwards pushes through
//! [`crate::players_updated`], and every view showing that ladder gets a
//! callback. Thread-local because everything runs on the browser main thread.

use crate::RosterHandle;
use log::debug;
use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::rc::Rc;

type Listener = Rc<dyn Fn()>;

thread_local! {
    static LISTENERS: RefCell<HashMap<RosterHandle, Vec<(u64, Listener)>>> =
        RefCell::new(HashMap::new());
    static NEXT_ID: Cell<u64> = const { Cell::new(0) };
}

/// Keeps a listener registered; dropping it unsubscribes.
#[must_use = "the listener is removed when the subscription is dropped"]
pub struct LiveSubscription {
    handle: RosterHandle,
    id: u64,
}

impl Drop for LiveSubscription {
    fn drop(&mut self) {
        LISTENERS.with(|l| {
            let mut listeners = l.borrow_mut();
            if let Some(list) = listeners.get_mut(&self.handle) {
                list.retain(|(id, _)| *id != self.id);
                if list.is_empty() {
                    listeners.remove(&self.handle);
                }
            }
        });
    }
}

/// Call `listener` whenever `handle`'s roster changes.
pub fn subscribe(handle: RosterHandle, listener: impl Fn() + 'static) -> LiveSubscription {
    let id = NEXT_ID.with(|n| {
        let id = n.get();
        n.set(id + 1);
        id
    });
    LISTENERS.with(|l| {
        l.borrow_mut()
            .entry(handle)
            .or_default()
            .push((id, Rc::new(listener)));
    });
    LiveSubscription { handle, id }
}

/// Notify every listener of `handle`. Returns how many were called.
pub fn notify(handle: RosterHandle) -> usize {
    // Snapshot first: listeners may subscribe or unsubscribe while running.
    let listeners: Vec<Listener> = LISTENERS.with(|l| {
        l.borrow()
            .get(&handle)
            .map(|list| list.iter().map(|(_, f)| Rc::clone(f)).collect())
            .unwrap_or_default()
    });
    debug!("players updated on ladder {}: {} listeners", handle, listeners.len());
    for listener in &listeners {
        listener();
    }
    listeners.len()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn notifies_only_matching_ladder() {
        let hits = Rc::new(Cell::new(0));
        let counter = Rc::clone(&hits);
        let _sub = subscribe(RosterHandle(1), move || counter.set(counter.get() + 1));

        assert_eq!(notify(RosterHandle(1)), 1);
        assert_eq!(notify(RosterHandle(2)), 0);
        assert_eq!(hits.get(), 1);
    }

    #[test]
    fn dropping_subscription_unsubscribes() {
        let hits = Rc::new(Cell::new(0));
        let counter = Rc::clone(&hits);
        let sub = subscribe(RosterHandle(5), move || counter.set(counter.get() + 1));
        let other = subscribe(RosterHandle(5), || {});

        drop(sub);
        assert_eq!(notify(RosterHandle(5)), 1);
        assert_eq!(hits.get(), 0);

        drop(other);
        assert_eq!(notify(RosterHandle(5)), 0);
    }

    #[test]
    fn listener_may_resubscribe_while_notified() {
        let held: Rc<RefCell<Vec<LiveSubscription>>> = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&held);
        let _sub = subscribe(RosterHandle(9), move || {
            sink.borrow_mut().push(subscribe(RosterHandle(9), || {}));
        });

        assert_eq!(notify(RosterHandle(9)), 1);
        assert_eq!(notify(RosterHandle(9)), 2);
        assert_eq!(held.borrow().len(), 2);
    }

    #[test]
    fn exported_entry_point_reaches_listeners() {
        let hits = Rc::new(Cell::new(0));
        let counter = Rc::clone(&hits);
        let _sub = subscribe(RosterHandle(11), move || counter.set(counter.get() + 1));

        crate::players_updated(11);
        assert_eq!(hits.get(), 1);
    }
}
