//! Binds one recycled list slot to the row cache.
//!
//! A virtualized list reuses slots as the user scrolls, so the index a slot
//! shows can change while its fetch is still in flight. Every request is
//! tagged with a [`RequestToken`] and its result is adopted only if the slot
//! still carries that token when the result arrives.

use crate::cache::{Lookup, PagedCache, PendingRow};
use crate::source::RosterSource;
use crate::{LadderError, RowRecord};
use log::debug;
use std::cell::RefCell;
use std::rc::{Rc, Weak};

/// Whether the list is moving.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScrollState {
    /// Rows fly past; only cached data is shown.
    Scrolling,
    /// The list came to rest; visible rows are fetched.
    Settled,
}

impl ScrollState {
    pub fn from_scrolling(is_scrolling: bool) -> Self {
        if is_scrolling {
            ScrollState::Scrolling
        } else {
            ScrollState::Settled
        }
    }
}

/// Identity of a slot's request at dispatch time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RequestToken {
    pub index: usize,
    pub generation: u64,
}

struct Slot {
    index: usize,
    row: Option<Rc<RowRecord>>,
    unbound: bool,
}

/// What a [`WindowBinding::sync`] did.
pub enum SyncOutcome<S> {
    /// A cached row replaced the slot's previous row.
    Adopted,
    /// Nothing changed; the slot keeps whatever it showed before.
    Kept,
    /// The row is on its way; drive the subscription to adopt it.
    Pending(Subscription<S>),
}

/// How a [`Subscription`] ended.
#[derive(Debug, Clone, PartialEq)]
pub enum Arrival {
    Adopted,
    /// The slot moved on, was unbound, or the cache was invalidated.
    Stale,
    Failed(LadderError),
}

/// Controller for one visible row.
pub struct WindowBinding<S> {
    cache: PagedCache<S>,
    slot: Rc<RefCell<Slot>>,
}

impl<S> PartialEq for WindowBinding<S> {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.slot, &other.slot)
    }
}

impl<S: RosterSource + 'static> WindowBinding<S> {
    pub fn new(cache: PagedCache<S>, index: usize) -> Self {
        Self {
            cache,
            slot: Rc::new(RefCell::new(Slot {
                index,
                row: None,
                unbound: false,
            })),
        }
    }

    pub fn index(&self) -> usize {
        self.slot.borrow().index
    }

    /// The last adopted row, possibly from an earlier index.
    pub fn row(&self) -> Option<Rc<RowRecord>> {
        self.slot.borrow().row.clone()
    }

    pub fn is_unbound(&self) -> bool {
        self.slot.borrow().unbound
    }

    pub fn token(&self) -> RequestToken {
        RequestToken {
            index: self.index(),
            generation: self.cache.generation(),
        }
    }

    /// Re-evaluate the slot after its index, the scroll state or the cache
    /// generation changed.
    pub fn sync(&self, index: usize, scroll: ScrollState) -> SyncOutcome<S> {
        let mut slot = self.slot.borrow_mut();
        if slot.unbound {
            return SyncOutcome::Kept;
        }
        slot.index = index;

        let cache_only = scroll == ScrollState::Scrolling;
        match self.cache.get(index, cache_only) {
            Lookup::Hit(row) => adopt(&mut slot, row),
            Lookup::Miss => SyncOutcome::Kept,
            Lookup::Pending(pending) => SyncOutcome::Pending(Subscription {
                token: RequestToken {
                    index,
                    generation: self.cache.generation(),
                },
                pending,
                slot: Rc::downgrade(&self.slot),
                cache: self.cache.clone(),
            }),
        }
    }

    /// Tear the binding down; outstanding subscriptions become no-ops.
    pub fn unbind(&self) {
        self.slot.borrow_mut().unbound = true;
    }
}

fn adopt<S>(slot: &mut Slot, row: Rc<RowRecord>) -> SyncOutcome<S> {
    if slot.row.as_ref().is_some_and(|current| Rc::ptr_eq(current, &row)) {
        return SyncOutcome::Kept;
    }
    slot.row = Some(row);
    SyncOutcome::Adopted
}

/// A slot waiting for its row.
pub struct Subscription<S> {
    token: RequestToken,
    pending: PendingRow,
    slot: Weak<RefCell<Slot>>,
    cache: PagedCache<S>,
}

impl<S: RosterSource + 'static> Subscription<S> {
    pub fn token(&self) -> RequestToken {
        self.token
    }

    /// Wait for the row and adopt it if the slot still matches the token.
    pub async fn settle(self) -> Arrival {
        let Subscription {
            token,
            pending,
            slot,
            cache,
        } = self;
        let outcome = pending.await;

        let Some(slot) = slot.upgrade() else {
            return Arrival::Stale;
        };
        let mut slot = slot.borrow_mut();
        if slot.unbound || slot.index != token.index || cache.generation() != token.generation {
            debug!(
                "discarding row {} for slot now at {} (unbound: {})",
                token.index, slot.index, slot.unbound
            );
            return Arrival::Stale;
        }

        match outcome {
            Ok(row) => {
                slot.row = row;
                Arrival::Adopted
            }
            Err(err) if err.is_stale() => Arrival::Stale,
            Err(err) => Arrival::Failed(err),
        }
    }
}
