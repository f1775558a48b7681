//! Paged row cache for one ladder.
//!
//! Rows are fetched a page at a time and stored by absolute index. Every page
//! has at most one request in flight; later callers join it through a
//! [`Shared`] future instead of issuing their own.
//!
//! # Ordering
//! A completing fetch writes its rows, drops its in-flight entry and only then
//! resolves its joiners, so a joiner always observes the rows it waited for.
//!
//! # Invalidation
//! [`PagedCache::invalidate`] aborts every in-flight request, empties the cache
//! and bumps the generation. Joiners of aborted requests resolve to
//! [`LadderError::Cancelled`]; responses that slip past the abort are dropped by
//! the generation check before they can be written.

use crate::config::PAGE_SIZE;
use crate::rank;
use crate::source::RosterSource;
use crate::{LadderError, PageNumber, RosterHandle, RosterInfo, RowRecord};
use futures::future::{AbortHandle, Abortable, Aborted, LocalBoxFuture, Shared};
use futures::FutureExt;
use log::{debug, info, warn};
use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::rc::Rc;
use std::task::{Context, Poll};

type PageRows = Rc<[Rc<RowRecord>]>;
type PageFetch = Shared<LocalBoxFuture<'static, Result<PageRows, LadderError>>>;

struct InFlight {
    fetch: PageFetch,
    abort: AbortHandle,
}

struct State {
    handle: RosterHandle,
    roster: Option<Rc<RosterInfo>>,
    rows: HashMap<usize, Rc<RowRecord>>,
    in_flight: HashMap<PageNumber, InFlight>,
    generation: u64,
    /// Bumped per `resolve_roster` so superseded metadata can be recognised.
    resolve_seq: u64,
}

impl State {
    /// Abort all requests and forget all rows. Returns the number of aborted requests.
    fn reset(&mut self) -> usize {
        let aborted = self.in_flight.len();
        for (_, flight) in self.in_flight.drain() {
            flight.abort.abort();
        }
        self.rows.clear();
        self.generation += 1;
        aborted
    }
}

/// Result of a row lookup.
#[derive(Debug)]
pub enum Lookup {
    /// The row was cached.
    Hit(Rc<RowRecord>),
    /// The row's page is being fetched; await the handle for the row.
    Pending(PendingRow),
    /// Not cached and the caller asked for cache-only access.
    Miss,
}

/// A row waiting on its page fetch.
///
/// Resolves to `Ok(None)` when the page came back without a row at this index,
/// which only happens past the end of the final page.
pub struct PendingRow {
    index: usize,
    page: PageNumber,
    fetch: PageFetch,
}

impl PendingRow {
    pub fn index(&self) -> usize {
        self.index
    }

    pub fn page(&self) -> PageNumber {
        self.page
    }
}

impl fmt::Debug for PendingRow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PendingRow")
            .field("index", &self.index)
            .field("page", &self.page)
            .finish()
    }
}

impl Future for PendingRow {
    type Output = Result<Option<Rc<RowRecord>>, LadderError>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let offset = self.index - self.page.first_index();
        Pin::new(&mut self.fetch)
            .poll(cx)
            .map(|outcome| outcome.map(|rows| rows.get(offset).cloned()))
    }
}

/// Row cache for the ladder currently shown by a view.
///
/// Cloning is cheap and every clone shares the same rows, requests and
/// generation; the view creates one instance per ladder and hands clones to
/// its row bindings.
pub struct PagedCache<S> {
    state: Rc<RefCell<State>>,
    source: Rc<S>,
}

impl<S> Clone for PagedCache<S> {
    fn clone(&self) -> Self {
        Self {
            state: Rc::clone(&self.state),
            source: Rc::clone(&self.source),
        }
    }
}

impl<S> PartialEq for PagedCache<S> {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.state, &other.state)
    }
}

impl<S: RosterSource + 'static> PagedCache<S> {
    /// Create an empty cache for `handle`.
    pub fn new(source: S, handle: RosterHandle) -> Self {
        Self {
            state: Rc::new(RefCell::new(State {
                handle,
                roster: None,
                rows: HashMap::new(),
                in_flight: HashMap::new(),
                generation: 0,
                resolve_seq: 0,
            })),
            source: Rc::new(source),
        }
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn handle(&self) -> RosterHandle {
        self.state.borrow().handle
    }

    /// Metadata from the last successful [`resolve_roster`](Self::resolve_roster).
    pub fn roster(&self) -> Option<Rc<RosterInfo>> {
        self.state.borrow().roster.clone()
    }

    /// Incremented on every invalidation.
    pub fn generation(&self) -> u64 {
        self.state.borrow().generation
    }

    /// Number of cached rows.
    pub fn len(&self) -> usize {
        self.state.borrow().rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.state.borrow().rows.is_empty()
    }

    /// Pages with a request currently in flight, ascending.
    pub fn in_flight_pages(&self) -> Vec<PageNumber> {
        let mut pages: Vec<PageNumber> = self.state.borrow().in_flight.keys().copied().collect();
        pages.sort();
        pages
    }

    /// Look up the row at absolute `index`.
    ///
    /// With `cache_only` set this never starts network work and never returns
    /// [`Lookup::Pending`].
    pub fn get(&self, index: usize, cache_only: bool) -> Lookup {
        let mut state = self.state.borrow_mut();
        if let Some(row) = state.rows.get(&index) {
            return Lookup::Hit(Rc::clone(row));
        }
        if cache_only {
            return Lookup::Miss;
        }

        let page = PageNumber::of(index);
        let joined = state.in_flight.get(&page).map(|flight| flight.fetch.clone());
        let fetch = match joined {
            Some(fetch) => {
                debug!("row {} joins in-flight fetch of page {}", index, page);
                fetch
            }
            None => self.start_fetch(&mut state, page),
        };
        Lookup::Pending(PendingRow { index, page, fetch })
    }

    fn start_fetch(&self, state: &mut State, page: PageNumber) -> PageFetch {
        let handle = state.handle;
        let generation = state.generation;
        let last_page = state.roster.as_ref().and_then(|r| r.last_page());
        debug!("fetching ladder {} page {} (generation {})", handle, page, generation);

        let (abort, registration) = AbortHandle::new_pair();
        let request = Abortable::new(self.source.fetch_page(handle, page, PAGE_SIZE), registration);
        let shared_state = Rc::downgrade(&self.state);

        let fetch = async move {
            let outcome = match request.await {
                Ok(outcome) => outcome,
                Err(Aborted) => return Err(LadderError::Cancelled),
            };
            let Some(shared_state) = shared_state.upgrade() else {
                return Err(LadderError::Cancelled);
            };
            let mut state = shared_state.borrow_mut();
            if state.generation != generation {
                debug!("discarding page {} from generation {}", page, generation);
                return Err(LadderError::Cancelled);
            }

            let result = outcome.and_then(|rows| ingest(page, rows, last_page));
            match &result {
                Ok(rows) => {
                    let first = page.first_index();
                    for (offset, row) in rows.iter().enumerate() {
                        state.rows.insert(first + offset, Rc::clone(row));
                    }
                }
                Err(err) => debug!("page {} of ladder {} failed: {}", page, handle, err),
            }
            state.in_flight.remove(&page);
            result
        }
        .boxed_local()
        .shared();

        state.in_flight.insert(
            page,
            InFlight {
                fetch: fetch.clone(),
                abort,
            },
        );
        fetch
    }

    /// Abort every in-flight request and drop every cached row.
    pub fn invalidate(&self) {
        let mut state = self.state.borrow_mut();
        let aborted = state.reset();
        debug!(
            "invalidated ladder {}: generation {}, {} fetches aborted",
            state.handle, state.generation, aborted
        );
    }

    /// Switch to `handle` and fetch its metadata.
    ///
    /// The switch (and the invalidation it implies) happens immediately; the
    /// returned future only waits for the metadata. If another resolve starts
    /// before this one's response arrives, this one yields
    /// [`LadderError::Cancelled`].
    pub fn resolve_roster(
        &self,
        handle: RosterHandle,
    ) -> LocalBoxFuture<'static, Result<Rc<RosterInfo>, LadderError>> {
        let (request, seq) = {
            let mut state = self.state.borrow_mut();
            state.reset();
            state.handle = handle;
            state.roster = None;
            state.resolve_seq += 1;
            (self.source.fetch_roster(handle), state.resolve_seq)
        };
        let shared_state = Rc::clone(&self.state);

        async move {
            let info = Rc::new(request.await?);
            let mut state = shared_state.borrow_mut();
            if state.resolve_seq != seq {
                debug!("discarding superseded metadata for ladder {}", handle);
                return Err(LadderError::Cancelled);
            }
            info!(
                "resolved ladder {} \"{}\": {} players, caller rank {:?}",
                handle,
                info.name,
                info.size,
                info.caller_rank()
            );
            state.roster = Some(Rc::clone(&info));
            Ok(info)
        }
        .boxed_local()
    }

    /// Invalidate and release this handle; used when the ladder leaves the screen.
    pub fn dispose(self) {
        self.invalidate();
    }
}

/// Validate a page response and normalize its rows for storage.
fn ingest(
    page: PageNumber,
    rows: Vec<RowRecord>,
    last_page: Option<PageNumber>,
) -> Result<PageRows, LadderError> {
    if rows.len() > PAGE_SIZE {
        return Err(LadderError::OversizedPage {
            page,
            len: rows.len(),
        });
    }
    if rows.len() < PAGE_SIZE && last_page.is_some_and(|last| page < last) {
        warn!(
            "page {} returned {} rows but is not the final page ({:?})",
            page,
            rows.len(),
            last_page
        );
    }
    Ok(rows
        .into_iter()
        .map(|mut row| {
            rank::normalize(&mut row);
            Rc::new(row)
        })
        .collect())
}
