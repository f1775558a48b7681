//! Scripted roster source for driving the cache in tests.
//!
//! Every request parks on a oneshot channel until the test answers it, so
//! tests control exactly when (and whether) each response lands.

use crate::config::PAGE_SIZE;
use crate::source::RosterSource;
use crate::{ChallengeRecord, LadderError, PageNumber, Player, RosterHandle, RosterInfo, RowRecord};
use futures::channel::oneshot;
use futures::future::LocalBoxFuture;
use futures::FutureExt;
use std::cell::RefCell;
use std::rc::Rc;

type PageReply = Result<Vec<RowRecord>, LadderError>;
type RosterReply = Result<RosterInfo, LadderError>;

struct PageRequest {
    handle: RosterHandle,
    page: PageNumber,
    reply: Option<oneshot::Sender<PageReply>>,
}

struct RosterRequest {
    handle: RosterHandle,
    reply: Option<oneshot::Sender<RosterReply>>,
}

#[derive(Default)]
struct Script {
    size: usize,
    pages: Vec<PageRequest>,
    rosters: Vec<RosterRequest>,
}

#[derive(Clone, Default)]
pub(crate) struct MockSource {
    script: Rc<RefCell<Script>>,
}

fn player(rank: i32) -> Player {
    Player {
        id: rank.unsigned_abs() as u64 + 100,
        username: format!("player{}", rank),
        ladder_rank: rank,
        country: None,
    }
}

/// `count` consecutive rows of `page`, ranked by position.
///
/// Each row carries outgoing challenges against ranks `[5, -1, 2, -1, 1]`
/// (game ids 0..5) in that unsorted order.
pub(crate) fn ladder_rows(page: PageNumber, count: usize) -> Vec<RowRecord> {
    let first = page.first_index();
    (first..first + count)
        .map(|index| RowRecord {
            rank: index as i32 + 1,
            player: player(index as i32 + 1),
            outgoing_challenges: [5, -1, 2, -1, 1]
                .iter()
                .enumerate()
                .map(|(game_id, &rank)| ChallengeRecord {
                    game_id: game_id as u64,
                    player: player(rank),
                })
                .collect(),
            incoming_challenges: Vec::new(),
            can_challenge: None,
        })
        .collect()
}

impl MockSource {
    /// Source for a ladder of `size` players.
    pub(crate) fn new(size: usize) -> Self {
        let source = Self::default();
        source.script.borrow_mut().size = size;
        source
    }

    pub(crate) fn total_requests(&self) -> usize {
        self.script.borrow().pages.len()
    }

    pub(crate) fn page_requests(&self, page: u32) -> usize {
        self.script
            .borrow()
            .pages
            .iter()
            .filter(|r| r.page.get() == page)
            .count()
    }

    pub(crate) fn last_page_handle(&self, page: u32) -> Option<RosterHandle> {
        self.script
            .borrow()
            .pages
            .iter()
            .rev()
            .find(|r| r.page.get() == page)
            .map(|r| r.handle)
    }

    /// Whether the requester of an unanswered `page` request went away.
    pub(crate) fn request_dropped(&self, page: u32) -> bool {
        self.script.borrow().pages.iter().any(|r| {
            r.page.get() == page && r.reply.as_ref().is_some_and(|tx| tx.is_canceled())
        })
    }

    /// Answer the oldest live request for `page` with its rows.
    pub(crate) fn respond(&self, page: u32) -> bool {
        let size = self.script.borrow().size;
        let page_number = PageNumber::of((page as usize - 1) * PAGE_SIZE);
        let count = size.saturating_sub(page_number.first_index()).min(PAGE_SIZE);
        self.respond_with(page, Ok(ladder_rows(page_number, count)))
    }

    pub(crate) fn fail(&self, page: u32) -> bool {
        self.respond_with(page, Err(LadderError::Network("connection reset".to_string())))
    }

    /// Answer the oldest live request for `page`; false if there is none.
    pub(crate) fn respond_with(&self, page: u32, reply: PageReply) -> bool {
        let mut script = self.script.borrow_mut();
        let waiting = script.pages.iter_mut().find(|r| {
            r.page.get() == page && r.reply.as_ref().is_some_and(|tx| !tx.is_canceled())
        });
        match waiting.and_then(|r| r.reply.take()) {
            Some(tx) => tx.send(reply).is_ok(),
            None => false,
        }
    }

    /// Answer the oldest live metadata request for `handle`.
    pub(crate) fn respond_roster(&self, handle: RosterHandle) -> bool {
        let mut script = self.script.borrow_mut();
        let info = RosterInfo {
            id: handle,
            name: format!("Ladder {}", handle),
            size: script.size,
            player_rank: -1,
            group: None,
            player_is_member_of_group: false,
        };
        let waiting = script.rosters.iter_mut().find(|r| {
            r.handle == handle && r.reply.as_ref().is_some_and(|tx| !tx.is_canceled())
        });
        match waiting.and_then(|r| r.reply.take()) {
            Some(tx) => tx.send(Ok(info)).is_ok(),
            None => false,
        }
    }
}

impl RosterSource for MockSource {
    fn fetch_roster(&self, handle: RosterHandle) -> LocalBoxFuture<'static, RosterReply> {
        let (tx, rx) = oneshot::channel();
        self.script.borrow_mut().rosters.push(RosterRequest {
            handle,
            reply: Some(tx),
        });
        async move {
            rx.await
                .unwrap_or_else(|_| Err(LadderError::Network("mock reply dropped".to_string())))
        }
        .boxed_local()
    }

    fn fetch_page(
        &self,
        handle: RosterHandle,
        page: PageNumber,
        page_size: usize,
    ) -> LocalBoxFuture<'static, PageReply> {
        assert_eq!(page_size, PAGE_SIZE);
        let (tx, rx) = oneshot::channel();
        self.script.borrow_mut().pages.push(PageRequest {
            handle,
            page,
            reply: Some(tx),
        });
        async move {
            rx.await
                .unwrap_or_else(|_| Err(LadderError::Network("mock reply dropped".to_string())))
        }
        .boxed_local()
    }
}
