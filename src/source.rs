//! Network capability consumed by the cache.

use crate::{LadderError, PageNumber, RosterHandle, RosterInfo, RowRecord};
use futures::future::LocalBoxFuture;

/// Where ladder data comes from.
///
/// Futures are `'static` so the cache can keep them in flight independently of
/// the caller. Dropping a returned future must abort the underlying request.
pub trait RosterSource {
    /// Ladder metadata: name, size and the caller's own rank.
    fn fetch_roster(&self, handle: RosterHandle) -> LocalBoxFuture<'static, Result<RosterInfo, LadderError>>;

    /// Up to `page_size` rows starting at `page.first_index()`, in rank order.
    fn fetch_page(
        &self,
        handle: RosterHandle,
        page: PageNumber,
        page_size: usize,
    ) -> LocalBoxFuture<'static, Result<Vec<RowRecord>, LadderError>>;
}
