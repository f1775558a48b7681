use serde::{Deserialize, Serialize};
use std::fmt;
use wasm_bindgen::prelude::*;

pub mod binding;
pub mod cache;
pub mod config;
pub mod http;
pub mod live;
pub mod rank;
pub mod source;
pub mod window;

#[cfg(test)]
pub(crate) mod testing;

pub use binding::{Arrival, RequestToken, ScrollState, Subscription, SyncOutcome, WindowBinding};
pub use cache::{Lookup, PagedCache, PendingRow};
pub use source::RosterSource;

use config::PAGE_SIZE;

/// Identifies one ladder on the server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RosterHandle(pub u64);

impl fmt::Display for RosterHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// 1-indexed page of `PAGE_SIZE` consecutive rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PageNumber(u32);

impl PageNumber {
    /// Page holding the row at absolute `index`.
    pub fn of(index: usize) -> Self {
        PageNumber((index / PAGE_SIZE) as u32 + 1)
    }

    pub fn get(self) -> u32 {
        self.0
    }

    /// Absolute index of the first row on this page.
    pub fn first_index(self) -> usize {
        (self.0 as usize - 1) * PAGE_SIZE
    }
}

impl fmt::Display for PageNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

fn unranked() -> i32 {
    -1
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Player {
    pub id: u64,
    pub username: String,
    #[serde(default = "unranked")]
    pub ladder_rank: i32,
    #[serde(default)]
    pub country: Option<String>,
}

/// A pending ladder game between the row's player and `player`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChallengeRecord {
    pub game_id: u64,
    pub player: Player,
}

/// Whether the viewer may challenge a row's player, and why not.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChallengeEligibility {
    pub challengeable: bool,
    #[serde(default)]
    pub reason_code: Option<u32>,
    #[serde(default)]
    pub reason: Option<String>,
    #[serde(default)]
    pub reason_parameter: Option<serde_json::Value>,
}

impl ChallengeEligibility {
    /// Human-readable explanation for a non-challengeable player.
    ///
    /// Known reason codes win over the free-form `reason` sent by the server.
    pub fn reason_text(&self) -> Option<String> {
        let known = match self.reason_code {
            Some(0x001) => Some("Can't challenge yourself".to_string()),
            Some(0x002) => Some("Player is a lower rank than you".to_string()),
            Some(0x003) => Some("Player is not in the ladder".to_string()),
            Some(0x004) => Some("Player's rank is too high".to_string()),
            Some(0x005) => {
                let number = match &self.reason_parameter {
                    Some(serde_json::Value::String(s)) => s.clone(),
                    Some(other) => other.to_string(),
                    None => "?".to_string(),
                };
                Some(format!("Already playing {} games you've initiated", number))
            }
            Some(0x006) => Some("Already playing a game against this person".to_string()),
            Some(0x007) => Some("Last challenge within 7 days".to_string()),
            Some(0x008) => Some("Player already has the maximum number of challenges".to_string()),
            _ => None,
        };
        known.or_else(|| self.reason.clone())
    }
}

/// One player's entry in the ladder.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RowRecord {
    #[serde(default = "unranked")]
    pub rank: i32,
    pub player: Player,
    #[serde(default)]
    pub outgoing_challenges: Vec<ChallengeRecord>,
    #[serde(default)]
    pub incoming_challenges: Vec<ChallengeRecord>,
    #[serde(default)]
    pub can_challenge: Option<ChallengeEligibility>,
}

/// Ladder-level metadata, fetched once per resolve.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RosterInfo {
    pub id: RosterHandle,
    pub name: String,
    pub size: usize,
    #[serde(default = "unranked")]
    pub player_rank: i32,
    #[serde(default)]
    pub group: Option<u64>,
    #[serde(default)]
    pub player_is_member_of_group: bool,
}

impl RosterInfo {
    /// The viewer's own rank, if they are on this ladder.
    pub fn caller_rank(&self) -> Option<u32> {
        (self.player_rank > 0).then_some(self.player_rank as u32)
    }

    /// Group ladders only accept members of the group.
    pub fn can_join_or_leave(&self) -> bool {
        self.group.is_none() || self.player_is_member_of_group
    }

    /// Last page with any rows, `None` for an empty ladder.
    pub fn last_page(&self) -> Option<PageNumber> {
        self.size.checked_sub(1).map(PageNumber::of)
    }
}

/// Failures surfaced by the data-access layer.
#[derive(Debug, Clone, PartialEq)]
pub enum LadderError {
    /// The request never produced a response.
    Network(String),
    /// The server answered with a non-success status.
    Http { status: u16 },
    /// The response body could not be decoded.
    Malformed(String),
    /// A page response carried more rows than fit in one page.
    OversizedPage { page: PageNumber, len: usize },
    /// The result belongs to a cache state that has since been invalidated.
    Cancelled,
}

impl LadderError {
    /// Stale results are expected under virtualization and must be dropped quietly.
    pub fn is_stale(&self) -> bool {
        matches!(self, LadderError::Cancelled)
    }
}

impl fmt::Display for LadderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LadderError::Network(msg) => write!(f, "Network request failed: {}", msg),
            LadderError::Http { status } => write!(f, "Server responded with status {}", status),
            LadderError::Malformed(msg) => write!(f, "Malformed response: {}", msg),
            LadderError::OversizedPage { page, len } => write!(
                f,
                "Page {} returned {} rows, more than the page size of {}",
                page, len, PAGE_SIZE
            ),
            LadderError::Cancelled => write!(f, "Request was cancelled by an invalidation"),
        }
    }
}

impl std::error::Error for LadderError {}

/// Push entry point for the host page's realtime socket.
///
/// Call this whenever the server announces `players-updated` on a ladder's
/// channel; every view showing that ladder invalidates its cache.
#[wasm_bindgen]
pub fn players_updated(ladder_id: u64) {
    live::notify(RosterHandle(ladder_id));
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn page_boundaries() {
        assert_eq!(PageNumber::of(0).get(), 1);
        assert_eq!(PageNumber::of(19).get(), 1);
        assert_eq!(PageNumber::of(20).get(), 2);
        assert_eq!(PageNumber::of(59).get(), 3);
        assert_eq!(PageNumber::of(45).first_index(), 40);
    }

    #[test]
    fn decodes_row_with_missing_optional_fields() {
        let row: RowRecord = serde_json::from_str(
            r#"{"rank": 3, "player": {"id": 7, "username": "kaya"}}"#,
        )
        .unwrap();
        assert_eq!(row.rank, 3);
        assert_eq!(row.player.ladder_rank, -1);
        assert!(row.incoming_challenges.is_empty());
        assert!(row.outgoing_challenges.is_empty());
        assert!(row.can_challenge.is_none());
    }

    #[test]
    fn reason_codes_map_to_text() {
        let eligibility = ChallengeEligibility {
            challengeable: false,
            reason_code: Some(0x005),
            reason: Some("server text".to_string()),
            reason_parameter: Some(serde_json::json!(3)),
        };
        assert_eq!(
            eligibility.reason_text().as_deref(),
            Some("Already playing 3 games you've initiated")
        );

        let free_form = ChallengeEligibility {
            challengeable: false,
            reason_code: None,
            reason: Some("server text".to_string()),
            reason_parameter: None,
        };
        assert_eq!(free_form.reason_text().as_deref(), Some("server text"));

        let silent = ChallengeEligibility {
            challengeable: true,
            reason_code: Some(0x042),
            reason: None,
            reason_parameter: None,
        };
        assert_eq!(silent.reason_text(), None);
    }

    #[test]
    fn roster_membership_helpers() {
        let mut info = RosterInfo {
            id: RosterHandle(4),
            name: "19x19".to_string(),
            size: 41,
            player_rank: -1,
            group: Some(12),
            player_is_member_of_group: false,
        };
        assert_eq!(info.caller_rank(), None);
        assert!(!info.can_join_or_leave());
        assert_eq!(info.last_page(), Some(PageNumber::of(40)));

        info.player_rank = 9;
        info.player_is_member_of_group = true;
        assert_eq!(info.caller_rank(), Some(9));
        assert!(info.can_join_or_leave());

        info.size = 0;
        assert_eq!(info.last_page(), None);
    }

    #[test]
    fn only_cancellation_is_stale() {
        assert!(LadderError::Cancelled.is_stale());
        assert!(!LadderError::Http { status: 502 }.is_stale());
        assert!(!LadderError::Network("offline".to_string()).is_stale());
    }
}
