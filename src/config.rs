//! Application-level configuration constants.

// Paging
/// Rows per page; shared by the fetch request and the response-to-index mapping.
pub const PAGE_SIZE: usize = 20;
pub const API_BASE: &str = "/api/v1/";

// Virtual window
pub const ROW_HEIGHT_PX: u32 = 120;
pub const OVERSCAN_ROWS: usize = 20;
pub const DEFAULT_VIEWPORT_PX: u32 = 960;

// UI Behavior
/// Quiet period after the last scroll event before the list counts as settled.
pub const SCROLL_SETTLE_MS: u32 = 150;
