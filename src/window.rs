//! Fixed-height virtual window arithmetic.

use std::ops::Range;

/// Rows intersecting the viewport.
pub fn visible_range(
    scroll_top: u32,
    viewport_height: u32,
    row_height: u32,
    row_count: usize,
) -> Range<usize> {
    if row_count == 0 || row_height == 0 || viewport_height == 0 {
        return 0..0;
    }
    let start = (scroll_top / row_height) as usize;
    let bottom = scroll_top as u64 + viewport_height as u64;
    let end = bottom.div_ceil(row_height as u64) as usize;
    start.min(row_count)..end.min(row_count)
}

/// Visible rows plus `overscan` rows on either side.
pub fn render_range(
    scroll_top: u32,
    viewport_height: u32,
    row_height: u32,
    row_count: usize,
    overscan: usize,
) -> Range<usize> {
    let visible = visible_range(scroll_top, viewport_height, row_height, row_count);
    if visible.is_empty() {
        return visible;
    }
    visible.start.saturating_sub(overscan)..(visible.end + overscan).min(row_count)
}

/// Number of recyclable slots needed to cover any render range.
pub fn slot_count(viewport_height: u32, row_height: u32, overscan: usize) -> usize {
    let per_viewport = if row_height == 0 {
        0
    } else {
        viewport_height.div_ceil(row_height) as usize
    };
    per_viewport + 1 + 2 * overscan
}

/// Slot that renders `index`. Contiguous ranges no longer than `slots` map to
/// distinct slots, so a slot is reused for a new index as the window moves.
pub fn slot_for(index: usize, slots: usize) -> usize {
    index % slots.max(1)
}

/// Pixel offset of a row's top edge.
pub fn offset_of(index: usize, row_height: u32) -> u64 {
    index as u64 * row_height as u64
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::collections::HashSet;

    #[test]
    fn visible_rows_cover_partial_rows() {
        assert_eq!(visible_range(0, 360, 120, 100), 0..3);
        assert_eq!(visible_range(60, 360, 120, 100), 0..4);
        assert_eq!(visible_range(240, 360, 120, 100), 2..5);
    }

    #[test]
    fn ranges_clamp_to_row_count() {
        assert_eq!(visible_range(0, 960, 120, 3), 0..3);
        assert_eq!(visible_range(12_000, 360, 120, 50), 50..50);
        assert_eq!(visible_range(0, 360, 120, 0), 0..0);
        assert_eq!(render_range(240, 360, 120, 6, 20), 0..6);
        assert_eq!(render_range(2_400, 360, 120, 100, 2), 18..25);
    }

    #[test]
    fn slots_are_unique_within_any_render_range() {
        let slots = slot_count(360, 120, 2);
        for scroll_top in (0..6_000).step_by(37) {
            let range = render_range(scroll_top, 360, 120, 1_000, 2);
            assert!(range.len() <= slots);
            let used: HashSet<usize> = range.clone().map(|i| slot_for(i, slots)).collect();
            assert_eq!(used.len(), range.len());
        }
    }

    #[test]
    fn offsets_scale_with_row_height() {
        assert_eq!(offset_of(0, 120), 0);
        assert_eq!(offset_of(7, 120), 840);
    }
}
