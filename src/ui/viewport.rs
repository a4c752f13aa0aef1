//! Scroll and selection state for a canvas larger than its visible area.

use std::ops::Range;

use ratatui::layout::Rect;

/// Scroll/selection bookkeeping layered on one canvas.
///
/// Invariant: `0 <= top_offset <= max_offset`, where
/// `max_offset = max(content_rows - visible_rows, 0)`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Viewport {
    top_offset: usize,
    max_offset: usize,
    visible_rows: usize,
    selected_row: Option<usize>,
}

impl Viewport {
    pub fn new() -> Self {
        Self::default()
    }

    /// First visible content row.
    pub fn top_offset(&self) -> usize {
        self.top_offset
    }

    /// Largest allowed `top_offset` for the current content.
    pub fn max_offset(&self) -> usize {
        self.max_offset
    }

    pub fn visible_rows(&self) -> usize {
        self.visible_rows
    }

    /// Selected row as an index into the visible rows, if rendered yet.
    pub fn selected_row(&self) -> Option<usize> {
        self.selected_row
    }

    pub fn scroll_up(&mut self) {
        self.top_offset = self.top_offset.saturating_sub(1);
    }

    pub fn scroll_down(&mut self) {
        self.top_offset = (self.top_offset + 1).min(self.max_offset);
    }

    /// Recompute the scroll bound for new content, clamping the offset when
    /// the content shrank.
    pub fn recompute_bounds(&mut self, content_rows: usize, visible_rows: usize) {
        self.visible_rows = visible_rows;
        self.max_offset = content_rows.saturating_sub(visible_rows);
        if self.top_offset > self.max_offset {
            self.top_offset = self.max_offset;
        }
    }

    /// Content rows `[top_offset, top_offset + visible_rows)`.
    pub fn visible_range(&self) -> Range<usize> {
        self.top_offset..self.top_offset + self.visible_rows
    }

    /// Mark the viewport as rendered, defaulting the selection to the first
    /// visible row. Returns the selected visible index.
    pub fn select_default(&mut self) -> usize {
        *self.selected_row.get_or_insert(0)
    }

    /// Source rectangle of the canvas to show for a given width.
    pub fn source_rect(&self, width: u16) -> Rect {
        let to_u16 = |v: usize| u16::try_from(v).unwrap_or(u16::MAX);
        Rect::new(0, to_u16(self.top_offset), width, to_u16(self.visible_rows))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_initial_state() {
        let vp = Viewport::new();
        assert_eq!(vp.top_offset(), 0);
        assert_eq!(vp.max_offset(), 0);
        assert_eq!(vp.selected_row(), None);
    }

    #[test]
    fn test_select_default_is_first_row() {
        let mut vp = Viewport::new();
        assert_eq!(vp.select_default(), 0);
        assert_eq!(vp.selected_row(), Some(0));
    }

    #[test]
    fn test_scroll_is_noop_at_bounds() {
        let mut vp = Viewport::new();
        vp.recompute_bounds(12, 10);
        vp.scroll_up();
        assert_eq!(vp.top_offset(), 0);

        vp.scroll_down();
        vp.scroll_down();
        assert_eq!(vp.top_offset(), 2);
        vp.scroll_down();
        assert_eq!(vp.top_offset(), 2);
    }

    #[test]
    fn test_content_shorter_than_view() {
        let mut vp = Viewport::new();
        vp.recompute_bounds(3, 10);
        assert_eq!(vp.max_offset(), 0);
        vp.scroll_down();
        assert_eq!(vp.top_offset(), 0);
        assert_eq!(vp.visible_range(), 0..10);
    }

    #[test]
    fn test_shrinking_content_scenario() {
        // 30 queues, 10 visible rows.
        let mut vp = Viewport::new();
        vp.recompute_bounds(30, 10);
        assert_eq!(vp.max_offset(), 20);

        for _ in 0..5 {
            vp.scroll_down();
        }
        assert_eq!(vp.top_offset(), 5);

        // Two queues deleted between polls.
        vp.recompute_bounds(28, 10);
        assert_eq!(vp.max_offset(), 18);
        assert_eq!(vp.top_offset(), 5);
        assert_eq!(vp.visible_range(), 5..15);
    }

    #[test]
    fn test_clamp_when_content_drops_below_offset() {
        let mut vp = Viewport::new();
        vp.recompute_bounds(30, 10);
        for _ in 0..20 {
            vp.scroll_down();
        }
        vp.recompute_bounds(12, 10);
        assert_eq!(vp.top_offset(), 2);
        vp.recompute_bounds(0, 10);
        assert_eq!(vp.top_offset(), 0);
    }

    #[test]
    fn test_source_rect() {
        let mut vp = Viewport::new();
        vp.recompute_bounds(50, 8);
        vp.scroll_down();
        assert_eq!(vp.source_rect(80), Rect::new(0, 1, 80, 8));
    }

    #[derive(Debug, Clone)]
    enum Op {
        Up,
        Down,
        Bounds(usize, usize),
    }

    fn op_strategy() -> impl Strategy<Value = Op> {
        prop_oneof![
            Just(Op::Up),
            Just(Op::Down),
            (0usize..200, 1usize..60).prop_map(|(c, v)| Op::Bounds(c, v)),
        ]
    }

    proptest! {
        #[test]
        fn prop_offset_stays_in_bounds(
            content in 0usize..200,
            visible in 1usize..60,
            ops in proptest::collection::vec(op_strategy(), 0..100),
        ) {
            let mut vp = Viewport::new();
            vp.recompute_bounds(content, visible);
            prop_assert_eq!(vp.max_offset(), content.saturating_sub(visible));

            for op in ops {
                match op {
                    Op::Up => vp.scroll_up(),
                    Op::Down => vp.scroll_down(),
                    Op::Bounds(c, v) => {
                        vp.recompute_bounds(c, v);
                        prop_assert_eq!(vp.max_offset(), c.saturating_sub(v));
                    }
                }
                prop_assert!(vp.top_offset() <= vp.max_offset());
            }
        }
    }
}
