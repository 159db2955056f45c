/// Maps a scrollbar fraction to a buffered window of visible rows, for
/// virtualized table widgets that only materialize what is on screen.
///
/// The window extends one screenful above the anchored top row and two below
/// it, so small scroll movements stay inside already-loaded rows.
#[derive(Debug, Clone)]
pub struct ScrollWindow {
    total_rows: u64,
    visible_rows: u64,
    current_top: u64,
    buffer_rows: u64,
}

impl ScrollWindow {
    pub fn new(total_rows: u64, visible_rows: u64) -> Self {
        let visible_rows = visible_rows.max(1);
        Self {
            total_rows,
            visible_rows,
            current_top: 0,
            buffer_rows: visible_rows.saturating_mul(2),
        }
    }

    pub fn current_top(&self) -> u64 {
        self.current_top
    }

    /// Anchor the top row at `scroll_position` (a `0.0..=1.0` fraction,
    /// clamped) and return the half-open `[start, end)` row range to
    /// materialize.
    pub fn visible_range(&mut self, scroll_position: f64) -> (u64, u64) {
        self.current_top = self.top_for(scroll_position);
        let start = self.current_top.saturating_sub(self.visible_rows);
        let end = self
            .current_top
            .saturating_add(self.buffer_rows)
            .min(self.total_rows);
        (start, end)
    }

    /// Whether scrolling to `new_position` moves the top row far enough
    /// (more than `visible_rows * threshold`) to warrant re-materializing.
    pub fn needs_update(&self, new_position: f64, threshold: f64) -> bool {
        let new_top = self.top_for(new_position);
        new_top.abs_diff(self.current_top) as f64 > self.visible_rows as f64 * threshold
    }

    fn top_for(&self, scroll_position: f64) -> u64 {
        let fraction = if scroll_position.is_finite() {
            scroll_position.clamp(0.0, 1.0)
        } else {
            0.0
        };
        let scrollable = self.total_rows.saturating_sub(self.visible_rows);
        (fraction * scrollable as f64) as u64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn top_of_scroll_starts_at_zero() {
        let mut window = ScrollWindow::new(1_000, 20);
        let (start, end) = window.visible_range(0.0);
        assert_eq!(start, 0);
        assert_eq!(end, 40);
    }

    #[test]
    fn bottom_of_scroll_clamps_to_total() {
        let mut window = ScrollWindow::new(1_000, 20);
        let (start, end) = window.visible_range(1.0);
        assert_eq!(window.current_top(), 980);
        assert_eq!(start, 960);
        assert_eq!(end, 1_000);
    }

    #[test]
    fn out_of_range_positions_are_clamped() {
        let mut window = ScrollWindow::new(1_000, 20);
        assert_eq!(window.visible_range(-0.5), window.visible_range(0.0));
        assert_eq!(window.visible_range(2.0), window.visible_range(1.0));
    }

    #[test]
    fn short_relations_fit_in_one_window() {
        let mut window = ScrollWindow::new(10, 20);
        let (start, end) = window.visible_range(0.7);
        assert_eq!((start, end), (0, 10));
    }

    #[test]
    fn needs_update_uses_the_movement_threshold() {
        let mut window = ScrollWindow::new(1_000, 20);
        window.visible_range(0.5);
        assert!(!window.needs_update(0.5, 0.1));
        // Two rows of movement is within a 0.1 * 20-row threshold...
        assert!(!window.needs_update(0.502, 0.1));
        // ...a hundred rows is not.
        assert!(window.needs_update(0.6, 0.1));
    }
}
