use crate::layout::{LayoutProvider, Surface};

/// Distance from the bottom still treated as "at the bottom".
pub const BOTTOM_TOLERANCE: f32 = 10.0;

/// Pure form of the at-bottom rule, shared by every recompute path.
pub fn is_at_bottom(scroll_top: f32, viewport_height: f32, scroll_height: f32) -> bool {
    scroll_top + viewport_height >= scroll_height - BOTTOM_TOLERANCE
}

/// Timeline auto-scroll and scroll-to-bottom affordance.
///
/// Appends only *schedule* a bottom jump; the jump itself runs from the
/// post-render callback so it sees the height of the new content.
#[derive(Debug)]
pub struct ScrollCoordinator {
    pending_auto_scroll: bool,
    at_bottom: bool,
    affordance_visible: bool,
    observed_len: usize,
}

impl ScrollCoordinator {
    pub fn new() -> Self {
        Self {
            pending_auto_scroll: false,
            at_bottom: true,
            affordance_visible: false,
            observed_len: 0,
        }
    }

    pub fn is_at_bottom(&self) -> bool {
        self.at_bottom
    }

    pub fn is_affordance_visible(&self) -> bool {
        self.affordance_visible
    }

    pub fn has_pending_scroll(&self) -> bool {
        self.pending_auto_scroll
    }

    /// Schedules an auto-scroll when the timeline grew since the last observation.
    pub fn observe_timeline(&mut self, len: usize) -> bool {
        let grew = len > self.observed_len;
        self.observed_len = len;
        if grew {
            self.pending_auto_scroll = true;
        }
        grew
    }

    /// Post-render pass. Returns true when a scheduled jump was applied.
    pub fn apply_pending_scroll(&mut self, layout: &dyn LayoutProvider) -> bool {
        if !self.pending_auto_scroll {
            return false;
        }

        self.pending_auto_scroll = false;
        self.jump_to_bottom(layout);
        true
    }

    /// Explicit user request from the affordance.
    pub fn scroll_to_bottom(&mut self, layout: &dyn LayoutProvider) {
        self.jump_to_bottom(layout);
    }

    pub fn on_manual_scroll(&mut self, layout: &dyn LayoutProvider) {
        self.at_bottom = is_at_bottom(
            layout.scroll_top(Surface::Timeline),
            layout.viewport_height(Surface::Timeline),
            layout.scroll_height(Surface::Timeline),
        );
        self.affordance_visible = !self.at_bottom;
    }

    fn jump_to_bottom(&mut self, layout: &dyn LayoutProvider) {
        layout.set_scroll_top(Surface::Timeline, layout.max_scroll_top(Surface::Timeline));
        self.at_bottom = true;
        self.affordance_visible = false;
    }
}

impl Default for ScrollCoordinator {
    fn default() -> Self {
        Self::new()
    }
}
