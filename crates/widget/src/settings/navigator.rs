use crate::layout::{LayoutProvider, Surface};

use super::category::SettingsCategory;

/// Distance from either list edge inside which pointer movement scrolls the list.
pub const EDGE_SCROLL_BAND: f32 = 20.0;
/// Scroll distance applied per qualifying pointer move.
pub const EDGE_SCROLL_STEP: f32 = 12.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuEvent {
    /// Menu trigger; `entry` is the category the user opened it from, if any.
    Toggle { entry: Option<SettingsCategory> },
    Hover(SettingsCategory),
    Focus(SettingsCategory),
    Dismiss,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MenuState {
    pub open: bool,
    pub active: SettingsCategory,
}

impl MenuState {
    /// Applies one event to the open/active pair.
    ///
    /// Hover and focus only select while the menu is open; closing keeps the
    /// last active category so the flyout anchor stays defined.
    pub fn transition(self, event: MenuEvent) -> Self {
        match (self.open, event) {
            (false, MenuEvent::Toggle { entry }) => Self {
                open: true,
                active: entry.unwrap_or_default(),
            },
            (true, MenuEvent::Toggle { .. }) | (_, MenuEvent::Dismiss) => Self {
                open: false,
                ..self
            },
            (true, MenuEvent::Hover(category) | MenuEvent::Focus(category)) => Self {
                open: true,
                active: category,
            },
            (false, MenuEvent::Hover(_) | MenuEvent::Focus(_)) => self,
        }
    }
}

/// Owns the settings menu state and keeps the flyout pinned to the active row.
#[derive(Debug, Default)]
pub struct SettingsNavigator {
    state: MenuState,
    flyout_offset: f32,
}

impl SettingsNavigator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> MenuState {
        self.state
    }

    pub fn is_open(&self) -> bool {
        self.state.open
    }

    pub fn active_category(&self) -> SettingsCategory {
        self.state.active
    }

    pub fn flyout_offset(&self) -> f32 {
        self.flyout_offset
    }

    /// Returns true when the event changed the open flag or the active category.
    pub fn dispatch(&mut self, event: MenuEvent, layout: &dyn LayoutProvider) -> bool {
        let next = self.state.transition(event);
        let changed = next != self.state;
        if changed {
            tracing::debug!(
                ?event,
                open = next.open,
                active = ?next.active,
                "settings menu transition"
            );
        }
        self.state = next;
        // The list may have scrolled since the last event, so recompute even when unchanged.
        self.recompute_offset(layout);
        changed
    }

    /// Call after the root list scrolled for any reason (wheel, keyboard, scrollbar).
    pub fn on_list_scroll(&mut self, layout: &dyn LayoutProvider) {
        self.recompute_offset(layout);
    }

    /// Edge-hover auto-scroll. `pointer_y` is relative to the top of the list viewport.
    ///
    /// Returns the distance actually scrolled; zero when the pointer is outside
    /// the edge bands, outside the list, the menu is closed, or the list is
    /// already at that edge.
    pub fn on_pointer_move(&mut self, pointer_y: f32, layout: &dyn LayoutProvider) -> f32 {
        if !self.state.open {
            return 0.0;
        }

        let viewport = layout.viewport_height(Surface::SettingsList);
        if pointer_y < 0.0 || pointer_y > viewport {
            return 0.0;
        }

        let step = if pointer_y <= EDGE_SCROLL_BAND {
            -EDGE_SCROLL_STEP
        } else if pointer_y >= viewport - EDGE_SCROLL_BAND {
            EDGE_SCROLL_STEP
        } else {
            return 0.0;
        };

        let current = layout.scroll_top(Surface::SettingsList);
        let target = (current + step).clamp(0.0, layout.max_scroll_top(Surface::SettingsList));
        if target != current {
            layout.set_scroll_top(Surface::SettingsList, target);
        }

        self.recompute_offset(layout);
        target - current
    }

    fn recompute_offset(&mut self, layout: &dyn LayoutProvider) {
        self.flyout_offset =
            layout.top_offset_of(self.state.active) - layout.scroll_top(Surface::SettingsList);
    }
}
