use std::cell::RefCell;
use std::collections::HashMap;

use crate::settings::SettingsCategory;

/// Scrollable regions the widget coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Surface {
    /// The message timeline.
    Timeline,
    /// The root list of the settings menu.
    SettingsList,
}

/// Read/write access to the rendered geometry.
///
/// Implementations use interior mutability for `set_scroll_top`; the widget
/// only ever holds a shared reference.
pub trait LayoutProvider {
    fn scroll_top(&self, surface: Surface) -> f32;
    fn set_scroll_top(&self, surface: Surface, value: f32);
    fn viewport_height(&self, surface: Surface) -> f32;
    fn scroll_height(&self, surface: Surface) -> f32;
    /// Top edge of a category row, measured from the top of the scrollable list content.
    fn top_offset_of(&self, category: SettingsCategory) -> f32;

    fn max_scroll_top(&self, surface: Surface) -> f32 {
        (self.scroll_height(surface) - self.viewport_height(surface)).max(0.0)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SurfaceMetrics {
    pub scroll_top: f32,
    pub viewport_height: f32,
    pub scroll_height: f32,
}

impl SurfaceMetrics {
    pub fn new(viewport_height: f32, scroll_height: f32) -> Self {
        Self {
            scroll_top: 0.0,
            viewport_height,
            scroll_height,
        }
    }
}

/// Layout provider backed by measurements pushed in by the embedding shell.
///
/// Scroll writes are clamped to the measured range, mirroring what a real
/// scroll container does.
#[derive(Debug, Default)]
pub struct MeasuredLayout {
    surfaces: RefCell<HashMap<Surface, SurfaceMetrics>>,
    rows: RefCell<HashMap<SettingsCategory, f32>>,
}

impl MeasuredLayout {
    pub fn new() -> Self {
        Self::default()
    }

    /// Lays the settings rows out one after another with a fixed row height.
    pub fn with_uniform_rows(self, row_height: f32) -> Self {
        for (index, category) in SettingsCategory::ALL.iter().enumerate() {
            self.set_row_offset(*category, index as f32 * row_height);
        }
        self
    }

    pub fn with_surface(self, surface: Surface, metrics: SurfaceMetrics) -> Self {
        self.set_metrics(surface, metrics);
        self
    }

    pub fn set_metrics(&self, surface: Surface, metrics: SurfaceMetrics) {
        self.surfaces.borrow_mut().insert(surface, metrics);
    }

    pub fn metrics(&self, surface: Surface) -> SurfaceMetrics {
        self.surfaces
            .borrow()
            .get(&surface)
            .copied()
            .unwrap_or_default()
    }

    /// Updates content height, e.g. after new messages were laid out.
    pub fn set_scroll_height(&self, surface: Surface, scroll_height: f32) {
        let mut surfaces = self.surfaces.borrow_mut();
        let metrics = surfaces.entry(surface).or_default();
        metrics.scroll_height = scroll_height;
    }

    pub fn set_row_offset(&self, category: SettingsCategory, top: f32) {
        self.rows.borrow_mut().insert(category, top);
    }
}

impl LayoutProvider for MeasuredLayout {
    fn scroll_top(&self, surface: Surface) -> f32 {
        self.metrics(surface).scroll_top
    }

    fn set_scroll_top(&self, surface: Surface, value: f32) {
        let max = self.max_scroll_top(surface);
        let mut surfaces = self.surfaces.borrow_mut();
        let metrics = surfaces.entry(surface).or_default();
        metrics.scroll_top = value.clamp(0.0, max);
    }

    fn viewport_height(&self, surface: Surface) -> f32 {
        self.metrics(surface).viewport_height
    }

    fn scroll_height(&self, surface: Surface) -> f32 {
        self.metrics(surface).scroll_height
    }

    fn top_offset_of(&self, category: SettingsCategory) -> f32 {
        self.rows.borrow().get(&category).copied().unwrap_or(0.0)
    }
}
