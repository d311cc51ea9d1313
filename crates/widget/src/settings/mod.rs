pub mod category;
pub mod navigator;

pub use category::{CategoryGroup, SettingsCategory};
pub use navigator::{EDGE_SCROLL_BAND, EDGE_SCROLL_STEP, MenuEvent, MenuState, SettingsNavigator};
