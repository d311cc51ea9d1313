/// Entries of the settings menu's root list, in display order.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum SettingsCategory {
    #[default]
    Language,
    Appearance,
    TextSize,
    Notifications,
    Sounds,
    Privacy,
    Help,
    About,
}

/// Visual clusters of the root list. Display only; every category is a sibling
/// as far as navigation is concerned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CategoryGroup {
    Preferences,
    Alerts,
    Support,
}

impl SettingsCategory {
    pub const ALL: [SettingsCategory; 8] = [
        Self::Language,
        Self::Appearance,
        Self::TextSize,
        Self::Notifications,
        Self::Sounds,
        Self::Privacy,
        Self::Help,
        Self::About,
    ];

    pub fn group(self) -> CategoryGroup {
        match self {
            Self::Language | Self::Appearance | Self::TextSize => CategoryGroup::Preferences,
            Self::Notifications | Self::Sounds => CategoryGroup::Alerts,
            Self::Privacy | Self::Help | Self::About => CategoryGroup::Support,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Language => "Language",
            Self::Appearance => "Appearance",
            Self::TextSize => "Text size",
            Self::Notifications => "Notifications",
            Self::Sounds => "Sounds",
            Self::Privacy => "Privacy",
            Self::Help => "Help",
            Self::About => "About",
        }
    }
}
