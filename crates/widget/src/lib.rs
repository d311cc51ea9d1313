#![deny(unsafe_code)]

//! Headless core of the conversational intake widget.
//!
//! Rendering is left to the embedding shell: geometry flows in through
//! [`LayoutProvider`], notifications flow out as [`WidgetEvent`]s.

/// Conversation timeline, composer, scrolling and uploads.
pub mod chat;
/// Layered runtime configuration.
pub mod config;
pub mod layout;
/// Intake form validation and the session lifecycle.
pub mod session;
/// Settings menu navigation.
pub mod settings;
pub mod widget;

#[cfg(test)]
mod testing;

pub use chat::{
    BusyGuard, ConversationStore, InputComposer, Key, KeyInput, Message, MessageId,
    ScrollCoordinator, Sender, Timeline, UploadCoordinator, WidgetEvent,
};
pub use config::{ConfigStore, WidgetConfig};
pub use layout::{LayoutProvider, MeasuredLayout, Surface, SurfaceMetrics};
pub use session::{Field, SessionController, SessionStatus, ValidationErrors};
pub use settings::{MenuEvent, SettingsCategory, SettingsNavigator};
pub use widget::{
    IntakeWidget, SendOutcome, StartOutcome, UploadOutcome, WidgetError, WidgetState,
};
