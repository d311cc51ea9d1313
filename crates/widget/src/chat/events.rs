use intake_transport::SessionId;

use crate::session::ValidationErrors;

use super::message::{MessageId, Sender};

/// Which cooperative busy guard changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BusyGuard {
    Starting,
    Loading,
    Uploading,
}

/// Notifications for the embedding shell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WidgetEvent {
    MessageAppended { id: MessageId, sender: Sender },
    QuickRepliesChanged(Vec<String>),
    SessionStarted(SessionId),
    ValidationFailed(ValidationErrors),
    BusyChanged { guard: BusyGuard, busy: bool },
    /// New content needs layout; the shell must call `IntakeWidget::on_rendered` once painted.
    RenderRequested,
    MinimizedChanged(bool),
}
