pub mod conversation;
/// Event contracts between the widget and its shell.
pub mod events;
/// Timeline entities.
pub mod message;
pub mod message_input;
pub mod scroll;
pub mod upload;

pub use conversation::{ConversationStore, PendingSend, SEND_FALLBACK_MESSAGE};
pub use events::{BusyGuard, WidgetEvent};
pub use message::{Message, MessageId, Sender, Timeline};
pub use message_input::{ComposerAction, InputComposer, Key, KeyInput};
pub use scroll::{BOTTOM_TOLERANCE, ScrollCoordinator};
pub use upload::{PendingUpload, UPLOAD_FALLBACK_MESSAGE, UploadCoordinator};
