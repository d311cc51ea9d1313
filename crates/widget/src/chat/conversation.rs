use intake_transport::{SendReply, SessionId, TransportResult};

use super::message::{MessageId, Sender, Timeline};

pub const SEND_FALLBACK_MESSAGE: &str = "Sorry, something went wrong.";

/// A send that passed its preconditions and is waiting on the transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingSend {
    pub session_id: SessionId,
    pub text: String,
    pub user_message_id: MessageId,
}

/// Owns the timeline and the current quick-reply set.
#[derive(Debug, Default)]
pub struct ConversationStore {
    timeline: Timeline,
    quick_replies: Vec<String>,
    loading: bool,
}

impl ConversationStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn timeline(&self) -> &Timeline {
        &self.timeline
    }

    pub fn quick_replies(&self) -> &[String] {
        &self.quick_replies
    }

    /// True while a send is in flight. This is the UI-level exclusion guard, not a lock.
    pub fn is_loading(&self) -> bool {
        self.loading
    }

    /// Optimistically appends the user's message and marks the store loading.
    ///
    /// Returns `None` without touching any state when there is no session, the
    /// trimmed text is empty, or another send is in flight.
    pub fn begin_send(&mut self, session_id: Option<&SessionId>, text: &str) -> Option<PendingSend> {
        let session_id = session_id?;
        let text = text.trim();
        if text.is_empty() || self.loading {
            return None;
        }

        let user_message_id = self.timeline.push(Sender::User, text);
        self.loading = true;

        Some(PendingSend {
            session_id: session_id.clone(),
            text: text.to_string(),
            user_message_id,
        })
    }

    /// Applies the transport result of the in-flight send and releases the guard.
    pub fn complete_send(&mut self, result: TransportResult<SendReply>) -> MessageId {
        let message_id = match result {
            Ok(reply) => {
                // Replaced wholesale; a missing list clears the previous suggestions.
                self.quick_replies = reply.quick_replies.unwrap_or_default();
                self.timeline.push(Sender::Bot, reply.bot_message)
            }
            Err(error) => {
                tracing::warn!(error = %error, "send failed; appending fallback reply");
                self.timeline.push(Sender::Bot, SEND_FALLBACK_MESSAGE)
            }
        };

        self.loading = false;
        message_id
    }

    /// Releases the send guard for a result that will never be applied.
    pub fn abandon_send(&mut self) {
        self.loading = false;
    }

    /// Appends a bot message produced outside a send turn (session start, uploads).
    pub fn push_bot(&mut self, text: impl Into<String>) -> MessageId {
        self.timeline.push(Sender::Bot, text)
    }
}
