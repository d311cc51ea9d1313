use std::cell::{Cell, Ref, RefCell};
use std::rc::Rc;
use std::sync::Arc;

use intake_transport::{IntakeTransport, SessionId, TransportError, UploadFile, create_transport};
use snafu::{ResultExt, Snafu};
use tokio::sync::mpsc;

use crate::chat::{
    BusyGuard, ComposerAction, ConversationStore, InputComposer, KeyInput, MessageId,
    PendingUpload, ScrollCoordinator, Sender, UploadCoordinator, WidgetEvent,
};
use crate::config::WidgetConfig;
use crate::layout::LayoutProvider;
use crate::session::{SessionController, StartAttempt, ValidationErrors};
use crate::settings::{MenuEvent, SettingsNavigator};

#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum WidgetError {
    #[snafu(display("failed to create transport on `{stage}`: {source}"))]
    CreateTransport {
        stage: &'static str,
        source: TransportError,
    },
}

/// The single owned state aggregate. Each field is one component's slice.
#[derive(Debug, Default)]
pub struct WidgetState {
    pub session: SessionController,
    pub conversation: ConversationStore,
    pub scroll: ScrollCoordinator,
    pub settings: SettingsNavigator,
    pub upload: UploadCoordinator,
    pub composer: InputComposer,
    minimized: bool,
}

impl WidgetState {
    pub fn is_minimized(&self) -> bool {
        self.minimized
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StartOutcome {
    Ignored,
    Invalid(ValidationErrors),
    Started(SessionId),
    Failed,
    /// The widget was unmounted before the transport answered.
    Discarded,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SendOutcome {
    Ignored,
    Replied,
    Failed,
    Discarded,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadOutcome {
    Ignored,
    Uploaded,
    Failed,
    Discarded,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SendOrigin {
    Composer,
    QuickReply,
}

/// Headless intake widget.
///
/// Single-threaded: state lives in a `RefCell` and no borrow is held across an
/// `.await`, so the three transport calls are the only suspension points. The
/// busy flags are cooperative guards checked at the start of each operation;
/// overlapping calls are ignored, never queued.
pub struct IntakeWidget {
    state: RefCell<WidgetState>,
    transport: Arc<dyn IntakeTransport>,
    layout: Rc<dyn LayoutProvider>,
    mounted: Cell<bool>,
    subscribers: RefCell<Vec<mpsc::UnboundedSender<WidgetEvent>>>,
}

impl IntakeWidget {
    pub fn mount(transport: Arc<dyn IntakeTransport>, layout: Rc<dyn LayoutProvider>) -> Self {
        tracing::debug!(transport = transport.id(), "mounting intake widget");
        Self {
            state: RefCell::new(WidgetState::default()),
            transport,
            layout,
            mounted: Cell::new(true),
            subscribers: RefCell::new(Vec::new()),
        }
    }

    pub fn from_config(
        config: &WidgetConfig,
        layout: Rc<dyn LayoutProvider>,
    ) -> Result<Self, WidgetError> {
        let transport = create_transport(config.to_transport_config()).context(
            CreateTransportSnafu {
                stage: "widget-from-config",
            },
        )?;
        Ok(Self::mount(transport, layout))
    }

    /// Detaches the widget. New operations are ignored and results still in flight
    /// are dropped when they arrive.
    pub fn unmount(&self) {
        if self.mounted.replace(false) {
            tracing::debug!("unmounted intake widget");
        }
        self.subscribers.borrow_mut().clear();
    }

    pub fn is_mounted(&self) -> bool {
        self.mounted.get()
    }

    pub fn subscribe(&self) -> mpsc::UnboundedReceiver<WidgetEvent> {
        let (event_tx, event_rx) = mpsc::unbounded_channel();
        self.subscribers.borrow_mut().push(event_tx);
        event_rx
    }

    /// Read-only view of every component. Drop the guard before calling an operation.
    pub fn state(&self) -> Ref<'_, WidgetState> {
        self.state.borrow()
    }

    /// Collapses or expands the display. Conversation, session and menu state are untouched.
    pub fn toggle_minimized(&self) -> bool {
        let minimized = {
            let mut state = self.state.borrow_mut();
            state.minimized = !state.minimized;
            state.minimized
        };
        self.emit(WidgetEvent::MinimizedChanged(minimized));
        minimized
    }

    pub async fn start(&self, name: &str, email: &str, phone: &str) -> StartOutcome {
        if !self.accepts_operations("start-session") {
            return StartOutcome::Ignored;
        }
        let attempt = self.state.borrow_mut().session.begin_start(name, email, phone);
        let request = match attempt {
            StartAttempt::Ignored => return StartOutcome::Ignored,
            StartAttempt::Invalid(errors) => {
                self.emit(WidgetEvent::ValidationFailed(errors.clone()));
                return StartOutcome::Invalid(errors);
            }
            StartAttempt::Ready(request) => request,
        };

        self.emit(WidgetEvent::BusyChanged {
            guard: BusyGuard::Starting,
            busy: true,
        });
        let result = self.transport.start_session(request).await;
        if !self.still_mounted("start-session") {
            self.state.borrow_mut().session.abandon_start();
            return StartOutcome::Discarded;
        }

        let (message, session_id) = {
            let mut state = self.state.borrow_mut();
            let message = state.session.complete_start(result);
            (message, state.session.session_id().cloned())
        };
        self.append_bot(message);
        if let Some(session_id) = &session_id {
            self.emit(WidgetEvent::SessionStarted(session_id.clone()));
        }
        self.emit(WidgetEvent::BusyChanged {
            guard: BusyGuard::Starting,
            busy: false,
        });

        match session_id {
            Some(session_id) => StartOutcome::Started(session_id),
            None => StartOutcome::Failed,
        }
    }

    pub fn set_draft(&self, text: impl Into<String>) {
        self.state.borrow_mut().composer.set_text(text);
    }

    pub fn insert_emoji(&self, glyph: &str) {
        self.state.borrow_mut().composer.insert_emoji(glyph);
    }

    pub fn toggle_emoji_picker(&self) {
        self.state.borrow_mut().composer.toggle_emoji_picker();
    }

    /// Whether the send trigger is enabled.
    pub fn can_send(&self) -> bool {
        let state = self.state.borrow();
        state.composer.can_send(state.conversation.is_loading())
    }

    /// Sends the compose buffer; the buffer is cleared right after the optimistic append.
    pub async fn submit_composer(&self) -> SendOutcome {
        let text = self.state.borrow().composer.text().to_string();
        self.send_text(&text, SendOrigin::Composer).await
    }

    /// Sends a quick reply exactly as if its text had been typed, leaving the draft alone.
    pub async fn send_quick_reply(&self, reply: &str) -> SendOutcome {
        self.send_text(reply, SendOrigin::QuickReply).await
    }

    pub async fn on_composer_key(&self, input: KeyInput) -> SendOutcome {
        let action = {
            let mut state = self.state.borrow_mut();
            let loading = state.conversation.is_loading();
            state.composer.on_key(input, loading)
        };

        match action {
            ComposerAction::Commit => self.submit_composer().await,
            ComposerAction::None => SendOutcome::Ignored,
        }
    }

    pub async fn upload(&self, file: Option<UploadFile>) -> UploadOutcome {
        if !self.accepts_operations("upload-document") {
            return UploadOutcome::Ignored;
        }
        let pending = {
            let mut state = self.state.borrow_mut();
            let WidgetState {
                session, upload, ..
            } = &mut *state;
            upload.begin_upload(session.session_id(), file)
        };
        let Some(PendingUpload { session_id, file }) = pending else {
            tracing::debug!("upload ignored");
            return UploadOutcome::Ignored;
        };

        self.emit(WidgetEvent::BusyChanged {
            guard: BusyGuard::Uploading,
            busy: true,
        });
        let result = self.transport.upload_document(&session_id, file).await;
        if !self.still_mounted("upload-document") {
            self.state.borrow_mut().upload.abandon_upload();
            return UploadOutcome::Discarded;
        }

        let outcome = if result.is_ok() {
            UploadOutcome::Uploaded
        } else {
            UploadOutcome::Failed
        };
        let message = self.state.borrow_mut().upload.complete_upload(result);
        self.append_bot(message);
        self.emit(WidgetEvent::BusyChanged {
            guard: BusyGuard::Uploading,
            busy: false,
        });
        outcome
    }

    /// Post-render callback: runs the bottom jump scheduled by the latest appends.
    pub fn on_rendered(&self) -> bool {
        self.state
            .borrow_mut()
            .scroll
            .apply_pending_scroll(&*self.layout)
    }

    pub fn on_timeline_scroll(&self) {
        self.state.borrow_mut().scroll.on_manual_scroll(&*self.layout);
    }

    pub fn scroll_to_bottom(&self) {
        self.state.borrow_mut().scroll.scroll_to_bottom(&*self.layout);
    }

    pub fn dispatch_menu(&self, event: MenuEvent) -> bool {
        self.state
            .borrow_mut()
            .settings
            .dispatch(event, &*self.layout)
    }

    pub fn on_menu_pointer_move(&self, pointer_y: f32) -> f32 {
        self.state
            .borrow_mut()
            .settings
            .on_pointer_move(pointer_y, &*self.layout)
    }

    pub fn on_menu_scroll(&self) {
        self.state
            .borrow_mut()
            .settings
            .on_list_scroll(&*self.layout);
    }

    async fn send_text(&self, text: &str, origin: SendOrigin) -> SendOutcome {
        if !self.accepts_operations("send-message") {
            return SendOutcome::Ignored;
        }
        let pending = {
            let mut state = self.state.borrow_mut();
            let WidgetState {
                session,
                conversation,
                composer,
                ..
            } = &mut *state;
            let pending = conversation.begin_send(session.session_id(), text);
            if pending.is_some() && origin == SendOrigin::Composer {
                composer.clear();
            }
            pending
        };
        let Some(pending) = pending else {
            tracing::debug!(?origin, "send ignored");
            return SendOutcome::Ignored;
        };

        self.emit(WidgetEvent::MessageAppended {
            id: pending.user_message_id,
            sender: Sender::User,
        });
        self.sync_timeline();
        self.emit(WidgetEvent::BusyChanged {
            guard: BusyGuard::Loading,
            busy: true,
        });

        let result = self
            .transport
            .send_message(&pending.session_id, &pending.text)
            .await;
        if !self.still_mounted("send-message") {
            self.state.borrow_mut().conversation.abandon_send();
            return SendOutcome::Discarded;
        }

        let outcome = if result.is_ok() {
            SendOutcome::Replied
        } else {
            SendOutcome::Failed
        };
        let (message_id, quick_replies) = {
            let mut state = self.state.borrow_mut();
            let before = state.conversation.quick_replies().to_vec();
            let message_id = state.conversation.complete_send(result);
            let after = state.conversation.quick_replies();
            let changed = (before.as_slice() != after).then(|| after.to_vec());
            (message_id, changed)
        };

        self.emit(WidgetEvent::MessageAppended {
            id: message_id,
            sender: Sender::Bot,
        });
        self.sync_timeline();
        if let Some(quick_replies) = quick_replies {
            self.emit(WidgetEvent::QuickRepliesChanged(quick_replies));
        }
        self.emit(WidgetEvent::BusyChanged {
            guard: BusyGuard::Loading,
            busy: false,
        });
        outcome
    }

    fn append_bot(&self, text: String) -> MessageId {
        let id = self.state.borrow_mut().conversation.push_bot(text);
        self.emit(WidgetEvent::MessageAppended {
            id,
            sender: Sender::Bot,
        });
        self.sync_timeline();
        id
    }

    /// Every timeline mutation funnels through here so the auto-scroll pass is never skipped.
    fn sync_timeline(&self) {
        let scheduled = {
            let mut state = self.state.borrow_mut();
            let len = state.conversation.timeline().len();
            state.scroll.observe_timeline(len)
        };
        if scheduled {
            self.emit(WidgetEvent::RenderRequested);
        }
    }

    fn accepts_operations(&self, operation: &'static str) -> bool {
        let mounted = self.mounted.get();
        if !mounted {
            tracing::debug!(operation, "ignoring operation on unmounted widget");
        }
        mounted
    }

    /// Late results are dropped; the caller releases its busy guard without appending.
    fn still_mounted(&self, operation: &'static str) -> bool {
        let mounted = self.mounted.get();
        if !mounted {
            tracing::debug!(operation, "discarding transport result for unmounted widget");
        }
        mounted
    }

    fn emit(&self, event: WidgetEvent) {
        self.subscribers
            .borrow_mut()
            .retain(|event_tx| event_tx.send(event.clone()).is_ok());
    }
}

#[cfg(test)]
mod tests {
    use std::rc::Rc;
    use std::sync::Arc;

    use intake_transport::{SendReply, StartReply, UploadAck};
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::chat::{Key, SEND_FALLBACK_MESSAGE, UPLOAD_FALLBACK_MESSAGE};
    use crate::layout::{MeasuredLayout, Surface};
    use crate::session::{EMAIL_INVALID, Field, SessionStatus, START_FALLBACK_MESSAGE};
    use crate::settings::SettingsCategory;
    use crate::testing::{Call, ScriptedTransport, failure, widget_layout};

    const NAME: &str = "Jane Doe";
    const EMAIL: &str = "jane@x.com";
    const PHONE: &str = "+1 555-123-4567";

    struct Harness {
        widget: IntakeWidget,
        transport: Arc<ScriptedTransport>,
        layout: Rc<MeasuredLayout>,
    }

    fn harness() -> Harness {
        let transport = Arc::new(ScriptedTransport::new());
        let layout = Rc::new(widget_layout());
        let widget = IntakeWidget::mount(transport.clone(), layout.clone());
        Harness {
            widget,
            transport,
            layout,
        }
    }

    fn welcome(session_id: &str) -> StartReply {
        StartReply {
            session_id: SessionId::new(session_id),
            bot_message: "Hi! Welcome to the Study Abroad Intake.".to_string(),
        }
    }

    async fn started() -> Harness {
        let harness = harness();
        harness.transport.push_start(Ok(welcome("session-1")));
        let outcome = harness.widget.start(NAME, EMAIL, PHONE).await;
        assert_eq!(outcome, StartOutcome::Started(SessionId::new("session-1")));
        harness
    }

    fn timeline(widget: &IntakeWidget) -> Vec<(Sender, String)> {
        widget
            .state()
            .conversation
            .timeline()
            .messages()
            .iter()
            .map(|message| (message.sender, message.text.clone()))
            .collect()
    }

    fn drain(events: &mut mpsc::UnboundedReceiver<WidgetEvent>) -> Vec<WidgetEvent> {
        let mut drained = Vec::new();
        while let Ok(event) = events.try_recv() {
            drained.push(event);
        }
        drained
    }

    #[tokio::test]
    async fn valid_start_opens_session_with_one_bot_message() {
        let harness = harness();
        let mut events = harness.widget.subscribe();
        harness.transport.push_start(Ok(welcome("abc")));

        let outcome = harness.widget.start(NAME, EMAIL, PHONE).await;

        assert_eq!(outcome, StartOutcome::Started(SessionId::new("abc")));
        assert_eq!(
            harness.transport.calls(),
            vec![Call::Start(intake_transport::StartRequest::new(NAME, PHONE, EMAIL))]
        );
        assert_eq!(
            timeline(&harness.widget),
            vec![(
                Sender::Bot,
                "Hi! Welcome to the Study Abroad Intake.".to_string()
            )]
        );
        let state = harness.widget.state();
        assert!(state.session.errors().is_empty());
        assert_eq!(state.session.session_id(), Some(&SessionId::new("abc")));
        assert_eq!(state.session.status(), SessionStatus::Active);
        drop(state);

        let events = drain(&mut events);
        assert!(events.contains(&WidgetEvent::SessionStarted(SessionId::new("abc"))));
        assert!(events.contains(&WidgetEvent::RenderRequested));
    }

    #[tokio::test]
    async fn invalid_email_never_reaches_the_network() {
        let harness = harness();

        let outcome = harness.widget.start(NAME, "bad", PHONE).await;

        let StartOutcome::Invalid(errors) = outcome.clone() else {
            panic!("expected validation failure, got {outcome:?}");
        };
        assert_eq!(errors.get(Field::Email), Some(EMAIL_INVALID));
        assert!(harness.transport.calls().is_empty());
        let state = harness.widget.state();
        assert_eq!(state.session.errors().get(Field::Email), Some(EMAIL_INVALID));
        assert_eq!(state.session.session_id(), None);
        assert!(state.conversation.timeline().is_empty());
    }

    #[tokio::test]
    async fn failed_start_appends_fallback_and_keeps_session_absent() {
        let harness = harness();
        harness.transport.push_start(Err(failure("start")));

        let outcome = harness.widget.start(NAME, EMAIL, PHONE).await;

        assert_eq!(outcome, StartOutcome::Failed);
        assert_eq!(
            timeline(&harness.widget),
            vec![(Sender::Bot, START_FALLBACK_MESSAGE.to_string())]
        );
        let state = harness.widget.state();
        assert_eq!(state.session.session_id(), None);
        assert_eq!(state.session.status(), SessionStatus::NotStarted);
    }

    #[tokio::test]
    async fn second_start_while_starting_is_ignored() {
        let harness = harness();
        let release = harness.transport.hold_next_call();
        harness.transport.push_start(Ok(welcome("abc")));

        let (first, second) = futures::join!(harness.widget.start(NAME, EMAIL, PHONE), async {
            assert_eq!(
                harness.widget.state().session.status(),
                SessionStatus::Starting
            );
            let outcome = harness.widget.start(NAME, EMAIL, PHONE).await;
            release.send(()).unwrap();
            outcome
        });

        assert_eq!(first, StartOutcome::Started(SessionId::new("abc")));
        assert_eq!(second, StartOutcome::Ignored);
        assert_eq!(harness.transport.calls().len(), 1);
        assert_eq!(harness.widget.state().conversation.timeline().len(), 1);
    }

    #[tokio::test]
    async fn start_after_session_exists_is_ignored() {
        let harness = started().await;

        let outcome = harness
            .widget
            .start("John Roe", "john@x.com", "+1 555-765-4321")
            .await;

        assert_eq!(outcome, StartOutcome::Ignored);
        assert_eq!(harness.transport.calls().len(), 1);
        assert_eq!(harness.widget.state().conversation.timeline().len(), 1);
        assert_eq!(
            harness.widget.state().session.session_id(),
            Some(&SessionId::new("session-1"))
        );
    }

    #[tokio::test]
    async fn send_appends_user_then_bot_and_replaces_quick_replies() {
        let harness = started().await;
        harness
            .transport
            .push_send(Ok(SendReply::new("Hi!").with_quick_replies(["Yes", "No"])));
        harness.widget.set_draft("Hello");

        let outcome = harness.widget.submit_composer().await;

        assert_eq!(outcome, SendOutcome::Replied);
        let messages = timeline(&harness.widget);
        assert_eq!(
            messages[1..],
            [
                (Sender::User, "Hello".to_string()),
                (Sender::Bot, "Hi!".to_string()),
            ]
        );
        let state = harness.widget.state();
        assert_eq!(state.conversation.quick_replies(), ["Yes", "No"]);
        assert!(!state.conversation.is_loading());
        assert_eq!(state.composer.text(), "");
    }

    #[tokio::test]
    async fn user_message_and_cleared_draft_precede_the_reply() {
        let harness = started().await;
        let release = harness.transport.hold_next_call();
        harness.transport.push_send(Ok(SendReply::new("Noted.")));
        harness.widget.set_draft("  I finished my BSc in 2024  ");

        let (outcome, ()) = futures::join!(harness.widget.submit_composer(), async {
            let state = harness.widget.state();
            assert!(state.conversation.is_loading());
            assert_eq!(state.composer.text(), "");
            assert_eq!(
                state.conversation.timeline().last().map(|m| m.text.as_str()),
                Some("I finished my BSc in 2024")
            );
            drop(state);
            assert!(!harness.widget.can_send());
            release.send(()).unwrap();
        });

        assert_eq!(outcome, SendOutcome::Replied);
        assert_eq!(
            timeline(&harness.widget).last(),
            Some(&(Sender::Bot, "Noted.".to_string()))
        );
    }

    #[tokio::test]
    async fn failed_send_appends_fallback_and_preserves_quick_replies() {
        let harness = started().await;
        harness
            .transport
            .push_send(Ok(SendReply::new("Which level?").with_quick_replies(["BSc", "MSc"])));
        harness.transport.push_send(Err(failure("send")));

        harness.widget.send_quick_reply("Hello").await;
        let outcome = harness.widget.send_quick_reply("MSc").await;

        assert_eq!(outcome, SendOutcome::Failed);
        let messages = timeline(&harness.widget);
        assert_eq!(
            messages[messages.len() - 2..],
            [
                (Sender::User, "MSc".to_string()),
                (Sender::Bot, SEND_FALLBACK_MESSAGE.to_string()),
            ]
        );
        let state = harness.widget.state();
        assert!(!state.conversation.is_loading());
        assert_eq!(state.conversation.quick_replies(), ["BSc", "MSc"]);
    }

    #[tokio::test]
    async fn overlapping_send_is_ignored_not_queued() {
        let harness = started().await;
        let release = harness.transport.hold_next_call();
        harness.transport.push_send(Ok(SendReply::new("one")));

        let (first, second) = futures::join!(harness.widget.send_quick_reply("first"), async {
            let outcome = harness.widget.send_quick_reply("second").await;
            release.send(()).unwrap();
            outcome
        });

        assert_eq!(first, SendOutcome::Replied);
        assert_eq!(second, SendOutcome::Ignored);
        let sends = harness
            .transport
            .calls()
            .into_iter()
            .filter(|call| matches!(call, Call::Send { .. }))
            .count();
        assert_eq!(sends, 1);
        assert!(!timeline(&harness.widget).contains(&(Sender::User, "second".to_string())));
    }

    #[tokio::test]
    async fn quick_reply_keeps_the_draft() {
        let harness = started().await;
        harness.transport.push_send(Ok(SendReply::new("ok")));
        harness.widget.set_draft("half-typed");

        harness.widget.send_quick_reply("Yes").await;

        assert_eq!(harness.widget.state().composer.text(), "half-typed");
        assert_eq!(
            harness.transport.calls().last(),
            Some(&Call::Send {
                session_id: SessionId::new("session-1"),
                text: "Yes".to_string(),
            })
        );
    }

    #[tokio::test]
    async fn send_without_session_is_a_silent_no_op() {
        let harness = harness();
        harness.widget.set_draft("Hello");

        assert_eq!(harness.widget.submit_composer().await, SendOutcome::Ignored);
        assert!(harness.transport.calls().is_empty());
        assert!(harness.widget.state().conversation.timeline().is_empty());
        assert_eq!(harness.widget.state().composer.text(), "Hello");
    }

    #[tokio::test]
    async fn enter_commits_and_is_ignored_while_loading() {
        let harness = started().await;
        let release = harness.transport.hold_next_call();
        harness.transport.push_send(Ok(SendReply::new("ok")));
        harness.widget.set_draft("via enter");

        let (first, second) = futures::join!(
            harness.widget.on_composer_key(KeyInput::new(Key::Enter)),
            async {
                harness.widget.set_draft("again");
                let outcome = harness
                    .widget
                    .on_composer_key(KeyInput::new(Key::Enter))
                    .await;
                release.send(()).unwrap();
                outcome
            }
        );

        assert_eq!(first, SendOutcome::Replied);
        assert_eq!(second, SendOutcome::Ignored);
        assert_eq!(harness.widget.state().composer.text(), "again");
    }

    #[tokio::test]
    async fn auto_scroll_waits_for_render() {
        let harness = started().await;
        harness.widget.on_rendered();
        harness.layout.set_scroll_top(Surface::Timeline, 0.0);
        harness.widget.on_timeline_scroll();
        assert!(harness.widget.state().scroll.is_affordance_visible());

        let mut events = harness.widget.subscribe();
        harness.transport.push_send(Ok(SendReply::new("Hi!")));
        harness.widget.send_quick_reply("Hello").await;

        // Appended, but the view has not been told about the new content yet.
        assert_eq!(harness.layout.scroll_top(Surface::Timeline), 0.0);
        assert!(drain(&mut events).contains(&WidgetEvent::RenderRequested));

        harness.layout.set_scroll_height(Surface::Timeline, 2400.0);
        assert!(harness.widget.on_rendered());

        assert_eq!(harness.layout.scroll_top(Surface::Timeline), 2000.0);
        let state = harness.widget.state();
        assert!(!state.scroll.is_affordance_visible());
        assert!(state.scroll.is_at_bottom());
    }

    #[tokio::test]
    async fn affordance_follows_manual_scroll_and_explicit_jump() {
        let harness = harness();

        harness.layout.set_scroll_top(Surface::Timeline, 1000.0);
        harness.widget.on_timeline_scroll();
        assert!(harness.widget.state().scroll.is_affordance_visible());

        harness.widget.scroll_to_bottom();
        assert_eq!(harness.layout.scroll_top(Surface::Timeline), 1600.0);
        assert!(!harness.widget.state().scroll.is_affordance_visible());

        harness.layout.set_scroll_top(Surface::Timeline, 1595.0);
        harness.widget.on_timeline_scroll();
        assert!(!harness.widget.state().scroll.is_affordance_visible());
    }

    #[tokio::test]
    async fn upload_confirms_and_releases_pending() {
        let harness = started().await;
        harness.transport.push_upload(Ok(UploadAck::default()));
        harness.transport.push_upload(Err(failure("upload")));

        let file = UploadFile::new("transcript.pdf", vec![0; 16]);
        assert_eq!(
            harness.widget.upload(Some(file.clone())).await,
            UploadOutcome::Uploaded
        );
        assert_eq!(
            timeline(&harness.widget).last(),
            Some(&(Sender::Bot, "Uploaded transcript.pdf. Thanks!".to_string()))
        );

        assert_eq!(harness.widget.upload(Some(file)).await, UploadOutcome::Failed);
        assert_eq!(
            timeline(&harness.widget).last(),
            Some(&(Sender::Bot, UPLOAD_FALLBACK_MESSAGE.to_string()))
        );
        let state = harness.widget.state();
        assert!(!state.upload.is_pending());
        assert_eq!(state.upload.selection(), None);
    }

    #[tokio::test]
    async fn upload_requires_file_and_session() {
        let harness = harness();
        let file = UploadFile::new("a.pdf", Vec::new());

        assert_eq!(harness.widget.upload(Some(file)).await, UploadOutcome::Ignored);

        let harness = started().await;
        assert_eq!(harness.widget.upload(None).await, UploadOutcome::Ignored);
        assert_eq!(harness.transport.calls().len(), 1);
    }

    #[tokio::test]
    async fn upload_does_not_block_sending() {
        let harness = started().await;
        let release = harness.transport.hold_next_call();
        harness.transport.push_upload(Ok(UploadAck::default()));
        harness.transport.push_send(Ok(SendReply::new("ok")));

        let (uploaded, sent) = futures::join!(
            harness
                .widget
                .upload(Some(UploadFile::new("ielts.pdf", vec![1]))),
            async {
                assert_eq!(
                    harness.widget.state().upload.selection(),
                    Some("ielts.pdf")
                );
                let outcome = harness.widget.send_quick_reply("while uploading").await;
                release.send(()).unwrap();
                outcome
            }
        );

        assert_eq!(uploaded, UploadOutcome::Uploaded);
        assert_eq!(sent, SendOutcome::Replied);
    }

    #[tokio::test]
    async fn results_after_unmount_are_discarded() {
        let harness = started().await;
        let release = harness.transport.hold_next_call();
        harness.transport.push_send(Ok(SendReply::new("too late")));

        let (outcome, ()) = futures::join!(harness.widget.send_quick_reply("bye"), async {
            harness.widget.unmount();
            release.send(()).unwrap();
        });

        assert_eq!(outcome, SendOutcome::Discarded);
        assert!(!harness.widget.is_mounted());
        assert!(!timeline(&harness.widget).contains(&(Sender::Bot, "too late".to_string())));
        assert!(!harness.widget.state().conversation.is_loading());
    }

    #[tokio::test]
    async fn start_in_flight_at_unmount_releases_starting() {
        let harness = harness();
        let release = harness.transport.hold_next_call();
        harness.transport.push_start(Ok(welcome("abc")));

        let (outcome, ()) = futures::join!(harness.widget.start(NAME, EMAIL, PHONE), async {
            harness.widget.unmount();
            release.send(()).unwrap();
        });

        assert_eq!(outcome, StartOutcome::Discarded);
        let state = harness.widget.state();
        assert_eq!(state.session.status(), SessionStatus::NotStarted);
        assert_eq!(state.session.session_id(), None);
        assert!(state.conversation.timeline().is_empty());
    }

    #[tokio::test]
    async fn upload_in_flight_at_unmount_releases_pending() {
        let harness = started().await;
        let release = harness.transport.hold_next_call();
        harness.transport.push_upload(Ok(UploadAck::default()));

        let (outcome, ()) = futures::join!(
            harness
                .widget
                .upload(Some(UploadFile::new("ielts.pdf", vec![1]))),
            async {
                harness.widget.unmount();
                release.send(()).unwrap();
            }
        );

        assert_eq!(outcome, UploadOutcome::Discarded);
        let state = harness.widget.state();
        assert!(!state.upload.is_pending());
        assert_eq!(state.upload.selection(), None);
        assert_eq!(state.conversation.timeline().len(), 1);
    }

    #[tokio::test]
    async fn unmounted_widget_never_reaches_the_transport() {
        let fresh = harness();
        fresh.widget.unmount();

        assert_eq!(
            fresh.widget.start(NAME, EMAIL, PHONE).await,
            StartOutcome::Ignored
        );
        assert!(fresh.transport.calls().is_empty());
        assert_eq!(
            fresh.widget.state().session.status(),
            SessionStatus::NotStarted
        );

        let active = started().await;
        active.widget.unmount();
        active.widget.set_draft("Hello");

        assert_eq!(active.widget.submit_composer().await, SendOutcome::Ignored);
        assert_eq!(
            active
                .widget
                .upload(Some(UploadFile::new("ielts.pdf", vec![1])))
                .await,
            UploadOutcome::Ignored
        );
        assert_eq!(active.transport.calls().len(), 1);
        let state = active.widget.state();
        assert!(!state.conversation.is_loading());
        assert!(!state.upload.is_pending());
        assert_eq!(state.composer.text(), "Hello");
        assert_eq!(state.conversation.timeline().len(), 1);
    }

    #[tokio::test]
    async fn minimizing_keeps_every_slice() {
        let harness = started().await;
        harness.transport.push_send(Ok(SendReply::new("Hi!").with_quick_replies(["Yes"])));
        harness.widget.send_quick_reply("Hello").await;
        harness.widget.dispatch_menu(MenuEvent::Toggle {
            entry: Some(SettingsCategory::Sounds),
        });
        let before = timeline(&harness.widget);

        assert!(harness.widget.toggle_minimized());
        assert!(harness.widget.state().is_minimized());
        assert!(!harness.widget.toggle_minimized());

        assert_eq!(timeline(&harness.widget), before);
        let state = harness.widget.state();
        assert_eq!(state.session.session_id(), Some(&SessionId::new("session-1")));
        assert_eq!(state.conversation.quick_replies(), ["Yes"]);
        assert!(state.settings.is_open());
        assert_eq!(state.settings.active_category(), SettingsCategory::Sounds);
    }

    #[test]
    fn flyout_offset_invariant_through_the_widget() {
        let harness = harness();
        let check = |widget: &IntakeWidget, layout: &MeasuredLayout| {
            let state = widget.state();
            let expected = layout.top_offset_of(state.settings.active_category())
                - layout.scroll_top(Surface::SettingsList);
            assert_eq!(state.settings.flyout_offset(), expected);
        };

        harness.widget.dispatch_menu(MenuEvent::Toggle { entry: None });
        check(&harness.widget, &harness.layout);

        harness
            .widget
            .dispatch_menu(MenuEvent::Hover(SettingsCategory::Help));
        check(&harness.widget, &harness.layout);

        for _ in 0..3 {
            assert_eq!(harness.widget.on_menu_pointer_move(195.0), 12.0);
            check(&harness.widget, &harness.layout);
        }

        harness.layout.set_scroll_top(Surface::SettingsList, 10.0);
        harness.widget.on_menu_scroll();
        check(&harness.widget, &harness.layout);
        assert_eq!(harness.widget.state().settings.flyout_offset(), 6.0 * 46.0 - 10.0);
    }

    #[test]
    fn blank_endpoint_fails_construction() {
        let config = WidgetConfig {
            endpoint: "  ".to_string(),
            ..WidgetConfig::default()
        };
        let layout: Rc<dyn LayoutProvider> = Rc::new(MeasuredLayout::new());

        let error = IntakeWidget::from_config(&config, layout).err().unwrap();

        assert!(matches!(
            error,
            WidgetError::CreateTransport {
                source: TransportError::MissingEndpoint { .. },
                ..
            }
        ));
    }
}
