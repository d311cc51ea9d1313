//! In-memory collaborators for widget tests.

use std::collections::VecDeque;
use std::sync::Mutex;

use intake_transport::{
    BoxFuture, IntakeTransport, SendReply, SessionId, StartReply, StartRequest, TransportError,
    TransportResult, UploadAck, UploadFile,
};
use tokio::sync::oneshot;

use crate::layout::{MeasuredLayout, Surface, SurfaceMetrics};

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Call {
    Start(StartRequest),
    Send { session_id: SessionId, text: String },
    Upload { session_id: SessionId, file_name: String },
}

pub(crate) fn failure(stage: &'static str) -> TransportError {
    TransportError::Status {
        stage,
        endpoint: "http://intake.test/api".to_string(),
        status: 503,
        body: "unavailable".to_string(),
    }
}

/// Replays queued results in order and records every call.
///
/// An empty queue answers with a 503 failure.
#[derive(Default)]
pub(crate) struct ScriptedTransport {
    starts: Mutex<VecDeque<TransportResult<StartReply>>>,
    sends: Mutex<VecDeque<TransportResult<SendReply>>>,
    uploads: Mutex<VecDeque<TransportResult<UploadAck>>>,
    gates: Mutex<VecDeque<oneshot::Receiver<()>>>,
    calls: Mutex<Vec<Call>>,
}

impl ScriptedTransport {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn push_start(&self, result: TransportResult<StartReply>) {
        self.starts.lock().unwrap().push_back(result);
    }

    pub(crate) fn push_send(&self, result: TransportResult<SendReply>) {
        self.sends.lock().unwrap().push_back(result);
    }

    pub(crate) fn push_upload(&self, result: TransportResult<UploadAck>) {
        self.uploads.lock().unwrap().push_back(result);
    }

    /// The next transport call waits until the returned sender fires (or is dropped).
    pub(crate) fn hold_next_call(&self) -> oneshot::Sender<()> {
        let (release, gate) = oneshot::channel();
        self.gates.lock().unwrap().push_back(gate);
        release
    }

    pub(crate) fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    async fn record(&self, call: Call) {
        self.calls.lock().unwrap().push(call);
        let gate = self.gates.lock().unwrap().pop_front();
        if let Some(gate) = gate {
            let _ = gate.await;
        }
    }
}

impl IntakeTransport for ScriptedTransport {
    fn id(&self) -> &str {
        "scripted"
    }

    fn start_session<'a>(
        &'a self,
        request: StartRequest,
    ) -> BoxFuture<'a, TransportResult<StartReply>> {
        Box::pin(async move {
            self.record(Call::Start(request)).await;
            let next = self.starts.lock().unwrap().pop_front();
            next.unwrap_or_else(|| Err(failure("scripted-start")))
        })
    }

    fn send_message<'a>(
        &'a self,
        session_id: &'a SessionId,
        text: &'a str,
    ) -> BoxFuture<'a, TransportResult<SendReply>> {
        Box::pin(async move {
            self.record(Call::Send {
                session_id: session_id.clone(),
                text: text.to_string(),
            })
            .await;
            let next = self.sends.lock().unwrap().pop_front();
            next.unwrap_or_else(|| Err(failure("scripted-send")))
        })
    }

    fn upload_document<'a>(
        &'a self,
        session_id: &'a SessionId,
        file: UploadFile,
    ) -> BoxFuture<'a, TransportResult<UploadAck>> {
        Box::pin(async move {
            self.record(Call::Upload {
                session_id: session_id.clone(),
                file_name: file.file_name,
            })
            .await;
            let next = self.uploads.lock().unwrap().pop_front();
            next.unwrap_or_else(|| Err(failure("scripted-upload")))
        })
    }
}

/// Timeline of 400 visible over 2000 content, settings list of 200 over 368.
pub(crate) fn widget_layout() -> MeasuredLayout {
    MeasuredLayout::new()
        .with_uniform_rows(46.0)
        .with_surface(Surface::Timeline, SurfaceMetrics::new(400.0, 2000.0))
        .with_surface(Surface::SettingsList, SurfaceMetrics::new(200.0, 368.0))
}
