use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use snafu::Snafu;

pub const DEFAULT_ENDPOINT: &str = "http://localhost:8000/api";
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportConfig {
    pub endpoint: String,
    pub request_timeout: Duration,
}

impl TransportConfig {
    pub fn new(endpoint: impl Into<String>, request_timeout: Duration) -> Self {
        Self {
            endpoint: endpoint.into().trim().trim_end_matches('/').to_string(),
            request_timeout,
        }
    }
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self::new(DEFAULT_ENDPOINT, DEFAULT_REQUEST_TIMEOUT)
    }
}

/// Server-assigned identity for one conversation.
///
/// The value is opaque to the client; it is only echoed back on later calls.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SessionId(String);

impl SessionId {
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(&self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StartRequest {
    pub name: String,
    pub phone: String,
    pub email: String,
}

impl StartRequest {
    pub fn new(
        name: impl Into<String>,
        phone: impl Into<String>,
        email: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            phone: phone.into(),
            email: email.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StartReply {
    pub session_id: SessionId,
    pub bot_message: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SendReply {
    pub bot_message: String,
    /// `None` when the backend omitted the list or sent something other than an array.
    pub quick_replies: Option<Vec<String>>,
}

impl SendReply {
    pub fn new(bot_message: impl Into<String>) -> Self {
        Self {
            bot_message: bot_message.into(),
            quick_replies: None,
        }
    }

    pub fn with_quick_replies<I, S>(mut self, replies: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.quick_replies = Some(replies.into_iter().map(Into::into).collect());
        self
    }
}

#[derive(Clone, PartialEq, Eq)]
pub struct UploadFile {
    pub file_name: String,
    pub content_type: Option<String>,
    pub bytes: Vec<u8>,
}

impl UploadFile {
    pub fn new(file_name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            file_name: file_name.into(),
            content_type: None,
            bytes,
        }
    }

    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }
}

impl fmt::Debug for UploadFile {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("UploadFile")
            .field("file_name", &self.file_name)
            .field("content_type", &self.content_type)
            .field("len", &self.bytes.len())
            .finish()
    }
}

/// Backend acknowledgement for an accepted document.
///
/// Callers only care that the upload succeeded; the fields are kept for logging.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UploadAck {
    pub status: Option<String>,
    pub document_id: Option<String>,
}

pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;
pub type TransportResult<T> = Result<T, TransportError>;

#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum TransportError {
    #[snafu(display("intake endpoint is not configured"))]
    MissingEndpoint { stage: &'static str },
    #[snafu(display("failed to build http client on `{stage}`: {source}"))]
    BuildClient {
        stage: &'static str,
        source: reqwest::Error,
    },
    #[snafu(display("request to {endpoint} failed on `{stage}`: {source}"))]
    Request {
        stage: &'static str,
        endpoint: String,
        source: reqwest::Error,
    },
    #[snafu(display("{endpoint} returned status {status}: {body}"))]
    Status {
        stage: &'static str,
        endpoint: String,
        status: u16,
        body: String,
    },
    #[snafu(display("failed to decode response from {endpoint} on `{stage}`: {source}"))]
    Decode {
        stage: &'static str,
        endpoint: String,
        source: serde_json::Error,
    },
    #[snafu(display("content type '{content_type}' is invalid: {source}"))]
    InvalidContentType {
        stage: &'static str,
        content_type: String,
        source: reqwest::Error,
    },
}

/// The three remote operations the intake widget depends on.
///
/// Every call is fallible and may take arbitrarily long; timeouts are the
/// implementation's concern and surface as ordinary errors.
pub trait IntakeTransport: Send + Sync {
    fn id(&self) -> &str;
    fn start_session<'a>(&'a self, request: StartRequest)
    -> BoxFuture<'a, TransportResult<StartReply>>;
    fn send_message<'a>(
        &'a self,
        session_id: &'a SessionId,
        text: &'a str,
    ) -> BoxFuture<'a, TransportResult<SendReply>>;
    fn upload_document<'a>(
        &'a self,
        session_id: &'a SessionId,
        file: UploadFile,
    ) -> BoxFuture<'a, TransportResult<UploadAck>>;
}
