use reqwest::multipart::{Form, Part};
use serde::Serialize;
use serde::de::DeserializeOwned;
use snafu::{ResultExt, ensure};

use super::transport::{
    BoxFuture, BuildClientSnafu, DecodeSnafu, IntakeTransport, InvalidContentTypeSnafu,
    MissingEndpointSnafu, RequestSnafu, SendReply, SessionId, StartReply, StartRequest,
    StatusSnafu, TransportConfig, TransportResult, UploadAck, UploadFile,
};
use super::wire::{MessageBody, MessagePayload, StartBody, StartPayload, UploadPayload};

pub const HTTP_TRANSPORT_ID: &str = "http";

const START_PATH: &str = "start";
const MESSAGE_PATH: &str = "message";
const UPLOAD_PATH: &str = "upload-document";

/// Talks to the intake backend over its JSON/multipart HTTP API.
pub struct HttpTransport {
    config: TransportConfig,
    client: reqwest::Client,
}

impl HttpTransport {
    pub fn new(config: TransportConfig) -> TransportResult<Self> {
        ensure!(
            !config.endpoint.is_empty(),
            MissingEndpointSnafu {
                stage: "http-transport-new",
            }
        );

        let client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()
            .context(BuildClientSnafu {
                stage: "build-client",
            })?;

        Ok(Self { config, client })
    }

    pub fn config(&self) -> &TransportConfig {
        &self.config
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.config.endpoint, path)
    }

    async fn post_json<B, R>(&self, stage: &'static str, path: &str, body: &B) -> TransportResult<R>
    where
        B: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        let endpoint = self.url(path);
        let response = self
            .client
            .post(&endpoint)
            .json(body)
            .send()
            .await
            .context(RequestSnafu {
                stage,
                endpoint: endpoint.clone(),
            })?;

        Self::read_json(stage, endpoint, response).await
    }

    async fn read_json<R>(
        stage: &'static str,
        endpoint: String,
        response: reqwest::Response,
    ) -> TransportResult<R>
    where
        R: DeserializeOwned,
    {
        let status = response.status();
        let payload = response.text().await.context(RequestSnafu {
            stage,
            endpoint: endpoint.clone(),
        })?;

        if !status.is_success() {
            tracing::warn!(
                endpoint = %endpoint,
                status = status.as_u16(),
                "intake backend rejected request"
            );
            return StatusSnafu {
                stage,
                endpoint,
                status: status.as_u16(),
                body: payload,
            }
            .fail();
        }

        serde_json::from_str(&payload).context(DecodeSnafu { stage, endpoint })
    }

    async fn start(&self, request: StartRequest) -> TransportResult<StartReply> {
        let body = StartBody {
            name: &request.name,
            phone: &request.phone,
            email: &request.email,
        };
        let payload: StartPayload = self.post_json("start-session", START_PATH, &body).await?;
        tracing::debug!(session_id = %payload.session_id, "intake session opened");
        Ok(payload.into())
    }

    async fn message(&self, session_id: &SessionId, text: &str) -> TransportResult<SendReply> {
        let body = MessageBody {
            session_id: session_id.as_str(),
            text,
        };
        let payload: MessagePayload = self.post_json("send-message", MESSAGE_PATH, &body).await?;
        Ok(payload.into())
    }

    async fn upload(&self, session_id: &SessionId, file: UploadFile) -> TransportResult<UploadAck> {
        let stage = "upload-document";
        let byte_count = file.bytes.len();
        let mut part = Part::bytes(file.bytes).file_name(file.file_name.clone());
        if let Some(content_type) = file.content_type {
            part = part
                .mime_str(&content_type)
                .context(InvalidContentTypeSnafu {
                    stage: "upload-content-type",
                    content_type: content_type.clone(),
                })?;
        }

        let endpoint = self.url(UPLOAD_PATH);
        tracing::debug!(
            session_id = %session_id,
            file_name = %file.file_name,
            byte_count,
            "uploading intake document"
        );
        let response = self
            .client
            .post(&endpoint)
            .query(&[("session_id", session_id.as_str())])
            .multipart(Form::new().part("file", part))
            .send()
            .await
            .context(RequestSnafu {
                stage,
                endpoint: endpoint.clone(),
            })?;

        let payload: UploadPayload = Self::read_json(stage, endpoint, response).await?;
        Ok(payload.into())
    }
}

impl IntakeTransport for HttpTransport {
    fn id(&self) -> &str {
        HTTP_TRANSPORT_ID
    }

    fn start_session<'a>(
        &'a self,
        request: StartRequest,
    ) -> BoxFuture<'a, TransportResult<StartReply>> {
        Box::pin(self.start(request))
    }

    fn send_message<'a>(
        &'a self,
        session_id: &'a SessionId,
        text: &'a str,
    ) -> BoxFuture<'a, TransportResult<SendReply>> {
        Box::pin(self.message(session_id, text))
    }

    fn upload_document<'a>(
        &'a self,
        session_id: &'a SessionId,
        file: UploadFile,
    ) -> BoxFuture<'a, TransportResult<UploadAck>> {
        Box::pin(self.upload(session_id, file))
    }
}
