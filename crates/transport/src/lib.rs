#![deny(unsafe_code)]

//! Transport seam between the intake widget and the intake backend.

use std::sync::Arc;

mod http_adapter;
mod transport;
mod wire;

pub use http_adapter::{HTTP_TRANSPORT_ID, HttpTransport};
pub use transport::{
    BoxFuture, DEFAULT_ENDPOINT, DEFAULT_REQUEST_TIMEOUT, IntakeTransport, SendReply, SessionId,
    StartReply, StartRequest, TransportConfig, TransportError, TransportResult, UploadAck,
    UploadFile,
};

pub fn create_transport(config: TransportConfig) -> TransportResult<Arc<dyn IntakeTransport>> {
    Ok(Arc::new(HttpTransport::new(config)?))
}
