use intake_transport::{SessionId, TransportResult, UploadAck, UploadFile};

pub const UPLOAD_FALLBACK_MESSAGE: &str = "Upload failed. Try again.";

pub fn upload_confirmation(file_name: &str) -> String {
    format!("Uploaded {file_name}. Thanks!")
}

#[derive(Debug)]
pub struct PendingUpload {
    pub session_id: SessionId,
    pub file: UploadFile,
}

/// Single-file upload lifecycle, independent from the send loading flag.
#[derive(Debug, Default)]
pub struct UploadCoordinator {
    pending: bool,
    selection: Option<String>,
}

impl UploadCoordinator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_pending(&self) -> bool {
        self.pending
    }

    /// Name shown in the file-selection control while an upload runs.
    pub fn selection(&self) -> Option<&str> {
        self.selection.as_deref()
    }

    pub fn begin_upload(
        &mut self,
        session_id: Option<&SessionId>,
        file: Option<UploadFile>,
    ) -> Option<PendingUpload> {
        let (Some(session_id), Some(file)) = (session_id, file) else {
            return None;
        };
        if self.pending {
            return None;
        }

        self.pending = true;
        self.selection = Some(file.file_name.clone());
        Some(PendingUpload {
            session_id: session_id.clone(),
            file,
        })
    }

    pub fn abandon_upload(&mut self) {
        self.pending = false;
        self.selection = None;
    }

    /// Releases the guard and clears the selection; returns the bot message to append.
    pub fn complete_upload(&mut self, result: TransportResult<UploadAck>) -> String {
        let file_name = self.selection.take().unwrap_or_default();
        self.pending = false;

        match result {
            Ok(ack) => {
                tracing::info!(
                    file_name = %file_name,
                    status = ?ack.status,
                    document_id = ?ack.document_id,
                    "document uploaded"
                );
                upload_confirmation(&file_name)
            }
            Err(error) => {
                tracing::warn!(file_name = %file_name, error = %error, "document upload failed");
                UPLOAD_FALLBACK_MESSAGE.to_string()
            }
        }
    }
}
