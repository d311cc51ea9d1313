use std::collections::BTreeMap;
use std::sync::OnceLock;

use intake_transport::{SessionId, StartReply, StartRequest, TransportResult};
use regex::Regex;

pub const START_FALLBACK_MESSAGE: &str = "Unable to start session. Please try again.";

pub const NAME_REQUIRED: &str = "Please enter your name";
pub const EMAIL_REQUIRED: &str = "Please enter your email address";
pub const EMAIL_INVALID: &str = "Please enter a valid email address";
pub const PHONE_REQUIRED: &str = "Please enter your phone number";
pub const PHONE_INVALID: &str = "Please enter a valid phone number";

const EMAIL_PATTERN: &str = r"^[^\s@]+@[^\s@]+\.[^\s@]+$";
// Separators count towards the length; no country-code rules.
const PHONE_PATTERN: &str = r"^[0-9+\-()\s]{10,}$";

fn email_regex() -> &'static Regex {
    static EMAIL: OnceLock<Regex> = OnceLock::new();
    EMAIL.get_or_init(|| Regex::new(EMAIL_PATTERN).expect("email pattern is valid"))
}

fn phone_regex() -> &'static Regex {
    static PHONE: OnceLock<Regex> = OnceLock::new();
    PHONE.get_or_init(|| Regex::new(PHONE_PATTERN).expect("phone pattern is valid"))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Field {
    Name,
    Email,
    Phone,
}

/// Field-scoped messages from the latest start attempt. Valid fields are absent.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationErrors(BTreeMap<Field, &'static str>);

impl ValidationErrors {
    pub fn get(&self, field: Field) -> Option<&'static str> {
        self.0.get(&field).copied()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (Field, &'static str)> + '_ {
        self.0.iter().map(|(field, message)| (*field, *message))
    }

    fn insert(&mut self, field: Field, message: &'static str) {
        self.0.insert(field, message);
    }
}

/// Checks the start form and returns the trimmed request on success.
pub fn validate(name: &str, email: &str, phone: &str) -> Result<StartRequest, ValidationErrors> {
    let name = name.trim();
    let email = email.trim();
    let phone = phone.trim();
    let mut errors = ValidationErrors::default();

    if name.is_empty() {
        errors.insert(Field::Name, NAME_REQUIRED);
    }

    if email.is_empty() {
        errors.insert(Field::Email, EMAIL_REQUIRED);
    } else if !email_regex().is_match(email) {
        errors.insert(Field::Email, EMAIL_INVALID);
    }

    if phone.is_empty() {
        errors.insert(Field::Phone, PHONE_REQUIRED);
    } else if !phone_regex().is_match(phone) {
        errors.insert(Field::Phone, PHONE_INVALID);
    }

    if errors.is_empty() {
        Ok(StartRequest::new(name, phone, email))
    } else {
        Err(errors)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SessionStatus {
    #[default]
    NotStarted,
    Starting,
    Active,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StartAttempt {
    /// A start is already in flight or a session already exists.
    Ignored,
    Invalid(ValidationErrors),
    Ready(StartRequest),
}

/// Owns the session identity and the start handshake.
#[derive(Debug, Default)]
pub struct SessionController {
    session_id: Option<SessionId>,
    status: SessionStatus,
    errors: ValidationErrors,
}

impl SessionController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn session_id(&self) -> Option<&SessionId> {
        self.session_id.as_ref()
    }

    pub fn status(&self) -> SessionStatus {
        self.status
    }

    pub fn errors(&self) -> &ValidationErrors {
        &self.errors
    }

    pub fn begin_start(&mut self, name: &str, email: &str, phone: &str) -> StartAttempt {
        if self.status != SessionStatus::NotStarted {
            tracing::debug!(status = ?self.status, "ignoring start request");
            return StartAttempt::Ignored;
        }

        match validate(name, email, phone) {
            Ok(request) => {
                self.errors = ValidationErrors::default();
                self.status = SessionStatus::Starting;
                StartAttempt::Ready(request)
            }
            Err(errors) => {
                tracing::debug!(invalid_fields = errors.len(), "start form rejected");
                self.errors = errors.clone();
                StartAttempt::Invalid(errors)
            }
        }
    }

    /// Drops an in-flight start without a result; the session stays absent.
    pub fn abandon_start(&mut self) {
        if self.status == SessionStatus::Starting {
            self.status = SessionStatus::NotStarted;
        }
    }

    /// Leaves `Starting` on both paths and returns the bot message to append.
    pub fn complete_start(&mut self, result: TransportResult<StartReply>) -> String {
        match result {
            Ok(reply) => {
                tracing::info!(session_id = %reply.session_id, "intake session started");
                self.session_id = Some(reply.session_id);
                self.status = SessionStatus::Active;
                reply.bot_message
            }
            Err(error) => {
                tracing::warn!(error = %error, "failed to start intake session");
                self.status = SessionStatus::NotStarted;
                START_FALLBACK_MESSAGE.to_string()
            }
        }
    }
}
