#[derive(Debug, Clone)]
pub struct VapidConfig {
    pub private_key: String,
    /// Handed to browsers so they can subscribe.
    pub public_key: String,
    pub subject: String,
}

/// Notification fanned out to every registered device.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PushMessage {
    pub title: String,
    pub body: String,
    pub icon: String,
    pub badge: String,
    /// Page opened when the notification is clicked.
    pub link: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PushErrorCode {
    InvalidToken,
    Unregistered,
    Other(String),
}

impl PushErrorCode {
    /// Whether the token will never work again and its device record can go.
    pub fn is_stale(&self) -> bool {
        matches!(self, PushErrorCode::InvalidToken | PushErrorCode::Unregistered)
    }
}

impl std::fmt::Display for PushErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PushErrorCode::InvalidToken => f.write_str("invalid-registration-token"),
            PushErrorCode::Unregistered => f.write_str("registration-token-not-registered"),
            PushErrorCode::Other(code) => f.write_str(code),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PushFailure {
    pub code: PushErrorCode,
    pub message: String,
}

impl PushFailure {
    pub fn new(code: PushErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

/// Per-token delivery results, in the same order as the tokens sent.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchResponse {
    pub responses: Vec<Result<(), PushFailure>>,
}

impl BatchResponse {
    pub fn success_count(&self) -> usize {
        self.responses.iter().filter(|result| result.is_ok()).count()
    }

    pub fn failure_count(&self) -> usize {
        self.responses.len() - self.success_count()
    }
}
