//! Firebase Cloud Messaging over the HTTP v1 API.
//!
//! Authenticates with a service-account key: an RS256-signed assertion is
//! exchanged for an OAuth2 access token once per multicast, then one
//! `messages:send` call is made per device token.

use crate::ports::{BoxFuture, PushSender};
use crate::types::push::{BatchResponse, PushErrorCode, PushFailure, PushMessage};

use jwt_simple::prelude::{Claims, Duration as JwtDuration, RS256KeyPair, RSAKeyPairLike};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use std::path::{Path, PathBuf};
use std::sync::Arc;

pub const DEFAULT_FCM_BASE_URL: &str = "https://fcm.googleapis.com";
const DEFAULT_TOKEN_URI: &str = "https://oauth2.googleapis.com/token";
const MESSAGING_SCOPE: &str = "https://www.googleapis.com/auth/firebase.messaging";
const JWT_BEARER_GRANT: &str = "urn:ietf:params:oauth:grant-type:jwt-bearer";

#[derive(Debug, thiserror::Error)]
pub enum FcmError {
    #[error("failed to read service account {path}: {source}")]
    ReadAccount {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("malformed service account: {0}")]
    ParseAccount(#[from] serde_json::Error),
    #[error("invalid service account key: {0}")]
    Key(String),
    #[error("failed to sign token assertion: {0}")]
    Sign(String),
    #[error("access token request failed: {0}")]
    Token(#[from] reqwest::Error),
}

fn default_token_uri() -> String {
    DEFAULT_TOKEN_URI.to_string()
}

/// The fields of a Google service-account JSON key that FCM needs.
#[derive(Debug, Clone, Deserialize)]
pub struct ServiceAccount {
    pub project_id: String,
    pub client_email: String,
    pub private_key: String,
    #[serde(default = "default_token_uri")]
    pub token_uri: String,
}

impl ServiceAccount {
    pub fn from_file(path: &Path) -> Result<Self, FcmError> {
        let raw = std::fs::read_to_string(path).map_err(|source| FcmError::ReadAccount {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(serde_json::from_str(&raw)?)
    }
}

#[derive(Serialize, Deserialize)]
struct ScopeClaim {
    scope: String,
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
}

#[derive(Debug, Default, Deserialize)]
struct ErrorEnvelope {
    #[serde(default)]
    error: ErrorBody,
}

#[derive(Debug, Default, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: String,
    #[serde(default)]
    status: String,
    #[serde(default)]
    details: Vec<ErrorDetail>,
}

#[derive(Debug, Deserialize)]
struct ErrorDetail {
    #[serde(rename = "errorCode", default)]
    error_code: Option<String>,
}

#[derive(Clone)]
pub struct FcmSender {
    http: reqwest::Client,
    account: Arc<ServiceAccount>,
    key: Arc<RS256KeyPair>,
    send_url: String,
}

impl FcmSender {
    pub fn new(account: ServiceAccount, base_url: &str) -> Result<Self, FcmError> {
        let key = RS256KeyPair::from_pem(&account.private_key)
            .map_err(|err| FcmError::Key(err.to_string()))?;
        let send_url = format!(
            "{}/v1/projects/{}/messages:send",
            base_url.trim_end_matches('/'),
            account.project_id
        );
        Ok(Self {
            http: reqwest::Client::new(),
            account: Arc::new(account),
            key: Arc::new(key),
            send_url,
        })
    }

    fn assertion(&self) -> Result<String, FcmError> {
        let claims = Claims::with_custom_claims(
            ScopeClaim {
                scope: MESSAGING_SCOPE.to_string(),
            },
            JwtDuration::from_mins(60),
        )
        .with_issuer(&self.account.client_email)
        .with_audience(&self.account.token_uri);
        self.key
            .sign(claims)
            .map_err(|err| FcmError::Sign(err.to_string()))
    }

    async fn access_token(&self) -> Result<String, FcmError> {
        let assertion = self.assertion()?;
        let response = self
            .http
            .post(&self.account.token_uri)
            .form(&[
                ("grant_type", JWT_BEARER_GRANT),
                ("assertion", assertion.as_str()),
            ])
            .send()
            .await?
            .error_for_status()?;
        let token: TokenResponse = response.json().await?;
        Ok(token.access_token)
    }

    async fn send_one(
        &self,
        access_token: &str,
        message: &PushMessage,
        token: &str,
    ) -> Result<(), PushFailure> {
        let response = self
            .http
            .post(&self.send_url)
            .bearer_auth(access_token)
            .json(&message_body(message, token))
            .send()
            .await
            .map_err(|err| {
                PushFailure::new(PushErrorCode::Other("transport".to_string()), err.to_string())
            })?;
        let status = response.status();
        if status.is_success() {
            return Ok(());
        }
        let envelope: ErrorEnvelope = response.json().await.unwrap_or_default();
        Err(classify_error(status, envelope.error))
    }
}

fn message_body(message: &PushMessage, token: &str) -> Value {
    json!({
        "message": {
            "token": token,
            "notification": {
                "title": message.title,
                "body": message.body,
            },
            "webpush": {
                "notification": {
                    "icon": message.icon,
                    "badge": message.badge,
                    "requireInteraction": false,
                },
                "fcm_options": {
                    "link": message.link,
                },
            },
        }
    })
}

fn classify_error(status: reqwest::StatusCode, error: ErrorBody) -> PushFailure {
    let detail = error
        .details
        .iter()
        .find_map(|detail| detail.error_code.clone())
        .unwrap_or(error.status);
    let code = match detail.as_str() {
        "UNREGISTERED" => PushErrorCode::Unregistered,
        "INVALID_ARGUMENT" if error.message.contains("registration token") => {
            PushErrorCode::InvalidToken
        }
        "" => PushErrorCode::Other(format!("http-{}", status.as_u16())),
        other => PushErrorCode::Other(other.to_string()),
    };
    let message = if error.message.is_empty() {
        status.to_string()
    } else {
        error.message
    };
    PushFailure::new(code, message)
}

impl PushSender for FcmSender {
    type Error = FcmError;
    type Fut<'a>
        = BoxFuture<'a, Result<BatchResponse, FcmError>>
    where
        Self: 'a;

    fn send_multicast<'a>(
        &'a self,
        message: &'a PushMessage,
        tokens: &'a [String],
    ) -> Self::Fut<'a> {
        Box::pin(async move {
            let access_token = self.access_token().await?;
            let mut responses = Vec::with_capacity(tokens.len());
            for token in tokens {
                responses.push(self.send_one(&access_token, message, token).await);
            }
            Ok(BatchResponse { responses })
        })
    }
}
