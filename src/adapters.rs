use std::convert::Infallible;
use std::sync::Arc;
use std::time::Duration;

use serde::Deserialize;
use time::OffsetDateTime;

use crate::ports::{self, BoxFuture};
use crate::types::push::{BatchResponse, PushErrorCode, PushFailure, PushMessage, VapidConfig};

pub mod anthropic;
pub mod fcm;
pub mod file_store;

pub use anthropic::{AnthropicClient, ChatError};
pub use fcm::{FcmError, FcmSender, ServiceAccount};
pub use file_store::{FileStore, StoreError};

#[derive(Debug, Clone, Copy, Default)]
pub struct TokioTimeProvider;

impl ports::TimeProvider for TokioTimeProvider {
    type Sleep<'a>
        = tokio::time::Sleep
    where
        Self: 'a;

    fn now(&self) -> OffsetDateTime {
        OffsetDateTime::now_utc()
    }

    fn sleep(&self, duration: Duration) -> Self::Sleep<'_> {
        tokio::time::sleep(duration)
    }
}

/// Device token format for the Web Push backend: the browser's
/// `PushSubscription.toJSON()` output.
#[derive(Debug, Deserialize)]
struct BrowserSubscription {
    endpoint: String,
    keys: SubscriptionKeys,
}

#[derive(Debug, Deserialize)]
struct SubscriptionKeys {
    p256dh: String,
    auth: String,
}

/// Sends through the standard Web Push protocol, signed with VAPID.
#[derive(Clone)]
pub struct WebPushSender {
    vapid: VapidConfig,
    client: Arc<web_push::WebPushClient>,
}

impl WebPushSender {
    pub fn new(vapid: VapidConfig) -> Result<Self, web_push::WebPushError> {
        let client = web_push::WebPushClient::new()?;
        Ok(Self {
            vapid,
            client: Arc::new(client),
        })
    }

    async fn send_one(&self, token: &str, payload: &[u8]) -> Result<(), PushFailure> {
        let subscription: BrowserSubscription = serde_json::from_str(token).map_err(|err| {
            PushFailure::new(
                PushErrorCode::InvalidToken,
                format!("token is not a push subscription: {err}"),
            )
        })?;
        let subscription_info = web_push::SubscriptionInfo::new(
            subscription.endpoint,
            subscription.keys.p256dh,
            subscription.keys.auth,
        );
        self.deliver(&subscription_info, payload)
            .await
            .map_err(|err| PushFailure::new(webpush_error_code(&err), err.to_string()))
    }

    async fn deliver(
        &self,
        subscription_info: &web_push::SubscriptionInfo,
        payload: &[u8],
    ) -> Result<(), web_push::WebPushError> {
        let mut builder = web_push::WebPushMessageBuilder::new(subscription_info)?;
        builder.set_payload(web_push::ContentEncoding::Aes128Gcm, payload);
        let mut signature_builder = web_push::VapidSignatureBuilder::from_base64(
            &self.vapid.private_key,
            web_push::URL_SAFE_NO_PAD,
            subscription_info,
        )?;
        signature_builder.add_claim("sub", self.vapid.subject.as_str());
        builder.set_vapid_signature(signature_builder.build()?);
        self.client.send(builder.build()?).await
    }
}

fn webpush_error_code(err: &web_push::WebPushError) -> PushErrorCode {
    match err {
        web_push::WebPushError::EndpointNotFound => PushErrorCode::Unregistered,
        web_push::WebPushError::EndpointNotValid
        | web_push::WebPushError::InvalidUri
        | web_push::WebPushError::InvalidCryptoKeys => PushErrorCode::InvalidToken,
        other => PushErrorCode::Other(format!("{other:?}")),
    }
}

/// JSON the service worker reads from the push event.
fn webpush_payload(message: &PushMessage) -> Vec<u8> {
    serde_json::json!({
        "notification": {
            "title": message.title,
            "body": message.body,
            "icon": message.icon,
            "badge": message.badge,
        },
        "data": {
            "url": message.link,
        },
    })
    .to_string()
    .into_bytes()
}

impl ports::PushSender for WebPushSender {
    type Error = Infallible;
    type Fut<'a>
        = BoxFuture<'a, Result<BatchResponse, Infallible>>
    where
        Self: 'a;

    fn send_multicast<'a>(
        &'a self,
        message: &'a PushMessage,
        tokens: &'a [String],
    ) -> Self::Fut<'a> {
        Box::pin(async move {
            let payload = webpush_payload(message);
            let mut responses = Vec::with_capacity(tokens.len());
            for token in tokens {
                responses.push(self.send_one(token, &payload).await);
            }
            Ok(BatchResponse { responses })
        })
    }
}
