use crate::types::push::{BatchResponse, PushMessage};

/// Multicast delivery to opaque device tokens.
///
/// A returned `Err` means nothing could be attempted (e.g. credentials were
/// rejected). Per-token failures are reported inside the `BatchResponse`.
pub trait PushSender: Clone + Send + Sync + 'static {
    type Error: std::fmt::Display + Send + Sync + 'static;
    type Fut<'a>: Future<Output = Result<BatchResponse, Self::Error>> + Send + 'a
    where
        Self: 'a;

    fn send_multicast<'a>(&'a self, message: &'a PushMessage, tokens: &'a [String])
    -> Self::Fut<'a>;
}
