use crate::types::chat::{ChatRequest, ChatResponse};

pub trait ChatCompleter: Clone + Send + Sync + 'static {
    type Error: std::fmt::Display + Send + Sync + 'static;
    type Fut<'a>: Future<Output = Result<ChatResponse, Self::Error>> + Send + 'a
    where
        Self: 'a;

    fn complete<'a>(&'a self, request: &'a ChatRequest) -> Self::Fut<'a>;
}
