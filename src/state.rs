use crate::adapters::{AnthropicClient, FileStore};
use crate::config::AppConfig;

#[derive(Clone)]
pub struct AppState {
    pub config: AppConfig,
    pub store: FileStore,
    pub chat: AnthropicClient,
}

impl AppState {
    pub fn new(config: AppConfig) -> Self {
        Self {
            store: FileStore::new(&config.data_dir),
            chat: AnthropicClient::new(&config.chat),
            config,
        }
    }
}
