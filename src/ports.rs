pub mod chat;
pub mod push;
pub mod store;
pub mod time;

pub use chat::ChatCompleter;
pub use push::PushSender;
pub use store::{DeviceRegistry, RecipeCatalog, SettingsStore};
pub use time::TimeProvider;

use std::pin::Pin;

pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;
