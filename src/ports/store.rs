use crate::types::catalog::{DeviceEntry, NotificationSettings, RecipeRecord, RegisteredDevice};

pub trait SettingsStore: Clone + Send + Sync + 'static {
    type Error: std::fmt::Display + Send + Sync + 'static;
    type Load<'a>: Future<Output = Result<Option<NotificationSettings>, Self::Error>> + Send + 'a
    where
        Self: 'a;
    type Write<'a>: Future<Output = Result<(), Self::Error>> + Send + 'a
    where
        Self: 'a;

    fn load_settings(&self) -> Self::Load<'_>;
    fn save_settings<'a>(&'a self, settings: &'a NotificationSettings) -> Self::Write<'a>;
    /// Sets `lastSent` without touching the other fields.
    fn record_sent<'a>(&'a self, date: &'a str) -> Self::Write<'a>;
}

pub trait DeviceRegistry: Clone + Send + Sync + 'static {
    type Error: std::fmt::Display + Send + Sync + 'static;
    type List<'a>: Future<Output = Result<Vec<DeviceEntry>, Self::Error>> + Send + 'a
    where
        Self: 'a;
    type Write<'a>: Future<Output = Result<(), Self::Error>> + Send + 'a
    where
        Self: 'a;

    fn list_devices(&self) -> Self::List<'_>;
    fn upsert_device<'a>(&'a self, id: &'a str, device: &'a RegisteredDevice) -> Self::Write<'a>;
    /// Removes every listed device in one batch. Unknown ids are ignored.
    fn delete_devices<'a>(&'a self, ids: &'a [String]) -> Self::Write<'a>;
}

pub trait RecipeCatalog: Clone + Send + Sync + 'static {
    type Error: std::fmt::Display + Send + Sync + 'static;
    type List<'a>: Future<Output = Result<Vec<RecipeRecord>, Self::Error>> + Send + 'a
    where
        Self: 'a;

    fn list_recipes(&self) -> Self::List<'_>;
}
