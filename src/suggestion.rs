//! The daily dinner suggestion.
//!
//! Runs every hour; only the run whose local hour matches the configured one
//! does anything, and only once per calendar day in the configured zone.

use crate::clock;
use crate::config;
use crate::ports::{
    ChatCompleter, DeviceRegistry, PushSender, RecipeCatalog, SettingsStore, TimeProvider,
};
use crate::types::catalog::DeviceEntry;
use crate::types::chat::{ChatMessage, ChatRequest};
use crate::types::push::{BatchResponse, PushMessage};

use jiff::tz::TimeZone;

mod ranking;

pub const NOTIFICATION_TITLE: &str = "Tonight's Dinner Idea";

#[derive(Debug, Clone)]
pub struct SuggestionOptions {
    pub zone: TimeZone,
    pub model: String,
    pub max_tokens: u32,
    pub household: String,
    pub icon: String,
    pub badge: String,
    pub link: String,
}

impl SuggestionOptions {
    pub fn from_config(config: &config::AppConfig) -> Self {
        Self {
            zone: config.time_zone.clone(),
            model: config.suggestion.model.clone(),
            max_tokens: config.suggestion.max_tokens,
            household: config.suggestion.household.clone(),
            icon: config.web.icon_url.clone(),
            badge: config.web.badge_url.clone(),
            link: config.web.link.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    NoSettings,
    Disabled,
    HourMismatch { current: u8, configured: u8 },
    AlreadySent { date: String },
    NoDevices,
    NoRecipes,
}

impl std::fmt::Display for SkipReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SkipReason::NoSettings => f.write_str("no notification settings found"),
            SkipReason::Disabled => f.write_str("notifications disabled"),
            SkipReason::HourMismatch {
                current,
                configured,
            } => write!(f, "hour mismatch: current={current}, configured={configured}"),
            SkipReason::AlreadySent { date } => write!(f, "already sent for {date}"),
            SkipReason::NoDevices => f.write_str("no push tokens registered"),
            SkipReason::NoRecipes => f.write_str("no recipes in catalog"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SendReport {
    pub date: String,
    pub suggestion: String,
    pub delivered: usize,
    pub failed: usize,
    /// Ids of device records removed because their token is dead.
    pub pruned: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    Skipped(SkipReason),
    Sent(SendReport),
}

#[derive(Debug, thiserror::Error)]
pub enum SuggestionError {
    #[error("failed to load notification settings: {0}")]
    Settings(String),
    #[error("failed to read the clock: {0}")]
    Clock(String),
    #[error("failed to load registered devices: {0}")]
    Devices(String),
    #[error("failed to load recipes: {0}")]
    Recipes(String),
    #[error("chat completion failed: {0}")]
    Chat(String),
    #[error("push delivery failed: {0}")]
    Push(String),
    #[error("failed to remove stale devices: {0}")]
    Prune(String),
    #[error("failed to record send date: {0}")]
    RecordSent(String),
}

pub struct SuggestionJob<T, S, D, R, C, P> {
    time: T,
    settings: S,
    devices: D,
    recipes: R,
    chat: C,
    push: P,
    options: SuggestionOptions,
}

impl<T, S, D, R, C, P> SuggestionJob<T, S, D, R, C, P>
where
    T: TimeProvider,
    S: SettingsStore,
    D: DeviceRegistry,
    R: RecipeCatalog,
    C: ChatCompleter,
    P: PushSender,
{
    pub fn new(
        time: T,
        settings: S,
        devices: D,
        recipes: R,
        chat: C,
        push: P,
        options: SuggestionOptions,
    ) -> Self {
        Self {
            time,
            settings,
            devices,
            recipes,
            chat,
            push,
            options,
        }
    }

    pub async fn run(&self) -> Result<RunOutcome, SuggestionError> {
        let settings = self
            .settings
            .load_settings()
            .await
            .map_err(|err| SuggestionError::Settings(err.to_string()))?;
        let Some(settings) = settings else {
            return Ok(skip(SkipReason::NoSettings));
        };
        if !settings.enabled {
            return Ok(skip(SkipReason::Disabled));
        }

        let moment = clock::local_moment(self.time.now(), &self.options.zone)
            .map_err(|err| SuggestionError::Clock(err.to_string()))?;
        if moment.hour != settings.hour {
            return Ok(skip(SkipReason::HourMismatch {
                current: moment.hour,
                configured: settings.hour,
            }));
        }
        if settings.last_sent.as_deref() == Some(moment.date.as_str()) {
            return Ok(skip(SkipReason::AlreadySent { date: moment.date }));
        }

        let devices = self
            .devices
            .list_devices()
            .await
            .map_err(|err| SuggestionError::Devices(err.to_string()))?;
        let tokens = collect_tokens(&devices);
        if tokens.is_empty() {
            return Ok(skip(SkipReason::NoDevices));
        }

        let recipes = self
            .recipes
            .list_recipes()
            .await
            .map_err(|err| SuggestionError::Recipes(err.to_string()))?;
        if recipes.is_empty() {
            return Ok(skip(SkipReason::NoRecipes));
        }

        let top = ranking::top_recipes(&recipes);
        let user_message =
            ranking::user_message(&ranking::catalog_summary(&top), &ranking::all_titles(&recipes));
        let request = ChatRequest::new(
            &self.options.model,
            self.options.max_tokens,
            &ranking::system_prompt(&self.options.household),
            &[ChatMessage::user(user_message)],
        );
        let response = self
            .chat
            .complete(&request)
            .await
            .map_err(|err| SuggestionError::Chat(err.to_string()))?;
        let suggestion = ranking::suggestion_text(response.first_text());
        tracing::info!(%suggestion, "dinner suggestion generated");

        let message = PushMessage {
            title: NOTIFICATION_TITLE.to_string(),
            body: ranking::notification_body(&suggestion),
            icon: self.options.icon.clone(),
            badge: self.options.badge.clone(),
            link: self.options.link.clone(),
        };
        let response = self
            .push
            .send_multicast(&message, &tokens)
            .await
            .map_err(|err| SuggestionError::Push(err.to_string()))?;
        tracing::info!(
            sent = response.success_count(),
            failed = response.failure_count(),
            "dinner suggestion pushed"
        );

        let stale = stale_device_ids(&devices, &tokens, &response);
        if !stale.is_empty() {
            self.devices
                .delete_devices(&stale)
                .await
                .map_err(|err| SuggestionError::Prune(err.to_string()))?;
            tracing::info!(removed = stale.len(), "removed stale device tokens");
        }

        self.settings
            .record_sent(&moment.date)
            .await
            .map_err(|err| SuggestionError::RecordSent(err.to_string()))?;
        tracing::info!(date = %moment.date, "dinner suggestion sent");

        Ok(RunOutcome::Sent(SendReport {
            date: moment.date,
            suggestion,
            delivered: response.success_count(),
            failed: response.failure_count(),
            pruned: stale,
        }))
    }
}

fn skip(reason: SkipReason) -> RunOutcome {
    tracing::info!(%reason, "skipping dinner suggestion");
    RunOutcome::Skipped(reason)
}

/// Non-empty tokens, each once, in registry order.
fn collect_tokens(devices: &[DeviceEntry]) -> Vec<String> {
    let mut tokens: Vec<String> = Vec::new();
    for entry in devices {
        let token = &entry.device.token;
        if !token.is_empty() && !tokens.contains(token) {
            tokens.push(token.clone());
        }
    }
    tokens
}

fn stale_device_ids(
    devices: &[DeviceEntry],
    tokens: &[String],
    response: &BatchResponse,
) -> Vec<String> {
    let mut stale: Vec<String> = Vec::new();
    for (token, result) in tokens.iter().zip(&response.responses) {
        let Err(failure) = result else {
            continue;
        };
        if !failure.code.is_stale() {
            tracing::warn!(code = %failure.code, error = %failure.message, "push delivery failed");
            continue;
        }
        for entry in devices.iter().filter(|entry| &entry.device.token == token) {
            if !stale.contains(&entry.id) {
                stale.push(entry.id.clone());
            }
        }
    }
    stale
}

#[cfg(test)]
#[allow(non_snake_case)]
mod tests {
    use super::*;
    use crate::types::catalog::{NotificationSettings, RecipeRecord, RegisteredDevice};
    use crate::types::chat::ChatResponse;
    use crate::types::push::{PushErrorCode, PushFailure};

    use serde_json::{Value, json};
    use std::collections::HashMap;
    use std::future::{Ready, ready};
    use std::sync::{Arc, Mutex};
    use time::OffsetDateTime;
    use time::format_description::well_known::Rfc3339;

    #[derive(Debug)]
    struct FakeError(&'static str);

    impl std::fmt::Display for FakeError {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            f.write_str(self.0)
        }
    }

    #[derive(Clone)]
    struct FixedTime(OffsetDateTime);

    impl TimeProvider for FixedTime {
        type Sleep<'a>
            = Ready<()>
        where
            Self: 'a;

        fn now(&self) -> OffsetDateTime {
            self.0
        }

        fn sleep(&self, _duration: std::time::Duration) -> Self::Sleep<'_> {
            ready(())
        }
    }

    #[derive(Default)]
    struct StoreState {
        settings: Option<NotificationSettings>,
        devices: Vec<DeviceEntry>,
        recipes: Vec<RecipeRecord>,
        reads: Vec<&'static str>,
        writes: Vec<String>,
    }

    #[derive(Clone, Default)]
    struct FakeStore {
        state: Arc<Mutex<StoreState>>,
    }

    impl FakeStore {
        fn reads(&self) -> Vec<&'static str> {
            self.state.lock().expect("store lock").reads.clone()
        }

        fn writes(&self) -> Vec<String> {
            self.state.lock().expect("store lock").writes.clone()
        }

        fn settings(&self) -> Option<NotificationSettings> {
            self.state.lock().expect("store lock").settings.clone()
        }

        fn device_ids(&self) -> Vec<String> {
            let state = self.state.lock().expect("store lock");
            state.devices.iter().map(|entry| entry.id.clone()).collect()
        }
    }

    impl SettingsStore for FakeStore {
        type Error = FakeError;
        type Load<'a>
            = Ready<Result<Option<NotificationSettings>, FakeError>>
        where
            Self: 'a;
        type Write<'a>
            = Ready<Result<(), FakeError>>
        where
            Self: 'a;

        fn load_settings(&self) -> Self::Load<'_> {
            let mut state = self.state.lock().expect("store lock");
            state.reads.push("settings");
            ready(Ok(state.settings.clone()))
        }

        fn save_settings<'a>(&'a self, settings: &'a NotificationSettings) -> Self::Write<'a> {
            let mut state = self.state.lock().expect("store lock");
            state.writes.push("settings".to_string());
            state.settings = Some(settings.clone());
            ready(Ok(()))
        }

        fn record_sent<'a>(&'a self, date: &'a str) -> Self::Write<'a> {
            let mut state = self.state.lock().expect("store lock");
            state.writes.push(format!("lastSent={date}"));
            if let Some(settings) = state.settings.as_mut() {
                settings.last_sent = Some(date.to_string());
            }
            ready(Ok(()))
        }
    }

    impl DeviceRegistry for FakeStore {
        type Error = FakeError;
        type List<'a>
            = Ready<Result<Vec<DeviceEntry>, FakeError>>
        where
            Self: 'a;
        type Write<'a>
            = Ready<Result<(), FakeError>>
        where
            Self: 'a;

        fn list_devices(&self) -> Self::List<'_> {
            let mut state = self.state.lock().expect("store lock");
            state.reads.push("devices");
            ready(Ok(state.devices.clone()))
        }

        fn upsert_device<'a>(&'a self, id: &'a str, device: &'a RegisteredDevice) -> Self::Write<'a> {
            let mut state = self.state.lock().expect("store lock");
            state.writes.push(format!("upsert={id}"));
            state.devices.retain(|entry| entry.id != id);
            state.devices.push(DeviceEntry {
                id: id.to_string(),
                device: device.clone(),
            });
            ready(Ok(()))
        }

        fn delete_devices<'a>(&'a self, ids: &'a [String]) -> Self::Write<'a> {
            let mut state = self.state.lock().expect("store lock");
            state.writes.push(format!("delete={}", ids.join(",")));
            state.devices.retain(|entry| !ids.contains(&entry.id));
            ready(Ok(()))
        }
    }

    impl RecipeCatalog for FakeStore {
        type Error = FakeError;
        type List<'a>
            = Ready<Result<Vec<RecipeRecord>, FakeError>>
        where
            Self: 'a;

        fn list_recipes(&self) -> Self::List<'_> {
            let mut state = self.state.lock().expect("store lock");
            state.reads.push("recipes");
            ready(Ok(state.recipes.clone()))
        }
    }

    #[derive(Clone)]
    struct FakeChat {
        reply: Option<Value>,
        requests: Arc<Mutex<Vec<ChatRequest>>>,
    }

    impl FakeChat {
        fn replying(reply: Value) -> Self {
            Self {
                reply: Some(reply),
                requests: Arc::default(),
            }
        }

        fn failing() -> Self {
            Self {
                reply: None,
                requests: Arc::default(),
            }
        }

        fn requests(&self) -> Vec<ChatRequest> {
            self.requests.lock().expect("chat lock").clone()
        }
    }

    impl ChatCompleter for FakeChat {
        type Error = FakeError;
        type Fut<'a>
            = Ready<Result<ChatResponse, FakeError>>
        where
            Self: 'a;

        fn complete<'a>(&'a self, request: &'a ChatRequest) -> Self::Fut<'a> {
            self.requests.lock().expect("chat lock").push(request.clone());
            ready(
                self.reply
                    .clone()
                    .map(ChatResponse)
                    .ok_or(FakeError("upstream unreachable")),
            )
        }
    }

    #[derive(Clone, Default)]
    struct FakePush {
        failures: HashMap<String, PushErrorCode>,
        sent: Arc<Mutex<Vec<(PushMessage, Vec<String>)>>>,
    }

    impl FakePush {
        fn failing_with(failures: &[(&str, PushErrorCode)]) -> Self {
            Self {
                failures: failures
                    .iter()
                    .map(|(token, code)| (token.to_string(), code.clone()))
                    .collect(),
                sent: Arc::default(),
            }
        }

        fn sent(&self) -> Vec<(PushMessage, Vec<String>)> {
            self.sent.lock().expect("push lock").clone()
        }
    }

    impl PushSender for FakePush {
        type Error = FakeError;
        type Fut<'a>
            = Ready<Result<BatchResponse, FakeError>>
        where
            Self: 'a;

        fn send_multicast<'a>(
            &'a self,
            message: &'a PushMessage,
            tokens: &'a [String],
        ) -> Self::Fut<'a> {
            self.sent
                .lock()
                .expect("push lock")
                .push((message.clone(), tokens.to_vec()));
            let responses = tokens
                .iter()
                .map(|token| match self.failures.get(token) {
                    Some(code) => Err(PushFailure::new(code.clone(), "rejected")),
                    None => Ok(()),
                })
                .collect();
            ready(Ok(BatchResponse { responses }))
        }
    }

    fn at(raw: &str) -> OffsetDateTime {
        OffsetDateTime::parse(raw, &Rfc3339).expect("parse timestamp")
    }

    // 23:30Z on the 12th is 18:30 on the 12th in New York.
    const EVENING_UTC: &str = "2025-01-12T23:30:00Z";

    fn options() -> SuggestionOptions {
        SuggestionOptions {
            zone: TimeZone::get("America/New_York").expect("zone"),
            model: "claude-haiku-4-5-20251001".to_string(),
            max_tokens: 150,
            household: "Chris and Lindsay".to_string(),
            icon: "https://example.test/favicon.svg".to_string(),
            badge: "https://example.test/favicon.svg".to_string(),
            link: "https://example.test/recipes/".to_string(),
        }
    }

    fn device(id: &str, token: &str) -> DeviceEntry {
        DeviceEntry {
            id: id.to_string(),
            device: RegisteredDevice {
                token: token.to_string(),
                owner: format!("{id}@example.test"),
                updated_at: None,
            },
        }
    }

    fn recipe(title: &str, rating: Option<f64>, favorite: bool) -> RecipeRecord {
        RecipeRecord {
            id: title.to_lowercase(),
            title: title.to_string(),
            rating,
            favorite,
            tags: vec!["dinner".to_string()],
        }
    }

    fn seeded_store(settings: NotificationSettings) -> FakeStore {
        let store = FakeStore::default();
        {
            let mut state = store.state.lock().expect("store lock");
            state.settings = Some(settings);
            state.devices = vec![device("u1", "T1"), device("u2", "T2"), device("u3", "T3")];
            state.recipes = vec![
                recipe("Lasagna", Some(5.0), false),
                recipe("Tacos", Some(2.0), true),
                recipe("Salad", Some(3.0), false),
            ];
        }
        store
    }

    fn enabled_at(hour: u8) -> NotificationSettings {
        NotificationSettings {
            enabled: true,
            hour,
            last_sent: None,
        }
    }

    fn job(
        now: &str,
        store: &FakeStore,
        chat: &FakeChat,
        push: &FakePush,
    ) -> SuggestionJob<FixedTime, FakeStore, FakeStore, FakeStore, FakeChat, FakePush> {
        SuggestionJob::new(
            FixedTime(at(now)),
            store.clone(),
            store.clone(),
            store.clone(),
            chat.clone(),
            push.clone(),
            options(),
        )
    }

    fn haiku_reply(text: &str) -> Value {
        json!({"content": [{"type": "text", "text": text}], "stop_reason": "end_turn"})
    }

    #[tokio::test]
    async fn run__should_skip_without_settings() {
        // Given
        let store = FakeStore::default();
        let chat = FakeChat::replying(haiku_reply("Soup"));
        let push = FakePush::default();

        // When
        let outcome = job(EVENING_UTC, &store, &chat, &push).run().await.expect("run");

        // Then
        assert_eq!(outcome, RunOutcome::Skipped(SkipReason::NoSettings));
        assert!(store.writes().is_empty());
    }

    #[tokio::test]
    async fn run__should_only_read_settings_when_disabled() {
        // Given
        let store = seeded_store(NotificationSettings {
            enabled: false,
            hour: 18,
            last_sent: None,
        });
        let chat = FakeChat::replying(haiku_reply("Soup"));
        let push = FakePush::default();

        // When
        let outcome = job(EVENING_UTC, &store, &chat, &push).run().await.expect("run");

        // Then
        assert_eq!(outcome, RunOutcome::Skipped(SkipReason::Disabled));
        assert_eq!(store.reads(), vec!["settings"]);
        assert!(store.writes().is_empty());
        assert!(chat.requests().is_empty());
        assert!(push.sent().is_empty());
    }

    #[tokio::test]
    async fn run__should_skip_when_hour_differs_in_zone() {
        // Given
        // 18:30 UTC matches hour 18 only in UTC, not in New York.
        let store = seeded_store(enabled_at(18));
        let chat = FakeChat::replying(haiku_reply("Soup"));
        let push = FakePush::default();

        // When
        let outcome = job("2025-01-12T18:30:00Z", &store, &chat, &push)
            .run()
            .await
            .expect("run");

        // Then
        assert_eq!(
            outcome,
            RunOutcome::Skipped(SkipReason::HourMismatch {
                current: 13,
                configured: 18,
            })
        );
        assert!(store.writes().is_empty());
        assert!(chat.requests().is_empty());
    }

    #[tokio::test]
    async fn run__should_skip_when_already_sent_today() {
        // Given
        let store = seeded_store(NotificationSettings {
            enabled: true,
            hour: 18,
            last_sent: Some("2025-01-12".to_string()),
        });
        let chat = FakeChat::replying(haiku_reply("Soup"));
        let push = FakePush::default();

        // When
        let outcome = job(EVENING_UTC, &store, &chat, &push).run().await.expect("run");

        // Then
        assert_eq!(
            outcome,
            RunOutcome::Skipped(SkipReason::AlreadySent {
                date: "2025-01-12".to_string(),
            })
        );
        assert!(store.writes().is_empty());
        assert!(push.sent().is_empty());
    }

    #[tokio::test]
    async fn run__should_skip_when_no_tokens() {
        // Given
        let store = seeded_store(enabled_at(18));
        store.state.lock().expect("store lock").devices = vec![device("u1", "")];
        let chat = FakeChat::replying(haiku_reply("Soup"));
        let push = FakePush::default();

        // When
        let outcome = job(EVENING_UTC, &store, &chat, &push).run().await.expect("run");

        // Then
        assert_eq!(outcome, RunOutcome::Skipped(SkipReason::NoDevices));
        assert!(chat.requests().is_empty());
    }

    #[tokio::test]
    async fn run__should_skip_when_catalog_empty() {
        // Given
        let store = seeded_store(enabled_at(18));
        store.state.lock().expect("store lock").recipes.clear();
        let chat = FakeChat::replying(haiku_reply("Soup"));
        let push = FakePush::default();

        // When
        let outcome = job(EVENING_UTC, &store, &chat, &push).run().await.expect("run");

        // Then
        assert_eq!(outcome, RunOutcome::Skipped(SkipReason::NoRecipes));
        assert!(chat.requests().is_empty());
        assert!(store.writes().is_empty());
    }

    #[tokio::test]
    async fn run__should_send_suggestion_and_record_date() {
        // Given
        let store = seeded_store(enabled_at(18));
        let chat = FakeChat::replying(haiku_reply("  Lasagna night! It is cold out.  "));
        let push = FakePush::default();

        // When
        let outcome = job(EVENING_UTC, &store, &chat, &push).run().await.expect("run");

        // Then
        let RunOutcome::Sent(report) = outcome else {
            panic!("expected a send, got {outcome:?}");
        };
        assert_eq!(report.date, "2025-01-12");
        assert_eq!(report.suggestion, "Lasagna night! It is cold out.");
        assert_eq!(report.delivered, 3);
        assert!(report.pruned.is_empty());

        let requests = chat.requests();
        assert_eq!(requests.len(), 1);
        let body = serde_json::to_value(&requests[0]).expect("encode");
        assert_eq!(body["model"], "claude-haiku-4-5-20251001");
        assert_eq!(body["max_tokens"], 150);
        let user = body["messages"][0]["content"].as_str().expect("user text");
        assert!(user.contains("- Tacos (★2, fav, tags: dinner)\n- Lasagna (★5, tags: dinner)"));
        assert!(user.contains("Lasagna, Tacos, Salad"));

        let sent = push.sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].0.title, "Tonight's Dinner Idea");
        assert_eq!(sent[0].0.body, "Lasagna night! It is cold out.");
        assert_eq!(sent[0].0.link, "https://example.test/recipes/");
        assert_eq!(sent[0].1, vec!["T1", "T2", "T3"]);

        assert_eq!(
            store.settings().expect("settings").last_sent.as_deref(),
            Some("2025-01-12")
        );
    }

    #[tokio::test]
    async fn run__should_use_fallback_for_empty_reply() {
        // Given
        let store = seeded_store(enabled_at(18));
        let chat = FakeChat::replying(json!({"content": []}));
        let push = FakePush::default();

        // When
        job(EVENING_UTC, &store, &chat, &push).run().await.expect("run");

        // Then
        assert_eq!(
            push.sent()[0].0.body,
            "How about revisiting one of your favorites tonight?"
        );
    }

    #[tokio::test]
    async fn run__should_truncate_long_suggestion() {
        // Given
        let store = seeded_store(enabled_at(18));
        let chat = FakeChat::replying(haiku_reply(&"a".repeat(250)));
        let push = FakePush::default();

        // When
        job(EVENING_UTC, &store, &chat, &push).run().await.expect("run");

        // Then
        let body = &push.sent()[0].0.body;
        assert_eq!(body.chars().count(), 180);
        assert!(body.ends_with("..."));
    }

    #[tokio::test]
    async fn run__should_prune_unregistered_token_and_still_record_date() {
        // Given
        let store = seeded_store(enabled_at(18));
        let chat = FakeChat::replying(haiku_reply("Tacos."));
        let push = FakePush::failing_with(&[("T2", PushErrorCode::Unregistered)]);

        // When
        let outcome = job(EVENING_UTC, &store, &chat, &push).run().await.expect("run");

        // Then
        let RunOutcome::Sent(report) = outcome else {
            panic!("expected a send, got {outcome:?}");
        };
        assert_eq!(report.delivered, 2);
        assert_eq!(report.failed, 1);
        assert_eq!(report.pruned, vec!["u2"]);
        assert_eq!(store.device_ids(), vec!["u1", "u3"]);
        assert_eq!(store.writes(), vec!["delete=u2", "lastSent=2025-01-12"]);
    }

    #[tokio::test]
    async fn run__should_keep_devices_with_transient_failures() {
        // Given
        let store = seeded_store(enabled_at(18));
        let chat = FakeChat::replying(haiku_reply("Tacos."));
        let push = FakePush::failing_with(&[
            ("T1", PushErrorCode::Other("UNAVAILABLE".to_string())),
            ("T3", PushErrorCode::InvalidToken),
        ]);

        // When
        job(EVENING_UTC, &store, &chat, &push).run().await.expect("run");

        // Then
        assert_eq!(store.device_ids(), vec!["u1", "u2"]);
    }

    #[tokio::test]
    async fn run__should_remove_every_record_sharing_a_dead_token() {
        // Given
        let store = seeded_store(enabled_at(18));
        store
            .state
            .lock()
            .expect("store lock")
            .devices
            .push(device("u4", "T2"));
        let chat = FakeChat::replying(haiku_reply("Tacos."));
        let push = FakePush::failing_with(&[("T2", PushErrorCode::InvalidToken)]);

        // When
        job(EVENING_UTC, &store, &chat, &push).run().await.expect("run");

        // Then
        assert_eq!(push.sent()[0].1, vec!["T1", "T2", "T3"]);
        assert_eq!(store.device_ids(), vec!["u1", "u3"]);
    }

    #[tokio::test]
    async fn run__should_fail_without_recording_when_chat_fails() {
        // Given
        let store = seeded_store(enabled_at(18));
        let chat = FakeChat::failing();
        let push = FakePush::default();

        // When
        let result = job(EVENING_UTC, &store, &chat, &push).run().await;

        // Then
        assert!(matches!(result, Err(SuggestionError::Chat(_))));
        assert!(push.sent().is_empty());
        assert!(store.writes().is_empty());
    }
}
