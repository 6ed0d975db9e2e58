use crate::adapters::fcm::DEFAULT_FCM_BASE_URL;
use crate::auth::{AuthError, AuthKey};
use crate::push::vapid::{VapidConfigStatus, load_vapid_config};
use crate::types::push::VapidConfig;

use jiff::tz::TimeZone;
use serde::Deserialize;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};

pub const DEFAULT_TIME_ZONE: &str = "America/New_York";
const DEFAULT_LISTEN: ([u8; 4], u16) = ([127, 0, 0, 1], 3000);
const DEFAULT_DATA_DIR: &str = "data";
const DEFAULT_CHAT_BASE_URL: &str = "https://api.anthropic.com";
const DEFAULT_API_VERSION: &str = "2023-06-01";
const DEFAULT_SUGGESTION_MODEL: &str = "claude-haiku-4-5-20251001";
const DEFAULT_SUGGESTION_MAX_TOKENS: u32 = 150;
const DEFAULT_HOUSEHOLD: &str = "Chris and Lindsay";
const DEFAULT_APP_NAME: &str = "CMLB Recipes";
const DEFAULT_APP_PATH: &str = "/cmlbRecipes/";
const DEFAULT_APP_LINK: &str = "https://cjroberts28.github.io/cmlbRecipes/";
const DEFAULT_ICON_URL: &str = "https://cjroberts28.github.io/cmlbRecipes/favicon.svg";
const DEFAULT_ALLOWED_ORIGIN: &str = "https://cjroberts28.github.io";

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub listen: SocketAddr,
    pub data_dir: PathBuf,
    /// Zone in which the notification hour and the send date are evaluated.
    pub time_zone: TimeZone,
    pub chat: ChatConfig,
    pub suggestion: SuggestionConfig,
    pub web: WebConfig,
    pub push: PushBackend,
    /// Bearer-token secret for the device and settings endpoints. Those
    /// endpoints are open when unset.
    pub auth_key: Option<AuthKey>,
}

#[derive(Debug, Clone)]
pub struct ChatConfig {
    pub base_url: String,
    pub api_key: String,
    pub api_version: String,
}

#[derive(Debug, Clone)]
pub struct SuggestionConfig {
    pub model: String,
    pub max_tokens: u32,
    pub household: String,
}

/// What the browser sees: notification branding and where clicks lead.
#[derive(Debug, Clone)]
pub struct WebConfig {
    pub app_name: String,
    pub app_path: String,
    pub icon_url: String,
    pub badge_url: String,
    pub link: String,
    /// Origins allowed to call the device and settings endpoints from a browser.
    pub allowed_origins: Vec<String>,
}

#[derive(Debug, Clone)]
pub enum PushBackend {
    Disabled,
    Fcm {
        service_account: PathBuf,
        base_url: String,
    },
    WebPush(VapidConfig),
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid config file: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("an Anthropic API key is required (--anthropic-api-key)")]
    MissingApiKey,
    #[error("unknown time zone '{name}': {reason}")]
    InvalidTimeZone { name: String, reason: String },
    #[error("push backend 'fcm' needs --fcm-service-account")]
    MissingServiceAccount,
    #[error("push backend 'webpush' needs a complete VAPID configuration")]
    IncompleteVapid,
    #[error("--auth-key: {0}")]
    InvalidAuthKey(#[from] AuthError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PushBackendKind {
    Disabled,
    Fcm,
    Webpush,
}

/// Non-secret settings read from the optional TOML file.
#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ConfigFile {
    pub listen: Option<SocketAddr>,
    pub data_dir: Option<PathBuf>,
    pub time_zone: Option<String>,
    pub chat: ChatSection,
    pub suggestion: SuggestionSection,
    pub web: WebSection,
    pub push: PushSection,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ChatSection {
    pub base_url: Option<String>,
    pub api_version: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SuggestionSection {
    pub model: Option<String>,
    pub max_tokens: Option<u32>,
    pub household: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct WebSection {
    pub app_name: Option<String>,
    pub app_path: Option<String>,
    pub icon_url: Option<String>,
    pub badge_url: Option<String>,
    pub link: Option<String>,
    pub allowed_origins: Option<Vec<String>>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PushSection {
    pub backend: Option<PushBackendKind>,
    pub fcm_base_url: Option<String>,
}

impl ConfigFile {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(toml::from_str(&raw)?)
    }
}

/// Values that only come from flags or the environment.
#[derive(Debug, Clone, Default)]
pub struct CliValues {
    pub listen: Option<SocketAddr>,
    pub data_dir: Option<PathBuf>,
    pub anthropic_api_key: Option<String>,
    pub fcm_service_account: Option<PathBuf>,
    pub vapid_private_key: Option<String>,
    pub vapid_public_key: Option<String>,
    pub vapid_subject: Option<String>,
    pub auth_key: Option<String>,
}

impl AppConfig {
    pub fn resolve(file: ConfigFile, cli: CliValues) -> Result<Self, ConfigError> {
        let api_key = cli
            .anthropic_api_key
            .as_deref()
            .map(str::trim)
            .filter(|key| !key.is_empty())
            .ok_or(ConfigError::MissingApiKey)?
            .to_string();

        let zone_name = file
            .time_zone
            .unwrap_or_else(|| DEFAULT_TIME_ZONE.to_string());
        let time_zone =
            TimeZone::get(&zone_name).map_err(|err| ConfigError::InvalidTimeZone {
                reason: err.to_string(),
                name: zone_name,
            })?;

        let push = resolve_push_backend(&file.push, &cli)?;
        let auth_key = cli
            .auth_key
            .as_deref()
            .map(str::trim)
            .filter(|key| !key.is_empty())
            .map(AuthKey::decode)
            .transpose()?;

        let icon_url = file
            .web
            .icon_url
            .unwrap_or_else(|| DEFAULT_ICON_URL.to_string());
        let badge_url = file.web.badge_url.unwrap_or_else(|| icon_url.clone());

        Ok(Self {
            listen: cli
                .listen
                .or(file.listen)
                .unwrap_or_else(|| SocketAddr::from(DEFAULT_LISTEN)),
            data_dir: cli
                .data_dir
                .or(file.data_dir)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_DATA_DIR)),
            time_zone,
            chat: ChatConfig {
                base_url: file
                    .chat
                    .base_url
                    .unwrap_or_else(|| DEFAULT_CHAT_BASE_URL.to_string()),
                api_key,
                api_version: file
                    .chat
                    .api_version
                    .unwrap_or_else(|| DEFAULT_API_VERSION.to_string()),
            },
            suggestion: SuggestionConfig {
                model: file
                    .suggestion
                    .model
                    .unwrap_or_else(|| DEFAULT_SUGGESTION_MODEL.to_string()),
                max_tokens: file
                    .suggestion
                    .max_tokens
                    .unwrap_or(DEFAULT_SUGGESTION_MAX_TOKENS),
                household: file
                    .suggestion
                    .household
                    .unwrap_or_else(|| DEFAULT_HOUSEHOLD.to_string()),
            },
            web: WebConfig {
                app_name: file
                    .web
                    .app_name
                    .unwrap_or_else(|| DEFAULT_APP_NAME.to_string()),
                app_path: file
                    .web
                    .app_path
                    .unwrap_or_else(|| DEFAULT_APP_PATH.to_string()),
                icon_url,
                badge_url,
                link: file
                    .web
                    .link
                    .unwrap_or_else(|| DEFAULT_APP_LINK.to_string()),
                allowed_origins: file
                    .web
                    .allowed_origins
                    .unwrap_or_else(|| vec![DEFAULT_ALLOWED_ORIGIN.to_string()]),
            },
            push,
            auth_key,
        })
    }
}

fn resolve_push_backend(section: &PushSection, cli: &CliValues) -> Result<PushBackend, ConfigError> {
    let vapid = load_vapid_config(
        cli.vapid_private_key.as_deref(),
        cli.vapid_public_key.as_deref(),
        cli.vapid_subject.as_deref(),
    );
    let kind = match section.backend {
        Some(kind) => kind,
        None if cli.fcm_service_account.is_some() => PushBackendKind::Fcm,
        None => match vapid {
            VapidConfigStatus::Missing => PushBackendKind::Disabled,
            VapidConfigStatus::Ready(_) | VapidConfigStatus::Incomplete => PushBackendKind::Webpush,
        },
    };

    match kind {
        PushBackendKind::Disabled => Ok(PushBackend::Disabled),
        PushBackendKind::Fcm => {
            let service_account = cli
                .fcm_service_account
                .clone()
                .ok_or(ConfigError::MissingServiceAccount)?;
            Ok(PushBackend::Fcm {
                service_account,
                base_url: section
                    .fcm_base_url
                    .clone()
                    .unwrap_or_else(|| DEFAULT_FCM_BASE_URL.to_string()),
            })
        }
        PushBackendKind::Webpush => match vapid {
            VapidConfigStatus::Ready(vapid) => Ok(PushBackend::WebPush(vapid)),
            VapidConfigStatus::Incomplete | VapidConfigStatus::Missing => {
                Err(ConfigError::IncompleteVapid)
            }
        },
    }
}

#[cfg(test)]
impl Default for AppConfig {
    fn default() -> Self {
        AppConfig::resolve(
            ConfigFile::default(),
            CliValues {
                anthropic_api_key: Some("test-key".to_string()),
                ..CliValues::default()
            },
        )
        .expect("default config")
    }
}
