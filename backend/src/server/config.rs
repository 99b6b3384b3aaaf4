//! Application settings and the server configuration built from them.
//!
//! [`AppSettings`] is loaded through OrthoConfig, so every value can come
//! from a CLI flag, a `WEATHERWEAR_*` environment variable or a config file.
//! Every setting except the database URL, the OpenAI key and the OAuth
//! clients has a default, so an empty environment still loads. Blank values
//! fall back to the same defaults in the accessors.

use std::fmt;
use std::net::SocketAddr;
use std::time::Duration;

use ortho_config::OrthoConfig;
use serde::Deserialize;
use url::Url;
use zeroize::Zeroizing;

use weatherwear::domain::AuthProvider;
use weatherwear::inbound::http::session_config::SessionSettings;
use weatherwear::inbound::http::state::SiteUrls;
use weatherwear::outbound::persistence::DbPool;

const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8080";
const DEFAULT_APP_URL: &str = "http://localhost:3000";
const DEFAULT_PUBLIC_URL: &str = "http://localhost:8080";
const DEFAULT_OPENAI_BASE_URL: &str = "https://api.openai.com/v1";
const DEFAULT_CHAT_MODEL: &str = "gpt-3.5-turbo-1106";
const DEFAULT_IMAGE_MODEL: &str = "dall-e-3";
const DEFAULT_WEATHER_BASE_URL: &str = "https://api.open-meteo.com/v1/forecast";
const DEFAULT_GEOCODING_BASE_URL: &str = "https://geocoding-api.open-meteo.com/v1/search";
const DEFAULT_UPSTREAM_TIMEOUT_SECS: u64 = 30;
const DEFAULT_IMAGE_TIMEOUT_SECS: u64 = 120;

/// Invalid values in [`AppSettings`].
#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    /// The bind address is not `host:port`.
    #[error("invalid bind address {value:?}: {source}")]
    BindAddr {
        value: String,
        source: std::net::AddrParseError,
    },
    /// A URL setting did not parse.
    #[error("invalid URL for {setting}: {source}")]
    Url {
        setting: &'static str,
        source: url::ParseError,
    },
}

/// Runtime settings for the server and its outbound adapters.
#[derive(Clone, Default, Deserialize, OrthoConfig)]
#[ortho_config(prefix = "WEATHERWEAR")]
pub struct AppSettings {
    /// Socket address to listen on.
    #[ortho_config(default = DEFAULT_BIND_ADDR.to_owned())]
    pub bind_addr: Option<String>,
    /// Postgres URL. Without it, accounts and history live in memory.
    pub database_url: Option<String>,
    /// Front-end origin; federated logins redirect here.
    #[ortho_config(default = DEFAULT_APP_URL.to_owned())]
    pub app_url: Option<String>,
    /// Externally visible origin of this service, used for OAuth callbacks.
    #[ortho_config(default = DEFAULT_PUBLIC_URL.to_owned())]
    pub public_url: Option<String>,
    /// OpenAI bearer key. Without it, canned recommendations are served.
    pub openai_api_key: Option<String>,
    /// OpenAI API root.
    #[ortho_config(default = DEFAULT_OPENAI_BASE_URL.to_owned())]
    pub openai_base_url: Option<String>,
    /// Chat completion model.
    #[ortho_config(default = DEFAULT_CHAT_MODEL.to_owned())]
    pub chat_model: Option<String>,
    /// Image generation model.
    #[ortho_config(default = DEFAULT_IMAGE_MODEL.to_owned())]
    pub image_model: Option<String>,
    /// Open-Meteo forecast endpoint.
    #[ortho_config(default = DEFAULT_WEATHER_BASE_URL.to_owned())]
    pub weather_base_url: Option<String>,
    /// Open-Meteo geocoding endpoint.
    #[ortho_config(default = DEFAULT_GEOCODING_BASE_URL.to_owned())]
    pub geocoding_base_url: Option<String>,
    /// Google OAuth client id.
    pub google_client_id: Option<String>,
    /// Google OAuth client secret.
    pub google_client_secret: Option<String>,
    /// Facebook OAuth client id.
    pub facebook_client_id: Option<String>,
    /// Facebook OAuth client secret.
    pub facebook_client_secret: Option<String>,
    /// Timeout in seconds for forecast, completion and OAuth calls.
    #[ortho_config(default = DEFAULT_UPSTREAM_TIMEOUT_SECS)]
    pub upstream_timeout_secs: Option<u64>,
    /// Timeout in seconds for image generation.
    #[ortho_config(default = DEFAULT_IMAGE_TIMEOUT_SECS)]
    pub image_timeout_secs: Option<u64>,
}

impl fmt::Debug for AppSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppSettings")
            .field("bind_addr", &self.bind_addr)
            .field("database_configured", &self.database_url.is_some())
            .field("app_url", &self.app_url)
            .field("public_url", &self.public_url)
            .field("openai_configured", &self.openai_api_key.is_some())
            .field("chat_model", &self.chat_model)
            .field("image_model", &self.image_model)
            .finish_non_exhaustive()
    }
}

fn non_blank(value: Option<&String>) -> Option<&str> {
    value.map(|raw| raw.trim()).filter(|raw| !raw.is_empty())
}

fn parse_url(
    setting: &'static str,
    value: Option<&String>,
    default: &str,
) -> Result<Url, SettingsError> {
    Url::parse(non_blank(value).unwrap_or(default))
        .map_err(|source| SettingsError::Url { setting, source })
}

impl AppSettings {
    /// Listen address, default `0.0.0.0:8080`.
    pub fn bind_addr(&self) -> Result<SocketAddr, SettingsError> {
        let value = non_blank(self.bind_addr.as_ref()).unwrap_or(DEFAULT_BIND_ADDR);
        value.parse().map_err(|source| SettingsError::BindAddr {
            value: value.to_owned(),
            source,
        })
    }

    /// Database URL, when persistence is configured.
    pub fn database_url(&self) -> Option<&str> {
        non_blank(self.database_url.as_ref())
    }

    /// Front-end and public origins.
    pub fn site_urls(&self) -> Result<SiteUrls, SettingsError> {
        Ok(SiteUrls {
            app_url: parse_url("app_url", self.app_url.as_ref(), DEFAULT_APP_URL)?,
            public_url: parse_url("public_url", self.public_url.as_ref(), DEFAULT_PUBLIC_URL)?,
        })
    }

    /// OpenAI bearer key, when configured.
    pub fn openai_api_key(&self) -> Option<Zeroizing<String>> {
        non_blank(self.openai_api_key.as_ref()).map(|key| Zeroizing::new(key.to_owned()))
    }

    pub fn openai_base_url(&self) -> Result<Url, SettingsError> {
        parse_url(
            "openai_base_url",
            self.openai_base_url.as_ref(),
            DEFAULT_OPENAI_BASE_URL,
        )
    }

    pub fn chat_model(&self) -> &str {
        non_blank(self.chat_model.as_ref()).unwrap_or(DEFAULT_CHAT_MODEL)
    }

    pub fn image_model(&self) -> &str {
        non_blank(self.image_model.as_ref()).unwrap_or(DEFAULT_IMAGE_MODEL)
    }

    pub fn weather_base_url(&self) -> Result<Url, SettingsError> {
        parse_url(
            "weather_base_url",
            self.weather_base_url.as_ref(),
            DEFAULT_WEATHER_BASE_URL,
        )
    }

    pub fn geocoding_base_url(&self) -> Result<Url, SettingsError> {
        parse_url(
            "geocoding_base_url",
            self.geocoding_base_url.as_ref(),
            DEFAULT_GEOCODING_BASE_URL,
        )
    }

    /// Client id and secret for `provider`; `None` unless both are set.
    pub fn oauth_client(&self, provider: AuthProvider) -> Option<(String, Zeroizing<String>)> {
        let (id, secret) = match provider {
            AuthProvider::Google => (&self.google_client_id, &self.google_client_secret),
            AuthProvider::Facebook => (&self.facebook_client_id, &self.facebook_client_secret),
            AuthProvider::Local => return None,
        };
        let id = non_blank(id.as_ref())?;
        let secret = non_blank(secret.as_ref())?;
        Some((id.to_owned(), Zeroizing::new(secret.to_owned())))
    }

    pub fn upstream_timeout(&self) -> Duration {
        Duration::from_secs(
            self.upstream_timeout_secs
                .unwrap_or(DEFAULT_UPSTREAM_TIMEOUT_SECS),
        )
    }

    pub fn image_timeout(&self) -> Duration {
        Duration::from_secs(self.image_timeout_secs.unwrap_or(DEFAULT_IMAGE_TIMEOUT_SECS))
    }
}

/// Everything [`super::create_server`] needs.
pub struct ServerConfig {
    pub(crate) session: SessionSettings,
    pub(crate) settings: AppSettings,
    pub(crate) bind_addr: SocketAddr,
    pub(crate) db_pool: Option<DbPool>,
}

impl ServerConfig {
    /// Configuration from validated session settings and app settings.
    ///
    /// # Errors
    ///
    /// Returns [`SettingsError`] when the bind address is malformed.
    pub fn new(session: SessionSettings, settings: AppSettings) -> Result<Self, SettingsError> {
        Ok(Self {
            bind_addr: settings.bind_addr()?,
            session,
            settings,
            db_pool: None,
        })
    }

    /// Attach a database connection pool for the persistence adapters.
    #[must_use]
    pub fn with_db_pool(mut self, pool: DbPool) -> Self {
        self.db_pool = Some(pool);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::ffi::OsString;

    use env_lock::lock_env;
    use rstest::rstest;

    const VARS: [&str; 16] = [
        "WEATHERWEAR_BIND_ADDR",
        "WEATHERWEAR_DATABASE_URL",
        "WEATHERWEAR_APP_URL",
        "WEATHERWEAR_PUBLIC_URL",
        "WEATHERWEAR_OPENAI_API_KEY",
        "WEATHERWEAR_OPENAI_BASE_URL",
        "WEATHERWEAR_CHAT_MODEL",
        "WEATHERWEAR_IMAGE_MODEL",
        "WEATHERWEAR_WEATHER_BASE_URL",
        "WEATHERWEAR_GEOCODING_BASE_URL",
        "WEATHERWEAR_GOOGLE_CLIENT_ID",
        "WEATHERWEAR_GOOGLE_CLIENT_SECRET",
        "WEATHERWEAR_FACEBOOK_CLIENT_ID",
        "WEATHERWEAR_FACEBOOK_CLIENT_SECRET",
        "WEATHERWEAR_UPSTREAM_TIMEOUT_SECS",
        "WEATHERWEAR_IMAGE_TIMEOUT_SECS",
    ];

    fn load() -> AppSettings {
        AppSettings::load_from_iter([OsString::from("weatherwear")]).expect("config should load")
    }

    #[rstest]
    fn defaults_apply_when_unset() {
        let _guard = lock_env(VARS.map(|name| (name, None::<String>)));
        let settings = load();
        assert_eq!(
            settings.bind_addr().expect("default addr"),
            "0.0.0.0:8080".parse::<SocketAddr>().expect("static addr")
        );
        assert!(settings.database_url().is_none());
        let urls = settings.site_urls().expect("default urls");
        assert_eq!(urls.app_url.as_str(), "http://localhost:3000/");
        assert_eq!(settings.chat_model(), DEFAULT_CHAT_MODEL);
        assert_eq!(settings.image_model(), DEFAULT_IMAGE_MODEL);
        assert_eq!(settings.upstream_timeout(), Duration::from_secs(30));
        assert_eq!(settings.image_timeout(), Duration::from_secs(120));
        assert!(settings.oauth_client(AuthProvider::Google).is_none());
    }

    #[rstest]
    fn an_empty_environment_still_populates_the_defaults_layer() {
        let _guard = lock_env(VARS.map(|name| (name, None::<String>)));
        let settings = load();
        assert_eq!(settings.bind_addr.as_deref(), Some(DEFAULT_BIND_ADDR));
        assert_eq!(settings.chat_model.as_deref(), Some(DEFAULT_CHAT_MODEL));
        assert_eq!(
            settings.weather_base_url.as_deref(),
            Some(DEFAULT_WEATHER_BASE_URL)
        );
        assert_eq!(settings.image_timeout_secs, Some(DEFAULT_IMAGE_TIMEOUT_SECS));
        assert!(settings.openai_api_key.is_none());
    }

    #[rstest]
    fn environment_overrides_are_respected() {
        let _guard = lock_env([
            ("WEATHERWEAR_BIND_ADDR", Some("127.0.0.1:9000".to_owned())),
            ("WEATHERWEAR_DATABASE_URL", Some("postgres://db/ww".to_owned())),
            ("WEATHERWEAR_APP_URL", Some("https://wear.example".to_owned())),
            ("WEATHERWEAR_CHAT_MODEL", Some("gpt-4o-mini".to_owned())),
            ("WEATHERWEAR_GOOGLE_CLIENT_ID", Some("client".to_owned())),
            ("WEATHERWEAR_GOOGLE_CLIENT_SECRET", Some("secret".to_owned())),
        ]);
        let settings = load();
        assert_eq!(
            settings.bind_addr().expect("addr"),
            "127.0.0.1:9000".parse::<SocketAddr>().expect("static addr")
        );
        assert_eq!(settings.database_url(), Some("postgres://db/ww"));
        assert_eq!(
            settings.site_urls().expect("urls").app_url.as_str(),
            "https://wear.example/"
        );
        assert_eq!(settings.chat_model(), "gpt-4o-mini");
        let (id, secret) = settings
            .oauth_client(AuthProvider::Google)
            .expect("google configured");
        assert_eq!(id, "client");
        assert_eq!(secret.as_str(), "secret");
    }

    #[rstest]
    #[case(Some("client"), None)]
    #[case(None, Some("secret"))]
    #[case(Some("  "), Some("secret"))]
    fn oauth_needs_both_halves(#[case] id: Option<&str>, #[case] secret: Option<&str>) {
        let settings = AppSettings {
            facebook_client_id: id.map(str::to_owned),
            facebook_client_secret: secret.map(str::to_owned),
            ..AppSettings::default()
        };
        assert!(settings.oauth_client(AuthProvider::Facebook).is_none());
    }

    #[rstest]
    fn malformed_values_are_reported() {
        let settings = AppSettings {
            bind_addr: Some("localhost".to_owned()),
            public_url: Some("not a url".to_owned()),
            ..AppSettings::default()
        };
        assert!(matches!(settings.bind_addr(), Err(SettingsError::BindAddr { .. })));
        assert!(matches!(
            settings.site_urls(),
            Err(SettingsError::Url { setting: "public_url", .. })
        ));
    }

    #[rstest]
    fn debug_output_hides_secrets() {
        let settings = AppSettings {
            openai_api_key: Some("sk-live".to_owned()),
            database_url: Some("postgres://user:hunter2@db/ww".to_owned()),
            ..AppSettings::default()
        };
        let rendered = format!("{settings:?}");
        assert!(!rendered.contains("sk-live"));
        assert!(!rendered.contains("hunter2"));
    }
}
