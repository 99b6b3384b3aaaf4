//! Builders for HTTP state ports from the server configuration.
//!
//! Every outbound adapter has an in-process fallback so the server can run
//! without a database, an OpenAI key or OAuth credentials.

use std::io;
use std::sync::Arc;

use actix_web::web;
use mockable::DefaultClock;
use tracing::{info, warn};

use weatherwear::domain::ports::{
    CredentialStore, FixtureImageGeneration, FixtureSessions, FixtureStore,
    FixtureTextCompletion, GenerationRepository, IdentityProvider, IdentityProviders,
    ImageGeneration, SessionRepository, TextCompletion, WeatherSource,
};
use weatherwear::domain::{
    AccountManager, AuthProvider, HistoryLedger, RecommendationOrchestrator, RecommendationPorts,
};
use weatherwear::inbound::http::session_store::ServerSessionStore;
use weatherwear::inbound::http::state::{HttpState, HttpStatePorts, SiteUrls};
use weatherwear::outbound::oauth::{OAuthClientCredentials, OAuthEndpoints, OAuthIdentityProvider};
use weatherwear::outbound::open_meteo::OpenMeteoSource;
use weatherwear::outbound::openai::{OpenAiClient, OpenAiSettings};
use weatherwear::outbound::password::Argon2PasswordHasher;
use weatherwear::outbound::persistence::{
    DbPool, DieselCredentialStore, DieselGenerationRepository, DieselSessionRepository,
};

use super::ServerConfig;
use super::config::AppSettings;

fn config_error(context: &str, err: impl std::fmt::Display) -> io::Error {
    io::Error::other(format!("{context}: {err}"))
}

/// Build a pair of ports from one backing adapter when a pool is available,
/// otherwise from `fallback`.
fn build_store_pair<A, MakeAdapter, Cast, Fallback>(
    pool: Option<&DbPool>,
    make_adapter: MakeAdapter,
    cast: Cast,
    fallback: Fallback,
) -> (Arc<dyn CredentialStore>, Arc<dyn GenerationRepository>)
where
    MakeAdapter: FnOnce(&DbPool) -> A,
    Cast: FnOnce(A) -> (Arc<dyn CredentialStore>, Arc<dyn GenerationRepository>),
    Fallback: FnOnce() -> (Arc<dyn CredentialStore>, Arc<dyn GenerationRepository>),
{
    match pool {
        Some(pool) => cast(make_adapter(pool)),
        None => fallback(),
    }
}

fn build_stores(
    pool: Option<&DbPool>,
) -> (Arc<dyn CredentialStore>, Arc<dyn GenerationRepository>) {
    build_store_pair(
        pool,
        |pool| {
            (
                DieselCredentialStore::new(pool.clone()),
                DieselGenerationRepository::new(pool.clone()),
            )
        },
        |(accounts, history)| {
            (
                Arc::new(accounts) as Arc<dyn CredentialStore>,
                Arc::new(history) as Arc<dyn GenerationRepository>,
            )
        },
        || {
            warn!("no database configured; accounts and history are kept in memory");
            let store = Arc::new(FixtureStore::default());
            (
                store.clone() as Arc<dyn CredentialStore>,
                store as Arc<dyn GenerationRepository>,
            )
        },
    )
}

/// Session storage for the middleware: Postgres when a pool is available,
/// otherwise process memory, which loses every session on restart.
pub(super) fn build_session_store(pool: Option<&DbPool>) -> ServerSessionStore {
    let sessions: Arc<dyn SessionRepository> = match pool {
        Some(pool) => Arc::new(DieselSessionRepository::new(pool.clone())),
        None => {
            warn!("no database configured; sessions are kept in memory");
            Arc::new(FixtureSessions::default())
        }
    };
    ServerSessionStore::new(sessions)
}

fn build_generators(
    settings: &AppSettings,
) -> io::Result<(Arc<dyn TextCompletion>, Arc<dyn ImageGeneration>)> {
    let Some(api_key) = settings.openai_api_key() else {
        warn!("no OpenAI key configured; serving canned recommendations");
        return Ok((
            Arc::new(FixtureTextCompletion),
            Arc::new(FixtureImageGeneration),
        ));
    };
    let client = OpenAiClient::new(OpenAiSettings {
        base_url: settings
            .openai_base_url()
            .map_err(|err| config_error("OpenAI settings", err))?,
        api_key,
        chat_model: settings.chat_model().to_owned(),
        image_model: settings.image_model().to_owned(),
        chat_timeout: settings.upstream_timeout(),
        image_timeout: settings.image_timeout(),
    })
    .map_err(|err| config_error("OpenAI client", err))?;
    let client = Arc::new(client);
    Ok((
        client.clone() as Arc<dyn TextCompletion>,
        client as Arc<dyn ImageGeneration>,
    ))
}

fn build_weather(settings: &AppSettings) -> io::Result<Arc<dyn WeatherSource>> {
    let source = OpenMeteoSource::new(
        settings
            .weather_base_url()
            .map_err(|err| config_error("weather settings", err))?,
        settings
            .geocoding_base_url()
            .map_err(|err| config_error("weather settings", err))?,
        settings.upstream_timeout(),
    )
    .map_err(|err| config_error("weather client", err))?;
    Ok(Arc::new(source))
}

fn build_identity_provider(
    settings: &AppSettings,
    urls: &SiteUrls,
    provider: AuthProvider,
) -> io::Result<Option<Arc<dyn IdentityProvider>>> {
    let Some((client_id, client_secret)) = settings.oauth_client(provider) else {
        info!(%provider, "OAuth login disabled; client credentials not configured");
        return Ok(None);
    };
    let endpoints = match provider {
        AuthProvider::Google => OAuthEndpoints::google(),
        AuthProvider::Facebook => OAuthEndpoints::facebook(),
        AuthProvider::Local => return Ok(None),
    }
    .map_err(|err| config_error("OAuth endpoints", err))?;
    let redirect_uri = urls
        .oauth_callback(provider)
        .map_err(|err| config_error("OAuth callback URL", err))?;
    let adapter = OAuthIdentityProvider::new(
        provider,
        endpoints,
        OAuthClientCredentials {
            client_id,
            client_secret,
            redirect_uri,
        },
        settings.upstream_timeout(),
    )
    .map_err(|err| config_error("OAuth client", err))?;
    Ok(Some(Arc::new(adapter)))
}

fn build_identity_providers(
    settings: &AppSettings,
    urls: &SiteUrls,
) -> io::Result<IdentityProviders> {
    let mut providers = IdentityProviders::new();
    for provider in [AuthProvider::Google, AuthProvider::Facebook] {
        if let Some(adapter) = build_identity_provider(settings, urls, provider)? {
            providers = providers.with(adapter);
        }
    }
    Ok(providers)
}

/// Assemble the handler state for `config`.
///
/// # Errors
///
/// Returns [`io::Error`] when a URL setting is malformed or an HTTP client
/// cannot be built.
pub(super) fn build_http_state(config: &ServerConfig) -> io::Result<web::Data<HttpState>> {
    let settings = &config.settings;
    let urls = settings
        .site_urls()
        .map_err(|err| config_error("site URLs", err))?;
    let (accounts, history) = build_stores(config.db_pool.as_ref());
    let (completion, images) = build_generators(settings)?;
    let weather = build_weather(settings)?;

    let recommendations = RecommendationOrchestrator::new(RecommendationPorts {
        completion,
        images,
        weather: weather.clone(),
        accounts: accounts.clone(),
        history: history.clone(),
        clock: Arc::new(DefaultClock),
    });
    let ports = HttpStatePorts {
        accounts: Arc::new(AccountManager::new(
            accounts,
            Arc::new(Argon2PasswordHasher::default()),
        )),
        recommendations: Arc::new(recommendations),
        history: Arc::new(HistoryLedger::new(history)),
        weather,
        identity_providers: build_identity_providers(settings, &urls)?,
    };
    Ok(web::Data::new(HttpState::new(ports, urls)))
}
