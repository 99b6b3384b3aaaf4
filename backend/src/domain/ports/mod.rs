//! Domain ports and supporting types for the hexagonal boundary.
//!
//! Driven ports ([`CredentialStore`], [`GenerationRepository`],
//! [`PasswordHasher`], [`TextCompletion`], [`ImageGeneration`],
//! [`WeatherSource`], [`IdentityProvider`], [`SessionRepository`]) are implemented under
//! `outbound`. Driving ports ([`AccountService`], [`RecommendationService`],
//! [`HistoryService`]) are implemented by domain services and called from
//! `inbound`.

mod macros;
pub(crate) use macros::define_port_error;

mod account_service;
mod credential_store;
mod fixture_store;
mod generation_repository;
mod history_service;
mod identity_provider;
mod image_generation;
mod password_hasher;
mod recommendation_service;
mod session_repository;
mod text_completion;
mod upstream;
mod weather_source;

#[cfg(test)]
pub use account_service::MockAccountService;
pub use account_service::AccountService;
#[cfg(test)]
pub use credential_store::MockCredentialStore;
pub use credential_store::{CredentialStore, CredentialStoreError, LocalAccount, NewLocalAccount};
pub use fixture_store::FixtureStore;
#[cfg(test)]
pub use generation_repository::MockGenerationRepository;
pub use generation_repository::{GenerationRepository, GenerationRepositoryError};
#[cfg(test)]
pub use history_service::MockHistoryService;
pub use history_service::HistoryService;
#[cfg(test)]
pub use identity_provider::MockIdentityProvider;
pub use identity_provider::{FixtureIdentityProvider, IdentityProvider, IdentityProviders};
#[cfg(test)]
pub use image_generation::MockImageGeneration;
pub use image_generation::{FIXTURE_IMAGE_URL, FixtureImageGeneration, ImageGeneration};
#[cfg(test)]
pub use password_hasher::MockPasswordHasher;
pub use password_hasher::{PasswordHasher, PasswordHasherError};
#[cfg(test)]
pub use recommendation_service::MockRecommendationService;
pub use recommendation_service::{
    Outfit, RecommendationRequest, RecommendationService, RegeneratedOutfit,
};
#[cfg(test)]
pub use session_repository::MockSessionRepository;
pub use session_repository::{
    FixtureSessions, SessionEntries, SessionRepository, SessionRepositoryError,
};
#[cfg(test)]
pub use text_completion::MockTextCompletion;
pub use text_completion::{
    CompletionPrompt, FIXTURE_COMPLETION, FixtureTextCompletion, TextCompletion,
};
pub use upstream::UpstreamServiceError;
#[cfg(test)]
pub use weather_source::MockWeatherSource;
pub use weather_source::{FixtureWeatherSource, WeatherSource};
