//! WeatherWear backend: weather-based outfit recommendations with local and
//! federated accounts.
//!
//! The crate follows a hexagonal layout. [`domain`] holds the model, the
//! services and their ports; [`inbound`] adapts HTTP onto the services;
//! [`outbound`] implements the ports over Postgres and third-party APIs.

pub mod doc;
pub mod domain;
pub mod inbound;
pub mod middleware;
pub mod outbound;

/// Public OpenAPI surface used by Swagger UI and tooling.
pub use doc::ApiDoc;
pub use domain::TraceId;
pub use middleware::Trace;
