//! Outbound adapters implementing domain ports for external infrastructure.
//!
//! - **persistence**: PostgreSQL-backed stores using Diesel and diesel-async
//! - **openai**: chat completion and image generation over reqwest
//! - **open_meteo**: forecast and geocoding lookups over reqwest
//! - **oauth**: Google and Facebook authorisation-code flow
//! - **password**: Argon2id password hashing
//!
//! Adapters translate between domain types and wire or row representations.
//! They contain no business logic.

pub(crate) mod http_support;
pub mod oauth;
pub mod open_meteo;
pub mod openai;
pub mod password;
pub mod persistence;
