//! HTTP inbound adapter exposing REST endpoints.
//!
//! [`configure`] registers every application route; the server adds the
//! session, trace and metrics middleware plus the health probes around it.

use actix_web::web;

pub mod admin;
pub mod error;
pub mod guards;
pub mod health;
pub mod history;
pub mod oauth;
pub mod preferences;
pub mod recommendations;
pub mod schemas;
pub mod session;
pub mod session_config;
pub mod session_store;
pub mod state;
#[cfg(test)]
pub mod test_utils;
pub mod users;
pub mod validation;
pub mod weather;

pub use error::ApiResult;

/// Register the application routes and the JSON-error extractor configs.
///
/// The caller must register `web::Data<state::HttpState>` and a session
/// middleware.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.app_data(validation::json_config())
        .app_data(validation::query_config())
        .service(users::register)
        .service(users::login)
        .service(users::logout)
        .service(users::current_user)
        .service(oauth::start_login)
        .service(oauth::callback)
        .service(weather::forecast)
        .service(weather::city)
        .service(recommendations::recommend)
        .service(recommendations::regenerate)
        .service(history::save_history)
        .service(history::list_history)
        .service(history::rate_generation)
        .service(preferences::update_preferences)
        .service(admin::list_users)
        .service(admin::delete_user);
}
