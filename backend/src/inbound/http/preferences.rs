//! User preferences HTTP handler.
//!
//! ```text
//! POST /api/user/preferences {"preferences":{"style":"casual"}}
//! ```

use actix_web::{post, web};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::info;
use utoipa::ToSchema;

use crate::domain::{Error, Preferences};
use crate::inbound::http::ApiResult;
use crate::inbound::http::guards::AuthenticatedUser;
use crate::inbound::http::schemas::MessageResponse;
use crate::inbound::http::state::HttpState;
use crate::inbound::http::validation::{ValidationCode, field_error};

/// Message for a preferences payload that is not a JSON object.
pub const INVALID_PREFERENCES_MESSAGE: &str = "Invalid preferences format";

/// Request payload for updating user preferences.
#[derive(Debug, Default, Deserialize, Serialize, ToSchema)]
pub struct PreferencesRequest {
    /// Keys to add or overwrite; keys not mentioned are kept.
    #[serde(default)]
    #[schema(value_type = Object)]
    pub preferences: Option<Value>,
}

/// Shallow-merge the supplied object into the caller's stored preferences.
#[utoipa::path(
    post,
    path = "/api/user/preferences",
    request_body = PreferencesRequest,
    responses(
        (status = 200, description = "Preferences merged", body = MessageResponse),
        (status = 400, description = "Preferences are not an object", body = Error),
        (status = 401, description = "No session", body = Error)
    ),
    tags = ["users"],
    operation_id = "updatePreferences"
)]
#[post("/api/user/preferences")]
pub async fn update_preferences(
    state: web::Data<HttpState>,
    caller: AuthenticatedUser,
    payload: web::Json<PreferencesRequest>,
) -> ApiResult<web::Json<MessageResponse>> {
    let overlay = payload
        .into_inner()
        .preferences
        .and_then(|value| Preferences::try_from(value).ok())
        .ok_or_else(|| {
            field_error(
                "preferences",
                INVALID_PREFERENCES_MESSAGE,
                ValidationCode::InvalidValue,
            )
        })?;
    state
        .accounts
        .update_preferences(caller.user.id, &overlay)
        .await?;
    info!(user_id = %caller.user.id, keys = overlay.as_map().len(), "preferences merged");
    Ok(web::Json(MessageResponse::new(
        "Preferences updated successfully",
    )))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::inbound::http::test_utils::{TestWorld, login_cookie};
    use actix_web::cookie::Cookie;
    use actix_web::http::StatusCode;
    use actix_web::test;
    use rstest::rstest;
    use serde_json::json;

    async fn post(
        world: &TestWorld,
        cookie: Option<Cookie<'static>>,
        body: Value,
    ) -> (StatusCode, Value) {
        let app = test::init_service(world.app()).await;
        let mut req = test::TestRequest::post()
            .uri("/api/user/preferences")
            .set_json(body);
        if let Some(cookie) = cookie {
            req = req.cookie(cookie);
        }
        let res = test::call_service(&app, req.to_request()).await;
        let status = res.status();
        (status, test::read_body_json(res).await)
    }

    async fn stored(world: &TestWorld, cookie: Cookie<'static>) -> Value {
        let app = test::init_service(world.app()).await;
        let res = test::call_service(
            &app,
            test::TestRequest::get().uri("/me").cookie(cookie).to_request(),
        )
        .await;
        let body: Value = test::read_body_json(res).await;
        body["preferences"].clone()
    }

    #[actix_web::test]
    async fn updates_merge_shallowly() {
        let world = TestWorld::new();
        world.register("alice", "pw").await;
        let cookie = login_cookie(&world, "alice", "pw").await;

        let (status, body) = post(
            &world,
            Some(cookie.clone()),
            json!({ "preferences": { "a": 1, "nested": { "x": 1 } } }),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["message"], "Preferences updated successfully");

        post(
            &world,
            Some(cookie.clone()),
            json!({ "preferences": { "b": 2, "nested": { "y": 2 } } }),
        )
        .await;
        assert_eq!(
            stored(&world, cookie).await,
            json!({ "a": 1, "b": 2, "nested": { "y": 2 } })
        );
    }

    #[rstest]
    #[case(json!({ "preferences": "not-an-object" }))]
    #[case(json!({ "preferences": [1, 2] }))]
    #[case(json!({ "preferences": null }))]
    #[case(json!({}))]
    #[actix_web::test]
    async fn non_objects_are_rejected(#[case] body: Value) {
        let world = TestWorld::new();
        world.register("alice", "pw").await;
        let cookie = login_cookie(&world, "alice", "pw").await;
        let (status, body) = post(&world, Some(cookie), body).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["message"], INVALID_PREFERENCES_MESSAGE);
    }

    #[actix_web::test]
    async fn anonymous_updates_are_unauthorised() {
        let world = TestWorld::new();
        let (status, _) = post(&world, None, json!({ "preferences": {} })).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }
}
