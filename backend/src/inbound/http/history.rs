//! Recommendation history and ratings, always scoped to the caller.
//!
//! ```text
//! POST /api/save-history {"prompt":"...","response":"..."}
//! GET /api/history
//! POST /api/rate/42/5
//! ```

use actix_web::{get, post, web};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::info;
use utoipa::ToSchema;

use crate::domain::{Error, GenerationRecord};
use crate::inbound::http::ApiResult;
use crate::inbound::http::guards::AuthenticatedUser;
use crate::inbound::http::schemas::MessageResponse;
use crate::inbound::http::state::HttpState;
use crate::inbound::http::validation::{
    ValidationCode, field_error, parse_generation_id, parse_rating,
};

/// Message for a save request missing either half of the pair.
pub const PROMPT_AND_RESPONSE_REQUIRED_MESSAGE: &str = "Prompt and response are required";

/// Request body for `POST /api/save-history`.
///
/// Either field may be a string or any JSON value; non-strings are stored as
/// their JSON text.
#[derive(Debug, Default, Deserialize, Serialize, ToSchema)]
pub struct SaveHistoryRequest {
    #[serde(default)]
    #[schema(value_type = Object)]
    pub prompt: Option<Value>,
    #[serde(default)]
    #[schema(value_type = Object)]
    pub response: Option<Value>,
}

fn stored_text(field: &str, value: Option<Value>) -> Result<String, Error> {
    let text = match value {
        None | Some(Value::Null) => None,
        Some(Value::String(text)) => Some(text),
        Some(other) => Some(other.to_string()),
    };
    text.filter(|text| !text.trim().is_empty()).ok_or_else(|| {
        field_error(
            field,
            PROMPT_AND_RESPONSE_REQUIRED_MESSAGE,
            ValidationCode::MissingField,
        )
    })
}

/// Store a prompt and response pair for the caller.
#[utoipa::path(
    post,
    path = "/api/save-history",
    request_body = SaveHistoryRequest,
    responses(
        (status = 200, description = "Saved", body = MessageResponse),
        (status = 400, description = "Prompt or response missing", body = Error),
        (status = 401, description = "No session", body = Error)
    ),
    tags = ["history"],
    operation_id = "saveHistory"
)]
#[post("/api/save-history")]
pub async fn save_history(
    state: web::Data<HttpState>,
    caller: AuthenticatedUser,
    payload: web::Json<SaveHistoryRequest>,
) -> ApiResult<web::Json<MessageResponse>> {
    let SaveHistoryRequest { prompt, response } = payload.into_inner();
    let prompt = stored_text("prompt", prompt)?;
    let response = stored_text("response", response)?;
    let record = state.history.save(caller.user.id, prompt, response).await?;
    info!(user_id = %caller.user.id, generation_id = %record.id, "history saved");
    Ok(web::Json(MessageResponse::new("History saved successfully")))
}

/// The caller's history, newest first.
#[utoipa::path(
    get,
    path = "/api/history",
    responses(
        (status = 200, description = "History records", body = [GenerationRecord]),
        (status = 401, description = "No session", body = Error)
    ),
    tags = ["history"],
    operation_id = "listHistory"
)]
#[get("/api/history")]
pub async fn list_history(
    state: web::Data<HttpState>,
    caller: AuthenticatedUser,
) -> ApiResult<web::Json<Vec<GenerationRecord>>> {
    let records = state.history.list(caller.user.id).await?;
    Ok(web::Json(records))
}

/// Rate one of the caller's records from 1 to 5.
#[utoipa::path(
    post,
    path = "/api/rate/{generationId}/{rating}",
    params(
        ("generationId" = i32, Path, description = "History record id"),
        ("rating" = i32, Path, description = "Whole number from 1 to 5")
    ),
    responses(
        (status = 200, description = "Rating saved", body = MessageResponse),
        (status = 400, description = "Rating out of range", body = Error),
        (status = 401, description = "No session", body = Error),
        (status = 404, description = "Record not found or not owned", body = Error)
    ),
    tags = ["history"],
    operation_id = "rateGeneration"
)]
#[post("/api/rate/{generation_id}/{rating}")]
pub async fn rate_generation(
    state: web::Data<HttpState>,
    caller: AuthenticatedUser,
    path: web::Path<(String, String)>,
) -> ApiResult<web::Json<MessageResponse>> {
    let (raw_id, raw_rating) = path.into_inner();
    let rating = parse_rating(&raw_rating)?;
    let id = parse_generation_id(&raw_id)?;
    state.history.rate(caller.user.id, id, rating).await?;
    info!(
        user_id = %caller.user.id,
        generation_id = %id,
        rating = rating.value(),
        "generation rated"
    );
    Ok(web::Json(MessageResponse::new("Rating saved successfully")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ports::MockHistoryService;
    use crate::inbound::http::test_utils::{TestWorld, login_cookie};
    use actix_web::cookie::Cookie;
    use actix_web::http::StatusCode;
    use actix_web::test;
    use rstest::rstest;
    use serde_json::json;
    use std::sync::Arc;

    async fn call(
        world: &TestWorld,
        req: test::TestRequest,
        cookie: Option<Cookie<'static>>,
    ) -> (StatusCode, Value) {
        let app = test::init_service(world.app()).await;
        let req = match cookie {
            Some(cookie) => req.cookie(cookie),
            None => req,
        };
        let res = test::call_service(&app, req.to_request()).await;
        let status = res.status();
        (status, test::read_body_json(res).await)
    }

    async fn save(world: &TestWorld, cookie: &Cookie<'static>, prompt: Value, response: Value) {
        let (status, _) = call(
            world,
            test::TestRequest::post()
                .uri("/api/save-history")
                .set_json(json!({ "prompt": prompt, "response": response })),
            Some(cookie.clone()),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
    }

    #[actix_web::test]
    async fn history_is_listed_newest_first_and_private() {
        let world = TestWorld::new();
        world.register("alice", "pw").await;
        world.register("bob", "pw").await;
        let alice = login_cookie(&world, "alice", "pw").await;
        let bob = login_cookie(&world, "bob", "pw").await;

        save(&world, &alice, json!("first"), json!("r1")).await;
        save(&world, &alice, json!({ "weatherData": {} }), json!({ "summary": "s" })).await;
        save(&world, &bob, json!("bob's"), json!("r")).await;

        let (status, body) = call(
            &world,
            test::TestRequest::get().uri("/api/history"),
            Some(alice),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        let records = body.as_array().expect("array");
        assert_eq!(records.len(), 2);
        assert_eq!(records[0]["prompt"], r#"{"weatherData":{}}"#);
        assert_eq!(records[1]["prompt"], "first");
        assert_eq!(records[1]["rating"], Value::Null);
        assert!(records[0]["createdAt"].is_string());
    }

    #[rstest]
    #[case(json!({ "prompt": "p" }))]
    #[case(json!({ "response": "r" }))]
    #[case(json!({ "prompt": "", "response": "r" }))]
    #[case(json!({ "prompt": null, "response": "r" }))]
    #[actix_web::test]
    async fn save_requires_both_halves(#[case] body: Value) {
        let world = TestWorld::new();
        world.register("alice", "pw").await;
        let cookie = login_cookie(&world, "alice", "pw").await;
        let (status, body) = call(
            &world,
            test::TestRequest::post().uri("/api/save-history").set_json(body),
            Some(cookie),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["message"], PROMPT_AND_RESPONSE_REQUIRED_MESSAGE);
    }

    #[rstest]
    #[case(test::TestRequest::get().uri("/api/history"))]
    #[case(test::TestRequest::post().uri("/api/rate/1/5"))]
    #[case(
        test::TestRequest::post()
            .uri("/api/save-history")
            .set_json(json!({ "prompt": "p", "response": "r" }))
    )]
    #[actix_web::test]
    async fn history_routes_require_a_session(#[case] req: test::TestRequest) {
        let world = TestWorld::new();
        let (status, _) = call(&world, req, None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[actix_web::test]
    async fn rating_own_record_then_listing_shows_it() {
        let world = TestWorld::new();
        world.register("alice", "pw").await;
        let cookie = login_cookie(&world, "alice", "pw").await;
        save(&world, &cookie, json!("p"), json!("r")).await;
        let (_, body) = call(
            &world,
            test::TestRequest::get().uri("/api/history"),
            Some(cookie.clone()),
        )
        .await;
        let id = body[0]["id"].as_i64().expect("record id");

        let (status, body) = call(
            &world,
            test::TestRequest::post().uri(&format!("/api/rate/{id}/4")),
            Some(cookie.clone()),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["message"], "Rating saved successfully");

        let (_, body) = call(
            &world,
            test::TestRequest::get().uri("/api/history"),
            Some(cookie),
        )
        .await;
        assert_eq!(body[0]["rating"], 4);
    }

    #[actix_web::test]
    async fn rating_someone_elses_record_is_not_found() {
        let world = TestWorld::new();
        world.register("alice", "pw").await;
        world.register("bob", "pw").await;
        let alice = login_cookie(&world, "alice", "pw").await;
        let bob = login_cookie(&world, "bob", "pw").await;
        save(&world, &alice, json!("p"), json!("r")).await;
        let (_, body) = call(
            &world,
            test::TestRequest::get().uri("/api/history"),
            Some(alice),
        )
        .await;
        let id = body[0]["id"].as_i64().expect("record id");

        let (status, body) = call(
            &world,
            test::TestRequest::post().uri(&format!("/api/rate/{id}/5")),
            Some(bob),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["message"], "Generation not found or not authorized");
    }

    #[rstest]
    #[case("/api/rate/42/6")]
    #[case("/api/rate/42/0")]
    #[case("/api/rate/42/great")]
    #[actix_web::test]
    async fn out_of_range_ratings_never_reach_the_store(#[case] uri: &str) {
        let world = TestWorld::new();
        world.register("alice", "pw").await;
        let cookie = login_cookie(&world, "alice", "pw").await;
        let world = TestWorld {
            state: {
                let mut history = MockHistoryService::new();
                history.expect_rate().never();
                let mut state = (*world.state.clone().into_inner()).clone();
                state.history = Arc::new(history);
                actix_web::web::Data::new(state)
            },
            ..world
        };
        let (status, body) = call(
            &world,
            test::TestRequest::post().uri(uri),
            Some(cookie),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["message"], "Rating must be between 1 and 5");
    }
}
