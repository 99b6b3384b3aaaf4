//! Administrative user management.
//!
//! ```text
//! GET /admin/users
//! DELETE /admin/users/7
//! ```

use actix_web::{delete, get, web};
use tracing::info;

use crate::domain::{Error, UserId};
use crate::inbound::http::ApiResult;
use crate::inbound::http::guards::AdminUser;
use crate::inbound::http::schemas::{MessageResponse, UserSummary};
use crate::inbound::http::state::HttpState;
use crate::inbound::http::validation::{ValidationCode, field_error};

/// Accounts holding the regular `user` role, ordered by id.
#[utoipa::path(
    get,
    path = "/admin/users",
    responses(
        (status = 200, description = "Users", body = [UserSummary]),
        (status = 401, description = "No session", body = Error),
        (status = 403, description = "Caller is not an admin", body = Error)
    ),
    tags = ["admin"],
    operation_id = "listUsers"
)]
#[get("/admin/users")]
pub async fn list_users(
    state: web::Data<HttpState>,
    _admin: AdminUser,
) -> ApiResult<web::Json<Vec<UserSummary>>> {
    let users = state.accounts.list_users().await?;
    Ok(web::Json(users.into_iter().map(UserSummary::from).collect()))
}

/// Delete an account together with its history.
#[utoipa::path(
    delete,
    path = "/admin/users/{id}",
    params(("id" = i32, Path, description = "Account id")),
    responses(
        (status = 200, description = "Deleted", body = MessageResponse),
        (status = 400, description = "Malformed id", body = Error),
        (status = 401, description = "No session", body = Error),
        (status = 403, description = "Caller is not an admin", body = Error),
        (status = 404, description = "No such user", body = Error)
    ),
    tags = ["admin"],
    operation_id = "deleteUser"
)]
#[delete("/admin/users/{id}")]
pub async fn delete_user(
    state: web::Data<HttpState>,
    admin: AdminUser,
    path: web::Path<String>,
) -> ApiResult<web::Json<MessageResponse>> {
    let id = path
        .trim()
        .parse::<i32>()
        .ok()
        .and_then(|raw| UserId::new(raw).ok())
        .ok_or_else(|| {
            field_error("id", "User id must be a positive integer", ValidationCode::InvalidValue)
        })?;
    state.accounts.delete_user(id).await?;
    info!(admin_id = %admin.0.id, user_id = %id, "admin deleted account");
    Ok(web::Json(MessageResponse::new("User deleted successfully")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Role;
    use crate::inbound::http::test_utils::{TestWorld, login_cookie};
    use actix_web::cookie::Cookie;
    use actix_web::http::StatusCode;
    use actix_web::test;
    use rstest::rstest;
    use serde_json::{Value, json};

    async fn admin_world() -> (TestWorld, Cookie<'static>) {
        let world = TestWorld::new();
        let root = world.register("root", "pw").await;
        assert!(world.store.set_role(root.id, Role::Admin));
        let cookie = login_cookie(&world, "root", "pw").await;
        (world, cookie)
    }

    async fn call(
        world: &TestWorld,
        req: test::TestRequest,
        cookie: Cookie<'static>,
    ) -> (StatusCode, Value) {
        let app = test::init_service(world.app()).await;
        let res = test::call_service(&app, req.cookie(cookie).to_request()).await;
        let status = res.status();
        (status, test::read_body_json(res).await)
    }

    #[actix_web::test]
    async fn listing_shows_regular_users_only() {
        let (world, cookie) = admin_world().await;
        let alice = world.register("alice", "pw").await;
        let bob = world.register("bob", "pw").await;

        let (status, body) =
            call(&world, test::TestRequest::get().uri("/admin/users"), cookie).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            body,
            json!([
                {
                    "id": alice.id.as_i32(),
                    "username": "alice",
                    "email": "alice@example.com",
                    "role": "user"
                },
                {
                    "id": bob.id.as_i32(),
                    "username": "bob",
                    "email": "bob@example.com",
                    "role": "user"
                },
            ])
        );
    }

    #[actix_web::test]
    async fn deleting_removes_the_account_and_its_history() {
        let (world, cookie) = admin_world().await;
        let alice = world.register("alice", "pw").await;
        world
            .state
            .history
            .save(alice.id, "p".to_owned(), "r".to_owned())
            .await
            .expect("history saved");

        let uri = format!("/admin/users/{}", alice.id);
        let (status, body) =
            call(&world, test::TestRequest::delete().uri(&uri), cookie.clone()).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["message"], "User deleted successfully");
        assert!(
            world
                .state
                .history
                .list(alice.id)
                .await
                .expect("history")
                .is_empty()
        );

        let (status, _) = call(&world, test::TestRequest::delete().uri(&uri), cookie).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[rstest]
    #[case("/admin/users/abc")]
    #[case("/admin/users/0")]
    #[actix_web::test]
    async fn malformed_ids_are_rejected(#[case] uri: &str) {
        let (world, cookie) = admin_world().await;
        let (status, _) = call(&world, test::TestRequest::delete().uri(uri), cookie).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[actix_web::test]
    async fn regular_users_are_forbidden() {
        let world = TestWorld::new();
        world.register("alice", "pw").await;
        let cookie = login_cookie(&world, "alice", "pw").await;
        let (status, body) =
            call(&world, test::TestRequest::get().uri("/admin/users"), cookie).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(body["message"], "Access forbidden: Admins only");
    }
}
