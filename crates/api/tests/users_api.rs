//! HTTP-level tests for admin user management and `/users/me/`.

mod common;

use axum::http::StatusCode;
use common::{
    body_json, build_test_app, create_user, delete_auth, get_auth, patch_json_auth,
    post_json_auth, put_json_auth,
};
use serde_json::json;
use sqlx::PgPool;
use yamdb_core::roles::Role;
use yamdb_db::repositories::UserRepo;

const USERS: &str = "/api/v1/users/";
const ME: &str = "/api/v1/users/me/";

// ---------------------------------------------------------------------------
// Admin management
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../db/migrations")]
async fn admin_creates_and_reads_users(pool: PgPool) {
    let (_admin, token) = create_user(&pool, "boss", Role::Admin).await;
    let app = build_test_app(pool);

    let response = post_json_auth(
        app.clone(),
        USERS,
        json!({
            "username": "carol",
            "email": "carol@example.com",
            "first_name": "Carol",
            "role": "moderator"
        }),
        &token,
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let created = body_json(response).await;
    assert_eq!(
        created,
        json!({
            "username": "carol",
            "email": "carol@example.com",
            "first_name": "Carol",
            "last_name": "",
            "bio": "",
            "role": "moderator"
        })
    );

    let response = get_auth(app.clone(), "/api/v1/users/carol/", &token).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["role"], "moderator");

    let list = body_json(get_auth(app.clone(), USERS, &token).await).await;
    assert_eq!(list["count"], 2);
    assert_eq!(list["results"][0]["username"], "boss");

    let found = body_json(get_auth(app, "/api/v1/users/?search=car", &token).await).await;
    assert_eq!(found["count"], 1);
    assert_eq!(found["results"][0]["username"], "carol");
}

#[sqlx::test(migrations = "../db/migrations")]
async fn create_user_defaults_to_user_role(pool: PgPool) {
    let (_admin, token) = create_user(&pool, "boss", Role::Admin).await;
    let app = build_test_app(pool);

    let response = post_json_auth(
        app,
        USERS,
        json!({ "username": "dave", "email": "dave@example.com" }),
        &token,
    )
    .await;

    assert_eq!(response.status(), StatusCode::CREATED);
    assert_eq!(body_json(response).await["role"], "user");
}

#[sqlx::test(migrations = "../db/migrations")]
async fn create_user_validates_fields(pool: PgPool) {
    let (_admin, token) = create_user(&pool, "boss", Role::Admin).await;
    let app = build_test_app(pool);

    let response = post_json_auth(
        app.clone(),
        USERS,
        json!({ "username": "me", "email": "boss@test.com", "role": "overlord" }),
        &token,
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = body_json(response).await;
    assert!(json["fields"]["username"].is_array());
    assert!(json["fields"]["email"].is_array());
    assert!(json["fields"]["role"].is_array());

    let response = post_json_auth(app, USERS, json!({ "username": "boss" }), &token).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = body_json(response).await;
    assert!(json["fields"]["username"].is_array());
    assert!(json["fields"]["email"].is_array());
}

#[sqlx::test(migrations = "../db/migrations")]
async fn admin_patches_and_deletes_users(pool: PgPool) {
    let (_admin, token) = create_user(&pool, "boss", Role::Admin).await;
    let (_user, _user_token) = create_user(&pool, "erin", Role::User).await;
    let app = build_test_app(pool.clone());

    let response = patch_json_auth(
        app.clone(),
        "/api/v1/users/erin/",
        json!({ "role": "moderator", "bio": "Film buff" }),
        &token,
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["role"], "moderator");
    assert_eq!(json["bio"], "Film buff");
    assert_eq!(json["email"], "erin@test.com");

    // Keeping one's own username is not a conflict.
    let response = patch_json_auth(
        app.clone(),
        "/api/v1/users/erin/",
        json!({ "username": "erin" }),
        &token,
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);

    let response = patch_json_auth(
        app.clone(),
        "/api/v1/users/erin/",
        json!({ "username": "boss" }),
        &token,
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = delete_auth(app.clone(), "/api/v1/users/erin/", &token).await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);
    assert!(UserRepo::find_by_username(&pool, "erin").await.unwrap().is_none());

    let response = get_auth(app, "/api/v1/users/erin/", &token).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[sqlx::test(migrations = "../db/migrations")]
async fn put_on_user_is_method_not_allowed(pool: PgPool) {
    let (_admin, token) = create_user(&pool, "boss", Role::Admin).await;
    let app = build_test_app(pool);

    let response = put_json_auth(
        app,
        "/api/v1/users/boss/",
        json!({ "bio": "x" }),
        &token,
    )
    .await;
    assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
}

#[sqlx::test(migrations = "../db/migrations")]
async fn superuser_with_user_role_acts_as_admin(pool: PgPool) {
    let superuser = UserRepo::ensure_superuser(&pool, "root", "root@test.com")
        .await
        .unwrap();
    // Demote the role; the superuser flag still grants admin rights.
    UserRepo::update(
        &pool,
        superuser.id,
        &yamdb_db::models::user::UpdateUser {
            role: Some(Role::User),
            ..Default::default()
        },
    )
    .await
    .unwrap();
    let token = yamdb_api::auth::jwt::generate_access_token(
        superuser.id,
        "root",
        &common::test_config().jwt,
    )
    .unwrap();
    let app = build_test_app(pool);

    let response = get_auth(app, USERS, &token).await;
    assert_eq!(response.status(), StatusCode::OK);
}

// ---------------------------------------------------------------------------
// Self-service
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../db/migrations")]
async fn me_reads_and_edits_own_profile(pool: PgPool) {
    let (_user, token) = create_user(&pool, "frank", Role::User).await;
    let app = build_test_app(pool);

    let response = get_auth(app.clone(), ME, &token).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["username"], "frank");

    let response = patch_json_auth(
        app.clone(),
        ME,
        json!({ "first_name": "Frank", "bio": "Hi" }),
        &token,
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["first_name"], "Frank");
    assert_eq!(json["bio"], "Hi");
}

#[sqlx::test(migrations = "../db/migrations")]
async fn me_cannot_change_own_role(pool: PgPool) {
    let (user, token) = create_user(&pool, "frank", Role::User).await;
    let app = build_test_app(pool.clone());

    let response = patch_json_auth(app, ME, json!({ "role": "admin" }), &token).await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["role"], "user");
    let stored = UserRepo::find_by_id(&pool, user.id).await.unwrap().unwrap();
    assert_eq!(stored.role, Role::User);
}

#[sqlx::test(migrations = "../db/migrations")]
async fn me_rejects_taken_email(pool: PgPool) {
    let (_other, _) = create_user(&pool, "gina", Role::User).await;
    let (_user, token) = create_user(&pool, "frank", Role::User).await;
    let app = build_test_app(pool);

    let response = patch_json_auth(app, ME, json!({ "email": "gina@test.com" }), &token).await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(body_json(response).await["fields"]["email"].is_array());
}

#[sqlx::test(migrations = "../db/migrations")]
async fn me_does_not_allow_delete(pool: PgPool) {
    let (_user, token) = create_user(&pool, "frank", Role::User).await;
    let app = build_test_app(pool);

    let response = delete_auth(app, ME, &token).await;

    assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
}
