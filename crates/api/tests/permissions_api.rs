//! Role checks across resources: anonymous callers get 401, authenticated
//! callers without the privilege get 403, and neither ever produces a 500.

mod common;

use axum::http::StatusCode;
use common::{
    build_test_app, create_user, delete, delete_auth, get, get_auth, patch_json, post_json,
    post_json_auth,
};
use serde_json::json;
use sqlx::PgPool;
use yamdb_core::roles::Role;
use yamdb_db::models::category::CreateCategory;
use yamdb_db::models::review::CreateReview;
use yamdb_db::models::title::CreateTitle;
use yamdb_db::repositories::{CategoryRepo, ReviewRepo, TitleRepo};

#[sqlx::test(migrations = "../db/migrations")]
async fn anonymous_writes_are_unauthorized(pool: PgPool) {
    let (author, _token) = create_user(&pool, "ann", Role::User).await;
    let category = CategoryRepo::create(
        &pool,
        &CreateCategory {
            name: "Films".into(),
            slug: "films".into(),
        },
    )
    .await
    .unwrap();
    let title = TitleRepo::create(
        &pool,
        &CreateTitle {
            name: "Solaris".into(),
            year: 1972,
            description: String::new(),
            category_id: category.id,
            genre_ids: vec![],
        },
    )
    .await
    .unwrap();
    let review = ReviewRepo::create(
        &pool,
        &CreateReview {
            title_id: title.id,
            author_id: author.id,
            text: "Great".into(),
            score: 9,
        },
    )
    .await
    .unwrap();
    let app = build_test_app(pool);

    let review_uri = format!("/api/v1/titles/{}/reviews/{}/", title.id, review.id);
    let posts = [
        "/api/v1/categories/".to_string(),
        "/api/v1/genres/".to_string(),
        "/api/v1/titles/".to_string(),
        format!("/api/v1/titles/{}/reviews/", title.id),
        format!("{review_uri}comments/"),
    ];
    for uri in &posts {
        // An empty body would be a 400 if the request got past the role check.
        let response = post_json(app.clone(), uri, json!({})).await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED, "POST {uri}");
    }

    for uri in [format!("/api/v1/titles/{}/", title.id), review_uri.clone()] {
        let response = patch_json(app.clone(), &uri, json!({})).await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED, "PATCH {uri}");
        let response = delete(app.clone(), &uri).await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED, "DELETE {uri}");
    }

    for uri in ["/api/v1/categories/films/", "/api/v1/genres/drama/"] {
        let response = delete(app.clone(), uri).await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED, "DELETE {uri}");
    }
}

#[sqlx::test(migrations = "../db/migrations")]
async fn anonymous_reads_are_allowed_on_the_catalog(pool: PgPool) {
    let app = build_test_app(pool);

    for uri in ["/api/v1/categories/", "/api/v1/genres/", "/api/v1/titles/"] {
        let response = get(app.clone(), uri).await;
        assert_eq!(response.status(), StatusCode::OK, "GET {uri}");
    }
}

#[sqlx::test(migrations = "../db/migrations")]
async fn user_endpoints_require_authentication(pool: PgPool) {
    let app = build_test_app(pool);

    for uri in ["/api/v1/users/", "/api/v1/users/me/", "/api/v1/users/anyone/"] {
        let response = get(app.clone(), uri).await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED, "GET {uri}");
    }
}

#[sqlx::test(migrations = "../db/migrations")]
async fn plain_users_and_moderators_cannot_manage_the_catalog(pool: PgPool) {
    let (_user, user_token) = create_user(&pool, "ann", Role::User).await;
    let (_moderator, moderator_token) = create_user(&pool, "mod", Role::Moderator).await;
    let app = build_test_app(pool);

    for token in [&user_token, &moderator_token] {
        let response = post_json_auth(
            app.clone(),
            "/api/v1/categories/",
            json!({ "name": "Films", "slug": "films" }),
            token,
        )
        .await;
        assert_eq!(response.status(), StatusCode::FORBIDDEN);

        let response = delete_auth(app.clone(), "/api/v1/genres/drama/", token).await;
        assert_eq!(response.status(), StatusCode::FORBIDDEN);

        let response = get_auth(app.clone(), "/api/v1/users/", token).await;
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }
}

#[sqlx::test(migrations = "../db/migrations")]
async fn invalid_or_stale_tokens_are_unauthorized(pool: PgPool) {
    let (user, token) = create_user(&pool, "ann", Role::User).await;
    let app = build_test_app(pool.clone());

    let response = get_auth(app.clone(), "/api/v1/users/me/", "not-a-jwt").await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    // A bad token is rejected even where anonymous access is allowed.
    let response = get_auth(app.clone(), "/api/v1/titles/", "not-a-jwt").await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    // Tokens of deleted accounts stop working.
    yamdb_db::repositories::UserRepo::delete(&pool, user.id)
        .await
        .unwrap();
    let response = get_auth(app, "/api/v1/users/me/", &token).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}
