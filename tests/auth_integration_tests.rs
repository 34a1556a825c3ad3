use axum::http::StatusCode;
use serde_json::json;

mod common;

#[tokio::test]
async fn test_login_and_get_me() {
    let app = common::spawn_app();
    let user_id = common::seed_login_user(&app, "alice", "password1", false).await;

    let response = common::request(
        &app.router,
        "POST",
        "/login",
        None,
        Some(json!({"name": "alice", "password": "password1"})),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = common::body_json(response).await;
    let token = body["token"].as_str().unwrap().to_string();

    let response = common::request(&app.router, "GET", "/me", Some(&token), None).await;
    assert_eq!(response.status(), StatusCode::OK);
    let me = common::body_json(response).await;
    assert_eq!(me["id"].as_str().unwrap(), user_id.to_string());
    assert_eq!(me["name"], "alice");
    assert_eq!(me["isAdmin"], false);
    // auth data never leaves the server
    assert!(me.get("passwordHash").is_none());
    assert!(me.get("password_hash").is_none());
}

#[tokio::test]
async fn test_login_rejects_bad_credentials() {
    let app = common::spawn_app();
    common::seed_login_user(&app, "alice", "password1", false).await;

    // wrong password and unknown user look identical
    let wrong_password = common::request(
        &app.router,
        "POST",
        "/login",
        None,
        Some(json!({"name": "alice", "password": "nope123"})),
    )
    .await;
    assert_eq!(wrong_password.status(), StatusCode::UNAUTHORIZED);
    let wrong_password_body = common::body_json(wrong_password).await;

    let unknown_user = common::request(
        &app.router,
        "POST",
        "/login",
        None,
        Some(json!({"name": "nobody", "password": "password1"})),
    )
    .await;
    assert_eq!(unknown_user.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(common::body_json(unknown_user).await, wrong_password_body);
}

#[tokio::test]
async fn test_protected_routes_require_token() {
    let app = common::spawn_app();

    let response = common::request(&app.router, "GET", "/me", None, None).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = common::request(&app.router, "GET", "/records", None, None).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response =
        common::request(&app.router, "GET", "/me", Some("not-a-real-token"), None).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_user_management_is_admin_only() {
    let app = common::spawn_app();
    let member_id = common::seed_user(&app, "member", false).await;
    let admin_id = common::seed_user(&app, "boss", true).await;
    let member_token = common::token_for(&app, member_id, "member", false);
    let admin_token = common::token_for(&app, admin_id, "boss", true);

    let response = common::request(&app.router, "GET", "/users", Some(&member_token), None).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response = common::request(&app.router, "GET", "/users", Some(&admin_token), None).await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_create_user_validations_and_conflict() {
    let app = common::spawn_app();
    let admin_id = common::seed_user(&app, "boss", true).await;
    let token = common::token_for(&app, admin_id, "boss", true);

    let response = common::request(
        &app.router,
        "POST",
        "/users",
        Some(&token),
        Some(json!({"username": "carol", "password": "secret1"})),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let created = common::body_json(response).await;
    assert_eq!(created["name"], "carol");
    assert_eq!(created["isAdmin"], false);

    // duplicate name
    let response = common::request(
        &app.router,
        "POST",
        "/users",
        Some(&token),
        Some(json!({"username": "carol", "password": "secret2"})),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CONFLICT);

    // name too short, bad characters, short password, password with whitespace
    for payload in [
        json!({"username": "ab", "password": "secret1"}),
        json!({"username": "not a name", "password": "secret1"}),
        json!({"username": "dave", "password": "short"}),
        json!({"username": "dave", "password": "has space"}),
    ] {
        let response =
            common::request(&app.router, "POST", "/users", Some(&token), Some(payload)).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}

#[tokio::test]
async fn test_update_and_delete_user() {
    let app = common::spawn_app();
    let admin_id = common::seed_user(&app, "boss", true).await;
    let token = common::token_for(&app, admin_id, "boss", true);
    let target_id = common::seed_user(&app, "victim", false).await;

    let response = common::request(
        &app.router,
        "PATCH",
        &format!("/users/{target_id}"),
        Some(&token),
        Some(json!({"name": "renamed", "isAdmin": true})),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let updated = common::body_json(response).await;
    assert_eq!(updated["name"], "renamed");
    assert_eq!(updated["isAdmin"], true);

    let response = common::request(
        &app.router,
        "DELETE",
        &format!("/users/{target_id}"),
        Some(&token),
        None,
    )
    .await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    // second delete: the user is gone
    let response = common::request(
        &app.router,
        "DELETE",
        &format!("/users/{target_id}"),
        Some(&token),
        None,
    )
    .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_user_listing_paginates_by_name() {
    let app = common::spawn_app();
    let admin_id = common::seed_user(&app, "admin", true).await;
    let token = common::token_for(&app, admin_id, "admin", true);
    for name in ["bella", "carol", "dave", "erin", "frank"] {
        common::seed_user(&app, name, false).await;
    }

    // 6 users, pages of 4: 4 + 2
    let response =
        common::request(&app.router, "GET", "/users?limit=4", Some(&token), None).await;
    assert_eq!(response.status(), StatusCode::OK);
    let page = common::body_json(response).await;
    let first_names: Vec<&str> = page["items"]
        .as_array()
        .unwrap()
        .iter()
        .map(|u| u["name"].as_str().unwrap())
        .collect();
    assert_eq!(first_names, ["admin", "bella", "carol", "dave"]);
    let cursor = page["nextCursor"].as_str().unwrap().to_string();

    let response = common::request(
        &app.router,
        "GET",
        &format!("/users?limit=4&cursor={cursor}"),
        Some(&token),
        None,
    )
    .await;
    let page = common::body_json(response).await;
    let rest_names: Vec<&str> = page["items"]
        .as_array()
        .unwrap()
        .iter()
        .map(|u| u["name"].as_str().unwrap())
        .collect();
    assert_eq!(rest_names, ["erin", "frank"]);
    assert!(page.get("nextCursor").is_none());
}
