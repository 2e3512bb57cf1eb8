mod common;

use axum::http::{Method, StatusCode};
use common::{names, spawn_app};
use serde_json::json;

#[tokio::test]
async fn test_tags_require_authentication() {
    let app = spawn_app().await;

    for uri in ["/api/recipe/tags/", "/api/recipe/ingredients/"] {
        let (status, _) = app.request(Method::GET, uri, None, None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);

        let (status, _) = app
            .request(Method::POST, uri, None, Some(json!({ "name": "Vegan" })))
            .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }
}

#[tokio::test]
async fn test_list_tags_ordered_by_name_desc() {
    let app = spawn_app().await;
    let token = app.login_as("tags@example.com").await;

    app.create_tag(&token, "Dessert").await;
    app.create_tag(&token, "Vegan").await;
    app.create_tag(&token, "Breakfast").await;

    let (status, body) = app.get("/api/recipe/tags/", &token).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(names(&body), vec!["Vegan", "Dessert", "Breakfast"]);
}

#[tokio::test]
async fn test_tags_limited_to_owner() {
    let app = spawn_app().await;
    let owner = app.login_as("owner@example.com").await;
    let other = app.login_as("other@example.com").await;

    app.create_tag(&other, "Fruity").await;
    let id = app.create_tag(&owner, "Comfort Food").await;

    let (status, body) = app.get("/api/recipe/tags/", &owner).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!([{ "id": id, "name": "Comfort Food" }]));
}

#[tokio::test]
async fn test_create_tag_with_blank_name_fails() {
    let app = spawn_app().await;
    let token = app.login_as("blank@example.com").await;

    let (status, body) = app
        .post("/api/recipe/tags/", &token, json!({ "name": "" }))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);

    let (status, _) = app
        .post("/api/recipe/tags/", &token, json!({ "name": "   " }))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = app.post("/api/recipe/tags/", &token, json!({})).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (_, body) = app.get("/api/recipe/tags/", &token).await;
    assert_eq!(body, json!([]));
}

#[tokio::test]
async fn test_duplicate_name_is_per_owner() {
    let app = spawn_app().await;
    let first = app.login_as("first@example.com").await;
    let second = app.login_as("second@example.com").await;

    app.create_tag(&first, "Vegan").await;

    let (status, _) = app
        .post("/api/recipe/tags/", &first, json!({ "name": "Vegan" }))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    app.create_tag(&second, "Vegan").await;

    let (_, body) = app.get("/api/recipe/tags/", &first).await;
    assert_eq!(names(&body), vec!["Vegan"]);
}

#[tokio::test]
async fn test_ingredients_create_and_list() {
    let app = spawn_app().await;
    let token = app.login_as("ingredients@example.com").await;
    let other = app.login_as("ingredients-other@example.com").await;

    let (status, body) = app
        .post("/api/recipe/ingredients/", &token, json!({ "name": "Kale" }))
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["name"], "Kale");

    app.create_ingredient(&token, "Salt").await;
    app.create_ingredient(&other, "Vinegar").await;

    let (status, body) = app.get("/api/recipe/ingredients/", &token).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(names(&body), vec!["Salt", "Kale"]);

    let (status, _) = app
        .post("/api/recipe/ingredients/", &token, json!({ "name": "" }))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_assigned_only_filters_unused_items() {
    let app = spawn_app().await;
    let token = app.login_as("assigned@example.com").await;

    let breakfast = app.create_tag(&token, "Breakfast").await;
    app.create_tag(&token, "Lunch").await;

    app.create_recipe(&token, json!({ "title": "Eggs", "tags": [breakfast] }))
        .await;
    app.create_recipe(&token, json!({ "title": "Toast", "tags": [breakfast] }))
        .await;

    let (status, body) = app
        .get("/api/recipe/tags/?assigned_only=1", &token)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(names(&body), vec!["Breakfast"]);

    let (_, body) = app
        .get("/api/recipe/tags/?assigned_only=0", &token)
        .await;
    assert_eq!(names(&body), vec!["Lunch", "Breakfast"]);

    let apples = app.create_ingredient(&token, "Apples").await;
    app.create_ingredient(&token, "Turkey").await;
    app.create_recipe(
        &token,
        json!({ "title": "Apple crumble", "ingredients": [apples] }),
    )
    .await;

    let (_, body) = app
        .get("/api/recipe/ingredients/?assigned_only=1", &token)
        .await;
    assert_eq!(names(&body), vec!["Apples"]);
}

#[tokio::test]
async fn test_assigned_only_rejects_non_integer() {
    let app = spawn_app().await;
    let token = app.login_as("flag@example.com").await;

    let (status, body) = app
        .get("/api/recipe/tags/?assigned_only=yes", &token)
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);
}
