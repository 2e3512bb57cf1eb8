#![allow(dead_code)]

use axum::{
    Router,
    body::Body,
    http::{Method, Request, StatusCode},
};
use http_body_util::BodyExt;
use recipe_api::config::Config;
use serde_json::{Value, json};
use std::io::Cursor;
use std::path::PathBuf;
use tower::ServiceExt;

pub const PASSWORD: &str = "testpass123";

pub struct TestApp {
    pub router: Router,
    pub media_root: PathBuf,
}

impl Drop for TestApp {
    fn drop(&mut self) {
        let _ = std::fs::remove_dir_all(&self.media_root);
    }
}

pub async fn spawn_app() -> TestApp {
    let media_root = std::env::temp_dir()
        .join("recipe-api-tests")
        .join(uuid::Uuid::new_v4().to_string());

    let mut config = Config::default();
    config.general.database_path = "sqlite::memory:".to_string();
    config.media.media_root = media_root.to_string_lossy().into_owned();
    config.observability.metrics_enabled = false;

    let state = recipe_api::api::create_app_state_from_config(config, None)
        .await
        .expect("Failed to create app state");

    TestApp {
        router: recipe_api::api::router(state),
        media_root,
    }
}

impl TestApp {
    pub async fn request(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);

        if let Some(token) = token {
            builder = builder.header("Authorization", format!("Token {token}"));
        }

        let body = match body {
            Some(json) => {
                builder = builder.header("Content-Type", "application/json");
                Body::from(serde_json::to_vec(&json).unwrap())
            }
            None => Body::empty(),
        };

        self.send(builder.body(body).unwrap()).await
    }

    pub async fn send(&self, request: Request<Body>) -> (StatusCode, Value) {
        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();

        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let json = serde_json::from_slice(&bytes).unwrap_or(Value::Null);

        (status, json)
    }

    pub async fn get(&self, uri: &str, token: &str) -> (StatusCode, Value) {
        self.request(Method::GET, uri, Some(token), None).await
    }

    pub async fn post(&self, uri: &str, token: &str, body: Value) -> (StatusCode, Value) {
        self.request(Method::POST, uri, Some(token), Some(body)).await
    }

    pub async fn register(&self, email: &str, password: &str) -> (StatusCode, Value) {
        self.request(
            Method::POST,
            "/api/user/create/",
            None,
            Some(json!({ "email": email, "password": password, "name": "Test Name" })),
        )
        .await
    }

    pub async fn obtain_token(&self, email: &str, password: &str) -> (StatusCode, Value) {
        self.request(
            Method::POST,
            "/api/user/token/",
            None,
            Some(json!({ "email": email, "password": password })),
        )
        .await
    }

    /// Register a user and return their token.
    pub async fn login_as(&self, email: &str) -> String {
        let (status, _) = self.register(email, PASSWORD).await;
        assert_eq!(status, StatusCode::CREATED);

        let (status, body) = self.obtain_token(email, PASSWORD).await;
        assert_eq!(status, StatusCode::OK);

        body["token"].as_str().unwrap().to_string()
    }

    pub async fn create_tag(&self, token: &str, name: &str) -> i64 {
        let (status, body) = self
            .post("/api/recipe/tags/", token, json!({ "name": name }))
            .await;
        assert_eq!(status, StatusCode::CREATED);
        body["id"].as_i64().unwrap()
    }

    pub async fn create_ingredient(&self, token: &str, name: &str) -> i64 {
        let (status, body) = self
            .post("/api/recipe/ingredients/", token, json!({ "name": name }))
            .await;
        assert_eq!(status, StatusCode::CREATED);
        body["id"].as_i64().unwrap()
    }

    /// Create a recipe from the default payload merged with `extra`.
    pub async fn create_recipe(&self, token: &str, extra: Value) -> Value {
        let mut payload = json!({
            "title": "Sample recipe",
            "time_minutes": 10,
            "price": "5.00",
        });

        if let (Some(target), Some(extra)) = (payload.as_object_mut(), extra.as_object()) {
            for (key, value) in extra {
                target.insert(key.clone(), value.clone());
            }
        }

        let (status, body) = self.post("/api/recipe/recipes/", token, payload).await;
        assert_eq!(status, StatusCode::CREATED, "unexpected body: {body}");
        body
    }

    pub async fn upload_image(
        &self,
        token: &str,
        recipe_id: i64,
        file: &[u8],
    ) -> (StatusCode, Value) {
        let (content_type, body) = multipart_body("image", "upload.png", file);

        let request = Request::builder()
            .method(Method::POST)
            .uri(format!("/api/recipe/recipes/{recipe_id}/upload-image/"))
            .header("Authorization", format!("Token {token}"))
            .header("Content-Type", content_type)
            .body(Body::from(body))
            .unwrap();

        self.send(request).await
    }

    /// Map a public media URL back to a path on disk.
    pub fn media_path(&self, url: &str) -> PathBuf {
        self.media_root.join(url.trim_start_matches("/media/"))
    }
}

pub fn ids(list: &Value) -> Vec<i64> {
    list.as_array()
        .unwrap()
        .iter()
        .map(|item| item["id"].as_i64().unwrap())
        .collect()
}

pub fn names(list: &Value) -> Vec<String> {
    list.as_array()
        .unwrap()
        .iter()
        .map(|item| item["name"].as_str().unwrap().to_string())
        .collect()
}

pub fn png_bytes() -> Vec<u8> {
    let img = image::RgbImage::from_pixel(10, 10, image::Rgb([120, 200, 80]));
    let mut out = Cursor::new(Vec::new());
    img.write_to(&mut out, image::ImageFormat::Png).unwrap();
    out.into_inner()
}

pub fn multipart_body(field: &str, filename: &str, content: &[u8]) -> (String, Vec<u8>) {
    let boundary = "recipe-api-test-boundary";

    let mut body = Vec::new();
    body.extend_from_slice(format!("--{boundary}\r\n").as_bytes());
    body.extend_from_slice(
        format!(
            "Content-Disposition: form-data; name=\"{field}\"; filename=\"{filename}\"\r\n"
        )
        .as_bytes(),
    );
    body.extend_from_slice(b"Content-Type: application/octet-stream\r\n\r\n");
    body.extend_from_slice(content);
    body.extend_from_slice(format!("\r\n--{boundary}--\r\n").as_bytes());

    (format!("multipart/form-data; boundary={boundary}"), body)
}
