use axum::{
    Router,
    extract::DefaultBodyLimit,
    http::{HeaderValue, Method, Uri},
    middleware,
    routing::{get, post},
};
use metrics_exporter_prometheus::PrometheusHandle;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use crate::config::Config;
use crate::db::Store;
use crate::services::{
    ImageService, RecipeService, SeaOrmRecipeService, SeaOrmUserService, UserService,
};

pub mod auth;
mod error;
mod extract;
mod health;
mod observability;
mod recipes;
mod taxonomy;
mod types;
mod users;
mod validation;

pub use error::ApiError;
pub use extract::ApiJson;
pub use types::*;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,

    pub store: Store,

    pub users: Arc<dyn UserService>,

    pub recipes: Arc<dyn RecipeService>,

    pub images: Arc<ImageService>,

    pub start_time: std::time::Instant,

    pub prometheus_handle: Option<PrometheusHandle>,
}

#[must_use]
pub fn create_app_state(
    config: Config,
    store: Store,
    prometheus_handle: Option<PrometheusHandle>,
) -> Arc<AppState> {
    let images = Arc::new(ImageService::new(&config.media));

    let users: Arc<dyn UserService> = Arc::new(SeaOrmUserService::new(
        store.clone(),
        config.security.clone(),
    ));

    let recipes: Arc<dyn RecipeService> =
        Arc::new(SeaOrmRecipeService::new(store.clone(), images.clone()));

    Arc::new(AppState {
        config: Arc::new(config),
        store,
        users,
        recipes,
        images,
        start_time: std::time::Instant::now(),
        prometheus_handle,
    })
}

/// Connect to (and migrate) the configured database, then wire up the services.
pub async fn create_app_state_from_config(
    config: Config,
    prometheus_handle: Option<PrometheusHandle>,
) -> anyhow::Result<Arc<AppState>> {
    let store = Store::from_config(&config).await?;
    Ok(create_app_state(config, store, prometheus_handle))
}

pub fn router(state: Arc<AppState>) -> Router {
    let media_url = format!("/{}", state.config.media.media_url.trim_matches('/'));
    let media_root = state.config.media.media_root.clone();
    let cors_origins = state.config.server.cors_allowed_origins.clone();

    let api_router = Router::new()
        .merge(create_public_router())
        .merge(create_protected_router(state.clone()))
        .with_state(state);

    let cors_layer = if cors_origins.iter().any(|o| o == "*") {
        CorsLayer::new().allow_origin(Any)
    } else {
        let origins: Vec<HeaderValue> =
            cors_origins.iter().filter_map(|s| s.parse().ok()).collect();
        CorsLayer::new().allow_origin(origins)
    };

    Router::new()
        .nest("/api", api_router)
        .nest_service(&media_url, ServeDir::new(media_root))
        .fallback(not_found)
        .layer(middleware::from_fn(observability::logging_middleware))
        .layer(cors_layer.allow_methods(Any).allow_headers(Any))
        .layer(TraceLayer::new_for_http())
        .layer(middleware::from_fn(
            observability::security_headers_middleware,
        ))
}

fn create_public_router() -> Router<Arc<AppState>> {
    Router::new()
        .route(
            "/user/create/",
            post(users::create_user).fallback(method_not_allowed),
        )
        .route(
            "/user/token/",
            post(users::create_token).fallback(method_not_allowed),
        )
        .route("/health", get(health::health))
}

fn create_protected_router(state: Arc<AppState>) -> Router<Arc<AppState>> {
    let max_upload_bytes = state.config.media.max_upload_bytes;

    Router::new()
        .route(
            "/user/me/",
            get(users::get_me)
                .patch(users::update_me)
                .fallback(method_not_allowed),
        )
        .route(
            "/recipe/tags/",
            get(taxonomy::list_tags)
                .post(taxonomy::create_tag)
                .fallback(method_not_allowed),
        )
        .route(
            "/recipe/ingredients/",
            get(taxonomy::list_ingredients)
                .post(taxonomy::create_ingredient)
                .fallback(method_not_allowed),
        )
        .route(
            "/recipe/recipes/",
            get(recipes::list_recipes)
                .post(recipes::create_recipe)
                .fallback(method_not_allowed),
        )
        .route(
            "/recipe/recipes/{id}/",
            get(recipes::get_recipe)
                .put(recipes::replace_recipe)
                .patch(recipes::patch_recipe)
                .fallback(method_not_allowed),
        )
        .route(
            "/recipe/recipes/{id}/upload-image/",
            post(recipes::upload_image)
                .fallback(method_not_allowed)
                .layer(DefaultBodyLimit::max(max_upload_bytes)),
        )
        .route("/metrics", get(observability::get_metrics))
        .route_layer(middleware::from_fn_with_state(state, auth::auth_middleware))
}

async fn method_not_allowed(method: Method) -> ApiError {
    ApiError::method_not_allowed(method)
}

async fn not_found(uri: Uri) -> ApiError {
    ApiError::NotFound(format!("No route for {}", uri.path()))
}
