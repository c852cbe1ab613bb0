use std::{str::FromStr, sync::Arc};

use axum::{
    Json, Router,
    extract::{Path, State, rejection::JsonRejection},
    http::StatusCode,
    response::{Html, IntoResponse, Response},
    routing::{get, post},
};
use tokio::net::TcpListener;
use tower_http::services::ServeDir;
use tracing::{error, info};

use streamdock_core::{ActionRunner, Credential, Settings, Store, StoreError, SystemAction};

const INDEX_HTML: &str = include_str!("../static/index.html");

#[derive(Clone)]
pub struct AppState {
    store: Arc<Store>,
    runner: Arc<dyn ActionRunner>,
}

impl AppState {
    pub fn new(store: Arc<Store>, runner: Arc<dyn ActionRunner>) -> Self {
        Self { store, runner }
    }
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(index_handler))
        .route("/healthz", get(healthz_handler))
        .route("/api/settings", get(get_settings).post(post_settings))
        .route("/api/login/{platform}", get(get_login).post(post_login))
        .route("/api/clear-logins", post(clear_logins))
        .route("/api/system/{action}", post(system_action))
        .nest_service("/static", ServeDir::new("static"))
        .with_state(state)
}

pub async fn serve(listener: TcpListener, state: AppState) -> Result<(), String> {
    info!(
        "streamdock listening on {}",
        listener
            .local_addr()
            .map(|a| a.to_string())
            .unwrap_or_else(|_| "unknown".to_owned())
    );
    axum::serve(listener, build_router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|err| err.to_string())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        error!("failed to listen for shutdown signal: {}", err);
    }
}

async fn index_handler() -> Html<&'static str> {
    Html(INDEX_HTML)
}

async fn healthz_handler() -> impl IntoResponse {
    Json(serde_json::json!({"ok": true}))
}

async fn get_settings(State(state): State<AppState>) -> Json<Settings> {
    Json(state.store.settings())
}

async fn post_settings(
    State(state): State<AppState>,
    body: Result<Json<Settings>, JsonRejection>,
) -> Response {
    let Ok(Json(settings)) = body else {
        return (StatusCode::BAD_REQUEST, "Invalid settings data").into_response();
    };
    state.store.replace_settings(settings);
    StatusCode::OK.into_response()
}

async fn get_login(State(state): State<AppState>, Path(platform): Path<String>) -> Response {
    match state.store.credential(&platform) {
        Ok(credential) => Json(credential).into_response(),
        Err(err) => store_error_response(err),
    }
}

async fn post_login(
    State(state): State<AppState>,
    Path(platform): Path<String>,
    body: Result<Json<Credential>, JsonRejection>,
) -> Response {
    let Ok(Json(credential)) = body else {
        return (StatusCode::BAD_REQUEST, "Invalid login data").into_response();
    };
    match state.store.set_credential(&platform, credential) {
        Ok(()) => StatusCode::OK.into_response(),
        Err(err) => store_error_response(err),
    }
}

async fn clear_logins(State(state): State<AppState>) -> StatusCode {
    state.store.clear_credentials();
    StatusCode::OK
}

async fn system_action(State(state): State<AppState>, Path(action): Path<String>) -> Response {
    let Ok(action) = SystemAction::from_str(&action) else {
        return (StatusCode::BAD_REQUEST, "Invalid action").into_response();
    };

    // Host commands block; keep them off the request workers.
    let runner = Arc::clone(&state.runner);
    let outcome = tokio::task::spawn_blocking(move || runner.perform(action)).await;

    match outcome {
        Ok(Ok(())) => StatusCode::OK.into_response(),
        Ok(Err(err)) => {
            error!("system action {} failed: {}", action, err);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Failed to execute {}: {}", action, err),
            )
                .into_response()
        }
        Err(err) => {
            error!("system action {} task failed: {}", action, err);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Failed to execute {}: {}", action, err),
            )
                .into_response()
        }
    }
}

fn store_error_response(err: StoreError) -> Response {
    match err {
        StoreError::UnknownPlatform(_)
        | StoreError::UnknownProfile(_)
        | StoreError::EmptyProfileName => (StatusCode::BAD_REQUEST, err.to_string()).into_response(),
        StoreError::Password(_) => {
            error!("credential operation failed: {}", err);
            (StatusCode::INTERNAL_SERVER_ERROR, err.to_string()).into_response()
        }
    }
}
