//! HTTP surface: the public home page and the admin JSON API

use std::sync::Arc;
use std::time::Duration;

use axum::extract::{FromRequestParts, Path, State};
use axum::http::request::Parts;
use axum::http::{header, StatusCode};
use axum::response::{Html, IntoResponse, Response};
use axum::routing::{get, patch, post, put};
use axum::{Json, Router};
use serde::Deserialize;

use crate::admin::{AdminConsole, ConsoleList};
use crate::config::ImagesConfig;
use crate::entity::{Facility, Organization, ScriptureDraft, Slide};
use crate::page::HomePage;
use crate::session::{AdminGate, AdminSession, SessionRegistry};
use crate::store::RemoteStore;
use crate::YedalmError;

/// Site application state
#[derive(Clone)]
pub struct SiteState {
    pub store: Arc<dyn RemoteStore>,
    pub gate: Arc<AdminGate>,
    pub sessions: Arc<SessionRegistry>,
    pub images: ImagesConfig,
}

impl SiteState {
    pub fn new(store: Arc<dyn RemoteStore>, images: ImagesConfig) -> Self {
        Self {
            gate: Arc::new(AdminGate::new(Arc::clone(&store))),
            sessions: Arc::new(SessionRegistry::new(Arc::clone(&store))),
            store,
            images,
        }
    }

    /// Replace the session registry with one using the given limits
    pub fn with_session_limits(mut self, idle_timeout: Duration, max_sessions: usize) -> Self {
        self.sessions = Arc::new(SessionRegistry::with_limits(
            Arc::clone(&self.store),
            idle_timeout,
            max_sessions,
        ));
        self
    }
}

/// Build the site axum router
pub fn build_router(state: SiteState) -> Router {
    Router::new()
        .route("/", get(index_handler))
        .route("/health", get(health_handler))
        .route("/api/home", get(home_handler))
        .route("/api/admin/login", post(login_handler))
        .route("/api/admin/logout", post(logout_handler))
        .route("/api/admin/password", put(password_handler))
        .route(
            "/api/admin/scripture",
            get(scripture_handler).put(update_scripture_handler),
        )
        .merge(list_routes::<Slide>())
        .merge(list_routes::<Organization>())
        .merge(list_routes::<Facility>())
        .with_state(state)
}

fn list_routes<T: ConsoleList>() -> Router<SiteState> {
    let base = format!("/api/admin/{}", T::KIND);
    Router::new()
        .route(&base, get(list_handler::<T>).post(add_handler::<T>))
        .route(&format!("{}/order", base), put(order_handler::<T>))
        .route(
            &format!("{}/{{id}}", base),
            patch(edit_handler::<T>).delete(delete_handler::<T>),
        )
}

/// Error response: status derived from the error kind, JSON body
#[derive(Debug)]
pub struct ApiError(YedalmError);

impl From<YedalmError> for ApiError {
    fn from(e: YedalmError) -> Self {
        Self(e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self.0 {
            YedalmError::Unauthorized => StatusCode::UNAUTHORIZED,
            YedalmError::NotFound(_) => StatusCode::NOT_FOUND,
            YedalmError::Reorder(_) | YedalmError::Site(_) => StatusCode::BAD_REQUEST,
            YedalmError::Store { .. } | YedalmError::Http(_) | YedalmError::Json(_) => {
                StatusCode::BAD_GATEWAY
            }
            YedalmError::Config(_) | YedalmError::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        if status.is_server_error() {
            tracing::error!("Request failed: {}", self.0);
        } else {
            tracing::debug!("Request rejected: {}", self.0);
        }
        (status, Json(serde_json::json!({ "error": self.0.to_string() }))).into_response()
    }
}

/// A request carrying a live admin session token
pub struct Admin {
    pub session: AdminSession,
    pub console: Arc<AdminConsole>,
}

impl FromRequestParts<SiteState> for Admin {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &SiteState,
    ) -> Result<Self, Self::Rejection> {
        let token = parts
            .headers
            .get(header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.strip_prefix("Bearer "))
            .ok_or(YedalmError::Unauthorized)?;
        let (session, console) = state.sessions.lookup(token.trim()).await?;
        Ok(Self { session, console })
    }
}

#[derive(Debug, Deserialize)]
struct PasswordRequest {
    password: String,
}

#[derive(Debug, Deserialize)]
struct OrderRequest {
    ids: Vec<i64>,
}

async fn index_handler(State(site): State<SiteState>) -> impl IntoResponse {
    let page = HomePage::load(&site.store).await;
    Html(page.render_html(&site.images))
}

async fn health_handler() -> impl IntoResponse {
    "OK"
}

async fn home_handler(State(site): State<SiteState>) -> impl IntoResponse {
    Json(HomePage::load(&site.store).await)
}

async fn login_handler(
    State(site): State<SiteState>,
    Json(request): Json<PasswordRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let session = site.gate.login(&request.password).await?;
    let token = session.token().to_string();
    site.sessions.open(session).await;
    Ok(Json(serde_json::json!({ "token": token })))
}

async fn logout_handler(State(site): State<SiteState>, admin: Admin) -> StatusCode {
    site.sessions.close(admin.session.token()).await;
    StatusCode::NO_CONTENT
}

async fn password_handler(
    State(site): State<SiteState>,
    admin: Admin,
    Json(request): Json<PasswordRequest>,
) -> Result<StatusCode, ApiError> {
    site.gate
        .change_password(&admin.session, &request.password)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn list_handler<T: ConsoleList>(admin: Admin) -> Json<Vec<T>> {
    Json(admin.console.rows::<T>().await)
}

async fn add_handler<T: ConsoleList>(
    admin: Admin,
    Json(draft): Json<T::Draft>,
) -> Result<impl IntoResponse, ApiError> {
    let row = admin.console.add::<T>(&draft).await?;
    Ok((StatusCode::CREATED, Json(row)))
}

async fn edit_handler<T: ConsoleList>(
    admin: Admin,
    Path(id): Path<i64>,
    Json(patch): Json<T::Patch>,
) -> Result<Json<T>, ApiError> {
    Ok(Json(admin.console.edit::<T>(id, &patch).await?))
}

async fn delete_handler<T: ConsoleList>(
    admin: Admin,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    admin.console.delete::<T>(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Partial persistence failures still answer 200; the outcome lists them
async fn order_handler<T: ConsoleList>(
    admin: Admin,
    Json(request): Json<OrderRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let outcome = admin.console.reorder_ids::<T>(&request.ids).await?;
    Ok(Json(outcome))
}

async fn scripture_handler(admin: Admin) -> impl IntoResponse {
    Json(admin.console.scripture().await)
}

async fn update_scripture_handler(
    admin: Admin,
    Json(draft): Json<ScriptureDraft>,
) -> Result<impl IntoResponse, ApiError> {
    Ok(Json(admin.console.update_scripture(&draft).await?))
}
