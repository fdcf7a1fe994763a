//! API router.
//!
//! Returns a composable `Router` with all endpoints under `/api/` and the
//! media directory served under `/media/`. Three route groups:
//! public → no middleware; authenticated → `require_auth`; lawyer-only →
//! `require_auth` + `require_lawyer`.

use std::sync::Arc;

use axum::routing::{get, patch, post, put};
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;

use crate::api::endpoints;
use crate::api::middleware;
use crate::api::types::ApiContext;
use crate::app_state::AppState;

/// Build the API router.
pub fn api_router(state: Arc<AppState>) -> Router {
    let ctx = ApiContext::new(state);
    build_router(ctx)
}

fn build_router(ctx: ApiContext) -> Router {
    // Public routes — browsing and account entry points
    let public = Router::new()
        .route("/health", get(endpoints::health::check))
        .route("/auth/signup", post(endpoints::auth::signup))
        .route("/auth/login", post(endpoints::auth::login))
        .route("/auth/reset-request", post(endpoints::auth::reset_request))
        .route("/auth/reset", post(endpoints::auth::reset))
        .route("/lawyers", get(endpoints::lawyers::search))
        .route("/lawyers/:id", get(endpoints::lawyers::profile))
        .route(
            "/lawyers/:id/availability",
            get(endpoints::lawyers::availability),
        )
        .route("/lawyers/:id/reviews", get(endpoints::reviews::list))
        .with_state(ctx.clone());

    // Authenticated routes — any role; handlers enforce finer rules
    let authed = Router::new()
        .route("/auth/logout", post(endpoints::auth::logout))
        .route("/me", get(endpoints::auth::me))
        .route(
            "/appointments",
            get(endpoints::appointments::list).post(endpoints::appointments::book),
        )
        .route(
            "/appointments/upcoming",
            get(endpoints::appointments::upcoming),
        )
        .route(
            "/appointments/:id/status",
            patch(endpoints::appointments::set_status),
        )
        .route("/reviews", post(endpoints::reviews::create))
        .route("/reviews/mine/:lawyer_id", get(endpoints::reviews::own))
        .with_state(ctx.clone())
        .layer(axum::middleware::from_fn(middleware::auth::require_auth));

    // Lawyer-only routes — own profile management
    let lawyer = Router::new()
        .route("/profile", put(endpoints::lawyers::update_own_profile))
        .route("/profile/photo", post(endpoints::lawyers::upload_photo))
        .with_state(ctx.clone())
        .layer(axum::middleware::from_fn(middleware::auth::require_lawyer))
        .layer(axum::middleware::from_fn(middleware::auth::require_auth));

    Router::new()
        .nest("/api", public)
        .nest("/api", authed)
        .nest("/api", lawyer)
        .nest_service("/media", ServeDir::new(&ctx.state.media_dir))
        .layer(CorsLayer::permissive())
        // Extension must be outermost so middleware can extract ApiContext
        .layer(axum::Extension(ctx))
}
