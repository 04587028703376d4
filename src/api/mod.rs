use axum::{
    Router,
    http::HeaderValue,
    middleware,
    routing::{delete, get, post},
};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tower_sessions::{Expiry, MemoryStore, SessionManagerLayer};

use crate::config::Config;
use crate::db::{AccountStore, ProductStore};
use crate::services::{AdminService, StatsService};
use crate::state::SharedState;

mod admin;
pub mod auth;
mod error;
mod types;

pub use error::ApiError;
pub use types::*;

#[derive(Clone)]
pub struct AppState {
    pub shared: Arc<SharedState>,
}

impl AppState {
    #[must_use]
    pub fn config(&self) -> &Config {
        &self.shared.config
    }

    #[must_use]
    pub fn accounts(&self) -> &AccountStore {
        &self.shared.accounts
    }

    #[must_use]
    pub fn products(&self) -> &ProductStore {
        &self.shared.products
    }

    #[must_use]
    pub fn stats(&self) -> &StatsService {
        &self.shared.stats
    }

    #[must_use]
    pub fn admin(&self) -> &AdminService {
        &self.shared.admin
    }
}

#[must_use]
pub fn create_app_state(config: Config) -> Arc<AppState> {
    Arc::new(AppState {
        shared: Arc::new(SharedState::new(config)),
    })
}

#[must_use]
pub fn create_app_state_from_shared(shared: Arc<SharedState>) -> Arc<AppState> {
    Arc::new(AppState { shared })
}

#[must_use]
pub fn router(state: Arc<AppState>) -> Router {
    let (cors_origins, session_minutes) = {
        let config = state.config();
        (
            config.server.cors_allowed_origins.clone(),
            config.server.session_timeout_minutes,
        )
    };

    let protected_routes = create_protected_router(state.clone());

    let session_store = MemoryStore::default();
    let session_layer = SessionManagerLayer::new(session_store)
        .with_secure(false)
        .with_same_site(tower_sessions::cookie::SameSite::Lax)
        .with_expiry(Expiry::OnInactivity(time::Duration::minutes(
            session_minutes,
        )));

    let api_router = Router::new()
        .merge(protected_routes)
        .route("/auth/login", post(auth::login))
        .route("/auth/logout", post(auth::logout))
        .route("/auth/me", get(auth::get_current_user))
        .layer(session_layer)
        .with_state(state);

    let cors_layer = if cors_origins.contains(&"*".to_string()) {
        CorsLayer::new().allow_origin(Any)
    } else {
        let origins: Vec<HeaderValue> =
            cors_origins.iter().filter_map(|s| s.parse().ok()).collect();
        CorsLayer::new().allow_origin(origins)
    };

    Router::new()
        .nest("/api", api_router)
        .layer(cors_layer.allow_methods(Any).allow_headers(Any))
        .layer(TraceLayer::new_for_http())
}

fn create_protected_router(state: Arc<AppState>) -> Router<Arc<AppState>> {
    Router::new()
        .route("/admin/dashboard", get(admin::dashboard))
        .route("/admin/farmers", get(admin::list_farmers))
        .route("/admin/farmers/{username}", get(admin::farmer_detail))
        .route("/admin/farmers/{username}", delete(admin::delete_farmer))
        .route(
            "/admin/farmers/{username}/toggle",
            post(admin::toggle_farmer_status),
        )
        .route("/admin/products", get(admin::list_products))
        .route("/admin/products/{id}", delete(admin::delete_product))
        .route_layer(middleware::from_fn_with_state(
            state,
            auth::admin_auth_middleware,
        ))
}
