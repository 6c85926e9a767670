pub mod auth;
pub mod error;
pub mod media;
pub mod messages;
pub mod middleware;
mod wire;

use std::sync::Arc;

use axum::{
    Router,
    middleware::from_fn_with_state,
    routing::{get, post, put},
};

use parley_db::Database;
use parley_gateway::presence::Presence;

use crate::media::MediaClient;
use crate::middleware::require_auth;

pub type AppState = Arc<AppStateInner>;

pub struct AppStateInner {
    pub db: Database,
    pub jwt_secret: String,
    pub presence: Presence,
    /// External media host; image sends fail with a server error when
    /// no host is configured.
    pub media: Option<MediaClient>,
}

/// The full REST surface. The WebSocket gateway route is wired separately
/// by the server binary.
pub fn router(state: AppState) -> Router {
    let public = Router::new()
        .route("/api/auth/signup", post(auth::signup))
        .route("/api/auth/login", post(auth::login))
        .with_state(state.clone());

    let protected = Router::new()
        .route("/api/auth/check", get(auth::check))
        .route("/api/auth/update-profile", put(auth::update_profile))
        .route("/api/messages/users", get(messages::get_users_for_sidebar))
        .route("/api/messages/{id}", get(messages::get_messages))
        .route("/api/messages/mark/{id}", put(messages::mark_message_seen))
        .route("/api/messages/send/{id}", post(messages::send_message))
        .layer(from_fn_with_state(state.clone(), require_auth))
        .with_state(state);

    public.merge(protected)
}
