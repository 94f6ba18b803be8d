//! Route modules and the application router.

use axum::Router;

use crate::state::AppState;

pub mod accounts;
pub mod health;

/// Builds the application router with every route mounted.
pub fn app(state: AppState) -> Router {
    Router::new()
        .merge(health::router())
        .nest("/api/v1/accounts", accounts::router())
        .with_state(state)
}
