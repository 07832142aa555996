use axum::Router;

use crate::state::AppState;

pub mod dto;
pub mod handlers;
pub mod jwt;
pub mod password;
pub mod validate;

pub fn router() -> Router<AppState> {
    handlers::auth_routes()
}
