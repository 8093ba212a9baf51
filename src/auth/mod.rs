mod dto;
pub mod handlers;
pub mod repo;
pub mod services;

use crate::state::AppState;
use axum::Router;

pub use dto::PublicUser;
pub use services::{AdminUser, AuthContext, AuthUser, MaybeUser};

pub fn router() -> Router<AppState> {
    Router::new().merge(handlers::auth_routes())
}
