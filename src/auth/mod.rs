use crate::state::AppState;
use axum::Router;

pub mod dto;
pub(crate) mod extractors;
pub mod handlers;
pub mod password;
pub mod policy;
pub mod reset;
pub mod token;
pub mod validator;

pub fn router() -> Router<AppState> {
    handlers::session_routes()
}
