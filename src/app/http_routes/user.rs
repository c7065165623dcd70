use axum::extract::State;
use axum::http::HeaderMap;
use axum::routing::get;
use axum::Router;

use crate::api::UserHome;
use crate::app::state::AppState;
use crate::domain::user::UserModule;

use super::common::{blocking, map_api_error, user_id_of, HttpResult};

pub(super) fn router() -> Router<AppState> {
    Router::new()
        .route("/api/me/modules", get(user_modules))
        .route("/api/me/home", get(user_home))
}

async fn user_modules(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> HttpResult<Vec<UserModule>> {
    blocking(move || {
        state
            .user_api
            .get_user_modules(user_id_of(&headers))
            .map_err(map_api_error)
    })
    .await
}

async fn user_home(State(state): State<AppState>, headers: HeaderMap) -> HttpResult<UserHome> {
    blocking(move || {
        state
            .user_api
            .get_user_home(user_id_of(&headers))
            .map_err(map_api_error)
    })
    .await
}
