use axum::extract::{Query, State};
use axum::routing::get;
use axum::Router;
use serde::Deserialize;

use crate::app::state::AppState;
use crate::domain::master::{Location, Product, SkuView};

use super::common::{blocking, map_api_error, HttpResult};

pub(super) fn router() -> Router<AppState> {
    Router::new()
        .route("/api/catalog/locations", get(list_locations))
        .route("/api/catalog/products", get(list_products))
        .route("/api/catalog/skus", get(list_skus))
        .route("/api/catalog/sku-search", get(search_skus))
}

#[derive(Debug, Deserialize)]
pub(super) struct SearchQuery {
    #[serde(default)]
    q: String,
}

async fn list_locations(State(state): State<AppState>) -> HttpResult<Vec<Location>> {
    blocking(move || state.catalog_api.list_locations().map_err(map_api_error)).await
}

async fn list_products(State(state): State<AppState>) -> HttpResult<Vec<Product>> {
    blocking(move || state.catalog_api.list_products().map_err(map_api_error)).await
}

async fn list_skus(State(state): State<AppState>) -> HttpResult<Vec<SkuView>> {
    blocking(move || state.catalog_api.list_skus().map_err(map_api_error)).await
}

async fn search_skus(
    State(state): State<AppState>,
    Query(q): Query<SearchQuery>,
) -> HttpResult<Vec<SkuView>> {
    blocking(move || state.catalog_api.search_skus(&q.q).map_err(map_api_error)).await
}
