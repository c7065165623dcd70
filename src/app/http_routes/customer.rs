use axum::extract::{Path, Query, State};
use axum::http::HeaderMap;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;

use crate::api::CustomerInfo;
use crate::app::state::AppState;
use crate::domain::customer::{Customer, CustomerDraft, CustomerPage, CustomerTag};

use super::common::{actor_of, blocking, map_api_error, HttpResult};

// ==========================================
// 客户与标签
// ==========================================

pub(super) fn router() -> Router<AppState> {
    Router::new()
        .route("/api/customers", get(list_customers).post(create_customer))
        .route(
            "/api/customers/:id",
            get(get_customer).put(update_customer).delete(delete_customer),
        )
        .route("/api/customer-tags", get(list_tags).post(create_tag))
        .route("/api/customer-tags/lookup", post(lookup_tags))
}

#[derive(Debug, Deserialize)]
pub(super) struct ListQuery {
    search: Option<String>,
    page: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub(super) struct CustomerBody {
    #[serde(flatten)]
    draft: CustomerDraft,
    /// 用户已确认重复手机号
    #[serde(default)]
    allow_duplicate_phone: bool,
}

#[derive(Debug, Deserialize)]
pub(super) struct TagBody {
    tag_name: String,
}

#[derive(Debug, Deserialize)]
pub(super) struct TagLookupBody {
    #[serde(default)]
    tag_ids: Vec<String>,
}

async fn list_customers(
    State(state): State<AppState>,
    Query(q): Query<ListQuery>,
) -> HttpResult<CustomerPage> {
    blocking(move || {
        state
            .customer_api
            .list_customers(q.search.as_deref(), q.page.unwrap_or(1))
            .map_err(map_api_error)
    })
    .await
}

async fn create_customer(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(body): Json<CustomerBody>,
) -> HttpResult<Customer> {
    blocking(move || {
        let actor = actor_of(&state, &headers)?;
        state
            .customer_api
            .create_customer(body.draft, &actor, body.allow_duplicate_phone)
            .map_err(map_api_error)
    })
    .await
}

async fn get_customer(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> HttpResult<CustomerInfo> {
    blocking(move || state.customer_api.get_customer_info(&id).map_err(map_api_error)).await
}

async fn update_customer(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<String>,
    Json(body): Json<CustomerBody>,
) -> HttpResult<Customer> {
    blocking(move || {
        let actor = actor_of(&state, &headers)?;
        state
            .customer_api
            .update_customer(&id, body.draft, &actor, body.allow_duplicate_phone)
            .map_err(map_api_error)
    })
    .await
}

async fn delete_customer(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> HttpResult<serde_json::Value> {
    blocking(move || {
        let actor = actor_of(&state, &headers)?;
        state
            .customer_api
            .delete_customer(&id, &actor)
            .map_err(map_api_error)?;
        Ok(serde_json::json!({ "deleted": id }))
    })
    .await
}

async fn list_tags(State(state): State<AppState>) -> HttpResult<Vec<CustomerTag>> {
    blocking(move || state.customer_api.list_tags().map_err(map_api_error)).await
}

async fn create_tag(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(body): Json<TagBody>,
) -> HttpResult<CustomerTag> {
    blocking(move || {
        let actor = actor_of(&state, &headers)?;
        state
            .customer_api
            .create_tag(&body.tag_name, &actor)
            .map_err(map_api_error)
    })
    .await
}

async fn lookup_tags(
    State(state): State<AppState>,
    Json(body): Json<TagLookupBody>,
) -> HttpResult<Vec<CustomerTag>> {
    blocking(move || {
        state
            .customer_api
            .lookup_tags(&body.tag_ids)
            .map_err(map_api_error)
    })
    .await
}
