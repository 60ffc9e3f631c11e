use axum::{
    Json, Router,
    extract::{Path, Query, State},
    routing::{delete, get, patch, post},
};
use uuid::Uuid;

use crate::{
    dto::services::{CreateServiceRequest, ServiceList, UpdateServiceRequest},
    error::AppResult,
    middleware::auth::AuthUser,
    models::ServiceOffering,
    response::ApiResponse,
    routes::params::CatalogQuery,
    services::catalog_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_services))
        .route("/", post(create_service))
        .route("/{id}", get(get_service))
        .route("/{id}", patch(update_service))
        .route("/{id}", delete(delete_service))
}

#[utoipa::path(
    get,
    path = "/api/services",
    params(
        ("page" = Option<i64>, Query, description = "Page number, default 1"),
        ("per_page" = Option<i64>, Query, description = "Items per page, default 20"),
        ("q" = Option<String>, Query, description = "Name search"),
        ("category" = Option<String>, Query, description = "Filter by category")
    ),
    responses(
        (status = 200, description = "List services", body = ApiResponse<ServiceList>),
    ),
    tag = "Services"
)]
pub async fn list_services(
    State(state): State<AppState>,
    Query(query): Query<CatalogQuery>,
) -> AppResult<Json<ApiResponse<ServiceList>>> {
    let resp = catalog_service::list_services(&state, query).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/services/{id}",
    params(("id" = Uuid, Path, description = "Service ID")),
    responses(
        (status = 200, description = "Get service", body = ApiResponse<ServiceOffering>),
        (status = 404, description = "Not Found"),
    ),
    tag = "Services"
)]
pub async fn get_service(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<ServiceOffering>>> {
    let resp = catalog_service::get_service(&state, id).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/services",
    request_body = CreateServiceRequest,
    responses(
        (status = 201, description = "Create service (admin only)", body = ApiResponse<ServiceOffering>),
        (status = 403, description = "Forbidden"),
    ),
    security(("bearer_auth" = [])),
    tag = "Services"
)]
pub async fn create_service(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<CreateServiceRequest>,
) -> AppResult<Json<ApiResponse<ServiceOffering>>> {
    let resp = catalog_service::create_service(&state, &user, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    patch,
    path = "/api/services/{id}",
    params(("id" = Uuid, Path, description = "Service ID")),
    request_body = UpdateServiceRequest,
    responses(
        (status = 200, description = "Update service (admin only)", body = ApiResponse<ServiceOffering>),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Not Found"),
    ),
    security(("bearer_auth" = [])),
    tag = "Services"
)]
pub async fn update_service(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateServiceRequest>,
) -> AppResult<Json<ApiResponse<ServiceOffering>>> {
    let resp = catalog_service::update_service(&state, &user, id, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    delete,
    path = "/api/services/{id}",
    params(("id" = Uuid, Path, description = "Service ID")),
    responses(
        (status = 200, description = "Delete service (admin only)"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Not Found"),
    ),
    security(("bearer_auth" = [])),
    tag = "Services"
)]
pub async fn delete_service(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<serde_json::Value>>> {
    let resp = catalog_service::delete_service(&state, &user, id).await?;
    Ok(Json(resp))
}
