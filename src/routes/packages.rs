use axum::{
    Json, Router,
    extract::{Path, Query, State},
    routing::{get, post},
};
use uuid::Uuid;

use crate::{
    dto::packages::{CreatePackageRequest, PackageList},
    error::AppResult,
    middleware::auth::AuthUser,
    models::Package,
    response::ApiResponse,
    routes::params::CatalogQuery,
    services::package_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_packages))
        .route("/", post(create_package))
        .route("/{id}", get(get_package))
}

#[utoipa::path(
    get,
    path = "/api/packages",
    params(
        ("page" = Option<i64>, Query, description = "Page number, default 1"),
        ("per_page" = Option<i64>, Query, description = "Items per page, default 20"),
        ("q" = Option<String>, Query, description = "Name search"),
        ("category" = Option<String>, Query, description = "Filter by category")
    ),
    responses(
        (status = 200, description = "List packages", body = ApiResponse<PackageList>),
    ),
    tag = "Packages"
)]
pub async fn list_packages(
    State(state): State<AppState>,
    Query(query): Query<CatalogQuery>,
) -> AppResult<Json<ApiResponse<PackageList>>> {
    let resp = package_service::list_packages(&state, query).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/packages/{id}",
    params(("id" = Uuid, Path, description = "Package ID")),
    responses(
        (status = 200, description = "Get package", body = ApiResponse<Package>),
        (status = 404, description = "Not Found"),
    ),
    tag = "Packages"
)]
pub async fn get_package(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<Package>>> {
    let resp = package_service::get_package(&state, id).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/packages",
    request_body = CreatePackageRequest,
    responses(
        (status = 201, description = "Create package (admin only)", body = ApiResponse<Package>),
        (status = 403, description = "Forbidden"),
    ),
    security(("bearer_auth" = [])),
    tag = "Packages"
)]
pub async fn create_package(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<CreatePackageRequest>,
) -> AppResult<Json<ApiResponse<Package>>> {
    let resp = package_service::create_package(&state, &user, payload).await?;
    Ok(Json(resp))
}
