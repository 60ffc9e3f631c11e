use chrono::Utc;
use sea_orm::ActiveValue::NotSet;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect, Set,
};
use uuid::Uuid;

use crate::{
    audit::log_audit,
    dto::packages::{CreatePackageRequest, PackageList},
    entity::packages::{ActiveModel as PackageActive, Column as PackageCol, Entity as Packages, Model as PackageModel},
    error::{AppError, AppResult},
    middleware::auth::{AuthUser, Capability, require},
    models::Package,
    response::{ApiResponse, Meta},
    routes::params::CatalogQuery,
    state::AppState,
};

pub async fn list_packages(
    state: &AppState,
    query: CatalogQuery,
) -> AppResult<ApiResponse<PackageList>> {
    let (page, limit, offset) = query.pagination.normalize();

    let mut condition = Condition::all();
    if let Some(category) = query.category.as_ref().filter(|c| !c.is_empty()) {
        condition = condition.add(PackageCol::Category.eq(category.clone()));
    }
    if let Some(q) = query.q.as_ref().filter(|q| !q.is_empty()) {
        condition = condition.add(PackageCol::Name.contains(q));
    }

    let finder = Packages::find()
        .filter(condition)
        .order_by_desc(PackageCol::CreatedAt);

    let total = finder.clone().count(&state.orm).await? as i64;

    let items = finder
        .limit(limit as u64)
        .offset(offset as u64)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(package_from_entity)
        .collect();

    Ok(ApiResponse::success(
        "Ok",
        PackageList { items },
        Some(Meta::new(page, limit, total)),
    ))
}

pub async fn get_package(state: &AppState, id: Uuid) -> AppResult<ApiResponse<Package>> {
    let package = Packages::find_by_id(id)
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)?;

    Ok(ApiResponse::success(
        "Ok",
        package_from_entity(package),
        Some(Meta::empty()),
    ))
}

pub async fn create_package(
    state: &AppState,
    user: &AuthUser,
    payload: CreatePackageRequest,
) -> AppResult<ApiResponse<Package>> {
    require(user, Capability::ManageCatalog)?;

    if payload.name.trim().is_empty() || payload.category.trim().is_empty() {
        return Err(AppError::BadRequest("name and category are required".into()));
    }
    if payload.price <= 0 {
        return Err(AppError::BadRequest("price must be positive".into()));
    }

    let package = PackageActive {
        id: Set(Uuid::new_v4()),
        name: Set(payload.name),
        description: Set(payload.description),
        category: Set(payload.category),
        price: Set(payload.price),
        image_url: Set(payload.image_url.unwrap_or_default()),
        created_at: NotSet,
    }
    .insert(&state.orm)
    .await?;

    if let Err(err) = log_audit(
        &state.pool,
        Some(user.user_id),
        "package_created",
        Some("packages"),
        Some(serde_json::json!({ "package_id": package.id })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    Ok(ApiResponse::success(
        "Package created",
        package_from_entity(package),
        Some(Meta::empty()),
    ))
}

fn package_from_entity(model: PackageModel) -> Package {
    Package {
        id: model.id,
        name: model.name,
        description: model.description,
        category: model.category,
        price: model.price,
        image_url: model.image_url,
        created_at: model.created_at.with_timezone(&Utc),
    }
}
