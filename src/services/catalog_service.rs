use chrono::Utc;
use sea_orm::ActiveValue::NotSet;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect, Set,
};
use uuid::Uuid;

use crate::{
    audit::log_audit,
    dto::services::{CreateServiceRequest, ServiceList, UpdateServiceRequest},
    entity::services::{ActiveModel as ServiceActive, Column as ServiceCol, Entity as Services, Model as ServiceModel},
    error::{AppError, AppResult},
    middleware::auth::{AuthUser, Capability, require},
    models::ServiceOffering,
    response::{ApiResponse, Meta},
    routes::params::CatalogQuery,
    state::AppState,
};

pub async fn list_services(
    state: &AppState,
    query: CatalogQuery,
) -> AppResult<ApiResponse<ServiceList>> {
    let (page, limit, offset) = query.pagination.normalize();

    let mut condition = Condition::all();
    if let Some(category) = query.category.as_ref().filter(|c| !c.is_empty()) {
        condition = condition.add(ServiceCol::Category.eq(category.clone()));
    }
    if let Some(q) = query.q.as_ref().filter(|q| !q.is_empty()) {
        condition = condition.add(ServiceCol::Name.contains(q));
    }

    let finder = Services::find()
        .filter(condition)
        .order_by_desc(ServiceCol::CreatedAt);

    let total = finder.clone().count(&state.orm).await? as i64;

    let items = finder
        .limit(limit as u64)
        .offset(offset as u64)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(service_from_entity)
        .collect();

    Ok(ApiResponse::success(
        "Ok",
        ServiceList { items },
        Some(Meta::new(page, limit, total)),
    ))
}

pub async fn get_service(state: &AppState, id: Uuid) -> AppResult<ApiResponse<ServiceOffering>> {
    let service = Services::find_by_id(id)
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)?;

    Ok(ApiResponse::success(
        "Ok",
        service_from_entity(service),
        Some(Meta::empty()),
    ))
}

pub async fn create_service(
    state: &AppState,
    user: &AuthUser,
    payload: CreateServiceRequest,
) -> AppResult<ApiResponse<ServiceOffering>> {
    require(user, Capability::ManageCatalog)?;

    if payload.name.trim().is_empty() || payload.category.trim().is_empty() {
        return Err(AppError::BadRequest("name and category are required".into()));
    }
    if payload.price <= 0 {
        return Err(AppError::BadRequest("price must be positive".into()));
    }

    let service = ServiceActive {
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
        "service_created",
        Some("services"),
        Some(serde_json::json!({ "service_id": service.id })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    Ok(ApiResponse::success(
        "Service created",
        service_from_entity(service),
        Some(Meta::empty()),
    ))
}

pub async fn update_service(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
    payload: UpdateServiceRequest,
) -> AppResult<ApiResponse<ServiceOffering>> {
    require(user, Capability::ManageCatalog)?;

    let service = Services::find_by_id(id)
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)?;

    let mut active: ServiceActive = service.into();
    if let Some(name) = payload.name {
        active.name = Set(name);
    }
    if let Some(description) = payload.description {
        active.description = Set(Some(description));
    }
    if let Some(category) = payload.category {
        active.category = Set(category);
    }
    if let Some(price) = payload.price {
        if price <= 0 {
            return Err(AppError::BadRequest("price must be positive".into()));
        }
        active.price = Set(price);
    }
    if let Some(image_url) = payload.image_url {
        active.image_url = Set(image_url);
    }

    let updated = active.update(&state.orm).await?;

    if let Err(err) = log_audit(
        &state.pool,
        Some(user.user_id),
        "service_updated",
        Some("services"),
        Some(serde_json::json!({ "service_id": updated.id })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    Ok(ApiResponse::success(
        "Service updated",
        service_from_entity(updated),
        Some(Meta::empty()),
    ))
}

pub async fn delete_service(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<serde_json::Value>> {
    require(user, Capability::ManageCatalog)?;

    let result = Services::delete_by_id(id).exec(&state.orm).await?;
    if result.rows_affected == 0 {
        return Err(AppError::NotFound);
    }

    if let Err(err) = log_audit(
        &state.pool,
        Some(user.user_id),
        "service_deleted",
        Some("services"),
        Some(serde_json::json!({ "service_id": id })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    Ok(ApiResponse::success(
        "Service deleted",
        serde_json::json!({ "id": id }),
        Some(Meta::empty()),
    ))
}

fn service_from_entity(model: ServiceModel) -> ServiceOffering {
    ServiceOffering {
        id: model.id,
        name: model.name,
        description: model.description,
        category: model.category,
        price: model.price,
        image_url: model.image_url,
        created_at: model.created_at.with_timezone(&Utc),
    }
}
