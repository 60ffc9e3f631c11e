use chrono::NaiveDate;
use sea_orm::sea_query::{Expr, Query as SeaQuery};
use sea_orm::{ColumnTrait, EntityTrait, QueryFilter, QueryOrder};

use crate::{
    dto::bookings::DecoratorList,
    entity::{
        unavailable_dates::{self, Column as UnavailableCol},
        users::{Column as UserCol, Entity as Users, Model as UserModel},
    },
    error::AppResult,
    middleware::auth::ROLE_DECORATOR,
    models::DecoratorProfile,
    response::{ApiResponse, Meta},
    state::AppState,
};

/// Decorators free on the given date.
///
/// The unavailable-dates set is the single authoritative projection here;
/// it is kept in lockstep with the booking ledger by every writing
/// operation, so no cross-check against bookings is needed.
pub async fn available_decorators(
    state: &AppState,
    date: NaiveDate,
) -> AppResult<ApiResponse<DecoratorList>> {
    let booked = SeaQuery::select()
        .column(UnavailableCol::DecoratorId)
        .from(unavailable_dates::Entity)
        .and_where(Expr::col(UnavailableCol::Date).eq(date))
        .to_owned();

    let items = Users::find()
        .filter(UserCol::Role.eq(ROLE_DECORATOR))
        .filter(UserCol::Id.not_in_subquery(booked))
        .order_by_asc(UserCol::Name)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(profile_from_entity)
        .collect();

    Ok(ApiResponse::success(
        "Ok",
        DecoratorList { items },
        Some(Meta::empty()),
    ))
}

fn profile_from_entity(model: UserModel) -> DecoratorProfile {
    DecoratorProfile {
        id: model.id,
        name: model.name,
        email: model.email,
        phone: model.phone,
        image_url: model.image_url,
        specialty: model.specialty,
    }
}
