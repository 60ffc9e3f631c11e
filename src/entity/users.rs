use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "users")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub phone: String,
    pub image_url: String,
    pub role: String,
    pub specialty: String,
    pub earnings_total: i64,
    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::earnings_entries::Entity")]
    EarningsEntries,
    #[sea_orm(has_many = "super::unavailable_dates::Entity")]
    UnavailableDates,
}

impl Related<super::earnings_entries::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::EarningsEntries.def()
    }
}

impl Related<super::unavailable_dates::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::UnavailableDates.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
