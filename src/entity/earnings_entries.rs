use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "earnings_entries")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: Uuid,
    pub decorator_id: Uuid,
    pub booking_id: Uuid,
    pub amount: i64,
    pub description: String,
    pub entry_date: Date,
    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::users::Entity",
        from = "Column::DecoratorId",
        to = "super::users::Column::Id"
    )]
    Decorator,
}

impl Related<super::users::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Decorator.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
