use sea_orm::entity::prelude::*;

/// Per-decorator projection of dates already committed to an active
/// booking. Mutated only by the booking services, always inside the same
/// transaction as the booking write.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "decorator_unavailable_dates")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub decorator_id: Uuid,
    #[sea_orm(primary_key, auto_increment = false)]
    pub date: Date,
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
