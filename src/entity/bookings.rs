use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "bookings")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: Uuid,
    pub customer_id: Uuid,
    pub customer_name: String,
    pub customer_image: String,
    pub customer_phone: String,
    pub decorator_id: Uuid,
    pub decorator_name: String,
    pub decorator_image: String,
    pub decorator_phone: String,
    pub service_id: Uuid,
    pub service_name: String,
    pub service_price: i64,
    pub service_category: String,
    pub event_date: Date,
    pub event_time: String,
    pub event_location: String,
    pub notes: String,
    pub status: String,
    pub payment_status: String,
    pub transaction_id: Option<String>,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::users::Entity",
        from = "Column::CustomerId",
        to = "super::users::Column::Id"
    )]
    Customer,
    #[sea_orm(
        belongs_to = "super::services::Entity",
        from = "Column::ServiceId",
        to = "super::services::Column::Id"
    )]
    Service,
    #[sea_orm(has_many = "super::payments::Entity")]
    Payments,
}

impl Related<super::services::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Service.def()
    }
}

impl Related<super::payments::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Payments.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
