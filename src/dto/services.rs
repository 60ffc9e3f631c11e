use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::models::ServiceOffering;

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateServiceRequest {
    pub name: String,
    pub description: Option<String>,
    pub category: String,
    pub price: i64,
    pub image_url: Option<String>,
}

#[derive(Debug, Deserialize, Default, ToSchema)]
pub struct UpdateServiceRequest {
    pub name: Option<String>,
    pub description: Option<String>,
    pub category: Option<String>,
    pub price: Option<i64>,
    pub image_url: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ServiceList {
    pub items: Vec<ServiceOffering>,
}
