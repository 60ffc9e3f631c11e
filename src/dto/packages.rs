use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::models::Package;

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreatePackageRequest {
    pub name: String,
    pub description: Option<String>,
    pub category: String,
    pub price: i64,
    pub image_url: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct PackageList {
    pub items: Vec<Package>,
}
