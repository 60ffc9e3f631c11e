use crate::db::{DbPool, OrmConn};
use crate::gateway::StripeGateway;

#[derive(Clone)]
pub struct AppState {
    pub pool: DbPool,
    pub orm: OrmConn,
    pub gateway: StripeGateway,
    pub frontend_uri: String,
}
