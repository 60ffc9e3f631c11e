use std::env;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub host: String,
    pub port: u16,
    pub stripe_secret_key: String,
    pub stripe_api_url: String,
    pub frontend_uri: String,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = env::var("DATABASE_URL")?;
        let host = env::var("APP_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port = env::var("APP_PORT")
            .ok()
            .and_then(|p| p.parse::<u16>().ok())
            .unwrap_or(3000);
        let stripe_secret_key = env::var("STRIPE_SECRET_KEY")?;
        let stripe_api_url = env::var("STRIPE_API_URL")
            .unwrap_or_else(|_| "https://api.stripe.com/v1".to_string());
        let frontend_uri =
            env::var("FRONTEND_URI").unwrap_or_else(|_| "http://localhost:5173".to_string());
        Ok(Self {
            database_url,
            host,
            port,
            stripe_secret_key,
            stripe_api_url,
            frontend_uri,
        })
    }
}
