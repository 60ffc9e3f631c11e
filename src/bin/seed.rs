use argon2::{
    Argon2, PasswordHasher,
    password_hash::{SaltString, rand_core::OsRng},
};
use decor_booking_api::{config::AppConfig, db::create_pool};
use uuid::Uuid;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = AppConfig::from_env()?;

    let pool = create_pool(&config.database_url).await?;
    // Ensure migrations are applied.
    sqlx::migrate!("./migrations").run(&pool).await?;

    let admin_id = ensure_user(&pool, "Admin", "admin@example.com", "admin123", "admin").await?;
    let decorator_id = ensure_user(
        &pool,
        "Dhaka Decor Studio",
        "decorator@example.com",
        "decor123",
        "decorator",
    )
    .await?;
    ensure_user(&pool, "Customer", "user@example.com", "user123", "user").await?;
    seed_services(&pool).await?;

    println!("Seed completed. Admin ID: {admin_id}, Decorator ID: {decorator_id}");
    Ok(())
}

async fn ensure_user(
    pool: &sqlx::PgPool,
    name: &str,
    email: &str,
    password: &str,
    role: &str,
) -> anyhow::Result<Uuid> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();
    let password_hash = argon2
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| anyhow::anyhow!(e.to_string()))?
        .to_string();

    let row: (Uuid,) = sqlx::query_as(
        r#"
        INSERT INTO users (id, name, email, password_hash, role)
        VALUES ($1, $2, $3, $4, $5)
        ON CONFLICT (email) DO UPDATE SET role = EXCLUDED.role
        RETURNING id
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(name)
    .bind(email)
    .bind(password_hash)
    .bind(role)
    .fetch_one(pool)
    .await?;

    println!("Ensured user {email} (role={role})");
    Ok(row.0)
}

async fn seed_services(pool: &sqlx::PgPool) -> anyhow::Result<()> {
    let services = vec![
        ("Wedding Stage", "Full wedding stage with floral backdrop", "Wedding", 2500000),
        ("Birthday Party Setup", "Balloon arches and table decor", "Birthday", 800000),
        ("Corporate Event Decor", "Branding, lighting and seating", "Corporate", 1500000),
        ("Home Celebration", "Living-room decor for small gatherings", "Home", 400000),
    ];

    for (name, desc, category, price) in services {
        sqlx::query(
            r#"
            INSERT INTO services (id, name, description, category, price)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (name) DO NOTHING
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(name)
        .bind(desc)
        .bind(category)
        .bind(price)
        .execute(pool)
        .await?;
    }

    println!("Seeded services");
    Ok(())
}
