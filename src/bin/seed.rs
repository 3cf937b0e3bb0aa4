use argon2::{
    Argon2, PasswordHasher,
    password_hash::{SaltString, rand_core::OsRng},
};
use jewelry_storefront::{
    db::{create_pool, run_migrations},
    models::Category,
};
use rust_decimal::Decimal;
use sea_orm::ActiveEnum;
use uuid::Uuid;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let database_url = std::env::var("DATABASE_URL")
        .map_err(|_| anyhow::anyhow!("DATABASE_URL is not set"))?;
    let admin_password =
        std::env::var("SEED_ADMIN_PASSWORD").unwrap_or_else(|_| "change-me-admin".to_string());

    let pool = create_pool(&database_url).await?;
    run_migrations(&pool).await?;

    let admin_id = ensure_user(&pool, "admin", "admin@example.com", &admin_password, true).await?;
    let customer_id =
        ensure_user(&pool, "customer", "customer@example.com", "customer123", false).await?;
    seed_products(&pool).await?;

    println!("Seed completed. Admin ID: {admin_id}, Customer ID: {customer_id}");
    Ok(())
}

async fn ensure_user(
    pool: &sqlx::PgPool,
    username: &str,
    email: &str,
    password: &str,
    is_admin: bool,
) -> anyhow::Result<Uuid> {
    let salt = SaltString::generate(&mut OsRng);
    let password_hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| anyhow::anyhow!(e.to_string()))?
        .to_string();

    let (user_id,): (Uuid,) = sqlx::query_as(
        r#"
        INSERT INTO users (id, username, email, password_hash, is_admin)
        VALUES ($1, $2, $3, $4, $5)
        ON CONFLICT (username) DO UPDATE SET is_admin = EXCLUDED.is_admin
        RETURNING id
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(username)
    .bind(email)
    .bind(password_hash)
    .bind(is_admin)
    .fetch_one(pool)
    .await?;

    println!("Ensured user {username} (admin={is_admin})");
    Ok(user_id)
}

async fn seed_products(pool: &sqlx::PgPool) -> anyhow::Result<()> {
    let (existing,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM products")
        .fetch_one(pool)
        .await?;
    if existing > 0 {
        println!("Products already present, skipping");
        return Ok(());
    }

    let products = [
        ("Silver Band Ring", "Hammered sterling band", Decimal::new(4500, 2), 8, "sterling silver", Category::Rings),
        ("Moonstone Pendant", "Oval moonstone on a fine chain", Decimal::new(8900, 2), 3, "silver, moonstone", Category::Necklaces),
        ("Pearl Studs", "Freshwater pearl studs", Decimal::new(3200, 2), 12, "gold-filled, pearl", Category::Earrings),
        ("Twisted Cuff", "Open cuff in brushed brass", Decimal::new(5500, 2), 0, "brass", Category::Bracelets),
    ];

    for (title, description, price, quantity, materials, category) in products {
        sqlx::query(
            r#"
            INSERT INTO products (id, title, description, price, quantity, materials, category, images)
            VALUES ($1, $2, $3, $4, $5, $6, $7, '{}')
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(title)
        .bind(description)
        .bind(price)
        .bind(quantity)
        .bind(materials)
        .bind(category.to_value())
        .execute(pool)
        .await?;
    }

    println!("Seeded products");
    Ok(())
}
