use jewelry_storefront::{
    db::{create_pool, run_migrations},
    middleware::session::create_session_store,
};

/// Applies the schema migrations and creates the session table. Only needs
/// `DATABASE_URL`, so it can run before the rest of the configuration exists.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let database_url = std::env::var("DATABASE_URL")
        .map_err(|_| anyhow::anyhow!("DATABASE_URL is not set"))?;

    let pool = create_pool(&database_url).await?;
    run_migrations(&pool).await?;
    create_session_store(&pool).await?;
    println!("Migrations applied");
    Ok(())
}
