//! Postgres-backed session layer.

use secrecy::ExposeSecret;
use tower_sessions::{
    Expiry, SessionManagerLayer,
    cookie::{Key, SameSite, time::Duration},
};
use tower_sessions_sqlx_store::PostgresStore;

use crate::{config::AppConfig, db::DbPool};

pub const SESSION_COOKIE_NAME: &str = "storefront_session";

/// Sliding expiry, refreshed on every request.
const SESSION_EXPIRY_DAYS: i64 = 7;

/// Keys under which per-session state is stored.
pub mod keys {
    pub const CURRENT_USER: &str = "current_user";
    pub const CART: &str = "cart";
    pub const CHECKOUT: &str = "checkout";
}

/// Builds the session store and creates its table when missing.
pub async fn create_session_store(pool: &DbPool) -> anyhow::Result<PostgresStore> {
    let store = PostgresStore::new(pool.clone());
    store.migrate().await?;
    Ok(store)
}

pub fn create_session_layer(
    store: PostgresStore,
    config: &AppConfig,
) -> anyhow::Result<SessionManagerLayer<PostgresStore, tower_sessions::service::SignedCookie>> {
    let key = Key::try_from(config.session_secret.expose_secret().as_bytes())
        .map_err(|e| anyhow::anyhow!("invalid SESSION_SECRET: {e}"))?;

    Ok(SessionManagerLayer::new(store)
        .with_name(SESSION_COOKIE_NAME)
        .with_expiry(Expiry::OnInactivity(Duration::days(SESSION_EXPIRY_DAYS)))
        .with_secure(config.environment.is_production())
        .with_same_site(SameSite::Lax)
        .with_http_only(true)
        .with_path("/")
        .with_signed(key))
}
