//! Fixtures shared by the database-backed flow tests.
#![allow(dead_code)]

use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
};

use async_trait::async_trait;
use bytes::Bytes;
use jewelry_storefront::{
    config::{AppConfig, Environment, PayPalConfig, StorageConfig},
    db::{DbPool, create_orm_conn, create_pool, run_migrations},
    entity::users::ActiveModel as UserActive,
    middleware::auth::AuthUser,
    payment::{CaptureDetails, OrderRequest, PaymentError, PaymentGateway, ProviderOrder},
    state::AppState,
    storage::{ImageStore, StorageError},
};
use rust_decimal::Decimal;
use sea_orm::ActiveModelTrait;
use sea_orm::ActiveValue::{NotSet, Set};
use secrecy::SecretString;
use tower_sessions::{MemoryStore, Session};
use uuid::Uuid;

/// In-process payment provider: captures whatever total the order was opened with.
#[derive(Default)]
pub struct FakeGateway {
    pub totals: Mutex<HashMap<String, Decimal>>,
    pub refunds: Mutex<Vec<String>>,
    /// Product sold out by a "concurrent" buyer while the capture is in flight.
    pub sell_out_on_capture: Mutex<Option<(DbPool, Uuid)>>,
}

#[async_trait]
impl PaymentGateway for FakeGateway {
    async fn create_order(&self, request: &OrderRequest) -> Result<ProviderOrder, PaymentError> {
        let id = format!("FAKE-{}", Uuid::new_v4().simple());
        self.totals
            .lock()
            .unwrap()
            .insert(id.clone(), request.totals.total);
        Ok(ProviderOrder {
            id: id.clone(),
            status: "CREATED".into(),
            payload: serde_json::json!({ "id": id }),
        })
    }

    async fn capture_order(&self, provider_order_id: &str) -> Result<CaptureDetails, PaymentError> {
        let amount = self
            .totals
            .lock()
            .unwrap()
            .get(provider_order_id)
            .copied()
            .ok_or_else(|| PaymentError::Parse(format!("unknown order {provider_order_id}")))?;

        let sell_out = self.sell_out_on_capture.lock().unwrap().take();
        if let Some((pool, product_id)) = sell_out {
            sqlx::query("UPDATE products SET quantity = 0 WHERE id = $1")
                .bind(product_id)
                .execute(&pool)
                .await
                .map_err(|e| PaymentError::Parse(e.to_string()))?;
        }

        Ok(CaptureDetails {
            provider_order_id: provider_order_id.to_string(),
            capture_id: format!("CAP-{provider_order_id}"),
            status: "COMPLETED".into(),
            amount,
            currency: "USD".into(),
            payer_email: Some("buyer@example.com".into()),
        })
    }

    async fn refund_capture(&self, capture_id: &str) -> Result<(), PaymentError> {
        self.refunds.lock().unwrap().push(capture_id.to_string());
        Ok(())
    }
}

#[derive(Default)]
pub struct FakeImages {
    pub fail_deletes: bool,
    pub deleted: Mutex<Vec<String>>,
}

#[async_trait]
impl ImageStore for FakeImages {
    async fn upload(&self, _content_type: &str, _data: Bytes) -> Result<String, StorageError> {
        Ok(format!("https://images.test/products/{}.jpg", Uuid::new_v4()))
    }

    async fn delete_many(&self, urls: &[String]) -> Result<usize, StorageError> {
        if self.fail_deletes {
            return Err(StorageError::ObjectStore(object_store::Error::NotImplemented));
        }
        self.deleted.lock().unwrap().extend(urls.iter().cloned());
        Ok(urls.len())
    }
}

pub fn database_url() -> Option<String> {
    std::env::var("TEST_DATABASE_URL")
        .or_else(|_| std::env::var("DATABASE_URL"))
        .ok()
}

pub fn test_config(database_url: &str, decrement_inventory_on_capture: bool) -> AppConfig {
    AppConfig {
        database_url: database_url.to_string(),
        host: "127.0.0.1".into(),
        port: 0,
        environment: Environment::Development,
        session_secret: SecretString::from("s".repeat(64)),
        frontend_origins: vec!["http://localhost:5173".into()],
        paypal: PayPalConfig {
            client_id: "test".into(),
            client_secret: SecretString::from("test".to_string()),
            api_base: "http://127.0.0.1:9".into(),
            currency: "USD".into(),
        },
        storage: StorageConfig {
            bucket: "test".into(),
            region: "us-east-1".into(),
            public_base_url: "https://images.test".into(),
        },
        decrement_inventory_on_capture,
    }
}

pub async fn setup_state(
    database_url: &str,
    decrement_inventory_on_capture: bool,
    payments: Arc<FakeGateway>,
    images: Arc<FakeImages>,
) -> anyhow::Result<AppState> {
    let pool = create_pool(database_url).await?;
    run_migrations(&pool).await?;
    let orm = create_orm_conn(&pool);
    Ok(AppState {
        pool,
        orm,
        config: Arc::new(test_config(database_url, decrement_inventory_on_capture)),
        payments,
        images,
    })
}

pub fn new_session() -> Session {
    Session::new(None, Arc::new(MemoryStore::default()), None)
}

pub async fn create_user(state: &AppState, is_admin: bool) -> anyhow::Result<AuthUser> {
    let suffix = Uuid::new_v4().simple().to_string();
    let username = format!("u{}", &suffix[..12]);
    let user = UserActive {
        id: Set(Uuid::new_v4()),
        username: Set(username.clone()),
        email: Set(format!("{username}@example.com")),
        password_hash: Set("not-a-real-hash".into()),
        is_admin: Set(is_admin),
        created_at: NotSet,
    }
    .insert(&state.orm)
    .await?;
    Ok(AuthUser {
        user_id: user.id,
        username,
        is_admin,
    })
}
