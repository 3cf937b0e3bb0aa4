use std::{env, sync::OnceLock};

use anyhow::Context;
use secrecy::SecretString;

const SANDBOX_PAYPAL_API: &str = "https://api-m.sandbox.paypal.com";

static EXPOSE_ERROR_DETAILS: OnceLock<bool> = OnceLock::new();

/// Whether error responses may carry internal detail (provider, storage and
/// database messages). Off unless explicitly enabled for a non-production run.
pub fn expose_error_details() -> bool {
    EXPOSE_ERROR_DETAILS.get().copied().unwrap_or(false)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Environment {
    Development,
    Production,
}

impl Environment {
    fn parse(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "production" | "prod" => Environment::Production,
            _ => Environment::Development,
        }
    }

    pub fn is_production(self) -> bool {
        self == Environment::Production
    }
}

#[derive(Debug, Clone)]
pub struct PayPalConfig {
    pub client_id: String,
    pub client_secret: SecretString,
    pub api_base: String,
    pub currency: String,
}

#[derive(Debug, Clone)]
pub struct StorageConfig {
    pub bucket: String,
    pub region: String,
    pub public_base_url: String,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub host: String,
    pub port: u16,
    pub environment: Environment,
    pub session_secret: SecretString,
    pub frontend_origins: Vec<String>,
    pub paypal: PayPalConfig,
    pub storage: StorageConfig,
    pub decrement_inventory_on_capture: bool,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = env::var("DATABASE_URL").context("DATABASE_URL is not set")?;
        let host = env::var("APP_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port = env::var("APP_PORT")
            .ok()
            .and_then(|p| p.parse::<u16>().ok())
            .unwrap_or(3000);
        let environment = Environment::parse(&env::var("APP_ENV").unwrap_or_default());

        let session_secret = env::var("SESSION_SECRET").context("SESSION_SECRET is not set")?;
        if session_secret.len() < 64 {
            anyhow::bail!("SESSION_SECRET must be at least 64 bytes");
        }

        let frontend_origins = parse_origins(
            &env::var("FRONTEND_ORIGINS").unwrap_or_else(|_| "http://localhost:5173".to_string()),
        );

        let paypal = PayPalConfig {
            client_id: env::var("PAYPAL_CLIENT_ID").context("PAYPAL_CLIENT_ID is not set")?,
            client_secret: SecretString::from(
                env::var("PAYPAL_CLIENT_SECRET").context("PAYPAL_CLIENT_SECRET is not set")?,
            ),
            api_base: env::var("PAYPAL_API_BASE")
                .unwrap_or_else(|_| SANDBOX_PAYPAL_API.to_string())
                .trim_end_matches('/')
                .to_string(),
            currency: env::var("PAYPAL_CURRENCY").unwrap_or_else(|_| "USD".to_string()),
        };

        let bucket = env::var("S3_BUCKET").context("S3_BUCKET is not set")?;
        let region = env::var("AWS_REGION").unwrap_or_else(|_| "us-east-1".to_string());
        let public_base_url = env::var("IMAGE_PUBLIC_BASE_URL")
            .unwrap_or_else(|_| format!("https://{bucket}.s3.{region}.amazonaws.com"))
            .trim_end_matches('/')
            .to_string();

        let decrement_inventory_on_capture = env::var("INVENTORY_DECREMENT_ON_CAPTURE")
            .map(|v| parse_flag(&v))
            .unwrap_or(false);

        let config = Self {
            database_url,
            host,
            port,
            environment,
            session_secret: SecretString::from(session_secret),
            frontend_origins,
            paypal,
            storage: StorageConfig {
                bucket,
                region,
                public_base_url,
            },
            decrement_inventory_on_capture,
        };
        let _ = EXPOSE_ERROR_DETAILS.set(!config.environment.is_production());
        Ok(config)
    }
}

pub fn parse_origins(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|origin| origin.trim().trim_end_matches('/'))
        .filter(|origin| !origin.is_empty())
        .map(str::to_string)
        .collect()
}

fn parse_flag(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}
