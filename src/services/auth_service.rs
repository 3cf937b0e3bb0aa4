use argon2::{
    Argon2, PasswordHasher,
    password_hash::{PasswordHash, PasswordVerifier, SaltString},
};
use password_hash::rand_core::OsRng;
use sea_orm::{ActiveModelTrait, ColumnTrait, Condition, EntityTrait, QueryFilter, Set, SqlErr};
use sea_orm::ActiveValue::NotSet;
use tower_sessions::Session;
use uuid::Uuid;

use crate::{
    audit,
    checkout::is_valid_email,
    dto::auth::{LoginRequest, RegisterRequest},
    entity::users::{ActiveModel as UserActive, Column as UserCol, Entity as Users, Model as UserModel},
    error::{AppError, AppResult, FieldErrors},
    middleware::{auth::AuthUser, session::keys},
    models::User,
    response::{ApiResponse, Meta},
    state::AppState,
};

pub fn validate_registration(payload: &RegisterRequest) -> Result<(), FieldErrors> {
    let mut errors = FieldErrors::new();
    let username_len = payload.username.trim().chars().count();
    if !(3..=32).contains(&username_len) {
        errors.insert(
            "username".into(),
            "username must be between 3 and 32 characters".into(),
        );
    }
    if !is_valid_email(payload.email.trim()) {
        errors.insert("email".into(), "email is invalid".into());
    }
    if payload.password.chars().count() < 8 {
        errors.insert(
            "password".into(),
            "password must be at least 8 characters".into(),
        );
    }
    if errors.is_empty() { Ok(()) } else { Err(errors) }
}

fn hash_password(password: &str) -> AppResult<String> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| AppError::Internal(anyhow::anyhow!(e.to_string())))?
        .to_string();
    Ok(hash)
}

fn verify_password(password: &str, hash: &str) -> AppResult<bool> {
    let parsed_hash = PasswordHash::new(hash)
        .map_err(|_| AppError::Internal(anyhow::anyhow!("Invalid password hash")))?;
    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok())
}

/// Stores `user` as the session's current user under a fresh session id.
async fn sign_in(session: &Session, user: &UserModel) -> AppResult<AuthUser> {
    let current = AuthUser {
        user_id: user.id,
        username: user.username.clone(),
        is_admin: user.is_admin,
    };
    session.cycle_id().await?;
    session.insert(keys::CURRENT_USER, &current).await?;
    Ok(current)
}

pub async fn register_user(
    state: &AppState,
    session: &Session,
    payload: RegisterRequest,
) -> AppResult<ApiResponse<User>> {
    validate_registration(&payload).map_err(AppError::Validation)?;
    let username = payload.username.trim().to_string();
    let email = payload.email.trim().to_ascii_lowercase();

    let exist = Users::find()
        .filter(
            Condition::any()
                .add(UserCol::Username.eq(username.as_str()))
                .add(UserCol::Email.eq(email.as_str())),
        )
        .one(&state.orm)
        .await?;
    if exist.is_some() {
        return Err(AppError::BadRequest(
            "Username or email is already taken".to_string(),
        ));
    }

    let user = UserActive {
        id: Set(Uuid::new_v4()),
        username: Set(username),
        email: Set(email),
        password_hash: Set(hash_password(&payload.password)?),
        is_admin: Set(false),
        created_at: NotSet,
    }
    .insert(&state.orm)
    .await
    .map_err(|err| match err.sql_err() {
        // lost a race with a concurrent registration
        Some(SqlErr::UniqueConstraintViolation(_)) => {
            AppError::BadRequest("Username or email is already taken".to_string())
        }
        _ => AppError::from(err),
    })?;

    sign_in(session, &user).await?;

    audit::record(
        &state.pool,
        Some(user.id),
        "user_register",
        "users",
        serde_json::json!({ "user_id": user.id }),
    )
    .await;

    Ok(ApiResponse::success("User created", User::from(user), None))
}

pub async fn login_user(
    state: &AppState,
    session: &Session,
    payload: LoginRequest,
) -> AppResult<ApiResponse<User>> {
    let user = Users::find()
        .filter(UserCol::Username.eq(payload.username.trim()))
        .one(&state.orm)
        .await?
        .ok_or(AppError::Unauthorized)?;

    if !verify_password(&payload.password, &user.password_hash)? {
        tracing::info!(username = %user.username, "login rejected");
        return Err(AppError::Unauthorized);
    }

    sign_in(session, &user).await?;

    audit::record(
        &state.pool,
        Some(user.id),
        "user_login",
        "users",
        serde_json::json!({ "user_id": user.id }),
    )
    .await;

    Ok(ApiResponse::success(
        "Logged in",
        User::from(user),
        Some(Meta::empty()),
    ))
}

/// Drops the whole session, cart and checkout draft included.
pub async fn logout_user(session: &Session) -> AppResult<ApiResponse<serde_json::Value>> {
    session.flush().await?;
    Ok(ApiResponse::success(
        "Logged out",
        serde_json::json!({}),
        Some(Meta::empty()),
    ))
}

pub async fn current_profile(state: &AppState, user: &AuthUser) -> AppResult<ApiResponse<User>> {
    let user = Users::find_by_id(user.user_id)
        .one(&state.orm)
        .await?
        .ok_or(AppError::Unauthorized)?;
    Ok(ApiResponse::success("Current user", User::from(user), None))
}
