mod common;

use common::{database_url, new_session, setup_state};
use jewelry_storefront::{
    dto::auth::{LoginRequest, RegisterRequest},
    error::AppError,
    middleware::{auth::current_user, session::keys},
    services::auth_service,
};
use std::sync::Arc;
use uuid::Uuid;

fn unique_name() -> String {
    let suffix = Uuid::new_v4().simple().to_string();
    format!("user{}", &suffix[..12])
}

#[tokio::test]
async fn register_signs_in_and_rejects_duplicates() -> anyhow::Result<()> {
    let Some(url) = database_url() else {
        eprintln!("Skipping test: set TEST_DATABASE_URL or DATABASE_URL to run auth flow tests.");
        return Ok(());
    };
    let state = setup_state(&url, false, Arc::default(), Arc::default()).await?;
    let username = unique_name();

    let session = new_session();
    let user = auth_service::register_user(
        &state,
        &session,
        RegisterRequest {
            username: format!("  {username} "),
            email: format!("{username}@Example.COM"),
            password: "correct horse".into(),
        },
    )
    .await?
    .data
    .expect("user");
    assert_eq!(user.username, username);
    assert_eq!(user.email, format!("{username}@example.com"));
    assert!(!user.is_admin);

    let current = current_user(&session).await?.expect("signed in");
    assert_eq!(current.user_id, user.id);
    assert!(!current.is_admin);

    let same_name = auth_service::register_user(
        &state,
        &new_session(),
        RegisterRequest {
            username: username.clone(),
            email: format!("other-{username}@example.com"),
            password: "correct horse".into(),
        },
    )
    .await;
    assert!(matches!(same_name, Err(AppError::BadRequest(_))));

    let same_email = auth_service::register_user(
        &state,
        &new_session(),
        RegisterRequest {
            username: unique_name(),
            email: format!("{username}@example.com"),
            password: "correct horse".into(),
        },
    )
    .await;
    assert!(matches!(same_email, Err(AppError::BadRequest(_))));

    let invalid = auth_service::register_user(
        &state,
        &new_session(),
        RegisterRequest {
            username: "x".into(),
            email: "nope".into(),
            password: "short".into(),
        },
    )
    .await;
    assert!(matches!(invalid, Err(AppError::Validation(_))));
    Ok(())
}

#[tokio::test]
async fn login_cycles_the_session_and_logout_clears_it() -> anyhow::Result<()> {
    let Some(url) = database_url() else {
        eprintln!("Skipping test: set TEST_DATABASE_URL or DATABASE_URL to run auth flow tests.");
        return Ok(());
    };
    let state = setup_state(&url, false, Arc::default(), Arc::default()).await?;
    let username = unique_name();
    auth_service::register_user(
        &state,
        &new_session(),
        RegisterRequest {
            username: username.clone(),
            email: format!("{username}@example.com"),
            password: "correct horse".into(),
        },
    )
    .await?;

    let session = new_session();
    session.insert(keys::CART, serde_json::json!([])).await?;
    session.save().await?;
    let anonymous_id = session.id();
    assert!(anonymous_id.is_some());

    let wrong_password = auth_service::login_user(
        &state,
        &session,
        LoginRequest {
            username: username.clone(),
            password: "battery staple".into(),
        },
    )
    .await;
    assert!(matches!(wrong_password, Err(AppError::Unauthorized)));
    let unknown = auth_service::login_user(
        &state,
        &session,
        LoginRequest {
            username: unique_name(),
            password: "correct horse".into(),
        },
    )
    .await;
    assert!(matches!(unknown, Err(AppError::Unauthorized)));
    assert!(current_user(&session).await?.is_none());

    let user = auth_service::login_user(
        &state,
        &session,
        LoginRequest {
            username: username.clone(),
            password: "correct horse".into(),
        },
    )
    .await?
    .data
    .expect("user");
    session.save().await?;
    assert!(session.id().is_some());
    assert_ne!(session.id(), anonymous_id);

    let current = current_user(&session).await?.expect("signed in");
    assert_eq!(current.user_id, user.id);
    let profile = auth_service::current_profile(&state, &current)
        .await?
        .data
        .expect("profile");
    assert_eq!(profile.username, username);

    auth_service::logout_user(&session).await?;
    assert!(current_user(&session).await?.is_none());
    Ok(())
}
