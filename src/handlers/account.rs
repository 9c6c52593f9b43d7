use axum::{
    extract::State,
    http::HeaderMap,
    Form,
};
use garde::Validate;
use serde::{Deserialize, Serialize};
use tower_cookies::Cookies;

use crate::{
    crypto::password::verify_password,
    error::Result,
    models::activity::ActivityType,
    models::user::User,
    repositories::user as user_repo,
    services::auth as auth_service,
    state::AppState,
    validation::action::{validated, validated_with_user, ActionState, FormFields},
};

/// The success payload of account actions.
#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct AuthResponse {
    pub success: bool,
    pub message: String,
}

impl AuthResponse {
    fn ok(message: &str) -> ActionState<Self> {
        ActionState::Done(Self {
            success: true,
            message: message.to_string(),
        })
    }
}

/// Credentials submitted to sign in or sign up.
#[derive(Deserialize, Debug, Validate)]
pub struct CredentialsInput {
    #[garde(email, length(min = 3, max = 255))]
    pub email: String,
    #[garde(length(min = 8, max = 100))]
    pub password: String,
}

/// Fields submitted to change a password.
#[derive(Deserialize, Debug, Validate)]
pub struct UpdatePasswordInput {
    #[garde(length(min = 8, max = 100))]
    pub current_password: String,
    #[garde(length(min = 8, max = 100))]
    pub new_password: String,
    #[garde(length(min = 8, max = 100))]
    pub confirm_password: String,
}

/// Fields submitted to edit the account.
#[derive(Deserialize, Debug, Validate)]
pub struct UpdateAccountInput {
    #[garde(length(min = 1, max = 100))]
    pub name: String,
    #[garde(email)]
    pub email: String,
}

/// Password confirmation for deleting the account.
#[derive(Deserialize, Debug, Validate)]
pub struct DeleteAccountInput {
    #[garde(length(min = 8, max = 100))]
    pub password: String,
}

/// Nothing to validate beyond being signed in.
#[derive(Deserialize, Debug, Validate)]
pub struct SignOutInput {}

/// Best-effort client address from proxy headers.
pub fn client_ip(headers: &HeaderMap) -> Option<String> {
    headers
        .get("x-forwarded-for")
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.split(',').next())
        .or_else(|| {
            headers
                .get("x-real-ip")
                .and_then(|value| value.to_str().ok())
        })
        .map(|ip| ip.trim().to_string())
        .filter(|ip| !ip.is_empty())
}

/// Handles sign-in.
#[axum::debug_handler]
pub async fn sign_in(
    State(state): State<AppState>,
    cookies: Cookies,
    headers: HeaderMap,
    Form(fields): Form<FormFields>,
) -> Result<ActionState<AuthResponse>> {
    let ip = client_ip(&headers);
    validated::<CredentialsInput, _, _, _>(fields, |input, _| {
        sign_in_user(&state, &cookies, ip.as_deref(), input)
    })
    .await
}

async fn sign_in_user(
    state: &AppState,
    cookies: &Cookies,
    ip: Option<&str>,
    input: CredentialsInput,
) -> Result<ActionState<AuthResponse>> {
    let Some(user) =
        auth_service::authenticate_user(&state.db, &input.email, &input.password).await?
    else {
        return Ok(ActionState::failed(
            "Invalid email or password. Please try again.",
        ));
    };

    cookies.add(state.sessions.set(user.id)?);
    auth_service::record(&state.db, user.id, ActivityType::SignIn, ip).await;

    tracing::info!("✅ User signed in: {}", user.id);
    Ok(AuthResponse::ok("Signed in"))
}

/// Handles sign-up.
#[axum::debug_handler]
pub async fn sign_up(
    State(state): State<AppState>,
    cookies: Cookies,
    headers: HeaderMap,
    Form(fields): Form<FormFields>,
) -> Result<ActionState<AuthResponse>> {
    let ip = client_ip(&headers);
    validated::<CredentialsInput, _, _, _>(fields, |input, _| {
        sign_up_user(&state, &cookies, ip.as_deref(), input)
    })
    .await
}

async fn sign_up_user(
    state: &AppState,
    cookies: &Cookies,
    ip: Option<&str>,
    input: CredentialsInput,
) -> Result<ActionState<AuthResponse>> {
    let Some(user) = auth_service::register_user(&state.db, &input.email, &input.password).await?
    else {
        return Ok(ActionState::failed("Failed to create user. Please try again."));
    };

    auth_service::record(&state.db, user.id, ActivityType::SignUp, ip).await;
    cookies.add(state.sessions.set(user.id)?);

    tracing::info!("✅ User registered: {}", user.id);
    Ok(AuthResponse::ok("Account created"))
}

/// Handles sign-out.
#[axum::debug_handler]
pub async fn sign_out(
    State(state): State<AppState>,
    cookies: Cookies,
    headers: HeaderMap,
    Form(fields): Form<FormFields>,
) -> Result<ActionState<AuthResponse>> {
    let ip = client_ip(&headers);
    let resolver = auth_service::current_user(&state.db, &state.sessions, &cookies);
    validated_with_user::<SignOutInput, _, _, _, _, _>(fields, resolver, |_, _, user| {
        sign_out_user(&state, &cookies, ip.as_deref(), user)
    })
    .await
}

async fn sign_out_user(
    state: &AppState,
    cookies: &Cookies,
    ip: Option<&str>,
    user: User,
) -> Result<ActionState<AuthResponse>> {
    auth_service::record(&state.db, user.id, ActivityType::SignOut, ip).await;
    cookies.remove(state.sessions.clear());

    tracing::info!("👋 User signed out: {}", user.id);
    Ok(AuthResponse::ok("Signed out"))
}

/// Handles changing the signed-in user's password.
#[axum::debug_handler]
pub async fn update_password(
    State(state): State<AppState>,
    cookies: Cookies,
    headers: HeaderMap,
    Form(fields): Form<FormFields>,
) -> Result<ActionState<AuthResponse>> {
    let ip = client_ip(&headers);
    let resolver = auth_service::current_user(&state.db, &state.sessions, &cookies);
    validated_with_user::<UpdatePasswordInput, _, _, _, _, _>(fields, resolver, |input, _, user| {
        update_user_password(&state, ip.as_deref(), input, user)
    })
    .await
}

async fn update_user_password(
    state: &AppState,
    ip: Option<&str>,
    input: UpdatePasswordInput,
    user: User,
) -> Result<ActionState<AuthResponse>> {
    if let Some(refusal) = check_password_change(&input, &user) {
        return Ok(ActionState::failed(refusal));
    }

    auth_service::change_password(&state.db, &user, &input.new_password).await?;
    auth_service::record(&state.db, user.id, ActivityType::UpdatePassword, ip).await;

    Ok(AuthResponse::ok("Password updated successfully."))
}

/// Why a password change is refused, if it is.
fn check_password_change(input: &UpdatePasswordInput, user: &User) -> Option<&'static str> {
    if !verify_password(&input.current_password, &user.password_hash) {
        return Some("Current password is incorrect.");
    }

    if input.current_password == input.new_password {
        return Some("New password must be different from the current password.");
    }

    if input.new_password != input.confirm_password {
        return Some("New password and confirmation password do not match.");
    }

    None
}

/// Handles editing the signed-in user's name and email.
#[axum::debug_handler]
pub async fn update_account(
    State(state): State<AppState>,
    cookies: Cookies,
    headers: HeaderMap,
    Form(fields): Form<FormFields>,
) -> Result<ActionState<AuthResponse>> {
    let ip = client_ip(&headers);
    let resolver = auth_service::current_user(&state.db, &state.sessions, &cookies);
    validated_with_user::<UpdateAccountInput, _, _, _, _, _>(fields, resolver, |input, _, user| {
        update_user_account(&state, ip.as_deref(), input, user)
    })
    .await
}

async fn update_user_account(
    state: &AppState,
    ip: Option<&str>,
    input: UpdateAccountInput,
    user: User,
) -> Result<ActionState<AuthResponse>> {
    user_repo::update_account(&state.db, user.id, &input.name, &input.email).await?;
    auth_service::record(&state.db, user.id, ActivityType::UpdateAccount, ip).await;

    tracing::info!("✅ Account updated for user: {}", user.id);
    Ok(AuthResponse::ok("Account updated successfully."))
}

/// Handles soft deleting the signed-in user's account.
#[axum::debug_handler]
pub async fn delete_account(
    State(state): State<AppState>,
    cookies: Cookies,
    headers: HeaderMap,
    Form(fields): Form<FormFields>,
) -> Result<ActionState<AuthResponse>> {
    let ip = client_ip(&headers);
    let resolver = auth_service::current_user(&state.db, &state.sessions, &cookies);
    validated_with_user::<DeleteAccountInput, _, _, _, _, _>(fields, resolver, |input, _, user| {
        delete_user_account(&state, &cookies, ip.as_deref(), input, user)
    })
    .await
}

async fn delete_user_account(
    state: &AppState,
    cookies: &Cookies,
    ip: Option<&str>,
    input: DeleteAccountInput,
    user: User,
) -> Result<ActionState<AuthResponse>> {
    if !verify_password(&input.password, &user.password_hash) {
        return Ok(ActionState::failed("Incorrect password. Account deletion failed."));
    }

    auth_service::record(&state.db, user.id, ActivityType::DeleteAccount, ip).await;
    user_repo::soft_delete(&state.db, user.id).await?;
    cookies.remove(state.sessions.clear());

    tracing::info!("🗑️ Account deleted: {}", user.id);
    Ok(AuthResponse::ok("Account deleted."))
}
