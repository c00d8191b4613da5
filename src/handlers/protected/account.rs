//! Self-scoped account endpoints. Every mutation follows the fixed pattern:
//! mutate the backing record, then re-mint the cookie when the staleness
//! policy calls for it, so store and cookie stay consistent without a page
//! reload.

use axum::http::HeaderMap;
use axum::response::IntoResponse;
use axum::{Extension, Json};
use serde::Deserialize;

use crate::database::models::User;
use crate::database::{users, DatabaseManager};
use crate::error::ApiError;
use crate::guard;
use crate::identity;
use crate::middleware::ApiResponse;
use crate::services::session::remint_cookie;
use crate::session::cookie::set_cookie_headers;
use crate::session::policy::SessionField;
use crate::session::SessionState;

const THEMES: &[&str] = &["light", "dark", "system"];

#[derive(Debug, Deserialize)]
pub struct ProfileUpdate {
    pub name: Option<String>,
    pub org_slug: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ThemeUpdate {
    pub theme: String,
}

#[derive(Debug, Deserialize)]
pub struct AvatarUpdate {
    pub avatar_key: String,
}

#[derive(Debug, Deserialize)]
pub struct WidgetsUpdate {
    pub widgets: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub struct EmailUpdate {
    pub email: String,
}

/// GET /api/account - current user record, freshly resolved.
pub async fn account_get(
    Extension(session): Extension<SessionState>,
) -> Result<impl IntoResponse, ApiError> {
    let pool = DatabaseManager::main_pool().await?;
    let user = guard::require_user(&pool, &session).await?;
    Ok(ApiResponse::success(user))
}

/// PATCH /api/account/profile
pub async fn profile_patch(
    Extension(session): Extension<SessionState>,
    Json(payload): Json<ProfileUpdate>,
) -> Result<impl IntoResponse, ApiError> {
    let pool = DatabaseManager::main_pool().await?;
    let user = guard::require_user(&pool, &session).await?;

    let updated = users::set_profile(
        &pool,
        user.id,
        payload.name.as_deref(),
        payload.org_slug.as_deref(),
    )
    .await?;
    respond_with_policy(updated, SessionField::Profile)
}

/// PUT /api/account/theme - deliberately exempt from the immediate-remint
/// rule; the cookie picks the theme up at next login.
pub async fn theme_put(
    Extension(session): Extension<SessionState>,
    Json(payload): Json<ThemeUpdate>,
) -> Result<impl IntoResponse, ApiError> {
    if !THEMES.contains(&payload.theme.as_str()) {
        return Err(ApiError::validation(
            format!("Theme must be one of: {}", THEMES.join(", ")),
            None,
        ));
    }

    let pool = DatabaseManager::main_pool().await?;
    let user = guard::require_user(&pool, &session).await?;

    let updated = users::set_theme(&pool, user.id, &payload.theme).await?;
    respond_with_policy(updated, SessionField::Theme)
}

/// PUT /api/account/avatar
pub async fn avatar_put(
    Extension(session): Extension<SessionState>,
    Json(payload): Json<AvatarUpdate>,
) -> Result<impl IntoResponse, ApiError> {
    if payload.avatar_key.trim().is_empty() {
        return Err(ApiError::validation("Avatar storage key is required", None));
    }

    let pool = DatabaseManager::main_pool().await?;
    let user = guard::require_user(&pool, &session).await?;

    let updated = users::set_avatar(&pool, user.id, &payload.avatar_key).await?;
    respond_with_policy(updated, SessionField::Avatar)
}

/// PUT /api/account/widgets - dashboard widget list shown at first paint.
pub async fn widgets_put(
    Extension(session): Extension<SessionState>,
    Json(payload): Json<WidgetsUpdate>,
) -> Result<impl IntoResponse, ApiError> {
    let pool = DatabaseManager::main_pool().await?;
    let user = guard::require_user(&pool, &session).await?;

    let updated = users::set_widgets(&pool, user.id, payload.widgets).await?;
    respond_with_policy(updated, SessionField::Widgets)
}

/// POST /api/account/email - change the address on both the provider
/// account and the local record. Duplicate addresses conflict.
pub async fn email_post(
    Extension(session): Extension<SessionState>,
    Json(payload): Json<EmailUpdate>,
) -> Result<impl IntoResponse, ApiError> {
    let pool = DatabaseManager::main_pool().await?;
    let user = guard::require_user(&pool, &session).await?;

    identity::provider()
        .change_email(&user.auth_ref, &payload.email)
        .await?;
    let updated = users::set_email(&pool, user.id, &payload.email).await?;
    respond_with_policy(updated, SessionField::Email)
}

/// POST /api/account/setup-complete - one-way onboarding transition.
pub async fn setup_complete_post(
    Extension(session): Extension<SessionState>,
) -> Result<impl IntoResponse, ApiError> {
    let pool = DatabaseManager::main_pool().await?;
    let user = guard::require_user(&pool, &session).await?;

    let updated = users::set_setup_complete(&pool, user.id).await?;
    respond_with_policy(updated, SessionField::SetupStatus)
}

/// Attach the re-minted cookie when the field's staleness rule is
/// immediate; otherwise respond without touching the cookie.
fn respond_with_policy(
    user: User,
    field: SessionField,
) -> Result<(HeaderMap, ApiResponse<User>), ApiError> {
    let headers = match remint_cookie(&user, field)? {
        Some(cookie) => set_cookie_headers(&cookie),
        None => HeaderMap::new(),
    };
    Ok((headers, ApiResponse::success(user)))
}
