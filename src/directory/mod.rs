//! User directory: admin-managed users and the identity-provider profile
//! mapping. Lives next to the ledger so handlers never carry SQL.

use sqlx::PgPool;
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::user::{Role, User, UserProfile};

pub async fn list_users(pool: &PgPool) -> Result<Vec<User>, AppError> {
    let users = sqlx::query_as::<_, User>("SELECT * FROM users ORDER BY name")
        .fetch_all(pool)
        .await?;
    Ok(users)
}

/// Upsert on the unique display name so re-adding an existing user just
/// updates the role.
pub async fn create_user(pool: &PgPool, name: &str, role: Role) -> Result<User, AppError> {
    let user = sqlx::query_as::<_, User>(
        "INSERT INTO users (name, role)
         VALUES ($1, $2)
         ON CONFLICT (name) DO UPDATE SET role = EXCLUDED.role, updated_at = NOW()
         RETURNING *",
    )
    .bind(name)
    .bind(role)
    .fetch_one(pool)
    .await?;
    Ok(user)
}

pub async fn update_user(
    pool: &PgPool,
    user_id: Uuid,
    name: &str,
    role: Role,
) -> Result<User, AppError> {
    sqlx::query_as::<_, User>(
        "UPDATE users
         SET name = $1, role = $2, updated_at = NOW()
         WHERE id = $3
         RETURNING *",
    )
    .bind(name)
    .bind(role)
    .bind(user_id)
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| AppError::NotFound("User not found".to_string()))
}

/// Activities go with the user via the foreign-key cascade.
pub async fn delete_user(pool: &PgPool, user_id: Uuid) -> Result<(), AppError> {
    let result = sqlx::query("DELETE FROM users WHERE id = $1")
        .bind(user_id)
        .execute(pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound("User not found".to_string()));
    }
    Ok(())
}

/// Idempotent per-sign-in upsert. The display name tracks the identity
/// provider and is overwritten on every sign-in; the admin-granted role is
/// left alone.
pub async fn upsert_profile(
    pool: &PgPool,
    email: &str,
    name: &str,
) -> Result<UserProfile, AppError> {
    let profile = sqlx::query_as::<_, UserProfile>(
        "INSERT INTO user_profiles (email, name)
         VALUES ($1, $2)
         ON CONFLICT (email) DO UPDATE SET name = EXCLUDED.name, updated_at = NOW()
         RETURNING *",
    )
    .bind(email)
    .bind(name)
    .fetch_one(pool)
    .await?;
    Ok(profile)
}

pub async fn profile_by_email(pool: &PgPool, email: &str) -> Result<UserProfile, AppError> {
    sqlx::query_as::<_, UserProfile>("SELECT * FROM user_profiles WHERE email = $1")
        .bind(email)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| AppError::NotFound("User profile not found".to_string()))
}
