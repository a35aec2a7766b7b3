use actix_web::{web, HttpResponse};
use serde::Deserialize;
use sqlx::PgPool;
use uuid::Uuid;
use validator::Validate;

use crate::directory;
use crate::errors::AppError;
use crate::ledger;
use crate::models::user::Role;
use crate::utils::validation::validate_payload;

#[derive(Deserialize, Validate)]
pub struct UserRequest {
    #[validate(required(message = "User name is required"))]
    #[validate(length(min = 1, message = "User name cannot be empty"))]
    name: Option<String>,

    role: Option<Role>,
}

// GET /v1/users
pub async fn list_users(pool: web::Data<PgPool>) -> Result<HttpResponse, AppError> {
    let users = directory::list_users(&pool).await?;
    Ok(HttpResponse::Ok().json(users))
}

// POST /v1/users
pub async fn create_user(
    pool: web::Data<PgPool>,
    payload: web::Json<UserRequest>,
) -> Result<HttpResponse, AppError> {
    validate_payload(&*payload)?;

    let user = directory::create_user(
        &pool,
        payload.name.as_deref().unwrap_or_default(),
        payload.role.unwrap_or(Role::User),
    )
    .await?;

    Ok(HttpResponse::Created().json(user))
}

// PATCH /v1/users/{userId}
pub async fn update_user(
    pool: web::Data<PgPool>,
    user_id: web::Path<Uuid>,
    payload: web::Json<UserRequest>,
) -> Result<HttpResponse, AppError> {
    validate_payload(&*payload)?;

    let user = directory::update_user(
        &pool,
        *user_id,
        payload.name.as_deref().unwrap_or_default(),
        payload.role.unwrap_or(Role::User),
    )
    .await?;

    Ok(HttpResponse::Ok().json(user))
}

// GET /v1/users/{userId}/stats
pub async fn get_user_stats(
    pool: web::Data<PgPool>,
    user_id: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
    let stats = ledger::user_stats(&pool, *user_id).await?;
    Ok(HttpResponse::Ok().json(stats))
}

// DELETE /v1/users/{userId}
pub async fn delete_user(
    pool: web::Data<PgPool>,
    user_id: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
    directory::delete_user(&pool, *user_id).await?;
    Ok(HttpResponse::Ok().json(serde_json::json!({ "success": true })))
}
