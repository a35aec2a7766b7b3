use actix_web::{web, HttpMessage, HttpRequest, HttpResponse};
use serde::Deserialize;
use sqlx::PgPool;

use crate::directory;
use crate::errors::AppError;
use crate::utils::jwt::Claims;

#[derive(Deserialize)]
pub struct SigninRequest {
    name: Option<String>,
}

pub fn claims_from(req: &HttpRequest) -> Result<Claims, AppError> {
    req.extensions()
        .get::<Claims>()
        .cloned()
        .ok_or_else(|| AppError::Unauthorized("Missing credentials".to_string()))
}

// POST /v1/auth/signin
//
// Called once per sign-in event with the identity provider's token. The
// upsert is idempotent; repeated sign-ins refresh the display name.
pub async fn signin(
    req: HttpRequest,
    pool: web::Data<PgPool>,
    payload: web::Json<SigninRequest>,
) -> Result<HttpResponse, AppError> {
    let claims = claims_from(&req)?;

    let display_name = payload
        .name
        .clone()
        .unwrap_or_else(|| claims.sub.split('@').next().unwrap_or(&claims.sub).to_string());

    let profile = directory::upsert_profile(&pool, &claims.sub, &display_name).await?;
    Ok(HttpResponse::Ok().json(profile))
}

// GET /v1/auth/profile
pub async fn get_profile(
    req: HttpRequest,
    pool: web::Data<PgPool>,
) -> Result<HttpResponse, AppError> {
    let claims = claims_from(&req)?;
    let profile = directory::profile_by_email(&pool, &claims.sub).await?;
    Ok(HttpResponse::Ok().json(profile))
}
