use actix_web::{web, HttpRequest, HttpResponse};
use chrono::Utc;
use serde::Deserialize;
use sqlx::PgPool;
use uuid::Uuid;

use crate::directory::profile_by_email;
use crate::errors::AppError;
use crate::handlers::auth::claims_from;
use crate::ledger;
use crate::models::user::Role;
use crate::utils::csv::{export_filename, render_export};
use crate::utils::validation::{parse_date_from, parse_date_to};

#[derive(Deserialize)]
pub struct AdminActivitiesQuery {
    user_id: Option<String>,
    date_from: Option<String>,
    date_to: Option<String>,
}

async fn require_admin(req: &HttpRequest, pool: &PgPool) -> Result<(), AppError> {
    let claims = claims_from(req)?;
    let profile = profile_by_email(pool, &claims.sub)
        .await
        .map_err(|_| AppError::Unauthorized("Admin access required".to_string()))?;

    if profile.role != Role::Admin {
        return Err(AppError::Unauthorized("Admin access required".to_string()));
    }
    Ok(())
}

/// The UI sends `user_id=all` for the unfiltered view.
fn parse_user_filter(value: Option<&str>) -> Result<Option<Uuid>, AppError> {
    match value {
        None | Some("all") => Ok(None),
        Some(raw) => Uuid::parse_str(raw)
            .map(Some)
            .map_err(|_| AppError::BadRequest("Invalid user ID format".to_string())),
    }
}

// GET /v1/admin/user-stats
pub async fn get_user_stats(
    req: HttpRequest,
    pool: web::Data<PgPool>,
) -> Result<HttpResponse, AppError> {
    require_admin(&req, &pool).await?;

    let stats = ledger::all_user_stats(&pool).await?;
    Ok(HttpResponse::Ok().json(stats))
}

// GET /v1/admin/activities
pub async fn get_all_activities(
    req: HttpRequest,
    pool: web::Data<PgPool>,
    query: web::Query<AdminActivitiesQuery>,
) -> Result<HttpResponse, AppError> {
    require_admin(&req, &pool).await?;

    let user_filter = parse_user_filter(query.user_id.as_deref())?;
    let date_from = query.date_from.as_deref().map(parse_date_from).transpose()?;
    let date_to = query.date_to.as_deref().map(parse_date_to).transpose()?;

    let activities = ledger::list_all_activities(&pool, user_filter, date_from, date_to).await?;
    Ok(HttpResponse::Ok().json(activities))
}

// GET /v1/admin/export
pub async fn export_csv(
    req: HttpRequest,
    pool: web::Data<PgPool>,
    query: web::Query<AdminActivitiesQuery>,
) -> Result<HttpResponse, AppError> {
    require_admin(&req, &pool).await?;

    let user_filter = parse_user_filter(query.user_id.as_deref())?;
    let date_from = query.date_from.as_deref().map(parse_date_from).transpose()?;
    let date_to = query.date_to.as_deref().map(parse_date_to).transpose()?;

    let activities = ledger::export_activities(&pool, user_filter, date_from, date_to).await?;
    let csv = render_export(&activities);
    let filename = export_filename(Utc::now().date_naive());

    Ok(HttpResponse::Ok()
        .content_type("text/csv; charset=utf-8")
        .insert_header((
            "Content-Disposition",
            format!("attachment; filename=\"{}\"", filename),
        ))
        .body(csv))
}
