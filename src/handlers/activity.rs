use actix_web::{web, HttpResponse};
use serde::Deserialize;
use sqlx::PgPool;
use uuid::Uuid;
use validator::Validate;

use crate::errors::AppError;
use crate::ledger;
use crate::utils::validation::{parse_date_from, parse_date_to, parse_timestamp, validate_payload};

#[derive(Deserialize, Validate)]
pub struct StartActivityRequest {
    user_id: Uuid,

    #[validate(required(message = "Activity name is required"))]
    #[validate(length(min = 1, message = "Activity name cannot be empty"))]
    name: Option<String>,

    description: Option<String>,
}

#[derive(Deserialize, Validate)]
pub struct TimedActivityRequest {
    user_id: Uuid,

    #[validate(required(message = "Activity name is required"))]
    #[validate(length(min = 1, message = "Activity name cannot be empty"))]
    name: Option<String>,

    description: Option<String>,

    #[validate(required(message = "Start time is required"))]
    start_time: Option<String>,

    end_time: Option<String>,
}

#[derive(Deserialize)]
pub struct OwnerRequest {
    user_id: Uuid,
}

#[derive(Deserialize)]
pub struct ListActivitiesQuery {
    user_id: Uuid,
    date_from: Option<String>,
    date_to: Option<String>,
}

#[derive(Deserialize)]
pub struct CurrentActivityQuery {
    user_id: Uuid,
}

// POST /v1/activities
//
// Starting closes any activity the user still has running; the Ledger does
// both inside one transaction.
pub async fn start_activity(
    pool: web::Data<PgPool>,
    payload: web::Json<StartActivityRequest>,
) -> Result<HttpResponse, AppError> {
    validate_payload(&*payload)?;

    let activity = ledger::start_activity(
        &pool,
        payload.user_id,
        payload.name.as_deref().unwrap_or_default(),
        payload.description.as_deref(),
    )
    .await?;

    Ok(HttpResponse::Created().json(activity))
}

// PATCH /v1/activities/{activityId}/stop
pub async fn stop_activity(
    pool: web::Data<PgPool>,
    activity_id: web::Path<Uuid>,
    payload: web::Json<OwnerRequest>,
) -> Result<HttpResponse, AppError> {
    let activity = ledger::stop_activity(&pool, *activity_id, payload.user_id).await?;
    Ok(HttpResponse::Ok().json(activity))
}

// PATCH /v1/activities/{activityId}
pub async fn update_activity(
    pool: web::Data<PgPool>,
    activity_id: web::Path<Uuid>,
    payload: web::Json<TimedActivityRequest>,
) -> Result<HttpResponse, AppError> {
    validate_payload(&*payload)?;

    let start_time = parse_timestamp(payload.start_time.as_deref().unwrap_or_default())?;
    let end_time = payload
        .end_time
        .as_deref()
        .map(parse_timestamp)
        .transpose()?;

    let activity = ledger::edit_activity(
        &pool,
        *activity_id,
        payload.user_id,
        payload.name.as_deref().unwrap_or_default(),
        payload.description.as_deref(),
        start_time,
        end_time,
    )
    .await?;

    Ok(HttpResponse::Ok().json(activity))
}

// DELETE /v1/activities/{activityId}
pub async fn delete_activity(
    pool: web::Data<PgPool>,
    activity_id: web::Path<Uuid>,
    payload: web::Json<OwnerRequest>,
) -> Result<HttpResponse, AppError> {
    ledger::delete_activity(&pool, *activity_id, payload.user_id).await?;
    Ok(HttpResponse::Ok().json(serde_json::json!({ "success": true })))
}

// POST /v1/activities/manual
//
// Back-dated entry; unlike a start it never touches the running activity.
pub async fn create_manual_activity(
    pool: web::Data<PgPool>,
    payload: web::Json<TimedActivityRequest>,
) -> Result<HttpResponse, AppError> {
    validate_payload(&*payload)?;

    let start_time = parse_timestamp(payload.start_time.as_deref().unwrap_or_default())?;
    let end_time = payload
        .end_time
        .as_deref()
        .map(parse_timestamp)
        .transpose()?;

    let activity = ledger::create_manual_activity(
        &pool,
        payload.user_id,
        payload.name.as_deref().unwrap_or_default(),
        payload.description.as_deref(),
        start_time,
        end_time,
    )
    .await?;

    Ok(HttpResponse::Created().json(activity))
}

// GET /v1/activities
pub async fn get_activities(
    pool: web::Data<PgPool>,
    query: web::Query<ListActivitiesQuery>,
) -> Result<HttpResponse, AppError> {
    let date_from = query.date_from.as_deref().map(parse_date_from).transpose()?;
    let date_to = query.date_to.as_deref().map(parse_date_to).transpose()?;

    let activities = ledger::list_activities(&pool, query.user_id, date_from, date_to).await?;
    Ok(HttpResponse::Ok().json(activities))
}

// GET /v1/activities/current
pub async fn get_current_activity(
    pool: web::Data<PgPool>,
    query: web::Query<CurrentActivityQuery>,
) -> Result<HttpResponse, AppError> {
    match ledger::current_activity(&pool, query.user_id).await? {
        Some(activity) => Ok(HttpResponse::Ok().json(activity)),
        None => Ok(HttpResponse::Ok().json(serde_json::Value::Null)),
    }
}
