//! Activity Ledger: owns every activity state transition and the derived
//! duration/aggregate queries. Ownership checks live in the SQL here, not in
//! the request handlers.

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::activity::{Activity, ActivityWithUser, UserStats};

/// Page caps matching the web UI: personal history and the admin table.
const USER_PAGE_LIMIT: i64 = 100;
const ADMIN_PAGE_LIMIT: i64 = 200;

/// Whole seconds between two timestamps. Rejects inverted ranges so a stored
/// `duration` is never negative.
pub fn computed_duration(
    start: DateTime<Utc>,
    end: DateTime<Utc>,
) -> Result<i32, AppError> {
    let seconds = (end - start).num_seconds();
    if seconds < 0 {
        return Err(AppError::BadRequest(
            "End time must not precede start time".to_string(),
        ));
    }
    i32::try_from(seconds)
        .map_err(|_| AppError::BadRequest("Activity span is too long".to_string()))
}

async fn ensure_user_exists(pool: &PgPool, user_id: Uuid) -> Result<(), AppError> {
    sqlx::query_scalar::<_, Uuid>("SELECT id FROM users WHERE id = $1")
        .bind(user_id)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;
    Ok(())
}

/// Starts a new running activity. Any activity already running for the user
/// is closed first, inside the same transaction, so two concurrent starts
/// can never leave two open rows: the user-row lock serializes them and
/// doubles as the existence check.
pub async fn start_activity(
    pool: &PgPool,
    user_id: Uuid,
    name: &str,
    description: Option<&str>,
) -> Result<Activity, AppError> {
    let mut tx = pool.begin().await?;

    sqlx::query_scalar::<_, Uuid>("SELECT id FROM users WHERE id = $1 FOR UPDATE")
        .bind(user_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

    sqlx::query(
        "UPDATE activities
         SET end_time = NOW(),
             duration = EXTRACT(EPOCH FROM (NOW() - start_time))::INTEGER,
             updated_at = NOW()
         WHERE user_id = $1 AND end_time IS NULL",
    )
    .bind(user_id)
    .execute(&mut *tx)
    .await?;

    let activity = sqlx::query_as::<_, Activity>(
        "INSERT INTO activities (name, description, start_time, user_id)
         VALUES ($1, $2, NOW(), $3)
         RETURNING *",
    )
    .bind(name)
    .bind(description)
    .bind(user_id)
    .fetch_one(&mut *tx)
    .await?;

    tx.commit().await?;
    Ok(activity)
}

/// Stops a running activity owned by `user_id`. A stopped or foreign
/// activity yields NotFound and leaves the row untouched.
pub async fn stop_activity(
    pool: &PgPool,
    activity_id: Uuid,
    user_id: Uuid,
) -> Result<Activity, AppError> {
    sqlx::query_as::<_, Activity>(
        "UPDATE activities
         SET end_time = NOW(),
             duration = EXTRACT(EPOCH FROM (NOW() - start_time))::INTEGER,
             updated_at = NOW()
         WHERE id = $1 AND user_id = $2 AND end_time IS NULL
         RETURNING *",
    )
    .bind(activity_id)
    .bind(user_id)
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| AppError::NotFound("Activity not found or not owned by user".to_string()))
}

/// Overwrites an activity from explicit timestamps. `end_time` defaults to
/// now; duration is always recomputed server-side, never taken from the
/// client.
pub async fn edit_activity(
    pool: &PgPool,
    activity_id: Uuid,
    user_id: Uuid,
    name: &str,
    description: Option<&str>,
    start_time: DateTime<Utc>,
    end_time: Option<DateTime<Utc>>,
) -> Result<Activity, AppError> {
    let end_time = end_time.unwrap_or_else(Utc::now);
    let duration = computed_duration(start_time, end_time)?;

    sqlx::query_as::<_, Activity>(
        "UPDATE activities
         SET name = $1,
             description = $2,
             start_time = $3,
             end_time = $4,
             duration = $5,
             updated_at = NOW()
         WHERE id = $6 AND user_id = $7
         RETURNING *",
    )
    .bind(name)
    .bind(description)
    .bind(start_time)
    .bind(end_time)
    .bind(duration)
    .bind(activity_id)
    .bind(user_id)
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| AppError::NotFound("Activity not found or not owned by user".to_string()))
}

pub async fn delete_activity(
    pool: &PgPool,
    activity_id: Uuid,
    user_id: Uuid,
) -> Result<(), AppError> {
    let result = sqlx::query("DELETE FROM activities WHERE id = $1 AND user_id = $2")
        .bind(activity_id)
        .bind(user_id)
        .execute(pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound(
            "Activity not found or not owned by user".to_string(),
        ));
    }
    Ok(())
}

/// Inserts a closed, back-dated entry. Unlike [`start_activity`] this never
/// touches the user's running activity.
pub async fn create_manual_activity(
    pool: &PgPool,
    user_id: Uuid,
    name: &str,
    description: Option<&str>,
    start_time: DateTime<Utc>,
    end_time: Option<DateTime<Utc>>,
) -> Result<Activity, AppError> {
    ensure_user_exists(pool, user_id).await?;

    let end_time = end_time.unwrap_or_else(Utc::now);
    let duration = computed_duration(start_time, end_time)?;

    let activity = sqlx::query_as::<_, Activity>(
        "INSERT INTO activities (name, description, start_time, end_time, duration, user_id)
         VALUES ($1, $2, $3, $4, $5, $6)
         RETURNING *",
    )
    .bind(name)
    .bind(description)
    .bind(start_time)
    .bind(end_time)
    .bind(duration)
    .bind(user_id)
    .fetch_one(pool)
    .await?;

    Ok(activity)
}

/// The user's running activity, if any.
pub async fn current_activity(
    pool: &PgPool,
    user_id: Uuid,
) -> Result<Option<Activity>, AppError> {
    ensure_user_exists(pool, user_id).await?;

    let activity = sqlx::query_as::<_, Activity>(
        "SELECT * FROM activities
         WHERE user_id = $1 AND end_time IS NULL
         ORDER BY start_time DESC
         LIMIT 1",
    )
    .bind(user_id)
    .fetch_optional(pool)
    .await?;

    Ok(activity)
}

/// Lists a user's activities. Unranged queries return the newest-created
/// first; ranged (week/calendar) queries filter and order by `start_time`.
pub async fn list_activities(
    pool: &PgPool,
    user_id: Uuid,
    date_from: Option<DateTime<Utc>>,
    date_to: Option<DateTime<Utc>>,
) -> Result<Vec<Activity>, AppError> {
    ensure_user_exists(pool, user_id).await?;

    let activities = if date_from.is_some() || date_to.is_some() {
        sqlx::query_as::<_, Activity>(
            "SELECT * FROM activities
             WHERE user_id = $1
               AND ($2::timestamptz IS NULL OR start_time >= $2)
               AND ($3::timestamptz IS NULL OR start_time <= $3)
             ORDER BY start_time DESC
             LIMIT $4",
        )
        .bind(user_id)
        .bind(date_from)
        .bind(date_to)
        .bind(USER_PAGE_LIMIT)
        .fetch_all(pool)
        .await?
    } else {
        sqlx::query_as::<_, Activity>(
            "SELECT * FROM activities
             WHERE user_id = $1
             ORDER BY created_at DESC
             LIMIT $2",
        )
        .bind(user_id)
        .bind(USER_PAGE_LIMIT)
        .fetch_all(pool)
        .await?
    };

    Ok(activities)
}

/// Cross-user listing for the admin table, joined with owner names.
pub async fn list_all_activities(
    pool: &PgPool,
    user_filter: Option<Uuid>,
    date_from: Option<DateTime<Utc>>,
    date_to: Option<DateTime<Utc>>,
) -> Result<Vec<ActivityWithUser>, AppError> {
    fetch_joined(pool, user_filter, date_from, date_to, Some(ADMIN_PAGE_LIMIT)).await
}

/// Export variant of [`list_all_activities`]: the full filtered set, no cap.
pub async fn export_activities(
    pool: &PgPool,
    user_filter: Option<Uuid>,
    date_from: Option<DateTime<Utc>>,
    date_to: Option<DateTime<Utc>>,
) -> Result<Vec<ActivityWithUser>, AppError> {
    fetch_joined(pool, user_filter, date_from, date_to, None).await
}

async fn fetch_joined(
    pool: &PgPool,
    user_filter: Option<Uuid>,
    date_from: Option<DateTime<Utc>>,
    date_to: Option<DateTime<Utc>>,
    limit: Option<i64>,
) -> Result<Vec<ActivityWithUser>, AppError> {
    let activities = sqlx::query_as::<_, ActivityWithUser>(
        "SELECT a.id, a.user_id, u.name AS user_name, a.name, a.description,
                a.start_time, a.end_time, a.duration, a.created_at, a.updated_at
         FROM activities a
         JOIN users u ON a.user_id = u.id
         WHERE ($1::uuid IS NULL OR a.user_id = $1)
           AND ($2::timestamptz IS NULL OR a.start_time >= $2)
           AND ($3::timestamptz IS NULL OR a.start_time <= $3)
         ORDER BY a.created_at DESC
         LIMIT $4",
    )
    .bind(user_filter)
    .bind(date_from)
    .bind(date_to)
    .bind(limit)
    .fetch_all(pool)
    .await?;

    Ok(activities)
}

/// Aggregates for one user. A user with no activities gets zero totals and
/// no `last_activity`.
pub async fn user_stats(pool: &PgPool, user_id: Uuid) -> Result<UserStats, AppError> {
    sqlx::query_as::<_, UserStats>(
        "SELECT u.id AS user_id, u.name AS user_name,
                COUNT(a.id) AS total_activities,
                COALESCE(SUM(a.duration), 0)::BIGINT AS total_duration,
                COALESCE(ROUND(AVG(a.duration)), 0)::BIGINT AS avg_duration,
                MAX(a.start_time) AS last_activity
         FROM users u
         LEFT JOIN activities a ON u.id = a.user_id
         WHERE u.id = $1
         GROUP BY u.id, u.name",
    )
    .bind(user_id)
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| AppError::NotFound("User not found".to_string()))
}

/// The same aggregate for every user, for the admin statistics table.
pub async fn all_user_stats(pool: &PgPool) -> Result<Vec<UserStats>, AppError> {
    let stats = sqlx::query_as::<_, UserStats>(
        "SELECT u.id AS user_id, u.name AS user_name,
                COUNT(a.id) AS total_activities,
                COALESCE(SUM(a.duration), 0)::BIGINT AS total_duration,
                COALESCE(ROUND(AVG(a.duration)), 0)::BIGINT AS avg_duration,
                MAX(a.start_time) AS last_activity
         FROM users u
         LEFT JOIN activities a ON u.id = a.user_id
         GROUP BY u.id, u.name
         ORDER BY u.name",
    )
    .fetch_all(pool)
    .await?;

    Ok(stats)
}
