use serde::{Deserialize, Serialize};
use uuid::Uuid;
use chrono::Utc;

/// A named, timestamped span of work tracked for one user. An activity with
/// `end_time = None` is running; `duration` is whole seconds, set on stop.
#[derive(sqlx::FromRow, Serialize, Deserialize, Debug, Clone)]
pub struct Activity {
    pub id: Uuid,
    pub user_id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub start_time: chrono::DateTime<Utc>,
    pub end_time: Option<chrono::DateTime<Utc>>,
    pub duration: Option<i32>,
    pub created_at: chrono::DateTime<Utc>,
    pub updated_at: chrono::DateTime<Utc>,
}

/// Admin view row: activity joined with its owner's display name.
#[derive(sqlx::FromRow, Serialize, Debug)]
pub struct ActivityWithUser {
    pub id: Uuid,
    pub user_id: Uuid,
    pub user_name: String,
    pub name: String,
    pub description: Option<String>,
    pub start_time: chrono::DateTime<Utc>,
    pub end_time: Option<chrono::DateTime<Utc>>,
    pub duration: Option<i32>,
    pub created_at: chrono::DateTime<Utc>,
    pub updated_at: chrono::DateTime<Utc>,
}

#[derive(sqlx::FromRow, Serialize, Debug)]
pub struct UserStats {
    pub user_id: Uuid,
    pub user_name: String,
    pub total_activities: i64,
    pub total_duration: i64,
    pub avg_duration: i64,
    pub last_activity: Option<chrono::DateTime<Utc>>,
}
