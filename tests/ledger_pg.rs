//! Postgres-backed Ledger tests. They need a reachable `DATABASE_URL` and a
//! database the suite may write to, so they are ignored by default:
//!
//! ```text
//! DATABASE_URL=postgres://localhost/timetrack_test cargo test -- --ignored
//! ```

use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use uuid::Uuid;

use timetrack_backend::errors::AppError;
use timetrack_backend::ledger;

async fn pool() -> PgPool {
    dotenv::dotenv().ok();
    let url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set for these tests");
    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&url)
        .await
        .expect("connect to test database");
    sqlx::migrate!().run(&pool).await.expect("run migrations");
    pool
}

/// Creates a user with a unique name; each test gets its own and removes it
/// (cascading away its activities) when done.
async fn create_test_user(pool: &PgPool) -> Uuid {
    sqlx::query_scalar::<_, Uuid>(
        "INSERT INTO users (name) VALUES ($1) RETURNING id",
    )
    .bind(format!("test-user-{}", Uuid::new_v4()))
    .fetch_one(pool)
    .await
    .expect("insert test user")
}

async fn remove_test_user(pool: &PgPool, user_id: Uuid) {
    sqlx::query("DELETE FROM users WHERE id = $1")
        .bind(user_id)
        .execute(pool)
        .await
        .expect("delete test user");
}

async fn running_count(pool: &PgPool, user_id: Uuid) -> i64 {
    sqlx::query_scalar::<_, i64>(
        "SELECT COUNT(*) FROM activities WHERE user_id = $1 AND end_time IS NULL",
    )
    .bind(user_id)
    .fetch_one(pool)
    .await
    .expect("count running")
}

#[tokio::test]
#[ignore = "requires Postgres at DATABASE_URL"]
async fn start_closes_the_previous_running_activity() {
    let pool = pool().await;
    let user_id = create_test_user(&pool).await;

    let design = ledger::start_activity(&pool, user_id, "Design", None)
        .await
        .unwrap();
    assert!(design.end_time.is_none());

    let coding = ledger::start_activity(&pool, user_id, "Coding", None)
        .await
        .unwrap();
    assert!(coding.end_time.is_none());

    let closed = ledger::list_activities(&pool, user_id, None, None)
        .await
        .unwrap()
        .into_iter()
        .find(|a| a.id == design.id)
        .unwrap();
    let end = closed.end_time.expect("Design should be closed");
    let duration = closed.duration.expect("closed activity has a duration");
    assert_eq!(duration as i64, (end - closed.start_time).num_seconds());
    assert!(duration >= 0);

    assert_eq!(running_count(&pool, user_id).await, 1);
    remove_test_user(&pool, user_id).await;
}

#[tokio::test]
#[ignore = "requires Postgres at DATABASE_URL"]
async fn concurrent_starts_leave_exactly_one_running() {
    let pool = pool().await;
    let user_id = create_test_user(&pool).await;

    let (a, b) = tokio::join!(
        ledger::start_activity(&pool, user_id, "One", None),
        ledger::start_activity(&pool, user_id, "Two", None),
    );
    a.unwrap();
    b.unwrap();

    assert_eq!(running_count(&pool, user_id).await, 1);
    remove_test_user(&pool, user_id).await;
}

#[tokio::test]
#[ignore = "requires Postgres at DATABASE_URL"]
async fn stop_sets_duration_from_timestamps() {
    let pool = pool().await;
    let user_id = create_test_user(&pool).await;

    let started = ledger::start_activity(&pool, user_id, "Design", Some("wireframes"))
        .await
        .unwrap();
    let stopped = ledger::stop_activity(&pool, started.id, user_id)
        .await
        .unwrap();

    let end = stopped.end_time.unwrap();
    assert_eq!(
        stopped.duration.unwrap() as i64,
        (end - stopped.start_time).num_seconds()
    );
    assert!(stopped.duration.unwrap() >= 0);

    // Stopping it again is NotFound: the operation only matches running rows.
    let again = ledger::stop_activity(&pool, started.id, user_id).await;
    assert!(matches!(again, Err(AppError::NotFound(_))));

    remove_test_user(&pool, user_id).await;
}

#[tokio::test]
#[ignore = "requires Postgres at DATABASE_URL"]
async fn mismatched_owner_is_not_found_and_leaves_the_row_alone() {
    let pool = pool().await;
    let owner = create_test_user(&pool).await;
    let stranger = create_test_user(&pool).await;

    let activity = ledger::start_activity(&pool, owner, "Design", None)
        .await
        .unwrap();

    let stop = ledger::stop_activity(&pool, activity.id, stranger).await;
    assert!(matches!(stop, Err(AppError::NotFound(_))));

    let delete = ledger::delete_activity(&pool, activity.id, stranger).await;
    assert!(matches!(delete, Err(AppError::NotFound(_))));

    let still_running = ledger::current_activity(&pool, owner).await.unwrap();
    assert_eq!(still_running.unwrap().id, activity.id);

    remove_test_user(&pool, owner).await;
    remove_test_user(&pool, stranger).await;
}

#[tokio::test]
#[ignore = "requires Postgres at DATABASE_URL"]
async fn manual_entry_does_not_touch_the_running_activity() {
    let pool = pool().await;
    let user_id = create_test_user(&pool).await;

    let running = ledger::start_activity(&pool, user_id, "Coding", None)
        .await
        .unwrap();

    let start = chrono::Utc::now() - chrono::Duration::hours(2);
    let end = start + chrono::Duration::minutes(30);
    let manual = ledger::create_manual_activity(
        &pool,
        user_id,
        "Meeting",
        Some("standup"),
        start,
        Some(end),
    )
    .await
    .unwrap();

    assert_eq!(manual.duration, Some(1800));
    assert!(manual.end_time.is_some());

    let current = ledger::current_activity(&pool, user_id).await.unwrap();
    assert_eq!(current.unwrap().id, running.id);

    remove_test_user(&pool, user_id).await;
}

#[tokio::test]
#[ignore = "requires Postgres at DATABASE_URL"]
async fn edit_recomputes_duration_and_rejects_inverted_ranges() {
    let pool = pool().await;
    let user_id = create_test_user(&pool).await;

    let activity = ledger::start_activity(&pool, user_id, "Design", None)
        .await
        .unwrap();

    let start = chrono::Utc::now() - chrono::Duration::hours(1);
    let end = start + chrono::Duration::minutes(45);
    let edited = ledger::edit_activity(
        &pool,
        activity.id,
        user_id,
        "Design review",
        None,
        start,
        Some(end),
    )
    .await
    .unwrap();

    assert_eq!(edited.name, "Design review");
    assert_eq!(edited.duration, Some(2700));

    let inverted = ledger::edit_activity(
        &pool,
        activity.id,
        user_id,
        "Design review",
        None,
        end,
        Some(start),
    )
    .await;
    assert!(matches!(inverted, Err(AppError::BadRequest(_))));

    remove_test_user(&pool, user_id).await;
}

#[tokio::test]
#[ignore = "requires Postgres at DATABASE_URL"]
async fn deleting_a_user_cascades_to_their_activities_only() {
    let pool = pool().await;
    let doomed = create_test_user(&pool).await;
    let survivor = create_test_user(&pool).await;

    ledger::start_activity(&pool, doomed, "Gone", None).await.unwrap();
    let kept = ledger::start_activity(&pool, survivor, "Kept", None)
        .await
        .unwrap();

    remove_test_user(&pool, doomed).await;

    let orphans = sqlx::query_scalar::<_, i64>(
        "SELECT COUNT(*) FROM activities WHERE user_id = $1",
    )
    .bind(doomed)
    .fetch_one(&pool)
    .await
    .unwrap();
    assert_eq!(orphans, 0);

    let remaining = ledger::list_activities(&pool, survivor, None, None)
        .await
        .unwrap();
    assert!(remaining.iter().any(|a| a.id == kept.id));

    remove_test_user(&pool, survivor).await;
}

#[tokio::test]
#[ignore = "requires Postgres at DATABASE_URL"]
async fn stats_for_a_user_with_no_activities_are_all_zero() {
    let pool = pool().await;
    let user_id = create_test_user(&pool).await;

    let stats = ledger::user_stats(&pool, user_id).await.unwrap();
    assert_eq!(stats.total_activities, 0);
    assert_eq!(stats.total_duration, 0);
    assert_eq!(stats.avg_duration, 0);
    assert!(stats.last_activity.is_none());

    remove_test_user(&pool, user_id).await;
}

#[tokio::test]
#[ignore = "requires Postgres at DATABASE_URL"]
async fn stats_aggregate_durations_in_whole_seconds() {
    let pool = pool().await;
    let user_id = create_test_user(&pool).await;

    let start = chrono::Utc::now() - chrono::Duration::hours(3);
    for minutes in [10i64, 20, 40] {
        ledger::create_manual_activity(
            &pool,
            user_id,
            "Block",
            None,
            start,
            Some(start + chrono::Duration::minutes(minutes)),
        )
        .await
        .unwrap();
    }

    let stats = ledger::user_stats(&pool, user_id).await.unwrap();
    assert_eq!(stats.total_activities, 3);
    assert_eq!(stats.total_duration, 600 + 1200 + 2400);
    assert_eq!(stats.avg_duration, 1400);
    assert!(stats.last_activity.is_some());

    remove_test_user(&pool, user_id).await;
}

#[tokio::test]
#[ignore = "requires Postgres at DATABASE_URL"]
async fn starting_for_an_unknown_user_is_not_found() {
    let pool = pool().await;
    let result = ledger::start_activity(&pool, Uuid::new_v4(), "Ghost", None).await;
    assert!(matches!(result, Err(AppError::NotFound(_))));
}
