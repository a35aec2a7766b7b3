use actix_web::{web, App, HttpServer};
use actix_web::middleware::Logger;
use actix_web_httpauth::middleware::HttpAuthentication;
use actix_web_prom::PrometheusMetricsBuilder;
use dotenv::dotenv;
use env_logger::Env;
use log::info;
use std::collections::HashMap;
use std::env;

use timetrack_backend::{db, handlers, utils};

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    dotenv().ok();
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();

    // Validate JWT secret
    let jwt_secret = env::var("JWT_SECRET").expect("JWT_SECRET must be set");
    if jwt_secret.is_empty() {
        panic!("JWT_SECRET cannot be empty");
    }

    // Initialize the database pool and run migrations
    let database_url = env::var("DATABASE_URL").expect("DATABASE_URL must be set");
    let pool = db::connect(&database_url).await;

    let bind_address = env::var("BIND_ADDRESS").unwrap_or_else(|_| "127.0.0.1:8080".to_string());
    info!("Starting server at {}", bind_address);

    // Authentication middleware
    let auth = HttpAuthentication::bearer(utils::jwt::validator);

    // Set up Prometheus metrics
    let mut labels = HashMap::new();
    labels.insert("app".to_string(), "timetrack".to_string());
    let prometheus = PrometheusMetricsBuilder::new("api")
        .endpoint("/metrics")
        .const_labels(labels)
        .build()
        .expect("Failed to create Prometheus metrics");

    HttpServer::new(move || {
        App::new()
            .wrap(Logger::default())
            .wrap(prometheus.clone())
            .app_data(web::Data::new(pool.clone()))
            .service(
                web::resource("/v1/auth/signin")
                    .wrap(auth.clone())
                    .route(web::post().to(handlers::auth::signin)),
            )
            .service(
                web::resource("/v1/auth/profile")
                    .wrap(auth.clone())
                    .route(web::get().to(handlers::auth::get_profile)),
            )
            .service(
                web::resource("/v1/users")
                    .wrap(auth.clone())
                    .route(web::get().to(handlers::user::list_users))
                    .route(web::post().to(handlers::user::create_user)),
            )
            .service(
                web::resource("/v1/users/{userId}/stats")
                    .wrap(auth.clone())
                    .route(web::get().to(handlers::user::get_user_stats)),
            )
            .service(
                web::resource("/v1/users/{userId}")
                    .wrap(auth.clone())
                    .route(web::patch().to(handlers::user::update_user))
                    .route(web::delete().to(handlers::user::delete_user)),
            )
            .service(
                web::resource("/v1/activities/manual")
                    .wrap(auth.clone())
                    .route(web::post().to(handlers::activity::create_manual_activity)),
            )
            .service(
                web::resource("/v1/activities/current")
                    .wrap(auth.clone())
                    .route(web::get().to(handlers::activity::get_current_activity)),
            )
            .service(
                web::resource("/v1/activities")
                    .wrap(auth.clone())
                    .route(web::get().to(handlers::activity::get_activities))
                    .route(web::post().to(handlers::activity::start_activity)),
            )
            .service(
                web::resource("/v1/activities/{activityId}/stop")
                    .wrap(auth.clone())
                    .route(web::patch().to(handlers::activity::stop_activity)),
            )
            .service(
                web::resource("/v1/activities/{activityId}")
                    .wrap(auth.clone())
                    .route(web::patch().to(handlers::activity::update_activity))
                    .route(web::delete().to(handlers::activity::delete_activity)),
            )
            .service(
                web::resource("/v1/admin/user-stats")
                    .wrap(auth.clone())
                    .route(web::get().to(handlers::admin::get_user_stats)),
            )
            .service(
                web::resource("/v1/admin/activities")
                    .wrap(auth.clone())
                    .route(web::get().to(handlers::admin::get_all_activities)),
            )
            .service(
                web::resource("/v1/admin/export")
                    .wrap(auth.clone())
                    .route(web::get().to(handlers::admin::export_csv)),
            )
    })
    .bind(&bind_address)?
    .run()
    .await
}
