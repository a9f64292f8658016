//! Backend entry-point: wires REST endpoints, the chat WebSocket, and
//! OpenAPI docs over the PostgreSQL-backed services.

use actix_session::{SessionMiddleware, storage::CookieSessionStore};
use actix_web::cookie::SameSite;
use actix_web::{App, HttpServer, web};
#[cfg(feature = "metrics")]
use actix_web_prom::PrometheusMetricsBuilder;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, fmt};
#[cfg(debug_assertions)]
use utoipa::OpenApi;
#[cfg(debug_assertions)]
use utoipa_swagger_ui::SwaggerUi;

#[cfg(debug_assertions)]
use backend::ApiDoc;
use backend::Trace;
use backend::inbound::http;
use backend::inbound::http::health::{HealthState, live, ready};
use backend::inbound::ws;
use backend::outbound::persistence::{DbPool, PoolConfig, run_migrations};
use backend::server::{ServerConfig, build_state};

/// Application bootstrap.
#[actix_web::main]
async fn main() -> std::io::Result<()> {
    if let Err(e) = fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .json()
        .try_init()
    {
        warn!(error = %e, "tracing init failed");
    }

    let config = ServerConfig::from_env()?;

    run_migrations(&config.database_url).map_err(std::io::Error::other)?;
    let pool = DbPool::new(PoolConfig::new(&config.database_url))
        .await
        .map_err(std::io::Error::other)?;
    let (http_state, ws_state) = build_state(&pool);

    let health_state = web::Data::new(HealthState::new());
    // Clone for server factory so readiness probe remains accessible.
    let server_health_state = health_state.clone();
    let key = config.key.clone();
    let cookie_secure = config.cookie_secure;

    let server = HttpServer::new(move || {
        let api = web::scope("/api/v1")
            .wrap(session_middleware(key.clone(), cookie_secure))
            .service(http::users::login)
            .service(http::users::logout)
            .service(http::users::me)
            .service(http::enrollments::request_enrollment)
            .service(http::enrollments::enrollment_status)
            .service(http::enrollments::teacher_enrollments)
            .service(http::enrollments::course_enrollments)
            .service(http::enrollments::update_enrollment_status)
            .service(http::enrollments::delete_enrollment)
            .service(http::courses::list_courses)
            .service(http::courses::get_course)
            .service(http::courses::create_course)
            .service(http::courses::update_course)
            .service(http::courses::delete_course)
            .service(http::courses::add_lesson)
            .service(http::courses::teacher_courses)
            .service(http::quizzes::create_quiz)
            .service(http::quizzes::course_quizzes)
            .service(http::quizzes::submit_attempt)
            .service(http::quizzes::quiz_attempts)
            .service(http::chat::chat_history)
            .service(http::payments::record_payment)
            .service(http::payments::course_payments);

        // The WebSocket entry shares the session middleware so the upgrade
        // can read the caller's identity.
        let chat_ws = web::scope("/ws")
            .wrap(session_middleware(key.clone(), cookie_secure))
            .service(ws::chat_ws_entry);

        #[cfg_attr(not(debug_assertions), expect(unused_mut, reason = "Swagger UI is debug-only"))]
        let mut app = App::new()
            .app_data(server_health_state.clone())
            .app_data(web::Data::new(http_state.clone()))
            .app_data(web::Data::new(ws_state.clone()))
            .wrap(Trace)
            .service(api)
            .service(chat_ws)
            .service(ready)
            .service(live);

        #[cfg(debug_assertions)]
        {
            app = app
                .service(SwaggerUi::new("/docs").url("/api-docs/openapi.json", ApiDoc::openapi()));
        }

        #[cfg(feature = "metrics")]
        let app = app.wrap(make_metrics());

        app
    })
    .bind(config.bind_addr)?;

    health_state.mark_ready();
    info!(addr = %config.bind_addr, "server listening");
    server.run().await
}

fn session_middleware(
    key: actix_web::cookie::Key,
    cookie_secure: bool,
) -> SessionMiddleware<CookieSessionStore> {
    SessionMiddleware::builder(CookieSessionStore::default(), key)
        .cookie_name("session".into())
        .cookie_path("/".into())
        .cookie_secure(cookie_secure)
        .cookie_http_only(true)
        .cookie_same_site(SameSite::Lax)
        .build()
}

#[cfg(feature = "metrics")]
fn make_metrics() -> actix_web_prom::PrometheusMetrics {
    PrometheusMetricsBuilder::new("learnhub")
        .endpoint("/metrics")
        .build()
        .expect("configure Prometheus metrics")
}
