use std::sync::Arc;

use actix_web::middleware::{Logger, NormalizePath};
use actix_web::web::Data;
use actix_web::{App, HttpServer, Responder, get};
use dotenvy::dotenv;
use tracing::info;
use tracing_appender::rolling;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use hrm_leave::config::Config;
use hrm_leave::db::init_db;
use hrm_leave::docs::ApiDoc;
use hrm_leave::leave::LeaveBackend;
use hrm_leave::routes::{self, Limiters};
use hrm_leave::store::MySqlLeaveBackend;
use hrm_leave::utils::draft_store::DraftStore;

#[get("/")]
async fn index() -> impl Responder {
    "HRM leave service"
}

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();

    let config = Config::from_env()?;

    // Rolling daily log
    let file_appender = rolling::daily(&config.log_dir, "app.log");
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);

    tracing_subscriber::fmt()
        .with_writer(non_blocking)
        .with_max_level(tracing::Level::DEBUG)
        .with_ansi(false)
        .with_target(false)
        .with_level(true)
        .with_thread_ids(false)
        .with_thread_names(false)
        .pretty()
        .init();

    info!(addr = %config.server_addr, "Server starting...");

    let pool = init_db(&config.database_url).await?;
    let backend: Arc<dyn LeaveBackend> = Arc::new(MySqlLeaveBackend::new(pool.clone()));
    let backend = Data::from(backend);
    let drafts = Data::new(DraftStore::new(config.draft_capacity, config.draft_ttl));
    let limiters = Limiters::from_config(&config)?;

    let server_addr = config.server_addr.clone();
    let config = Data::new(config);

    HttpServer::new(move || {
        App::new()
            .wrap(Logger::default())
            .wrap(NormalizePath::trim())
            .service(
                // wildcard so the UI's JS/CSS assets resolve
                SwaggerUi::new("/swagger-ui/{_:.*}")
                    .url("/api-doc/openapi.json", ApiDoc::openapi()),
            )
            .app_data(Data::new(pool.clone()))
            .app_data(config.clone())
            .app_data(backend.clone())
            .app_data(drafts.clone())
            .service(index)
            .configure(|cfg| routes::configure(cfg, &config, &limiters))
    })
    .bind(server_addr)?
    .run()
    .await?;

    Ok(())
}
