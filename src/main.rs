use actix_cors::Cors;
use actix_web::{middleware::Logger, web, App, HttpServer};
use dotenv::dotenv;
use std::io;
use std::sync::Arc;

use todo_api::auth::{AuthService, TokenCodec};
use todo_api::clock::{Clock, SystemClock};
use todo_api::config::Config;
use todo_api::error::expose_internal_details;
use todo_api::routes;
use todo_api::store::postgres::PgSettings;
use todo_api::store::{CredentialStore, MemoryStore, PgStore, TaskStore};
use todo_api::tasks::TaskService;

fn startup_error(err: impl std::fmt::Display) -> io::Error {
    io::Error::new(io::ErrorKind::Other, err.to_string())
}

async fn open_stores(config: &Config) -> io::Result<(Arc<dyn TaskStore>, Arc<dyn CredentialStore>)> {
    match &config.database_url {
        Some(database_url) => {
            let settings = PgSettings {
                database_url: database_url.clone(),
                max_connections: config.db_max_connections,
                acquire_timeout: config.db_acquire_timeout,
            };
            let store = PgStore::connect(&settings).await.map_err(startup_error)?;
            store.init_schema().await.map_err(startup_error)?;
            log::info!("Connected to Postgres");
            let store = Arc::new(store);
            let tasks: Arc<dyn TaskStore> = store.clone();
            Ok((tasks, store))
        }
        None => {
            log::warn!("DATABASE_URL is not set; data is kept in memory and lost on exit");
            let store = Arc::new(MemoryStore::new());
            let tasks: Arc<dyn TaskStore> = store.clone();
            Ok((tasks, store))
        }
    }
}

fn cors(origins: &[String]) -> Cors {
    let cors = Cors::default()
        .allow_any_method()
        .allow_any_header()
        .max_age(3600);
    if origins.is_empty() {
        return cors.allow_any_origin();
    }
    origins
        .iter()
        .fold(cors, |cors, origin| cors.allowed_origin(origin))
}

#[actix_web::main]
async fn main() -> io::Result<()> {
    dotenv().ok();
    env_logger::init_from_env(env_logger::Env::default().default_filter_or("info"));

    let config = Config::from_env().map_err(|e| {
        log::error!("Invalid configuration: {}", e);
        startup_error(e)
    })?;
    expose_internal_details(config.is_development());

    let (task_store, credential_store) = open_stores(&config).await?;
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let codec = TokenCodec::new(config.jwt_secret.as_bytes(), config.token_ttl()).map_err(startup_error)?;

    let auth_service = web::Data::new(AuthService::new(
        credential_store,
        codec,
        clock.clone(),
        config.bcrypt_cost,
    ));
    let task_service = web::Data::new(TaskService::new(task_store, clock));

    log::info!("Starting todo-api server at {}", config.server_url());
    let cors_origins = config.cors_origins.clone();
    HttpServer::new(move || {
        App::new()
            .app_data(auth_service.clone())
            .app_data(task_service.clone())
            .wrap(cors(&cors_origins))
            .wrap(Logger::default())
            .configure(routes::config)
            .default_service(web::route().to(routes::not_found))
    })
    .bind((config.server_host.as_str(), config.server_port))?
    .run()
    .await
}
