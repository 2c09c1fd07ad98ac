pub mod auth;
pub mod health;
pub mod tasks;

use actix_web::{error, web, HttpRequest, HttpResponse};

use crate::auth::AuthMiddleware;
use crate::error::AppError;

/// Prefix shared by every versioned endpoint.
pub const API_PREFIX: &str = "/api/v1";

/// Registers extractor error handlers and all routes.
///
/// `web::Data<AuthService>` and `web::Data<TaskService>` must be registered on the
/// `App` by the caller.
pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.app_data(json_config())
        .app_data(query_config())
        .app_data(path_config())
        .service(health::health)
        .service(
            web::scope(API_PREFIX)
                .service(
                    web::scope("/auth")
                        .service(auth::register)
                        .service(auth::login),
                )
                .service(
                    web::scope("/{owner_id}/tasks")
                        .wrap(AuthMiddleware)
                        .service(tasks::list_tasks)
                        .service(tasks::create_task)
                        .service(tasks::get_task)
                        .service(tasks::update_task)
                        .service(tasks::delete_task)
                        .service(tasks::toggle_task),
                ),
        );
}

/// Fallback for unmatched routes, to be installed with `App::default_service`.
pub async fn not_found(req: HttpRequest) -> Result<HttpResponse, AppError> {
    Err(AppError::NotFound(req.path().to_string()))
}

fn json_config() -> web::JsonConfig {
    web::JsonConfig::default().error_handler(|err, _req| {
        let message = match &err {
            error::JsonPayloadError::ContentType => "Expected a JSON request body".to_string(),
            other => format!("Invalid JSON body: {}", other),
        };
        AppError::BadRequest(message).into()
    })
}

fn query_config() -> web::QueryConfig {
    web::QueryConfig::default().error_handler(|err, _req| {
        AppError::BadRequest(format!("Invalid query string: {}", err)).into()
    })
}

fn path_config() -> web::PathConfig {
    web::PathConfig::default().error_handler(|err, _req| {
        AppError::BadRequest(format!("Invalid path parameter: {}", err)).into()
    })
}
