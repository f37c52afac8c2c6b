use actix_web::web;

use crate::error::ApiError;
use crate::handlers::{
    clear_history, cover_config, delete_history_item, health_check, list_history,
    recommendations_config,
};

/// Configure all routes for the API
pub fn api_routes(cfg: &mut web::ServiceConfig) {
    cfg.app_data(json_config())
        .app_data(path_config())
        .service(health_check)
        .configure(recommendations_config)
        .configure(cover_config)
        .service(list_history)
        .service(clear_history)
        .service(delete_history_item);
}

/// Malformed bodies get the same `{error}` payload as every other failure.
fn json_config() -> web::JsonConfig {
    web::JsonConfig::default()
        .error_handler(|err, _req| ApiError::InvalidInput(err.to_string()).into())
}

fn path_config() -> web::PathConfig {
    web::PathConfig::default()
        .error_handler(|err, _req| ApiError::InvalidInput(err.to_string()).into())
}
