use crate::{error::ApiError, services::HistoryLedger};
use actix_web::{delete, get, web, HttpResponse};
use log::info;
use serde_json::json;

/// List every recorded recommendation, newest first.
#[get("/history")]
pub async fn list_history(history: web::Data<HistoryLedger>) -> Result<HttpResponse, ApiError> {
    let entries = history.list().await?;
    Ok(HttpResponse::Ok().json(entries))
}

#[delete("/history")]
pub async fn clear_history(history: web::Data<HistoryLedger>) -> Result<HttpResponse, ApiError> {
    let removed = history.clear().await?;
    info!("History cleared ({} entries)", removed);

    Ok(HttpResponse::Ok().json(json!({ "status": "cleared" })))
}

#[delete("/history/{id}")]
pub async fn delete_history_item(
    path: web::Path<i64>,
    history: web::Data<HistoryLedger>,
) -> Result<HttpResponse, ApiError> {
    let id = path.into_inner();
    history.delete(id).await?;

    Ok(HttpResponse::Ok().json(json!({ "status": "deleted", "id": id })))
}
