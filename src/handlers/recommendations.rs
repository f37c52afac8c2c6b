use crate::{
    error::ApiError,
    models::RecommendationRequest,
    services::RecommendationService,
};
use actix_web::{
    web::{self, Json},
    HttpResponse,
};

pub fn recommendations_config(cfg: &mut web::ServiceConfig) {
    cfg.service(web::resource("/recommend").route(web::post().to(recommend)));
}

/// Recommend the single best-matching book for a free-text query.
///
/// 400 on an empty query, 500 when the vector index cannot be reached.
/// A failed generation still answers 200 with a fallback sentence.
pub async fn recommend(
    request: Json<RecommendationRequest>,
    recommendation_service: web::Data<RecommendationService>,
) -> Result<HttpResponse, ApiError> {
    if request.query.trim().is_empty() {
        return Err(ApiError::InvalidInput("Empty query.".to_string()));
    }

    let result = recommendation_service.recommend(&request.query).await?;

    Ok(HttpResponse::Ok().json(result))
}
