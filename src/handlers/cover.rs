use crate::{error::ApiError, models::CoverRequest, services::CoverService};
use actix_web::{
    web::{self, Json},
    HttpResponse,
};

pub fn cover_config(cfg: &mut web::ServiceConfig) {
    cfg.service(web::resource("/generate_image").route(web::post().to(generate_image)));
}

/// Generate a cover image for a recommended title.
///
/// Returns `{image_url}` with a PNG data URL, or `{error}` when the image
/// model fails; both with status 200.
pub async fn generate_image(
    request: Json<CoverRequest>,
    cover_service: web::Data<CoverService>,
) -> Result<HttpResponse, ApiError> {
    let outcome = cover_service
        .generate_cover(&request.title, request.theme.as_deref())
        .await?;

    Ok(HttpResponse::Ok().json(outcome))
}
