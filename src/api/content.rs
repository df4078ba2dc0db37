use actix_web::{web, HttpResponse};
use futures::stream::TryStreamExt;
use mongodb::bson::{doc, Document};

use crate::database::{MongoDB, HEALTH_RECOMMENDATIONS, NEWS};
use crate::models::documents_to_json;
use crate::utils::AppError;

// Read-only reference content, curated directly in the database

#[utoipa::path(
    get,
    path = "/health/recommendation",
    tag = "Content",
    responses(
        (status = 200, description = "Health recommendations")
    )
)]
pub async fn list_health_recommendations(db: web::Data<MongoDB>) -> Result<HttpResponse, AppError> {
    log::info!("🩺 GET /health/recommendation");

    let items: Vec<Document> = db
        .documents(HEALTH_RECOMMENDATIONS)
        .find(doc! {})
        .await?
        .try_collect()
        .await?;
    Ok(HttpResponse::Ok().json(documents_to_json(items)))
}

#[utoipa::path(
    get,
    path = "/news",
    tag = "Content",
    responses(
        (status = 200, description = "News items")
    )
)]
pub async fn list_news(db: web::Data<MongoDB>) -> Result<HttpResponse, AppError> {
    log::info!("📰 GET /news");

    let items: Vec<Document> = db.documents(NEWS).find(doc! {}).await?.try_collect().await?;
    Ok(HttpResponse::Ok().json(documents_to_json(items)))
}
