use actix_web::{web, HttpResponse};
use futures::stream::TryStreamExt;
use mongodb::bson::{doc, Document};
use serde_json::Value;

use crate::database::{MongoDB, BANNERS};
use crate::models::{
    documents_to_json, json_to_document, parse_object_id, DeleteAck, InsertAck, UpdateAck,
    UpdateBannerRequest,
};
use crate::utils::AppError;

/// New banners start inactive unless told otherwise
#[utoipa::path(
    post,
    path = "/banner",
    tag = "Banners",
    responses(
        (status = 200, description = "Banner created", body = InsertAck),
        (status = 401, description = "Missing or invalid token"),
        (status = 403, description = "Caller is not an admin")
    ),
    security(("bearer_auth" = []))
)]
pub async fn create_banner(
    db: web::Data<MongoDB>,
    body: web::Json<Value>,
) -> Result<HttpResponse, AppError> {
    let mut banner = json_to_document(body.into_inner())?;
    banner.remove("_id");
    if !banner.contains_key("isActive") {
        banner.insert("isActive", false);
    }
    log::info!("🖼️ POST /banner");

    let result = db.documents(BANNERS).insert_one(banner).await?;
    Ok(HttpResponse::Ok().json(InsertAck::from(result)))
}

#[utoipa::path(
    get,
    path = "/banner",
    tag = "Banners",
    responses(
        (status = 200, description = "All banners")
    )
)]
pub async fn list_banners(db: web::Data<MongoDB>) -> Result<HttpResponse, AppError> {
    log::info!("🖼️ GET /banner");

    let banners: Vec<Document> = db.documents(BANNERS).find(doc! {}).await?.try_collect().await?;
    Ok(HttpResponse::Ok().json(documents_to_json(banners)))
}

#[utoipa::path(
    patch,
    path = "/banner/{id}",
    tag = "Banners",
    params(("id" = String, Path, description = "Banner id")),
    request_body = UpdateBannerRequest,
    responses(
        (status = 200, description = "Raw update result", body = UpdateAck),
        (status = 400, description = "Malformed id or body"),
        (status = 401, description = "Missing or invalid token"),
        (status = 403, description = "Caller is not an admin")
    ),
    security(("bearer_auth" = []))
)]
pub async fn update_banner_status(
    db: web::Data<MongoDB>,
    path: web::Path<String>,
    body: web::Json<UpdateBannerRequest>,
) -> Result<HttpResponse, AppError> {
    let id = parse_object_id(&path)?;
    log::info!("🖼️ PATCH /banner/{} - isActive: {}", id.to_hex(), body.status);

    let result = db
        .documents(BANNERS)
        .update_one(doc! { "_id": id }, doc! { "$set": { "isActive": body.status } })
        .await?;
    Ok(HttpResponse::Ok().json(UpdateAck::from(result)))
}

#[utoipa::path(
    delete,
    path = "/banner/{id}",
    tag = "Banners",
    params(("id" = String, Path, description = "Banner id")),
    responses(
        (status = 200, description = "Raw delete result", body = DeleteAck),
        (status = 400, description = "Malformed id or body"),
        (status = 401, description = "Missing or invalid token"),
        (status = 403, description = "Caller is not an admin")
    ),
    security(("bearer_auth" = []))
)]
pub async fn delete_banner(
    db: web::Data<MongoDB>,
    path: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    let id = parse_object_id(&path)?;
    log::info!("🗑️ DELETE /banner/{}", id.to_hex());

    let result = db.documents(BANNERS).delete_one(doc! { "_id": id }).await?;
    Ok(HttpResponse::Ok().json(DeleteAck::from(result)))
}
