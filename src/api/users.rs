use actix_web::{web, HttpResponse};
use futures::stream::TryStreamExt;
use mongodb::bson::{doc, Document};
use serde_json::Value;

use crate::database::{MongoDB, USERS};
use crate::models::{
    document_to_json, documents_to_json, json_to_document, parse_object_id, InsertAck, Role,
    UpdateAck, UpdateProfileRequest, UpdateRoleRequest, UpdateStatusRequest, UserStatus,
};
use crate::utils::AppError;

/// Signup record
#[utoipa::path(
    post,
    path = "/user",
    tag = "Users",
    responses(
        (status = 200, description = "User created with role `user`", body = InsertAck),
        (status = 400, description = "Missing email"),
        (status = 409, description = "Email already registered")
    )
)]
pub async fn create_user(
    db: web::Data<MongoDB>,
    body: web::Json<Value>,
) -> Result<HttpResponse, AppError> {
    let mut user = json_to_document(body.into_inner())?;
    user.remove("_id");

    let email = user.get_str("email").map(str::to_string).map_err(|_| {
        AppError::InvalidRequest("email is required".to_string())
    })?;
    log::info!("📝 POST /user - email: {}", email);

    // Signup never grants privileges
    user.insert("role", Role::User.as_str());
    if !user.contains_key("status") {
        user.insert("status", UserStatus::Active.as_str());
    }

    let result = db.documents(USERS).insert_one(user).await?;
    log::info!("✅ User created: {}", email);
    Ok(HttpResponse::Ok().json(InsertAck::from(result)))
}

#[utoipa::path(
    get,
    path = "/user",
    tag = "Users",
    responses(
        (status = 200, description = "All users"),
        (status = 401, description = "Missing or invalid token")
    ),
    security(("bearer_auth" = []))
)]
pub async fn list_users(db: web::Data<MongoDB>) -> Result<HttpResponse, AppError> {
    log::info!("👥 GET /user");

    let users: Vec<Document> = db.documents(USERS).find(doc! {}).await?.try_collect().await?;
    Ok(HttpResponse::Ok().json(documents_to_json(users)))
}

#[utoipa::path(
    get,
    path = "/user/current/{email}",
    tag = "Users",
    params(("email" = String, Path, description = "User email")),
    responses(
        (status = 200, description = "The user, or null"),
        (status = 401, description = "Missing or invalid token")
    ),
    security(("bearer_auth" = []))
)]
pub async fn get_current_user(
    db: web::Data<MongoDB>,
    path: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    let email = path.into_inner();
    log::info!("👤 GET /user/current/{}", email);

    let user = db.documents(USERS).find_one(doc! { "email": email.as_str() }).await?;
    Ok(HttpResponse::Ok().json(user.map(document_to_json)))
}

#[utoipa::path(
    patch,
    path = "/user/{id}",
    tag = "Users",
    params(("id" = String, Path, description = "User id")),
    request_body = UpdateStatusRequest,
    responses(
        (status = 200, description = "Raw update result", body = UpdateAck),
        (status = 400, description = "Malformed id or body"),
        (status = 401, description = "Missing or invalid token"),
        (status = 403, description = "Caller is not an admin")
    ),
    security(("bearer_auth" = []))
)]
pub async fn update_user_status(
    db: web::Data<MongoDB>,
    path: web::Path<String>,
    body: web::Json<UpdateStatusRequest>,
) -> Result<HttpResponse, AppError> {
    let id = parse_object_id(&path)?;
    log::info!("🛠️ PATCH /user/{} - status: {}", id.to_hex(), body.status.as_str());

    let result = db
        .documents(USERS)
        .update_one(doc! { "_id": id }, doc! { "$set": { "status": body.status.as_str() } })
        .await?;
    Ok(HttpResponse::Ok().json(UpdateAck::from(result)))
}

#[utoipa::path(
    patch,
    path = "/user/role/{id}",
    tag = "Users",
    params(("id" = String, Path, description = "User id")),
    request_body = UpdateRoleRequest,
    responses(
        (status = 200, description = "Raw update result", body = UpdateAck),
        (status = 400, description = "Malformed id or body"),
        (status = 401, description = "Missing or invalid token"),
        (status = 403, description = "Caller is not an admin")
    ),
    security(("bearer_auth" = []))
)]
pub async fn update_user_role(
    db: web::Data<MongoDB>,
    path: web::Path<String>,
    body: web::Json<UpdateRoleRequest>,
) -> Result<HttpResponse, AppError> {
    let id = parse_object_id(&path)?;
    log::info!("🛠️ PATCH /user/role/{} - role: {}", id.to_hex(), body.role.as_str());

    let result = db
        .documents(USERS)
        .update_one(doc! { "_id": id }, doc! { "$set": { "role": body.role.as_str() } })
        .await?;
    Ok(HttpResponse::Ok().json(UpdateAck::from(result)))
}

/// Only `name` and `photo` can change here
#[utoipa::path(
    put,
    path = "/user/update/{id}",
    tag = "Users",
    params(("id" = String, Path, description = "User id")),
    request_body = UpdateProfileRequest,
    responses(
        (status = 200, description = "Raw update result", body = UpdateAck),
        (status = 400, description = "Malformed id or body"),
        (status = 401, description = "Missing or invalid token")
    ),
    security(("bearer_auth" = []))
)]
pub async fn update_user_profile(
    db: web::Data<MongoDB>,
    path: web::Path<String>,
    body: web::Json<UpdateProfileRequest>,
) -> Result<HttpResponse, AppError> {
    let id = parse_object_id(&path)?;
    log::info!("🛠️ PUT /user/update/{}", id.to_hex());

    let body = body.into_inner();
    let mut changes = Document::new();
    if let Some(name) = body.name {
        changes.insert("name", name);
    }
    if let Some(photo) = body.photo {
        changes.insert("photo", photo);
    }
    if changes.is_empty() {
        return Err(AppError::InvalidRequest("nothing to update".to_string()));
    }

    let result = db
        .documents(USERS)
        .update_one(doc! { "_id": id }, doc! { "$set": changes })
        .await?;
    Ok(HttpResponse::Ok().json(UpdateAck::from(result)))
}
