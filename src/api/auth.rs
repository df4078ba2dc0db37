use actix_web::{web, HttpResponse};
use serde_json::Value;

use crate::database::MongoDB;
use crate::models::AdminCheckResponse;
use crate::services::auth_service::{self, Claims, TokenIssuer, TokenResponse};
use crate::utils::AppError;

#[utoipa::path(
    post,
    path = "/jwt",
    tag = "Auth",
    responses(
        (status = 200, description = "Signed access token, valid for one hour", body = TokenResponse),
        (status = 400, description = "Payload is not a JSON object")
    )
)]
pub async fn issue_token(
    issuer: web::Data<TokenIssuer>,
    payload: web::Json<Value>,
) -> Result<HttpResponse, AppError> {
    let payload = payload.into_inner();
    log::info!(
        "🔐 POST /jwt - email: {}",
        payload.get("email").and_then(Value::as_str).unwrap_or("N/A")
    );

    let token = issuer.issue(payload)?;
    Ok(HttpResponse::Ok().json(TokenResponse { token }))
}

#[utoipa::path(
    get,
    path = "/user-admin/{email}",
    tag = "Auth",
    params(("email" = String, Path, description = "Must match the token's email")),
    responses(
        (status = 200, description = "Whether the caller is an admin", body = AdminCheckResponse),
        (status = 401, description = "Missing or invalid token"),
        (status = 403, description = "Asking about someone else")
    ),
    security(("bearer_auth" = []))
)]
pub async fn check_admin(
    db: web::Data<MongoDB>,
    claims: web::ReqData<Claims>,
    path: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    let email = path.into_inner();
    log::info!("👤 GET /user-admin/{}", email);

    if claims.email.as_deref() != Some(email.as_str()) {
        log::warn!("⛔ Admin probe for {} with a token for someone else", email);
        return Err(AppError::Forbidden);
    }

    let admin = auth_service::find_user_role(&db, &email)
        .await?
        .map(|user| user.is_admin())
        .unwrap_or(false);

    Ok(HttpResponse::Ok().json(AdminCheckResponse { admin }))
}
