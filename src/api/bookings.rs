use actix_web::{web, HttpResponse};
use futures::stream::TryStreamExt;
use mongodb::bson::{doc, Document};
use serde_json::Value;

use crate::database::{MongoDB, BOOKINGS};
use crate::models::{
    document_to_json, documents_to_json, json_to_document, parse_object_id, BookingSearchQuery,
    DeleteAck, InsertAck, UpdateAck, UpdateReportRequest, REPORT_DELIVERED,
};
use crate::services::booking_service;
use crate::services::notification_service::NotificationDispatcher;
use crate::utils::AppError;

#[utoipa::path(
    post,
    path = "/booking",
    tag = "Bookings",
    responses(
        (status = 200, description = "Booking recorded and one slot taken", body = InsertAck),
        (status = 400, description = "Missing or malformed testId"),
        (status = 404, description = "Referenced test does not exist"),
        (status = 409, description = "No slots left on the test")
    ),
    security(("bearer_auth" = []))
)]
pub async fn create_booking(
    db: web::Data<MongoDB>,
    body: web::Json<Value>,
) -> Result<HttpResponse, AppError> {
    let booking = json_to_document(body.into_inner())?;
    log::info!(
        "🎫 POST /booking - patient: {}",
        booking
            .get_document("patientInfo")
            .and_then(|p| p.get_str("email"))
            .unwrap_or("N/A")
    );

    let ack = booking_service::create_booking(&db, booking).await?;
    Ok(HttpResponse::Ok().json(ack))
}

#[utoipa::path(
    get,
    path = "/bookings",
    tag = "Bookings",
    params(BookingSearchQuery),
    responses((status = 200, description = "Bookings, optionally filtered by patient email"))
)]
pub async fn list_bookings(
    db: web::Data<MongoDB>,
    query: web::Query<BookingSearchQuery>,
) -> Result<HttpResponse, AppError> {
    log::info!("🎫 GET /bookings - search: {}", query.search.as_deref().unwrap_or(""));

    let bookings: Vec<Document> = db
        .documents(BOOKINGS)
        .find(query.filter())
        .await?
        .try_collect()
        .await?;
    Ok(HttpResponse::Ok().json(documents_to_json(bookings)))
}

#[utoipa::path(
    get,
    path = "/bookings/delivered",
    tag = "Bookings",
    responses(
        (status = 200, description = "Bookings whose report is Delivered")
    )
)]
pub async fn list_delivered_bookings(db: web::Data<MongoDB>) -> Result<HttpResponse, AppError> {
    log::info!("🎫 GET /bookings/delivered");

    let bookings: Vec<Document> = db
        .documents(BOOKINGS)
        .find(doc! { "report": REPORT_DELIVERED })
        .await?
        .try_collect()
        .await?;
    Ok(HttpResponse::Ok().json(documents_to_json(bookings)))
}

#[utoipa::path(
    patch,
    path = "/booking/status/{id}",
    tag = "Bookings",
    params(("id" = String, Path, description = "Booking id")),
    request_body = UpdateReportRequest,
    responses(
        (status = 200, description = "Raw update result", body = UpdateAck),
        (status = 401, description = "Missing or invalid token")
    ),
    security(("bearer_auth" = []))
)]
pub async fn update_booking_report(
    db: web::Data<MongoDB>,
    notifier: web::Data<NotificationDispatcher>,
    path: web::Path<String>,
    body: web::Json<UpdateReportRequest>,
) -> Result<HttpResponse, AppError> {
    let id = parse_object_id(&path)?;
    let report = body.report_value();
    log::info!("🎫 PATCH /booking/status/{} - report: {}", id.to_hex(), report);

    let result = db
        .documents(BOOKINGS)
        .update_one(doc! { "_id": id }, doc! { "$set": { "report": report.as_str() } })
        .await?;

    // Only a real transition notifies; re-sending "Delivered" is a no-op
    if body.is_delivered() && result.modified_count > 0 {
        match booking_service::find_booking_notice(&db, id).await {
            Ok(Some(notice)) => {
                notifier.report_delivered(&notice);
            }
            Ok(None) => log::warn!("⚠️  Booking {} vanished before notification", id.to_hex()),
            Err(e) => log::error!("❌ Could not load booking {} for notification: {}", id.to_hex(), e),
        }
    }

    Ok(HttpResponse::Ok().json(UpdateAck::from(result)))
}

#[utoipa::path(
    get,
    path = "/booking/upcomin/{email}",
    tag = "Bookings",
    params(("email" = String, Path, description = "Patient email")),
    responses(
        (status = 200, description = "Bookings of one patient"),
        (status = 401, description = "Missing or invalid token")
    ),
    security(("bearer_auth" = []))
)]
pub async fn list_patient_bookings(
    db: web::Data<MongoDB>,
    path: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    let email = path.into_inner();
    log::info!("🎫 GET /booking/upcomin/{}", email);

    let bookings: Vec<Document> = db
        .documents(BOOKINGS)
        .find(doc! { "patientInfo.email": email.as_str() })
        .await?
        .try_collect()
        .await?;
    Ok(HttpResponse::Ok().json(documents_to_json(bookings)))
}

#[utoipa::path(
    delete,
    path = "/booking/delete/{id}",
    tag = "Bookings",
    params(("id" = String, Path, description = "Booking id")),
    responses(
        (status = 200, description = "Raw delete result", body = DeleteAck),
        (status = 400, description = "Malformed id or body"),
        (status = 401, description = "Missing or invalid token")
    ),
    security(("bearer_auth" = []))
)]
pub async fn delete_booking(
    db: web::Data<MongoDB>,
    path: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    let id = parse_object_id(&path)?;
    log::info!("🗑️ DELETE /booking/delete/{}", id.to_hex());

    let result = db.documents(BOOKINGS).delete_one(doc! { "_id": id }).await?;
    Ok(HttpResponse::Ok().json(DeleteAck::from(result)))
}

#[utoipa::path(
    get,
    path = "/reservation/{id}",
    tag = "Bookings",
    params(("id" = String, Path, description = "Booking id")),
    responses(
        (status = 200, description = "The booking, or null"),
        (status = 400, description = "Malformed id or body"),
        (status = 401, description = "Missing or invalid token")
    ),
    security(("bearer_auth" = []))
)]
pub async fn get_reservation(
    db: web::Data<MongoDB>,
    path: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    let id = parse_object_id(&path)?;
    log::info!("🎫 GET /reservation/{}", id.to_hex());

    let booking = db.documents(BOOKINGS).find_one(doc! { "_id": id }).await?;
    Ok(HttpResponse::Ok().json(booking.map(document_to_json)))
}
