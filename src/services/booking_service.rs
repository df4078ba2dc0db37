use mongodb::bson::{doc, oid::ObjectId, Bson, Document};
use mongodb::options::ReturnDocument;

use crate::database::{MongoDB, BOOKINGS, TESTS};
use crate::models::{parse_object_id, BookingNotice, InsertAck, REPORT_PENDING};
use crate::utils::AppError;

/// Reads and validates the `testId` reference of a booking body
pub fn booking_test_id(booking: &Document) -> Result<ObjectId, AppError> {
    match booking.get("testId") {
        Some(Bson::String(raw)) => parse_object_id(raw),
        Some(Bson::ObjectId(id)) => Ok(*id),
        Some(_) => Err(AppError::InvalidRequest("testId must be a string id".to_string())),
        None => Err(AppError::InvalidRequest("testId is required".to_string())),
    }
}

/// Fills in the fields every new booking carries
pub fn prepare_booking(mut booking: Document) -> Document {
    booking.remove("_id");
    if !booking.contains_key("report") {
        booking.insert("report", REPORT_PENDING);
    }
    booking
}

/// Reserves one slot of the referenced test and records the booking.
///
/// The decrement is conditional (`slots > 0`) and happens in a single
/// `findOneAndUpdate`, so concurrent requests for the last slot cannot both
/// win. The booking is inserted only after a slot was taken; if that insert
/// fails the slot is given back.
pub async fn create_booking(db: &MongoDB, booking: Document) -> Result<InsertAck, AppError> {
    let test_id = booking_test_id(&booking)?;
    let booking = prepare_booking(booking);

    let tests = db.documents(TESTS);
    let reserved = tests
        .find_one_and_update(
            doc! { "_id": test_id, "slots": { "$gt": 0 } },
            doc! { "$inc": { "slots": -1 } },
        )
        .return_document(ReturnDocument::After)
        .await?;

    let reserved = match reserved {
        Some(test) => test,
        None => {
            let exists = tests.count_documents(doc! { "_id": test_id }).await? > 0;
            return Err(if exists {
                log::warn!("🚫 Test {} has no slots left", test_id.to_hex());
                AppError::CapacityExceeded(format!("test {} has no slots left", test_id.to_hex()))
            } else {
                AppError::NotFound(format!("test {}", test_id.to_hex()))
            });
        }
    };

    log::info!(
        "🎫 Slot reserved on test {} ({} left)",
        test_id.to_hex(),
        reserved.get("slots").map(|s| s.to_string()).unwrap_or_default()
    );

    match db.documents(BOOKINGS).insert_one(booking).await {
        Ok(result) => Ok(InsertAck::from(result)),
        Err(e) => {
            log::error!("❌ Booking insert failed, releasing slot on test {}: {}", test_id.to_hex(), e);
            if let Err(release) = tests
                .update_one(doc! { "_id": test_id }, doc! { "$inc": { "slots": 1 } })
                .await
            {
                log::error!("❌ Failed to release slot on test {}: {}", test_id.to_hex(), release);
            }
            Err(e.into())
        }
    }
}

/// Loads what the delivery email needs from a booking
pub async fn find_booking_notice(db: &MongoDB, id: ObjectId) -> Result<Option<BookingNotice>, AppError> {
    let notice = db
        .collection::<BookingNotice>(BOOKINGS)
        .find_one(doc! { "_id": id })
        .await?;
    Ok(notice)
}
