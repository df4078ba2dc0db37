use actix_web::{web, HttpResponse};

use crate::models::{to_minor_units, PaymentIntentRequest, PaymentIntentResponse};
use crate::services::payment_service::PaymentClient;
use crate::utils::AppError;

#[utoipa::path(
    post,
    path = "/create-payment-intent",
    tag = "Payments",
    request_body = PaymentIntentRequest,
    responses(
        (status = 200, description = "Client secret of the new payment intent", body = PaymentIntentResponse),
        (status = 400, description = "Body is not valid JSON"),
        (status = 502, description = "Payment processor rejected the request, including non-numeric prices")
    )
)]
pub async fn create_payment_intent(
    payments: web::Data<PaymentClient>,
    body: web::Json<PaymentIntentRequest>,
) -> Result<HttpResponse, AppError> {
    let amount = to_minor_units(&body.price);
    log::info!("💳 POST /create-payment-intent - price: {} ({:?} minor units)", body.price, amount);
    if amount.is_none() {
        log::warn!("⚠️  Price {} is not numeric, forwarding without an amount", body.price);
    }

    let client_secret = payments.create_payment_intent(amount).await?;
    Ok(HttpResponse::Ok().json(PaymentIntentResponse { client_secret }))
}
