use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Diagnostic Center API",
        version = "1.0.0",
        description = "Booking backend for a diagnostic center.\n\n**Authentication:** protected endpoints require `Authorization: Bearer <token>` obtained from `POST /jwt`. Admin-only endpoints additionally require the caller's user record to have role `admin`."
    ),
    paths(
        crate::api::auth::issue_token,
        crate::api::auth::check_admin,
        crate::api::users::create_user,
        crate::api::users::list_users,
        crate::api::users::get_current_user,
        crate::api::users::update_user_status,
        crate::api::users::update_user_role,
        crate::api::users::update_user_profile,
        crate::api::diagnostic_tests::create_test,
        crate::api::diagnostic_tests::list_tests,
        crate::api::diagnostic_tests::get_test,
        crate::api::diagnostic_tests::update_test,
        crate::api::diagnostic_tests::delete_test,
        crate::api::banners::create_banner,
        crate::api::banners::list_banners,
        crate::api::banners::update_banner_status,
        crate::api::banners::delete_banner,
        crate::api::bookings::create_booking,
        crate::api::bookings::list_bookings,
        crate::api::bookings::list_delivered_bookings,
        crate::api::bookings::update_booking_report,
        crate::api::bookings::list_patient_bookings,
        crate::api::bookings::delete_booking,
        crate::api::bookings::get_reservation,
        crate::api::payments::create_payment_intent,
        crate::api::content::list_health_recommendations,
        crate::api::content::list_news,
        crate::api::health::health_check,
    ),
    components(
        schemas(
            crate::services::auth_service::TokenResponse,
            crate::models::AdminCheckResponse,
            crate::models::Role,
            crate::models::UserStatus,
            crate::models::UpdateStatusRequest,
            crate::models::UpdateRoleRequest,
            crate::models::UpdateProfileRequest,
            crate::models::UpdateBannerRequest,
            crate::models::UpdateReportRequest,
            crate::models::PaymentIntentRequest,
            crate::models::PaymentIntentResponse,
            crate::models::InsertAck,
            crate::models::UpdateAck,
            crate::models::DeleteAck,
            crate::api::health::HealthResponse,
        )
    ),
    tags(
        (name = "Auth", description = "Token issuing and admin checks."),
        (name = "Users", description = "User records, roles and status."),
        (name = "Tests", description = "Diagnostic test catalog."),
        (name = "Banners", description = "Home page banners."),
        (name = "Bookings", description = "Test bookings and report status."),
        (name = "Payments", description = "Stripe payment intents."),
        (name = "Content", description = "Health recommendations and news."),
        (name = "Health", description = "Liveness probe."),
    ),
    modifiers(&SecurityAddon)
)]
pub struct ApiDoc;

struct SecurityAddon;

impl utoipa::Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .description(Some("Token from POST /jwt"))
                        .build(),
                ),
            );
        }
    }
}
