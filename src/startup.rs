use actix_cors::Cors;
use actix_web::dev::{HttpServiceFactory, Server};
use actix_web::http::{header, Method};
use actix_web::{error, guard, middleware::Logger, web, App, HttpServer, Route};
use std::net::TcpListener;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::api;
use crate::config::Settings;
use crate::database::MongoDB;
use crate::middleware::{Authenticate, RequireAdmin};
use crate::services::auth_service::TokenIssuer;
use crate::services::notification_service::NotificationDispatcher;
use crate::services::payment_service::PaymentClient;
use crate::utils::AppError;

/// Open route. The method guard sits on the resource so other methods on the
/// same path fall through to their own resource.
fn public(path: &str, method: Method, route: Route) -> impl HttpServiceFactory {
    web::resource(path).guard(guard::Method(method)).route(route)
}

/// Route that requires a valid bearer token
fn authenticated(path: &str, method: Method, route: Route) -> impl HttpServiceFactory {
    web::resource(path)
        .guard(guard::Method(method))
        .wrap(Authenticate)
        .route(route)
}

/// Route that requires a valid bearer token and an admin user record.
/// `Authenticate` is registered last so it runs first.
fn admin_only(path: &str, method: Method, route: Route) -> impl HttpServiceFactory {
    web::resource(path)
        .guard(guard::Method(method))
        .wrap(RequireAdmin)
        .wrap(Authenticate)
        .route(route)
}

/// Registers every endpoint. Each resource carries its method guard and its
/// own interceptor chain, so the same path can be public for GET and
/// admin-only for POST.
pub fn configure(cfg: &mut web::ServiceConfig, booking_status_requires_admin: bool) {
    use api::{auth, banners, bookings, content, diagnostic_tests as tests, health, payments, users};

    cfg
        // Health check
        .service(public("/health", Method::GET, web::get().to(health::health_check)))
        // Auth
        .service(public("/jwt", Method::POST, web::post().to(auth::issue_token)))
        .service(authenticated("/user-admin/{email}", Method::GET, web::get().to(auth::check_admin)))
        // Users
        .service(public("/user", Method::POST, web::post().to(users::create_user)))
        .service(authenticated("/user", Method::GET, web::get().to(users::list_users)))
        .service(authenticated("/user/current/{email}", Method::GET, web::get().to(users::get_current_user)))
        .service(admin_only("/user/{id}", Method::PATCH, web::patch().to(users::update_user_status)))
        .service(admin_only("/user/role/{id}", Method::PATCH, web::patch().to(users::update_user_role)))
        .service(authenticated("/user/update/{id}", Method::PUT, web::put().to(users::update_user_profile)))
        // Diagnostic tests
        .service(public("/tests", Method::GET, web::get().to(tests::list_tests)))
        .service(admin_only("/tests", Method::POST, web::post().to(tests::create_test)))
        .service(authenticated("/tests/{id}", Method::GET, web::get().to(tests::get_test)))
        .service(admin_only("/tests/update/{id}", Method::PUT, web::put().to(tests::update_test)))
        .service(admin_only("/test/delete/{id}", Method::DELETE, web::delete().to(tests::delete_test)))
        // Banners
        .service(public("/banner", Method::GET, web::get().to(banners::list_banners)))
        .service(admin_only("/banner", Method::POST, web::post().to(banners::create_banner)))
        .service(admin_only("/banner/{id}", Method::PATCH, web::patch().to(banners::update_banner_status)))
        .service(admin_only("/banner/{id}", Method::DELETE, web::delete().to(banners::delete_banner)))
        // Bookings
        .service(authenticated("/booking", Method::POST, web::post().to(bookings::create_booking)))
        .service(public("/bookings", Method::GET, web::get().to(bookings::list_bookings)))
        .service(public("/bookings/delivered", Method::GET, web::get().to(bookings::list_delivered_bookings)))
        .service(authenticated("/booking/upcomin/{email}", Method::GET, web::get().to(bookings::list_patient_bookings)))
        .service(authenticated("/booking/delete/{id}", Method::DELETE, web::delete().to(bookings::delete_booking)))
        .service(authenticated("/reservation/{id}", Method::GET, web::get().to(bookings::get_reservation)))
        // Payments
        .service(public("/create-payment-intent", Method::POST, web::post().to(payments::create_payment_intent)))
        // Reference content
        .service(public("/health/recommendation", Method::GET, web::get().to(content::list_health_recommendations)))
        .service(public("/news", Method::GET, web::get().to(content::list_news)));

    // Any authenticated caller may change a report unless configured otherwise
    let report_route = web::patch().to(bookings::update_booking_report);
    if booking_status_requires_admin {
        cfg.service(admin_only("/booking/status/{id}", Method::PATCH, report_route));
    } else {
        cfg.service(authenticated("/booking/status/{id}", Method::PATCH, report_route));
    }
}

/// Malformed JSON bodies become 400s with the usual error body
pub fn json_config() -> web::JsonConfig {
    web::JsonConfig::default().error_handler(|err, _req| {
        let message = match &err {
            error::JsonPayloadError::Deserialize(e) => e.to_string(),
            other => other.to_string(),
        };
        AppError::InvalidRequest(message).into()
    })
}

/// CORS policy for the configured origins. `*` allows any origin, without
/// credentials since browsers refuse credentialed wildcard responses.
pub fn cors(origins: &[String]) -> Cors {
    let base = if origins.iter().any(|o| o == "*") {
        Cors::default().allow_any_origin().send_wildcard()
    } else {
        origins
            .iter()
            .fold(Cors::default(), |cors, origin| cors.allowed_origin(origin))
            .supports_credentials()
    };

    base.allowed_methods(vec!["GET", "POST", "PUT", "PATCH", "DELETE", "OPTIONS"])
        .allowed_headers(vec![header::AUTHORIZATION, header::CONTENT_TYPE, header::ACCEPT])
        .max_age(3600)
}

pub fn run(listener: TcpListener, db: MongoDB, settings: Settings) -> Result<Server, std::io::Error> {
    let notifier = NotificationDispatcher::from_settings(settings.smtp.as_ref())
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e.to_string()))?;
    run_with(listener, db, settings, notifier)
}

/// Same as [`run`] with a caller-supplied notification dispatcher
pub fn run_with(
    listener: TcpListener,
    db: MongoDB,
    settings: Settings,
    notifier: NotificationDispatcher,
) -> Result<Server, std::io::Error> {
    let db = web::Data::new(db);
    let issuer = web::Data::new(TokenIssuer::new(&settings.token_secret, settings.token_ttl_secs));
    let payments = web::Data::new(
        PaymentClient::new(
            &settings.stripe_api_base,
            &settings.stripe_secret_key,
            &settings.payment_currency,
        )
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e.to_string()))?,
    );
    let notifier = web::Data::new(notifier);

    let origins = settings.allowed_origins.clone();
    if origins.iter().any(|o| o == "*") {
        log::warn!("⚠️  CORS allows any origin (ALLOWED_ORIGINS=*)");
    }
    let booking_status_requires_admin = settings.booking_status_requires_admin;
    if !booking_status_requires_admin {
        log::warn!("⚠️  PATCH /booking/status/{{id}} is open to any authenticated user");
    }

    let openapi = api::swagger::ApiDoc::openapi();

    let server = HttpServer::new(move || {
        App::new()
            .app_data(db.clone())
            .app_data(issuer.clone())
            .app_data(payments.clone())
            .app_data(notifier.clone())
            .app_data(json_config())
            .wrap(cors(&origins))
            .wrap(Logger::default())
            .service(SwaggerUi::new("/swagger-ui/{_:.*}").url("/api-docs/openapi.json", openapi.clone()))
            .configure(|cfg| configure(cfg, booking_status_requires_admin))
    })
    .listen(listener)?
    .run();

    Ok(server)
}
