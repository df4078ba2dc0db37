pub mod auth_service;
pub mod booking_service;
pub mod notification_service;
pub mod payment_service;
