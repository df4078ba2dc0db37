pub mod auth;
pub mod banners;
pub mod bookings;
pub mod content;
pub mod health;
pub mod payments;
pub mod swagger;
pub mod users;
