pub mod api;
pub mod config;
pub mod database;
pub mod middleware;
pub mod models;
pub mod services;
pub mod startup;
pub mod utils;
