pub mod admin_cli;
pub mod auth;
pub mod core;
pub mod database;
pub mod environment;
pub mod web;

pub use database::DatabaseConfig;
pub use environment::EnvironmentConfig;
pub use web::start_web_server;
