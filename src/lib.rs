pub mod app;
pub mod config;
pub mod contact;
pub mod error;
pub mod models;
pub mod rate_limit;
pub mod routes;
pub mod tmdb;
