pub mod auth;
pub mod config;
pub mod db;
pub mod error;
pub mod jobs;
pub mod models;
pub mod processor;
pub mod routes;
pub mod schema;
pub mod state;
pub mod storage;
