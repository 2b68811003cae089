//! Resume builder backend: accounts, per-section resume editing, template previews,
//! PDF/Word export and AI drafting of resume text.

pub mod auth;
pub mod client;
pub mod config;
pub mod db;
pub mod errors;
pub mod export;
pub mod generation;
pub mod models;
pub mod resume;
pub mod routes;
pub mod state;
pub mod templates;
