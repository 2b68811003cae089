//! Resume documents: storage, per-section validation and the REST handlers.

pub mod handlers;
pub mod repository;
pub mod validation;
