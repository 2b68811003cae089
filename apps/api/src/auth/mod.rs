//! Accounts, sessions and email verification codes.

pub mod handlers;
pub mod mailer;
pub mod otp;
pub mod password;
pub mod repository;
pub mod session;
