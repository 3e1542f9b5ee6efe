//! Core domain concepts shared across the bridge.
//!
//! - [`error::DomainError`]: domain-level validation errors
//! - [`string`]: UTF-8 safe helpers used for log previews

pub mod error;
pub mod string;
