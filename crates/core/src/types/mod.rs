//! Core types for Souk.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod auth;
pub mod id;
pub mod price;

pub use auth::{AuthToken, Role};
pub use id::*;
pub use price::{Price, PriceError};
