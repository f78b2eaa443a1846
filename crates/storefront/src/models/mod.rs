//! Domain models for storefront.
//!
//! Everything here is stored in the visitor's session.

pub mod session;

pub use session::{AuthSession, CurrentUser, session_keys};
