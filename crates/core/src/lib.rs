//! Souk Core - Shared types library.
//!
//! This crate provides the types used by the Souk storefront and its
//! integration tests.
//!
//! # Architecture
//!
//! The core crate contains only types and pure logic - no I/O, no database
//! access, no HTTP clients. The cart reducer and the post-login navigation
//! rules live here so they can be tested without a running backend.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for IDs, prices, roles and tokens
//! - [`cart`] - Cart state, actions and totals
//! - [`navigation`] - Post-login destination rules

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod cart;
pub mod navigation;
pub mod types;

pub use cart::{
    CartAction, CartItem, CartLine, CartState, CartStatus, GuestCartItem, MAX_LINE_QUANTITY,
    ProductRef,
};
pub use types::*;
