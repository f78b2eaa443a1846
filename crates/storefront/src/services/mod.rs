//! Business logic that spans the backend client and the session state.

pub mod cart;

pub use cart::{TransferOutcome, TransferReport, refresh_server_cart, transfer_guest_cart};
