//! Guest cart transfer and server cart refresh.
//!
//! Transfer replays each guest line as an add-to-cart request, one at a
//! time, in list order. Failures are logged per line and never stop the
//! loop. The guest cart is cleared afterwards no matter how many lines made
//! it across. Quantities are not merged with lines already in the server
//! cart, and replaying the same guest cart twice adds it twice.

use souk_core::{AuthToken, CartAction, CartState, ProductId};
use tracing::instrument;

use crate::api::{ApiError, ShopApiClient};
use crate::error::add_breadcrumb;

/// Result of replaying one guest line.
#[derive(Debug)]
pub struct TransferOutcome {
    pub product_id: ProductId,
    /// `None` when the backend accepted the line.
    pub error: Option<ApiError>,
}

/// Per-line results of a guest cart transfer.
#[derive(Debug, Default)]
pub struct TransferReport {
    pub outcomes: Vec<TransferOutcome>,
}

impl TransferReport {
    /// Number of requests issued.
    #[must_use]
    pub fn attempted(&self) -> usize {
        self.outcomes.len()
    }

    /// Number of lines the backend accepted.
    #[must_use]
    pub fn transferred(&self) -> usize {
        self.outcomes.iter().filter(|o| o.error.is_none()).count()
    }

    /// Lines that did not make it to the server cart.
    pub fn failures(&self) -> impl Iterator<Item = &TransferOutcome> {
        self.outcomes.iter().filter(|o| o.error.is_some())
    }
}

/// Replay the guest cart against the server cart, then clear it.
///
/// Never fails: per-line errors end up in the report and in the logs.
#[instrument(skip_all, fields(lines = cart.guest_items.len()))]
pub async fn transfer_guest_cart(
    api: &ShopApiClient,
    token: Option<&AuthToken>,
    cart: &mut CartState,
) -> TransferReport {
    let mut report = TransferReport::default();

    for item in &cart.guest_items {
        tracing::debug!(product_id = %item.id, quantity = item.quantity, "Transferring guest cart line");

        let error = match api.add_to_cart(token, &item.id, item.quantity).await {
            Ok(()) => None,
            Err(e) => {
                tracing::error!(
                    product_id = %item.id,
                    quantity = item.quantity,
                    error = %e,
                    "Failed to transfer guest cart line"
                );
                Some(e)
            }
        };

        report.outcomes.push(TransferOutcome {
            product_id: item.id.clone(),
            error,
        });
    }

    cart.apply(CartAction::ClearGuestCart);

    if report.attempted() > 0 {
        let attempted = report.attempted().to_string();
        let transferred = report.transferred().to_string();
        add_breadcrumb(
            "cart",
            "Transferred guest cart",
            Some(&[
                ("attempted", attempted.as_str()),
                ("transferred", transferred.as_str()),
            ]),
        );
    }
    let failed: Vec<&str> = report.failures().map(|o| o.product_id.as_str()).collect();
    tracing::info!(
        attempted = report.attempted(),
        transferred = report.transferred(),
        failed = ?failed,
        "Guest cart transfer finished"
    );

    report
}

/// Reload the server cart into the mirror.
///
/// # Errors
///
/// Returns the backend error; the mirror is left untouched in that case.
pub async fn refresh_server_cart(
    api: &ShopApiClient,
    token: Option<&AuthToken>,
    cart: &mut CartState,
) -> Result<(), ApiError> {
    let items = api.get_cart(token).await?;
    cart.apply(CartAction::GetCartSuccess(items));
    Ok(())
}
