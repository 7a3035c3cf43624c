//! Checkout orchestration.
//!
//! Two ways into a hosted checkout session: snapshot the user's cart into
//! ad-hoc line items, or pass a gateway price reference straight through.
//! Either way a local `pending` order is written before the shopper is
//! redirected, keyed by the session id, so the webhook has something to
//! reconcile against.

use rust_decimal::Decimal;
use thiserror::Error;

use clementine_core::{MoneyError, to_minor_units};

use crate::db::RepositoryError;
use crate::db::carts::CartRepository;
use crate::db::orders::OrderRepository;
use crate::models::order::OrderLineInput;
use crate::models::user::User;
use crate::services::gateway::{
    CheckoutItems, CheckoutLine, CheckoutSession, CheckoutSessionParams, GatewayError,
};
use crate::state::AppState;

/// Prefix the gateway puts on price object identifiers.
const PRICE_ID_PREFIX: &str = "price_";

/// Errors that can occur while orchestrating a checkout.
#[derive(Debug, Error)]
pub enum CheckoutError {
    /// The user's cart has no items to charge for.
    #[error("cart is empty")]
    EmptyCart,

    /// The supplied price reference isn't a gateway price id.
    #[error("invalid price reference: {0}")]
    InvalidPriceReference(String),

    /// Quantity must be at least 1.
    #[error("quantity must be at least 1")]
    InvalidQuantity,

    /// A cart price couldn't be converted to minor units.
    #[error("money conversion failed: {0}")]
    Money(#[from] MoneyError),

    /// The gateway call failed.
    #[error("gateway error: {0}")]
    Gateway(#[from] GatewayError),

    /// Database operation failed.
    #[error("database error: {0}")]
    Repository(#[from] RepositoryError),
}

/// Success/cancel redirect targets for the hosted checkout page.
#[derive(Debug, Clone)]
pub struct ReturnUrls {
    pub success: String,
    pub cancel: String,
}

impl ReturnUrls {
    /// Resolve optional caller-supplied URLs against the SPA origin.
    #[must_use]
    pub fn resolve(origin: &str, success: Option<String>, cancel: Option<String>) -> Self {
        let origin = origin.trim_end_matches('/');
        Self {
            success: success.unwrap_or_else(|| format!("{origin}/checkout/success")),
            cancel: cancel.unwrap_or_else(|| format!("{origin}/checkout/cancel")),
        }
    }
}

/// Checkout orchestrator.
pub struct CheckoutService<'a> {
    state: &'a AppState,
}

impl<'a> CheckoutService<'a> {
    /// Create a new checkout service.
    #[must_use]
    pub const fn new(state: &'a AppState) -> Self {
        Self { state }
    }

    /// Open a checkout session for the user's current cart.
    ///
    /// The cart is left untouched; it is only cleared once the payment
    /// settles.
    ///
    /// # Errors
    ///
    /// Returns [`CheckoutError::EmptyCart`] when there is nothing to buy,
    /// and propagates gateway and database failures.
    pub async fn checkout_cart(
        &self,
        user: &User,
        urls: ReturnUrls,
    ) -> Result<CheckoutSession, CheckoutError> {
        let carts = CartRepository::new(self.state.pool());
        let cart = carts.get_or_create(user.id).await?;
        let lines = carts.lines(cart.id).await?;

        if lines.is_empty() {
            return Err(CheckoutError::EmptyCart);
        }

        let mut checkout_lines = Vec::with_capacity(lines.len());
        let mut order_lines = Vec::with_capacity(lines.len());
        let mut amount = Decimal::ZERO;

        for (product, quantity) in &lines {
            checkout_lines.push(CheckoutLine {
                name: product.name.clone(),
                unit_amount: to_minor_units(product.price)?,
                quantity: i64::from(*quantity),
            });
            order_lines.push(OrderLineInput {
                product_id: product.id,
                quantity: *quantity,
                unit_price: product.price,
            });
            amount += product.price * Decimal::from(*quantity);
        }

        let session = self
            .create_session(user, CheckoutItems::AdHoc(checkout_lines), urls)
            .await?;

        OrderRepository::new(self.state.pool())
            .create_pending(
                user.id,
                amount,
                &clementine_core::PaymentMethod::card(),
                &session.id,
                &user.email,
                &order_lines,
            )
            .await?;

        tracing::info!(
            user_id = %user.id,
            session_id = %session.id,
            lines = order_lines.len(),
            %amount,
            "Checkout session opened for cart"
        );

        Ok(session)
    }

    /// Open a checkout session for a price that already lives on the
    /// gateway.
    ///
    /// The reference is passed through verbatim; the settled amount is
    /// learned from the webhook.
    ///
    /// # Errors
    ///
    /// Returns [`CheckoutError::InvalidPriceReference`] when the id is
    /// empty or lacks the gateway prefix, [`CheckoutError::InvalidQuantity`]
    /// for quantities below 1, and propagates gateway and database failures.
    pub async fn checkout_price(
        &self,
        user: &User,
        price_id: &str,
        quantity: i64,
        urls: ReturnUrls,
    ) -> Result<CheckoutSession, CheckoutError> {
        let price_id = validate_price_reference(price_id)?;
        if quantity < 1 {
            return Err(CheckoutError::InvalidQuantity);
        }

        let session = self
            .create_session(
                user,
                CheckoutItems::PriceReference {
                    price_id: price_id.to_owned(),
                    quantity,
                },
                urls,
            )
            .await?;

        OrderRepository::new(self.state.pool())
            .create_pending(
                user.id,
                Decimal::ZERO,
                &clementine_core::PaymentMethod::card(),
                &session.id,
                &user.email,
                &[],
            )
            .await?;

        tracing::info!(
            user_id = %user.id,
            session_id = %session.id,
            price_id,
            quantity,
            "Checkout session opened for price reference"
        );

        Ok(session)
    }

    async fn create_session(
        &self,
        user: &User,
        items: CheckoutItems,
        urls: ReturnUrls,
    ) -> Result<CheckoutSession, CheckoutError> {
        let params = CheckoutSessionParams {
            items,
            currency: clementine_core::CurrencyCode::default(),
            success_url: urls.success,
            cancel_url: urls.cancel,
            customer_email: user.email.as_str().to_owned(),
            client_reference_id: user.id.to_string(),
        };

        Ok(self.state.gateway().create_checkout_session(&params).await?)
    }
}

/// Check that a price reference is non-empty and carries the gateway
/// prefix.
fn validate_price_reference(price_id: &str) -> Result<&str, CheckoutError> {
    let price_id = price_id.trim();
    if price_id.is_empty() || !price_id.starts_with(PRICE_ID_PREFIX) {
        return Err(CheckoutError::InvalidPriceReference(price_id.to_owned()));
    }
    Ok(price_id)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_price_reference() {
        assert_eq!(
            validate_price_reference("price_1MoBy5LkdIwHu7ix").unwrap(),
            "price_1MoBy5LkdIwHu7ix"
        );
        assert_eq!(
            validate_price_reference("  price_abc  ").unwrap(),
            "price_abc"
        );
        assert!(matches!(
            validate_price_reference(""),
            Err(CheckoutError::InvalidPriceReference(_))
        ));
        assert!(matches!(
            validate_price_reference("   "),
            Err(CheckoutError::InvalidPriceReference(_))
        ));
        assert!(matches!(
            validate_price_reference("prod_123"),
            Err(CheckoutError::InvalidPriceReference(_))
        ));
        assert!(matches!(
            validate_price_reference("1MoBy5"),
            Err(CheckoutError::InvalidPriceReference(_))
        ));
    }

    #[test]
    fn test_return_urls_default_to_origin() {
        let urls = ReturnUrls::resolve("https://shop.test/", None, None);
        assert_eq!(urls.success, "https://shop.test/checkout/success");
        assert_eq!(urls.cancel, "https://shop.test/checkout/cancel");
    }

    #[test]
    fn test_return_urls_keep_explicit_values() {
        let urls = ReturnUrls::resolve(
            "https://shop.test",
            Some("https://shop.test/thanks".to_owned()),
            None,
        );
        assert_eq!(urls.success, "https://shop.test/thanks");
        assert_eq!(urls.cancel, "https://shop.test/checkout/cancel");
    }
}
