//! Status enums for orders and payments.

use serde::{Deserialize, Serialize};

/// Errors that can occur parsing an [`OrderStatus`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum OrderStatusError {
    /// The input does not name a known status.
    #[error("unknown order status: {0}")]
    Unknown(String),
}

/// Payment status of an order.
///
/// Orders are created as `Pending` when a checkout session opens and move
/// to exactly one terminal state when the gateway reports the outcome.
/// Terminal states never transition again; redelivered gateway events for
/// a terminal order are acknowledged without changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    /// Checkout session opened, payment outcome not yet known.
    #[default]
    Pending,
    /// The gateway confirmed payment.
    Paid,
    /// The gateway reported the payment failed or the session expired.
    Failed,
}

impl OrderStatus {
    /// Whether this status is terminal (no further transitions).
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        matches!(self, Self::Paid | Self::Failed)
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Pending => write!(f, "pending"),
            Self::Paid => write!(f, "paid"),
            Self::Failed => write!(f, "failed"),
        }
    }
}

impl std::str::FromStr for OrderStatus {
    type Err = OrderStatusError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "paid" => Ok(Self::Paid),
            "failed" => Ok(Self::Failed),
            _ => Err(OrderStatusError::Unknown(s.to_owned())),
        }
    }
}

/// How an order was (or will be) paid.
///
/// Stored verbatim from the gateway's payment method type, defaulting to
/// `card` for checkout sessions opened before the gateway reports one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PaymentMethod(String);

impl PaymentMethod {
    /// The default method for gateway checkout sessions.
    #[must_use]
    pub fn card() -> Self {
        Self("card".to_owned())
    }

    /// Wrap a gateway-reported method string, falling back to `card`
    /// when the gateway sends nothing.
    #[must_use]
    pub fn from_gateway(raw: Option<&str>) -> Self {
        match raw {
            Some(s) if !s.trim().is_empty() => Self(s.trim().to_owned()),
            _ => Self::card(),
        }
    }

    /// The method as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for PaymentMethod {
    fn default() -> Self {
        Self::card()
    }
}

impl std::fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_status_roundtrip() {
        for status in [OrderStatus::Pending, OrderStatus::Paid, OrderStatus::Failed] {
            let s = status.to_string();
            assert_eq!(s.parse::<OrderStatus>().unwrap(), status);
        }
    }

    #[test]
    fn test_unknown_status_rejected() {
        assert!(matches!(
            "refunded".parse::<OrderStatus>(),
            Err(OrderStatusError::Unknown(_))
        ));
    }

    #[test]
    fn test_terminal_states() {
        assert!(!OrderStatus::Pending.is_terminal());
        assert!(OrderStatus::Paid.is_terminal());
        assert!(OrderStatus::Failed.is_terminal());
    }

    #[test]
    fn test_payment_method_fallback() {
        assert_eq!(PaymentMethod::from_gateway(None).as_str(), "card");
        assert_eq!(PaymentMethod::from_gateway(Some("  ")).as_str(), "card");
        assert_eq!(PaymentMethod::from_gateway(Some("link")).as_str(), "link");
    }

    #[test]
    fn test_serde_transparent() {
        let method = PaymentMethod::card();
        assert_eq!(serde_json::to_string(&method).unwrap(), "\"card\"");
        let status = OrderStatus::Paid;
        assert_eq!(serde_json::to_string(&status).unwrap(), "\"paid\"");
    }
}
