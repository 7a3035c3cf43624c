//! Shared domain types.

pub mod email;
pub mod id;
pub mod money;
pub mod role;
pub mod status;

pub use email::{Email, EmailError};
pub use id::{CartId, CartItemId, FeedbackId, OrderId, OrderItemId, ProductId, RequestId, UserId};
pub use money::{CurrencyCode, MoneyError, from_minor_units, to_minor_units};
pub use role::{Role, RoleSet, RoleSetError};
pub use status::{OrderStatus, OrderStatusError, PaymentMethod};
