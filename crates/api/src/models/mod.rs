//! Domain models for the API.
//!
//! These types represent validated domain objects separate from database
//! row types and from the request/response DTOs declared in `routes`.

pub mod cart;
pub mod order;
pub mod product;
pub mod request;
pub mod user;

pub use cart::{Cart, CartItem, CartLine, CartView};
pub use order::{Order, OrderItem};
pub use product::Product;
pub use request::{Feedback, ProductRequest};
pub use user::{User, UserProfile};
