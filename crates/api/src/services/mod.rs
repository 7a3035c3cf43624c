//! Business logic services for the API.
//!
//! # Services
//!
//! - `auth` - Password signup/login over the user repository
//! - `tokens` - Signed bearer tokens (login + single-purpose)
//! - `gateway` - Payment gateway HTTP client (checkout sessions, webhooks)
//! - `mailer` - Transactional mail relay client
//! - `checkout` - Checkout orchestration (cart snapshot or price reference)
//! - `reconciliation` - Webhook-driven order state transitions

pub mod auth;
pub mod checkout;
pub mod gateway;
pub mod mailer;
pub mod reconciliation;
pub mod tokens;
