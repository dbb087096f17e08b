//! Business logic services for the store.
//!
//! # Services
//!
//! - `auth` - Signup, signin, password changes and access tokens
//! - `cart` - Cart changes checked against live stock
//! - `checkout` - Turning a cart into an order
//! - `payments` - Stripe customers, payment intents and webhooks
//! - `stats` - Admin dashboard figures and best-seller rankings
//! - `stripe` - Stripe REST API client

pub mod auth;
pub mod cart;
pub mod checkout;
pub mod payments;
pub mod stats;
pub mod stripe;
