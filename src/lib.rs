//! Storefront core: catalog, carts, checkout, order management and the
//! image pipeline behind product, category, hero and gallery uploads.

pub mod admin;
pub mod cart;
pub mod checkout;
pub mod config;
pub mod error;
mod ids;
pub mod media;
pub mod session;
pub mod state;

pub use cart::{CartBackend, CartStore};
pub use config::Config;
pub use session::SessionId;
pub use state::Library;
