/// State management module
///
/// This module handles all persisted store state, including:
/// - Database connection and catalog queries (library.rs)
/// - Shared data structures (data.rs)
/// - Cart, order and marketing content rows (carts.rs, orders.rs, content.rs)
/// - Video section, billboard and site settings singletons (site.rs)
/// - Local per-install preferences (prefs.rs)

pub mod carts;
pub mod content;
pub mod data;
pub mod library;
pub mod orders;
pub mod prefs;
pub mod site;

pub use library::Library;
