/// Admin back-office operations
///
/// - Content editors that upload images and update rows (content.rs)
/// - Folder import for hero and gallery images (import.rs)
/// - Stock levels (inventory.rs)
/// - Order status, shipping details and labels (orders.rs)

pub mod content;
pub mod import;
pub mod inventory;
pub mod orders;
