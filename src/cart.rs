/// Shopping cart for one anonymous session
///
/// The backing store is the source of truth: every mutation is written
/// through and then the whole cart is reloaded, except `clear_cart` which
/// empties local state directly once the delete succeeds. Lines are merged
/// on (product, size), and a line never holds a quantity below 1.
///
/// Every operation returns a `Result`. On failure the error is logged and
/// the locally held items stay at their last known-good value.

use log::{debug, error};

use crate::error::StoreError;
use crate::session::SessionId;
use crate::state::data::{CartItem, Product};

/// Row-level cart storage
pub trait CartBackend {
    /// All lines for a session, with the product joined in, oldest first
    fn load_cart(&self, session: &SessionId) -> Result<Vec<CartItem>, StoreError>;

    /// Insert a new line; returns its id
    fn insert_cart_item(
        &self,
        session: &SessionId,
        product_id: i64,
        size: &str,
        quantity: i64,
    ) -> Result<i64, StoreError>;

    fn update_cart_quantity(&self, item_id: i64, quantity: i64) -> Result<(), StoreError>;

    fn delete_cart_item(&self, item_id: i64) -> Result<(), StoreError>;

    /// Delete every line belonging to the session
    fn clear_cart(&self, session: &SessionId) -> Result<(), StoreError>;
}

/// The cart as seen by the storefront
pub struct CartStore<'a, B: CartBackend + ?Sized> {
    backend: &'a B,
    session: SessionId,
    items: Vec<CartItem>,
}

impl<'a, B: CartBackend + ?Sized> CartStore<'a, B> {
    /// An empty, not yet loaded cart
    pub fn new(backend: &'a B, session: SessionId) -> Self {
        Self {
            backend,
            session,
            items: Vec::new(),
        }
    }

    /// Create the store and load the session's saved lines
    pub fn open(backend: &'a B, session: SessionId) -> Result<Self, StoreError> {
        let mut cart = Self::new(backend, session);
        cart.reload()?;
        Ok(cart)
    }

    pub fn session(&self) -> &SessionId {
        &self.session
    }

    pub fn items(&self) -> &[CartItem] {
        &self.items
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Replace local items with what the backing store holds
    pub fn reload(&mut self) -> Result<(), StoreError> {
        let items = logged("load cart", self.backend.load_cart(&self.session))?;
        debug!("cart {} loaded with {} lines", self.session, items.len());
        self.items = items;
        Ok(())
    }

    /// Add a product in a size; merges into an existing line for the same
    /// product and size instead of creating a second one
    pub fn add_to_cart(&mut self, product: &Product, size: &str, quantity: i64) -> Result<(), StoreError> {
        let existing = self
            .items
            .iter()
            .find(|item| item.product_id == product.id && item.size == size)
            .map(|item| (item.id, item.quantity));

        if let Some((item_id, current)) = existing {
            return self.update_quantity(item_id, current + quantity);
        }

        if quantity <= 0 {
            return logged(
                "add to cart",
                Err(StoreError::InvalidValue {
                    field: "quantity",
                    value: quantity.to_string(),
                }),
            );
        }

        logged(
            "add to cart",
            self.backend
                .insert_cart_item(&self.session, product.id, size, quantity),
        )?;
        self.reload()
    }

    /// Set a line's quantity; zero or less removes the line
    pub fn update_quantity(&mut self, item_id: i64, quantity: i64) -> Result<(), StoreError> {
        if quantity <= 0 {
            return self.remove_from_cart(item_id);
        }

        logged(
            "update quantity",
            self.backend.update_cart_quantity(item_id, quantity),
        )?;
        self.reload()
    }

    pub fn remove_from_cart(&mut self, item_id: i64) -> Result<(), StoreError> {
        logged("remove from cart", self.backend.delete_cart_item(item_id))?;
        self.reload()
    }

    /// Empty the cart; local state is cleared without a reload
    pub fn clear_cart(&mut self) -> Result<(), StoreError> {
        logged("clear cart", self.backend.clear_cart(&self.session))?;
        self.items.clear();
        Ok(())
    }

    /// Total number of units across all lines
    pub fn cart_count(&self) -> i64 {
        self.items.iter().map(|item| item.quantity).sum()
    }

    /// Price-weighted total in cents
    pub fn cart_total_cents(&self) -> i64 {
        self.items.iter().map(CartItem::line_total_cents).sum()
    }
}

fn logged<T>(op: &str, result: Result<T, StoreError>) -> Result<T, StoreError> {
    if let Err(e) = &result {
        error!("{} failed: {}", op, e);
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::library::tests::sample_product;
    use crate::state::library::Library;
    use std::cell::Cell;

    fn setup() -> (Library, Product, Product) {
        let lib = Library::open_in_memory().unwrap();
        let a = lib.insert_product(&sample_product("product-a", 10)).unwrap();
        let b = lib.insert_product(&sample_product("product-b", 5)).unwrap();
        let a = lib.get_product(a).unwrap().unwrap();
        let b = lib.get_product(b).unwrap().unwrap();
        (lib, a, b)
    }

    fn session() -> SessionId {
        SessionId::new("session_1_testtest1")
    }

    #[test_log::test]
    fn test_same_product_and_size_merges() {
        let (lib, a, _) = setup();
        let mut cart = CartStore::open(&lib, session()).unwrap();

        cart.add_to_cart(&a, "M", 2).unwrap();
        cart.add_to_cart(&a, "M", 3).unwrap();

        assert_eq!(cart.items().len(), 1);
        assert_eq!(cart.items()[0].quantity, 5);
        assert_eq!(cart.cart_count(), 5);
    }

    #[test]
    fn test_different_sizes_are_separate_lines() {
        let (lib, a, _) = setup();
        let mut cart = CartStore::open(&lib, session()).unwrap();

        cart.add_to_cart(&a, "M", 1).unwrap();
        cart.add_to_cart(&a, "L", 1).unwrap();
        assert_eq!(cart.items().len(), 2);
    }

    #[test]
    fn test_zero_quantity_removes_line() {
        let (lib, a, b) = setup();
        let mut cart = CartStore::open(&lib, session()).unwrap();
        cart.add_to_cart(&a, "M", 2).unwrap();
        cart.add_to_cart(&b, "S", 1).unwrap();

        let line = cart.items().iter().find(|i| i.product_id == a.id).unwrap().id;
        cart.update_quantity(line, 0).unwrap();

        assert_eq!(cart.items().len(), 1);
        assert_eq!(cart.cart_count(), 1);
    }

    #[test]
    fn test_total_is_price_weighted() {
        let (lib, a, b) = setup();
        let mut cart = CartStore::open(&lib, session()).unwrap();
        cart.add_to_cart(&a, "M", 2).unwrap();
        cart.add_to_cart(&b, "M", 3).unwrap();

        assert_eq!(cart.cart_total_cents(), 3500);
        assert_eq!(cart.cart_count(), 5);
    }

    #[test]
    fn test_end_to_end_scenario() {
        let (lib, a, _) = setup();
        let mut cart = CartStore::open(&lib, session()).unwrap();
        assert!(cart.is_empty());

        cart.add_to_cart(&a, "M", 1).unwrap();
        assert_eq!(cart.items().len(), 1);
        assert_eq!(cart.cart_count(), 1);
        assert_eq!(cart.cart_total_cents(), a.price_cents);

        cart.add_to_cart(&a, "M", 2).unwrap();
        assert_eq!(cart.items().len(), 1);
        assert_eq!(cart.items()[0].quantity, 3);
        assert_eq!(cart.cart_count(), 3);

        let line = cart.items()[0].id;
        cart.update_quantity(line, 0).unwrap();
        assert!(cart.is_empty());
        assert_eq!(cart.cart_count(), 0);
        assert_eq!(cart.cart_total_cents(), 0);
    }

    #[test]
    fn test_merge_to_zero_removes_line() {
        let (lib, a, _) = setup();
        let mut cart = CartStore::open(&lib, session()).unwrap();
        cart.add_to_cart(&a, "M", 2).unwrap();
        cart.add_to_cart(&a, "M", -2).unwrap();
        assert!(cart.is_empty());
    }

    #[test]
    fn test_new_line_needs_positive_quantity() {
        let (lib, a, _) = setup();
        let mut cart = CartStore::open(&lib, session()).unwrap();
        assert!(matches!(
            cart.add_to_cart(&a, "M", 0),
            Err(StoreError::InvalidValue { field: "quantity", .. })
        ));
        assert!(cart.is_empty());
    }

    #[test]
    fn test_clear_and_remove() {
        let (lib, a, b) = setup();
        let mut cart = CartStore::open(&lib, session()).unwrap();
        cart.add_to_cart(&a, "M", 1).unwrap();
        cart.add_to_cart(&b, "M", 1).unwrap();

        let first = cart.items()[0].id;
        cart.remove_from_cart(first).unwrap();
        assert_eq!(cart.items().len(), 1);

        cart.clear_cart().unwrap();
        assert!(cart.is_empty());
        assert!(CartStore::open(&lib, session()).unwrap().is_empty());
    }

    #[test]
    fn test_sessions_are_isolated() {
        let (lib, a, _) = setup();
        let mut mine = CartStore::open(&lib, session()).unwrap();
        let mut theirs = CartStore::open(&lib, SessionId::new("session_2_other0000")).unwrap();

        mine.add_to_cart(&a, "M", 1).unwrap();
        theirs.add_to_cart(&a, "M", 4).unwrap();
        theirs.clear_cart().unwrap();

        mine.reload().unwrap();
        assert_eq!(mine.cart_count(), 1);
    }

    #[test]
    fn test_deleted_product_counts_but_prices_zero() {
        let (lib, a, b) = setup();
        let mut cart = CartStore::open(&lib, session()).unwrap();
        cart.add_to_cart(&a, "M", 2).unwrap();
        cart.add_to_cart(&b, "M", 1).unwrap();

        lib.delete_product(a.id).unwrap();
        cart.reload().unwrap();

        assert_eq!(cart.cart_count(), 3);
        assert_eq!(cart.cart_total_cents(), 500);
    }

    /// Backend whose writes fail once `broken` is set
    struct FlakyBackend {
        inner: Library,
        broken: Cell<bool>,
    }

    impl FlakyBackend {
        fn check(&self) -> Result<(), StoreError> {
            if self.broken.get() {
                Err(StoreError::Sqlite(rusqlite::Error::InvalidQuery))
            } else {
                Ok(())
            }
        }
    }

    impl CartBackend for FlakyBackend {
        fn load_cart(&self, session: &SessionId) -> Result<Vec<CartItem>, StoreError> {
            self.inner.load_cart(session)
        }

        fn insert_cart_item(&self, session: &SessionId, product_id: i64, size: &str, quantity: i64) -> Result<i64, StoreError> {
            self.check()?;
            self.inner.insert_cart_item(session, product_id, size, quantity)
        }

        fn update_cart_quantity(&self, item_id: i64, quantity: i64) -> Result<(), StoreError> {
            self.check()?;
            self.inner.update_cart_quantity(item_id, quantity)
        }

        fn delete_cart_item(&self, item_id: i64) -> Result<(), StoreError> {
            self.check()?;
            self.inner.delete_cart_item(item_id)
        }

        fn clear_cart(&self, session: &SessionId) -> Result<(), StoreError> {
            self.check()?;
            self.inner.clear_cart(session)
        }
    }

    #[test_log::test]
    fn test_failures_leave_state_unchanged() {
        let (lib, a, b) = setup();
        let backend = FlakyBackend {
            inner: lib,
            broken: Cell::new(false),
        };
        let mut cart = CartStore::open(&backend, session()).unwrap();
        cart.add_to_cart(&a, "M", 2).unwrap();
        let before = cart.items().to_vec();

        backend.broken.set(true);
        assert!(cart.add_to_cart(&b, "S", 1).is_err());
        assert!(cart.add_to_cart(&a, "M", 1).is_err());
        assert!(cart.update_quantity(before[0].id, 0).is_err());
        assert!(cart.clear_cart().is_err());

        assert_eq!(cart.items(), before.as_slice());
        assert_eq!(cart.cart_count(), 2);
    }
}
