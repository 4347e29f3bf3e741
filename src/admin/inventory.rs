/// Stock levels for the admin inventory screen
use log::{info, warn};

use crate::error::StoreError;
use crate::state::data::Product;
use crate::state::Library;

#[derive(Debug, Clone, PartialEq)]
pub struct InventoryReport {
    /// Every product, by name
    pub products: Vec<Product>,
    /// Products at or below their low-stock threshold
    pub low_stock: Vec<Product>,
}

pub fn inventory_report(library: &Library) -> Result<InventoryReport, StoreError> {
    let products = library.list_products_by_name()?;
    let low_stock: Vec<Product> = products
        .iter()
        .filter(|p| p.is_low_stock())
        .cloned()
        .collect();

    if !low_stock.is_empty() {
        warn!("{} product(s) are running low on stock", low_stock.len());
    }

    Ok(InventoryReport {
        products,
        low_stock,
    })
}

/// Read a stock count the way the number input is read: leading digits,
/// anything unparseable or negative counts as 0
pub fn parse_stock_input(input: &str) -> i64 {
    let trimmed = input.trim();
    let (negative, digits) = match trimmed.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, trimmed.strip_prefix('+').unwrap_or(trimmed)),
    };

    let end = digits
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(digits.len());
    let value = digits[..end].parse::<i64>().unwrap_or(0);

    if negative {
        0
    } else {
        value
    }
}

/// Save a stock count and availability, returning the refreshed product
pub fn save_stock(
    library: &Library,
    product_id: i64,
    input: &str,
    is_available: bool,
) -> Result<Product, StoreError> {
    let stock = parse_stock_input(input);
    library.update_stock(product_id, stock, is_available)?;
    info!("product {} stock set to {} (available: {})", product_id, stock, is_available);

    library.get_product(product_id)?.ok_or(StoreError::NotFound {
        entity: "product",
        id: product_id,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::library::tests::sample_product;

    #[test]
    fn test_parse_stock_input() {
        assert_eq!(parse_stock_input("12"), 12);
        assert_eq!(parse_stock_input(" 7 "), 7);
        assert_eq!(parse_stock_input("12abc"), 12);
        assert_eq!(parse_stock_input("abc"), 0);
        assert_eq!(parse_stock_input(""), 0);
        assert_eq!(parse_stock_input("-4"), 0);
        assert_eq!(parse_stock_input("+3"), 3);
    }

    #[test]
    fn test_report_flags_low_stock() {
        let lib = Library::open_in_memory().unwrap();
        let mut low = sample_product("zip-hoodie", 60);
        low.stock_quantity = 5;
        lib.insert_product(&low).unwrap();
        lib.insert_product(&sample_product("alpha-tee", 20)).unwrap();

        let report = inventory_report(&lib).unwrap();
        assert_eq!(report.products.len(), 2);
        assert_eq!(report.products[0].slug, "alpha-tee");
        assert_eq!(report.low_stock.len(), 1);
        assert_eq!(report.low_stock[0].slug, "zip-hoodie");
    }

    #[test]
    fn test_save_stock() {
        let lib = Library::open_in_memory().unwrap();
        let id = lib.insert_product(&sample_product("tee", 20)).unwrap();

        let product = save_stock(&lib, id, "40", false).unwrap();
        assert_eq!(product.stock_quantity, 40);
        assert!(!product.is_available);

        assert!(save_stock(&lib, 999, "1", true).is_err());
    }
}
