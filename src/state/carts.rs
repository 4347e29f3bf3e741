/// Cart rows in the store database
use rusqlite::{params, Row};

use super::data::CartItem;
use super::library::{expect_changed, product_from_row, Library, PRODUCT_COLUMNS};
use crate::cart::CartBackend;
use crate::error::StoreError;
use crate::ids::now_seconds;
use crate::session::SessionId;

impl CartBackend for Library {
    fn load_cart(&self, session: &SessionId) -> Result<Vec<CartItem>, StoreError> {
        let sql = format!(
            "SELECT c.id, c.session_id, c.product_id, c.size, c.quantity, {}
             FROM cart_items c
             LEFT JOIN products p ON p.id = c.product_id
             WHERE c.session_id = ?1
             ORDER BY c.created_at, c.id",
            PRODUCT_COLUMNS
        );

        let mut stmt = self.conn.prepare(&sql)?;
        let items = stmt
            .query_map(params![session.as_str()], cart_item_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(items)
    }

    fn insert_cart_item(
        &self,
        session: &SessionId,
        product_id: i64,
        size: &str,
        quantity: i64,
    ) -> Result<i64, StoreError> {
        self.conn.execute(
            "INSERT INTO cart_items (session_id, product_id, size, quantity, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![session.as_str(), product_id, size, quantity, now_seconds()],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    fn update_cart_quantity(&self, item_id: i64, quantity: i64) -> Result<(), StoreError> {
        let changed = self.conn.execute(
            "UPDATE cart_items SET quantity = ?1 WHERE id = ?2",
            params![quantity, item_id],
        )?;
        expect_changed(changed, "cart item", item_id)
    }

    fn delete_cart_item(&self, item_id: i64) -> Result<(), StoreError> {
        self.conn
            .execute("DELETE FROM cart_items WHERE id = ?1", params![item_id])?;
        Ok(())
    }

    fn clear_cart(&self, session: &SessionId) -> Result<(), StoreError> {
        self.conn.execute(
            "DELETE FROM cart_items WHERE session_id = ?1",
            params![session.as_str()],
        )?;
        Ok(())
    }
}

fn cart_item_from_row(row: &Row<'_>) -> rusqlite::Result<CartItem> {
    // The joined product columns are all NULL when the product is gone
    let product_id: Option<i64> = row.get(5)?;
    let product = match product_id {
        Some(_) => Some(product_from_row(row, 5)?),
        None => None,
    };

    Ok(CartItem {
        id: row.get(0)?,
        session_id: row.get(1)?,
        product_id: row.get(2)?,
        size: row.get(3)?,
        quantity: row.get(4)?,
        product,
    })
}
