/// Order rows in the store database
use rusqlite::{params, OptionalExtension, Row};

use super::data::{NewOrder, Order, OrderStatus, PackageDimensions, ShippingInfo};
use super::library::{expect_changed, json_column, Library};
use crate::error::StoreError;
use crate::ids::now_seconds;

const ORDER_COLUMNS: &str = "id, order_number, customer_name, customer_email, customer_phone, \
     address_json, items_json, total_cents, status, tracking_number, carrier, shipping_date, \
     label_url, shipping_notes, weight, dimensions_json, created_at";

/// Anything orders can be written to (checkout depends only on this)
pub trait OrderBackend {
    fn insert_order(&self, order: &NewOrder) -> Result<i64, StoreError>;
}

impl OrderBackend for Library {
    fn insert_order(&self, order: &NewOrder) -> Result<i64, StoreError> {
        self.conn.execute(
            "INSERT INTO orders (order_number, customer_name, customer_email, customer_phone,
                address_json, items_json, total_cents, status, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
            params![
                order.order_number,
                order.customer_name,
                order.customer_email,
                order.customer_phone,
                serde_json::to_string(&order.shipping_address)?,
                serde_json::to_string(&order.items)?,
                order.total_cents,
                OrderStatus::Pending,
                now_seconds(),
            ],
        )?;
        Ok(self.conn.last_insert_rowid())
    }
}

impl Library {
    /// All orders, newest first
    pub fn list_orders(&self) -> Result<Vec<Order>, StoreError> {
        let sql = format!("SELECT {} FROM orders ORDER BY created_at DESC, id DESC", ORDER_COLUMNS);
        let mut stmt = self.conn.prepare(&sql)?;
        let orders = stmt
            .query_map([], order_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(orders)
    }

    pub fn get_order(&self, id: i64) -> Result<Option<Order>, StoreError> {
        let sql = format!("SELECT {} FROM orders WHERE id = ?1", ORDER_COLUMNS);
        let order = self
            .conn
            .query_row(&sql, params![id], order_from_row)
            .optional()?;
        Ok(order)
    }

    /// Order confirmation lookup; `Ok(None)` for an unknown number
    pub fn get_order_by_number(&self, order_number: &str) -> Result<Option<Order>, StoreError> {
        let sql = format!("SELECT {} FROM orders WHERE order_number = ?1", ORDER_COLUMNS);
        let order = self
            .conn
            .query_row(&sql, params![order_number], order_from_row)
            .optional()?;
        Ok(order)
    }

    pub fn update_order_status(&self, id: i64, status: OrderStatus) -> Result<(), StoreError> {
        let changed = self.conn.execute(
            "UPDATE orders SET status = ?1 WHERE id = ?2",
            params![status, id],
        )?;
        expect_changed(changed, "order", id)
    }

    /// Overwrite the shipping columns; `mark_shipped` also sets status and date
    pub fn save_shipping_info(
        &self,
        id: i64,
        info: &ShippingInfo,
        mark_shipped: bool,
    ) -> Result<(), StoreError> {
        let dimensions = info
            .dimensions
            .filter(|d| !d.is_empty())
            .map(|d| serde_json::to_string(&d))
            .transpose()?;

        let changed = self.conn.execute(
            "UPDATE orders SET tracking_number = ?1, carrier = ?2, weight = ?3,
                dimensions_json = ?4, shipping_notes = ?5, label_url = ?6
             WHERE id = ?7",
            params![
                info.tracking_number,
                info.carrier,
                info.weight,
                dimensions,
                info.shipping_notes,
                info.label_url,
                id,
            ],
        )?;
        expect_changed(changed, "order", id)?;

        if mark_shipped {
            self.conn.execute(
                "UPDATE orders SET status = ?1, shipping_date = ?2 WHERE id = ?3",
                params![OrderStatus::Shipped, now_seconds(), id],
            )?;
        }
        Ok(())
    }
}

fn order_from_row(row: &Row<'_>) -> rusqlite::Result<Order> {
    let dimensions_json: Option<String> = row.get(15)?;
    let dimensions = match dimensions_json {
        Some(_) => Some(json_column::<PackageDimensions>(row, 15)?),
        None => None,
    };

    Ok(Order {
        id: row.get(0)?,
        order_number: row.get(1)?,
        customer_name: row.get(2)?,
        customer_email: row.get(3)?,
        customer_phone: row.get(4)?,
        shipping_address: json_column(row, 5)?,
        items: json_column(row, 6)?,
        total_cents: row.get(7)?,
        status: row.get(8)?,
        shipping: ShippingInfo {
            tracking_number: row.get(9)?,
            carrier: row.get(10)?,
            weight: row.get(14)?,
            dimensions,
            shipping_notes: row.get(13)?,
            label_url: row.get(12)?,
        },
        shipping_date: row.get(11)?,
        created_at: row.get(16)?,
    })
}
