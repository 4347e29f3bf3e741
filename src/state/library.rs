use log::{debug, info};
use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, Type, ValueRef};
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::path::{Path, PathBuf};

use super::data::{Category, NewProduct, OrderStatus, Product, ProductFilter};
use crate::error::StoreError;
use crate::ids::now_seconds;
use crate::media::{ImageFit, Transform};

/// Columns selected for a product, in the order `product_from_row` reads them
pub(super) const PRODUCT_COLUMNS: &str = "p.id, p.name, p.slug, p.description, p.price_cents, \
     p.category_id, p.image_url, p.images_json, p.sizes_json, p.is_featured, p.stock_quantity, \
     p.low_stock_threshold, p.is_available, p.image_fit, p.position_x, p.position_y, p.zoom, \
     p.created_at";

/// The Library manages the SQLite store database.
/// It holds the catalog, carts, orders and marketing content.
pub struct Library {
    pub(super) conn: Connection,
    db_path: Option<PathBuf>,
}

impl Library {
    /// Open or create the database at `path` and initialize the schema.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let db_path = path.as_ref().to_path_buf();

        // Ensure the parent directory exists
        if let Some(parent) = db_path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let conn = Connection::open(&db_path)?;
        info!("database opened at: {}", db_path.display());

        let library = Library {
            conn,
            db_path: Some(db_path),
        };
        library.init_schema()?;
        Ok(library)
    }

    /// A throwaway database, used by tests and dry runs
    pub fn open_in_memory() -> Result<Self, StoreError> {
        let library = Library {
            conn: Connection::open_in_memory()?,
            db_path: None,
        };
        library.init_schema()?;
        Ok(library)
    }

    /// Initialize the database schema.
    /// Creates all necessary tables and indexes if they don't exist.
    fn init_schema(&self) -> Result<(), StoreError> {
        self.conn.execute_batch(
            "PRAGMA foreign_keys = ON;

            CREATE TABLE IF NOT EXISTS categories (
                id              INTEGER PRIMARY KEY AUTOINCREMENT,
                name            TEXT NOT NULL,
                slug            TEXT NOT NULL UNIQUE,
                image_url       TEXT NOT NULL DEFAULT '',
                image_fit       TEXT NOT NULL DEFAULT 'cover',
                position_x      REAL NOT NULL DEFAULT 0,
                position_y      REAL NOT NULL DEFAULT 0,
                zoom            REAL NOT NULL DEFAULT 1,
                created_at      INTEGER NOT NULL
            );

            CREATE TABLE IF NOT EXISTS products (
                id                  INTEGER PRIMARY KEY AUTOINCREMENT,
                name                TEXT NOT NULL,
                slug                TEXT NOT NULL UNIQUE,
                description         TEXT NOT NULL DEFAULT '',
                price_cents         INTEGER NOT NULL,
                category_id         INTEGER REFERENCES categories(id) ON DELETE SET NULL,
                image_url           TEXT NOT NULL DEFAULT '',
                images_json         TEXT NOT NULL DEFAULT '[]',
                sizes_json          TEXT NOT NULL DEFAULT '[]',
                is_featured         INTEGER NOT NULL DEFAULT 0,
                stock_quantity      INTEGER NOT NULL DEFAULT 0,
                low_stock_threshold INTEGER NOT NULL DEFAULT 5,
                is_available        INTEGER NOT NULL DEFAULT 1,
                image_fit           TEXT NOT NULL DEFAULT 'cover',
                position_x          REAL NOT NULL DEFAULT 0,
                position_y          REAL NOT NULL DEFAULT 0,
                zoom                REAL NOT NULL DEFAULT 1,
                created_at          INTEGER NOT NULL
            );

            -- no foreign key on product_id: lines for deleted products
            -- still load, priced at zero
            CREATE TABLE IF NOT EXISTS cart_items (
                id              INTEGER PRIMARY KEY AUTOINCREMENT,
                session_id      TEXT NOT NULL,
                product_id      INTEGER NOT NULL,
                size            TEXT NOT NULL,
                quantity        INTEGER NOT NULL CHECK (quantity >= 1),
                created_at      INTEGER NOT NULL
            );

            CREATE TABLE IF NOT EXISTS orders (
                id                  INTEGER PRIMARY KEY AUTOINCREMENT,
                order_number        TEXT NOT NULL UNIQUE,
                customer_name       TEXT NOT NULL,
                customer_email      TEXT NOT NULL,
                customer_phone      TEXT NOT NULL DEFAULT '',
                address_json        TEXT NOT NULL,
                items_json          TEXT NOT NULL,
                total_cents         INTEGER NOT NULL,
                status              TEXT NOT NULL DEFAULT 'pending',
                tracking_number     TEXT,
                carrier             TEXT,
                shipping_date       INTEGER,
                label_url           TEXT,
                shipping_notes      TEXT,
                weight              REAL,
                dimensions_json     TEXT,
                created_at          INTEGER NOT NULL
            );

            CREATE TABLE IF NOT EXISTS hero_slides (
                id              INTEGER PRIMARY KEY AUTOINCREMENT,
                image_url       TEXT NOT NULL,
                title           TEXT,
                subtitle        TEXT,
                position        INTEGER NOT NULL,
                active          INTEGER NOT NULL DEFAULT 1,
                position_x      REAL NOT NULL DEFAULT 0,
                position_y      REAL NOT NULL DEFAULT 0,
                zoom            REAL NOT NULL DEFAULT 1
            );

            CREATE TABLE IF NOT EXISTS gallery_images (
                id              INTEGER PRIMARY KEY AUTOINCREMENT,
                image_url       TEXT NOT NULL,
                position        INTEGER NOT NULL,
                active          INTEGER NOT NULL DEFAULT 1
            );

            CREATE TABLE IF NOT EXISTS testimonials (
                id                  INTEGER PRIMARY KEY AUTOINCREMENT,
                customer_name       TEXT NOT NULL,
                customer_photo_url  TEXT,
                rating              INTEGER NOT NULL CHECK (rating BETWEEN 1 AND 5),
                review_text         TEXT NOT NULL,
                position            INTEGER NOT NULL,
                is_active           INTEGER NOT NULL DEFAULT 1
            );

            CREATE TABLE IF NOT EXISTS custom_pages (
                id              INTEGER PRIMARY KEY AUTOINCREMENT,
                title           TEXT NOT NULL,
                slug            TEXT NOT NULL UNIQUE,
                content         TEXT NOT NULL DEFAULT '',
                active          INTEGER NOT NULL DEFAULT 1,
                show_in_nav     INTEGER NOT NULL DEFAULT 0,
                nav_order       INTEGER NOT NULL DEFAULT 0
            );

            CREATE TABLE IF NOT EXISTS video_sections (
                id              INTEGER PRIMARY KEY AUTOINCREMENT,
                video_url       TEXT NOT NULL,
                poster_url      TEXT,
                title           TEXT,
                subtitle        TEXT,
                autoplay        INTEGER NOT NULL DEFAULT 1,
                loop_playback   INTEGER NOT NULL DEFAULT 1,
                muted           INTEGER NOT NULL DEFAULT 1,
                is_active       INTEGER NOT NULL DEFAULT 1,
                updated_at      INTEGER NOT NULL
            );

            CREATE TABLE IF NOT EXISTS video_billboard (
                id                  INTEGER PRIMARY KEY AUTOINCREMENT,
                video_url           TEXT,
                poster_image_url    TEXT,
                title               TEXT NOT NULL,
                subtitle            TEXT NOT NULL,
                button_text         TEXT,
                button_link         TEXT,
                is_active           INTEGER NOT NULL DEFAULT 1,
                updated_at          INTEGER NOT NULL
            );

            CREATE TABLE IF NOT EXISTS site_settings (
                key             TEXT PRIMARY KEY,
                value           TEXT NOT NULL,
                updated_at      INTEGER NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_cart_items_session
             ON cart_items(session_id);

            CREATE INDEX IF NOT EXISTS idx_products_category
             ON products(category_id);

            CREATE INDEX IF NOT EXISTS idx_orders_created_at
             ON orders(created_at DESC);",
        )?;

        debug!("database schema initialized");
        Ok(())
    }

    /// Path to the database file (None for in-memory databases)
    pub fn path(&self) -> Option<&Path> {
        self.db_path.as_deref()
    }

    // ========== Products ==========

    pub fn product_count(&self) -> Result<i64, StoreError> {
        let count = self
            .conn
            .query_row("SELECT COUNT(*) FROM products", [], |row| row.get(0))?;
        Ok(count)
    }

    /// Insert a product; returns the new product ID
    pub fn insert_product(&self, product: &NewProduct) -> Result<i64, StoreError> {
        let t = product.transform.clamped();
        self.conn.execute(
            "INSERT INTO products (name, slug, description, price_cents, category_id, image_url,
                images_json, sizes_json, is_featured, stock_quantity, low_stock_threshold,
                is_available, image_fit, position_x, position_y, zoom, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17)",
            params![
                product.name,
                product.slug,
                product.description,
                product.price_cents,
                product.category_id,
                product.image_url,
                serde_json::to_string(&product.images)?,
                serde_json::to_string(&product.sizes)?,
                product.is_featured,
                product.stock_quantity,
                product.low_stock_threshold,
                product.is_available,
                product.image_fit,
                t.position_x,
                t.position_y,
                t.zoom,
                now_seconds(),
            ],
        )?;

        let id = self.conn.last_insert_rowid();
        info!("added product {} ({})", id, product.slug);
        Ok(id)
    }

    /// Replace every editable field of a product
    pub fn update_product(&self, id: i64, product: &NewProduct) -> Result<(), StoreError> {
        let t = product.transform.clamped();
        let changed = self.conn.execute(
            "UPDATE products SET name = ?1, slug = ?2, description = ?3, price_cents = ?4,
                category_id = ?5, image_url = ?6, images_json = ?7, sizes_json = ?8,
                is_featured = ?9, stock_quantity = ?10, low_stock_threshold = ?11,
                is_available = ?12, image_fit = ?13, position_x = ?14, position_y = ?15, zoom = ?16
             WHERE id = ?17",
            params![
                product.name,
                product.slug,
                product.description,
                product.price_cents,
                product.category_id,
                product.image_url,
                serde_json::to_string(&product.images)?,
                serde_json::to_string(&product.sizes)?,
                product.is_featured,
                product.stock_quantity,
                product.low_stock_threshold,
                product.is_available,
                product.image_fit,
                t.position_x,
                t.position_y,
                t.zoom,
                id,
            ],
        )?;
        expect_changed(changed, "product", id)
    }

    pub fn delete_product(&self, id: i64) -> Result<(), StoreError> {
        let changed = self
            .conn
            .execute("DELETE FROM products WHERE id = ?1", params![id])?;
        expect_changed(changed, "product", id)
    }

    /// Look up a product; `Ok(None)` if there is no such row
    pub fn get_product(&self, id: i64) -> Result<Option<Product>, StoreError> {
        let sql = format!("SELECT {} FROM products p WHERE p.id = ?1", PRODUCT_COLUMNS);
        let product = self
            .conn
            .query_row(&sql, params![id], |row| product_from_row(row, 0))
            .optional()?;
        Ok(product)
    }

    /// Look up a product by slug (product detail page); `Ok(None)` if missing
    pub fn get_product_by_slug(&self, slug: &str) -> Result<Option<Product>, StoreError> {
        let sql = format!("SELECT {} FROM products p WHERE p.slug = ?1", PRODUCT_COLUMNS);
        let product = self
            .conn
            .query_row(&sql, params![slug], |row| product_from_row(row, 0))
            .optional()?;
        Ok(product)
    }

    /// List products, newest first
    pub fn list_products(&self, filter: &ProductFilter) -> Result<Vec<Product>, StoreError> {
        let sql = format!(
            "SELECT {} FROM products p
             WHERE (?1 IS NULL OR p.category_id = ?1)
               AND (?2 = 0 OR p.is_featured = 1)
               AND (?3 = 0 OR p.is_available = 1)
             ORDER BY p.created_at DESC, p.id DESC
             LIMIT ?4",
            PRODUCT_COLUMNS
        );
        let limit = filter.limit.map_or(-1, |l| l as i64);

        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map(
            params![filter.category_id, filter.featured_only, filter.available_only, limit],
            |row| product_from_row(row, 0),
        )?;

        let mut products = Vec::new();
        for product in rows {
            products.push(product?);
        }
        Ok(products)
    }

    /// Products ordered by name (inventory screen)
    pub fn list_products_by_name(&self) -> Result<Vec<Product>, StoreError> {
        let sql = format!("SELECT {} FROM products p ORDER BY p.name", PRODUCT_COLUMNS);
        let mut stmt = self.conn.prepare(&sql)?;
        let products = stmt
            .query_map([], |row| product_from_row(row, 0))?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(products)
    }

    /// Store a product's display transform (clamped)
    pub fn set_product_transform(&self, id: i64, transform: Transform) -> Result<(), StoreError> {
        let t = transform.clamped();
        let changed = self.conn.execute(
            "UPDATE products SET position_x = ?1, position_y = ?2, zoom = ?3 WHERE id = ?4",
            params![t.position_x, t.position_y, t.zoom, id],
        )?;
        expect_changed(changed, "product", id)
    }

    pub fn set_product_image_fit(&self, id: i64, fit: ImageFit) -> Result<(), StoreError> {
        let changed = self.conn.execute(
            "UPDATE products SET image_fit = ?1 WHERE id = ?2",
            params![fit, id],
        )?;
        expect_changed(changed, "product", id)
    }

    /// Set stock level and availability (inventory screen)
    pub fn update_stock(
        &self,
        id: i64,
        stock_quantity: i64,
        is_available: bool,
    ) -> Result<(), StoreError> {
        if stock_quantity < 0 {
            return Err(StoreError::InvalidValue {
                field: "stock_quantity",
                value: stock_quantity.to_string(),
            });
        }
        let changed = self.conn.execute(
            "UPDATE products SET stock_quantity = ?1, is_available = ?2 WHERE id = ?3",
            params![stock_quantity, is_available, id],
        )?;
        expect_changed(changed, "product", id)
    }

    // ========== Categories ==========

    pub fn insert_category(&self, name: &str, slug: &str, image_url: &str) -> Result<i64, StoreError> {
        self.conn.execute(
            "INSERT INTO categories (name, slug, image_url, created_at) VALUES (?1, ?2, ?3, ?4)",
            params![name, slug, image_url, now_seconds()],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    pub fn list_categories(&self) -> Result<Vec<Category>, StoreError> {
        let mut stmt = self.conn.prepare(
            "SELECT id, name, slug, image_url, image_fit, position_x, position_y, zoom, created_at
             FROM categories ORDER BY name",
        )?;
        let categories = stmt
            .query_map([], category_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(categories)
    }

    pub fn get_category_by_slug(&self, slug: &str) -> Result<Option<Category>, StoreError> {
        let category = self
            .conn
            .query_row(
                "SELECT id, name, slug, image_url, image_fit, position_x, position_y, zoom, created_at
                 FROM categories WHERE slug = ?1",
                params![slug],
                category_from_row,
            )
            .optional()?;
        Ok(category)
    }

    pub fn set_category_image(&self, id: i64, image_url: &str, fit: ImageFit) -> Result<(), StoreError> {
        let changed = self.conn.execute(
            "UPDATE categories SET image_url = ?1, image_fit = ?2 WHERE id = ?3",
            params![image_url, fit, id],
        )?;
        expect_changed(changed, "category", id)
    }

    pub fn set_category_transform(&self, id: i64, transform: Transform) -> Result<(), StoreError> {
        let t = transform.clamped();
        let changed = self.conn.execute(
            "UPDATE categories SET position_x = ?1, position_y = ?2, zoom = ?3 WHERE id = ?4",
            params![t.position_x, t.position_y, t.zoom, id],
        )?;
        expect_changed(changed, "category", id)
    }

    pub fn delete_category(&self, id: i64) -> Result<(), StoreError> {
        let changed = self
            .conn
            .execute("DELETE FROM categories WHERE id = ?1", params![id])?;
        expect_changed(changed, "category", id)
    }
}

/// Map "no rows touched" to a NotFound error
pub(super) fn expect_changed(changed: usize, entity: &'static str, id: i64) -> Result<(), StoreError> {
    if changed == 0 {
        Err(StoreError::NotFound { entity, id })
    } else {
        Ok(())
    }
}

/// Parse a JSON text column inside a row mapper
pub(super) fn json_column<T: serde::de::DeserializeOwned>(
    row: &Row<'_>,
    idx: usize,
) -> rusqlite::Result<T> {
    let text: String = row.get(idx)?;
    serde_json::from_str(&text)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

/// Read a transform stored as three REAL columns starting at `idx`
pub(super) fn transform_columns(row: &Row<'_>, idx: usize) -> rusqlite::Result<Transform> {
    Ok(Transform::new(
        row.get(idx)?,
        row.get(idx + 1)?,
        row.get(idx + 2)?,
    ))
}

/// Build a Product from `PRODUCT_COLUMNS` starting at column `offset`
pub(super) fn product_from_row(row: &Row<'_>, offset: usize) -> rusqlite::Result<Product> {
    Ok(Product {
        id: row.get(offset)?,
        name: row.get(offset + 1)?,
        slug: row.get(offset + 2)?,
        description: row.get(offset + 3)?,
        price_cents: row.get(offset + 4)?,
        category_id: row.get(offset + 5)?,
        image_url: row.get(offset + 6)?,
        images: json_column(row, offset + 7)?,
        sizes: json_column(row, offset + 8)?,
        is_featured: row.get(offset + 9)?,
        stock_quantity: row.get(offset + 10)?,
        low_stock_threshold: row.get(offset + 11)?,
        is_available: row.get(offset + 12)?,
        image_fit: row.get(offset + 13)?,
        transform: transform_columns(row, offset + 14)?,
        created_at: row.get(offset + 17)?,
    })
}

fn category_from_row(row: &Row<'_>) -> rusqlite::Result<Category> {
    Ok(Category {
        id: row.get(0)?,
        name: row.get(1)?,
        slug: row.get(2)?,
        image_url: row.get(3)?,
        image_fit: row.get(4)?,
        transform: transform_columns(row, 5)?,
        created_at: row.get(8)?,
    })
}

impl ToSql for ImageFit {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.as_str()))
    }
}

impl FromSql for ImageFit {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        value
            .as_str()?
            .parse()
            .map_err(|e| FromSqlError::Other(Box::new(e)))
    }
}

impl ToSql for OrderStatus {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.as_str()))
    }
}

impl FromSql for OrderStatus {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        value
            .as_str()?
            .parse()
            .map_err(|e| FromSqlError::Other(Box::new(e)))
    }
}

// Implement Debug for better error messages
impl std::fmt::Debug for Library {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Library")
            .field("db_path", &self.db_path)
            .finish()
    }
}
