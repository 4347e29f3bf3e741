/// Marketing content rows: hero carousel, gallery, testimonials, custom pages
use rusqlite::{params, OptionalExtension, Row};

use super::data::{CustomPage, GalleryImage, HeroSlide, Testimonial};
use super::library::{expect_changed, transform_columns, Library};
use crate::error::StoreError;
use crate::media::Transform;

/// Content lists that are shown in an admin-controlled order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderedTable {
    HeroSlides,
    GalleryImages,
    Testimonials,
}

impl OrderedTable {
    fn name(self) -> &'static str {
        match self {
            OrderedTable::HeroSlides => "hero_slides",
            OrderedTable::GalleryImages => "gallery_images",
            OrderedTable::Testimonials => "testimonials",
        }
    }

    fn entity(self) -> &'static str {
        match self {
            OrderedTable::HeroSlides => "hero slide",
            OrderedTable::GalleryImages => "gallery image",
            OrderedTable::Testimonials => "testimonial",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Up,
    Down,
}

impl Library {
    /// Position one past the current last entry
    fn next_position(&self, table: OrderedTable) -> Result<i64, StoreError> {
        let sql = format!("SELECT COALESCE(MAX(position) + 1, 0) FROM {}", table.name());
        Ok(self.conn.query_row(&sql, [], |row| row.get(0))?)
    }

    /// Swap an entry with its neighbour. Returns false at either end of the list.
    pub fn move_content(&self, table: OrderedTable, id: i64, direction: Direction) -> Result<bool, StoreError> {
        let sql = format!("SELECT id FROM {} ORDER BY position, id", table.name());
        let mut stmt = self.conn.prepare(&sql)?;
        let mut ids = stmt
            .query_map([], |row| row.get::<_, i64>(0))?
            .collect::<Result<Vec<_>, _>>()?;

        let index = ids
            .iter()
            .position(|&x| x == id)
            .ok_or(StoreError::NotFound { entity: table.entity(), id })?;
        let target = match direction {
            Direction::Up if index > 0 => index - 1,
            Direction::Down if index + 1 < ids.len() => index + 1,
            _ => return Ok(false),
        };
        ids.swap(index, target);

        // Renumber the whole list so positions stay dense
        let update = format!("UPDATE {} SET position = ?1 WHERE id = ?2", table.name());
        let tx = self.conn.unchecked_transaction()?;
        for (position, id) in ids.iter().enumerate() {
            tx.execute(&update, params![position as i64, id])?;
        }
        tx.commit()?;
        Ok(true)
    }

    pub fn delete_content(&self, table: OrderedTable, id: i64) -> Result<(), StoreError> {
        let sql = format!("DELETE FROM {} WHERE id = ?1", table.name());
        let changed = self.conn.execute(&sql, params![id])?;
        expect_changed(changed, table.entity(), id)
    }

    pub fn set_content_active(&self, table: OrderedTable, id: i64, active: bool) -> Result<(), StoreError> {
        let column = match table {
            OrderedTable::Testimonials => "is_active",
            _ => "active",
        };
        let sql = format!("UPDATE {} SET {} = ?1 WHERE id = ?2", table.name(), column);
        let changed = self.conn.execute(&sql, params![active, id])?;
        expect_changed(changed, table.entity(), id)
    }

    // ========== Hero slides ==========

    pub fn insert_hero_slide(
        &self,
        image_url: &str,
        title: Option<&str>,
        subtitle: Option<&str>,
    ) -> Result<i64, StoreError> {
        let position = self.next_position(OrderedTable::HeroSlides)?;
        self.conn.execute(
            "INSERT INTO hero_slides (image_url, title, subtitle, position) VALUES (?1, ?2, ?3, ?4)",
            params![image_url, title, subtitle, position],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    pub fn list_hero_slides(&self, active_only: bool) -> Result<Vec<HeroSlide>, StoreError> {
        let mut stmt = self.conn.prepare(
            "SELECT id, image_url, title, subtitle, position, active, position_x, position_y, zoom
             FROM hero_slides WHERE (?1 = 0 OR active = 1) ORDER BY position, id",
        )?;
        let slides = stmt
            .query_map(params![active_only], hero_slide_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(slides)
    }

    pub fn update_hero_slide_text(
        &self,
        id: i64,
        title: Option<&str>,
        subtitle: Option<&str>,
    ) -> Result<(), StoreError> {
        let changed = self.conn.execute(
            "UPDATE hero_slides SET title = ?1, subtitle = ?2 WHERE id = ?3",
            params![title, subtitle, id],
        )?;
        expect_changed(changed, "hero slide", id)
    }

    pub fn set_hero_slide_transform(&self, id: i64, transform: Transform) -> Result<(), StoreError> {
        let t = transform.clamped();
        let changed = self.conn.execute(
            "UPDATE hero_slides SET position_x = ?1, position_y = ?2, zoom = ?3 WHERE id = ?4",
            params![t.position_x, t.position_y, t.zoom, id],
        )?;
        expect_changed(changed, "hero slide", id)
    }

    // ========== Gallery ==========

    pub fn insert_gallery_image(&self, image_url: &str) -> Result<i64, StoreError> {
        let position = self.next_position(OrderedTable::GalleryImages)?;
        self.conn.execute(
            "INSERT INTO gallery_images (image_url, position) VALUES (?1, ?2)",
            params![image_url, position],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    pub fn list_gallery_images(&self, active_only: bool) -> Result<Vec<GalleryImage>, StoreError> {
        let mut stmt = self.conn.prepare(
            "SELECT id, image_url, position, active FROM gallery_images
             WHERE (?1 = 0 OR active = 1) ORDER BY position, id",
        )?;
        let images = stmt
            .query_map(params![active_only], |row| {
                Ok(GalleryImage {
                    id: row.get(0)?,
                    image_url: row.get(1)?,
                    position: row.get(2)?,
                    active: row.get(3)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(images)
    }

    // ========== Testimonials ==========

    pub fn insert_testimonial(
        &self,
        customer_name: &str,
        customer_photo_url: Option<&str>,
        rating: i64,
        review_text: &str,
    ) -> Result<i64, StoreError> {
        if !(1..=5).contains(&rating) {
            return Err(StoreError::InvalidValue {
                field: "rating",
                value: rating.to_string(),
            });
        }
        let position = self.next_position(OrderedTable::Testimonials)?;
        self.conn.execute(
            "INSERT INTO testimonials (customer_name, customer_photo_url, rating, review_text, position)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![customer_name, customer_photo_url, rating, review_text, position],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    pub fn list_testimonials(&self, active_only: bool) -> Result<Vec<Testimonial>, StoreError> {
        let mut stmt = self.conn.prepare(
            "SELECT id, customer_name, customer_photo_url, rating, review_text, position, is_active
             FROM testimonials WHERE (?1 = 0 OR is_active = 1) ORDER BY position, id",
        )?;
        let testimonials = stmt
            .query_map(params![active_only], |row| {
                Ok(Testimonial {
                    id: row.get(0)?,
                    customer_name: row.get(1)?,
                    customer_photo_url: row.get(2)?,
                    rating: row.get(3)?,
                    review_text: row.get(4)?,
                    position: row.get(5)?,
                    is_active: row.get(6)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(testimonials)
    }

    // ========== Custom pages ==========

    pub fn insert_page(&self, title: &str, slug: &str, content: &str) -> Result<i64, StoreError> {
        self.conn.execute(
            "INSERT INTO custom_pages (title, slug, content) VALUES (?1, ?2, ?3)",
            params![title, slug, content],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    pub fn update_page(&self, page: &CustomPage) -> Result<(), StoreError> {
        let changed = self.conn.execute(
            "UPDATE custom_pages SET title = ?1, slug = ?2, content = ?3, active = ?4,
                show_in_nav = ?5, nav_order = ?6
             WHERE id = ?7",
            params![
                page.title,
                page.slug,
                page.content,
                page.active,
                page.show_in_nav,
                page.nav_order,
                page.id,
            ],
        )?;
        expect_changed(changed, "page", page.id)
    }

    pub fn delete_page(&self, id: i64) -> Result<(), StoreError> {
        let changed = self
            .conn
            .execute("DELETE FROM custom_pages WHERE id = ?1", params![id])?;
        expect_changed(changed, "page", id)
    }

    /// All pages for the admin editor, in navigation order
    pub fn list_pages(&self) -> Result<Vec<CustomPage>, StoreError> {
        self.query_pages("SELECT id, title, slug, content, active, show_in_nav, nav_order
             FROM custom_pages ORDER BY nav_order, id")
    }

    /// Active pages that appear in the header navigation
    pub fn nav_pages(&self) -> Result<Vec<CustomPage>, StoreError> {
        self.query_pages("SELECT id, title, slug, content, active, show_in_nav, nav_order
             FROM custom_pages WHERE active = 1 AND show_in_nav = 1 ORDER BY nav_order, id")
    }

    /// Published page for `/pages/<slug>`; `Ok(None)` if missing or inactive
    pub fn get_page_by_slug(&self, slug: &str) -> Result<Option<CustomPage>, StoreError> {
        let page = self
            .conn
            .query_row(
                "SELECT id, title, slug, content, active, show_in_nav, nav_order
                 FROM custom_pages WHERE slug = ?1 AND active = 1",
                params![slug],
                page_from_row,
            )
            .optional()?;
        Ok(page)
    }

    fn query_pages(&self, sql: &str) -> Result<Vec<CustomPage>, StoreError> {
        let mut stmt = self.conn.prepare(sql)?;
        let pages = stmt
            .query_map([], page_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(pages)
    }
}

fn hero_slide_from_row(row: &Row<'_>) -> rusqlite::Result<HeroSlide> {
    Ok(HeroSlide {
        id: row.get(0)?,
        image_url: row.get(1)?,
        title: row.get(2)?,
        subtitle: row.get(3)?,
        position: row.get(4)?,
        active: row.get(5)?,
        transform: transform_columns(row, 6)?,
    })
}

fn page_from_row(row: &Row<'_>) -> rusqlite::Result<CustomPage> {
    Ok(CustomPage {
        id: row.get(0)?,
        title: row.get(1)?,
        slug: row.get(2)?,
        content: row.get(3)?,
        active: row.get(4)?,
        show_in_nav: row.get(5)?,
        nav_order: row.get(6)?,
    })
}
