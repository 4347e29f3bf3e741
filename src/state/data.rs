/// Shared data structures for the store
///
/// These structs represent the data model that flows between
/// the database layer and the storefront/admin layers.
/// Prices are integer cents throughout.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use crate::media::{ImageFit, Transform};

/// A product in the catalog
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Product {
    pub id: i64,
    pub name: String,
    /// URL-safe unique name (e.g., "classic-black-tee")
    pub slug: String,
    pub description: String,
    /// Unit price in cents
    pub price_cents: i64,
    pub category_id: Option<i64>,
    /// Main image shown on cards
    pub image_url: String,
    /// Additional gallery images for the detail page
    pub images: Vec<String>,
    /// Sizes offered (e.g., ["S", "M", "L"])
    pub sizes: Vec<String>,
    pub is_featured: bool,
    pub stock_quantity: i64,
    pub low_stock_threshold: i64,
    pub is_available: bool,
    pub image_fit: ImageFit,
    pub transform: Transform,
    /// Unix timestamp (seconds)
    pub created_at: i64,
}

impl Product {
    pub fn is_low_stock(&self) -> bool {
        self.stock_quantity <= self.low_stock_threshold
    }
}

/// Everything needed to create or replace a product
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct NewProduct {
    pub name: String,
    pub slug: String,
    pub description: String,
    pub price_cents: i64,
    pub category_id: Option<i64>,
    pub image_url: String,
    pub images: Vec<String>,
    pub sizes: Vec<String>,
    pub is_featured: bool,
    pub stock_quantity: i64,
    pub low_stock_threshold: i64,
    pub is_available: bool,
    pub image_fit: ImageFit,
    pub transform: Transform,
}

impl Default for NewProduct {
    fn default() -> Self {
        Self {
            name: String::new(),
            slug: String::new(),
            description: String::new(),
            price_cents: 0,
            category_id: None,
            image_url: String::new(),
            images: Vec::new(),
            sizes: vec!["S".into(), "M".into(), "L".into(), "XL".into()],
            is_featured: false,
            stock_quantity: 0,
            low_stock_threshold: 5,
            is_available: true,
            image_fit: ImageFit::default(),
            transform: Transform::default(),
        }
    }
}

impl From<Product> for NewProduct {
    fn from(p: Product) -> Self {
        Self {
            name: p.name,
            slug: p.slug,
            description: p.description,
            price_cents: p.price_cents,
            category_id: p.category_id,
            image_url: p.image_url,
            images: p.images,
            sizes: p.sizes,
            is_featured: p.is_featured,
            stock_quantity: p.stock_quantity,
            low_stock_threshold: p.low_stock_threshold,
            is_available: p.is_available,
            image_fit: p.image_fit,
            transform: p.transform,
        }
    }
}

/// Which products a listing should return
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ProductFilter {
    pub category_id: Option<i64>,
    pub featured_only: bool,
    /// Storefront listings hide unavailable products
    pub available_only: bool,
    pub limit: Option<usize>,
}

/// A product category (collection tile on the home page)
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Category {
    pub id: i64,
    pub name: String,
    pub slug: String,
    pub image_url: String,
    pub image_fit: ImageFit,
    pub transform: Transform,
    pub created_at: i64,
}

/// A cart line with the product joined in
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct CartItem {
    pub id: i64,
    pub session_id: String,
    pub product_id: i64,
    pub size: String,
    /// Always at least 1; lines that would drop to 0 are deleted
    pub quantity: i64,
    /// None when the product row no longer exists
    pub product: Option<Product>,
}

impl CartItem {
    /// Unit price from the joined product, 0 if the product is missing
    pub fn unit_price_cents(&self) -> i64 {
        self.product.as_ref().map_or(0, |p| p.price_cents)
    }

    pub fn line_total_cents(&self) -> i64 {
        self.unit_price_cents() * self.quantity
    }
}

/// Lifecycle of an order
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    #[default]
    Pending,
    Processing,
    Shipped,
    Delivered,
    Cancelled,
}

impl OrderStatus {
    pub const ALL: [OrderStatus; 5] = [
        OrderStatus::Pending,
        OrderStatus::Processing,
        OrderStatus::Shipped,
        OrderStatus::Delivered,
        OrderStatus::Cancelled,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Processing => "processing",
            OrderStatus::Shipped => "shipped",
            OrderStatus::Delivered => "delivered",
            OrderStatus::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error)]
#[error("unknown order status: {0}")]
pub struct UnknownStatus(pub String);

impl FromStr for OrderStatus {
    type Err = UnknownStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        OrderStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| UnknownStatus(s.to_string()))
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Default)]
pub struct ShippingAddress {
    pub street: String,
    pub city: String,
    pub state: String,
    pub zip: String,
    pub country: String,
}

/// Snapshot of a cart line at the time the order was placed
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct OrderItem {
    pub product_id: i64,
    pub product_name: String,
    pub size: String,
    pub quantity: i64,
    /// Unit price in cents
    pub price_cents: i64,
}

/// Package dimensions (inches)
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Default)]
pub struct PackageDimensions {
    pub length: Option<f64>,
    pub width: Option<f64>,
    pub height: Option<f64>,
}

impl PackageDimensions {
    pub fn is_empty(&self) -> bool {
        self.length.is_none() && self.width.is_none() && self.height.is_none()
    }
}

/// Shipping details filled in by an admin
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
pub struct ShippingInfo {
    pub tracking_number: Option<String>,
    pub carrier: Option<String>,
    pub weight: Option<f64>,
    pub dimensions: Option<PackageDimensions>,
    pub shipping_notes: Option<String>,
    pub label_url: Option<String>,
}

/// A placed order
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Order {
    pub id: i64,
    pub order_number: String,
    pub customer_name: String,
    pub customer_email: String,
    pub customer_phone: String,
    pub shipping_address: ShippingAddress,
    pub items: Vec<OrderItem>,
    pub total_cents: i64,
    pub status: OrderStatus,
    pub shipping: ShippingInfo,
    /// Unix timestamp (seconds), set when the order is marked shipped
    pub shipping_date: Option<i64>,
    pub created_at: i64,
}

/// An order as submitted from checkout
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct NewOrder {
    pub order_number: String,
    pub customer_name: String,
    pub customer_email: String,
    pub customer_phone: String,
    pub shipping_address: ShippingAddress,
    pub items: Vec<OrderItem>,
    pub total_cents: i64,
}

/// Slide in the home page hero carousel
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct HeroSlide {
    pub id: i64,
    pub image_url: String,
    pub title: Option<String>,
    pub subtitle: Option<String>,
    pub position: i64,
    pub active: bool,
    pub transform: Transform,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct GalleryImage {
    pub id: i64,
    pub image_url: String,
    pub position: i64,
    pub active: bool,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Testimonial {
    pub id: i64,
    pub customer_name: String,
    pub customer_photo_url: Option<String>,
    /// 1 to 5 stars
    pub rating: i64,
    pub review_text: String,
    pub position: i64,
    pub is_active: bool,
}

/// Free-form page served at `/pages/<slug>`
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct CustomPage {
    pub id: i64,
    pub title: String,
    pub slug: String,
    pub content: String,
    pub active: bool,
    pub show_in_nav: bool,
    pub nav_order: i64,
}

/// Full-width video block on the home page; one active section is shown
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct VideoSection {
    /// None until the section is first saved
    pub id: Option<i64>,
    pub video_url: String,
    pub poster_url: Option<String>,
    pub title: Option<String>,
    pub subtitle: Option<String>,
    pub autoplay: bool,
    pub loop_playback: bool,
    pub muted: bool,
    pub is_active: bool,
}

impl Default for VideoSection {
    fn default() -> Self {
        Self {
            id: None,
            video_url: String::new(),
            poster_url: None,
            title: Some("EOMC".into()),
            subtitle: Some("EYES OPEN MOUTHS CLOSED".into()),
            autoplay: true,
            loop_playback: true,
            muted: true,
            is_active: true,
        }
    }
}

pub const DEFAULT_BILLBOARD_TITLE: &str = "EYES OPEN MOUTHS CLOSED";
pub const DEFAULT_BILLBOARD_SUBTITLE: &str = "Premium Streetwear Collection";

/// Video billboard with a call-to-action button (single row)
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct VideoBillboard {
    /// None until the billboard is first saved
    pub id: Option<i64>,
    pub video_url: Option<String>,
    pub poster_image_url: Option<String>,
    pub title: String,
    pub subtitle: String,
    pub button_text: Option<String>,
    pub button_link: Option<String>,
    pub is_active: bool,
}

impl Default for VideoBillboard {
    fn default() -> Self {
        Self {
            id: None,
            video_url: None,
            poster_image_url: None,
            title: DEFAULT_BILLBOARD_TITLE.into(),
            subtitle: DEFAULT_BILLBOARD_SUBTITLE.into(),
            button_text: Some("Shop Now".into()),
            button_link: Some("/products".into()),
            is_active: true,
        }
    }
}

pub const DEFAULT_SITE_NAME: &str = "EOMC";

/// Header logo and site name, kept in the `site_settings` key-value table
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct SiteBranding {
    /// Empty when no logo has been uploaded
    pub logo_url: String,
    pub site_name: String,
}

impl Default for SiteBranding {
    fn default() -> Self {
        Self {
            logo_url: String::new(),
            site_name: DEFAULT_SITE_NAME.into(),
        }
    }
}

/// Format cents as dollars, e.g. 3500 -> "$35.00"
pub fn format_price(cents: i64) -> String {
    let sign = if cents < 0 { "-" } else { "" };
    let abs = cents.unsigned_abs();
    format!("{}${}.{:02}", sign, abs / 100, abs % 100)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_price() {
        assert_eq!(format_price(3500), "$35.00");
        assert_eq!(format_price(1999), "$19.99");
        assert_eq!(format_price(5), "$0.05");
        assert_eq!(format_price(-250), "-$2.50");
    }

    #[test]
    fn test_order_status_names() {
        for status in OrderStatus::ALL {
            assert_eq!(status.as_str().parse::<OrderStatus>().unwrap(), status);
        }
        assert!("lost".parse::<OrderStatus>().is_err());
    }

    #[test]
    fn test_missing_product_prices_at_zero() {
        let item = CartItem {
            id: 1,
            session_id: "s".into(),
            product_id: 9,
            size: "M".into(),
            quantity: 3,
            product: None,
        };
        assert_eq!(item.unit_price_cents(), 0);
        assert_eq!(item.line_total_cents(), 0);
    }
}
