/// Turning a cart into an order
///
/// The order keeps a snapshot of each line (name and unit price at the time
/// of purchase) so later catalog edits don't change what the customer paid.

use log::{info, warn};
use serde::{Deserialize, Serialize};

use crate::cart::{CartBackend, CartStore};
use crate::error::CheckoutError;
use crate::ids::{now_millis, random_base36};
use crate::state::data::{NewOrder, OrderItem, ShippingAddress};
use crate::state::orders::OrderBackend;

pub const DEFAULT_COUNTRY: &str = "United States";

/// What the customer typed into the checkout form
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct CheckoutForm {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub street: String,
    pub city: String,
    pub state: String,
    pub zip: String,
    pub country: String,
}

impl Default for CheckoutForm {
    fn default() -> Self {
        Self {
            name: String::new(),
            email: String::new(),
            phone: String::new(),
            street: String::new(),
            city: String::new(),
            state: String::new(),
            zip: String::new(),
            country: DEFAULT_COUNTRY.to_string(),
        }
    }
}

impl CheckoutForm {
    /// Every field is required; the email must also look like an address
    pub fn validate(&self) -> Result<(), CheckoutError> {
        let required = [
            ("name", &self.name),
            ("phone", &self.phone),
            ("street", &self.street),
            ("city", &self.city),
            ("state", &self.state),
            ("zip", &self.zip),
            ("country", &self.country),
        ];
        if let Some((field, _)) = required.iter().find(|(_, v)| v.trim().is_empty()) {
            return Err(CheckoutError::InvalidField(*field));
        }

        let email = self.email.trim();
        let valid_email = match email.split_once('@') {
            Some((user, domain)) => !user.is_empty() && domain.contains('.'),
            None => false,
        };
        if !valid_email {
            return Err(CheckoutError::InvalidField("email"));
        }
        Ok(())
    }

    fn address(&self) -> ShippingAddress {
        ShippingAddress {
            street: self.street.trim().to_string(),
            city: self.city.trim().to_string(),
            state: self.state.trim().to_string(),
            zip: self.zip.trim().to_string(),
            country: self.country.trim().to_string(),
        }
    }
}

/// What the confirmation page shows
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderConfirmation {
    pub order_id: i64,
    pub order_number: String,
    pub total_cents: i64,
}

/// `ORD-<millis>-<9 uppercase base36 chars>`
pub fn generate_order_number() -> String {
    format!("ORD-{}-{}", now_millis(), random_base36(9).to_uppercase())
}

/// Place an order for everything in the cart, then empty the cart
///
/// A failure to clear the cart after the order is stored is logged but does
/// not fail the checkout; the order already exists.
pub fn place_order<B, O>(
    orders: &O,
    cart: &mut CartStore<'_, B>,
    form: &CheckoutForm,
) -> Result<OrderConfirmation, CheckoutError>
where
    B: CartBackend + ?Sized,
    O: OrderBackend + ?Sized,
{
    if cart.is_empty() {
        return Err(CheckoutError::EmptyCart);
    }
    form.validate()?;

    let items: Vec<OrderItem> = cart
        .items()
        .iter()
        .map(|item| OrderItem {
            product_id: item.product_id,
            product_name: item
                .product
                .as_ref()
                .map(|p| p.name.clone())
                .unwrap_or_default(),
            size: item.size.clone(),
            quantity: item.quantity,
            price_cents: item.unit_price_cents(),
        })
        .collect();

    let order = NewOrder {
        order_number: generate_order_number(),
        customer_name: form.name.trim().to_string(),
        customer_email: form.email.trim().to_string(),
        customer_phone: form.phone.trim().to_string(),
        shipping_address: form.address(),
        items,
        total_cents: cart.cart_total_cents(),
    };

    let order_id = orders.insert_order(&order)?;
    info!(
        "placed order {} for {} ({} lines)",
        order.order_number,
        order.customer_email,
        order.items.len()
    );

    if let Err(e) = cart.clear_cart() {
        warn!("order {} placed but cart was not cleared: {}", order.order_number, e);
    }

    Ok(OrderConfirmation {
        order_id,
        order_number: order.order_number,
        total_cents: order.total_cents,
    })
}
