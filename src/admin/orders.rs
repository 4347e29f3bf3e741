/// Order management for the admin dashboard
///
/// Status changes, the shipping form and printable shipping labels.

use log::info;

use crate::error::StoreError;
use crate::state::data::{Order, OrderStatus, PackageDimensions, ShippingInfo};
use crate::state::Library;

/// Carriers offered in the shipping form
pub const CARRIERS: [&str; 5] = ["USPS", "FedEx", "UPS", "DHL", "Other"];

/// Change an order's status from the dropdown value
pub fn set_status(library: &Library, order_id: i64, status: &str) -> Result<(), StoreError> {
    let status: OrderStatus = status.parse().map_err(|_| StoreError::InvalidValue {
        field: "status",
        value: status.to_string(),
    })?;
    library.update_order_status(order_id, status)?;
    info!("order {} -> {}", order_id, status);
    Ok(())
}

/// The shipping form exactly as typed; blank fields mean "not set"
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ShippingForm {
    pub tracking_number: String,
    pub carrier: String,
    pub weight: String,
    pub length: String,
    pub width: String,
    pub height: String,
    pub shipping_notes: String,
    pub label_url: String,
}

impl ShippingForm {
    /// Pre-fill from what is already saved on the order
    pub fn from_order(order: &Order) -> Self {
        let s = &order.shipping;
        let dims = s.dimensions.unwrap_or_default();
        let num = |v: Option<f64>| v.map(|n| n.to_string()).unwrap_or_default();

        Self {
            tracking_number: s.tracking_number.clone().unwrap_or_default(),
            carrier: s.carrier.clone().unwrap_or_default(),
            weight: num(s.weight),
            length: num(dims.length),
            width: num(dims.width),
            height: num(dims.height),
            shipping_notes: s.shipping_notes.clone().unwrap_or_default(),
            label_url: s.label_url.clone().unwrap_or_default(),
        }
    }

    /// Entering both a tracking number and a carrier ships the order
    pub fn marks_shipped(&self) -> bool {
        !self.tracking_number.trim().is_empty() && !self.carrier.trim().is_empty()
    }

    /// Convert to saved shipping info. The carrier must be blank or one of
    /// `CARRIERS`; measures must be non-negative numbers.
    pub fn to_info(&self) -> Result<ShippingInfo, StoreError> {
        let carrier = text(&self.carrier);
        if let Some(name) = carrier.as_deref() {
            if !CARRIERS.contains(&name) {
                return Err(StoreError::InvalidValue {
                    field: "carrier",
                    value: name.to_string(),
                });
            }
        }

        let dimensions = PackageDimensions {
            length: parse_measure("length", &self.length)?,
            width: parse_measure("width", &self.width)?,
            height: parse_measure("height", &self.height)?,
        };

        Ok(ShippingInfo {
            tracking_number: text(&self.tracking_number),
            carrier,
            weight: parse_measure("weight", &self.weight)?,
            dimensions: (!dimensions.is_empty()).then_some(dimensions),
            shipping_notes: text(&self.shipping_notes),
            label_url: text(&self.label_url),
        })
    }
}

fn text(value: &str) -> Option<String> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

fn parse_measure(field: &'static str, value: &str) -> Result<Option<f64>, StoreError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }
    match trimmed.parse::<f64>() {
        Ok(v) if v.is_finite() && v >= 0.0 => Ok(Some(v)),
        _ => Err(StoreError::InvalidValue {
            field,
            value: value.to_string(),
        }),
    }
}

/// Save the shipping form and return the updated order
pub fn save_shipping(library: &Library, order_id: i64, form: &ShippingForm) -> Result<Order, StoreError> {
    let info = form.to_info()?;
    let shipped = form.marks_shipped();
    library.save_shipping_info(order_id, &info, shipped)?;
    if shipped {
        info!("order {} shipped via {}", order_id, form.carrier.trim());
    }

    library.get_order(order_id)?.ok_or(StoreError::NotFound {
        entity: "order",
        id: order_id,
    })
}

/// Printable plain-text shipping label
pub fn render_shipping_label(order: &Order) -> String {
    let a = &order.shipping_address;
    let mut label = format!(
        "SHIPPING LABEL\n\
         ==============\n\
         Order Number: {}\n\
         \n\
         Ship To:\n  {}\n  {}\n  {}, {} {}\n  {}\n",
        order.order_number, order.customer_name, a.street, a.city, a.state, a.zip, a.country
    );

    if let Some(tracking) = &order.shipping.tracking_number {
        label.push_str(&format!(
            "\nTracking Number: {}\nCarrier: {}\n",
            tracking,
            order.shipping.carrier.as_deref().unwrap_or("")
        ));
    }

    if let Some(weight) = order.shipping.weight {
        label.push_str(&format!("\nWeight: {} lbs\n", weight));
    }

    label
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::orders::tests::sample_order;
    use crate::state::orders::OrderBackend;

    #[test]
    fn test_set_status_parses_dropdown_value() {
        let lib = Library::open_in_memory().unwrap();
        let id = lib.insert_order(&sample_order("ORD-1")).unwrap();

        set_status(&lib, id, "delivered").unwrap();
        assert_eq!(lib.get_order(id).unwrap().unwrap().status, OrderStatus::Delivered);
        assert!(matches!(
            set_status(&lib, id, "teleported"),
            Err(StoreError::InvalidValue { field: "status", .. })
        ));
    }

    #[test]
    fn test_tracking_and_carrier_ship_the_order() {
        let lib = Library::open_in_memory().unwrap();
        let id = lib.insert_order(&sample_order("ORD-1")).unwrap();

        let form = ShippingForm {
            tracking_number: " 9400111 ".into(),
            carrier: "USPS".into(),
            weight: "2.5".into(),
            length: "12".into(),
            ..Default::default()
        };
        let order = save_shipping(&lib, id, &form).unwrap();

        assert_eq!(order.status, OrderStatus::Shipped);
        assert!(order.shipping_date.is_some());
        assert_eq!(order.shipping.tracking_number.as_deref(), Some("9400111"));
        assert_eq!(order.shipping.dimensions.unwrap().length, Some(12.0));
        assert_eq!(ShippingForm::from_order(&order).weight, "2.5");
    }

    #[test]
    fn test_notes_only_does_not_ship() {
        let lib = Library::open_in_memory().unwrap();
        let id = lib.insert_order(&sample_order("ORD-1")).unwrap();

        let form = ShippingForm {
            tracking_number: "123".into(),
            shipping_notes: "fragile".into(),
            ..Default::default()
        };
        let order = save_shipping(&lib, id, &form).unwrap();
        assert_eq!(order.status, OrderStatus::Pending);
        assert!(order.shipping_date.is_none());
        assert!(order.shipping.dimensions.is_none());
    }

    #[test]
    fn test_bad_measure_is_rejected() {
        let form = ShippingForm {
            weight: "heavy".into(),
            ..Default::default()
        };
        assert!(form.to_info().is_err());
    }

    #[test]
    fn test_carrier_must_be_offered() {
        for carrier in CARRIERS {
            let form = ShippingForm {
                carrier: carrier.into(),
                ..Default::default()
            };
            assert_eq!(form.to_info().unwrap().carrier.as_deref(), Some(carrier));
        }

        let form = ShippingForm {
            carrier: "Pigeon".into(),
            ..Default::default()
        };
        assert!(matches!(
            form.to_info(),
            Err(StoreError::InvalidValue { field: "carrier", .. })
        ));
    }

    #[test]
    fn test_label_contents() {
        let lib = Library::open_in_memory().unwrap();
        let id = lib.insert_order(&sample_order("ORD-7")).unwrap();
        let order = lib.get_order(id).unwrap().unwrap();

        let label = render_shipping_label(&order);
        assert!(label.starts_with("SHIPPING LABEL\n==============\nOrder Number: ORD-7\n\nShip To:\n"));
        assert!(label.contains("Portland, OR 97201"));
        assert!(!label.contains("Tracking Number"));

        let form = ShippingForm {
            tracking_number: "1Z".into(),
            carrier: "UPS".into(),
            weight: "1".into(),
            ..Default::default()
        };
        let order = save_shipping(&lib, id, &form).unwrap();
        let label = render_shipping_label(&order);
        assert!(label.contains("Tracking Number: 1Z"));
        assert!(label.contains("Carrier: UPS"));
        assert!(label.contains("Weight: 1 lbs"));
    }
}
